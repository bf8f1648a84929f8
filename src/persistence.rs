use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::error::{GameError, GameResult};

/// Flat snapshot kept between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Baseline {
    pub unlocked_achievements: Vec<String>,
    pub max_combo: u32,
    pub cleared_levels: u32,
}

impl Baseline {
    /// Fold a finished session into the stored bests.
    pub fn merged(&self, max_combo: u32, cleared_levels: u32, newly_unlocked: &[String]) -> Self {
        let mut unlocked = self.unlocked_achievements.clone();
        for id in newly_unlocked {
            if !unlocked.contains(id) {
                unlocked.push(id.clone());
            }
        }
        Self {
            unlocked_achievements: unlocked,
            max_combo: self.max_combo.max(max_combo),
            cleared_levels: self.cleared_levels.max(cleared_levels),
        }
    }
}

pub trait BaselineStore {
    /// Never fails; unreadable state comes back as the default baseline.
    fn load(&self) -> Baseline;
    fn save(&self, baseline: &Baseline) -> GameResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileBaselineStore {
    path: PathBuf,
}

impl FileBaselineStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::baseline_path().unwrap_or_else(|| PathBuf::from("stroop_rush_baseline.json")),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict read. A missing file is an empty baseline, garbage is an error.
    pub fn try_load(&self) -> GameResult<Baseline> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Baseline::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| GameError::CorruptedPersistedState(e.to_string()))
    }
}

impl Default for FileBaselineStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BaselineStore for FileBaselineStore {
    fn load(&self) -> Baseline {
        match self.try_load() {
            Ok(baseline) => baseline,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "falling back to empty baseline");
                Baseline::default()
            }
        }
    }

    fn save(&self, baseline: &Baseline) -> GameResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(baseline)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Keeps the baseline in memory. Clones share contents and the save counter.
#[derive(Debug, Clone, Default)]
pub struct MemoryBaselineStore {
    baseline: Rc<RefCell<Baseline>>,
    saves: Rc<Cell<usize>>,
}

impl MemoryBaselineStore {
    pub fn new(initial: Baseline) -> Self {
        Self {
            baseline: Rc::new(RefCell::new(initial)),
            saves: Rc::new(Cell::new(0)),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn current(&self) -> Baseline {
        self.baseline.borrow().clone()
    }
}

impl BaselineStore for MemoryBaselineStore {
    fn load(&self) -> Baseline {
        self.current()
    }

    fn save(&self, baseline: &Baseline) -> GameResult<()> {
        *self.baseline.borrow_mut() = baseline.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
