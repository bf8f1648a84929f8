use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::difficulty::DifficultySettings;
use crate::palette::{canonical_color_of, word_matches_color, ColorId, WordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    /// Pick the one option matching the stated (color, word)
    Basic,
    /// Pick any option whose ink differs from its word's meaning
    Advanced,
}

/// One clickable option: a word printed in a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OptionCard {
    pub color: ColorId,
    pub word: WordId,
}

impl OptionCard {
    pub fn new(color: ColorId, word: WordId) -> Self {
        Self { color, word }
    }

    pub fn is_mismatched(&self) -> bool {
        !word_matches_color(self.word, self.color)
    }
}

pub type Target = OptionCard;

#[derive(Debug, Clone, PartialEq)]
enum Rule {
    Match(Target),
    Mismatch,
}

/// A generated round: the options plus the rule that decides correctness.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSpec {
    rule: Rule,
    options: Vec<OptionCard>,
}

impl RoundSpec {
    /// A Basic round with a fixed target and option order.
    pub fn basic(target: Target, options: Vec<OptionCard>) -> Self {
        Self {
            rule: Rule::Match(target),
            options,
        }
    }

    /// An Advanced round with a fixed option order.
    pub fn advanced(options: Vec<OptionCard>) -> Self {
        Self {
            rule: Rule::Mismatch,
            options,
        }
    }

    pub fn mode(&self) -> Mode {
        match self.rule {
            Rule::Match(_) => Mode::Basic,
            Rule::Mismatch => Mode::Advanced,
        }
    }

    pub fn target(&self) -> Option<Target> {
        match self.rule {
            Rule::Match(target) => Some(target),
            Rule::Mismatch => None,
        }
    }

    pub fn options(&self) -> &[OptionCard] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&OptionCard> {
        self.options.get(index)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn is_correct(&self, card: &OptionCard) -> bool {
        match self.rule {
            Rule::Match(target) => *card == target,
            Rule::Mismatch => card.is_mismatched(),
        }
    }

    /// Indices of every option that satisfies the round's rule.
    pub fn correct_indices(&self) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, card)| self.is_correct(card))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn prompt(&self) -> String {
        match self.rule {
            Rule::Match(target) => format!(
                "Find \"{}\" written in {}",
                target.word.label(),
                target.color
            ),
            Rule::Mismatch => "Pick a word whose color differs from its meaning".to_string(),
        }
    }
}

/// Produces rounds for a level. Randomness is always supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundGenerator {
    advanced_probability: f64,
}

pub const DEFAULT_ADVANCED_PROBABILITY: f64 = 0.5;

impl Default for RoundGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ADVANCED_PROBABILITY)
    }
}

impl RoundGenerator {
    /// Out-of-range chances are clamped; NaN falls back to an even split.
    pub fn new(advanced_probability: f64) -> Self {
        let advanced_probability = if advanced_probability.is_nan() {
            DEFAULT_ADVANCED_PROBABILITY
        } else {
            advanced_probability.clamp(0.0, 1.0)
        };
        Self {
            advanced_probability,
        }
    }

    pub fn advanced_probability(&self) -> f64 {
        self.advanced_probability
    }

    /// Level 1 is always Basic; later levels roll independently every round.
    pub fn choose_mode<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> Mode {
        if level <= 1 {
            return Mode::Basic;
        }
        if rng.gen_bool(self.advanced_probability) {
            Mode::Advanced
        } else {
            Mode::Basic
        }
    }

    pub fn generate<R: Rng + ?Sized>(
        &self,
        settings: &DifficultySettings,
        level: u32,
        rng: &mut R,
    ) -> RoundSpec {
        match self.choose_mode(level, rng) {
            Mode::Basic => basic_round(settings, rng),
            Mode::Advanced => advanced_round(settings, rng),
        }
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> T {
    items[rng.gen_range(0..items.len())]
}

/// A (color, word) pair whose ink differs from the word's meaning.
fn mismatched_card<R: Rng + ?Sized>(settings: &DifficultySettings, rng: &mut R) -> OptionCard {
    let word = pick(&settings.word_set, rng);
    let meaning = canonical_color_of(word);
    let inks: Vec<ColorId> = settings
        .color_set
        .iter()
        .copied()
        .filter(|c| *c != meaning)
        .collect();
    OptionCard::new(pick(&inks, rng), word)
}

/// A (color, word) pair printed in its own color.
fn matching_card<R: Rng + ?Sized>(settings: &DifficultySettings, rng: &mut R) -> OptionCard {
    let word = pick(&settings.word_set, rng);
    OptionCard::new(canonical_color_of(word), word)
}

/// Exactly one option equals the target; the rest are any other pair.
///
/// # Panics
///
/// If `settings` would not pass [`DifficultySettings::new`] validation.
pub fn basic_round<R: Rng + ?Sized>(settings: &DifficultySettings, rng: &mut R) -> RoundSpec {
    let target_color = pick(&settings.color_set, rng);
    let words: Vec<WordId> = settings
        .word_set
        .iter()
        .copied()
        .filter(|w| canonical_color_of(*w) != target_color)
        .collect();
    let target = OptionCard::new(target_color, pick(&words, rng));

    let mut options = Vec::with_capacity(settings.option_count);
    options.push(target);
    while options.len() < settings.option_count {
        let card = OptionCard::new(
            pick(&settings.color_set, rng),
            pick(&settings.word_set, rng),
        );
        if card != target {
            options.push(card);
        }
    }

    options.shuffle(rng);
    RoundSpec::basic(target, options)
}

/// At least one option is mismatched. Slots are filled with a coin flip
/// between mismatched and matching pairs until a mismatched one exists, then
/// with matching pairs; the last slot is forced if nothing matched yet.
///
/// # Panics
///
/// If `settings` would not pass [`DifficultySettings::new`] validation.
pub fn advanced_round<R: Rng + ?Sized>(settings: &DifficultySettings, rng: &mut R) -> RoundSpec {
    let count = settings.option_count;
    let mut options = Vec::with_capacity(count);
    let mut has_correct = false;

    for slot in 0..count {
        let force = slot + 1 == count && !has_correct;
        let card = if force || (!has_correct && rng.gen_bool(0.5)) {
            has_correct = true;
            mismatched_card(settings, rng)
        } else {
            matching_card(settings, rng)
        };
        options.push(card);
    }

    options.shuffle(rng);
    RoundSpec::advanced(options)
}
