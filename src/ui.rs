pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
    Frame,
};
use stroop_rush::{clock::Clock, palette::ColorId};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Options laid out per row on the game screen
const OPTIONS_PER_ROW: usize = 3;

impl<C: Clock + 'static> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen::<C>(&self.state).render(self, area, buf);
    }
}

pub fn draw<C: Clock + 'static>(app: &App<C>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

/// Terminal color for an ink.
pub fn ink(color: ColorId) -> Color {
    match color {
        ColorId::Red => Color::Red,
        ColorId::Yellow => Color::Yellow,
        ColorId::Blue => Color::Blue,
        ColorId::Green => Color::Green,
        ColorId::Purple => Color::Magenta,
        ColorId::Pink => Color::Rgb(255, 105, 180),
    }
}

/// Rows `text` occupies once wrapped inside the horizontal margins.
fn wrapped_rows(text: &str, area_width: u16) -> u16 {
    let usable = area_width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1) as usize;
    text.width().div_ceil(usable).max(1) as u16
}

/// Right-pad to a display width, so wide glyphs keep grid columns aligned.
fn pad_to(text: &str, width: usize) -> String {
    let mut padded = text.to_string();
    padded.push_str(&" ".repeat(width.saturating_sub(text.width())));
    padded
}

fn bold_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold_style() -> Style {
    bold_style().add_modifier(Modifier::DIM)
}

fn italic_style() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use ratatui::{backend::TestBackend, Terminal};
    use stroop_rush::{
        clock::ManualClock,
        config::GameConfig,
        engine::Engine,
        persistence::{Baseline, MemoryBaselineStore},
    };

    fn create_test_app(state: AppState) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let engine = Engine::with_clock(GameConfig::default().with_seed(11), clock.clone())
            .with_store(MemoryBaselineStore::default());
        let mut app = App::new(engine);
        if state == AppState::Achievements {
            app.state = state;
        } else if state != AppState::Menu {
            app.engine.start_session();
            app.state = AppState::Playing;
        }
        if state == AppState::Results {
            clock.advance_ms(30_000);
            app.on_tick();
        }
        (app, clock)
    }

    fn rendered(app: &App<ManualClock>, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_menu_screen() {
        let (app, _) = create_test_app(AppState::Menu);
        let content = rendered(&app, 80, 24);
        assert!(content.contains("STROOP RUSH"));
        assert!(content.contains("enter"));
    }

    #[test]
    fn test_playing_screen_shows_prompt_and_options() {
        let (app, _) = create_test_app(AppState::Playing);
        let content = rendered(&app, 80, 24);
        let snap = app.engine.get_snapshot();
        let round = snap.round.unwrap();

        assert!(content.contains("Find"));
        assert!(content.contains("[1]"));
        assert!(content.contains("[4]"));
        assert!(content.contains(&round.options[0].word.label()));
        assert!(content.contains("score 0"));
    }

    #[test]
    fn test_results_screen() {
        let (app, _) = create_test_app(AppState::Results);
        assert_eq!(app.state, AppState::Results);
        let content = rendered(&app, 80, 24);
        assert!(content.contains("accuracy"));
        assert!(content.contains("(r)etry"));
    }

    #[test]
    fn test_achievements_screen_lists_catalog() {
        let store = MemoryBaselineStore::new(Baseline {
            unlocked_achievements: vec!["persistent".to_string()],
            max_combo: 4,
            cleared_levels: 1,
        });
        let engine = Engine::with_clock(GameConfig::default(), ManualClock::new()).with_store(store);
        let mut app = App::new(engine);
        app.state = AppState::Achievements;

        let content = rendered(&app, 80, 24);
        assert!(content.contains("ACHIEVEMENTS"));
        assert!(content.contains("☆ Combo Master"));
        assert!(content.contains("Reach a 15 answer combo"));
        assert!(content.contains("★ Persistent"));
    }

    #[test]
    fn test_menu_shows_stored_bests() {
        let store = MemoryBaselineStore::new(Baseline {
            unlocked_achievements: vec!["persistent".to_string()],
            max_combo: 12,
            cleared_levels: 2,
        });
        let engine = Engine::with_clock(GameConfig::default(), ManualClock::new()).with_store(store);
        let app = App::new(engine);

        let content = rendered(&app, 100, 24);
        assert!(content.contains("best combo 12"));
        assert!(content.contains("levels cleared 2"));
    }

    #[test]
    fn test_results_use_achievement_names() {
        let clock = ManualClock::new();
        let engine = Engine::with_clock(GameConfig::default().with_seed(3), clock.clone())
            .with_store(MemoryBaselineStore::default());
        let mut app = App::new(engine);
        app.engine.set_debug(true);
        app.engine.start_session();
        app.state = AppState::Playing;
        for _ in 0..15 {
            app.engine.submit_answer(0).unwrap();
        }
        app.engine.end_session().unwrap();
        app.state = AppState::Results;

        let content = rendered(&app, 100, 24);
        assert!(content.contains("Combo Master"));
        assert!(!content.contains("combo-master"));
    }

    #[test]
    fn test_option_inks_are_applied() {
        let (app, _) = create_test_app(AppState::Playing);
        let area = Rect::new(0, 0, 80, 24);
        let mut buffer = Buffer::empty(area);
        (&app).render(area, &mut buffer);

        let snap = app.engine.get_snapshot();
        let first = snap.round.unwrap().options[0];
        let expected = ink(first.color);
        assert!(buffer.content.iter().any(|c| c.fg == expected));
    }

    #[test]
    fn test_small_and_large_areas_do_not_panic() {
        for state in [
            AppState::Menu,
            AppState::Playing,
            AppState::Results,
            AppState::Achievements,
        ] {
            let (app, _) = create_test_app(state);
            for (w, h) in [(10, 3), (20, 5), (200, 60)] {
                rendered(&app, w, h);
            }
        }
    }

    #[test]
    fn test_draw_through_terminal() {
        let (app, _) = create_test_app(AppState::Playing);
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();
    }

    #[test]
    fn test_pink_is_distinct_from_red() {
        assert_ne!(ink(ColorId::Pink), ink(ColorId::Red));
        assert_eq!(ink(ColorId::Purple), Color::Magenta);
    }

    #[test]
    fn test_wrapped_rows() {
        assert_eq!(wrapped_rows("", 80), 1);
        assert_eq!(wrapped_rows("short", 80), 1);
        // 20 columns minus both margins leaves 10
        assert_eq!(wrapped_rows("0123456789a", 20), 2);
        assert_eq!(wrapped_rows("anything", 4), 8);
    }

    #[test]
    fn test_pad_to_uses_display_width() {
        assert_eq!(pad_to("red", 6), "red   ");
        assert_eq!(pad_to("▒▒", 3), "▒▒ ");
        assert_eq!(pad_to("purple", 3), "purple");
    }

    #[test]
    fn test_ui_constants() {
        assert_eq!(HORIZONTAL_MARGIN, 5);
        assert_eq!(VERTICAL_MARGIN, 2);
        assert_eq!(OPTIONS_PER_ROW, 3);
    }
}
