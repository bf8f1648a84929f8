use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use stroop_rush::{
    achievements::AchievementCatalog, clock::Clock, evaluator::Outcome, rewards::RewardKind,
    session::RoundView,
};
use webbrowser::Browser;

use unicode_width::UnicodeWidthStr;

use super::{
    bold_style, dim_bold_style, ink, italic_style, pad_to, wrapped_rows, HORIZONTAL_MARGIN,
    OPTIONS_PER_ROW, VERTICAL_MARGIN,
};
use crate::{App, AppState, Feedback};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen<C: Clock> {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer);
}

pub struct MenuScreen;

impl<C: Clock> Screen<C> for MenuScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(2), // title
                Constraint::Length(2), // blurb
                Constraint::Length(2), // bests
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "STROOP RUSH",
            bold_style().fg(Color::Magenta),
        ))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            "Pick the option that matches the prompt before the clock runs out.",
            italic_style(),
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

        let baseline = app.engine.baseline();
        let mut bests = vec![Span::styled(
            format!(
                "best combo {}   levels cleared {}   achievements {}",
                baseline.max_combo,
                baseline.cleared_levels,
                baseline.unlocked_achievements.len()
            ),
            dim_bold_style(),
        )];
        if app.engine.debug() {
            bests.push(Span::styled("   DEBUG", bold_style().fg(Color::Red)));
        }
        Paragraph::new(Line::from(bests))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        Paragraph::new(Span::styled(
            "(enter) start / (a)chievements / (ctrl+d) debug / (q)uit",
            italic_style(),
        ))
        .render(chunks[5], buf);
    }
}

pub struct PlayingScreen;

const COVER: &str = "▒▒▒▒";

fn option_lines(round: &RoundView) -> Vec<Line<'static>> {
    let cell = round
        .options
        .iter()
        .map(|card| card.word.label().width())
        .max()
        .unwrap_or(0)
        .max(COVER.width());

    round
        .options
        .iter()
        .enumerate()
        .collect::<Vec<_>>()
        .chunks(OPTIONS_PER_ROW)
        .map(|row| {
            let mut spans = Vec::new();
            for (idx, card) in row {
                if !spans.is_empty() {
                    spans.push(Span::raw("    "));
                }
                spans.push(Span::styled(format!("[{}] ", idx + 1), dim_bold_style()));
                if round.covered.contains(idx) {
                    spans.push(Span::styled(pad_to(COVER, cell), dim_bold_style()));
                } else {
                    spans.push(Span::styled(
                        pad_to(&card.word.label(), cell),
                        bold_style().fg(ink(card.color)),
                    ));
                }
            }
            Line::from(spans)
        })
        .collect()
}

fn feedback_line(feedback: &Feedback) -> Line<'static> {
    let mut spans = match feedback.outcome {
        Outcome::Correct => vec![Span::styled(
            format!("✓ +{}", feedback.gained),
            bold_style().fg(Color::Green),
        )],
        Outcome::Incorrect if feedback.immunity_consumed => vec![Span::styled(
            "✗ shield absorbed the miss",
            bold_style().fg(Color::Cyan),
        )],
        Outcome::Incorrect => vec![Span::styled("✗ -1s", bold_style().fg(Color::Red))],
    };

    for reward in &feedback.rewards {
        let text = match reward {
            RewardKind::DoubleScore { duration_ms } => {
                format!("   double score {:.0}s!", *duration_ms as f64 / 1000.0)
            }
            RewardKind::ExtraTime { seconds } => format!("   +{seconds:.0}s bonus time!"),
            RewardKind::Immunity { charges } => format!("   +{charges} shield!"),
        };
        spans.push(Span::styled(text, bold_style().fg(Color::Yellow)));
    }
    if feedback.leveled_up {
        spans.push(Span::styled("   LEVEL UP", bold_style().fg(Color::Magenta)));
    }
    Line::from(spans)
}

impl<C: Clock> Screen<C> for PlayingScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let snap = app.engine.get_snapshot();
        let option_rows = snap
            .round
            .as_ref()
            .map_or(0, |r| r.options.len().div_ceil(OPTIONS_PER_ROW)) as u16;
        let prompt_rows = snap
            .round
            .as_ref()
            .map_or(1, |r| wrapped_rows(&r.prompt, area.width));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // status
                Constraint::Length(1), // active rewards
                Constraint::Min(0),
                Constraint::Length(prompt_rows + 1),
                Constraint::Length(option_rows * 2),
                Constraint::Min(0),
                Constraint::Length(1), // feedback
                Constraint::Length(1), // legend
            ])
            .split(area);

        let time_style = if snap.remaining_time <= 5.0 {
            bold_style().fg(Color::Red)
        } else {
            bold_style()
        };
        Paragraph::new(Line::from(vec![
            Span::styled(
                format!(
                    "score {}   combo {}   level {}   ",
                    snap.score, snap.combo, snap.level
                ),
                bold_style(),
            ),
            Span::styled(format!("{:.1}s", snap.remaining_time), time_style),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let mut effects = Vec::new();
        if let Some(left) = snap.double_score_remaining {
            effects.push(Span::styled(
                format!("x2 {left:.1}s  "),
                bold_style().fg(Color::Yellow),
            ));
        }
        if snap.immunity_count > 0 {
            effects.push(Span::styled(
                format!("shield x{}  ", snap.immunity_count),
                bold_style().fg(Color::Cyan),
            ));
        }
        if snap.debug {
            effects.push(Span::styled("DEBUG", bold_style().fg(Color::Red)));
        }
        Paragraph::new(Line::from(effects))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        if let Some(round) = &snap.round {
            Paragraph::new(Span::styled(round.prompt.clone(), bold_style()))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[3], buf);

            let mut lines = Vec::new();
            for line in option_lines(round) {
                lines.push(line);
                lines.push(Line::default());
            }
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .render(chunks[4], buf);
        }

        if let Some(feedback) = &app.feedback {
            Paragraph::new(feedback_line(feedback))
                .alignment(Alignment::Center)
                .render(chunks[6], buf);
        }

        Paragraph::new(Span::styled("(1-9) pick / (esc) menu", italic_style()))
            .render(chunks[7], buf);
    }
}

pub struct ResultsScreen;

impl<C: Clock> Screen<C> for ResultsScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(2), // heading
                Constraint::Length(5), // stats
                Constraint::Length(2), // achievements
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled("TIME'S UP", bold_style().fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        if let Some(result) = app.engine.last_result() {
            let stats = vec![
                Line::from(Span::styled(format!("score {}", result.score), bold_style())),
                Line::from(Span::styled(
                    format!(
                        "best combo {}   levels cleared {}",
                        result.max_combo, result.cleared_levels
                    ),
                    bold_style(),
                )),
                Line::from(Span::styled(
                    format!(
                        "{}% accuracy   fastest {:.2}s   average {:.2}s",
                        result.accuracy, result.fastest_reaction, result.average_reaction
                    ),
                    bold_style(),
                )),
                Line::from(Span::styled(
                    format!("played {:.1}s", result.total_time),
                    dim_bold_style(),
                )),
            ];
            Paragraph::new(stats)
                .alignment(Alignment::Center)
                .render(chunks[2], buf);

            if !result.unlocked_achievements.is_empty() {
                let names: Vec<&str> = match app.engine.achievement_catalog() {
                    Some(catalog) => result
                        .unlocked_achievements
                        .iter()
                        .map(|id| catalog.name_of(id))
                        .collect(),
                    None => result.unlocked_achievements.iter().map(String::as_str).collect(),
                };
                Paragraph::new(Span::styled(
                    format!("unlocked: {}", names.join(", ")),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD | Modifier::ITALIC),
                ))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .render(chunks[3], buf);
            }
        }

        Paragraph::new(Span::styled(
            if Browser::is_available() {
                "(r)etry / (t)weet / (m)enu / (q)uit"
            } else {
                "(r)etry / (m)enu / (q)uit"
            },
            italic_style(),
        ))
        .render(chunks[5], buf);
    }
}

pub struct AchievementsScreen;

fn achievement_lines(catalog: &AchievementCatalog, unlocked: &[String]) -> Vec<Line<'static>> {
    catalog
        .progress(unlocked)
        .flat_map(|(achievement, done)| {
            let (mark, style) = if done {
                ("★", bold_style().fg(Color::Yellow))
            } else {
                ("☆", dim_bold_style())
            };
            [
                Line::from(Span::styled(format!("{mark} {}", achievement.name), style)),
                Line::from(Span::styled(achievement.description, italic_style())),
                Line::default(),
            ]
        })
        .collect()
}

impl<C: Clock> Screen<C> for AchievementsScreen {
    fn render(&self, app: &App<C>, area: Rect, buf: &mut Buffer) {
        let unlocked = &app.engine.baseline().unlocked_achievements;
        let lines = match app.engine.achievement_catalog() {
            Some(catalog) => achievement_lines(catalog, unlocked),
            None => vec![Line::from(Span::styled(
                format!("{} unlocked", unlocked.len()),
                dim_bold_style(),
            ))],
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2), // heading
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled("ACHIEVEMENTS", bold_style().fg(Color::Magenta)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        Paragraph::new(Span::styled("(m)enu / (q)uit", italic_style())).render(chunks[2], buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen<C: Clock + 'static>(state: &AppState) -> Box<dyn Screen<C>> {
    match state {
        AppState::Menu => Box::new(MenuScreen),
        AppState::Playing => Box::new(PlayingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Achievements => Box::new(AchievementsScreen),
    }
}
