use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use stroop_rush::clock::ManualClock;
use stroop_rush::config::GameConfig;
use stroop_rush::engine::Engine;
use stroop_rush::persistence::MemoryBaselineStore;
use stroop_rush::runtime::{ChannelEventSource, FixedTicker, GameEvent, Runner};
use stroop_rush::session::SessionPhase;

fn engine(clock: &ManualClock) -> Engine<ManualClock> {
    Engine::with_clock(GameConfig::default().with_seed(21), clock.clone())
        .with_store(MemoryBaselineStore::default())
}

fn digit(n: usize) -> GameEvent {
    let c = char::from_digit(n as u32 + 1, 10).unwrap();
    GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless loop over the runtime without a TTY: keys become answers, ticks pump the engine.
#[test]
fn headless_answer_flow_scores() {
    let clock = ManualClock::new();
    let mut engine = engine(&clock);
    engine.start_session();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));

    let mut answered = 0;
    for _ in 0..20u32 {
        let snap = engine.get_snapshot();
        let round = snap.round.unwrap();
        let target = round.target.unwrap();
        let idx = round.options.iter().position(|o| *o == target).unwrap();
        tx.send(digit(idx)).unwrap();

        if let GameEvent::Key(key) = runner.step_engine(&mut engine) {
            if let KeyCode::Char(c) = key.code {
                let report = engine
                    .submit_answer(c.to_digit(10).unwrap() as usize - 1)
                    .unwrap();
                assert!(report.reaction_time.is_some());
                answered += 1;
            }
        }
        if answered == 5 {
            break;
        }
    }

    let snap = engine.get_snapshot();
    assert_eq!(answered, 5);
    assert_eq!(snap.correct_clicks, 5);
    assert_eq!(snap.combo, 5);
    assert_eq!(snap.phase, SessionPhase::Running);
}

#[test]
fn headless_session_finishes_by_time() {
    let clock = ManualClock::new();
    let mut engine = engine(&clock);
    engine.start_session();

    let (_tx, rx) = mpsc::channel::<GameEvent>();
    let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::new(Duration::from_millis(1)));

    for _ in 0..400u32 {
        clock.advance_ms(100);
        runner.step_engine(&mut engine);
        if engine.phase() == SessionPhase::Finished {
            break;
        }
    }

    assert_eq!(engine.phase(), SessionPhase::Finished);
    let snap = engine.get_snapshot();
    assert_eq!(snap.remaining_time, 0.0);
    assert_eq!(snap.total_time, 30.0);
}

#[test]
fn resize_events_do_not_touch_the_session() {
    let clock = ManualClock::new();
    let mut engine = engine(&clock);
    let before = engine.start_session();

    let (tx, rx) = mpsc::channel();
    tx.send(GameEvent::Resize).unwrap();
    let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));

    clock.advance_ms(1_000);
    assert!(matches!(runner.step_engine(&mut engine), GameEvent::Resize));
    // only ticks pump, so no time has been charged yet
    assert_eq!(engine.get_snapshot().remaining_time, before.remaining_time);
}
