use std::io::Cursor;

use serde_json::Value;
use stroop_rush::clock::ManualClock;
use stroop_rush::config::GameConfig;
use stroop_rush::engine::Engine;
use stroop_rush::headless::HeadlessDriver;
use stroop_rush::persistence::MemoryBaselineStore;

fn driver(store: &MemoryBaselineStore) -> HeadlessDriver<ManualClock> {
    let engine = Engine::with_clock(GameConfig::default().with_seed(5), ManualClock::new())
        .with_store(store.clone());
    HeadlessDriver::new(engine)
}

fn run(driver: &mut HeadlessDriver<ManualClock>, input: &str) -> Vec<Value> {
    let mut out = Vec::new();
    driver.run(Cursor::new(input), &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn scripted_session_over_json_lines() {
    let store = MemoryBaselineStore::default();
    let mut driver = driver(&store);
    let input = r#"{"command":"debug","enabled":true}
{"command":"start"}

{"command":"answer","option":0}
{"command":"answer","option":1}
{"command":"state"}
{"command":"end"}
"#;

    let responses = run(&mut driver, input);
    assert_eq!(responses.len(), 6);
    assert!(responses.iter().all(|r| r["status"] == "ok"));

    assert_eq!(responses[0]["debug"], true);
    assert_eq!(responses[1]["snapshot"]["phase"], "running");
    assert_eq!(responses[1]["snapshot"]["score"], 0);
    assert_eq!(responses[2]["answer"]["outcome"], "correct");
    assert_eq!(responses[4]["snapshot"]["score"], 20);
    assert_eq!(responses[4]["snapshot"]["combo"], 2);
    assert_eq!(responses[5]["result"]["score"], 20);
    assert_eq!(responses[5]["result"]["accuracy"], 100.0);

    assert_eq!(store.save_count(), 1);
    assert_eq!(store.current().max_combo, 2);
}

#[test]
fn errors_are_reported_inline() {
    let store = MemoryBaselineStore::default();
    let mut driver = driver(&store);
    let input = r#"{"command":"answer","option":0}
not json
{"command":"start"}
{"command":"answer","option":42}
{"command":"end"}
{"command":"end"}
"#;

    let responses = run(&mut driver, input);
    assert_eq!(responses.len(), 6);

    assert_eq!(responses[0]["status"], "error");
    assert_eq!(responses[0]["kind"], "no_active_round");
    assert_eq!(responses[1]["kind"], "bad_request");
    assert_eq!(responses[2]["status"], "ok");
    assert_eq!(responses[3]["kind"], "invalid_option");
    // a rejected click leaves the session untouched
    assert_eq!(responses[4]["result"]["score"], 0);
    assert_eq!(responses[5]["result"], responses[4]["result"]);

    assert_eq!(store.save_count(), 1);
}

#[test]
fn state_before_start_is_idle() {
    let store = MemoryBaselineStore::default();
    let mut driver = driver(&store);
    let responses = run(&mut driver, "{\"command\":\"state\"}\n");

    assert_eq!(responses[0]["status"], "ok");
    assert_eq!(responses[0]["snapshot"]["phase"], "idle");
    assert!(responses[0]["snapshot"].get("round").is_none());
}
