// Drives the compiled binary through a PTY so the real event loop and
// crossterm input handling run end to end.
//
// Requires a TTY (expectrl allocates a pseudo terminal), so it is Unix-only
// and ignored by default. Run it with
// `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn menu_round_and_quit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let baseline = dir.path().join("baseline.json");
    let config = dir.path().join("config.json");

    let bin = assert_cmd::cargo::cargo_bin("stroop-rush");
    let cmd = format!(
        "{} --seed 7 -b {} -c {}",
        bin.display(),
        baseline.display(),
        config.display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // start from the menu, answer once, then back out
    p.send("\r")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("1")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("\x1b")?;
    std::thread::sleep(Duration::from_millis(200));
    p.send("q")?;

    p.expect(Eof)?;

    // leaving mid-session does not record anything
    assert!(!baseline.exists());
    Ok(())
}
