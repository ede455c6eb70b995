use std::{env, fs, process::Command};

fn necrowarp() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_necrowarp"));
    let _ = command.args(["--epoch-ms", "0", "--log-filter", "off"]);
    command
}

#[test]
fn headless_session_renders_every_turn() {
    let output = necrowarp()
        .args(["--seed", "3", "--turns", "4", "--render"])
        .output()
        .expect("failed to launch necrowarp");

    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 frames");
    let frames = stdout
        .lines()
        .filter(|line| line.starts_with("Necrowarp"))
        .count();
    assert!((1..=5).contains(&frames), "{stdout}");
    assert!(stdout.contains("turn 0 |"));
    assert!(stdout.contains('@') || stdout.contains("has fallen"));
}

#[test]
fn saved_regions_can_be_replayed() {
    let path = env::temp_dir().join(format!("necrowarp-region-{}.txt", std::process::id()));

    let saved = necrowarp()
        .args(["--seed", "9", "--turns", "1", "--save-region"])
        .arg(&path)
        .status()
        .expect("failed to launch necrowarp");
    assert!(saved.success());

    let line = fs::read_to_string(&path).expect("region written");
    assert!(line.starts_with("necrowarp:v1:64x32:"));

    let replayed = necrowarp()
        .args(["--seed", "1", "--turns", "2", "--region"])
        .arg(&path)
        .status()
        .expect("failed to launch necrowarp");
    assert!(replayed.success());

    let _ = fs::remove_file(&path);
}

#[test]
fn malformed_inputs_fail_cleanly() {
    let path = env::temp_dir().join(format!("necrowarp-bad-{}.txt", std::process::id()));
    fs::write(&path, "dungeon:v1:4x4:e30\n").expect("temp file writable");

    let bad_region = necrowarp()
        .args(["--seed", "1", "--region"])
        .arg(&path)
        .status()
        .expect("failed to launch necrowarp");
    assert!(!bad_region.success());

    let bad_script = necrowarp()
        .args(["--seed", "1", "--script", "hq"])
        .status()
        .expect("failed to launch necrowarp");
    assert!(!bad_script.success());

    let _ = fs::remove_file(&path);
}
