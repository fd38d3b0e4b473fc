use assert_cmd::Command;
use plague::report::read_history_json;
use tempfile::tempdir;

#[test]
fn runs_a_scenario() {
    let temp_dir = tempdir().unwrap();

    let output = Command::cargo_bin("plague")
        .unwrap()
        .args(["--config", "tests/data/silk_road.json", "--output-dir"])
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("of 13 cities reached"), "{stdout}");

    let export = read_history_json(&temp_dir.path().join("history.json")).unwrap();
    assert_eq!(export.horizon, 60);
    assert_eq!(export.cities.len(), 13);
    assert!(temp_dir.path().join("history.csv").exists());
}

#[test]
fn rejects_a_missing_scenario() {
    let temp_dir = tempdir().unwrap();

    Command::cargo_bin("plague")
        .unwrap()
        .args(["--config", "tests/data/missing.json", "--output-dir"])
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn steps_past_the_horizon_fail() {
    let temp_dir = tempdir().unwrap();

    Command::cargo_bin("plague")
        .unwrap()
        .args(["--config", "tests/data/silk_road.json", "--steps", "100", "--output-dir"])
        .arg(temp_dir.path())
        .assert()
        .failure();
}
