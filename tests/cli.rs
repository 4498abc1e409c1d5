use std::io::Write;

use assert_cmd::Command;
use tempfile::NamedTempFile;

fn contagion() -> Command {
    Command::cargo_bin("contagion").unwrap()
}

#[test]
fn prints_a_summary() {
    let output = contagion()
        .args(["--random-seed", "3", "--population-size", "40", "--max-days", "8"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(summary["days_elapsed"].as_u64().unwrap() <= 8);
    assert!(summary["termination"].is_string());
    assert!(summary["final_counts"]["healthy"].is_u64());
}

#[test]
fn same_seed_same_output() {
    let run = || {
        contagion()
            .args(["-r", "17", "-p", "60", "--house-density", "medium"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn replicates_print_an_array() {
    let output = contagion()
        .args(["--replicates", "3", "--population-size", "30", "--max-days", "4"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summaries: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summaries.as_array().unwrap().len(), 3);
}

#[test]
fn reads_a_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "population_size": 20, "initial_infected": 0, "max_days": 5 }}"#
    )
    .unwrap();
    let output = contagion()
        .arg("--config")
        .arg(file.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["termination"], "burned_out");
    assert_eq!(summary["days_elapsed"], 0);
    assert_eq!(summary["final_counts"]["healthy"], 20);
}

#[test]
fn rejects_invalid_configuration() {
    contagion()
        .args(["--population-size", "5"])
        .assert()
        .failure();

    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "infection_probability": 1.5 }}"#).unwrap();
    contagion().arg("--config").arg(file.path()).assert().failure();

    let mut unknown = NamedTempFile::new().unwrap();
    write!(unknown, r#"{{ "virulence": 0.5 }}"#).unwrap();
    contagion().arg("--config").arg(unknown.path()).assert().failure();
}

#[test]
fn logs_go_to_stderr() {
    let output = contagion()
        .args(["-v", "--population-size", "20", "--max-days", "2"])
        .assert()
        .success()
        .get_output()
        .clone();
    let summary: Result<serde_json::Value, _> = serde_json::from_slice(&output.stdout);
    assert!(summary.is_ok());
}
