use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("pain-engine"));
    cmd.arg("tests/fixtures/commands.csv")
        .arg("--config")
        .arg("tests/fixtures/config.json")
        .arg("--accounts")
        .arg("tests/fixtures/accounts.csv")
        .arg("--balances");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""fee_amount":"0.1000""#))
        .stdout(predicate::str::contains(r#""geo":"POINT(18.42 -33.92)""#))
        .stdout(predicate::str::contains(r#"{"history":[{"id":2"#))
        .stdout(predicate::str::contains(
            "account,account_balance,available_balance,timestamp",
        ))
        .stdout(predicate::str::contains("alice,89.9,89.9,"))
        .stdout(predicate::str::contains("bob,59.5,59.5,"))
        .stdout(predicate::str::contains("@holding,0.6,0.6,"));

    Ok(())
}

#[test]
fn test_cli_one_line_per_command() {
    let output = Command::new(cargo_bin!("pain-engine"))
        .arg("tests/fixtures/commands.csv")
        .arg("--config")
        .arg("tests/fixtures/config.json")
        .arg("--accounts")
        .arg("tests/fixtures/accounts.csv")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is JSON"))
        .collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["transaction"]["status"], "approved");
    assert_eq!(lines[1]["transaction"]["pain_type"], 1000);
    assert_eq!(lines[2]["history"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_cli_missing_config_fails() {
    let mut cmd = Command::new(cargo_bin!("pain-engine"));
    cmd.arg("tests/fixtures/commands.csv")
        .arg("--config")
        .arg("tests/fixtures/does-not-exist.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.json"));
}
