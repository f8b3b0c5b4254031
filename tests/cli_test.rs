//! Command-line interface tests. These only exercise paths that never reach
//! the inference fallback chain, so they stay fast with no network access.

mod common;

use assert_cmd::Command;
use common::write_machine_csv;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("machine-insight").unwrap();
    cmd.env("MACHINE_INSIGHT_BACKEND", "files")
        .env("MACHINE_INSIGHT_DATA_DIR", data_dir.path())
        .env("LOG_OUTPUT", "console")
        .env("LOG_LEVEL", "error");
    cmd
}

#[test]
fn test_machines_lists_in_natural_order() {
    let dir = TempDir::new().unwrap();
    write_machine_csv(dir.path(), "M2", "june_2024.csv", "date,avg_oee\n2024-06-01,80\n");
    write_machine_csv(dir.path(), "M10", "june_2024.csv", "date,avg_oee\n2024-06-01,70\n");

    cli(&dir)
        .arg("machines")
        .assert()
        .success()
        .stdout(predicate::str::contains("M2\nM10"));
}

#[test]
fn test_machines_json_output() {
    let dir = TempDir::new().unwrap();
    write_machine_csv(dir.path(), "M1", "june_2024.csv", "date,avg_oee\n2024-06-01,80\n");

    cli(&dir)
        .args(["machines", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["M1"]"#));
}

#[test]
fn test_machines_empty_data_dir() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .arg("machines")
        .assert()
        .success()
        .stdout(predicate::str::contains("No machines found"));
}

#[test]
fn test_summary_prints_totals() {
    let dir = TempDir::new().unwrap();
    write_machine_csv(
        dir.path(),
        "M1",
        "june_2024.csv",
        "date,Ai_partcount,total_part_reject,avg_oee\n\
         2024-06-01,100,5,80\n\
         2024-06-02,200,10,90\n",
    );

    cli(&dir)
        .args(["summary", "M1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Machine M1"))
        .stdout(predicate::str::contains("Parts produced: 300"))
        .stdout(predicate::str::contains("Quality rate:   95.00%"));
}

#[test]
fn test_summary_json_output() {
    let dir = TempDir::new().unwrap();
    write_machine_csv(
        dir.path(),
        "M1",
        "june_2024.csv",
        "date,Ai_partcount\n2024-06-01,42\n",
    );

    cli(&dir)
        .args(["summary", "M1", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""total_parts_produced": 42"#));
}

#[test]
fn test_ask_unknown_machine_fails() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .args(["ask", "M404", "summary for June 2024"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("No data found for machine M404"));
}

#[test]
fn test_rejects_unknown_backend() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .env("MACHINE_INSIGHT_BACKEND", "spreadsheet")
        .arg("machines")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown data source backend"));
}

#[test]
fn test_help_shows_subcommands() {
    Command::cargo_bin("machine-insight")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("summary"))
        .stdout(predicate::str::contains("machines"));
}
