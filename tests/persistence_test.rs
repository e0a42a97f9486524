#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

fn settle(db_path: &std::path::Path, rows: &[&str]) -> String {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "order_id,store_id,amount,status,date").unwrap();
    for row in rows {
        writeln!(csv, "{}", row).unwrap();
    }
    let output = Command::new(cargo_bin!("market-settle"))
        .arg("settle")
        .arg(csv.path())
        .arg("--period")
        .arg("2024-01")
        .arg("--db-path")
        .arg(db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_payouts_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // First run settles S1.
    let first = settle(&db_path, &["O1,S1,100.00,delivered,2024-01-05"]);
    assert!(first.contains("S1,2024-01,1,10"));

    // Second run sees the stored payout for S1 and only settles S2.
    let second = settle(
        &db_path,
        &[
            "O1,S1,100.00,delivered,2024-01-05",
            "O2,S2,50.00,delivered,2024-01-06",
        ],
    );
    assert!(!second.contains("S1,2024-01"));
    assert!(second.contains("S2,2024-01,1,5"));
}
