use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

fn orders_csv() -> tempfile::NamedTempFile {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "order_id,store_id,amount,status,date").unwrap();
    writeln!(csv, "O1,S1,100.00,delivered,2024-01-05").unwrap();
    csv
}

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let csv = orders_csv();
    let mut cmd = Command::new(cargo_bin!("market-settle"));
    cmd.arg("settle")
        .arg(csv.path())
        .arg("--period")
        .arg("2024-01")
        .arg("--db-path")
        .arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "'storage-rocksdb' feature is not enabled. Falling back to in-memory storage.",
        ))
        .stdout(predicate::str::contains("S1,2024-01,1,10"));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let csv = orders_csv();
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("market-settle"));
    cmd.arg("settle")
        .arg(csv.path())
        .arg("--period")
        .arg("2024-01")
        .arg("--db-path")
        .arg(&db_path);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());
}
