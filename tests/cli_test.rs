use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::tempdir;

fn txledger(base: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_txledger"))
        .arg("--ledger")
        .arg(base)
        .args(args)
        .output()?;
    Ok(output)
}

#[test]
fn test_cli_lifecycle() -> Result<()> {
    let dir = tempdir()?;
    let base = dir.path().join("tm");

    assert!(txledger(&base, &["init"])?.status.success());

    let output = txledger(&base, &["begin"])?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.trim(), "1");

    assert!(txledger(&base, &["commit", "1"])?.status.success());

    let output = txledger(&base, &["status", "1"])?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.trim(), "Committed");

    Ok(())
}

#[test]
fn test_cli_exits_on_corrupt_ledger() -> Result<()> {
    let dir = tempdir()?;
    let base = dir.path().join("tm");

    assert!(txledger(&base, &["init"])?.status.success());
    assert!(txledger(&base, &["begin"])?.status.success());

    // Status byte past the end implied by the counter.
    let mut file = OpenOptions::new()
        .append(true)
        .open(dir.path().join("tm.xid"))?;
    file.write_all(&[0])?;
    drop(file);

    let output = txledger(&base, &["status", "1"])?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(
        stderr.contains("fatal: Corrupt ledger: counter 1 implies 9 bytes, file has 10"),
        "unexpected stderr: {}",
        stderr
    );
    assert!(output.stdout.is_empty());

    Ok(())
}

#[test]
fn test_cli_exits_on_missing_ledger() -> Result<()> {
    let dir = tempdir()?;
    let base = dir.path().join("missing");

    let output = txledger(&base, &["status", "1"])?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr)?;
    assert!(
        stderr.contains("fatal: Ledger file not found"),
        "unexpected stderr: {}",
        stderr
    );
    assert!(!dir.path().join("missing.xid").exists());

    Ok(())
}

#[test]
fn test_cli_exits_on_existing_ledger() -> Result<()> {
    let dir = tempdir()?;
    let base = dir.path().join("tm");

    assert!(txledger(&base, &["init"])?.status.success());

    let output = txledger(&base, &["init"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr)?.contains("fatal: Ledger file already exists"));

    Ok(())
}
