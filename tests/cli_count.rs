use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn command_count() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("count")
        .arg("tests/vcf/unsorted.vcf")
        .assert()
        .success()
        .stdout("6\n");

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("count")
        .arg("tests/vcf/merged.vcf")
        .assert()
        .success()
        .stdout("5\n");

    Ok(())
}

#[test]
fn command_count_missing() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("count")
        .arg("tests/vcf/no_such.vcf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not open"));

    Ok(())
}

#[test]
fn command_count_latin1() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let infile = dir.path().join("latin1.vcf");
    std::fs::write(
        &infile,
        b"##x\n1\t5\t.\tA\tG\t.\t.\tNOTE=caf\xE9\n2\t6\t.\tA\tG\t.\t.\t.\n",
    )?;

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("count").arg(&infile).assert().success().stdout("2\n");

    Ok(())
}
