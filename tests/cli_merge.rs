use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn command_merge_two_files() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let outfile = dir.path().join("merged.vcf");

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("merge")
        .arg("tests/vcf/a.vcf")
        .arg("tests/vcf/b.vcf")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&outfile)?,
        fs::read_to_string("tests/vcf/merged.vcf")?
    );

    Ok(())
}

#[test]
fn command_merge_list_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let outfile = dir.path().join("merged.vcf");

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("merge")
        .arg("--list")
        .arg("tests/vcf/list.txt")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&outfile)?,
        fs::read_to_string("tests/vcf/merged.vcf")?
    );

    Ok(())
}

#[test]
fn command_merge_with_itself() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("vcftk")?;
    let output = cmd
        .arg("merge")
        .arg("tests/vcf/a.vcf")
        .arg("tests/vcf/a.vcf")
        .arg("-o")
        .arg("stdout")
        .arg("-p")
        .arg("2")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(output.status.success());
    assert_eq!(stdout.matches("##fileformat=VCFv4.2\n").count(), 1);
    assert_eq!(stdout.matches("##source=a\n").count(), 1);
    assert!(stdout.contains("\tFORMAT\tS1\tS3\n"));
    assert_eq!(stdout.lines().filter(|l| !l.starts_with('#')).count(), 3);
    assert!(stdout.contains("1\t100\trsA\tA\tG\t50\tPASS\tDP=10\tGT\t0/1\t0/0\n"));

    Ok(())
}

#[test]
fn command_merge_same_position() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let a = dir.path().join("a.vcf");
    let b = dir.path().join("b.vcf");
    let outfile = dir.path().join("ab.vcf");
    let head = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT";
    fs::write(&a, format!("{}\tS1\n1\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\n", head))?;
    fs::write(&b, format!("{}\tS2\n1\t100\t.\tA\tG\t.\t.\t.\tGT\t1/1\n", head))?;

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("merge")
        .arg(&a)
        .arg(&b)
        .arg("-o")
        .arg(&outfile)
        .assert()
        .success();

    let merged = fs::read_to_string(&outfile)?;
    assert!(merged.contains("\tFORMAT\tS1\tS2\n"));
    let records: Vec<&str> = merged.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(records, vec!["1\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\t1/1"]);

    Ok(())
}

#[test]
fn command_merge_output_exists() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let outfile = dir.path().join("merged.vcf");
    fs::write(&outfile, "existing\n")?;

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("merge")
        .arg("tests/vcf/a.vcf")
        .arg("tests/vcf/b.vcf")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&outfile)?, "existing\n");

    Ok(())
}

#[test]
fn command_merge_missing_input() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let outfile = dir.path().join("merged.vcf");

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("merge")
        .arg("tests/vcf/a.vcf")
        .arg("tests/vcf/no_such.vcf")
        .arg("-o")
        .arg(&outfile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
    assert!(!outfile.exists());

    Ok(())
}

#[test]
fn command_merge_schema_mismatch() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let odd = dir.path().join("odd.vcf");
    let outfile = dir.path().join("merged.vcf");
    fs::write(
        &odd,
        "#CHROM\tPOS\tREF\tALT\tID\tQUAL\tFILTER\tINFO\tFORMAT\tS9\n1\t5\tA\tC\t.\t.\t.\t.\tGT\t0/1\n",
    )?;

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("merge")
        .arg("tests/vcf/a.vcf")
        .arg(&odd)
        .arg("-o")
        .arg(&outfile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("differ from the first input"));
    assert!(!outfile.exists());

    Ok(())
}

#[test]
fn command_merge_requires_outfile() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.arg("merge").arg("tests/vcf/a.vcf").assert().failure();

    Ok(())
}

#[test]
fn command_merge_file_named_stdin() -> anyhow::Result<()> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("stdin"),
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n2\t8\t.\tA\tC\t.\t.\t.\tGT\t0/1\n",
    )?;

    let mut cmd = Command::cargo_bin("vcftk")?;
    cmd.current_dir(dir.path())
        .arg("merge")
        .arg("stdin")
        .arg("-o")
        .arg("out.vcf")
        .assert()
        .success();

    let merged = fs::read_to_string(dir.path().join("out.vcf"))?;
    assert!(merged.contains("2\t8\t.\tA\tC\t.\t.\t.\tGT\t0/1\n"));

    Ok(())
}
