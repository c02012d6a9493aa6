use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn command_pheno_list_vars() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("ham");
    let output = cmd
        .arg("pheno")
        .arg("tests/data/pheno.tsv")
        .arg("--list-vars")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout, "length\nweight\n");
    Ok(())
}

#[test]
fn command_pheno_list_strains() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("ham");
    let output = cmd
        .arg("pheno")
        .arg("tests/data/pheno.tsv")
        .arg("--list-strains")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 6);
    assert_eq!(stdout.lines().next(), Some("A"));
    assert_eq!(stdout.lines().last(), Some("F"));
    Ok(())
}

#[test]
fn command_pheno_requires_one_mode() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("ham");
    cmd.arg("pheno").arg("tests/data/pheno.tsv");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("exactly one"));
    Ok(())
}

#[test]
fn command_pheno_from_stdin() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("ham");
    cmd.arg("pheno")
        .arg("stdin")
        .arg("--list-vars")
        .write_stdin("strain\tsex\tvarname\tvalue\nA\tf\tweight\t1.0\n");
    cmd.assert()
        .success()
        .stdout(predicate::str::diff("weight\n"));
    Ok(())
}
