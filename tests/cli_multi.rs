use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn command_multi() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("ham");
    let output = cmd
        .arg("multi")
        .arg("-g")
        .arg("tests/data/geno.csv")
        .arg("-p")
        .arg("tests/data/pheno.tsv")
        .arg("--phenotype")
        .arg("weight")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    // header + one row per block
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.starts_with("pvalue,chromosome,"));
    assert!(stdout.contains(",1,100,201,301,2"));
    assert!(stdout.contains(",1,400,201,601,2"));
    assert!(stdout.contains(",2,100,201,301,2"));

    // the {A,B,C}|{D,E,F} blocks separate the phenotype cleanly
    let second_line = stdout.lines().nth(1).unwrap();
    let p: f64 = second_line.split(',').next().unwrap().parse()?;
    assert!(p < 0.01, "p = {}", p);
    Ok(())
}

#[test]
fn command_multi_sex_filter_shrinks_panel() -> anyhow::Result<()> {
    // only A, B, D, F have female rows; no haplotype group keeps 3 of them
    let mut cmd = cargo_bin_cmd!("ham");
    let output = cmd
        .arg("multi")
        .arg("-g")
        .arg("tests/data/geno.csv")
        .arg("-p")
        .arg("tests/data/pheno.tsv")
        .arg("--phenotype")
        .arg("weight")
        .arg("--sex")
        .arg("female")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert_eq!(stdout.lines().count(), 1);
    Ok(())
}

#[test]
fn command_multi_bad_sex_filter() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("ham");
    cmd.arg("multi")
        .arg("-g")
        .arg("tests/data/geno.csv")
        .arg("-p")
        .arg("tests/data/pheno.tsv")
        .arg("--phenotype")
        .arg("weight")
        .arg("--sex")
        .arg("both");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown sex filter"));
    Ok(())
}
