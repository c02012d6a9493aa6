extern crate clap;
use clap::*;

mod cmd_ham;

fn main() -> anyhow::Result<()> {
    let app = Command::new("ham")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`ham` - Haplotype Association Mapping over inbred strain panels")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_ham::hap::make_subcommand())
        .subcommand(cmd_ham::multi::make_subcommand())
        .subcommand(cmd_ham::phylo::make_subcommand())
        .subcommand(cmd_ham::pheno::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Association scans:
    * hap   - Haplotype block t-test scan (equivalence classes)
    * multi - Multi-group haplotype block ANOVA scan
    * phylo - Perfect-phylogeny edge test scan

* Inputs:
    * pheno - Inspect a tall-format phenotype table

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("hap", sub_matches)) => cmd_ham::hap::execute(sub_matches),
        Some(("multi", sub_matches)) => cmd_ham::multi::execute(sub_matches),
        Some(("phylo", sub_matches)) => cmd_ham::phylo::execute(sub_matches),
        Some(("pheno", sub_matches)) => cmd_ham::pheno::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
