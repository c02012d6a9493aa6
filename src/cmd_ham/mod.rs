//! Subcommand modules for the `ham` binary.

pub mod hap;
pub mod multi;
pub mod pheno;
pub mod phylo;

use std::collections::BTreeMap;

use clap::*;

use ham::libs::driver::{common_strains, MIN_COMMON_STRAINS};
use ham::libs::genotype::{read_genotype_csv, GenomeData};
use ham::libs::phenotype::{parse_phenotypes, SexFilter};

/// Arguments shared by every association subcommand.
pub fn input_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("geno")
            .long("geno")
            .short('g')
            .num_args(1)
            .required(true)
            .help("Genotype CSV file"),
    )
    .arg(
        Arg::new("pheno")
            .long("pheno")
            .short('p')
            .num_args(1)
            .required(true)
            .help("Tall-format phenotype file (tab-separated)"),
    )
    .arg(
        Arg::new("phenotype")
            .long("phenotype")
            .num_args(1)
            .help("Phenotype variable name; optional for single-variable tables"),
    )
    .arg(
        Arg::new("sex")
            .long("sex")
            .num_args(1)
            .default_value("any")
            .help("Sex filter: any, female or male"),
    )
    .arg(
        Arg::new("genome_name")
            .long("genome-name")
            .num_args(1)
            .default_value("genome")
            .help("Genome source name (cache key component)"),
    )
    .arg(
        Arg::new("verbose")
            .long("verbose")
            .short('v')
            .action(ArgAction::SetTrue)
            .help("Print runtime information"),
    )
    .arg(
        Arg::new("outfile")
            .long("outfile")
            .short('o')
            .num_args(1)
            .default_value("stdout")
            .help("Output filename. [stdout] for screen"),
    )
}

/// Loaded inputs restricted to the common strain set, bit order fixed.
pub struct LoadedExperiment {
    pub genome: GenomeData,
    pub phenotype_name: String,
    pub phenotype_data: BTreeMap<String, Vec<f64>>,
    pub strains: Vec<String>,
}

/// Shared driver preamble: load both sources, intersect strain sets,
/// refuse to run on fewer than three common strains.
pub fn load_experiment(args: &ArgMatches) -> anyhow::Result<LoadedExperiment> {
    let geno_file = args.get_one::<String>("geno").unwrap();
    let pheno_file = args.get_one::<String>("pheno").unwrap();
    let phenotype = args.get_one::<String>("phenotype").map(|s| s.as_str());
    let sex_filter: SexFilter = args.get_one::<String>("sex").unwrap().parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let genome_name = args.get_one::<String>("genome_name").unwrap();
    let verbose = args.get_flag("verbose");

    let genome = read_genotype_csv(&mut ham::reader(geno_file), genome_name)?;
    let phenotype_data = parse_phenotypes(&mut ham::reader(pheno_file), phenotype, sex_filter, None)?;
    let phenotype_name = phenotype
        .map(|s| s.to_string())
        .unwrap_or_else(|| "phenotype".to_string());

    let strains = common_strains(&genome, &phenotype_data);
    if strains.len() < MIN_COMMON_STRAINS {
        anyhow::bail!(
            "only {} strain(s) common to genotype and phenotype data; need at least {}",
            strains.len(),
            MIN_COMMON_STRAINS
        );
    }

    let mut phenotype_data = phenotype_data;
    phenotype_data.retain(|strain, _| strains.binary_search(strain).is_ok());

    if verbose {
        eprintln!("==> Inputs");
        eprintln!("    \"geno\"    = {}", geno_file);
        eprintln!("    \"pheno\"   = {}", pheno_file);
        eprintln!("==> Strains");
        eprintln!("    common    = {}", strains.len());
        eprintln!("    order     = {}", strains.join(","));
    }

    Ok(LoadedExperiment {
        genome,
        phenotype_name,
        phenotype_data,
        strains,
    })
}
