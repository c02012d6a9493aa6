use clap::*;

use ham::libs::blocks::BlockParams;
use ham::libs::driver::{responses_in_order, scan_blocks_genome_wide};
use ham::libs::stats::{f_test_partitions, strain_mean_vector};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("multi")
        .about("Multi-group haplotype block ANOVA scan")
        .after_help(
            r###"Estimates haplotype blocks genome-wide and ANOVA-tests the full
multi-way strain grouping of each block against the phenotype.

Output is CSV, one row per block, sorted by p-value:

    pvalue,chromosome,block_start_bp,block_extent_bp,block_end_bp,num_groups

num_groups counts the distinct haplotype groups in the block before
the tester drops undersized ones.

"###,
        )
        .arg(
            Arg::new("min_extent")
                .long("min-extent")
                .num_args(1)
                .default_value("3")
                .value_parser(value_parser!(usize))
                .help("Minimum SNPs per block"),
        )
        .arg(
            Arg::new("min_group")
                .long("min-group")
                .num_args(1)
                .default_value("3")
                .value_parser(value_parser!(usize))
                .help("Minimum strains sharing a haplotype"),
        );
    super::input_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let loaded = super::load_experiment(args)?;
    let params = BlockParams {
        min_snp_extent: *args.get_one::<usize>("min_extent").unwrap(),
        min_strain_group_size: *args.get_one::<usize>("min_group").unwrap(),
    };

    let mut writer = ham::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Ops
    //----------------------------
    let (_binary, multi) = scan_blocks_genome_wide(&loaded.genome, &loaded.strains, &params)?;

    let means = strain_mean_vector(&responses_in_order(&loaded.strains, &loaded.phenotype_data));
    let partitions: Vec<&[i16]> = multi.iter().map(|m| m.groups.as_slice()).collect();
    let p_values = f_test_partitions(&partitions, &means)?;

    //----------------------------
    // Output
    //----------------------------
    let mut rows: Vec<(f64, String)> = multi
        .iter()
        .zip(p_values.iter())
        .map(|(block, &p)| {
            let mut ids: Vec<i16> = block.groups.clone();
            ids.sort();
            ids.dedup();
            let iv = &block.interval;
            (
                p,
                format!(
                    "{},{},{},{},{},{}",
                    p,
                    iv.chromosome,
                    iv.start_bp,
                    iv.extent_bp,
                    iv.end_bp(),
                    ids.len()
                ),
            )
        })
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    writer.write_all(b"pvalue,chromosome,block_start_bp,block_extent_bp,block_end_bp,num_groups\n")?;
    for (_, row) in rows {
        writer.write_all(row.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    Ok(())
}
