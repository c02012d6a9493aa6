use clap::*;
use itertools::Itertools;

use ham::libs::blocks::BlockParams;
use ham::libs::driver::{responses_in_order, scan_blocks_genome_wide};
use ham::libs::equiv::build_equivalence_classes;
use ham::libs::sdp::Sdp;
use ham::libs::stats::{normalized_scores, strain_mean_vector, t_test_partitions};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("hap")
        .about("Haplotype block t-test scan")
        .after_help(
            r###"Estimates haplotype blocks genome-wide, collapses the binary strain
partitions they induce into equivalence classes, and Welch-tests each
class against the phenotype.

Output is CSV, one row per (class, interval), sorted by p-value:

    pvalue,chromosome,block_start_bp,block_extent_bp,block_end_bp,block_middle_bp,equiv_class_extent_bp,strains

The strains column is the canonical partition as a binary string, one
digit per strain in sorted strain order, bit 0 leftmost. With
--normalised the pvalue column instead carries the p-value divided by
the class's cumulative extent in base pairs; the score is not a
probability.

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
        )
        .arg(
            Arg::new("normalised")
                .long("normalised")
                .action(ArgAction::SetTrue)
                .help("Divide each p-value by the class's cumulative extent"),
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
    let normalised = args.get_flag("normalised");

    let mut writer = ham::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Ops
    //----------------------------
    let (binary, _multi) = scan_blocks_genome_wide(&loaded.genome, &loaded.strains, &params)?;
    let classes = build_equivalence_classes(&binary);

    let means = strain_mean_vector(&responses_in_order(&loaded.strains, &loaded.phenotype_data));
    let partitions: Vec<&Sdp> = classes.iter().map(|c| &c.strains).collect();
    let mut p_values = t_test_partitions(&partitions, &means)?;

    if normalised {
        let extents: Vec<i64> = classes.iter().map(|c| c.cumulative_extent_bp).collect();
        p_values = normalized_scores(&p_values, &extents);
    }

    //----------------------------
    // Output
    //----------------------------
    let mut rows: Vec<(f64, String)> = Vec::new();
    for (class, &p) in classes.iter().zip(p_values.iter()) {
        let strains = class.strains.to_binary();
        for iv in &class.intervals {
            rows.push((
                p,
                format!(
                    "{},{},{},{},{},{},{},{}",
                    p,
                    iv.chromosome,
                    iv.start_bp,
                    iv.extent_bp,
                    iv.end_bp(),
                    iv.middle_bp(),
                    class.cumulative_extent_bp,
                    strains
                ),
            ));
        }
    }
    writer.write_all(
        b"pvalue,chromosome,block_start_bp,block_extent_bp,block_end_bp,block_middle_bp,equiv_class_extent_bp,strains\n",
    )?;
    for (_, row) in rows
        .into_iter()
        .sorted_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
    {
        writer.write_all(row.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    Ok(())
}
