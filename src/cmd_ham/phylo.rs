use clap::*;

use ham::libs::cache::ResultCache;
use ham::libs::driver::{
    cached_phylogeny_tests, phylogeny_tests_for_chromosome, phylogeny_tests_genome_wide,
};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("phylo")
        .about("Perfect-phylogeny edge test scan")
        .after_help(
            r###"Splits each chromosome into maximal compatible (MAX-K) intervals,
infers one perfect phylogeny per interval, tests every edge with a
Welch t-test of the strains on either side, and reports the minimum
edge p-value per interval.

Intervals whose SNPs admit no perfect phylogeny are reported on
stderr and skipped.

Output is TSV, one row per interval in (chromosome, start) order:

    chromosome<TAB>start_bp<TAB>extent_bp<TAB>newick_tree<TAB>p_value

With --cache, per-chromosome results are memoised on disk under the
system temp directory (or --cache-dir) and reused within the run.

"###,
        )
        .arg(
            Arg::new("chr")
                .long("chr")
                .num_args(1)
                .value_parser(value_parser!(i32))
                .help("Restrict the scan to one chromosome"),
        )
        .arg(
            Arg::new("cache")
                .long("cache")
                .action(ArgAction::SetTrue)
                .help("Memoise per-chromosome results on disk"),
        )
        .arg(
            Arg::new("cache_dir")
                .long("cache-dir")
                .num_args(1)
                .help("Cache directory. [system temp]"),
        );
    super::input_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let loaded = super::load_experiment(args)?;
    let chromosome = args.get_one::<i32>("chr").copied();
    let use_cache = args.get_flag("cache");

    let mut writer = ham::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Ops
    //----------------------------
    let results = if use_cache {
        let mut cache = match args.get_one::<String>("cache_dir") {
            Some(dir) => ResultCache::with_directory(dir),
            None => ResultCache::new(),
        };
        let chromosomes: Vec<i32> = match chromosome {
            Some(chr) => vec![chr],
            None => loaded.genome.chromosomes.keys().copied().collect(),
        };
        let mut results = Vec::new();
        for chr in chromosomes {
            results.extend(cached_phylogeny_tests(
                &mut cache,
                &loaded.phenotype_name,
                &loaded.genome,
                chr,
                &loaded.strains,
                &loaded.phenotype_data,
            )?);
        }
        results
    } else {
        match chromosome {
            Some(chr) => phylogeny_tests_for_chromosome(
                &loaded.genome,
                chr,
                &loaded.strains,
                &loaded.phenotype_data,
            )?,
            None => phylogeny_tests_genome_wide(
                &loaded.genome,
                &loaded.strains,
                &loaded.phenotype_data,
            )?,
        }
    };

    //----------------------------
    // Output
    //----------------------------
    writer.write_all(b"chromosome\tstart_bp\textent_bp\tnewick_tree\tp_value\n")?;
    for result in &results {
        let iv = &result.phylogeny.interval;
        writer.write_all(
            format!(
                "{}\t{}\t{}\t{}\t{}\n",
                iv.chromosome,
                iv.start_bp,
                iv.extent_bp,
                result.phylogeny.tree.to_newick(),
                result.p_value
            )
            .as_bytes(),
        )?;
    }

    Ok(())
}
