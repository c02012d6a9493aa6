use clap::*;

use ham::libs::phenotype::{parse_available_phenotypes, parse_available_strain_names};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("pheno")
        .about("Inspect a tall-format phenotype table")
        .after_help(
            r###"Lists the phenotype variable names or the strain names present in a
tall-format phenotype table, one per line, sorted.

Examples:

    ham pheno tests/data/pheno.tsv --list-vars
    ham pheno tests/data/pheno.tsv --list-strains

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Tall-format phenotype file (tab-separated)"),
        )
        .arg(
            Arg::new("list_vars")
                .long("list-vars")
                .action(ArgAction::SetTrue)
                .help("List phenotype variable names"),
        )
        .arg(
            Arg::new("list_strains")
                .long("list-strains")
                .action(ArgAction::SetTrue)
                .help("List strain names"),
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

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let list_vars = args.get_flag("list_vars");
    let list_strains = args.get_flag("list_strains");
    if list_vars == list_strains {
        anyhow::bail!("pass exactly one of --list-vars and --list-strains");
    }

    let mut writer = ham::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Ops
    //----------------------------
    let names = if list_vars {
        parse_available_phenotypes(&mut ham::reader(infile))?
    } else {
        parse_available_strain_names(&mut ham::reader(infile))?
    };

    for name in names {
        writer.write_all(name.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    Ok(())
}
