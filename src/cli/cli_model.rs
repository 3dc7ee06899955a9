use std::path::PathBuf;

use clap::{command, value_parser, Arg, ArgAction, Command};

use crate::utils::LogLevel;

pub(super) fn cli_model() -> Command {
    command!()
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .help("Prepend log entries with a timestamp"),
        )
        .arg(
            Arg::new("loglevel")
                .short('l')
                .long("loglevel")
                .value_name("LOGLEVEL")
                .value_parser(value_parser!(LogLevel))
                .ignore_case(true)
                .default_value("info")
                .help("Set log level"),
        )
        .arg(
            Arg::new("quiet")
                .action(ArgAction::SetTrue)
                .long("quiet")
                .conflicts_with("loglevel")
                .help("Silence all output"),
        )
        .arg(
            Arg::new("kmer_length")
                .short('k')
                .long("kmer_length")
                .value_parser(value_parser!(u64).range(1..))
                .value_name("INT")
                .required(true)
                .help("Length of the indexed k-mers"),
        )
        .arg(
            Arg::new("counts")
                .short('c')
                .long("counts")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .required(true)
                .help("Per position k-mer frequency array (little endian u16)"),
        )
        .arg(
            Arg::new("locations")
                .short('L')
                .long("locations")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .help("K-mer location index dump (required for csv/design output)"),
        )
        .arg(
            Arg::new("selection")
                .short('s')
                .long("selection")
                .value_parser(value_parser!(PathBuf))
                .value_name("FILE")
                .help("Restrict csv output to these intervals"),
        )
        .arg(
            Arg::new("prefix")
                .short('p')
                .long("prefix")
                .value_parser(value_parser!(String))
                .value_name("PREFIX")
                .default_value("kmer_map")
                .help("Set prefix for output file names"),
        )
        .arg(
            Arg::new("mappability")
                .action(ArgAction::SetTrue)
                .short('m')
                .long("mappability")
                .help("Output reciprocal mappability scores instead of raw counts"),
        )
        .arg(
            Arg::new("rev_compl")
                .action(ArgAction::SetTrue)
                .short('r')
                .long("rev_compl")
                .help("Include reverse strand hits in csv and design output"),
        )
        .arg(
            Arg::new("txt")
                .action(ArgAction::SetTrue)
                .long("txt")
                .help("Write plain text dump (.txt)"),
        )
        .arg(
            Arg::new("wig")
                .action(ArgAction::SetTrue)
                .long("wig")
                .help("Write WIG track (.wig) and chromosome sizes (.chrom.sizes)"),
        )
        .arg(
            Arg::new("bed")
                .action(ArgAction::SetTrue)
                .long("bed")
                .help("Write BED track (.bed)"),
        )
        .arg(
            Arg::new("bedgraph")
                .action(ArgAction::SetTrue)
                .long("bedgraph")
                .help("Write BEDGraph track (.bedgraph)"),
        )
        .arg(
            Arg::new("csv")
                .action(ArgAction::SetTrue)
                .long("csv")
                .help("Write per file location columns (.csv)"),
        )
        .arg(
            Arg::new("design")
                .action(ArgAction::SetTrue)
                .long("design")
                .help("Build the probe design matrix (.design.tsv)"),
        )
        .arg(
            Arg::new("sample_rate")
                .long("sample_rate")
                .value_parser(value_parser!(u64).range(1..))
                .value_name("INT")
                .default_value("1")
                .help("Selection window divisor: windows are kmer_length / sample_rate bases"),
        )
        .arg(
            Arg::new("reps_per_window")
                .long("reps_per_window")
                .value_parser(value_parser!(u64).range(1..))
                .value_name("INT")
                .default_value("1")
                .help("Representative k-mers selected per window"),
        )
        .arg(
            Arg::new("exclusion_radius")
                .long("exclusion_radius")
                .value_parser(value_parser!(u64))
                .value_name("INT")
                .default_value("29")
                .help("Minimum distance between representatives within a window"),
        )
        .arg(
            Arg::new("absolute_coords")
                .action(ArgAction::SetTrue)
                .long("absolute_coords")
                .help("Report absolute chromosome indices in the csv (default: file relative)"),
        )
        .arg(
            Arg::new("input")
                .value_parser(value_parser!(PathBuf))
                .value_name("FASTA")
                .num_args(1..)
                .required(true)
                .help("Input FASTA files (genome order)"),
        )
}
