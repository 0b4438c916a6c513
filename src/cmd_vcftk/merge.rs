use clap::*;
use log::error;
use std::path::PathBuf;
use vcftk::libs::merge::{merge_files, read_input_list, MergeConfig};

pub fn make_subcommand() -> Command {
    Command::new("merge")
        .about("Merge VCF files, combining their samples")
        .after_help(
            r###"
Combines records of several VCF files into one file sorted by chromosome and
position.

Rules:
* Meta lines (##) are kept once each, in the order first seen
* Sample columns are the sorted union of all input samples
* Records at the same CHROM and POS become one line:
    * ID/REF/ALT/QUAL/FILTER/INFO/FORMAT come from the first file having it
    * sample cells are combined; a later file wins for a repeated sample
* Samples without data at a position are written as '.'
* A file's records end at its first empty or malformed line

Notes:
* Supports both plain text and gzipped (.gz) input files
* All inputs must share the same fixed columns (#CHROM ... FORMAT)
* The outfile must not exist; it is never overwritten

Examples:
1. Merge two files:
   vcftk merge a.vcf b.vcf.gz -o merged.vcf

2. Merge the files listed in vcfs.txt, reading them with 4 threads:
   vcftk merge --list vcfs.txt -p 4 -o merged.vcf

"###,
        )
        .arg(
            Arg::new("infiles")
                .num_args(1..)
                .index(1)
                .help("Input VCF file(s) to merge"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .short('l')
                .num_args(1)
                .help("File with input paths, one per line"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .required(true)
                .help("Output filename. [stdout] for screen"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(std::num::NonZeroUsize))
                .num_args(1)
                .default_value("1")
                .help("Number of threads for reading inputs"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let outfile = args.get_one::<String>("outfile").unwrap();
    let opt_parallel = *args.get_one::<std::num::NonZeroUsize>("parallel").unwrap();

    let mut infiles: Vec<PathBuf> = args
        .get_many::<String>("infiles")
        .map(|files| files.map(PathBuf::from).collect())
        .unwrap_or_default();
    if let Some(list) = args.get_one::<String>("list") {
        infiles.extend(read_input_list(list)?);
    }

    let config = MergeConfig::new().threads(opt_parallel.get());
    if let Err(err) = merge_files(&infiles, outfile, &config) {
        error!("Merging into {} failed: {:#}", outfile, err);
        return Err(err);
    }

    Ok(())
}
