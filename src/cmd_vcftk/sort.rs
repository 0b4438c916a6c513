use clap::*;
use log::error;
use std::path::PathBuf;
use vcftk::libs::sort::{sort_file, MergeStrategy, SortConfig};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("sort")
        .about("Sort a VCF file by chromosome and position")
        .after_help(
            r###"
Sorts data lines by chromosome, then position, without holding the whole
file in memory.

Order of chromosomes:
* Numeric names (1, 2, ..., 22), with or without a `chr` prefix
* X, Y, then MT/M
* Everything else, at a fixed position derived from the name

Notes:
* Header lines (all lines before the first data line) are kept verbatim
* Lines with fewer than 2 columns or a non-numeric POS are dropped
* Records at the same position keep their input order
* Supports both plain text and gzipped (.gz) input files
* An outfile ending in .gz is gzip-compressed
* The outfile only appears once sorting has succeeded

Examples:
1. Sort with the default chunk size:
   vcftk sort input.vcf.gz -o sorted.vcf

2. Small chunks, scratch files under /scratch:
   vcftk sort input.vcf -c 10000 --tmp-dir /scratch -o sorted.vcf

3. Heap-based merge of many chunks, 4 threads for chunk sorting:
   vcftk sort input.vcf --heap -p 4 -o sorted.vcf.gz

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input VCF file. [stdin] for standard input"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .short('c')
                .value_parser(value_parser!(std::num::NonZeroUsize))
                .num_args(1)
                .default_value("100000")
                .help("Data lines held in memory per chunk"),
        )
        .arg(
            Arg::new("tmp-dir")
                .long("tmp-dir")
                .num_args(1)
                .help("Directory for scratch files (default: system temp dir)"),
        )
        .arg(
            Arg::new("heap")
                .long("heap")
                .action(ArgAction::SetTrue)
                .help("Merge chunks with a binary heap instead of a linear scan"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(std::num::NonZeroUsize))
                .num_args(1)
                .default_value("1")
                .help("Number of threads for sorting chunks"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();
    let chunk_size = *args.get_one::<std::num::NonZeroUsize>("chunk-size").unwrap();
    let opt_parallel = *args.get_one::<std::num::NonZeroUsize>("parallel").unwrap();

    let strategy = if args.get_flag("heap") {
        MergeStrategy::Heap
    } else {
        MergeStrategy::Scan
    };

    let mut config = SortConfig::new()
        .chunk_size(chunk_size.get())
        .strategy(strategy)
        .threads(opt_parallel.get());
    if let Some(dir) = args.get_one::<String>("tmp-dir") {
        config = config.tmp_dir(PathBuf::from(dir));
    }

    //----------------------------
    // Operating
    //----------------------------
    if let Err(err) = sort_file(infile, outfile, &config) {
        error!("Sorting {} failed: {:#}", infile, err);
        return Err(err);
    }

    Ok(())
}
