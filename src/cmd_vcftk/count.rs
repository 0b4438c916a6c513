use clap::*;
use std::io::{BufRead, Write};

pub fn make_subcommand() -> Command {
    Command::new("count")
        .about("Count data lines in a VCF file")
        .after_help(
            r###"
Prints the number of data lines: non-empty lines not starting with `#`.

Examples:
1. Count records:
   vcftk count input.vcf.gz

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
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let reader = vcftk::reader(infile)?;
    let mut writer = vcftk::writer(args.get_one::<String>("outfile").unwrap())?;

    let mut count = 0u64;
    for line in reader.split(b'\n') {
        let line = line?;
        if line.starts_with(b"#") || line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        count += 1;
    }

    writer.write_fmt(format_args!("{}\n", count))?;
    writer.flush()?;

    Ok(())
}
