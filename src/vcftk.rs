extern crate clap;
use clap::*;
use env_logger::Env;

mod cmd_vcftk;

fn main() -> anyhow::Result<()> {
    let app = Command::new("vcftk")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`vcftk` - Sort and merge VCF files")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Only log warnings and errors"),
        )
        .subcommand(cmd_vcftk::sort::make_subcommand())
        .subcommand(cmd_vcftk::merge::make_subcommand())
        .subcommand(cmd_vcftk::count::make_subcommand())
        .after_help(
            r###"Subcommands:

* sort  - Coordinate sort of one file, larger-than-memory inputs welcome
* merge - Combine files, union of sample columns
* count - Number of data lines

Logging goes to stderr; set RUST_LOG=debug for chunk-level detail.

"###,
        );

    let matches = app.get_matches();

    let level = if matches.get_flag("quiet") {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    // Check which subcomamnd the user ran...
    match matches.subcommand() {
        Some(("sort", sub_matches)) => cmd_vcftk::sort::execute(sub_matches),
        Some(("merge", sub_matches)) => cmd_vcftk::merge::execute(sub_matches),
        Some(("count", sub_matches)) => cmd_vcftk::count::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
