use clap::Parser;
use sauce::cli::{self, Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cli::process_build(args.input, args.output, args.keep_c, args.verbose)
}
