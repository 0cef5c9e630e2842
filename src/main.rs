use std::process;

use mako::{Mako, cli::Cli, init_logging};
use palc::Parser;

fn main() {
	init_logging();
	let cli = Cli::parse();
	let mako = Mako::new(cli.mode());

	if let Err(e) = mako.run_file(cli.file()) {
		eprintln!("{e}");
		process::exit(e.exit_code());
	}
}
