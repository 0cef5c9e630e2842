use std::path::PathBuf;

use palc::Parser;

use crate::Mode;

/// Build file used when none is named on the command line.
pub const DEFAULT_BUILD_FILE: &str = "build.mako";

#[derive(Parser)]
#[command(name = "mako", after_long_help = "Runs a mako build script, `build.mako` unless FILE is given.")]
pub struct Cli {
	/// Build script to run
	pub file:     Option<PathBuf>,
	/// Print the tokens and exit
	#[arg(long)]
	pub tokenize: bool,
	/// Print the compiled bytecode and exit
	#[arg(long)]
	pub parse:    bool,
}

impl Cli {
	pub fn file(&self) -> PathBuf { self.file.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_FILE)) }

	/// `--tokenize` wins over `--parse`.
	pub fn mode(&self) -> Mode {
		match (self.tokenize, self.parse) {
			(true, _) => Mode::Tokenize,
			(false, true) => Mode::Parse,
			(false, false) => Mode::Execute,
		}
	}
}
