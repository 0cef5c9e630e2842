use std::{fs::read_to_string, io::Write, path::Path};

use anyhow::Context;
use tracing::debug;

use crate::{
	MakoError,
	compiler::compile,
	interpreter::{Interpreter, OsShell, Shell},
	scanner::{Scanner, cross_reference},
};

/// What to do with a build script once it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
	/// Compile and run the script.
	#[default]
	Execute,
	/// Print the cross-referenced tokens and stop.
	Tokenize,
	/// Print the compiled bytecode and stop.
	Parse,
}

/// Mako is the main struct driving a build script from source to execution.
#[derive(Debug, Default)]
pub struct Mako {
	mode: Mode,
}

impl Mako {
	pub fn new(mode: Mode) -> Self { Self { mode } }

	/// Run a build file against the real filesystem, reporting to stdout.
	pub fn run_file<P: AsRef<Path>>(&self, path: P) -> Result<(), MakoError> {
		let path = path.as_ref();
		let source = read_to_string(path).with_context(|| format!("no file named `{}`", path.display()))?;
		let shell = OsShell::new()?;
		self.run_source(&path.display().to_string(), &source, shell, std::io::stdout().lock())
	}

	/// Run `source`, naming it `file` in every location.
	pub fn run_source(
		&self, file: &str, source: &str, shell: impl Shell, mut output: impl Write,
	) -> Result<(), MakoError> {
		let mut tokens = Scanner::new(file, source).scan_tokens()?;
		cross_reference(&mut tokens)?;
		debug!(file, tokens = tokens.len(), "scanned");

		if self.mode == Mode::Tokenize {
			for (index, token) in tokens.iter().enumerate() {
				writeln!(output, "{index}: {token}").context("failed to write token dump")?;
			}
			return Ok(());
		}

		let bytecode = compile(&tokens)?;

		if self.mode == Mode::Parse {
			write!(output, "{bytecode}").context("failed to write bytecode dump")?;
			return Ok(());
		}

		Interpreter::new(shell, output).execute(&bytecode)?;
		Ok(())
	}
}
