pub mod compiler;
pub mod interpreter;
pub mod scanner;

/// Exit status for every fatal error.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for an intentional `debug` breakpoint.
pub const EXIT_BREAKPOINT: i32 = 2;

/// MakoError is the top-level error type for a build run.
#[derive(thiserror::Error, Debug)]
pub enum MakoError {
	/// Failures outside the script itself, e.g. the build file can't be read
	#[error("ERROR: {0:#}")]
	Host(#[from] anyhow::Error),
	/// Lexical errors, including unbalanced braces
	#[error(transparent)]
	Scan(#[from] scanner::ScanError),
	/// Structural errors found while compiling to bytecode
	#[error(transparent)]
	Compile(#[from] compiler::CompileError),
	/// Errors raised while executing bytecode
	#[error(transparent)]
	Runtime(#[from] interpreter::RuntimeError),
}

impl MakoError {
	/// The process exit status this error should terminate with.
	pub fn exit_code(&self) -> i32 {
		match self {
			MakoError::Runtime(e) if e.is_breakpoint() => EXIT_BREAKPOINT,
			_ => EXIT_FAILURE,
		}
	}
}
