use crate::scanner::Location;

/// Errors that can occur during interpretation.
///
/// Every runtime failure is fatal for the run; the location points at the
/// offending stack value when there is one, otherwise at the operation.
#[derive(Debug)]
pub struct RuntimeError {
	pub location: Location,
	pub r#type:   RuntimeErrorType,
}

impl RuntimeError {
	pub fn new(location: Location, r#type: RuntimeErrorType) -> Self { Self { location, r#type } }

	pub fn is_breakpoint(&self) -> bool { matches!(self.r#type, RuntimeErrorType::Breakpoint(_)) }
}

impl std::fmt::Display for RuntimeError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.r#type {
			// A breakpoint is not an error, it renders as the raw stack dump.
			RuntimeErrorType::Breakpoint(dump) => write!(f, "DEBUG CRASH\nINITIATED AT {}\n{dump}", self.location),
			other => write!(f, "{}: ERROR: {other}", self.location),
		}
	}
}

impl std::error::Error for RuntimeError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { Some(&self.r#type) }
}

#[derive(thiserror::Error, Debug)]
pub enum RuntimeErrorType {
	/// Fewer items on the stack than the operation consumes.
	#[error("expected at least {needed} item(s) on the stack, found {found}")]
	StackUnderflow { needed: usize, found: usize },
	/// Wrong kind of value for an operand.
	#[error("expected {expected}, got {found}")]
	TypeMismatch { expected: &'static str, found: String },
	/// `run` with no command marker below it.
	#[error("`run` without a preceding `cmd`")]
	MissingMarker,
	/// `run` with nothing between the marker and the top of the stack.
	#[error("expected a program name after `cmd`")]
	MissingProgram,
	#[error("division by zero")]
	DivisionByZero,
	#[error("integer overflow")]
	Overflow,
	#[error("command `{command}` exited with {}", display_status(.status))]
	CommandFailed { command: String, status: Option<i32> },
	/// The filesystem or process spawning failed underneath us.
	#[error("{0:#}")]
	Host(#[from] anyhow::Error),
	/// The script called `error`.
	#[error("{0}")]
	Raised(String),
	/// The script hit `debug`; carries the rendered stack.
	#[error("breakpoint")]
	Breakpoint(String),
}

fn display_status(status: &Option<i32>) -> String {
	match status {
		Some(code) => format!("exit code {code}"),
		None => "no exit code (terminated by signal)".to_string(),
	}
}
