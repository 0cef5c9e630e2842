use std::fmt::Display;

use crate::scanner::Location;

/// Value represents a runtime value on the stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Str(String),
	Int(i64),
	Bool(bool),
	/// Start of a command being assembled by `cmd ... run`.
	Marker,
}

impl Value {
	/// The article-prefixed kind name used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Str(_) => "a string",
			Value::Int(_) => "an integer",
			Value::Bool(_) => "a boolean",
			Value::Marker => "a command marker",
		}
	}

	/// Kind and content, e.g. ``a string `foo` ``.
	pub fn describe(&self) -> String {
		match self {
			Value::Marker => self.kind().to_string(),
			other => format!("{} `{other}`", other.kind()),
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Str(s) => write!(f, "{s}"),
			Value::Int(n) => write!(f, "{n}"),
			Value::Bool(b) => write!(f, "{b}"),
			Value::Marker => write!(f, "CMD MARKER"),
		}
	}
}

/// A value and the location that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StackValue {
	pub value:    Value,
	pub location: Location,
}

impl StackValue {
	pub fn new(value: Value, location: Location) -> Self { Self { value, location } }
}

/// Type-tagged rendering used by the `debug` dump.
impl Display for StackValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.value {
			Value::Str(s) => write!(f, "string `{s}`"),
			Value::Int(n) => write!(f, "int {n}"),
			Value::Bool(b) => write!(f, "bool {b}"),
			Value::Marker => write!(f, "CMD MARKER"),
		}?;
		write!(f, " ({})", self.location)
	}
}
