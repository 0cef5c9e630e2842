use crate::scanner::Location;

/// A specific scanning error with its location and type.
#[derive(thiserror::Error, Debug)]
#[error("{location}: ERROR: {type}")]
pub struct ScanError {
	/// Where the error occurred.
	pub location: Location,
	/// The type of scanning error.
	pub r#type:   ScanErrorType,
}

impl ScanError {
	pub fn new(location: Location, r#type: ScanErrorType) -> Self { Self { location, r#type } }
}

/// Types of scanning errors.
#[derive(Debug, PartialEq)]
pub enum ScanErrorType {
	/// Error for unexpected characters.
	UnexpectedCharacter(char),
	/// Error for strings missing their closing quote on the same line.
	UnterminatedString,
	/// A backslash at the very end of the input.
	UnterminatedEscape,
	/// A backslash followed by something we don't know how to escape.
	UndefinedEscape(char),
	/// An integer literal that is malformed or doesn't fit in 64 bits.
	InvalidInteger(String),
	/// A `}` with no `{` before it.
	StrayCloseBrace,
	/// A `{` that is never closed.
	UnclosedBrace,
}

impl std::fmt::Display for ScanErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ScanErrorType::*;
		match self {
			UnexpectedCharacter(c) => {
				write!(f, "unexpected character `{c}`")
			}
			UnterminatedString => {
				write!(f, "unclosed string literal")
			}
			UnterminatedEscape => {
				write!(f, "expected escape sequence, got EOF")
			}
			UndefinedEscape(c) => {
				write!(f, "undefined escape sequence `\\{c}`")
			}
			InvalidInteger(s) => {
				write!(f, "invalid integer literal `{s}`")
			}
			StrayCloseBrace => {
				write!(f, "stray `}}`")
			}
			UnclosedBrace => {
				write!(f, "stray `{{`")
			}
		}
	}
}
