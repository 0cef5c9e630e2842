use crate::scanner::Location;

#[derive(thiserror::Error, Debug)]
#[error("{location}: ERROR: {type}")]
pub struct CompileError {
	pub location: Location,
	pub r#type:   CompileErrorType,
}

impl CompileError {
	pub fn new(location: Location, r#type: CompileErrorType) -> Self { Self { location, r#type } }
}

#[derive(Debug, PartialEq)]
pub enum CompileErrorType {
	/// `macro` not followed by a bare word.
	ExpectedName(String),
	/// A block opener (`macro NAME`, `if`, `else`, `while`) not followed by `{`.
	ExpectedBlock(String),
	/// The range ended in the middle of a construct.
	UnexpectedEnd(&'static str),
	MacroRedefinition(String),
	UndefinedMacro(String),
	/// Too many nested blocks or macro expansions.
	ExpansionDepth,
	/// A keyword the compiler has no operation for.
	UnmappedIntrinsic(String),
	UnexpectedToken(String),
}

impl std::fmt::Display for CompileErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use CompileErrorType::*;
		match self {
			ExpectedName(got) => write!(f, "expected a name, got `{got}`"),
			ExpectedBlock(got) => write!(f, "expected a `{{`, got `{got}`"),
			UnexpectedEnd(construct) => write!(f, "unexpected end of block while compiling `{construct}`"),
			MacroRedefinition(name) => write!(f, "macro redefinition: `{name}`"),
			UndefinedMacro(name) => write!(f, "no such macro as `{name}`"),
			ExpansionDepth => write!(f, "excessive expansion depth"),
			UnmappedIntrinsic(name) => write!(f, "intrinsic `{name}` is not mapped to an operation"),
			UnexpectedToken(got) => write!(f, "unexpected `{got}`"),
		}
	}
}
