use std::{fmt::Display, rc::Rc};

/// Where a token, operation or stack value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
	pub file:   Rc<str>,
	/// 1-based line.
	pub line:   usize,
	/// 1-based column.
	pub column: usize,
}

impl Location {
	pub fn new(file: Rc<str>, line: usize, column: usize) -> Self { Self { file, line, column } }
}

impl Display for Location {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.file, self.line, self.column)
	}
}

/// A token produced by the scanner
#[derive(Debug, Clone)]
pub struct Token<'a> {
	pub r#type:   TokenType<'a>,
	pub lexeme:   &'a str,
	pub location: Location,
	/// Index of the lexically matching brace, filled in by `cross_reference`.
	pub matching: Option<usize>,
}

impl<'a> Token<'a> {
	pub fn new(r#type: TokenType<'a>, lexeme: &'a str, location: Location) -> Self {
		Self { r#type, lexeme, location, matching: None }
	}
}

/// The different types of tokens in a build script.
///
/// Three disjoint families: literal tokens (punctuation, operators and the
/// boolean literals), word tokens (keywords and intrinsics) and generic tokens
/// (strings, bare words and integers).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType<'a> {
	/// Left brace `{`.
	LeftBrace,
	/// Right brace `}`.
	RightBrace,
	/// Bang `!`.
	Bang,
	/// Greater than or equal `>=`.
	GreaterEqual,
	/// Less than or equal `<=`.
	LessEqual,
	/// Greater than `>`.
	Greater,
	/// Less than `<`.
	Less,
	/// Equal equal `==`.
	EqualEqual,
	/// Plus `+`.
	Plus,
	/// Minus `-`.
	Minus,
	/// Asterisk `*`.
	Star,
	/// Slash `/`.
	Slash,
	/// Boolean literal `true`.
	True,
	/// Boolean literal `false`.
	False,

	/// Breakpoint keyword.
	Debug,
	/// Macro definition keyword.
	Macro,
	Cmd,
	Run,
	If,
	Else,
	While,
	Dup,
	Drop,
	Swap,
	Over,
	Rot,
	FileExists,
	DirExists,
	Mkdir,
	Cd,
	Getcwd,
	Listdir,
	Fnmatch,
	Log,
	Error,
	Print,

	/// String literal with escapes already resolved.
	StringLiteral(String),
	/// Bare word, i.e. a macro name.
	Word(&'a str),
	/// Integer literal, e.g. `-42`.
	Integer(i64),
}

impl<'a> TokenType<'a> {
	pub fn keyword_or_word(value: &'a str) -> Self {
		match value {
			"true" => TokenType::True,
			"false" => TokenType::False,
			"debug" => TokenType::Debug,
			"macro" => TokenType::Macro,
			"cmd" => TokenType::Cmd,
			"run" => TokenType::Run,
			"if" => TokenType::If,
			"else" => TokenType::Else,
			"while" => TokenType::While,
			"dup" => TokenType::Dup,
			"drop" => TokenType::Drop,
			"swap" => TokenType::Swap,
			"over" => TokenType::Over,
			"rot" => TokenType::Rot,
			"fileexists" => TokenType::FileExists,
			"direxists" => TokenType::DirExists,
			"mkdir" => TokenType::Mkdir,
			"cd" => TokenType::Cd,
			"getcwd" => TokenType::Getcwd,
			"listdir" => TokenType::Listdir,
			"fnmatch" => TokenType::Fnmatch,
			"log" => TokenType::Log,
			"error" => TokenType::Error,
			"print" => TokenType::Print,
			_ => TokenType::Word(value),
		}
	}
}

impl Display for Token<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: `{}` ({:?})", self.location, self.lexeme, self.r#type)?;
		if let Some(matching) = self.matching {
			write!(f, " -> {matching}")?;
		}
		Ok(())
	}
}
