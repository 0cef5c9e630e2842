//! Turns build-script source into tokens.
//!
//! The lexical grammar is tiny: `#` starts a comment running to the end of
//! the line, braces and a handful of operators are punctuation, words are
//! keywords or macro names, and the only literals are integers, strings and
//! the booleans `true`/`false`.
//!
//! Keywords are only recognised after the whole word has been consumed
//! (`maximal munch`), so `runner` is a macro name and not `run` + `ner`.
//!
//! After scanning, [`cross_reference`] pairs every `{` with its `}` so the
//! compiler can jump over whole blocks without rescanning them.
mod token;

use std::{iter::Peekable, rc::Rc, str::CharIndices};

use TokenType::*;
pub use token::*;

use crate::error::scanner::{ScanError, ScanErrorType};

/// A scanner for build-script source code
pub(crate) struct Scanner<'a> {
	/// Name of the file the source came from, shared by every location.
	file:        Rc<str>,
	/// User input source code
	source:      &'a str,
	/// User input source code iterator
	source_iter: Peekable<CharIndices<'a>>,
	/// Points at the beginning of the current lexeme
	start:       usize,
	/// Points at the character currently being considered
	cursor:      usize,
	/// Line of the character under `cursor`.
	line:        usize,
	/// Column of the character under `cursor`.
	column:      usize,
}

impl<'a> Scanner<'a> {
	pub fn new(file: &str, source: &'a str) -> Self {
		let source_iter = source.char_indices().peekable();

		Self { file: Rc::from(file), source, source_iter, start: 0, cursor: 0, line: 1, column: 1 }
	}

	/// Scan all tokens from the source code
	pub fn scan_tokens(mut self) -> Result<Vec<Token<'a>>, ScanError> {
		let mut tokens = Vec::new();
		while let Some(&(index, _)) = self.source_iter.peek() {
			// We are at the beginning of the next lexeme.
			self.start = index;
			self.cursor = self.start;
			let location = self.location();
			if let Some(r#type) = self.scan_token(&location)? {
				let lexeme = &self.source[self.start..self.cursor];
				tokens.push(Token::new(r#type, lexeme, location));
			}
		}
		Ok(tokens)
	}

	/// Scan a single token, `None` for whitespace and comments
	fn scan_token(&mut self, location: &Location) -> Result<Option<TokenType<'a>>, ScanError> {
		let Some(next_char) = self.advance() else { return Ok(None) };
		#[rustfmt::skip]
		let r#type = match next_char {
			'{' => LeftBrace,
			'}' => RightBrace,
			'+' => Plus,
			'*' => Star,
			'/' => Slash,
			'!' => Bang,
			'>' => if self.match_next('=') { GreaterEqual } else { Greater },
			'<' => if self.match_next('=') { LessEqual } else { Less },
			'=' => if self.match_next('=') { EqualEqual } else {
				return Err(ScanError::new(location.clone(), ScanErrorType::UnexpectedCharacter('=')));
			},
			'-' => if self.peek().is_some_and(|c| c.is_ascii_digit()) { self.integer(location)? } else { Minus },
			'#' => {
				while self.peek().is_some_and(|c| c != '\n') { self.advance(); }
				return Ok(None);
			}
			c if c.is_whitespace() => return Ok(None),
			'"' | '\'' => self.string(next_char, location)?,
			c if c.is_ascii_digit() => self.integer(location)?,
			c if c.is_ascii_alphabetic() => self.word(),
			_ => return Err(ScanError::new(location.clone(), ScanErrorType::UnexpectedCharacter(next_char))),
		};
		Ok(Some(r#type))
	}

	/// Match the next character if it is the expected one
	fn match_next(&mut self, expected: char) -> bool {
		matches!(self.peek(), Some(c) if c == expected && { self.advance(); true })
	}

	/// Advance to the next character
	fn advance(&mut self) -> Option<char> {
		let (i, c) = self.source_iter.next()?;
		self.cursor = i + c.len_utf8();
		if c == '\n' {
			self.line += 1;
			self.column = 1;
		} else {
			self.column += 1;
		}
		Some(c)
	}

	/// Peek the current character
	fn peek(&mut self) -> Option<char> { self.source_iter.peek().map(|&(_, c)| c) }

	fn location(&self) -> Location { Location::new(self.file.clone(), self.line, self.column) }

	/// Scan a string literal delimited by `quote`, resolving escapes
	fn string(&mut self, quote: char, start: &Location) -> Result<TokenType<'a>, ScanError> {
		let mut value = String::new();
		loop {
			match self.peek() {
				None | Some('\n') => {
					return Err(ScanError::new(start.clone(), ScanErrorType::UnterminatedString));
				}
				Some(c) if c == quote => break,
				Some('\\') => {
					self.advance();
					let escape_location = self.location();
					let escaped = match self.advance() {
						None => return Err(ScanError::new(start.clone(), ScanErrorType::UnterminatedEscape)),
						Some('n') => '\n',
						Some('r') => '\r',
						Some('t') => '\t',
						Some(c @ ('"' | '\'' | '\\')) => c,
						Some(c) => return Err(ScanError::new(escape_location, ScanErrorType::UndefinedEscape(c))),
					};
					value.push(escaped);
				}
				Some(c) => {
					value.push(c);
					self.advance();
				}
			}
		}
		self.advance(); // The closing quote
		Ok(StringLiteral(value))
	}

	/// Scan an integer literal, the leading `-` if any is already consumed
	fn integer(&mut self, start: &Location) -> Result<TokenType<'a>, ScanError> {
		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.advance();
		}
		let text = &self.source[self.start..self.cursor];
		text.parse()
			.map(Integer)
			.map_err(|_| ScanError::new(start.clone(), ScanErrorType::InvalidInteger(text.to_string())))
	}

	/// Scan a bare word or keyword
	fn word(&mut self) -> TokenType<'a> {
		while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
			self.advance();
		}
		let text = &self.source[self.start..self.cursor];
		TokenType::keyword_or_word(text)
	}
}

/// Pair up every `{` with its `}` in a single LIFO pass.
pub(crate) fn cross_reference(tokens: &mut [Token]) -> Result<(), ScanError> {
	let mut open = Vec::new();
	for i in 0..tokens.len() {
		match tokens[i].r#type {
			LeftBrace => open.push(i),
			RightBrace => {
				let Some(index) = open.pop() else {
					return Err(ScanError::new(tokens[i].location.clone(), ScanErrorType::StrayCloseBrace));
				};
				tokens[i].matching = Some(index);
				tokens[index].matching = Some(i);
			}
			_ => {}
		}
	}
	match open.first() {
		Some(&index) => Err(ScanError::new(tokens[index].location.clone(), ScanErrorType::UnclosedBrace)),
		None => Ok(()),
	}
}
