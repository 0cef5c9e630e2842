//! Lowers a cross-referenced token stream to [`Bytecode`].
//!
//! The compiler walks a half-open token range left to right and emits code
//! as it goes; there is no syntax tree. Blocks are found through the brace
//! cross-reference, so `if`, `while` and macro bodies are compiled by
//! recursing into the token range between a `{` and its matching `}`.
//!
//! Macros are recorded as token ranges, not as code. Every call site compiles
//! the body again, so jump targets inside an expansion are always local to
//! that expansion. The macro table is shared by the whole compilation: a
//! macro defined inside a block stays visible after the block ends.
//!
//! ``` text
//! if { A } else { B }        while { C } { B }
//!
//!     JUMPZ  else                start: C
//!     A                                 JUMPZ end
//!     JUMP   end                        B
//! else: B                               JUMP  start
//! end:                           end:
//! ```
//!
//! `if` does not compile its condition: whatever ran before it must have left
//! a boolean on the stack. `while` owns its condition block because it has to
//! run it again on every iteration.

use std::{collections::HashMap, ops::Range};

use tracing::{debug, trace};
use TokenType::*;

use crate::{
	bytecode::{Bytecode, CodeBuilder, Instruction},
	error::compiler::{CompileError, CompileErrorType},
	scanner::{Location, Token, TokenType},
};

/// Nesting limit for blocks and macro expansions.
pub const MAX_EXPANSION_DEPTH: usize = 100;

/// A macro body, as a range into the token stream.
#[derive(Debug, Clone)]
struct MacroDefinition {
	body:     Range<usize>,
	location: Location,
}

pub(crate) struct Compiler<'t, 'a> {
	tokens: &'t [Token<'a>],
	/// Every macro defined so far, whatever block it was defined in.
	macros: HashMap<&'a str, MacroDefinition>,
	code:   CodeBuilder,
}

/// Compile a whole, cross-referenced token stream.
pub(crate) fn compile(tokens: &[Token]) -> Result<Bytecode, CompileError> {
	let mut compiler = Compiler::new(tokens);
	compiler.compile_range(0..tokens.len(), 0)?;
	let bytecode = compiler.code.build();
	debug!(tokens = tokens.len(), operations = bytecode.len(), macros = compiler.macros.len(), "compiled");
	Ok(bytecode)
}

impl<'t, 'a> Compiler<'t, 'a> {
	fn new(tokens: &'t [Token<'a>]) -> Self { Self { tokens, macros: HashMap::new(), code: CodeBuilder::new() } }

	/// Compile the tokens in `range` at the given nesting depth.
	fn compile_range(&mut self, range: Range<usize>, depth: usize) -> Result<(), CompileError> {
		let tokens = self.tokens;
		if depth >= MAX_EXPANSION_DEPTH {
			let location = tokens.get(range.start).or(tokens.last()).map(|t| t.location.clone());
			return Err(CompileError::new(
				location.unwrap_or_else(|| Location::new("<input>".into(), 1, 1)),
				CompileErrorType::ExpansionDepth,
			));
		}

		let end = range.end;
		let mut i = range.start;
		while i < end {
			let token = &tokens[i];
			let location = token.location.clone();
			i = match &token.r#type {
				Macro => self.define_macro(i, end)?,
				StringLiteral(s) => self.emit_next(Instruction::PushString(s.clone()), location, i),
				Integer(n) => self.emit_next(Instruction::PushInt(*n), location, i),
				True => self.emit_next(Instruction::PushBool(true), location, i),
				False => self.emit_next(Instruction::PushBool(false), location, i),
				If => self.compile_if(i, end, depth)?,
				While => self.compile_while(i, end, depth)?,
				Word(name) => {
					self.expand_macro(name, &location, depth)?;
					i + 1
				}
				Else | LeftBrace | RightBrace => {
					return Err(CompileError::new(location, CompileErrorType::UnexpectedToken(token.lexeme.to_string())));
				}
				other => match intrinsic(other) {
					Some(instruction) => self.emit_next(instruction, location, i),
					None => {
						return Err(CompileError::new(
							location,
							CompileErrorType::UnmappedIntrinsic(token.lexeme.to_string()),
						));
					}
				},
			};
		}
		Ok(())
	}

	fn emit_next(&mut self, instruction: Instruction, location: Location, i: usize) -> usize {
		self.code.emit(instruction, location);
		i + 1
	}

	/// `macro NAME { ... }`; returns the index after the closing brace.
	fn define_macro(&mut self, i: usize, end: usize) -> Result<usize, CompileError> {
		let tokens = self.tokens;
		let keyword = &tokens[i];
		let name = self.token_at(i + 1, end, keyword, "macro")?;
		let Word(macro_name) = name.r#type else {
			return Err(CompileError::new(
				name.location.clone(),
				CompileErrorType::ExpectedName(name.lexeme.to_string()),
			));
		};
		let body = self.block_at(i + 2, end, keyword, "macro")?;
		if self.macros.contains_key(macro_name) {
			return Err(CompileError::new(
				name.location.clone(),
				CompileErrorType::MacroRedefinition(macro_name.to_string()),
			));
		}
		debug!(name = macro_name, start = body.start, end = body.end, "registered macro");
		self.macros.insert(macro_name, MacroDefinition { body: body.clone(), location: name.location.clone() });
		Ok(body.end + 1)
	}

	/// Recompile a macro body in place.
	fn expand_macro(&mut self, name: &str, location: &Location, depth: usize) -> Result<(), CompileError> {
		let Some(definition) = self.macros.get(name) else {
			return Err(CompileError::new(location.clone(), CompileErrorType::UndefinedMacro(name.to_string())));
		};
		trace!(name, defined_at = %definition.location, depth, "expanding macro");
		let body = definition.body.clone();
		self.compile_range(body, depth + 1)
	}

	/// `if { ... } [else { ... }]`; returns the index after the last block.
	fn compile_if(&mut self, i: usize, end: usize, depth: usize) -> Result<usize, CompileError> {
		let tokens = self.tokens;
		let keyword = &tokens[i];
		let then_body = self.block_at(i + 1, end, keyword, "if")?;
		let after_then = then_body.end + 1;

		let else_jump = self.code.emit_jump(Instruction::JumpIfFalse, keyword.location.clone());
		self.compile_range(then_body, depth + 1)?;

		let else_keyword = match tokens.get(after_then) {
			Some(token) if after_then < end && token.r#type == Else => token,
			_ => {
				self.code.patch_jump(else_jump);
				return Ok(after_then);
			}
		};
		let else_body = self.block_at(after_then + 1, end, else_keyword, "else")?;
		let after_else = else_body.end + 1;

		let end_jump = self.code.emit_jump(Instruction::Jump, else_keyword.location.clone());
		self.code.patch_jump(else_jump);
		self.compile_range(else_body, depth + 1)?;
		self.code.patch_jump(end_jump);
		Ok(after_else)
	}

	/// `while { condition } { body }`; returns the index after the body.
	fn compile_while(&mut self, i: usize, end: usize, depth: usize) -> Result<usize, CompileError> {
		let tokens = self.tokens;
		let keyword = &tokens[i];
		let condition = self.block_at(i + 1, end, keyword, "while")?;
		let body = self.block_at(condition.end + 1, end, keyword, "while")?;
		let after_body = body.end + 1;

		let loop_start = self.code.current_offset();
		self.compile_range(condition, depth + 1)?;
		let exit_jump = self.code.emit_jump(Instruction::JumpIfFalse, keyword.location.clone());
		self.compile_range(body, depth + 1)?;
		self.code.emit_jump_to(Instruction::Jump, loop_start, keyword.location.clone());
		self.code.patch_jump(exit_jump);
		Ok(after_body)
	}

	/// The token at `index`, which must still be inside the range.
	fn token_at(
		&self,
		index: usize,
		end: usize,
		keyword: &Token,
		construct: &'static str,
	) -> Result<&'t Token<'a>, CompileError> {
		let tokens = self.tokens;
		match tokens.get(index) {
			Some(token) if index < end => Ok(token),
			_ => Err(CompileError::new(keyword.location.clone(), CompileErrorType::UnexpectedEnd(construct))),
		}
	}

	/// The inside of the `{ ... }` block opening at `index`.
	fn block_at(
		&self,
		index: usize,
		end: usize,
		keyword: &Token,
		construct: &'static str,
	) -> Result<Range<usize>, CompileError> {
		let open = self.token_at(index, end, keyword, construct)?;
		match (&open.r#type, open.matching) {
			(LeftBrace, Some(close)) if close < end => Ok(index + 1..close),
			(LeftBrace, _) => Err(CompileError::new(open.location.clone(), CompileErrorType::UnexpectedEnd(construct))),
			_ => Err(CompileError::new(open.location.clone(), CompileErrorType::ExpectedBlock(open.lexeme.to_string()))),
		}
	}
}

/// The operation an operator or intrinsic keyword maps to.
fn intrinsic(r#type: &TokenType) -> Option<Instruction> {
	Some(match r#type {
		Debug => Instruction::Debug,
		Cmd => Instruction::Cmd,
		Run => Instruction::Run,
		Bang => Instruction::Not,
		GreaterEqual => Instruction::GreaterEqual,
		LessEqual => Instruction::LessEqual,
		Greater => Instruction::Greater,
		Less => Instruction::Less,
		EqualEqual => Instruction::Equal,
		Plus => Instruction::Add,
		Minus => Instruction::Sub,
		Star => Instruction::Mul,
		Slash => Instruction::Div,
		Dup => Instruction::Dup,
		Drop => Instruction::Drop,
		Swap => Instruction::Swap,
		Over => Instruction::Over,
		Rot => Instruction::Rot,
		FileExists => Instruction::FileExists,
		DirExists => Instruction::DirExists,
		Mkdir => Instruction::Mkdir,
		Cd => Instruction::Cd,
		Getcwd => Instruction::Getcwd,
		Listdir => Instruction::Listdir,
		Fnmatch => Instruction::Fnmatch,
		Log => Instruction::Log,
		Error => Instruction::Error,
		Print => Instruction::Print,
		_ => return None,
	})
}
