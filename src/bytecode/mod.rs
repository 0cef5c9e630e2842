//! The flat instruction sequence shared by the compiler and the interpreter.
//!
//! A program is a zero-indexed, append-only list of [`Operation`]s. Jumps
//! carry absolute instruction indices; a target equal to the program length
//! means "fall off the end".

mod builder;

use std::fmt::Display;

pub(crate) use builder::CodeBuilder;

use crate::scanner::Location;

/// One instruction together with the operand it needs, if any.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
	PushString(String),
	PushInt(i64),
	PushBool(bool),
	/// Dump the stack and stop with the breakpoint exit status.
	Debug,
	/// Push a command marker.
	Cmd,
	/// Spawn the program and arguments above the nearest marker.
	Run,
	Jump(usize),
	JumpIfFalse(usize),
	/// Interpreted but not emitted; `while` lowers to `JumpIfFalse`.
	#[allow(dead_code)]
	JumpIfTrue(usize),
	Dup,
	Drop,
	Swap,
	Over,
	Rot,
	Not,
	GreaterEqual,
	LessEqual,
	Greater,
	Less,
	Equal,
	Add,
	Sub,
	Mul,
	Div,
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
}

impl Instruction {
	pub fn mnemonic(&self) -> &'static str {
		use Instruction::*;
		match self {
			PushString(_) => "PUSH_STRING",
			PushInt(_) => "PUSH_INT",
			PushBool(_) => "PUSH_BOOL",
			Debug => "DEBUG",
			Cmd => "CMD",
			Run => "RUN",
			Jump(_) => "JUMP",
			JumpIfFalse(_) => "JUMPZ",
			JumpIfTrue(_) => "JUMPNZ",
			Dup => "DUP",
			Drop => "DROP",
			Swap => "SWAP",
			Over => "OVER",
			Rot => "ROT",
			Not => "NOT",
			GreaterEqual => "GTEQ",
			LessEqual => "LTEQ",
			Greater => "GT",
			Less => "LT",
			Equal => "EQ",
			Add => "ADD",
			Sub => "SUB",
			Mul => "MUL",
			Div => "DIV",
			FileExists => "FILEEXISTS",
			DirExists => "DIREXISTS",
			Mkdir => "MKDIR",
			Cd => "CD",
			Getcwd => "GETCWD",
			Listdir => "LISTDIR",
			Fnmatch => "FNMATCH",
			Log => "LOG",
			Error => "ERROR",
			Print => "PRINT",
		}
	}

	/// The jump target, for jump instructions.
	pub fn target(&self) -> Option<usize> {
		match self {
			Instruction::Jump(target) | Instruction::JumpIfFalse(target) | Instruction::JumpIfTrue(target) => {
				Some(*target)
			}
			_ => None,
		}
	}
}

impl Display for Instruction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.mnemonic())?;
		match self {
			Instruction::PushString(s) => write!(f, " {s:?}"),
			Instruction::PushInt(n) => write!(f, " {n}"),
			Instruction::PushBool(b) => write!(f, " {b}"),
			other => match other.target() {
				Some(target) => write!(f, " -> {target}"),
				None => Ok(()),
			},
		}
	}
}

/// An instruction and the location of the token that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
	pub instruction: Instruction,
	pub location:    Location,
}

impl Operation {
	pub fn new(instruction: Instruction, location: Location) -> Self { Self { instruction, location } }
}

/// A compiled program.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Bytecode {
	operations: Vec<Operation>,
}

impl Bytecode {
	pub fn new(operations: Vec<Operation>) -> Self { Self { operations } }

	pub fn len(&self) -> usize { self.operations.len() }

	pub fn get(&self, pc: usize) -> Option<&Operation> { self.operations.get(pc) }

	#[cfg(test)]
	pub fn instructions(&self) -> impl Iterator<Item = &Instruction> { self.operations.iter().map(|op| &op.instruction) }
}

/// One line per operation, `location: index: MNEMONIC operand`.
impl Display for Bytecode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		for (index, op) in self.operations.iter().enumerate() {
			writeln!(f, "{}: {index}: {}", op.location, op.instruction)?;
		}
		Ok(())
	}
}
