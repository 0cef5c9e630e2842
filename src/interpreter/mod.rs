//! Stack machine that executes [`Bytecode`].
//!
//! The machine is a single value stack and a program counter. Each operation
//! checks its operands before touching the stack, and every failure ends the
//! run with a [`RuntimeError`].
//!
//! # Stack effects
//!
//! Written bottom…top; `S` string, `I` integer, `B` boolean, `M` marker.
//!
//! |Operation|Effect
//! --|--
//! push|`→ S` / `→ I` / `→ B`
//! cmd|`→ M`
//! run|`M S S* →`, spawns the program and waits
//! jumpz / jumpnz|`B →`
//! dup / drop|`X → X X` / `X →`
//! swap / over / rot|`X Y → Y X` / `X Y → X Y X` / `X Y Z → Y Z X`
//! not|`B → B`
//! comparisons|`I I → B`
//! arithmetic|`I I → I`
//! fileexists / direxists|`S → B`
//! mkdir / cd|`S →`
//! getcwd|`→ S`
//! listdir / fnmatch|`S → S* I`
//! log / print / error|`S →`

mod shell;
mod stack;
pub mod value;

use std::io::Write;

use anyhow::Context;
pub use shell::{OsShell, Shell, render_command};
pub use stack::Stack;
use tracing::{debug, trace};
use value::Value;

use crate::{
	bytecode::{Bytecode, Instruction, Operation},
	error::interpreter::{RuntimeError, RuntimeErrorType},
	scanner::Location,
};

/// Where to go after an operation.
enum Flow {
	Next,
	Jump(usize),
}

/// Interpreter that executes compiled build scripts.
pub struct Interpreter<S: Shell, W: Write> {
	stack:  Stack,
	shell:  S,
	/// Informational stream: file operations, `log`, `print` and commands.
	output: W,
}

impl<S: Shell, W: Write> Interpreter<S, W> {
	pub fn new(shell: S, output: W) -> Self { Self { stack: Stack::new(), shell, output } }

	#[cfg(test)]
	pub fn stack(&self) -> &Stack { &self.stack }

	/// Run the program from the first operation until the counter leaves it.
	pub fn execute(&mut self, bytecode: &Bytecode) -> Result<(), RuntimeError> {
		debug!(operations = bytecode.len(), "executing");
		let mut pc = 0;
		while let Some(op) = bytecode.get(pc) {
			trace!(pc, instruction = %op.instruction, stack = self.stack.len(), "step");
			pc = match self.step(op)? {
				Flow::Next => pc + 1,
				Flow::Jump(target) => target,
			};
		}
		debug!(stack = self.stack.len(), "finished");
		Ok(())
	}

	fn step(&mut self, op: &Operation) -> Result<Flow, RuntimeError> {
		use Instruction::*;
		let location = &op.location;
		match &op.instruction {
			PushString(s) => self.stack.push(Value::Str(s.clone()), location.clone()),
			PushInt(n) => self.stack.push(Value::Int(*n), location.clone()),
			PushBool(b) => self.stack.push(Value::Bool(*b), location.clone()),
			Debug => {
				return Err(RuntimeError::new(location.clone(), RuntimeErrorType::Breakpoint(self.dump_stack())));
			}
			Cmd => self.stack.push(Value::Marker, location.clone()),
			Run => self.run_command(location)?,
			Jump(target) => return Ok(Flow::Jump(*target)),
			JumpIfFalse(target) => {
				if !self.stack.pop_bool(location)? {
					return Ok(Flow::Jump(*target));
				}
			}
			JumpIfTrue(target) => {
				if self.stack.pop_bool(location)? {
					return Ok(Flow::Jump(*target));
				}
			}
			Dup => {
				let top = self.stack.peek(0, location)?.clone();
				self.stack.push_value(top);
			}
			Drop => {
				self.stack.pop(location)?;
			}
			Swap => {
				self.stack.require(2, location)?;
				let top = self.stack.pop(location)?;
				let second = self.stack.pop(location)?;
				self.stack.push_value(top);
				self.stack.push_value(second);
			}
			Over => {
				let second = self.stack.peek(1, location)?.clone();
				self.stack.push_value(second);
			}
			Rot => {
				self.stack.require(3, location)?;
				let z = self.stack.pop(location)?;
				let y = self.stack.pop(location)?;
				let x = self.stack.pop(location)?;
				self.stack.push_value(y);
				self.stack.push_value(z);
				self.stack.push_value(x);
			}
			Not => {
				let b = self.stack.pop_bool(location)?;
				self.stack.push(Value::Bool(!b), location.clone());
			}
			GreaterEqual => self.compare(location, |l, r| l >= r)?,
			LessEqual => self.compare(location, |l, r| l <= r)?,
			Greater => self.compare(location, |l, r| l > r)?,
			Less => self.compare(location, |l, r| l < r)?,
			Equal => self.compare(location, |l, r| l == r)?,
			Add => self.arithmetic(location, i64::checked_add)?,
			Sub => self.arithmetic(location, i64::checked_sub)?,
			Mul => self.arithmetic(location, i64::checked_mul)?,
			Div => {
				let (left, right) = self.stack.pop_int_pair(location)?;
				if right == 0 {
					return Err(RuntimeError::new(location.clone(), RuntimeErrorType::DivisionByZero));
				}
				let quotient = left
					.checked_div(right)
					.ok_or_else(|| RuntimeError::new(location.clone(), RuntimeErrorType::Overflow))?;
				self.stack.push(Value::Int(quotient), location.clone());
			}
			FileExists => {
				let path = self.stack.pop_string(location)?;
				let exists = self.shell.file_exists(&path);
				self.info(location, format_args!("FILEIO: file `{path}` {}", existence(exists)))?;
				self.stack.push(Value::Bool(exists), location.clone());
			}
			DirExists => {
				let path = self.stack.pop_string(location)?;
				let exists = self.shell.dir_exists(&path);
				self.info(location, format_args!("FILEIO: directory `{path}` {}", existence(exists)))?;
				self.stack.push(Value::Bool(exists), location.clone());
			}
			Mkdir => {
				let path = self.stack.pop_string(location)?;
				self.shell.make_dir(&path).map_err(|e| host(location, e))?;
				self.info(location, format_args!("FILEIO: created directory `{path}`"))?;
			}
			Cd => {
				let path = self.stack.pop_string(location)?;
				self.shell.change_dir(&path).map_err(|e| host(location, e))?;
				self.info(location, format_args!("FILEIO: changed cwd to `{path}`"))?;
			}
			Getcwd => {
				let cwd = self.shell.current_dir();
				self.info(location, format_args!("FILEIO: cwd = `{cwd}`"))?;
				self.stack.push(Value::Str(cwd), location.clone());
			}
			Listdir => {
				let path = self.stack.pop_string(location)?;
				let entries = self.shell.list_dir(&path).map_err(|e| host(location, e))?;
				self.info(location, format_args!("FILEIO: listed `{path}`"))?;
				self.push_entries(entries, location);
			}
			Fnmatch => {
				let pattern = self.stack.pop_string(location)?;
				let entries = self.shell.fnmatch(&pattern).map_err(|e| host(location, e))?;
				self.info(location, format_args!("FILEIO: fnmatched `{pattern}`"))?;
				self.push_entries(entries, location);
			}
			Log => {
				let message = self.stack.pop_string(location)?;
				self.info(location, format_args!("INFO: {message}"))?;
			}
			Error => {
				let message = self.stack.pop_string(location)?;
				return Err(RuntimeError::new(location.clone(), RuntimeErrorType::Raised(message)));
			}
			Print => {
				let message = self.stack.pop_string(location)?;
				self.write(location, format_args!("{message}"))?;
			}
		}
		Ok(Flow::Next)
	}

	/// `M S S* →`: spawn the program above the nearest marker.
	fn run_command(&mut self, location: &Location) -> Result<(), RuntimeError> {
		let marker = self
			.stack
			.find_marker()
			.ok_or_else(|| RuntimeError::new(location.clone(), RuntimeErrorType::MissingMarker))?;
		if marker + 1 >= self.stack.len() {
			let marker_location = self.stack.values()[marker].location.clone();
			return Err(RuntimeError::new(marker_location, RuntimeErrorType::MissingProgram));
		}

		let mut words = self
			.stack
			.split_off(marker)
			.into_iter()
			.skip(1)
			.map(|item| match item.value {
				Value::Str(s) => Ok(s),
				_ => Err(stack::mismatch("a string", item)),
			})
			.collect::<Result<Vec<_>, _>>()?;
		let program = words.remove(0);
		let command = render_command(&program, &words);

		self.info(location, format_args!("CMD: {command}"))?;
		debug!(%command, "spawning");
		let status = self.shell.run_program(&program, &words).map_err(|e| host(location, e))?;
		if status != Some(0) {
			return Err(RuntimeError::new(location.clone(), RuntimeErrorType::CommandFailed { command, status }));
		}
		Ok(())
	}

	/// `I I → B`, the top of the stack is the right-hand side.
	fn compare(&mut self, location: &Location, compare: fn(i64, i64) -> bool) -> Result<(), RuntimeError> {
		let (left, right) = self.stack.pop_int_pair(location)?;
		self.stack.push(Value::Bool(compare(left, right)), location.clone());
		Ok(())
	}

	/// `I I → I`; overflow is an error.
	fn arithmetic(&mut self, location: &Location, apply: fn(i64, i64) -> Option<i64>) -> Result<(), RuntimeError> {
		let (left, right) = self.stack.pop_int_pair(location)?;
		let result = apply(left, right).ok_or_else(|| RuntimeError::new(location.clone(), RuntimeErrorType::Overflow))?;
		self.stack.push(Value::Int(result), location.clone());
		Ok(())
	}

	/// `→ S* I`
	fn push_entries(&mut self, entries: Vec<String>, location: &Location) {
		let count = entries.len() as i64;
		for entry in entries {
			self.stack.push(Value::Str(entry), location.clone());
		}
		self.stack.push(Value::Int(count), location.clone());
	}

	/// Top to bottom, one value per line.
	fn dump_stack(&self) -> String {
		let mut dump = format!("Stack state: {} items\nSTACK TOP\n", self.stack.len());
		for value in self.stack.values().iter().rev() {
			dump.push_str(&format!("  {value}\n"));
		}
		dump.push_str("STACK BOTTOM");
		dump
	}

	/// One line on the informational stream.
	fn info(&mut self, location: &Location, line: std::fmt::Arguments) -> Result<(), RuntimeError> {
		self.write(location, format_args!("{line}\n"))
	}

	fn write(&mut self, location: &Location, text: std::fmt::Arguments) -> Result<(), RuntimeError> {
		self.output
			.write_fmt(text)
			.and_then(|_| self.output.flush())
			.context("failed to write output")
			.map_err(|e| host(location, e))
	}
}

fn existence(exists: bool) -> &'static str { if exists { "exists" } else { "doesn't exist" } }

fn host(location: &Location, error: anyhow::Error) -> RuntimeError {
	RuntimeError::new(location.clone(), RuntimeErrorType::Host(error))
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeSet;

	use super::{shell::wildcard_match, *};
	use crate::{compiler::compile, scanner::{Scanner, cross_reference}};

	/// An in-memory shell that records what it was asked to do.
	struct FakeShell {
		files:    BTreeSet<String>,
		dirs:     BTreeSet<String>,
		cwd:      String,
		commands: Vec<Vec<String>>,
		status:   Option<i32>,
	}

	impl FakeShell {
		fn new() -> Self {
			Self {
				files:    BTreeSet::from(["build.mako".to_string(), "src/main.c".to_string(), "src/util.c".to_string()]),
				dirs:     BTreeSet::from(["src".to_string()]),
				cwd:      "/project".to_string(),
				commands: Vec::new(),
				status:   Some(0),
			}
		}
	}

	impl Shell for FakeShell {
		fn file_exists(&self, path: &str) -> bool { self.files.contains(path) }

		fn dir_exists(&self, path: &str) -> bool { self.dirs.contains(path) }

		fn make_dir(&mut self, path: &str) -> anyhow::Result<()> {
			if self.files.contains(path) {
				anyhow::bail!("`{path}` is a file");
			}
			self.dirs.insert(path.to_string());
			Ok(())
		}

		fn change_dir(&mut self, path: &str) -> anyhow::Result<()> {
			if !self.dirs.contains(path) {
				anyhow::bail!("no such directory `{path}`");
			}
			self.cwd = format!("{}/{path}", self.cwd);
			Ok(())
		}

		fn current_dir(&self) -> String { self.cwd.clone() }

		fn list_dir(&self, path: &str) -> anyhow::Result<Vec<String>> {
			let prefix = format!("{path}/");
			Ok(self.files.iter().filter_map(|f| f.strip_prefix(&prefix)).map(str::to_string).collect())
		}

		fn fnmatch(&self, pattern: &str) -> anyhow::Result<Vec<String>> {
			Ok(self.files.iter().filter(|f| wildcard_match(pattern, f)).cloned().collect())
		}

		fn run_program(&mut self, program: &str, arguments: &[String]) -> anyhow::Result<Option<i32>> {
			let mut command = vec![program.to_string()];
			command.extend(arguments.iter().cloned());
			self.commands.push(command);
			Ok(self.status)
		}
	}

	fn bytecode(input: &str) -> Bytecode {
		let mut tokens = Scanner::new("test.mako", input).scan_tokens().unwrap();
		cross_reference(&mut tokens).unwrap();
		compile(&tokens).unwrap()
	}

	fn run_with(shell: &mut FakeShell, input: &str) -> (Result<(), RuntimeError>, Vec<Value>, String) {
		let mut output = Vec::new();
		let mut interpreter = Interpreter::new(shell, &mut output);
		let result = interpreter.execute(&bytecode(input));
		let values = interpreter.stack().values().iter().map(|v| v.value.clone()).collect();
		drop(interpreter);
		(result, values, String::from_utf8(output).unwrap())
	}

	fn run(input: &str) -> (Result<(), RuntimeError>, Vec<Value>, String) { run_with(&mut FakeShell::new(), input) }

	fn stack_of(input: &str) -> Vec<Value> {
		let (result, values, _) = run(input);
		result.unwrap();
		values
	}

	fn output_of(input: &str) -> String {
		let (result, _, output) = run(input);
		result.unwrap();
		output
	}

	fn error_of(input: &str) -> RuntimeError { run(input).0.unwrap_err() }

	fn s(value: &str) -> Value { Value::Str(value.to_string()) }

	#[test]
	fn push_literals() {
		assert_eq!(stack_of(r#""a" 1 true"#), vec![s("a"), Value::Int(1), Value::Bool(true)]);
	}

	#[test]
	fn if_else_takes_one_branch() {
		assert_eq!(output_of(r#"true if { "A" print } else { "B" print }"#), "A");
		assert_eq!(output_of(r#"false if { "A" print } else { "B" print }"#), "B");
		assert_eq!(output_of(r#"false if { "A" print } "C" print"#), "C");
	}

	#[test]
	fn while_runs_body_n_times() {
		let (result, values, output) = run(r#"3 while { dup 0 > } { "x" print 1 - } "done" print"#);
		result.unwrap();
		assert_eq!(output, "xxxdone");
		assert_eq!(values, vec![Value::Int(0)]);
		assert_eq!(output_of(r#"while { false } { "never" print }"#), "");
	}

	#[test]
	fn jump_if_true() {
		let location = Location::new("test.mako".into(), 1, 1);
		let program = Bytecode::new(vec![
			Operation::new(Instruction::PushBool(true), location.clone()),
			Operation::new(Instruction::JumpIfTrue(3), location.clone()),
			Operation::new(Instruction::PushInt(1), location.clone()),
			Operation::new(Instruction::PushInt(2), location),
		]);
		let mut interpreter = Interpreter::new(FakeShell::new(), Vec::new());
		interpreter.execute(&program).unwrap();
		let values: Vec<_> = interpreter.stack().values().iter().map(|v| v.value.clone()).collect();
		assert_eq!(values, vec![Value::Int(2)]);
	}

	#[test]
	fn stack_round_trips() {
		let base = vec![Value::Int(1), Value::Int(2), Value::Int(3)];
		assert_eq!(stack_of("1 2 3 dup drop"), base);
		assert_eq!(stack_of("1 2 3 swap swap"), base);
		assert_eq!(stack_of("1 2 3 rot rot rot"), base);
	}

	#[test]
	fn stack_shuffles() {
		assert_eq!(stack_of("1 2 swap"), vec![Value::Int(2), Value::Int(1)]);
		assert_eq!(stack_of("1 2 over"), vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
		assert_eq!(stack_of("1 2 3 rot"), vec![Value::Int(2), Value::Int(3), Value::Int(1)]);
		assert_eq!(stack_of(r#""a" dup"#), vec![s("a"), s("a")]);
	}

	#[test]
	fn dup_keeps_location() {
		let mut output = Vec::new();
		let mut interpreter = Interpreter::new(FakeShell::new(), &mut output);
		interpreter.execute(&bytecode("  7 dup")).unwrap();
		let values = interpreter.stack().values();
		assert_eq!(values[0].location, values[1].location);
		assert_eq!(values[1].location.column, 3);
	}

	#[test]
	fn underflow() {
		for input in ["drop", "1 swap", "1 over", "1 2 rot", "1 +", "dup", "!", "log", "cmd drop drop"] {
			let error = error_of(input);
			assert!(matches!(error.r#type, RuntimeErrorType::StackUnderflow { .. }), "{input}: {error}");
		}
		assert!(matches!(error_of("true if { } if { }").r#type, RuntimeErrorType::StackUnderflow { .. }));
	}

	#[test]
	fn arithmetic_and_comparison() {
		assert_eq!(stack_of("3 4 +"), vec![Value::Int(7)]);
		assert_eq!(stack_of("5 3 -"), vec![Value::Int(2)]);
		assert_eq!(stack_of("6 7 *"), vec![Value::Int(42)]);
		assert_eq!(stack_of("10 3 /"), vec![Value::Int(3)]);
		assert_eq!(stack_of("-7 2 /"), vec![Value::Int(-3)]);
		assert_eq!(stack_of("5 5 =="), vec![Value::Bool(true)]);
		assert_eq!(stack_of("1 2 <"), vec![Value::Bool(true)]);
		assert_eq!(stack_of("2 3 >="), vec![Value::Bool(false)]);
		assert_eq!(stack_of("3 3 <="), vec![Value::Bool(true)]);
		assert_eq!(stack_of("4 3 >"), vec![Value::Bool(true)]);
		assert_eq!(stack_of("true !"), vec![Value::Bool(false)]);
	}

	#[test]
	fn arithmetic_faults() {
		assert!(matches!(error_of("1 0 /").r#type, RuntimeErrorType::DivisionByZero));
		assert!(matches!(error_of("9223372036854775807 1 +").r#type, RuntimeErrorType::Overflow));
		assert!(matches!(error_of("-9223372036854775808 -1 /").r#type, RuntimeErrorType::Overflow));
		let error = error_of(r#"1 "2" +"#);
		assert_eq!(error.location.column, 3);
		assert!(matches!(error.r#type, RuntimeErrorType::TypeMismatch { expected: "an integer", .. }));
	}

	#[test]
	fn type_mismatch_reports_value_location() {
		let error = error_of("\n  \"text\" !");
		assert_eq!(error.location.to_string(), "test.mako:2:3");
		assert_eq!(error.to_string(), "test.mako:2:3: ERROR: expected a boolean, got a string `text`");
		assert!(matches!(error_of("1 if { }").r#type, RuntimeErrorType::TypeMismatch { expected: "a boolean", .. }));
		assert!(matches!(error_of("cmd !").r#type, RuntimeErrorType::TypeMismatch { .. }));
	}

	#[test]
	fn run_command() {
		let mut shell = FakeShell::new();
		let (result, values, output) = run_with(&mut shell, r#"cmd "echo" "hi" run"#);
		result.unwrap();
		assert!(values.is_empty());
		assert_eq!(output, "CMD: echo hi\n");
		assert_eq!(shell.commands, vec![vec!["echo".to_string(), "hi".to_string()]]);
	}

	#[test]
	fn run_keeps_values_below_marker() {
		let mut shell = FakeShell::new();
		let (result, values, _) = run_with(&mut shell, r#"1 cmd "cc" "-o" "main file" run"#);
		result.unwrap();
		assert_eq!(values, vec![Value::Int(1)]);
		assert_eq!(shell.commands[0], vec!["cc", "-o", "main file"]);
	}

	#[test]
	fn run_uses_nearest_marker() {
		let mut shell = FakeShell::new();
		let (result, values, output) = run_with(&mut shell, r#"cmd "outer" cmd "inner" run run"#);
		result.unwrap();
		assert!(values.is_empty());
		assert_eq!(output, "CMD: inner\nCMD: outer\n");
	}

	#[test]
	fn run_failures() {
		let mut shell = FakeShell::new();
		shell.status = Some(3);
		let error = run_with(&mut shell, r#"cmd "false" run"#).0.unwrap_err();
		assert!(matches!(error.r#type, RuntimeErrorType::CommandFailed { status: Some(3), .. }));

		assert!(matches!(error_of(r#""echo" run"#).r#type, RuntimeErrorType::MissingMarker));
		assert!(matches!(error_of("cmd run").r#type, RuntimeErrorType::MissingProgram));
		let error = error_of(r#"cmd "echo" 3 run"#);
		assert_eq!(error.location.column, 12);
		assert!(matches!(error.r#type, RuntimeErrorType::TypeMismatch { expected: "a string", .. }));
		assert!(matches!(error_of(r#"cmd 3 run"#).r#type, RuntimeErrorType::TypeMismatch { .. }));
	}

	#[test]
	fn filesystem_queries() {
		let (result, values, output) = run(r#""build.mako" fileexists "src" direxists "nope" fileexists"#);
		result.unwrap();
		assert_eq!(values, vec![Value::Bool(true), Value::Bool(true), Value::Bool(false)]);
		assert_eq!(
			output,
			"FILEIO: file `build.mako` exists\nFILEIO: directory `src` exists\nFILEIO: file `nope` doesn't exist\n"
		);
	}

	#[test]
	fn filesystem_mutations() {
		let mut shell = FakeShell::new();
		let (result, values, _) = run_with(&mut shell, r#""out" mkdir "out" cd getcwd"#);
		result.unwrap();
		assert!(shell.dirs.contains("out"));
		assert_eq!(values, vec![s("/project/out")]);

		let error = run_with(&mut FakeShell::new(), r#""missing" cd"#).0.unwrap_err();
		assert_eq!(error.to_string(), "test.mako:1:11: ERROR: no such directory `missing`");
	}

	#[test]
	fn getcwd_leaves_stack_alone() {
		assert_eq!(stack_of("1 getcwd"), vec![Value::Int(1), s("/project")]);
	}

	#[test]
	fn listing() {
		assert_eq!(stack_of(r#""src" listdir"#), vec![s("main.c"), s("util.c"), Value::Int(2)]);
		assert_eq!(stack_of(r#""src/*.c" fnmatch"#), vec![s("src/main.c"), s("src/util.c"), Value::Int(2)]);
		assert_eq!(stack_of(r#""*.h" fnmatch"#), vec![Value::Int(0)]);
	}

	#[test]
	fn log_and_print() {
		assert_eq!(output_of(r#""building" log "raw\n" print"#), "INFO: building\nraw\n");
	}

	#[test]
	fn error_raises() {
		let error = error_of(r#""boom" error"#);
		assert!(matches!(&error.r#type, RuntimeErrorType::Raised(message) if message == "boom"));
		assert!(!error.is_breakpoint());
	}

	#[test]
	fn debug_dumps_stack() {
		let error = error_of(r#"1 "a" debug "unreached" print"#);
		assert!(error.is_breakpoint());
		let RuntimeErrorType::Breakpoint(dump) = &error.r#type else { unreachable!() };
		assert_eq!(
			dump,
			"Stack state: 2 items\nSTACK TOP\n  string `a` (test.mako:1:3)\n  int 1 (test.mako:1:1)\nSTACK BOTTOM"
		);
		assert!(error.to_string().starts_with("DEBUG CRASH\nINITIATED AT test.mako:1:7\n"));
	}
}
