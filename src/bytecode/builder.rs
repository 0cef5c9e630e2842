use super::{Bytecode, Instruction, Operation};
use crate::scanner::Location;

/// A forward jump whose target is not known yet.
///
/// Returned by [`CodeBuilder::emit_jump`] and consumed by
/// [`CodeBuilder::patch_jump`], so every placeholder gets patched exactly once.
#[derive(Debug)]
#[must_use = "a jump placeholder must be patched"]
pub(crate) struct JumpLabel(usize);

/// Appends operations and back-patches jump placeholders.
#[derive(Debug, Default)]
pub(crate) struct CodeBuilder {
	operations: Vec<Operation>,
}

impl CodeBuilder {
	pub fn new() -> Self { Self::default() }

	/// Index the next emitted operation will get.
	pub fn current_offset(&self) -> usize { self.operations.len() }

	pub fn emit(&mut self, instruction: Instruction, location: Location) {
		self.operations.push(Operation::new(instruction, location));
	}

	/// Emit a jump with a placeholder target.
	///
	/// `jump` builds the jump instruction from a target, e.g.
	/// `Instruction::JumpIfFalse`.
	pub fn emit_jump(&mut self, jump: fn(usize) -> Instruction, location: Location) -> JumpLabel {
		let label = JumpLabel(self.current_offset());
		self.emit(jump(usize::MAX), location);
		label
	}

	/// Emit a jump to an already known (backward) target.
	pub fn emit_jump_to(&mut self, jump: fn(usize) -> Instruction, target: usize, location: Location) {
		self.emit(jump(target), location);
	}

	/// Point the placeholder at the current offset.
	pub fn patch_jump(&mut self, label: JumpLabel) {
		let here = self.current_offset();
		match &mut self.operations[label.0].instruction {
			Instruction::Jump(target) | Instruction::JumpIfFalse(target) | Instruction::JumpIfTrue(target) => {
				*target = here;
			}
			other => unreachable!("jump label points at non-jump {other:?}"),
		}
	}

	pub fn build(self) -> Bytecode { Bytecode::new(self.operations) }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn location() -> Location { Location::new("test.mako".into(), 1, 1) }

	#[test]
	fn patch_forward_jump() {
		let mut code = CodeBuilder::new();
		let jump = code.emit_jump(Instruction::JumpIfFalse, location());
		code.emit(Instruction::Dup, location());
		code.emit(Instruction::Drop, location());
		code.patch_jump(jump);
		let bytecode = code.build();
		assert_eq!(bytecode.get(0).unwrap().instruction, Instruction::JumpIfFalse(3));
	}

	#[test]
	fn backward_jump() {
		let mut code = CodeBuilder::new();
		code.emit(Instruction::PushBool(true), location());
		code.emit_jump_to(Instruction::Jump, 0, location());
		assert_eq!(code.build().get(1).unwrap().instruction, Instruction::Jump(0));
	}
}
