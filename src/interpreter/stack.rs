use super::value::{StackValue, Value};
use crate::{error::interpreter::{RuntimeError, RuntimeErrorType}, scanner::Location};

/// The interpreter's value stack.
///
/// Every accessor checks depth and kind; underflow is reported at the
/// operation, a kind mismatch at the value's own location.
#[derive(Debug, Default)]
pub struct Stack {
	values: Vec<StackValue>,
}

impl Stack {
	pub fn new() -> Self { Self::default() }

	pub fn len(&self) -> usize { self.values.len() }

	/// Bottom to top.
	pub fn values(&self) -> &[StackValue] { &self.values }

	pub fn push(&mut self, value: Value, location: Location) { self.values.push(StackValue::new(value, location)); }

	pub fn push_value(&mut self, value: StackValue) { self.values.push(value); }

	/// Fail unless at least `needed` values are present.
	pub fn require(&self, needed: usize, location: &Location) -> Result<(), RuntimeError> {
		if self.values.len() < needed {
			return Err(RuntimeError::new(
				location.clone(),
				RuntimeErrorType::StackUnderflow { needed, found: self.values.len() },
			));
		}
		Ok(())
	}

	/// The value `depth` items below the top, `0` being the top.
	pub fn peek(&self, depth: usize, location: &Location) -> Result<&StackValue, RuntimeError> {
		self.require(depth + 1, location)?;
		Ok(&self.values[self.values.len() - 1 - depth])
	}

	pub fn pop(&mut self, location: &Location) -> Result<StackValue, RuntimeError> {
		self.values.pop().ok_or_else(|| {
			RuntimeError::new(location.clone(), RuntimeErrorType::StackUnderflow { needed: 1, found: 0 })
		})
	}

	pub fn pop_bool(&mut self, location: &Location) -> Result<bool, RuntimeError> {
		match self.pop(location)? {
			StackValue { value: Value::Bool(b), .. } => Ok(b),
			other => Err(mismatch("a boolean", other)),
		}
	}

	pub fn pop_int(&mut self, location: &Location) -> Result<i64, RuntimeError> {
		match self.pop(location)? {
			StackValue { value: Value::Int(n), .. } => Ok(n),
			other => Err(mismatch("an integer", other)),
		}
	}

	pub fn pop_string(&mut self, location: &Location) -> Result<String, RuntimeError> {
		match self.pop(location)? {
			StackValue { value: Value::Str(s), .. } => Ok(s),
			other => Err(mismatch("a string", other)),
		}
	}

	/// Pop two integers, returning them in push order (`left` was pushed first).
	pub fn pop_int_pair(&mut self, location: &Location) -> Result<(i64, i64), RuntimeError> {
		self.require(2, location)?;
		let right = self.pop_int(location)?;
		let left = self.pop_int(location)?;
		Ok((left, right))
	}

	/// Index of the topmost command marker.
	pub fn find_marker(&self) -> Option<usize> { self.values.iter().rposition(|v| v.value == Value::Marker) }

	/// Remove everything from `index` upwards, returned bottom to top.
	pub fn split_off(&mut self, index: usize) -> Vec<StackValue> { self.values.split_off(index) }
}

pub(super) fn mismatch(expected: &'static str, found: StackValue) -> RuntimeError {
	RuntimeError::new(found.location, RuntimeErrorType::TypeMismatch { expected, found: found.value.describe() })
}
