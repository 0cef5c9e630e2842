//! # How a build script becomes running commands
//!
//! Build script: `cmd "cc" "-o" "app" "main.c" run`

//! ## Scanning
//!
//! The scanner turns characters into tokens. Braces, comparison and arithmetic
//! operators, string literals `"main.c"`, integers `-3` and words `run` are all
//! tokens. Whitespace and `#` comments are dropped.
//!
//! After scanning, every `{` is paired with its `}` so later stages can find
//! the end of a block without counting braces again.

//! ## Compiling
//!
//! There is no syntax tree. The compiler walks a range of tokens and emits a
//! flat list of operations straight away:
//!
//! ``` markdown
//! build.mako:1:1: 0: CMD
//! build.mako:1:5: 1: PUSH_STRING "cc"
//! build.mako:1:10: 2: PUSH_STRING "-o"
//! build.mako:1:15: 3: PUSH_STRING "app"
//! build.mako:1:21: 4: PUSH_STRING "main.c"
//! build.mako:1:30: 5: RUN
//! ```
//!
//! `macro name { ... }` only records the token range of the body. Using the
//! name compiles that range again in place, so macros are expanded inline,
//! may refer to macros defined later, and are stopped by a depth limit when
//! they recurse.
//!
//! `if` and `while` lower to conditional and unconditional jumps. Forward jumps
//! are emitted with a placeholder target and patched once the end of the block
//! is known.

//! ## Executing
//!
//! The interpreter is a stack machine. Every value remembers where it was
//! pushed, so a type error points at the code that produced the bad value
//! rather than the operation that tripped over it.
//!
//! `cmd` pushes a marker, `run` takes everything above the nearest marker as a
//! program and its arguments, spawns it and fails the build if it exits
//! unsuccessfully.

pub mod cli;
mod bytecode;
mod compiler;
mod error;
mod interpreter;
mod logging;
mod mako;
mod scanner;

pub use compiler::MAX_EXPANSION_DEPTH;
pub use error::{
	EXIT_BREAKPOINT, EXIT_FAILURE, MakoError,
	compiler::{CompileError, CompileErrorType},
	interpreter::{RuntimeError, RuntimeErrorType},
	scanner::{ScanError, ScanErrorType},
};
pub use interpreter::{OsShell, Shell};
pub use logging::init_logging;
pub use mako::{Mako, Mode};
pub use scanner::Location;
