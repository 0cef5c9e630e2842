//! Everything the interpreter does to the outside world goes through [`Shell`].

use std::{
	fs,
	path::{Path, PathBuf},
	process::Command,
};

use anyhow::{Context, bail};
use tracing::debug;

/// Filesystem queries, directory changes and process spawning.
///
/// Paths are passed through as the script wrote them; relative paths are
/// resolved against the shell's own working directory.
pub trait Shell {
	fn file_exists(&self, path: &str) -> bool;

	fn dir_exists(&self, path: &str) -> bool;

	fn make_dir(&mut self, path: &str) -> anyhow::Result<()>;

	fn change_dir(&mut self, path: &str) -> anyhow::Result<()>;

	fn current_dir(&self) -> String;

	/// Entry names of a directory, in enumeration order.
	fn list_dir(&self, path: &str) -> anyhow::Result<Vec<String>>;

	/// Paths matching a wildcard pattern in its last component.
	fn fnmatch(&self, pattern: &str) -> anyhow::Result<Vec<String>>;

	/// Spawn and wait; `None` when the child was killed by a signal.
	fn run_program(&mut self, program: &str, arguments: &[String]) -> anyhow::Result<Option<i32>>;
}

impl<S: Shell + ?Sized> Shell for &mut S {
	fn file_exists(&self, path: &str) -> bool { (**self).file_exists(path) }

	fn dir_exists(&self, path: &str) -> bool { (**self).dir_exists(path) }

	fn make_dir(&mut self, path: &str) -> anyhow::Result<()> { (**self).make_dir(path) }

	fn change_dir(&mut self, path: &str) -> anyhow::Result<()> { (**self).change_dir(path) }

	fn current_dir(&self) -> String { (**self).current_dir() }

	fn list_dir(&self, path: &str) -> anyhow::Result<Vec<String>> { (**self).list_dir(path) }

	fn fnmatch(&self, pattern: &str) -> anyhow::Result<Vec<String>> { (**self).fnmatch(pattern) }

	fn run_program(&mut self, program: &str, arguments: &[String]) -> anyhow::Result<Option<i32>> {
		(**self).run_program(program, arguments)
	}
}

/// The real operating system.
///
/// `cd` only moves this shell's own working directory; spawned programs are
/// started in it, the host process's directory is never changed.
#[derive(Debug, Clone)]
pub struct OsShell {
	cwd: PathBuf,
}

impl OsShell {
	/// A shell starting in the process's current directory.
	pub fn new() -> anyhow::Result<Self> {
		let cwd = std::env::current_dir().context("failed to read the current directory")?;
		Ok(Self { cwd })
	}

	/// A shell starting in `dir`.
	pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self { Self { cwd: dir.as_ref().to_path_buf() } }

	fn resolve(&self, path: &str) -> PathBuf { self.cwd.join(path) }
}

impl Shell for OsShell {
	fn file_exists(&self, path: &str) -> bool { self.resolve(path).is_file() }

	fn dir_exists(&self, path: &str) -> bool { self.resolve(path).is_dir() }

	fn make_dir(&mut self, path: &str) -> anyhow::Result<()> {
		fs::create_dir_all(self.resolve(path)).with_context(|| format!("failed to create directory `{path}`"))
	}

	fn change_dir(&mut self, path: &str) -> anyhow::Result<()> {
		let target = self.resolve(path);
		if !target.is_dir() {
			bail!("failed to change directory to `{path}`: not a directory");
		}
		self.cwd = target.canonicalize().with_context(|| format!("failed to change directory to `{path}`"))?;
		debug!(cwd = %self.cwd.display(), "changed directory");
		Ok(())
	}

	fn current_dir(&self) -> String { self.cwd.display().to_string() }

	fn list_dir(&self, path: &str) -> anyhow::Result<Vec<String>> {
		let entries = fs::read_dir(self.resolve(path)).with_context(|| format!("failed to list directory `{path}`"))?;
		entries
			.map(|entry| {
				let entry = entry.with_context(|| format!("failed to list directory `{path}`"))?;
				Ok(entry.file_name().to_string_lossy().into_owned())
			})
			.collect()
	}

	fn fnmatch(&self, pattern: &str) -> anyhow::Result<Vec<String>> {
		let (dir, name_pattern) = match pattern.rfind('/') {
			Some(slash) => pattern.split_at(slash + 1),
			None => ("", pattern),
		};
		let names = self.list_dir(if dir.is_empty() { "." } else { dir })?;
		Ok(names.into_iter().filter(|name| wildcard_match(name_pattern, name)).map(|name| format!("{dir}{name}")).collect())
	}

	fn run_program(&mut self, program: &str, arguments: &[String]) -> anyhow::Result<Option<i32>> {
		let status = Command::new(program)
			.args(arguments)
			.current_dir(&self.cwd)
			.status()
			.with_context(|| format!("failed to run `{program}`"))?;
		Ok(status.code())
	}
}

/// Render a command line for logging, quoting words that need it.
pub fn render_command(program: &str, arguments: &[String]) -> String {
	std::iter::once(program).chain(arguments.iter().map(String::as_str)).map(quote).collect::<Vec<_>>().join(" ")
}

fn quote(word: &str) -> String {
	let plain = !word.is_empty() && !word.chars().any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '\\'));
	if plain { word.to_string() } else { format!("'{}'", word.replace('\'', r"'\''")) }
}

/// Shell-style wildcard matching: `*`, `?` and `[...]` classes (`[!...]` negates).
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
	let pattern: Vec<char> = pattern.chars().collect();
	let name: Vec<char> = name.chars().collect();
	let (mut p, mut n) = (0, 0);
	// Position of the last `*` and how much of the name it has swallowed.
	let mut star: Option<(usize, usize)> = None;

	while n < name.len() {
		let next = match pattern.get(p) {
			Some('*') => {
				star = Some((p, n));
				p += 1;
				continue;
			}
			Some('?') => Some(p + 1),
			Some('[') => match class_match(&pattern, p + 1, name[n]) {
				Some((matched, after)) => matched.then_some(after),
				// unterminated class, `[` is literal
				None => (name[n] == '[').then_some(p + 1),
			},
			Some(&c) => (c == name[n]).then_some(p + 1),
			None => None,
		};
		match (next, star) {
			(Some(after), _) => {
				p = after;
				n += 1;
			}
			(None, Some((star_p, star_n))) => {
				star = Some((star_p, star_n + 1));
				p = star_p + 1;
				n = star_n + 1;
			}
			(None, None) => return false,
		}
	}
	pattern[p..].iter().all(|&c| c == '*')
}

/// Match `c` against the class starting after `[`; returns the verdict and the
/// index after the closing `]`, or `None` if the class never closes.
fn class_match(pattern: &[char], start: usize, c: char) -> Option<(bool, usize)> {
	let mut i = start;
	let negated = matches!(pattern.get(i), Some('!' | '^'));
	if negated {
		i += 1;
	}
	let mut matched = false;
	let mut first = true;
	loop {
		let low = *pattern.get(i)?;
		if low == ']' && !first {
			break;
		}
		first = false;
		match (pattern.get(i + 1), pattern.get(i + 2)) {
			(Some('-'), Some(&high)) if high != ']' => {
				matched |= low <= c && c <= high;
				i += 3;
			}
			_ => {
				matched |= low == c;
				i += 1;
			}
		}
	}
	Some((matched != negated, i + 1))
}
