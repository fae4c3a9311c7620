use std::io::BufRead;

use anyhow::Result;
use rustyline::completion::{Completer,FilenameCompleter,Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType,Context,Editor,Helper};

use crate::config::Config;

/// Source of input lines. `None` means end of input.
pub trait LineReader {
	fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>>;
}

struct FileHelper {
	files: FilenameCompleter,
}

impl Completer for FileHelper {
	type Candidate = Pair;

	fn complete(&self, line: &str, pos: usize, ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
		self.files.complete(line, pos, ctx)
	}
}

impl Hinter for FileHelper {
	type Hint = String;
}

impl Highlighter for FileHelper {}
impl Validator for FileHelper {}
impl Helper for FileHelper {}

/// Terminal input with history and cycling filename completion on Tab.
pub struct EditorReader {
	editor: Editor<FileHelper, DefaultHistory>,
}

impl EditorReader {
	pub fn new(config: &Config) -> Result<EditorReader> {
		let rl_config = rustyline::Config::builder()
			.max_history_size(config.history_size)?
			.history_ignore_dups(true)?
			.completion_type(CompletionType::Circular)
			.build();
		let mut editor = Editor::with_config(rl_config)?;
		editor.set_helper(Some(FileHelper { files: FilenameCompleter::new() }));
		Ok(EditorReader { editor: editor })
	}
}

impl LineReader for EditorReader {
	fn read_line(&mut self, prompt: &str) -> Result<Option<Vec<u8>>> {
		match self.editor.readline(prompt) {
			Ok(line) => {
				if !line.trim().is_empty() {
					self.editor.add_history_entry(line.as_str())?;
				}
				Ok(Some(line.into_bytes()))
			},
			Err(ReadlineError::Interrupted) => Ok(Some(vec![])),
			Err(ReadlineError::Eof) => Ok(None),
			Err(e) => Err(e.into()),
		}
	}
}

/// Non-interactive input: no prompt, one line per read.
pub struct PipedReader<R> {
	input: R,
}

impl<R: BufRead> PipedReader<R> {
	pub fn new(input: R) -> PipedReader<R> {
		PipedReader { input: input }
	}
}

impl<R: BufRead> LineReader for PipedReader<R> {
	fn read_line(&mut self, _: &str) -> Result<Option<Vec<u8>>> {
		let mut line: Vec<u8> = vec![];
		if self.input.read_until(b'\n', &mut line)? == 0 {
			return Ok(None);
		}
		if line.last() == Some(&b'\n') {
			line.pop();
			if line.last() == Some(&b'\r') {
				line.pop();
			}
		}
		Ok(Some(line))
	}
}
