use anyhow::Result;

use crate::config::Config;
use crate::eval;
use crate::input::LineReader;
use crate::parser;

/// Status of a line abandoned because it could not be parsed.
pub const PARSE_ERROR_STATUS: i32 = 2;

pub struct Shell<R> {
	config: Config,
	reader: R,
	status: i32,
}

impl<R: LineReader> Shell<R> {
	pub fn new(config: Config, reader: R) -> Shell<R> {
		Shell { config: config, reader: reader, status: 0 }
	}

	pub fn status(&self) -> i32 {
		self.status
	}

	/// Parses and runs one line. Blank lines leave the status untouched.
	pub fn run_line(&mut self, line: &[u8]) -> i32 {
		if line.iter().all(|c| c.is_ascii_whitespace()) {
			return self.status;
		}
		self.status = match parser::parse(line) {
			Ok(stage) => {
				tracing::debug!(stages = stage.pipeline_len(), "parsed");
				eval::execute(&stage)
			},
			Err(e) => {
				eprintln!("trash: {}", e);
				PARSE_ERROR_STATUS
			},
		};
		tracing::debug!(status = self.status, "line finished");
		self.status
	}

	/// Reads and runs lines until end of input.
	pub fn run(&mut self) -> Result<()> {
		loop {
			let prompt = self.config.prompt_for(self.status);
			match self.reader.read_line(&prompt)? {
				Some(line) => { self.run_line(&line); },
				None => return Ok(()),
			}
		}
	}
}
