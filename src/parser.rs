use std::mem;
use std::os::unix::io::RawFd;

use crate::buffer;
use crate::expand;
use crate::types::*;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	#[error("syntax error near '{0}'")]
	UnexpectedOperator(char),
	#[error("malformed buffer.")]
	Malformed,
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum RedirectPhase {
	None,
	/// first half of `>>` or `<<` seen
	Doubled(u8),
	/// operator known, no target character yet
	Resolved,
	Target,
}

struct Parser<'a> {
	line: &'a [u8],
	i: usize,
	token: Vec<u8>,
	stage: Stage,
	escaped: bool,
	quote: Option<u8>,
	envvar: bool,
	tilde: bool,
	fd_digit: bool,
	redirect: RedirectPhase,
}

impl<'a> Parser<'a> {
	fn new(line: &'a [u8]) -> Parser<'a> {
		Parser {
			line: line,
			i: 0,
			token: buffer::with_capacity(buffer::TOKEN_CAPACITY),
			stage: Stage { args: buffer::with_capacity(buffer::ARGS_CAPACITY), redirect: None, next: None },
			escaped: false,
			quote: None,
			envvar: false,
			tilde: false,
			fd_digit: false,
			redirect: RedirectPhase::None,
		}
	}

	fn is_whitespace(c: u8) -> bool {
		match c {
			b' ' | b'\t' | b'\n' | b'\r' | b'\x0b' | b'\x0c' => true,
			_ => false,
		}
	}

	fn is_tilde_end(c: Option<&u8>) -> bool {
		match c {
			None => true,
			Some(&c) => Parser::is_whitespace(c) || c.is_ascii_alphanumeric() || c == b'/' || c == b'<' || c == b'>' || c == b'|',
		}
	}

	fn push_char(&mut self, c: u8, literal: bool) {
		if self.redirect == RedirectPhase::Resolved {
			self.redirect = RedirectPhase::Target;
		}
		self.fd_digit = self.token.is_empty() && !literal && c.is_ascii_digit() && self.redirect == RedirectPhase::None;
		buffer::push(&mut self.token, c);
	}

	fn reset_token(&mut self) -> Vec<u8> {
		self.envvar = false;
		self.tilde = false;
		self.fd_digit = false;
		mem::replace(&mut self.token, buffer::with_capacity(buffer::TOKEN_CAPACITY))
	}

	fn finish_token(&mut self) {
		if self.token.is_empty() {
			return;
		}
		let (envvar, tilde) = (self.envvar, self.tilde);
		let mut text = self.reset_token();
		if envvar {
			text = expand::expand_vars(text);
		}
		if tilde {
			text = expand::expand_tilde(text);
		}
		match self.redirect {
			RedirectPhase::Target => {
				if let Some(ref mut r) = self.stage.redirect {
					r.target = text;
				}
				self.redirect = RedirectPhase::None;
			},
			_ => buffer::push(&mut self.stage.args, text),
		}
	}

	fn resolve_redirect(&mut self, mode: RedirectMode, fd: Option<RawFd>) {
		let fd = fd.unwrap_or(mode.default_fd());
		self.stage.redirect = Some(Redirect { target: vec![], fd: fd, mode: mode });
		self.redirect = RedirectPhase::Resolved;
	}

	fn parse_operator(&mut self, c: u8) -> ParseResult<()> {
		match self.redirect {
			RedirectPhase::Resolved => { return Err(ParseError::UnexpectedOperator(c as char)); },
			RedirectPhase::Doubled(_) => { return Err(ParseError::Malformed); },
			RedirectPhase::Target | RedirectPhase::None => {},
		}

		let fd = if self.fd_digit {
			let n = (self.token[0] - b'0') as RawFd;
			self.reset_token();
			Some(n)
		} else {
			self.finish_token();
			None
		};

		let mode = if c == b'>' { RedirectMode::Truncate } else { RedirectMode::Read };
		self.resolve_redirect(mode, fd);
		if self.line.get(self.i) == Some(&c) {
			self.redirect = RedirectPhase::Doubled(c);
		}
		Ok(())
	}

	fn parse_doubled(&mut self, first: u8, c: u8) -> ParseResult<()> {
		if c != first {
			return Err(ParseError::Malformed);
		}
		if c == b'>' {
			if let Some(ref mut r) = self.stage.redirect {
				r.mode = RedirectMode::Append;
			}
		}
		self.redirect = RedirectPhase::Resolved;
		Ok(())
	}

	fn finish_stage(&mut self) -> ParseResult<()> {
		if let RedirectPhase::Doubled(_) = self.redirect {
			return Err(ParseError::Malformed);
		}
		self.finish_token();
		if self.redirect == RedirectPhase::Resolved {
			eprintln!("trash: syntax error.");
		}
		Ok(())
	}

	fn parse_stage(mut self) -> ParseResult<Stage> {
		while let Some(&c) = self.line.get(self.i) {
			self.i += 1;

			if let RedirectPhase::Doubled(first) = self.redirect {
				self.parse_doubled(first, c)?;
				continue;
			}
			if self.escaped {
				self.escaped = false;
				self.push_char(c, true);
				continue;
			}
			if let Some(q) = self.quote {
				match c {
					b'\\' => { self.escaped = true; },
					_ if c == q => { self.quote = None; },
					_ => {
						if c == b'$' {
							self.envvar = true;
						}
						self.push_char(c, true);
					},
				}
				continue;
			}

			match c {
				b'\\' => { self.escaped = true; },
				b'\'' | b'"' => { self.quote = Some(c); },
				b'|' => {
					self.finish_stage()?;
					let rest = &self.line[self.i ..];
					if rest.is_empty() {
						eprintln!("trash: syntax error.");
					} else {
						self.stage.next = Some(Box::new(parse(rest)?));
					}
					return Ok(self.stage);
				},
				b'>' | b'<' => self.parse_operator(c)?,
				b'$' => {
					self.envvar = true;
					self.push_char(c, false);
				},
				b'~' => {
					if self.token.is_empty() && Parser::is_tilde_end(self.line.get(self.i)) {
						self.tilde = true;
					}
					self.push_char(c, false);
				},
				_ if Parser::is_whitespace(c) => self.finish_token(),
				_ => self.push_char(c, false),
			}
		}
		self.finish_stage()?;
		Ok(self.stage)
	}
}

/// Turns one input line into a chain of stages, expanding variables and
/// tilde forms as tokens complete.
pub fn parse(line: &[u8]) -> ParseResult<Stage> {
	Parser::new(line).parse_stage()
}
