use std::env;
use std::io::{self,IsTerminal};

pub const PROMPT_KEY: &str = "TRASH_PROMPT";
pub const HISTSIZE_KEY: &str = "TRASH_HISTSIZE";

const DEFAULT_PROMPT: &str = "trash $ ";
const DEFAULT_HISTSIZE: usize = 1000;

/// Interpreter settings, read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub prompt: String,
	pub history_size: usize,
	pub interactive: bool,
}

impl Default for Config {
	fn default() -> Config {
		Config { prompt: DEFAULT_PROMPT.to_string(), history_size: DEFAULT_HISTSIZE, interactive: false }
	}
}

impl Config {
	pub fn from_env() -> Config {
		Config::from_values(env::var(PROMPT_KEY).ok(), env::var(HISTSIZE_KEY).ok(), io::stdin().is_terminal())
	}

	fn from_values(prompt: Option<String>, histsize: Option<String>, interactive: bool) -> Config {
		let history_size = match histsize {
			None => DEFAULT_HISTSIZE,
			Some(s) => s.trim().parse().unwrap_or_else(|e| {
				tracing::warn!(value = %s, error = %e, "ignoring {}", HISTSIZE_KEY);
				DEFAULT_HISTSIZE
			}),
		};
		Config {
			prompt: prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
			history_size: history_size,
			interactive: interactive,
		}
	}

	/// The prompt to show after a line that finished with `last_status`.
	pub fn prompt_for(&self, last_status: i32) -> String {
		if last_status == 0 {
			self.prompt.clone()
		} else {
			format!("({}) {}", last_status, self.prompt)
		}
	}
}
