use std::env;
use std::ffi::OsStr;
use std::os::unix::ffi::{OsStrExt,OsStringExt};
use std::str;

use nix::unistd::{self,User};

use crate::buffer;

const HOME_KEY: &str = "HOME";

// a variable whose value names itself would otherwise never settle
const MAX_EXPANSION_ROUNDS: usize = 64;

fn lookup_var(name: &[u8]) -> Vec<u8> {
	if name.is_empty() {
		return vec![];
	}
	env::var_os(OsStr::from_bytes(name)).map_or_else(Vec::new, |v| v.into_vec())
}

/// Replaces every `$name` with the value of `name` (empty when unset) and
/// rescans the result until no `$` is left.
pub fn expand_vars(token: Vec<u8>) -> Vec<u8> {
	let mut text = token;
	for _ in 0 .. MAX_EXPANSION_ROUNDS {
		let dollar = match text.iter().position(|&c| c == b'$') {
			Some(i) => i,
			None => return text,
		};
		let name_start = dollar + 1;
		let name_end = name_start + text[name_start ..].iter().take_while(|c| c.is_ascii_alphanumeric()).count();
		let value = lookup_var(&text[name_start .. name_end]);
		tracing::trace!(name = %String::from_utf8_lossy(&text[name_start .. name_end]), "expanding variable");

		let mut out = buffer::with_capacity(text.len() - (name_end - dollar) + value.len());
		buffer::extend(&mut out, &text[.. dollar]);
		buffer::extend(&mut out, &value);
		buffer::extend(&mut out, &text[name_end ..]);
		text = out;
	}
	eprintln!("trash: variable expansion too deep: {}", String::from_utf8_lossy(&text));
	text
}

fn home_dir() -> Option<Vec<u8>> {
	if let Some(home) = env::var_os(HOME_KEY) {
		return Some(home.into_vec());
	}
	match User::from_uid(unistd::getuid()) {
		Ok(Some(user)) => Some(user.dir.into_os_string().into_vec()),
		_ => None,
	}
}

fn user_dir(name: &[u8]) -> Option<Vec<u8>> {
	let name = str::from_utf8(name).ok()?;
	match User::from_name(name) {
		Ok(Some(user)) => Some(user.dir.into_os_string().into_vec()),
		_ => None,
	}
}

// `~N`: 0 is the working directory, 1 is home, anything else would need
// a directory stack
fn stack_dir(digits: &[u8]) -> Option<Vec<u8>> {
	let n: Option<u32> = str::from_utf8(digits).ok().and_then(|s| s.parse().ok());
	match n {
		Some(0) => match unistd::getcwd() {
			Ok(cwd) => Some(cwd.into_os_string().into_vec()),
			Err(e) => {
				eprintln!("trash: {}: ~0", e.desc());
				None
			},
		},
		Some(1) => {
			let home = home_dir();
			if home.is_none() {
				eprintln!("trash: unable to get user info.");
			}
			home
		},
		_ => {
			eprintln!("trash: not enough directory stack entries.");
			None
		},
	}
}

/// Expands a leading `~`, `~user`, `~0` or `~1`. Unsupported or unknown
/// forms leave the token as typed.
pub fn expand_tilde(token: Vec<u8>) -> Vec<u8> {
	if token.first() != Some(&b'~') {
		return token;
	}
	let name_end = token.iter().position(|&c| c == b'/').unwrap_or(token.len());
	let name = &token[1 .. name_end];

	let (dir, rest) = if name.is_empty() {
		match home_dir() {
			Some(home) => (home, name_end),
			None => {
				eprintln!("trash: unable to get user info.");
				return token;
			},
		}
	} else if name[0].is_ascii_digit() {
		let digits = name.iter().take_while(|c| c.is_ascii_digit()).count();
		match stack_dir(&name[.. digits]) {
			Some(dir) => (dir, 1 + digits),
			None => return token,
		}
	} else {
		match user_dir(name) {
			Some(dir) => (dir, name_end),
			None => {
				eprintln!("trash: no such user or named directory: {}", String::from_utf8_lossy(name));
				return token;
			},
		}
	};

	let mut out = buffer::with_capacity(dir.len() + token.len() - rest);
	buffer::extend(&mut out, &dir);
	buffer::extend(&mut out, &token[rest ..]);
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn home() -> Vec<u8> {
		home_dir().expect("no home directory")
	}

	#[test]
	fn unset_variable_expands_to_empty() {
		env::remove_var("TRASHEXPANDUNSET");
		assert_eq!(expand_vars(b"$TRASHEXPANDUNSET".to_vec()), b"");
		assert_eq!(expand_vars(b"a$TRASHEXPANDUNSET.b".to_vec()), b"a.b");
	}

	#[test]
	fn variable_is_spliced_in_place() {
		env::set_var("TRASHEXPANDA", "value");
		assert_eq!(expand_vars(b"x$TRASHEXPANDA/y".to_vec()), b"xvalue/y");
	}

	#[test]
	fn name_stops_at_first_non_alphanumeric() {
		env::set_var("TRASHEXPANDB", "b");
		env::remove_var("TRASHEXPANDB_TAIL");
		assert_eq!(expand_vars(b"$TRASHEXPANDB_TAIL".to_vec()), b"b_TAIL");
	}

	#[test]
	fn substituted_values_are_rescanned() {
		env::set_var("TRASHEXPANDC", "$TRASHEXPANDD!");
		env::set_var("TRASHEXPANDD", "deep");
		assert_eq!(expand_vars(b"$TRASHEXPANDC".to_vec()), b"deep!");
	}

	#[test]
	fn lone_dollar_is_dropped() {
		assert_eq!(expand_vars(b"a$-b".to_vec()), b"a-b");
		assert_eq!(expand_vars(b"$".to_vec()), b"");
	}

	#[test]
	fn self_referencing_variable_terminates() {
		env::set_var("TRASHEXPANDLOOP", "$TRASHEXPANDLOOP");
		assert_eq!(expand_vars(b"$TRASHEXPANDLOOP".to_vec()), b"$TRASHEXPANDLOOP");
	}

	#[test]
	fn bare_tilde_is_home() {
		assert_eq!(expand_tilde(b"~".to_vec()), home());
		let mut sub = home();
		sub.extend_from_slice(b"/src");
		assert_eq!(expand_tilde(b"~/src".to_vec()), sub);
	}

	#[test]
	fn numbered_tilde_forms() {
		let cwd = env::current_dir().unwrap().into_os_string().into_vec();
		assert_eq!(expand_tilde(b"~0".to_vec()), cwd);
		assert_eq!(expand_tilde(b"~1".to_vec()), home());
		assert_eq!(expand_tilde(b"~2".to_vec()), b"~2");
		assert_eq!(expand_tilde(b"~17/x".to_vec()), b"~17/x");
	}

	#[test]
	fn named_user_tilde() {
		if let Ok(Some(root)) = User::from_name("root") {
			let mut expected = root.dir.into_os_string().into_vec();
			expected.extend_from_slice(b"/bin");
			assert_eq!(expand_tilde(b"~root/bin".to_vec()), expected);
		}
		assert_eq!(expand_tilde(b"~no_such_user_trash/x".to_vec()), b"~no_such_user_trash/x");
	}

	#[test]
	fn tilde_elsewhere_is_literal() {
		assert_eq!(expand_tilde(b"a~b".to_vec()), b"a~b");
	}
}
