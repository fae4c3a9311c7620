use std::env;
use std::ffi::OsStr;
use std::io::{self,Write};
use std::os::unix::ffi::OsStrExt;
use std::process;

use nix::unistd;

use crate::types::Stage;

pub type Builtin = fn(&Stage) -> i32;

const HOME_KEY: &str = "HOME";

pub fn builtin_cd(stage: &Stage) -> i32 {
	let target = match stage.args.get(1) {
		Some(dir) => OsStr::from_bytes(dir).to_owned(),
		None => match env::var_os(HOME_KEY) {
			Some(home) => home,
			None => {
				eprintln!("cd: too few arguments");
				return 1;
			},
		},
	};
	match unistd::chdir(target.as_os_str()) {
		Ok(()) => {
			tracing::debug!(dir = ?target, "changed directory");
			0
		},
		Err(e) => {
			eprintln!("cd: {}: {}", e.desc(), target.to_string_lossy());
			1
		},
	}
}

pub fn builtin_echo(stage: &Stage) -> i32 {
	let text = stage.args.get(1).map_or(&b""[..], |t| t.as_slice());
	let mut stdout = io::stdout().lock();
	let r = stdout.write_all(text).and_then(|_| stdout.write_all(b"\n")).and_then(|_| stdout.flush());
	match r {
		Ok(()) => 0,
		Err(e) => {
			eprintln!("echo: {}", e);
			1
		},
	}
}

pub fn builtin_exit(_: &Stage) -> i32 {
	let _ = io::stdout().flush();
	process::exit(0)
}

fn split_assignment(arg: &[u8]) -> Option<(&[u8], &[u8])> {
	let eq = arg.iter().position(|&c| c == b'=')?;
	let (name, value) = (&arg[.. eq], &arg[eq + 1 ..]);
	if name.is_empty() || name.contains(&0) || value.contains(&0) {
		return None;
	}
	Some((name, value))
}

pub fn builtin_export(stage: &Stage) -> i32 {
	for arg in stage.args.iter().skip(1) {
		match split_assignment(arg) {
			Some((name, value)) => env::set_var(OsStr::from_bytes(name), OsStr::from_bytes(value)),
			None => {
				eprintln!("export: syntax error: {}", String::from_utf8_lossy(arg));
				return 1;
			},
		}
	}
	0
}

pub fn match_builtin(name: &[u8]) -> Option<Builtin> {
	match name {
		b"cd" => Some(builtin_cd),
		b"echo" => Some(builtin_echo),
		b"exit" => Some(builtin_exit),
		b"export" => Some(builtin_export),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn stage(args: &[&str]) -> Stage {
		Stage { args: args.iter().map(|a| a.as_bytes().to_vec()).collect(), redirect: None, next: None }
	}

	#[test]
	fn table_knows_the_builtins() {
		for name in [&b"cd"[..], b"echo", b"exit", b"export"] {
			assert!(match_builtin(name).is_some());
		}
		assert!(match_builtin(b"ls").is_none());
		assert!(match_builtin(b"").is_none());
	}

	#[test]
	fn export_sets_each_variable() {
		let status = builtin_export(&stage(&["export", "TRASHBUILTINA=1", "TRASHBUILTINB=two=2"]));
		assert_eq!(status, 0);
		assert_eq!(env::var("TRASHBUILTINA").unwrap(), "1");
		assert_eq!(env::var("TRASHBUILTINB").unwrap(), "two=2");
	}

	#[test]
	fn export_stops_at_malformed_argument() {
		env::remove_var("TRASHBUILTINC");
		env::remove_var("TRASHBUILTIND");
		let status = builtin_export(&stage(&["export", "TRASHBUILTINC=c", "oops", "TRASHBUILTIND=d"]));
		assert_eq!(status, 1);
		assert_eq!(env::var("TRASHBUILTINC").unwrap(), "c");
		assert!(env::var_os("TRASHBUILTIND").is_none());
	}

	#[test]
	fn export_rejects_empty_name() {
		assert_eq!(builtin_export(&stage(&["export", "=x"])), 1);
	}

	#[test]
	fn cd_to_missing_directory_fails() {
		assert_eq!(builtin_cd(&stage(&["cd", "/nonexistent/trash/dir"])), 1);
	}

	#[test]
	fn echo_succeeds() {
		assert_eq!(builtin_echo(&stage(&["echo", "hello"])), 0);
		assert_eq!(builtin_echo(&stage(&["echo"])), 0);
	}
}
