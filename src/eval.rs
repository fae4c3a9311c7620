use std::ffi::{self,CString};
use std::io::{self,Write};
use std::os::unix::io::AsRawFd;

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::unistd::{self,ForkResult,Pid};

use crate::builtin;
use crate::redirect;
use crate::status;
use crate::types::Stage;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
	#[error("{}: {}", describe(.source), String::from_utf8_lossy(.path))]
	Open { path: Vec<u8>, source: io::Error },
	#[error("{}", .0.desc())]
	Nix(#[from] nix::Error),
	#[error("nul char in argument: {0}")]
	Nul(#[from] ffi::NulError),
}

fn describe(e: &io::Error) -> String {
	match e.raw_os_error() {
		Some(n) => Errno::from_raw(n).desc().to_string(),
		None => e.to_string(),
	}
}

fn flush_std() {
	let _ = io::stdout().flush();
	let _ = io::stderr().flush();
}

fn exit_child(status: i32) -> ! {
	flush_std();
	unsafe { libc::_exit(status) }
}

fn fork() -> nix::Result<ForkResult> {
	flush_std();
	status::syscall(|| unsafe { unistd::fork() })
}

fn exec_error(stage: &Stage) -> ExecError {
	let argv: Result<Vec<CString>, ffi::NulError> = stage.args.iter().map(|a| CString::new(a.as_slice())).collect();
	let argv = match argv {
		Ok(argv) => argv,
		Err(e) => return e.into(),
	};
	match unistd::execvp(&argv[0], &argv) {
		Ok(never) => match never {},
		Err(e) => e.into(),
	}
}

fn exec_external(stage: &Stage) -> ! {
	let e = exec_error(stage);
	tracing::debug!(error = %e, "exec failed");
	eprintln!("trash: command not found: {}", String::from_utf8_lossy(&stage.args[0]));
	exit_child(1)
}

/// Runs one stage inside an already forked process: a builtin if there is
/// one, the external program otherwise. Never forks.
fn exec_in_place(stage: &Stage) -> ! {
	if let Some(builtin) = builtin::match_builtin(&stage.args[0]) {
		exit_child(builtin(stage));
	}
	exec_external(stage)
}

fn run_last(stage: &Stage) -> Result<i32, ExecError> {
	if let Some(builtin) = builtin::match_builtin(&stage.args[0]) {
		return Ok(builtin(stage));
	}
	match fork()? {
		ForkResult::Parent { child } => {
			tracing::debug!(pid = %child, name = %String::from_utf8_lossy(&stage.args[0]), "spawned");
			Ok(status::wait_for(child)?)
		},
		ForkResult::Child => exec_external(stage),
	}
}

fn run_pipe(stage: &Stage, next: &Stage) -> Result<i32, ExecError> {
	let (pipe_read, pipe_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;

	let producer: Pid = match fork()? {
		ForkResult::Parent { child } => child,
		ForkResult::Child => {
			if let Err(e) = unistd::dup2(pipe_write.as_raw_fd(), libc::STDOUT_FILENO) {
				eprintln!("trash: {}", e.desc());
				exit_child(1);
			}
			drop(pipe_read);
			drop(pipe_write);
			exec_in_place(stage)
		},
	};

	let consumer: Pid = match fork() {
		Ok(ForkResult::Parent { child }) => child,
		Ok(ForkResult::Child) => {
			if let Err(e) = unistd::dup2(pipe_read.as_raw_fd(), libc::STDIN_FILENO) {
				eprintln!("trash: {}", e.desc());
				exit_child(1);
			}
			drop(pipe_read);
			drop(pipe_write);
			exit_child(execute(next))
		},
		Err(e) => {
			drop(pipe_read);
			drop(pipe_write);
			let _ = status::wait_for(producer);
			return Err(e.into());
		},
	};
	tracing::debug!(%producer, %consumer, "pipe pair spawned");

	drop(pipe_read);
	drop(pipe_write);
	// the consumer carries the status of the rest of the chain
	status::wait_for(producer)?;
	Ok(status::wait_for(consumer)?)
}

/// Executes a stage chain and returns its exit status. A redirect on the
/// stage holds for the whole call and is undone before returning.
pub fn execute(stage: &Stage) -> i32 {
	let _redirection = match stage.redirect {
		Some(ref r) => match redirect::apply(r) {
			Ok(guard) => Some(guard),
			Err(e) => {
				eprintln!("trash: {}", e);
				return 1;
			},
		},
		None => None,
	};
	if stage.args.is_empty() {
		return 1;
	}

	let r = match stage.next {
		None => run_last(stage),
		Some(ref next) => run_pipe(stage, next),
	};
	r.unwrap_or_else(|e| {
		eprintln!("trash: {}", e);
		1
	})
}
