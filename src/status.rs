use nix::errno::Errno;
use nix::sys::wait::{self,WaitStatus};
use nix::unistd::Pid;

pub trait WaitStatusExt {
	fn code(self) -> i32;
}

impl WaitStatusExt for WaitStatus {
	/// Exit code as a shell reports it: the program's own code, or 128 plus
	/// the signal number when a signal ended or stopped it.
	fn code(self) -> i32 {
		match self {
			WaitStatus::Exited(_, code) => code,
			WaitStatus::Signaled(_, sig, _) => 128 + sig as i32,
			WaitStatus::Stopped(_, sig) => 128 + sig as i32,
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceEvent(_, sig, _) => 128 + sig as i32,
			#[cfg(any(target_os = "linux", target_os = "android"))]
			WaitStatus::PtraceSyscall(_) => 0,
			WaitStatus::Continued(_) => 0,
			WaitStatus::StillAlive => 0,
		}
	}
}

/// Retries a system call interrupted by a signal.
pub fn syscall<F, T>(f: F) -> nix::Result<T> where F: Fn() -> nix::Result<T> {
	loop {
		match f() {
			Err(Errno::EINTR) => {},
			r => return r,
		}
	}
}

pub fn wait_for(pid: Pid) -> nix::Result<i32> {
	let status = syscall(|| wait::waitpid(pid, None))?;
	tracing::debug!(%pid, ?status, "child reaped");
	Ok(status.code())
}
