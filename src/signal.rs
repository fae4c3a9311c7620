//! Interrupt broadcast.
//!
//! SIGINT makes the interpreter send SIGUSR1 to its whole process group.
//! Every process forked from the interpreter inherits the SIGUSR1 handler
//! and the interpreter's pid, and exits on SIGUSR1 unless it is the
//! interpreter itself. This stands in for terminal job control and is not
//! equivalent to it: once a child has exec'd another program that program
//! has default dispositions again, and only dies on SIGUSR1 (or SIGINT) by
//! default action rather than through the handler.

use std::sync::atomic::{AtomicI32,Ordering};

use nix::sys::signal::{self,SaFlags,SigAction,SigHandler,SigSet,Signal};
use nix::unistd::{self,Pid};

pub const INTERRUPT: Signal = Signal::SIGINT;
pub const BROADCAST: Signal = Signal::SIGUSR1;

// written once by install, read by handlers in every descendant
static ROOT_PID: AtomicI32 = AtomicI32::new(0);

extern "C" fn on_interrupt(_: libc::c_int) {
	let _ = signal::killpg(unistd::getpgrp(), BROADCAST);
}

extern "C" fn on_broadcast(_: libc::c_int) {
	if unistd::getpid().as_raw() != ROOT_PID.load(Ordering::Relaxed) {
		unsafe { libc::_exit(128 + INTERRUPT as libc::c_int) }
	}
}

/// Records `root` as the interpreter's pid and installs both handlers.
/// Calling it again keeps the first pid.
pub fn install(root: Pid) -> nix::Result<()> {
	if ROOT_PID.compare_exchange(0, root.as_raw(), Ordering::SeqCst, Ordering::SeqCst).is_err() {
		tracing::warn!(%root, "signal handlers already installed");
		return Ok(());
	}
	let interrupt = SigAction::new(SigHandler::Handler(on_interrupt), SaFlags::empty(), SigSet::empty());
	let broadcast = SigAction::new(SigHandler::Handler(on_broadcast), SaFlags::empty(), SigSet::empty());
	unsafe {
		signal::sigaction(INTERRUPT, &interrupt)?;
		signal::sigaction(BROADCAST, &broadcast)?;
	}
	tracing::debug!(%root, "interrupt broadcast installed");
	Ok(())
}
