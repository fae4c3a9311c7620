use std::ffi::OsStr;
use std::fs;
use std::io::{self,Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd,IntoRawFd,RawFd};

use nix::errno::Errno;
use nix::fcntl::{self,FcntlArg};
use nix::unistd;

use crate::eval::ExecError;
use crate::types::{Redirect,RedirectMode};

const CREATE_MODE: u32 = 0o644;

// saved descriptors stay clear of the ones users can name with a digit
const SAVED_FD_MIN: RawFd = 10;

/// A descriptor pointed at a file until dropped, when the previous
/// descriptor is put back. The guard owns `fd` itself; the opened file's
/// own descriptor is gone once `apply` returns.
#[derive(Debug)]
pub struct Redirection {
	fd: RawFd,
	saved: Option<RawFd>,
}

fn flush_std() {
	let _ = io::stdout().flush();
	let _ = io::stderr().flush();
}

pub fn apply(redirect: &Redirect) -> Result<Redirection, ExecError> {
	let mut oopt = fs::OpenOptions::new();
	let _ = match redirect.mode {
		RedirectMode::Read => oopt.read(true),
		RedirectMode::Truncate => oopt.write(true).create(true).truncate(true),
		RedirectMode::Append => oopt.append(true).create(true),
	};
	oopt.mode(CREATE_MODE);
	let file = oopt.open(OsStr::from_bytes(&redirect.target))
		.map_err(|e| ExecError::Open { path: redirect.target.clone(), source: e })?;

	flush_std();
	let saved = match fcntl::fcntl(redirect.fd, FcntlArg::F_DUPFD_CLOEXEC(SAVED_FD_MIN)) {
		Ok(fd) => Some(fd),
		Err(Errno::EBADF) => None,
		Err(e) => return Err(e.into()),
	};
	if file.as_raw_fd() == redirect.fd {
		// the file landed on the free target descriptor
		let _ = file.into_raw_fd();
	} else if let Err(e) = unistd::dup2(file.as_raw_fd(), redirect.fd) {
		if let Some(fd) = saved {
			let _ = unistd::close(fd);
		}
		return Err(e.into());
	}
	tracing::debug!(fd = redirect.fd, mode = ?redirect.mode, target = %String::from_utf8_lossy(&redirect.target), "redirected");
	Ok(Redirection { fd: redirect.fd, saved: saved })
}

impl Drop for Redirection {
	fn drop(&mut self) {
		flush_std();
		match self.saved {
			Some(fd) => {
				let _ = unistd::dup2(fd, self.fd);
				let _ = unistd::close(fd);
			},
			None => {
				let _ = unistd::close(self.fd);
			},
		}
		tracing::trace!(fd = self.fd, restored = self.saved.is_some(), "restored");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Mutex;

	// both tests pick descriptor numbers, which are process-wide
	static FDS: Mutex<()> = Mutex::new(());

	fn is_open(fd: RawFd) -> bool {
		fcntl::fcntl(fd, FcntlArg::F_GETFD).is_ok()
	}

	fn write_raw(fd: RawFd, data: &[u8]) -> isize {
		unsafe { libc::write(fd, data.as_ptr() as *const libc::c_void, data.len()) }
	}

	#[test]
	fn free_descriptor_is_closed_once_on_drop() {
		let _fds = FDS.lock().unwrap();
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join("free.txt");
		// the lowest free descriptor is where the opened file will land
		let fd = fs::File::open("/dev/null").unwrap().as_raw_fd();

		let guard = apply(&Redirect { target: target.as_os_str().as_bytes().to_vec(), fd: fd, mode: RedirectMode::Truncate }).unwrap();
		assert!(is_open(fd));
		assert_eq!(write_raw(fd, b"hi\n"), 3);
		drop(guard);

		assert!(!is_open(fd));
		assert_eq!(fs::read_to_string(&target).unwrap(), "hi\n");
	}

	#[test]
	fn open_descriptor_is_put_back() {
		let _fds = FDS.lock().unwrap();
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join("busy.txt");
		let keep = fs::File::create(dir.path().join("keep.txt")).unwrap();
		let fd = keep.as_raw_fd();

		let guard = apply(&Redirect { target: target.as_os_str().as_bytes().to_vec(), fd: fd, mode: RedirectMode::Truncate }).unwrap();
		assert_eq!(write_raw(fd, b"redirected"), 10);
		drop(guard);
		assert_eq!(write_raw(fd, b"kept"), 4);

		assert_eq!(fs::read_to_string(&target).unwrap(), "redirected");
		assert_eq!(fs::read_to_string(dir.path().join("keep.txt")).unwrap(), "kept");
	}
}
