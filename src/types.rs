use std::os::unix::io::RawFd;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectMode { Read, Truncate, Append }

impl RedirectMode {
	pub fn default_fd(self) -> RawFd {
		match self {
			RedirectMode::Read => libc::STDIN_FILENO,
			RedirectMode::Truncate | RedirectMode::Append => libc::STDOUT_FILENO,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub target: Vec<u8>,
	pub fd: RawFd,
	pub mode: RedirectMode,
}

/// One element of a pipeline. A stage without `next` is the last one.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
	pub args: Vec<Vec<u8>>,
	pub redirect: Option<Redirect>,
	pub next: Option<Box<Stage>>,
}

impl Stage {
	pub fn pipeline_len(&self) -> usize {
		self.iter().count()
	}

	pub fn iter(&self) -> StageIter {
		StageIter { cur: Some(self) }
	}
}

pub struct StageIter<'a> {
	cur: Option<&'a Stage>,
}

impl<'a> Iterator for StageIter<'a> {
	type Item = &'a Stage;

	fn next(&mut self) -> Option<&'a Stage> {
		let cur = self.cur?;
		self.cur = cur.next.as_deref();
		Some(cur)
	}
}

impl Drop for Stage {
	// unlink iteratively so a long chain does not recurse in drop
	fn drop(&mut self) {
		let mut next = self.next.take();
		while let Some(mut stage) = next {
			next = stage.next.take();
		}
	}
}
