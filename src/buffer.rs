use std::io::{self, Write};
use std::process;

pub const TOKEN_CAPACITY: usize = 32;
pub const ARGS_CAPACITY: usize = 8;

const ALLOC_ERROR: &[u8] = b"trash: allocation error.\n";

fn alloc_failure() -> ! {
	let mut stderr = io::stderr();
	let _ = stderr.write_all(ALLOC_ERROR);
	let _ = stderr.flush();
	process::exit(1)
}

pub fn with_capacity<T>(capacity: usize) -> Vec<T> {
	let mut v = Vec::new();
	if v.try_reserve_exact(capacity).is_err() {
		alloc_failure();
	}
	v
}

/// Makes room for one more element, doubling the capacity when full.
/// Growth always happens before the write that needs it.
pub fn grow<T>(v: &mut Vec<T>) {
	if v.len() < v.capacity() {
		return;
	}
	let extra = v.capacity().max(1);
	if v.try_reserve_exact(extra).is_err() {
		alloc_failure();
	}
}

pub fn push<T>(v: &mut Vec<T>, item: T) {
	grow(v);
	v.push(item);
}

pub fn extend(v: &mut Vec<u8>, bytes: &[u8]) {
	for &b in bytes {
		push(v, b);
	}
}
