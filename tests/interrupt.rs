//! SIGINT kills what the interpreter is running, not the interpreter.

use std::io::Write;
use std::os::unix::process::CommandExt;
use std::process::{Child,Command,Stdio};
use std::thread::sleep;
use std::time::{Duration,Instant};

use nix::sys::signal::{kill,Signal};
use nix::unistd::Pid;

fn spawn() -> Child {
	Command::new(env!("CARGO_BIN_EXE_trash"))
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.process_group(0)
		.spawn()
		.expect("failed to start trash")
}

fn interrupt_while_running(line: &str) -> (String, Duration) {
	let mut child = spawn();
	let pid = Pid::from_raw(child.id() as i32);
	let mut stdin = child.stdin.take().unwrap();
	let started = Instant::now();

	writeln!(stdin, "{}", line).unwrap();
	stdin.flush().unwrap();
	sleep(Duration::from_millis(500));
	kill(pid, Signal::SIGINT).unwrap();
	sleep(Duration::from_millis(200));

	writeln!(stdin, "echo alive").unwrap();
	drop(stdin);
	let out = child.wait_with_output().unwrap();
	assert!(out.status.success(), "interpreter died: {:?}", out.status);
	(String::from_utf8_lossy(&out.stdout).into_owned(), started.elapsed())
}

#[test]
fn interpreter_survives_interrupt() {
	let (stdout, elapsed) = interrupt_while_running("sleep 20");
	assert_eq!(stdout, "alive\n");
	assert!(elapsed < Duration::from_secs(15), "sleep was not interrupted: {:?}", elapsed);
}

#[test]
fn interrupt_reaches_every_pipeline_stage() {
	let (stdout, elapsed) = interrupt_while_running("sleep 20 | sleep 20 | sleep 20");
	assert_eq!(stdout, "alive\n");
	assert!(elapsed < Duration::from_secs(15), "pipeline was not interrupted: {:?}", elapsed);
}

#[test]
fn interrupt_at_prompt_is_harmless() {
	let mut child = spawn();
	let pid = Pid::from_raw(child.id() as i32);
	let mut stdin = child.stdin.take().unwrap();
	sleep(Duration::from_millis(300));
	kill(pid, Signal::SIGINT).unwrap();
	sleep(Duration::from_millis(100));
	writeln!(stdin, "echo alive").unwrap();
	drop(stdin);
	let out = child.wait_with_output().unwrap();
	assert!(out.status.success());
	assert_eq!(String::from_utf8_lossy(&out.stdout), "alive\n");
}
