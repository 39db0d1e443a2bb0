use nix::{
    errno::Errno,
    fcntl::{FcntlArg, OFlag, fcntl},
    sys::signal::{Signal, kill},
    unistd::{self, Pid},
};
use std::{
    io::Read,
    os::unix::io::{FromRawFd, RawFd},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

// Copy of `GLYPH_SET` in src/types.rs; keep the two in sync.
const GLYPHS: [&str; 15] = [
    "A̵̦̦̓͌͗͛̕", "A", "₳", "░A░", "A҉", "Ⱥ", "A̷", "A̲", "A̳", "A̾", "A͎", "A͓̽", "𝔸", "ᴀ", "∀",
];

fn spawn(args: &[&str]) -> Child {
    spawn_with_stdout(args, Stdio::piped())
}

fn spawn_with_stdout(args: &[&str], stdout: Stdio) -> Child {
    Command::new(env!("CARGO_BIN_EXE_glitch"))
        .args(args)
        .stdout(stdout)
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn signal(child: &Child, sig: Signal) {
    kill(Pid::from_raw(child.id() as i32), sig).unwrap();
}

/// A pipe whose buffer is already full, so the next write to it blocks.
/// Returns `(read_end, write_end)`.
fn full_pipe() -> (RawFd, RawFd) {
    let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC).unwrap();

    let flags = OFlag::from_bits_truncate(fcntl(write_end, FcntlArg::F_GETFL).unwrap());
    fcntl(write_end, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK)).unwrap();

    let chunk = [b'x'; 4096];
    loop {
        match unistd::write(write_end, &chunk) {
            Ok(_) => continue,
            Err(Errno::EAGAIN) => break,
            Err(err) => panic!("filling pipe: {err}"),
        }
    }
    // a single byte may still fit after a partial page
    while unistd::write(write_end, b"x").is_ok() {}

    fcntl(write_end, FcntlArg::F_SETFL(flags)).unwrap();

    (read_end, write_end)
}

fn wait_with_deadline(child: &mut Child, deadline: Duration) -> ExitStatus {
    let started = Instant::now();

    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if started.elapsed() > deadline {
            let _ = child.kill();
            panic!("process still running after {deadline:?}");
        }
        thread::sleep(Duration::from_millis(10));
    }
}

// Same longest-match walk as `split_glyphs` in src/helpers.rs.
fn glyph_count(line: &str) -> Option<usize> {
    let mut rest = line;
    let mut count = 0;

    while !rest.is_empty() {
        let glyph = GLYPHS
            .iter()
            .filter(|g| rest.starts_with(**g))
            .max_by_key(|g| g.len())?;
        rest = &rest[glyph.len()..];
        count += 1;
    }

    Some(count)
}

fn stdout_of(child: &mut Child) -> String {
    let mut out = String::new();
    child.stdout.take().unwrap().read_to_string(&mut out).unwrap();
    out
}

#[test]
fn prints_glyph_lines_until_terminated() {
    let mut child = spawn(&[]);
    thread::sleep(Duration::from_millis(750));

    signal(&child, Signal::SIGTERM);
    let status = wait_with_deadline(&mut child, Duration::from_secs(2));
    assert!(status.success(), "{status:?}");

    let out = stdout_of(&mut child);
    let lines: Vec<&str> = out.lines().collect();

    assert!(lines.len() >= 3, "only {} lines", lines.len());
    for line in lines {
        let count = glyph_count(line).unwrap_or_else(|| panic!("unknown glyph in {line:?}"));
        assert!((1..=20).contains(&count), "{count} glyphs in {line:?}");
    }
}

#[test]
fn interrupt_stops_the_process() {
    let mut child = spawn(&[]);
    thread::sleep(Duration::from_millis(300));

    signal(&child, Signal::SIGINT);
    let status = wait_with_deadline(&mut child, Duration::from_secs(2));
    assert!(status.success(), "{status:?}");
}

#[test]
fn terminate_right_after_start_does_not_hang() {
    let mut child = spawn(&[]);

    signal(&child, Signal::SIGTERM);
    wait_with_deadline(&mut child, Duration::from_secs(2));
}

#[test]
fn same_seed_prints_the_same_lines() {
    let run = || {
        let mut child = spawn(&["-seed", "2024"]);
        thread::sleep(Duration::from_millis(450));
        signal(&child, Signal::SIGTERM);
        wait_with_deadline(&mut child, Duration::from_secs(2));
        stdout_of(&mut child)
    };

    let first = run();
    let second = run();
    let shared = first.lines().count().min(second.lines().count());

    assert!(shared >= 2);
    assert!(first.lines().zip(second.lines()).take(shared).all(|(a, b)| a == b));
}

#[test]
fn unknown_argument_exits_with_usage_error() {
    let status = Command::new(env!("CARGO_BIN_EXE_glitch"))
        .arg("-bogus")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));
}

#[test]
fn terminate_exits_while_stdout_is_blocked() {
    let (read_end, write_end) = full_pipe();

    // the child owns the write end from here on
    let stdout = unsafe { Stdio::from_raw_fd(write_end) };
    let mut child = spawn_with_stdout(&["-seed", "1"], stdout);

    // long enough for the printer to block on its first line
    thread::sleep(Duration::from_millis(500));
    assert!(child.try_wait().unwrap().is_none());

    signal(&child, Signal::SIGTERM);
    let status = wait_with_deadline(&mut child, Duration::from_secs(2));

    unistd::close(read_end).unwrap();
    assert!(status.success(), "{status:?}");
}
