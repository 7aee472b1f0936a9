//! Subprocess execution with a deadline.
//!
//! Output is drained on reader threads so a chatty tool cannot block on a
//! full pipe, and the child is killed once the deadline passes.

use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const POLL: Duration = Duration::from_millis(20);
/// How long to wait for pipe readers after the child is gone; grandchildren
/// may keep the pipes open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Result of running one external command.
#[derive(Debug)]
pub enum Outcome {
    /// The process ran to completion. `code` is `None` when killed by a signal.
    Exited { code: Option<i32>, output: String },
    /// The deadline passed and the process was killed.
    TimedOut { after: Duration, output: String },
    /// The process could not be started at all.
    FailedToStart(std::io::Error),
}

/// A fully specified command line.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, a: impl Into<OsString>) -> Self {
        self.args.push(a.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shell-like rendering for logs and reports.
    pub fn display(&self) -> String {
        let prog = Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned());
        std::iter::once(prog)
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run `inv` in `cwd` with extra environment, killing it after `timeout`.
pub fn run(inv: &Invocation, cwd: &Path, env: &[(String, String)], timeout: Duration) -> Outcome {
    log::debug!("exec ({}s): {}", timeout.as_secs(), inv.display());
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in env {
        cmd.env(k, v);
    }
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return Outcome::FailedToStart(e),
    };

    let (tx, rx) = mpsc::channel::<(u8, Vec<u8>)>();
    spawn_reader(&mut child, 1, &tx);
    spawn_reader(&mut child, 2, &tx);
    drop(tx);

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if started.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            Ok(None) => thread::sleep(POLL),
            Err(e) => {
                log::debug!("wait failed for {}: {e}", inv.display());
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
        }
    };
    let output = collect(&rx);
    match status {
        Some(status) => Outcome::Exited {
            code: status.code(),
            output,
        },
        None => Outcome::TimedOut {
            after: started.elapsed(),
            output,
        },
    }
}

fn spawn_reader(child: &mut Child, stream: u8, tx: &mpsc::Sender<(u8, Vec<u8>)>) {
    let reader: Option<Box<dyn Read + Send>> = match stream {
        1 => child.stdout.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
        _ => child.stderr.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
    };
    if let Some(mut r) = reader {
        let tx = tx.clone();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            let _ = tx.send((stream, buf));
        });
    }
}

/// Stdout followed by stderr, each trimmed of trailing whitespace.
fn collect(rx: &mpsc::Receiver<(u8, Vec<u8>)>) -> String {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let deadline = Instant::now() + DRAIN_GRACE;
    for _ in 0..2 {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok((1, buf)) => stdout = buf,
            Ok((_, buf)) => stderr = buf,
            Err(_) => break,
        }
    }
    let parts: Vec<String> = [stdout, stderr]
        .iter()
        .map(|b| String::from_utf8_lossy(b).trim_end().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    parts.join("\n")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh(script: &str) -> Invocation {
        Invocation::new("sh").arg("-c").arg(script)
    }

    #[test]
    fn test_run_captures_exit_code_and_both_streams() {
        let dir = tempdir().unwrap();
        let out = run(
            &sh("echo out; echo err >&2; exit 3"),
            dir.path(),
            &[],
            Duration::from_secs(10),
        );
        match out {
            Outcome::Exited { code, output } => {
                assert_eq!(code, Some(3));
                assert_eq!(output, "out\nerr");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_run_kills_on_timeout() {
        let dir = tempdir().unwrap();
        let started = Instant::now();
        let out = run(
            &sh("echo started; exec sleep 5"),
            dir.path(),
            &[],
            Duration::from_millis(200),
        );
        assert!(matches!(out, Outcome::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_missing_program_fails_to_start() {
        let dir = tempdir().unwrap();
        let out = run(
            &Invocation::new("definitely-not-a-real-tool-xyz"),
            dir.path(),
            &[],
            Duration::from_secs(1),
        );
        assert!(matches!(out, Outcome::FailedToStart(_)));
    }

    #[test]
    fn test_run_passes_env_and_cwd() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let out = run(
            &sh("ls; printf '%s' \"$SMART_LINT_TEST\""),
            dir.path(),
            &[("SMART_LINT_TEST".into(), "yes".into())],
            Duration::from_secs(10),
        );
        match out {
            Outcome::Exited { output, .. } => {
                assert!(output.contains("marker.txt"));
                assert!(output.ends_with("yes"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
