//! Subprocess byte-stream runner.
//!
//! Every view-populating subprocess (log, diff, ls-files, ls-tree, blame
//! --incremental, cat-file) is spawned here, with one `std::thread` per pipe
//! doing the actual blocking reads and forwarding complete lines over a
//! bounded `crossbeam_channel`. This mirrors `core-input`'s background
//! producer pattern for the terminal event stream, but deliberately skips
//! an async runtime: draining is a non-blocking `try_recv` loop from the
//! single-threaded event loop, so no view-visible mutation ever happens off
//! that thread — only byte shuffling happens on the reader threads.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, trace, warn};

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {command}: {source}")]
    Spawn { command: String, #[source] source: std::io::Error },
    #[error("child stdout was not piped")]
    NoStdout,
    #[error("child stdin was not piped")]
    NoStdin,
    #[error("write to child stdin failed: {0}")]
    StdinWrite(std::io::Error),
    #[error("foreground command failed: {0}")]
    Foreground(std::io::Error),
}

/// One record read from a child's stdout/stderr pipe.
#[derive(Debug, Clone)]
pub enum PipeRecord {
    /// A complete line, delimiter stripped. `\0`-delimited producers (the
    /// NUL-terminated `diff --raw -z` records) are read with `read_until`
    /// using the byte the caller configures via [`Delimiter`].
    Line(Vec<u8>),
    /// The pipe reached EOF; carries the process exit status if the runner
    /// waited for it (stdout pipes don't wait — the process handle owns
    /// that).
    Eof,
}

#[derive(Debug, Clone, Copy)]
pub enum Delimiter {
    Newline,
    Nul,
}

impl Delimiter {
    fn byte(self) -> u8 {
        match self {
            Delimiter::Newline => b'\n',
            Delimiter::Nul => 0,
        }
    }
}

/// Description of a subprocess to spawn, built by the caller (core-git) from
/// `opt.diff_options`/`opt.blame_options`/argv templates and the current
/// worktree.
pub struct Spawn {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub delimiter: Delimiter,
    pub pipe_stdin: bool,
}

impl Spawn {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Spawn {
            program: program.into(),
            args,
            cwd: None,
            env: Vec::new(),
            delimiter: Delimiter::Newline,
            pipe_stdin: false,
        }
    }

    pub fn cwd(mut self, cwd: PathBuf) -> Self {
        self.cwd = Some(cwd);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_stdin(mut self) -> Self {
        self.pipe_stdin = true;
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A live, non-blocking subprocess. Lines arrive on `receiver`; the reader
/// thread sends a final [`PipeRecord::Eof`] when the pipe closes. Dropping
/// this handle without calling [`ProcessHandle::kill`] leaves the child and
/// reader thread running until the child exits naturally.
pub struct ProcessHandle {
    child: Child,
    receiver: crossbeam_channel::Receiver<PipeRecord>,
    reader_thread: Option<JoinHandle<()>>,
    command_line: String,
}

impl ProcessHandle {
    pub fn spawn(spawn: Spawn) -> Result<Self, ProcessError> {
        let command_line = spawn.command_line();
        let mut cmd = Command::new(&spawn.program);
        cmd.args(&spawn.args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        if spawn.pipe_stdin {
            cmd.stdin(Stdio::piped());
        } else {
            cmd.stdin(Stdio::null());
        }
        if let Some(cwd) = &spawn.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &spawn.env {
            cmd.env(k, v);
        }

        debug!(target: "process", command = %command_line, "spawn");
        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn { command: command_line.clone(), source })?;

        let stdout = child.stdout.take().ok_or(ProcessError::NoStdout)?;
        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
        let delimiter = spawn.delimiter.byte();
        let thread_command_line = command_line.clone();
        let reader_thread = std::thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(delimiter, &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        if buf.last() == Some(&delimiter) {
                            buf.pop();
                        }
                        if tx.send(PipeRecord::Line(std::mem::take(&mut buf))).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(target: "process", command = %thread_command_line, error = %e, "pipe read error");
                        break;
                    }
                }
            }
            let _ = tx.send(PipeRecord::Eof);
            trace!(target: "process", command = %thread_command_line, "reader thread exiting");
        });

        Ok(ProcessHandle {
            child,
            receiver: rx,
            reader_thread: Some(reader_thread),
            command_line,
        })
    }

    /// Non-blocking drain: returns every record ready right now, without
    /// waiting. Called once per event-loop iteration per live view.
    pub fn try_recv_all(&self) -> Vec<PipeRecord> {
        let mut out = Vec::new();
        while let Ok(record) = self.receiver.try_recv() {
            out.push(record);
        }
        out
    }

    /// Write to the child's stdin synchronously. Used for hunk-apply and
    /// `update-index` scripts, which are always small and bounded.
    pub fn write_stdin(&mut self, data: &[u8]) -> Result<(), ProcessError> {
        let stdin = self.child.stdin.as_mut().ok_or(ProcessError::NoStdin)?;
        stdin.write_all(data).map_err(ProcessError::StdinWrite)?;
        stdin.flush().map_err(ProcessError::StdinWrite)
    }

    pub fn close_stdin(&mut self) {
        self.child.stdin.take();
    }

    /// Kill the child and its reader thread. Used by `REQ_STOP_LOADING` and
    /// view reload.
    pub fn kill(mut self) {
        debug!(target: "process", command = %self.command_line, "kill");
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }

    /// Non-blocking poll for the child's exit status, `None` while still running.
    pub fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }
}

/// Run a command in the foreground with tty handoff (the external editor,
/// confirmed run-requests, mergetool invocations). The caller must have
/// already torn down the terminal (`core-terminal`'s guard) before calling
/// this, and re-enter raw mode after it returns.
pub fn run_foreground(program: &str, args: &[String], cwd: Option<&PathBuf>) -> Result<ExitStatus, ProcessError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    cmd.status().map_err(ProcessError::Foreground)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_echo_and_drain_lines() {
        let spawn = Spawn::new("printf", vec!["a\\nb\\nc\\n".to_string()]);
        let handle = ProcessHandle::spawn(spawn).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(100));
        let records = handle.try_recv_all();
        let lines: Vec<_> = records
            .iter()
            .filter_map(|r| match r {
                PipeRecord::Line(l) => Some(String::from_utf8_lossy(l).to_string()),
                PipeRecord::Eof => None,
            })
            .collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
        handle.kill();
    }

    #[test]
    fn nul_delimiter_splits_records() {
        let spawn = Spawn::new("printf", vec!["x\\0y\\0".to_string()]).delimiter(Delimiter::Nul);
        let handle = ProcessHandle::spawn(spawn).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(100));
        let records = handle.try_recv_all();
        let lines: Vec<_> = records
            .iter()
            .filter_map(|r| match r {
                PipeRecord::Line(l) => Some(String::from_utf8_lossy(l).to_string()),
                PipeRecord::Eof => None,
            })
            .collect();
        assert_eq!(lines, vec!["x", "y"]);
        handle.kill();
    }

    #[test]
    fn write_stdin_roundtrips_through_cat() {
        let spawn = Spawn::new("cat", vec![]).with_stdin();
        let mut handle = ProcessHandle::spawn(spawn).unwrap();
        handle.write_stdin(b"hello\n").unwrap();
        handle.close_stdin();
        std::thread::sleep(std::time::Duration::from_millis(100));
        let records = handle.try_recv_all();
        assert!(records.iter().any(|r| matches!(r, PipeRecord::Line(l) if l == b"hello")));
        handle.kill();
    }

    #[test]
    fn kill_terminates_reader_thread() {
        let spawn = Spawn::new("sleep", vec!["5".to_string()]);
        let handle = ProcessHandle::spawn(spawn).unwrap();
        handle.kill();
    }
}
