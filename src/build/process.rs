use super::cancel::CancelToken;
use crate::error::{BuildError, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What a finished tool left behind.
#[derive(Debug)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stderr: String,
}

/// Renders a tool invocation the way a shell user would type it.
pub fn command_line(program: &str, args: &[String]) -> String {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push(program.to_string());
    words.extend(args.iter().cloned());
    shell_words::join(words)
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Runs `program args...` to completion, killing it if `cancel` fires.
///
/// stdout is discarded; stderr is drained on a helper thread so a chatty tool
/// cannot block on a full pipe while we poll for its exit.
///
/// Cancellation kills only the direct child; a compiler driver's own children
/// (`cc1`, `as`) are left to the terminal's process-group signal.
pub fn run_tool(program: &str, args: &[String], cancel: &CancelToken) -> Result<ToolOutput> {
    if cancel.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| BuildError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let status = loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            // Grandchildren may still hold the pipe; leave the reader detached.
            drop(stderr_reader);
            return Err(BuildError::Cancelled);
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BuildError::io(format!("failed to wait for `{}`", program), e));
            }
        }
    };

    let stderr = stderr_reader
        .and_then(|reader| reader.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).to_string())
        .unwrap_or_default();

    Ok(ToolOutput {
        success: status.success(),
        code: status.code(),
        stderr,
    })
}
