//! Bounded runs of helper programs

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::MediaError;

const WAIT_STEP: Duration = Duration::from_millis(10);

/// What a finished program left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub status: ExitStatus,
    pub stdout: String,
}

/// Spawn `command`, mapping a missing binary to [`MediaError::NotInstalled`]
pub fn spawn(command: &mut Command) -> Result<Child, MediaError> {
    let program = program_name(command);
    command.spawn().map_err(|error| match error.kind() {
        io::ErrorKind::NotFound => MediaError::NotInstalled(program),
        _ => MediaError::Spawn {
            program,
            reason: error.to_string(),
        },
    })
}

/// Run `command` to completion, feeding it `input` on stdin.
///
/// The child is killed once `timeout` has passed.
pub fn run(command: &mut Command, input: &str, timeout: Duration) -> Result<Finished, MediaError> {
    let program = program_name(command);
    let mut child = spawn(
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null()),
    )?;

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(error) = stdin.write_all(input.as_bytes()) {
            debug!(program, %error, "child closed stdin early");
        }
    }

    let stdout = child.stdout.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut output = String::new();
            let _ = pipe.read_to_string(&mut output);
            output
        })
    });

    let status = match wait_until(&mut child, Instant::now() + timeout)? {
        Some(status) => status,
        None => {
            kill(&mut child, &program);
            return Err(MediaError::Timeout {
                program,
                after: timeout,
            });
        }
    };

    let stdout = stdout
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default();
    Ok(Finished { status, stdout })
}

/// Wait for `child` to exit, giving up at `deadline`
pub fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>, MediaError> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(WAIT_STEP.min(deadline - now));
    }
}

/// Kill and reap `child`; an already exited child is only reaped
pub fn kill(child: &mut Child, program: &str) {
    if let Err(error) = child.kill() {
        if error.kind() != io::ErrorKind::InvalidInput {
            warn!(program, %error, "failed to kill child process");
        }
    }
    if let Err(error) = child.wait() {
        warn!(program, %error, "failed to reap child process");
    }
}

fn program_name(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}
