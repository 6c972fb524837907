//! [`VideoBackend`] running an external full-screen player
//!
//! The player is mpv by default. It is started with a JSON IPC socket so
//! transport commands can reach the running session.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use magicbox_core::{BackendResult, TransportCommand, VideoBackend};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::error::MediaError;
use crate::process;

/// How the player is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerConfig {
    pub program: String,
    pub args: Vec<String>,
    /// mpv `--input-ipc-server` path; `None` disables transport control
    pub ipc_socket: Option<PathBuf>,
    /// A player exiting within this window failed to open the media
    pub startup_grace: Duration,
    pub ipc_timeout: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "mpv".to_string(),
            args: vec!["--fs".to_string(), "--really-quiet".to_string()],
            ipc_socket: Some(std::env::temp_dir().join("magicbox-mpv.sock")),
            startup_grace: Duration::from_millis(300),
            ipc_timeout: Duration::from_secs(1),
        }
    }
}

/// One player session at a time
#[derive(Debug, Default)]
pub struct PlayerVideo {
    config: PlayerConfig,
    child: Option<Child>,
}

impl PlayerVideo {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    /// Whether a session is running right now
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                debug!(%status, "player has exited");
                self.child = None;
                false
            }
            Some(Err(error)) => {
                warn!(%error, "cannot check player process");
                false
            }
            None => false,
        }
    }

    fn launch(&mut self, uri: &str) -> Result<(), MediaError> {
        self.end_session();

        let mut command = Command::new(&self.config.program);
        command.args(&self.config.args);
        if let Some(socket) = &self.config.ipc_socket {
            remove_socket(socket);
            command.arg(format!("--input-ipc-server={}", socket.display()));
        }
        command
            .arg(uri)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = process::spawn(&mut command)?;
        let grace_end = Instant::now() + self.config.startup_grace;
        if let Some(status) = process::wait_until(&mut child, grace_end)? {
            return Err(MediaError::EarlyExit {
                program: self.config.program.clone(),
                status: status.to_string(),
            });
        }

        info!(uri, pid = child.id(), "video started");
        self.child = Some(child);
        Ok(())
    }

    fn end_session(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = child.id(), "stopping player");
            process::kill(&mut child, &self.config.program);
        }
        if let Some(socket) = &self.config.ipc_socket {
            remove_socket(socket);
        }
    }

    fn send_ipc(&mut self, command: &Value) -> Result<(), MediaError> {
        if !self.is_running() {
            return Err(MediaError::NoSession);
        }
        let Some(socket) = &self.config.ipc_socket else {
            return Err(MediaError::Ipc("player has no IPC socket".to_string()));
        };
        ipc::send(socket, command, self.config.ipc_timeout)
    }
}

/// mpv command for a transport control
pub fn transport_command(command: TransportCommand) -> Value {
    match command {
        TransportCommand::Play => json!({ "command": ["set_property", "pause", false] }),
        TransportCommand::Next => json!({ "command": ["playlist-next"] }),
        TransportCommand::Prev => json!({ "command": ["playlist-prev"] }),
    }
}

fn remove_socket(path: &std::path::Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale IPC socket"),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), %error, "cannot remove IPC socket"),
    }
}

#[cfg(unix)]
mod ipc {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;
    use std::path::Path;
    use std::time::Duration;

    use serde_json::Value;

    use crate::error::MediaError;

    /// Write one command line and wait for mpv's reply
    pub fn send(socket: &Path, command: &Value, timeout: Duration) -> Result<(), MediaError> {
        let ipc_error = |error: std::io::Error| MediaError::Ipc(error.to_string());

        let mut stream = UnixStream::connect(socket).map_err(ipc_error)?;
        stream.set_read_timeout(Some(timeout)).map_err(ipc_error)?;
        stream.set_write_timeout(Some(timeout)).map_err(ipc_error)?;

        let mut line = command.to_string();
        line.push('\n');
        stream.write_all(line.as_bytes()).map_err(ipc_error)?;

        // mpv interleaves event lines with replies
        let mut reader = BufReader::new(stream);
        loop {
            let mut reply = String::new();
            if reader.read_line(&mut reply).map_err(ipc_error)? == 0 {
                return Err(MediaError::Ipc("player closed the IPC socket".to_string()));
            }
            let Ok(reply) = serde_json::from_str::<Value>(&reply) else {
                continue;
            };
            if reply.get("event").is_some() {
                continue;
            }
            return match reply.get("error").and_then(Value::as_str) {
                Some("success") => Ok(()),
                Some(error) => Err(MediaError::Ipc(error.to_string())),
                None => Err(MediaError::Ipc(format!("unexpected reply {reply}"))),
            };
        }
    }
}

#[cfg(not(unix))]
mod ipc {
    use std::path::Path;
    use std::time::Duration;

    use serde_json::Value;

    use crate::error::MediaError;

    pub fn send(_socket: &Path, _command: &Value, _timeout: Duration) -> Result<(), MediaError> {
        Err(MediaError::Ipc("IPC sockets need a Unix host".to_string()))
    }
}

impl VideoBackend for PlayerVideo {
    fn start(&mut self, uri: &str) -> BackendResult<()> {
        self.launch(uri)?;
        Ok(())
    }

    fn stop(&mut self) -> BackendResult<()> {
        self.end_session();
        Ok(())
    }

    fn transport(&mut self, command: TransportCommand) -> BackendResult<()> {
        debug!(%command, "video transport");
        self.send_ipc(&transport_command(command))?;
        Ok(())
    }
}

impl Drop for PlayerVideo {
    fn drop(&mut self) {
        self.end_session();
    }
}
