//! Deadline-bounded command execution
//!
//! The child is spawned in its own process group and raced against a timer.
//! On timeout the whole group is killed and the child reaped before
//! `execute` returns.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::result::{ProcessResult, SENTINEL_EXIT_CODE};

/// Longest wait for stdout/stderr to close after the child exits
const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Wait for a pipe to reach EOF once its process group has been killed
const PIPE_KILL_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK_BYTES: usize = 8192;

/// Exit codes for signal-terminated children start here, as in shells
const SIGNAL_EXIT_BASE: i32 = 128;

/// Executes external commands with a deadline
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` (program followed by arguments) in `working_dir`.
    ///
    /// Never fails: launch failures and timeouts are reported in the result.
    async fn execute(&self, command: &[String], working_dir: &Path, timeout: Duration) -> ProcessResult;
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn build_command(program: &str, args: &[String], working_dir: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so descendants can be killed together
        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn execute(&self, command: &[String], working_dir: &Path, timeout: Duration) -> ProcessResult {
        let Some((program, args)) = command.split_first() else {
            return ProcessResult::launch_failure("Failed to launch: empty command");
        };

        debug!(
            "execute: {} (cwd={}, timeout={}ms)",
            command.join(" "),
            working_dir.display(),
            timeout.as_millis()
        );

        let mut child = match Self::build_command(program, args, working_dir).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to launch '{}': {}", program, e);
                return ProcessResult::launch_failure(format!("Failed to launch '{}': {}", program, e));
            }
        };

        let deadline = Instant::now() + timeout;
        // Cleared by tokio once the child is reaped, so capture it up front
        let pid = child.id();
        let stdout_reader = PipeReader::spawn(child.stdout.take());
        let stderr_reader = PipeReader::spawn(child.stderr.take());

        tokio::select! {
            status = child.wait() => {
                let status = match status {
                    Ok(status) => status,
                    Err(e) => {
                        warn!("Failed waiting on '{}': {}", program, e);
                        terminate(&mut child).await;
                        stdout_reader.abort();
                        stderr_reader.abort();
                        return ProcessResult::launch_failure(format!("Failed waiting on '{}': {}", program, e));
                    }
                };

                // Descendants may still hold the pipes; they get whatever is
                // left of the deadline, capped at PIPE_DRAIN_TIMEOUT
                let window = deadline.saturating_duration_since(Instant::now()).min(PIPE_DRAIN_TIMEOUT);
                let (stdout, stderr) = tokio::join!(
                    stdout_reader.drain(pid, window),
                    stderr_reader.drain(pid, window)
                );
                let exit_code = exit_code(status);
                debug!("execute: {} exited with {}", program, exit_code);
                ProcessResult::completed(exit_code, stdout, stderr)
            }
            _ = tokio::time::sleep_until(deadline) => {
                warn!("Command '{}' timed out after {}ms, killing", program, timeout.as_millis());
                terminate(&mut child).await;
                stdout_reader.abort();
                stderr_reader.abort();
                ProcessResult::timed_out()
            }
        }
    }
}

/// Reads one pipe to EOF in the background. Bytes land in a shared buffer
/// as they arrive, so stopping the reader early keeps what was read.
struct PipeReader {
    task: JoinHandle<()>,
    buf: Arc<Mutex<Vec<u8>>>,
}

impl PipeReader {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = buf.clone();
        let task = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = vec![0u8; READ_CHUNK_BYTES];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => sink.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(&chunk[..n]),
                    Err(e) => {
                        debug!("pipe read ended early: {}", e);
                        break;
                    }
                }
            }
        });
        Self { task, buf }
    }

    fn abort(&self) {
        self.task.abort();
    }

    /// Wait up to `window` for EOF. Past that the child's process group is
    /// killed so descendants release the pipe, then the reader gets a short
    /// grace period before it is stopped. Output read so far is always kept.
    async fn drain(mut self, pid: Option<u32>, window: Duration) -> String {
        if tokio::time::timeout(window, &mut self.task).await.is_err() {
            warn!("output pipe still open after exit, killing process group");
            #[cfg(unix)]
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            #[cfg(not(unix))]
            let _ = pid;

            if tokio::time::timeout(PIPE_KILL_GRACE, &mut self.task).await.is_err() {
                warn!("output pipe held open outside the process group, giving up on it");
                self.task.abort();
            }
        }

        let bytes = self.buf.lock().unwrap_or_else(|e| e.into_inner());
        decode(&bytes)
    }
}

/// Lossy UTF-8 decode; never fails
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }

    SENTINEL_EXIT_CODE
}

/// Kill the child's process group and reap the child
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        kill_process_group(pid);
    }

    if let Err(e) = child.start_kill() {
        debug!("start_kill: {}", e);
    }
    if let Err(e) = child.wait().await {
        warn!("Failed to reap killed child: {}", e);
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => debug!("kill_process_group: sent SIGKILL to group {}", pid),
        Err(Errno::ESRCH) => debug!("kill_process_group: group {} already gone", pid),
        Err(e) => warn!("kill_process_group: group {}: {}", pid, e),
    }
}
