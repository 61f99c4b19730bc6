use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Guard that kills the driver server (and its entire process group) on drop.
pub struct DriverProcess {
    child: Option<tokio::process::Child>,
    /// Process group ID saved at spawn time so we can kill the whole group.
    #[cfg(unix)]
    pgid: Option<u32>,
}

impl DriverProcess {
    /// Start the WebDriver server described by a shell-style command line.
    pub fn spawn(command_line: &str) -> Result<Self> {
        let words = shell_words::split(command_line)
            .with_context(|| format!("invalid driver command `{command_line}`"))?;
        let (program, args) = words.split_first().context("driver command is empty")?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Own process group, so browsers the server launches die with it.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.as_std_mut().process_group(0);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn driver `{program}`"))?;
        tracing::info!(program = %program, pid = ?child.id(), "started driver server");

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        Ok(Self {
            #[cfg(unix)]
            pgid: child.id(),
            child: Some(child),
        })
    }
}

impl Drop for DriverProcess {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) };
        }
        // Fallback / non-Unix: kill just the direct child.
        if let Some(ref mut child) = self.child {
            let _ = child.start_kill();
        }
    }
}

/// Log every line the driver server writes until the pipe closes. Lines that
/// are not valid UTF-8 are logged lossily so the pipe keeps draining.
async fn forward_stderr<R: AsyncRead + Unpin>(stderr: R) -> usize {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                tracing::debug!(target: "pagespec::driver", "{}", line.trim_end());
                lines += 1;
            }
            Err(e) => {
                tracing::debug!(target: "pagespec::driver", error = %e, "stopped reading driver stderr");
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let err = DriverProcess::spawn("   ").err().unwrap();
        assert_eq!(err.to_string(), "driver command is empty");
    }

    #[tokio::test]
    async fn unbalanced_quotes_are_rejected() {
        let err = DriverProcess::spawn("chromedriver '--port=9515").err().unwrap();
        assert!(err.to_string().starts_with("invalid driver command"), "{err}");
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let err = DriverProcess::spawn("definitely-not-a-webdriver-binary --port=1")
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "failed to spawn driver `definitely-not-a-webdriver-binary`"
        );
    }

    #[tokio::test]
    async fn stderr_keeps_draining_past_invalid_utf8() {
        let stderr: &[u8] = b"Starting ChromeDriver\n\xff\xfe garbled\nlistening on 9515";
        assert_eq!(forward_stderr(stderr).await, 3);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawns_and_kills_on_drop() {
        let process = DriverProcess::spawn("sleep 30").unwrap();
        assert!(process.pgid.is_some());
        drop(process);
    }
}
