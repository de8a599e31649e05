//! Process-backed command runner

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use super::{CommandOutput, CommandRunner, Invocation};

/// Runs invocations as child processes, streaming their output to the log
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let command_line = invocation.command_line();
        tracing::debug!(
            "Executing `{}` in {:?}",
            command_line,
            invocation.working_dir
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = cmd.spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (stdout, stderr) = tokio::join!(
            collect_lines(stdout, &invocation.program, false),
            collect_lines(stderr, &invocation.program, true)
        );

        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(-1);
        let duration = start.elapsed();

        if status.success() {
            tracing::debug!("`{}` finished in {:?}", command_line, duration);
        } else {
            tracing::warn!(
                "`{}` exited with code {} after {:?}",
                command_line,
                exit_code,
                duration
            );
        }

        Ok(CommandOutput {
            exit_code,
            stdout: stdout?,
            stderr: stderr?,
            duration,
        })
    }
}

/// Read a child stream line by line, logging each line as it arrives
async fn collect_lines<R>(stream: Option<R>, program: &str, is_stderr: bool) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(stream).lines();
    let mut collected = String::new();
    while let Some(line) = reader.next_line().await? {
        if is_stderr {
            tracing::info!(program, "stderr: {}", line);
        } else {
            tracing::trace!(program, "{}", line);
        }
        collected.push_str(&line);
        collected.push('\n');
    }
    Ok(collected)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let output = ProcessRunner::new()
            .run(&Invocation::new("echo").arg("Hello"))
            .await
            .unwrap();
        assert!(output.is_success());
        assert_eq!(output.stdout, "Hello\n");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_reported_not_raised() {
        let output = ProcessRunner::new()
            .run(&Invocation::new("sh").args(["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_runs_in_working_dir_with_env() {
        let dir = tempfile::tempdir().unwrap();
        let output = ProcessRunner::new()
            .run(
                &Invocation::new("sh")
                    .args(["-c", "pwd; printf '%s\\n' \"$KF_TEST_VALUE\""])
                    .current_dir(dir.path())
                    .env("KF_TEST_VALUE", "scoped"),
            )
            .await
            .unwrap();

        let lines: Vec<_> = output.stdout.lines().collect();
        let expected = dir.path().canonicalize().unwrap();
        assert_eq!(
            std::path::Path::new(lines[0]).canonicalize().unwrap(),
            expected
        );
        assert_eq!(lines[1], "scoped");
        assert!(std::env::var("KF_TEST_VALUE").is_err());
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let result = ProcessRunner::new()
            .run(&Invocation::new("kf-definitely-not-installed"))
            .await;
        assert!(result.is_err());
    }
}
