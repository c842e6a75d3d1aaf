use std::sync::Arc;
use std::time::{Duration, Instant};

use russh::ChannelMsg;
use russh::client::{self, Config, Handle, Handler};
use russh::keys::{HashAlg, PublicKey};
use tokio::time::timeout;

use crate::config::{Credentials, LimitsConfig};
use crate::error::{Result, RouterError};

/// Sanitize SSH error messages to prevent credential leakage.
/// Masks authentication method names and truncates overly long
/// messages that might contain data dumps.
fn sanitize_ssh_error(error: &impl std::fmt::Display) -> String {
    let mut msg = error.to_string();
    for method in &["password", "keyboard-interactive", "publickey"] {
        msg = msg.replace(method, "***");
    }
    if msg.len() > 500 {
        let cut = (0..=500).rev().find(|&i| msg.is_char_boundary(i)).unwrap_or(0);
        format!("{}... (truncated)", &msg[..cut])
    } else {
        msg
    }
}

/// Output from a command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: u32,
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Successful output with only standard output text
    #[must_use]
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            duration_ms: 0,
        }
    }

    /// Output carrying error-stream text
    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

/// SSH client handler for russh.
///
/// Host keys are accepted without verification: routers regenerate their
/// keys on firmware resets and carry no `known_hosts` entry, so the
/// session trusts whatever key the router presents.
struct ClientHandler {
    hostname: String,
}

impl Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        tracing::debug!(
            host = %self.hostname,
            fingerprint = %server_public_key.fingerprint(HashAlg::Sha256),
            "Accepting router host key without verification"
        );
        Ok(true)
    }
}

/// SSH session to the router
pub struct SshClient {
    handle: Handle<ClientHandler>,
    host_name: String,
}

impl SshClient {
    /// Connect and authenticate with the router's password
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The SSH connection cannot be established (network error, timeout)
    /// - Authentication fails
    #[must_use = "the SSH client must be used or closed"]
    pub async fn connect(credentials: &Credentials, limits: &LimitsConfig) -> Result<Self> {
        let handle = Self::establish_connection(credentials, limits).await?;
        Self::auth_with_password(handle, credentials).await
    }

    async fn establish_connection(
        credentials: &Credentials,
        limits: &LimitsConfig,
    ) -> Result<Handle<ClientHandler>> {
        let config = Config {
            inactivity_timeout: Some(Duration::from_secs(limits.keepalive_interval_seconds)),
            keepalive_interval: Some(Duration::from_secs(limits.keepalive_interval_seconds)),
            keepalive_max: 3,
            ..Default::default()
        };
        let config = Arc::new(config);
        let handler = ClientHandler {
            hostname: credentials.host.clone(),
        };

        let addr = credentials.address();
        let timeout_secs = limits.connection_timeout_seconds;

        timeout(
            limits.connection_timeout(),
            client::connect(config, (credentials.host.as_str(), credentials.port), handler),
        )
        .await
        .map_err(|_| {
            tracing::error!(addr = %addr, timeout_secs, "SSH connection timeout");
            RouterError::SshConnection {
                host: credentials.host.clone(),
                reason: format!("Connection timeout after {timeout_secs}s"),
            }
        })?
        .map_err(|e| {
            tracing::error!(addr = %addr, error = %sanitize_ssh_error(&e), "SSH connection failed");
            RouterError::SshConnection {
                host: credentials.host.clone(),
                reason: sanitize_ssh_error(&e),
            }
        })
    }

    async fn auth_with_password(
        mut handle: Handle<ClientHandler>,
        credentials: &Credentials,
    ) -> Result<Self> {
        let auth_result = handle
            .authenticate_password(&credentials.user, credentials.password.as_str())
            .await
            .map_err(|e| {
                tracing::error!(host = %credentials.host, user = %credentials.user, error = %sanitize_ssh_error(&e), "SSH password authentication error");
                RouterError::SshConnection {
                    host: credentials.host.clone(),
                    reason: format!("authentication exchange failed: {}", sanitize_ssh_error(&e)),
                }
            })?;

        if !auth_result.success() {
            tracing::error!(host = %credentials.host, user = %credentials.user, "SSH password authentication failed");
            return Err(RouterError::SshAuth {
                user: credentials.user.clone(),
                host: credentials.host.clone(),
            });
        }

        Ok(Self {
            handle,
            host_name: credentials.host.clone(),
        })
    }

    /// Execute a command on the router
    ///
    /// Opens a fresh channel, then waits for it to close, waking every
    /// `channel_poll_interval_ms` to re-check. Both output streams are
    /// returned only after the channel is gone.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The channel cannot be opened within `channel_timeout_seconds`
    /// - The command cannot be started
    /// - The output exceeds the maximum allowed size
    pub async fn exec(&self, command: &str, limits: &LimitsConfig) -> Result<CommandOutput> {
        let start = Instant::now();

        let mut channel = timeout(limits.channel_timeout(), self.handle.channel_open_session())
            .await
            .map_err(|_| RouterError::SshTimeout {
                seconds: limits.channel_timeout_seconds,
            })?
            .map_err(|e| RouterError::SshExec {
                reason: format!("Failed to open channel: {e}"),
            })?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| RouterError::SshExec {
                reason: format!("Failed to execute command: {e}"),
            })?;

        let (stdout, stderr, exit_code) = match Self::read_command_output(&mut channel, limits).await
        {
            Ok(output) => output,
            Err(e) => {
                let _ = channel.close().await;
                return Err(e);
            }
        };

        #[expect(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(host = %self.host_name, exit_code, duration_ms, "Command channel closed");

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_code,
            duration_ms,
        })
    }

    /// Collect channel output until the channel closes
    async fn read_command_output(
        channel: &mut russh::Channel<russh::client::Msg>,
        limits: &LimitsConfig,
    ) -> Result<(Vec<u8>, Vec<u8>, u32)> {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = 0u32;
        let mut total_bytes = 0usize;
        let poll_interval = limits.channel_poll_interval();

        loop {
            let Ok(msg) = timeout(poll_interval, channel.wait()).await else {
                // Still connected; check again on the next tick
                continue;
            };
            match msg {
                Some(ChannelMsg::Data { data }) => {
                    total_bytes += data.len();
                    if total_bytes > limits.max_output_bytes {
                        return Err(RouterError::SshOutputTooLarge {
                            limit_bytes: limits.max_output_bytes,
                        });
                    }
                    stdout.extend_from_slice(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    if ext == 1 {
                        total_bytes += data.len();
                        if total_bytes > limits.max_output_bytes {
                            return Err(RouterError::SshOutputTooLarge {
                                limit_bytes: limits.max_output_bytes,
                            });
                        }
                        stderr.extend_from_slice(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = exit_status;
                }
                None => break,
                // Eof may arrive before ExitStatus; keep draining until close
                Some(_) => {}
            }
        }

        Ok((stdout, stderr, exit_code))
    }

    /// Get the host name
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Close the session (with 5s timeout to avoid blocking)
    ///
    /// # Errors
    ///
    /// Returns an error if the disconnect message cannot be sent.
    pub async fn close(self) -> Result<()> {
        match timeout(
            Duration::from_secs(5),
            self.handle
                .disconnect(russh::Disconnect::ByApplication, "", "en"),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RouterError::SshConnection {
                host: self.host_name,
                reason: e.to_string(),
            }),
            Err(_) => {
                tracing::warn!(host = %self.host_name, "Timeout closing SSH connection, forcing drop");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_output_stdout_constructor() {
        let output = CommandOutput::stdout("hello");
        assert_eq!(output.stdout, "hello");
        assert!(output.stderr.is_empty());
        assert_eq!(output.exit_code, 0);
    }

    #[test]
    fn test_command_output_with_stderr() {
        let output = CommandOutput::stdout("out").with_stderr("err");
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
    }

    #[test]
    fn test_command_output_unicode() {
        let output = CommandOutput::stdout("xkeen запущен");
        assert!(output.stdout.contains("запущен"));
    }

    #[test]
    fn test_sanitize_ssh_error_masks_auth_methods() {
        let msg = sanitize_ssh_error(&"No more methods: password, publickey");
        assert!(!msg.contains("password"));
        assert!(!msg.contains("publickey"));
        assert!(msg.contains("***"));
    }

    #[test]
    fn test_sanitize_ssh_error_truncates_long_messages() {
        let long = "x".repeat(1000);
        let msg = sanitize_ssh_error(&long);
        assert!(msg.ends_with("... (truncated)"));
        assert!(msg.len() < 600);
    }

    #[test]
    fn test_sanitize_ssh_error_truncates_on_char_boundary() {
        let long = "я".repeat(400);
        let msg = sanitize_ssh_error(&long);
        assert!(msg.ends_with("... (truncated)"));
    }

    #[test]
    fn test_sanitize_ssh_error_short_message_unchanged() {
        assert_eq!(sanitize_ssh_error(&"Connection reset"), "Connection reset");
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let credentials = Credentials {
            host: "127.0.0.1".to_string(),
            port,
            ..Default::default()
        };
        let limits = LimitsConfig {
            connection_timeout_seconds: 2,
            ..Default::default()
        };
        let result = SshClient::connect(&credentials, &limits).await;
        assert!(matches!(result, Err(RouterError::SshConnection { .. })));
    }
}
