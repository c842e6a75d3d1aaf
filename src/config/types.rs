use serde::{Deserialize, Serialize};
use std::time::Duration;
use zeroize::Zeroizing;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub router: Credentials,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub restart: RestartConfig,

    #[serde(default)]
    pub routing: RoutingSettings,
}

/// Connection details for the router.
///
/// Handed to every operation as an immutable value; the core never
/// mutates or persists it. The password is wrapped in [`Zeroizing`] so it
/// is erased from memory when the value is dropped.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: Zeroizing<String>,

    /// Absolute path of the Xray routing file on the router
    #[serde(default = "default_config_path")]
    pub config_path: String,
}

impl Credentials {
    /// `host:port` as used for the TCP probe and the SSH connection
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: default_user(),
            password: Zeroizing::new(String::new()),
            config_path: default_config_path(),
        }
    }
}

// Manual impl keeps the password out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("config_path", &self.config_path)
            .finish()
    }
}

fn default_host() -> String {
    "192.168.1.1".to_string()
}

const fn default_port() -> u16 {
    222
}

fn default_user() -> String {
    "root".to_string()
}

fn default_config_path() -> String {
    "/opt/etc/xray/configs/05_routing.json".to_string()
}

/// Timeouts and transport limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// TCP reachability probe timeout in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// SSH session connect timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,

    /// Timeout for opening a single command channel, in seconds
    #[serde(default = "default_channel_timeout")]
    pub channel_timeout_seconds: u64,

    /// How often a running command channel is re-checked, in milliseconds
    #[serde(default = "default_channel_poll_interval")]
    pub channel_poll_interval_ms: u64,

    #[serde(default = "default_keepalive")]
    pub keepalive_interval_seconds: u64,

    /// Maximum combined stdout+stderr size of one command
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout(),
            connection_timeout_seconds: default_connection_timeout(),
            channel_timeout_seconds: default_channel_timeout(),
            channel_poll_interval_ms: default_channel_poll_interval(),
            keepalive_interval_seconds: default_keepalive(),
            max_output_bytes: default_max_output_bytes(),
        }
    }
}

impl LimitsConfig {
    #[must_use]
    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    #[must_use]
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    #[must_use]
    pub const fn channel_timeout(&self) -> Duration {
        Duration::from_secs(self.channel_timeout_seconds)
    }

    #[must_use]
    pub const fn channel_poll_interval(&self) -> Duration {
        Duration::from_millis(self.channel_poll_interval_ms)
    }
}

const fn default_probe_timeout() -> u64 {
    2000
}

const fn default_connection_timeout() -> u64 {
    30
}

const fn default_channel_timeout() -> u64 {
    15
}

const fn default_channel_poll_interval() -> u64 {
    100
}

const fn default_keepalive() -> u64 {
    30
}

const fn default_max_output_bytes() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

/// Restart polling behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RestartConfig {
    /// Polling ceiling: number of process-table checks before giving up
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Substring of `xkeen -status` output that means the service runs
    #[serde(default = "default_running_marker")]
    pub running_marker: String,

    /// Substring of `xkeen -status` output that means the service is down.
    /// Takes precedence over `running_marker`, which it usually contains.
    #[serde(default = "default_stopped_marker")]
    pub stopped_marker: String,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            max_polls: default_max_polls(),
            poll_interval_ms: default_poll_interval(),
            running_marker: default_running_marker(),
            stopped_marker: default_stopped_marker(),
        }
    }
}

impl RestartConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

const fn default_max_polls() -> u32 {
    15
}

const fn default_poll_interval() -> u64 {
    1000
}

fn default_running_marker() -> String {
    "запущен".to_string()
}

fn default_stopped_marker() -> String {
    "не запущен".to_string()
}

/// Which routing rule is managed
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingSettings {
    #[serde(default = "default_managed_outbound_tag")]
    pub managed_outbound_tag: String,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            managed_outbound_tag: default_managed_outbound_tag(),
        }
    }
}

fn default_managed_outbound_tag() -> String {
    "vless-reality".to_string()
}
