//! Configuration types deserialized from `hoist.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use crate::duration::WaitDuration;

/// The top-level installer configuration parsed from `hoist.toml`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HoistConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
    /// Bootstrap wait settings.
    #[serde(default)]
    pub wait: WaitConfig,
    /// External infrastructure commands.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default log filter, in `tracing-subscriber` `EnvFilter` syntax.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings for waiting on the bootstrap control plane.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitConfig {
    /// Budget for the API server to become reachable.
    pub api_timeout: WaitDuration,
    /// Budget for the completion event, counted from API reachability.
    pub event_timeout: WaitDuration,
    /// Interval between reachability checks.
    pub poll_interval: WaitDuration,
    /// Delay before reopening a watch that failed to open.
    pub retry_delay: WaitDuration,
    /// Identical transport errors between two log lines.
    pub log_downsample: u32,
    /// Namespace the completion event is posted in.
    pub namespace: String,
    /// Exact name of the completion event.
    pub completion_event: String,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            api_timeout: WaitDuration::from_mins(30),
            event_timeout: WaitDuration::from_mins(30),
            poll_interval: WaitDuration::from_secs(2),
            retry_delay: WaitDuration::from_secs(2),
            log_downsample: 15,
            namespace: "kube-system".to_string(),
            completion_event: "bootstrap-complete".to_string(),
        }
    }
}

impl WaitConfig {
    /// Converts into settings for [`hoist_sync::wait_for_bootstrap`].
    pub fn to_bootstrap_wait(&self) -> hoist_sync::BootstrapWait {
        hoist_sync::BootstrapWait {
            api: hoist_sync::WaitSettings {
                timeout: self.api_timeout.into(),
                interval: self.poll_interval.into(),
                log_downsample: self.log_downsample,
            },
            events: hoist_sync::WaitSettings {
                timeout: self.event_timeout.into(),
                interval: self.retry_delay.into(),
                log_downsample: self.log_downsample,
            },
            namespace: self.namespace.clone(),
            completion_event: self.completion_event.clone(),
        }
    }
}

/// Commands that create and tear down cloud infrastructure.
///
/// Each command is an argument vector run in the install directory. An empty
/// command means the step is skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InfrastructureConfig {
    /// Creates the cluster infrastructure, including the bootstrap machine.
    #[serde(default, deserialize_with = "command")]
    pub apply: Vec<String>,
    /// Removes the bootstrap machine once the control plane is up.
    #[serde(default, deserialize_with = "command")]
    pub destroy_bootstrap: Vec<String>,
}

/// Deserializes a command written either as one string, split on whitespace,
/// or as an argument list.
fn command<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct CommandVisitor;

    impl<'de> Visitor<'de> for CommandVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a command string or a list of arguments")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut args = Vec::new();
            while let Some(arg) = seq.next_element::<String>()? {
                args.push(arg);
            }
            Ok(args)
        }
    }

    deserializer.deserialize_any(CommandVisitor)
}
