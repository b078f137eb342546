use std::path::PathBuf;

use crate::error::{TriageError, TriageResult};
use crate::kernel::incident::RuleSet;
use crate::kernel::time::TICK_MS;

/// Pause between chunks of the scripted demo call.
pub const DEFAULT_FEED_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// Driver cadence. The kernel itself never looks at wall time.
    pub tick_ms: u64,
    pub telemetry_enabled: bool,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            telemetry_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub reactor: ReactorConfig,
    /// Alternate rule set (JSON). Built-in tables when absent.
    pub rules_path: Option<PathBuf>,
    pub feed_interval_ms: u64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            reactor: ReactorConfig::default(),
            rules_path: None,
            feed_interval_ms: DEFAULT_FEED_INTERVAL_MS,
        }
    }
}

impl TriageConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> TriageResult<Self> {
        let tick_ms = std::env::var("TRIAGE_TICK_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(TICK_MS);

        let telemetry_enabled = std::env::var("TRIAGE_TELEMETRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true);

        let feed_interval_ms = std::env::var("TRIAGE_FEED_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_FEED_INTERVAL_MS);

        let rules_path = std::env::var("TRIAGE_RULES_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let config = Self {
            reactor: ReactorConfig {
                tick_ms,
                telemetry_enabled,
            },
            rules_path,
            feed_interval_ms,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TriageResult<()> {
        if self.reactor.tick_ms == 0 {
            return Err(TriageError::Config("TRIAGE_TICK_MS must be greater than zero".to_string()));
        }
        if self.feed_interval_ms == 0 {
            return Err(TriageError::Config(
                "TRIAGE_FEED_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load_rules(&self) -> TriageResult<RuleSet> {
        match &self.rules_path {
            Some(path) => RuleSet::from_json_file(path),
            None => Ok(RuleSet::default()),
        }
    }
}
