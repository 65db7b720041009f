use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::SchedulerConfig;
use warband_domain::escalation::DEFAULT_SAFETY_MARGIN;
use warband_domain::task::{JitterRange, TaskKind};
use warband_domain::DomainError;
use warband_infrastructure::config::SettingsFile;

/// Runtime settings for the scheduler and the foreground loop
#[derive(Debug, Clone)]
pub struct Settings {
    /// Lead time before an incoming attack lands at which mitigation fires (default: 120 seconds)
    pub mitigation_margin: Duration,

    /// Watchdog for a single attempt of a firing (default: 180 seconds)
    pub firing_timeout: Duration,

    /// How long shutdown waits for firings in progress (default: 30 seconds)
    pub shutdown_grace: Duration,

    /// Status table refresh period (default: 1 second)
    pub render_interval: Duration,

    /// Scheduler health check period (default: 5 minutes)
    pub health_check_interval: Duration,

    /// Opening one account's session (default: 60 seconds)
    pub session_open_timeout: Duration,

    pub log_dir: Option<PathBuf>,
    pub log_filter: Option<String>,

    jitter_overrides: HashMap<TaskKind, JitterRange>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mitigation_margin: DEFAULT_SAFETY_MARGIN,
            firing_timeout: Duration::from_secs(180),
            shutdown_grace: Duration::from_secs(30),
            render_interval: Duration::from_secs(1),
            health_check_interval: Duration::from_secs(300),
            session_open_timeout: Duration::from_secs(60),
            log_dir: None,
            log_filter: None,
            jitter_overrides: HashMap::new(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with whatever the file sets.
    pub fn from_file(file: SettingsFile) -> Result<Self, DomainError> {
        let mut settings = Self::default();

        if let Some(secs) = file.mitigation_margin_secs {
            settings.mitigation_margin = Duration::from_secs(secs);
        }
        if let Some(secs) = file.firing_timeout_secs {
            if secs == 0 {
                return Err(DomainError::InvalidConfig(
                    "firing_timeout_secs must be positive".to_string(),
                ));
            }
            settings.firing_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.shutdown_grace_secs {
            settings.shutdown_grace = Duration::from_secs(secs);
        }
        if let Some(ms) = file.render_interval_ms {
            settings.render_interval = Duration::from_millis(ms.max(100));
        }
        if let Some(secs) = file.health_check_interval_secs {
            settings.health_check_interval = Duration::from_secs(secs.max(1));
        }
        settings.log_dir = file.log_dir;
        settings.log_filter = file.log_filter;

        for (kind, [min, max]) in file.jitter {
            if kind.jitter_range().is_none() {
                return Err(DomainError::InvalidConfig(format!(
                    "{kind} fires once and has no jitter window"
                )));
            }
            let range = JitterRange::new(min, max).map_err(|e| {
                DomainError::InvalidConfig(format!("jitter for {kind}: {}", e.message()))
            })?;
            settings.jitter_overrides.insert(kind, range);
        }

        Ok(settings)
    }

    /// Builder pattern: set mitigation margin
    pub fn with_mitigation_margin(mut self, margin: Duration) -> Self {
        self.mitigation_margin = margin;
        self
    }

    /// Builder pattern: set firing watchdog
    pub fn with_firing_timeout(mut self, timeout: Duration) -> Self {
        self.firing_timeout = timeout;
        self
    }

    /// Builder pattern: set shutdown grace period
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Builder pattern: set render interval
    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Builder pattern: replace one kind's reschedule window
    pub fn with_jitter(mut self, kind: TaskKind, range: JitterRange) -> Self {
        self.jitter_overrides.insert(kind, range);
        self
    }

    /// Reschedule window for `kind`; `None` for one-shot kinds.
    pub fn jitter_for(&self, kind: TaskKind) -> Option<JitterRange> {
        self.jitter_overrides
            .get(&kind)
            .copied()
            .or_else(|| kind.jitter_range())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            firing_timeout: self.firing_timeout,
            shutdown_grace: self.shutdown_grace,
            health_check_interval: self.health_check_interval,
        }
    }
}
