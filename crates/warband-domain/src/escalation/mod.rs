//! Incoming-attack assessment.
//!
//! The attack-check action reports the troop-movement panel as a
//! [`ThreatScan`]. The first hostile arrival in page order decides the
//! mitigation deadline; later waves are picked up by the next check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default lead time between spending resources and the attack landing.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(120);

/// One row of the incoming-movements section, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMovement {
    pub hostile: bool,
    /// Countdown text as shown on the page, `H:MM:SS`.
    pub timer: String,
}

impl IncomingMovement {
    pub fn attack(timer: &str) -> Self {
        Self {
            hostile: true,
            timer: timer.to_string(),
        }
    }

    pub fn reinforcement(timer: &str) -> Self {
        Self {
            hostile: false,
            timer: timer.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatScan {
    /// Whether the troop-movement panel was rendered at all.
    pub panel_present: bool,
    /// Whether the panel had an "incoming" section.
    pub incoming_section: bool,
    pub incoming: Vec<IncomingMovement>,
}

impl ThreatScan {
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn with_incoming(incoming: Vec<IncomingMovement>) -> Self {
        Self {
            panel_present: true,
            incoming_section: true,
            incoming,
        }
    }
}

/// What one attack check concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    NoMovements,
    NoIncoming,
    Clear,
    Incoming { time_to_impact: Duration },
}

impl Assessment {
    pub fn describe(&self) -> &'static str {
        match self {
            Assessment::NoMovements => "No troop movements found.",
            Assessment::NoIncoming => "No incoming troops found.",
            Assessment::Clear => "No incoming attacks!",
            Assessment::Incoming { .. } => {
                "Incoming attack found! Setting job to spend all resources before attack lands."
            }
        }
    }
}

pub fn assess(scan: &ThreatScan) -> Assessment {
    if !scan.panel_present {
        return Assessment::NoMovements;
    }
    if !scan.incoming_section {
        return Assessment::NoIncoming;
    }

    scan.incoming
        .iter()
        .filter(|movement| movement.hostile)
        .find_map(|movement| parse_timer(&movement.timer))
        .map(|time_to_impact| Assessment::Incoming { time_to_impact })
        .unwrap_or(Assessment::Clear)
}

/// Parses a page countdown such as `0:04:30` or `27:00:05`.
pub fn parse_timer(text: &str) -> Option<Duration> {
    let mut parts = text.trim().split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let seconds: u64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || minutes > 59 || seconds > 59 {
        return None;
    }
    let total = hours
        .checked_mul(3600)?
        .checked_add(minutes * 60)?
        .checked_add(seconds)?;
    Some(Duration::from_secs(total))
}

/// `now + time_to_impact - margin`, never earlier than `now`.
pub fn mitigation_deadline(
    now: DateTime<Utc>,
    time_to_impact: Duration,
    margin: Duration,
) -> DateTime<Utc> {
    let lead = time_to_impact.saturating_sub(margin);
    chrono::Duration::from_std(lead)
        .ok()
        .and_then(|lead| now.checked_add_signed(lead))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timer() {
        assert_eq!(parse_timer("0:04:30"), Some(Duration::from_secs(270)));
        assert_eq!(parse_timer("27:00:05"), Some(Duration::from_secs(97_205)));
        assert_eq!(parse_timer(" 1:00:00 "), Some(Duration::from_secs(3600)));
        assert_eq!(parse_timer("4:30"), None);
        assert_eq!(parse_timer("0:61:00"), None);
        assert_eq!(parse_timer("soon"), None);
        assert_eq!(parse_timer("18446744073709551615:00:00"), None);
        assert_eq!(parse_timer("99999999999999999999:00:00"), None);
    }

    #[test]
    fn test_missing_panel_and_section() {
        assert_eq!(assess(&ThreatScan::quiet()), Assessment::NoMovements);

        let scan = ThreatScan {
            panel_present: true,
            incoming_section: false,
            incoming: vec![],
        };
        assert_eq!(assess(&scan), Assessment::NoIncoming);
    }

    #[test]
    fn test_reinforcements_are_not_threats() {
        let scan = ThreatScan::with_incoming(vec![IncomingMovement::reinforcement("0:10:00")]);
        assert_eq!(assess(&scan), Assessment::Clear);
    }

    #[test]
    fn test_first_wave_in_page_order_wins() {
        let scan = ThreatScan::with_incoming(vec![
            IncomingMovement::reinforcement("0:01:00"),
            IncomingMovement::attack("0:20:00"),
            IncomingMovement::attack("0:05:00"),
        ]);
        assert_eq!(
            assess(&scan),
            Assessment::Incoming {
                time_to_impact: Duration::from_secs(1200)
            }
        );
    }

    #[test]
    fn test_unreadable_timer_is_skipped() {
        let scan = ThreatScan::with_incoming(vec![
            IncomingMovement::attack("??"),
            IncomingMovement::attack("0:15:00"),
        ]);
        assert_eq!(
            assess(&scan),
            Assessment::Incoming {
                time_to_impact: Duration::from_secs(900)
            }
        );
    }

    #[test]
    fn test_deadline_subtracts_margin() {
        let now = Utc::now();
        let deadline = mitigation_deadline(now, Duration::from_secs(600), DEFAULT_SAFETY_MARGIN);
        assert_eq!(deadline, now + chrono::Duration::seconds(480));
    }

    #[test]
    fn test_deadline_clamps_to_now() {
        let now = Utc::now();
        assert_eq!(
            mitigation_deadline(now, Duration::from_secs(90), DEFAULT_SAFETY_MARGIN),
            now
        );
        assert_eq!(
            mitigation_deadline(now, Duration::from_secs(120), DEFAULT_SAFETY_MARGIN),
            now
        );
    }

    #[test]
    fn test_far_deadline_saturates() {
        let now = Utc::now();
        let far = parse_timer("5000000000:00:00").unwrap();
        assert_eq!(
            mitigation_deadline(now, far, DEFAULT_SAFETY_MARGIN),
            DateTime::<Utc>::MAX_UTC
        );
    }
}
