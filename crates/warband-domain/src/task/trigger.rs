use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JitterRange;

/// When a registry entry fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Trigger {
    /// Recurring; every arming draws a fresh delay from the range.
    Interval(JitterRange),
    /// One firing at an absolute instant, never re-armed automatically.
    At(DateTime<Utc>),
}

impl Trigger {
    pub fn is_recurring(&self) -> bool {
        matches!(self, Trigger::Interval(_))
    }

    /// Absolute instant of the next firing when armed at `now`.
    /// Instants in the past fire immediately.
    pub fn next_fire_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Trigger::Interval(range) => {
                let delay = chrono::Duration::from_std(range.next_delay())
                    .unwrap_or_else(|_| chrono::Duration::zero());
                now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC)
            }
            Trigger::At(at) => (*at).max(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_past_instant_clamps_to_now() {
        let now = Utc::now();
        let trigger = Trigger::At(now - chrono::Duration::seconds(30));
        assert_eq!(trigger.next_fire_at(now), now);
        assert!(!trigger.is_recurring());
    }

    #[test]
    fn test_interval_draws_within_range() {
        let now = Utc::now();
        let trigger = Trigger::Interval(JitterRange::new(10.0, 20.0).unwrap());
        let at = trigger.next_fire_at(now);
        let secs = (at - now).num_milliseconds() as f64 / 1000.0;
        assert!((10.0..=20.0).contains(&secs));
    }

    #[test]
    fn test_overflowing_instant_saturates() {
        let now = DateTime::<Utc>::MAX_UTC - chrono::Duration::seconds(5);
        let trigger = Trigger::Interval(JitterRange::fixed(60.0));
        assert_eq!(trigger.next_fire_at(now), DateTime::<Utc>::MAX_UTC);
    }
}
