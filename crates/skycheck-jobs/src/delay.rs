//! Delay policies: how long to wait before firing a job.

use std::time::Duration;

use chrono::{DateTime, Utc};

use skycheck_config::SchedulerConfig;

/// Result of applying a [`DelayPolicy`] at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPlan {
    /// Timer duration handed to the scheduler.
    pub fire_after: Duration,
    /// Value reported as `scheduledFor`. Informational only.
    pub scheduled_for: DateTime<Utc>,
}

/// Rule computing when a newly created job should fire.
pub trait DelayPolicy: Send + Sync {
    fn plan(&self, now: DateTime<Utc>) -> DelayPlan;
}

/// Fire after a fixed delay while advertising a (possibly different) fixed
/// offset to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    fire_after: Duration,
    advertised_offset: Duration,
}

impl FixedDelay {
    /// Fire and advertise the same delay.
    pub fn new(fire_after: Duration) -> Self {
        Self {
            fire_after,
            advertised_offset: fire_after,
        }
    }

    /// Report `offset` as the scheduled time instead of the real delay.
    pub fn with_advertised_offset(mut self, offset: Duration) -> Self {
        self.advertised_offset = offset;
        self
    }

}

impl From<&SchedulerConfig> for FixedDelay {
    fn from(config: &SchedulerConfig) -> Self {
        Self::new(Duration::from_secs(config.delay_secs))
            .with_advertised_offset(Duration::from_secs(
                config.advertised_offset_hours.saturating_mul(3600),
            ))
    }
}

impl DelayPolicy for FixedDelay {
    fn plan(&self, now: DateTime<Utc>) -> DelayPlan {
        // Offsets past chrono's range clamp to the latest representable time.
        let scheduled_for = chrono::Duration::from_std(self.advertised_offset)
            .ok()
            .and_then(|offset| now.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        DelayPlan {
            fire_after: self.fire_after,
            scheduled_for,
        }
    }
}
