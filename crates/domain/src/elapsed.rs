use std::fmt::{Display, Formatter};

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::manifest::Manifest;
use crate::status::Stage;

/// Live counter shown on a board card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "seconds", rename_all = "snake_case")]
pub enum ElapsedTime {
    /// Whole seconds since the resolved stage timestamp.
    Running(u64),
    /// No readable timestamp on the fallback chain.
    Unavailable,
}

impl ElapsedTime {
    /// Placeholder for the full `HH:MM:SS` rendering.
    pub const UNAVAILABLE_LONG: &'static str = "--:--:--";
    /// Placeholder for the short `HH:MM` rendering.
    pub const UNAVAILABLE_SHORT: &'static str = "--:--";

    /// Computes `now - since`, clamping future timestamps to zero.
    #[must_use]
    pub fn between(since: NaiveDateTime, now: NaiveDateTime) -> Self {
        let delta: TimeDelta = now - since;
        Self::Running(u64::try_from(delta.num_seconds()).unwrap_or(0))
    }

    /// Returns elapsed seconds, if running.
    #[must_use]
    pub fn seconds(&self) -> Option<u64> {
        match self {
            Self::Running(seconds) => Some(*seconds),
            Self::Unavailable => None,
        }
    }

    /// Renders `HH:MM` without seconds.
    #[must_use]
    pub fn to_short_string(&self) -> String {
        match self {
            Self::Running(seconds) => {
                let (hours, minutes, _) = split_seconds(*seconds);
                format!("{hours:02}:{minutes:02}")
            }
            Self::Unavailable => Self::UNAVAILABLE_SHORT.to_owned(),
        }
    }
}

/// Renders `HH:MM:SS`; hours grow past 99 for multi-day waits.
impl Display for ElapsedTime {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running(seconds) => {
                let (hours, minutes, seconds) = split_seconds(*seconds);
                write!(formatter, "{hours:02}:{minutes:02}:{seconds:02}")
            }
            Self::Unavailable => formatter.write_str(Self::UNAVAILABLE_LONG),
        }
    }
}

fn split_seconds(total: u64) -> (u64, u64, u64) {
    (total / 3_600, (total % 3_600) / 60, total % 60)
}

/// Computes the counter for a manifest card rendered in `stage`.
#[must_use]
pub fn elapsed_time(manifest: &Manifest, stage: Stage, now: NaiveDateTime) -> ElapsedTime {
    match manifest.timeline().resolve_display_timestamp(stage, now) {
        Some(since) => ElapsedTime::between(since, now),
        None => ElapsedTime::Unavailable,
    }
}
