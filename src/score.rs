//! Scoring of a finished session.
//!
//! Everything here is a pure function of the latency list. The grade and
//! percentile share one boundary table with inclusive upper bounds; the
//! percentile is a display label tied to the grade, not a statistic.

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::util::{mean, round_ms, std_dev};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Grade {
    Superhuman,
    VeryFast,
    Fast,
    Normal,
    Slow,
}

/// Inclusive upper bound on the mean for each grade, fastest first.
/// Anything above the last bound is [`Grade::Slow`].
const GRADE_BOUNDS: [(Millis, Grade); 4] = [
    (150, Grade::Superhuman),
    (200, Grade::VeryFast),
    (250, Grade::Fast),
    (350, Grade::Normal),
];

impl Grade {
    pub const ALL: [Grade; 5] = [
        Grade::Superhuman,
        Grade::VeryFast,
        Grade::Fast,
        Grade::Normal,
        Grade::Slow,
    ];

    pub fn from_mean(mean_ms: Millis) -> Self {
        GRADE_BOUNDS
            .iter()
            .find(|(bound, _)| mean_ms <= *bound)
            .map(|&(_, grade)| grade)
            .unwrap_or(Grade::Slow)
    }

    /// Inverse of the `Display` key, e.g. `"veryFast"`
    pub fn from_key(key: &str) -> Option<Self> {
        Grade::ALL.into_iter().find(|g| g.to_string() == key)
    }

    pub fn percentile_label(&self) -> &'static str {
        match self {
            Grade::Superhuman => "1%",
            Grade::VeryFast => "10%",
            Grade::Fast => "30%",
            Grade::Normal => "50%",
            Grade::Slow => "70%+",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Consistency {
    VeryConsistent,
    Consistent,
    Somewhat,
    Inconsistent,
}

impl Consistency {
    pub fn from_std_dev(std_dev_ms: Millis) -> Self {
        match std_dev_ms {
            0..=19 => Consistency::VeryConsistent,
            20..=49 => Consistency::Consistent,
            50..=99 => Consistency::Somewhat,
            _ => Consistency::Inconsistent,
        }
    }
}

pub fn grade(mean_ms: Millis) -> Grade {
    Grade::from_mean(mean_ms)
}

pub fn percentile_label(mean_ms: Millis) -> &'static str {
    Grade::from_mean(mean_ms).percentile_label()
}

pub fn consistency(std_dev_ms: Millis) -> Consistency {
    Consistency::from_std_dev(std_dev_ms)
}

/// Slow sessions get an improvement tip in the profile
pub fn needs_improvement(mean_ms: Millis) -> bool {
    mean_ms > 350
}

/// Derived scores for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub mean_ms: Millis,
    pub std_dev_ms: Millis,
    pub grade: Grade,
    pub percentile: &'static str,
    pub consistency: Consistency,
}

impl Report {
    /// `None` when there are no latencies to score
    pub fn from_latencies(latencies: &[Millis]) -> Option<Self> {
        let mean_ms = round_ms(mean(latencies)?);
        let std_dev_ms = round_ms(std_dev(latencies)?);

        Some(Self {
            mean_ms,
            std_dev_ms,
            grade: grade(mean_ms),
            percentile: percentile_label(mean_ms),
            consistency: consistency(std_dev_ms),
        })
    }

    pub fn needs_improvement(&self) -> bool {
        needs_improvement(self.mean_ms)
    }
}
