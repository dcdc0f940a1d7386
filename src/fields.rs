//! Enumerations and field types for task prioritisation.
//!
//! This module defines the structured values a task is classified by: the
//! Eisenhower quadrant, the deadline kind, importance levels and the
//! hours/minutes span used for estimates and recorded time.

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lowest accepted importance level.
pub const MIN_IMPORTANCE: u8 = 1;
/// Highest accepted importance level.
pub const MAX_IMPORTANCE: u8 = 4;
/// Levels at or above this count as important.
pub const IMPORTANT_THRESHOLD: u8 = 3;

/// Eisenhower matrix quadrant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// Urgent and important.
    Q1,
    /// Important, not urgent.
    Q2,
    /// Urgent, not important.
    Q3,
    /// Neither urgent nor important.
    Q4,
}

impl Quadrant {
    /// Every quadrant in display order.
    pub const ALL: [Quadrant; 4] = [Quadrant::Q1, Quadrant::Q2, Quadrant::Q3, Quadrant::Q4];

    /// Short action title shown as the quadrant heading.
    pub fn title(self) -> &'static str {
        match self {
            Quadrant::Q1 => "Do Now",
            Quadrant::Q2 => "Plan",
            Quadrant::Q3 => "Delegate",
            Quadrant::Q4 => "Eliminate",
        }
    }

    /// The urgency/importance combination the quadrant stands for.
    pub fn subtitle(self) -> &'static str {
        match self {
            Quadrant::Q1 => "Urgent & Important",
            Quadrant::Q2 => "Important, Not Urgent",
            Quadrant::Q3 => "Urgent, Not Important",
            Quadrant::Q4 => "Neither Urgent nor Important",
        }
    }
}

/// When a task is due.
///
/// `SpecificDate` carries an optional payload so that a date kind saved
/// without a date stays representable; such a deadline is never urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Deadline {
    #[default]
    Today,
    Tomorrow,
    SpecificDate(Option<NaiveDate>),
    NoDeadline,
}

/// Check that an importance level lies within `1..=4`.
pub fn validate_importance(importance: u8) -> Result<u8> {
    if (MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&importance) {
        Ok(importance)
    } else {
        Err(Error::InvalidRange(format!(
            "importance {importance} outside {MIN_IMPORTANCE}..={MAX_IMPORTANCE}"
        )))
    }
}

/// Pull an importance level into the valid range.
pub fn clamp_importance(importance: u8) -> u8 {
    importance.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE)
}

/// Display label for an importance level.
pub fn importance_label(importance: u8) -> &'static str {
    match importance {
        1 => "Low",
        2 => "Medium",
        3 => "High",
        4 => "Critical",
        _ => "-",
    }
}

/// A duration expressed as whole hours plus minutes in `0..=59`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TimeSpan {
    hours: u32,
    minutes: u8,
}

impl TimeSpan {
    /// Build a span, rejecting minutes above 59.
    pub fn new(hours: u32, minutes: u8) -> Result<Self> {
        if minutes > 59 {
            return Err(Error::InvalidRange(format!("minutes {minutes} outside 0..=59")));
        }
        Ok(Self { hours, minutes })
    }

    /// Normalise a minute count into hours and minutes.
    pub fn from_minutes(total: u64) -> Self {
        Self {
            hours: u32::try_from(total / 60).unwrap_or(u32::MAX),
            minutes: (total % 60) as u8,
        }
    }

    /// Convert a stopwatch reading, dropping any partial minute.
    pub fn from_elapsed_secs(secs: u64) -> Self {
        Self::from_minutes(secs / 60)
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn total_minutes(&self) -> u64 {
        u64::from(self.hours) * 60 + u64::from(self.minutes)
    }

    /// Minutes above 59 can only arrive through deserialisation.
    pub(crate) fn validate(self) -> Result<Self> {
        Self::new(self.hours, self.minutes)
    }

    /// Carry excess minutes into hours.
    pub(crate) fn normalized(self) -> Self {
        Self::from_minutes(self.total_minutes())
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_span_rejects_out_of_range_minutes() {
        assert!(TimeSpan::new(1, 59).is_ok());
        assert!(matches!(TimeSpan::new(0, 60), Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_time_span_normalises_minutes() {
        let span = TimeSpan::from_minutes(135);
        assert_eq!((span.hours(), span.minutes()), (2, 15));
        assert_eq!(span.total_minutes(), 135);
        assert_eq!(span.to_string(), "2h 15m");
    }

    #[test]
    fn test_elapsed_seconds_floor_to_minutes() {
        assert_eq!(TimeSpan::from_elapsed_secs(59), TimeSpan::from_minutes(0));
        assert_eq!(TimeSpan::from_elapsed_secs(3_725), TimeSpan::from_minutes(62));
    }

    #[test]
    fn test_importance_bounds() {
        assert!(validate_importance(0).is_err());
        assert_eq!(validate_importance(1).unwrap(), 1);
        assert_eq!(validate_importance(4).unwrap(), 4);
        assert!(validate_importance(5).is_err());
        assert_eq!(importance_label(3), "High");
        assert_eq!(clamp_importance(0), 1);
        assert_eq!(clamp_importance(9), 4);
    }

    #[test]
    fn test_normalized_carries_minutes() {
        let raw = TimeSpan { hours: 0, minutes: 95 };
        assert!(raw.validate().is_err());
        assert_eq!(raw.normalized(), TimeSpan::new(1, 35).unwrap());
    }

    #[test]
    fn test_quadrant_labels() {
        assert_eq!(Quadrant::Q1.title(), "Do Now");
        assert_eq!(Quadrant::Q4.subtitle(), "Neither Urgent nor Important");
    }
}
