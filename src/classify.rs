//! Urgency rule and quadrant classification.
//!
//! Both come in two forms: an `_on` variant taking the reference date
//! explicitly, and a convenience variant that uses the local current date.

use chrono::{Local, NaiveDate};

use crate::fields::{Deadline, Quadrant, IMPORTANT_THRESHOLD};

/// Specific dates at most this many days away count as urgent.
pub const URGENT_WITHIN_DAYS: i64 = 2;

/// Whether a deadline is urgent relative to `today`.
///
/// Overdue dates stay urgent however far in the past they are.
pub fn is_urgent_on(deadline: &Deadline, today: NaiveDate) -> bool {
    match deadline {
        Deadline::Today | Deadline::Tomorrow => true,
        Deadline::SpecificDate(Some(d)) => (*d - today).num_days() <= URGENT_WITHIN_DAYS,
        Deadline::SpecificDate(None) | Deadline::NoDeadline => false,
    }
}

pub fn is_urgent(deadline: &Deadline) -> bool {
    is_urgent_on(deadline, Local::now().date_naive())
}

/// Place an importance level and deadline on the matrix.
pub fn classify_on(importance: u8, deadline: &Deadline, today: NaiveDate) -> Quadrant {
    let important = importance >= IMPORTANT_THRESHOLD;
    match (is_urgent_on(deadline, today), important) {
        (true, true) => Quadrant::Q1,
        (false, true) => Quadrant::Q2,
        (true, false) => Quadrant::Q3,
        (false, false) => Quadrant::Q4,
    }
}

pub fn classify(importance: u8, deadline: &Deadline) -> Quadrant {
    classify_on(importance, deadline, Local::now().date_naive())
}
