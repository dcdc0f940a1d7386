//! Summary metrics over the active tasks and the archive.

use serde::Serialize;

use crate::fields::{Quadrant, TimeSpan};
use crate::task::Task;

/// How recorded time compares with the estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Accuracy {
    NoData,
    Accurate,
    /// Work finished in less time than estimated (ratio above 100).
    OverEstimated,
    /// Work took longer than estimated (ratio below 100).
    UnderEstimated,
}

/// Read-only statistics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_completed: usize,
    pub q1_completed: usize,
    pub estimated_total: TimeSpan,
    pub actual_total: TimeSpan,
    /// `round(100 * estimated / actual)` over tasks with recorded time, 0 without data.
    pub accuracy_ratio: u64,
    pub archived_count: usize,
    pub archived: Vec<Task>,
}

impl StatsSnapshot {
    pub fn accuracy(&self) -> Accuracy {
        if self.actual_total.total_minutes() == 0 {
            return Accuracy::NoData;
        }
        match self.accuracy_ratio {
            100 => Accuracy::Accurate,
            r if r > 100 => Accuracy::OverEstimated,
            _ => Accuracy::UnderEstimated,
        }
    }
}

/// Fold `tasks` into completion counts and time totals.
///
/// Only completed tasks that were placed on the matrix count. Accuracy only
/// considers tasks that also carry a recorded actual time.
pub fn aggregate(tasks: &[Task], archive: &[Task]) -> StatsSnapshot {
    let completed: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.completed && t.quadrant.is_some())
        .collect();

    let q1_completed = completed
        .iter()
        .filter(|t| t.quadrant == Some(Quadrant::Q1))
        .count();
    let estimated_minutes: u64 = completed.iter().map(|t| t.estimated.total_minutes()).sum();

    let (timed_estimate, timed_actual) = completed
        .iter()
        .filter_map(|t| t.actual.map(|a| (t.estimated.total_minutes(), a.total_minutes())))
        .fold((0u64, 0u64), |(e, a), (te, ta)| (e + te, a + ta));

    StatsSnapshot {
        total_completed: completed.len(),
        q1_completed,
        estimated_total: TimeSpan::from_minutes(estimated_minutes),
        actual_total: TimeSpan::from_minutes(timed_actual),
        accuracy_ratio: accuracy_ratio(timed_estimate, timed_actual),
        archived_count: archive.len(),
        archived: archive.to_vec(),
    }
}

fn accuracy_ratio(estimated: u64, actual: u64) -> u64 {
    if actual == 0 {
        return 0;
    }
    // Integer rounding, half away from zero.
    (estimated * 200 + actual) / (actual * 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(quadrant: Option<Quadrant>, est: u64, actual: Option<u64>) -> Task {
        let mut t = Task::new("t");
        t.quadrant = quadrant;
        t.estimated = TimeSpan::from_minutes(est);
        t.completed = true;
        t.completed_at_utc = Some(0);
        t.actual = actual.map(TimeSpan::from_minutes);
        t
    }

    #[test]
    fn test_empty_collection() {
        let s = aggregate(&[], &[]);
        assert_eq!(s.total_completed, 0);
        assert_eq!(s.accuracy_ratio, 0);
        assert_eq!(s.accuracy(), Accuracy::NoData);
        assert_eq!(s.estimated_total, TimeSpan::default());
    }

    #[test]
    fn test_ratio_over_estimated() {
        let s = aggregate(&[done(Some(Quadrant::Q2), 60, Some(30))], &[]);
        assert_eq!(s.accuracy_ratio, 200);
        assert_eq!(s.accuracy(), Accuracy::OverEstimated);
    }

    #[test]
    fn test_ratio_under_estimated_and_rounding() {
        let s = aggregate(&[done(Some(Quadrant::Q1), 20, Some(30))], &[]);
        assert_eq!(s.accuracy_ratio, 67);
        assert_eq!(s.accuracy(), Accuracy::UnderEstimated);
    }

    #[test]
    fn test_zero_actual_minutes_guarded() {
        let s = aggregate(&[done(Some(Quadrant::Q1), 30, Some(0))], &[]);
        assert_eq!(s.accuracy_ratio, 0);
        assert_eq!(s.accuracy(), Accuracy::NoData);
    }

    #[test]
    fn test_tiny_ratio_is_not_no_data() {
        let s = aggregate(&[done(Some(Quadrant::Q2), 1, Some(300))], &[]);
        assert_eq!(s.accuracy_ratio, 0);
        assert_eq!(s.accuracy(), Accuracy::UnderEstimated);
    }

    #[test]
    fn test_counts_only_completed_classified() {
        let mut open = done(Some(Quadrant::Q1), 30, None);
        open.completed = false;
        let tasks = vec![
            done(Some(Quadrant::Q1), 90, None),
            done(Some(Quadrant::Q3), 45, Some(45)),
            done(None, 500, Some(10)),
            open,
        ];
        let s = aggregate(&tasks, &[]);
        assert_eq!(s.total_completed, 2);
        assert_eq!(s.q1_completed, 1);
        assert_eq!(s.estimated_total, TimeSpan::new(2, 15).unwrap());
        assert_eq!(s.actual_total, TimeSpan::new(0, 45).unwrap());
        assert_eq!(s.accuracy_ratio, 100);
        assert_eq!(s.accuracy(), Accuracy::Accurate);
    }

    #[test]
    fn test_archive_reported_as_is() {
        let archive = vec![done(Some(Quadrant::Q4), 10, None), done(None, 5, None)];
        let s = aggregate(&[], &archive);
        assert_eq!(s.archived_count, 2);
        assert_eq!(s.archived, archive);
        assert_eq!(s.total_completed, 0);
    }
}
