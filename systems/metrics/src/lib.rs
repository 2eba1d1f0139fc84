#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Running latency and throughput statistics derived from world events.

mod running;

use loadsplit_core::{Event, MetricsSnapshot};

use crate::running::RunningMean;

/// Pure system folding completion and tick events into running means.
///
/// Latency is averaged over completed tasks and throughput over ticks. Both are
/// process-wide means that only restart when the world reports a reset.
#[derive(Clone, Debug, Default)]
pub struct MetricsTracker {
    latency: RunningMean<u64>,
    throughput: RunningMean<u32>,
    admitted_tasks: u64,
    completed_tasks: u64,
    ticks: u64,
}

impl MetricsTracker {
    /// Creates a tracker with no recorded samples.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events emitted during a tick.
    pub fn handle(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::SimulationReset => *self = Self::default(),
                Event::TaskAssigned { .. } => self.admitted_tasks += 1,
                Event::TaskCompleted { latency, .. } => {
                    self.latency.record(latency, self.completed_tasks);
                    self.completed_tasks += 1;
                }
                Event::TimeAdvanced { tick, throughput } => {
                    self.throughput.record(throughput, tick);
                    self.ticks += 1;
                }
                _ => {}
            }
        }
    }

    /// Captures the current statistics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            mean_latency: self.latency.mean(),
            mean_throughput: self.throughput.mean(),
            admitted_tasks: self.admitted_tasks,
            completed_tasks: self.completed_tasks,
            ticks: self.ticks,
            latency_range: self.latency.bounds(),
            throughput_range: self.throughput.bounds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MetricsTracker;
    use loadsplit_core::{Event, LoaderId, TaskColor, TaskId};

    fn completed(latency: u64) -> Event {
        Event::TaskCompleted {
            task: TaskId::new(0),
            loader: LoaderId::new(0),
            latency,
            size: 1,
        }
    }

    #[test]
    fn latency_mean_counts_completed_tasks() {
        let mut tracker = MetricsTracker::new();
        tracker.handle(&[completed(2), completed(4)]);
        tracker.handle(&[completed(9)]);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.completed_tasks, 3);
        assert!((snapshot.mean_latency - 5.0).abs() < 1e-12);
        assert_eq!(snapshot.latency_range, Some((2, 9)));
    }

    #[test]
    fn throughput_mean_uses_tick_index_as_prior_count() {
        let mut tracker = MetricsTracker::new();
        let samples = [8, 0, 16, 8];
        for (tick, throughput) in samples.into_iter().enumerate() {
            tracker.handle(&[Event::TimeAdvanced {
                tick: tick as u64,
                throughput,
            }]);
        }

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.ticks, 4);
        assert!((snapshot.mean_throughput - 8.0).abs() < 1e-12);
        assert!((snapshot.mean_throughput_units() - 0.125).abs() < 1e-12);
        assert_eq!(snapshot.throughput_range, Some((0, 16)));
    }

    #[test]
    fn means_stay_within_observed_bounds() {
        let mut tracker = MetricsTracker::new();
        let latencies = [7, 0, 31, 3, 3, 18, 2, 40, 1];
        for (tick, latency) in latencies.into_iter().enumerate() {
            tracker.handle(&[
                completed(latency),
                Event::TimeAdvanced {
                    tick: tick as u64,
                    throughput: (latency as u32 * 5) % 17,
                },
            ]);

            let snapshot = tracker.snapshot();
            let (low, high) = snapshot.latency_range.expect("latency recorded");
            assert!(snapshot.mean_latency >= low as f64 - 1e-9);
            assert!(snapshot.mean_latency <= high as f64 + 1e-9);
            let (low, high) = snapshot.throughput_range.expect("throughput recorded");
            assert!(snapshot.mean_throughput >= f64::from(low) - 1e-9);
            assert!(snapshot.mean_throughput <= f64::from(high) + 1e-9);
        }
    }

    #[test]
    fn admissions_are_counted_separately_from_completions() {
        let assigned = Event::TaskAssigned {
            task: TaskId::new(3),
            loader: LoaderId::new(1),
            size: 5,
            color: TaskColor::from_rgb(0, 128, 128),
        };
        let mut tracker = MetricsTracker::new();
        tracker.handle(&[assigned, assigned, completed(6)]);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.admitted_tasks, 2);
        assert_eq!(snapshot.completed_tasks, 1);
    }

    #[test]
    fn reset_event_discards_history() {
        let mut tracker = MetricsTracker::new();
        tracker.handle(&[completed(12)]);
        tracker.handle(&[Event::SimulationReset]);
        assert_eq!(tracker.snapshot(), MetricsTracker::new().snapshot());
    }
}
