use std::fmt::{self, Write as _};

use loadsplit_engine::Simulation;
use loadsplit_world::query;
use serde::Serialize;

/// Summary of a finished run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct RunReport {
    /// Balancing preset name, or `custom`.
    policy: String,
    /// Ticks executed.
    ticks: u64,
    /// Tasks admitted into a loader.
    admitted_tasks: u64,
    /// Tasks fully drained.
    completed_tasks: u64,
    /// Running mean latency in ticks.
    mean_latency: f64,
    /// Running mean throughput in work-units per tick.
    mean_throughput: f64,
    /// Loaders in the pool when the run ended.
    loaders: usize,
    /// Smallest and largest completed-task latency.
    latency_range: Option<(u64, u64)>,
}

impl RunReport {
    /// Captures the state of a simulation.
    pub(crate) fn capture(policy: &str, simulation: &Simulation) -> Self {
        let metrics = simulation.metrics();
        Self {
            policy: policy.to_owned(),
            ticks: metrics.ticks,
            admitted_tasks: metrics.admitted_tasks,
            completed_tasks: metrics.completed_tasks,
            mean_latency: metrics.mean_latency,
            mean_throughput: metrics.mean_throughput_units(),
            loaders: query::loader_count(simulation.world()),
            latency_range: metrics.latency_range,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "policy:          {}", self.policy)?;
        writeln!(f, "ticks:           {}", self.ticks)?;
        writeln!(f, "admitted tasks:  {}", self.admitted_tasks)?;
        writeln!(f, "completed tasks: {}", self.completed_tasks)?;
        writeln!(f, "mean latency:    {:.2} ticks", self.mean_latency)?;
        writeln!(f, "throughput:      {:.3} units/tick", self.mean_throughput)?;
        write!(f, "loaders:         {}", self.loaders)?;
        if let Some((low, high)) = self.latency_range {
            write!(f, "\nlatency range:   {low}..={high}")?;
        }
        Ok(())
    }
}

/// Formats reports as an aligned comparison table.
pub(crate) fn comparison_table(reports: &[RunReport]) -> String {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:<12} {:>10} {:>12} {:>12} {:>8}",
        "policy", "completed", "latency", "throughput", "loaders"
    );
    for report in reports {
        let _ = writeln!(
            table,
            "{:<12} {:>10} {:>12.2} {:>12.3} {:>8}",
            report.policy,
            report.completed_tasks,
            report.mean_latency,
            report.mean_throughput,
            report.loaders
        );
    }
    table
}
