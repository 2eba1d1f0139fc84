#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic loader selection for newly admitted tasks.
//!
//! The policy is evaluated in a strict order: minimum-load selection first,
//! then idle preference, then the admission test, and finally either overflow
//! into the last loader or growth of the pool. Every scan walks the pool in
//! index order so ties always resolve to the lowest index.

use loadsplit_core::{
    AdmissionThreshold, BalancingPolicy, LoaderLoad, LoaderLoadView, LoaderTarget,
};

/// Pure system that maps loader loads onto a [`LoaderTarget`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Balancing {
    policy: BalancingPolicy,
    threshold: AdmissionThreshold,
}

impl Balancing {
    /// Creates a balancing system applying the provided policy and admission threshold.
    #[must_use]
    pub const fn new(policy: BalancingPolicy, threshold: AdmissionThreshold) -> Self {
        Self { policy, threshold }
    }

    /// Policy applied by the system.
    #[must_use]
    pub const fn policy(&self) -> BalancingPolicy {
        self.policy
    }

    /// Threshold used by queue-depth admission.
    #[must_use]
    pub const fn threshold(&self) -> AdmissionThreshold {
        self.threshold
    }

    /// Selects the loader that receives the next task.
    ///
    /// An empty pool always grows, since there is no loader to scan or overflow into.
    #[must_use]
    pub fn select(&self, loads: &LoaderLoadView) -> LoaderTarget {
        let policy = self.policy;

        if policy.always_pick_minimum {
            return loads
                .iter()
                .min_by_key(|load| load.queued)
                .map_or(LoaderTarget::Spawn, |load| LoaderTarget::Existing(load.id));
        }

        if policy.prefer_idle_first {
            if let Some(idle) = loads.iter().find(|load| load.queued == 0) {
                return LoaderTarget::Existing(idle.id);
            }
        }

        let pool_len = loads.len();
        if let Some((_, load)) = loads
            .iter()
            .enumerate()
            .find(|(index, load)| self.admits(*index, pool_len, load))
        {
            return LoaderTarget::Existing(load.id);
        }

        match loads.last() {
            Some(last) if policy.admit_by_queue_depth => LoaderTarget::Existing(last.id),
            _ => LoaderTarget::Spawn,
        }
    }

    fn admits(&self, index: usize, pool_len: usize, load: &LoaderLoad) -> bool {
        if self.policy.admit_by_queue_depth {
            let cutoff = admission_cutoff(index, pool_len, self.policy, self.threshold);
            self.threshold.admits(load.queued, cutoff)
        } else {
            load.queued == 0
        }
    }
}

/// Backlog depth at which a loader stops admitting new work under queue-depth admission.
///
/// The front half of the pool, middle index included, uses the narrow cutoff
/// when position weighting is enabled. The result is compared in buckets of
/// the threshold's resolution.
#[must_use]
pub fn admission_cutoff(
    index: usize,
    pool_len: usize,
    policy: BalancingPolicy,
    threshold: AdmissionThreshold,
) -> u32 {
    if policy.weight_thresholds_by_position && index <= pool_len / 2 {
        threshold.narrow_size()
    } else {
        threshold.size()
    }
}
