/// Sample type accepted by [`RunningMean`].
pub(crate) trait Sample: Copy + PartialOrd {
    fn as_f64(self) -> f64;
}

impl Sample for u32 {
    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Sample for u64 {
    fn as_f64(self) -> f64 {
        self as f64
    }
}

/// Incremental mean together with the bounds of the samples it absorbed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct RunningMean<T> {
    mean: f64,
    bounds: Option<(T, T)>,
}

impl<T: Sample> RunningMean<T> {
    /// Folds `sample` into the mean, treating `prior` as the number of earlier samples.
    pub(crate) fn record(&mut self, sample: T, prior: u64) {
        let prior = prior as f64;
        self.mean = (self.mean * prior + sample.as_f64()) / (prior + 1.0);
        self.bounds = Some(match self.bounds {
            None => (sample, sample),
            Some((low, high)) => (
                if sample < low { sample } else { low },
                if sample > high { sample } else { high },
            ),
        });
    }

    pub(crate) fn mean(&self) -> f64 {
        self.mean
    }

    pub(crate) fn bounds(&self) -> Option<(T, T)> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::RunningMean;

    #[test]
    fn tracks_mean_and_bounds() {
        let mut mean = RunningMean::<u32>::default();
        for (prior, sample) in [4u32, 8, 0, 4].into_iter().enumerate() {
            mean.record(sample, prior as u64);
        }
        assert!((mean.mean() - 4.0).abs() < 1e-12);
        assert_eq!(mean.bounds(), Some((0, 8)));
    }

    #[test]
    fn empty_mean_is_zero() {
        let mean = RunningMean::<u64>::default();
        assert_eq!(mean.mean(), 0.0);
        assert_eq!(mean.bounds(), None);
    }
}
