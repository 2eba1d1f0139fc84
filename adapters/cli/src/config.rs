use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use loadsplit_core::{
    AdmissionThreshold, BalancingPolicy, InitialPool, LoaderSpeed, SimulationConfig,
};
use tracing::debug;

use crate::config_transfer;

/// Configuration sources shared by every subcommand.
///
/// The base configuration comes from a TOML file or a share string; individual
/// flags then override it. Policy switches can only be turned on from the
/// command line.
#[derive(Args, Debug, Default)]
pub(crate) struct ConfigArgs {
    /// TOML file providing the base configuration.
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "from_share")]
    config: Option<PathBuf>,

    /// Share string produced by `loadsplit share`.
    #[arg(long, global = true, value_name = "STRING")]
    from_share: Option<String>,

    /// Digit string seeding task sizes.
    #[arg(long, global = true)]
    seed: Option<String>,

    /// Scripted tasks such as `5,12/red,-1`.
    #[arg(long, global = true)]
    sequence: Option<String>,

    /// Work-units drained per tick by each loader (1-8).
    #[arg(long, global = true)]
    loader_speed: Option<u8>,

    /// Named balancing preset: none, idle-first, threshold, weighted or ideal.
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Admit tasks into loaders whose backlog is below a depth cutoff.
    #[arg(long, global = true)]
    admit_by_queue_depth: bool,

    /// Prefer the first idle loader.
    #[arg(long, global = true)]
    prefer_idle_first: bool,

    /// Tighten the cutoff for the front half of the pool.
    #[arg(long, global = true)]
    weight_thresholds_by_position: bool,

    /// Always assign the least loaded loader.
    #[arg(long, global = true)]
    always_pick_minimum: bool,

    /// Backlog depth at which queue-depth admission rejects a loader (1-100).
    #[arg(long, global = true)]
    threshold_size: Option<u32>,

    /// Width of the buckets backlogs are compared in (1-100).
    #[arg(long, global = true)]
    threshold_resolution: Option<u32>,

    /// Create exactly this many loaders at reset instead of sizing the pool automatically.
    #[arg(long, global = true)]
    initial_pool: Option<u32>,
}

impl ConfigArgs {
    /// Builds the effective configuration.
    pub(crate) fn resolve(&self) -> Result<SimulationConfig> {
        let mut config = if let Some(path) = &self.config {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            parse_toml(&contents)
                .with_context(|| format!("invalid config file {}", path.display()))?
        } else if let Some(share) = &self.from_share {
            config_transfer::decode(share).context("invalid share string")?
        } else {
            SimulationConfig::default()
        };

        if let Some(seed) = &self.seed {
            config.seed.clone_from(seed);
        }
        if let Some(sequence) = &self.sequence {
            config.sequence.clone_from(sequence);
        }
        if let Some(speed) = self.loader_speed {
            config.loader_speed = LoaderSpeed::new(speed)?;
        }
        if let Some(name) = &self.policy {
            config.policy = preset(name)?;
        }
        config.policy.admit_by_queue_depth |= self.admit_by_queue_depth;
        config.policy.prefer_idle_first |= self.prefer_idle_first;
        config.policy.weight_thresholds_by_position |= self.weight_thresholds_by_position;
        config.policy.always_pick_minimum |= self.always_pick_minimum;
        if self.threshold_size.is_some() || self.threshold_resolution.is_some() {
            let size = self.threshold_size.unwrap_or(config.threshold.size());
            let resolution = self
                .threshold_resolution
                .unwrap_or(config.threshold.resolution());
            config.threshold = AdmissionThreshold::new(size, resolution)?;
        }
        if let Some(count) = self.initial_pool {
            config.initial_pool = InitialPool::Fixed(count);
        }

        let _ = config.seed_digits()?;
        debug!(?config, "configuration resolved");
        Ok(config)
    }
}

/// Parses a configuration file.
pub(crate) fn parse_toml(contents: &str) -> Result<SimulationConfig> {
    toml::from_str(contents).context("failed to parse configuration toml contents")
}

/// Looks up a named balancing preset.
pub(crate) fn preset(name: &str) -> Result<BalancingPolicy> {
    match BalancingPolicy::presets()
        .into_iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
    {
        Some((_, policy)) => Ok(policy),
        None => bail!("unknown balancing preset `{name}`"),
    }
}

/// Name of the preset matching `policy`, if any.
pub(crate) fn preset_name(policy: BalancingPolicy) -> &'static str {
    BalancingPolicy::presets()
        .into_iter()
        .find(|(_, candidate)| *candidate == policy)
        .map_or("custom", |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_file_fills_missing_fields_with_defaults() {
        let config = parse_toml(
            r#"
                seed = "123"
                loader_speed = 8

                [policy]
                admit_by_queue_depth = true
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.seed, "123");
        assert_eq!(config.loader_speed.get(), 8);
        assert!(config.policy.admit_by_queue_depth);
        assert!(!config.policy.prefer_idle_first);
        assert_eq!(config.sequence, "");
        assert_eq!(config.initial_pool, InitialPool::Automatic);
    }

    #[test]
    fn toml_accepts_a_fixed_pool() {
        let config = parse_toml("initial_pool = { fixed = 2 }").expect("valid toml");
        assert_eq!(config.initial_pool, InitialPool::Fixed(2));
    }

    #[test]
    fn toml_reads_an_admission_threshold() {
        let config = parse_toml(
            r#"
                [threshold]
                size = 27
                resolution = 3
            "#,
        )
        .expect("valid toml");
        assert_eq!(
            config.threshold,
            AdmissionThreshold::new(27, 3).expect("valid threshold")
        );

        let partial = parse_toml("threshold = { resolution = 4 }").expect("valid toml");
        assert_eq!(partial.threshold.size(), 21);
        assert_eq!(partial.threshold.resolution(), 4);
    }

    #[test]
    fn toml_rejects_out_of_range_threshold() {
        assert!(parse_toml("threshold = { size = 0 }").is_err());
        assert!(parse_toml("threshold = { resolution = 101 }").is_err());
    }

    #[test]
    fn threshold_flags_override_one_field_at_a_time() {
        let args = ConfigArgs {
            threshold_resolution: Some(5),
            ..ConfigArgs::default()
        };
        let config = args.resolve().expect("valid overrides");
        assert_eq!(config.threshold.size(), 21);
        assert_eq!(config.threshold.resolution(), 5);

        let args = ConfigArgs {
            threshold_size: Some(30),
            ..ConfigArgs::default()
        };
        let config = args.resolve().expect("valid overrides");
        assert_eq!(
            config.threshold,
            AdmissionThreshold::new(30, 1).expect("valid threshold")
        );

        let out_of_range = ConfigArgs {
            threshold_size: Some(101),
            ..ConfigArgs::default()
        };
        assert!(out_of_range.resolve().is_err());
    }

    #[test]
    fn toml_rejects_out_of_range_speed() {
        assert!(parse_toml("loader_speed = 0").is_err());
    }

    #[test]
    fn flags_override_the_base_configuration() {
        let args = ConfigArgs {
            seed: Some("777".to_owned()),
            loader_speed: Some(2),
            policy: Some("Weighted".to_owned()),
            always_pick_minimum: true,
            initial_pool: Some(0),
            ..ConfigArgs::default()
        };

        let config = args.resolve().expect("valid overrides");
        assert_eq!(config.seed, "777");
        assert_eq!(config.loader_speed.get(), 2);
        assert!(config.policy.weight_thresholds_by_position);
        assert!(config.policy.always_pick_minimum);
        assert_eq!(config.initial_pool, InitialPool::Fixed(0));
        assert_eq!(preset_name(config.policy), "custom");
    }

    #[test]
    fn share_string_provides_the_base_configuration() {
        let shared = SimulationConfig {
            sequence: "9/navy".to_owned(),
            ..SimulationConfig::default()
        };
        let args = ConfigArgs {
            from_share: Some(config_transfer::encode(&shared)),
            ..ConfigArgs::default()
        };
        assert_eq!(args.resolve().expect("valid share string"), shared);
    }

    #[test]
    fn invalid_values_are_reported() {
        let bad_seed = ConfigArgs {
            seed: Some("12x".to_owned()),
            ..ConfigArgs::default()
        };
        assert!(bad_seed.resolve().is_err());

        let bad_preset = ConfigArgs {
            policy: Some("fastest".to_owned()),
            ..ConfigArgs::default()
        };
        assert!(bad_preset.resolve().is_err());

        let bad_speed = ConfigArgs {
            loader_speed: Some(9),
            ..ConfigArgs::default()
        };
        assert!(bad_speed.resolve().is_err());
    }

    #[test]
    fn presets_round_trip_through_names() {
        for (name, policy) in BalancingPolicy::presets() {
            assert_eq!(preset(name).expect("known preset"), policy);
            assert_eq!(preset_name(policy), name);
        }
    }
}
