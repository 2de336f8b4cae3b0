//! Layered application configuration.
//!
//! Settings are merged from, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory (e.g. `~/.config/dupesieve/` on Linux)
//! 3. `DUPESIEVE_*` environment variables (`DUPESIEVE_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! ```toml
//! io_threads = 2
//! hash_timeout_secs = 60
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! output = "json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, ScanArgs};
use crate::duplicates::FinderConfig;
use crate::scanner::WalkerConfig;

/// Prefix of the environment variables read as settings.
pub const ENV_PREFIX: &str = "DUPESIEVE_";

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing workers, which is also the cap on simultaneously open files.
    pub io_threads: usize,
    /// Per-file hash timeout in seconds; unset means wait forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_timeout_secs: Option<u64>,
    /// Abort on the first enumeration or full-hash error.
    pub strict: bool,
    /// Skip dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Gitignore-style patterns excluded from the walk.
    pub ignore_patterns: Vec<String>,
    /// Report format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            hash_timeout_secs: None,
            strict: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            output: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Merge defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    ///
    /// # Errors
    ///
    /// Fails if an explicit file is missing, or if any layer holds a value
    /// of the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                if !p.is_file() {
                    anyhow::bail!("Config file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            }
            None => Self::default_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(ref file) = file {
            log::debug!("Reading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        let config: Self = figment
            .extract()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Platform-specific location of `config.toml`, if one can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupesieve").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.io_threads == 0 {
            anyhow::bail!("io_threads must be at least 1");
        }
        if self.hash_timeout_secs == Some(0) {
            anyhow::bail!("hash_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Apply the flags given on the command line on top of this config.
    ///
    /// # Errors
    ///
    /// Fails if the merged settings are out of range.
    pub fn with_scan_args(mut self, args: &ScanArgs) -> Result<Self> {
        if let Some(threads) = args.io_threads {
            self.io_threads = usize::try_from(threads).unwrap_or(self.io_threads);
        }
        if let Some(secs) = args.hash_timeout {
            self.hash_timeout_secs = Some(secs);
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        self.strict |= args.strict;
        self.skip_hidden |= args.skip_hidden;
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        self.validate()?;
        Ok(self)
    }

    /// Per-file timeout as a duration.
    #[must_use]
    pub fn hash_timeout(&self) -> Option<Duration> {
        self.hash_timeout_secs.map(Duration::from_secs)
    }

    /// Build the finder configuration; size filters come from the scan flags.
    #[must_use]
    pub fn finder_config(&self, min_size: Option<u64>, max_size: Option<u64>) -> FinderConfig {
        let walker_config = WalkerConfig {
            skip_hidden: self.skip_hidden,
            min_size,
            max_size,
            ignore_patterns: self.ignore_patterns.clone(),
        };
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_strict(self.strict)
            .with_hash_timeout(self.hash_timeout())
            .with_walker_config(walker_config)
    }

    /// Render as TOML, in the format the config file accepts.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.io_threads, 4);
        assert_eq!(config.hash_timeout(), None);
        assert_eq!(config.output, OutputFormat::Text);
    }

    #[test]
    fn test_file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "dupesieve.toml",
                r#"
                    io_threads = 2
                    hash_timeout_secs = 10
                    ignore_patterns = ["*.tmp"]
                    output = "csv"
                "#,
            )?;
            jail.set_env("DUPESIEVE_IO_THREADS", "6");

            let config = Config::load(Some(Path::new("dupesieve.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.io_threads, 6);
            assert_eq!(config.hash_timeout(), Some(Duration::from_secs(10)));
            assert_eq!(config.ignore_patterns, vec!["*.tmp"]);
            assert_eq!(config.output, OutputFormat::Csv);
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "io_threads = 0")?;
            assert!(Config::load(Some(Path::new("bad.toml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_cli_flags_override() {
        let args = ScanArgs {
            path: "/x".to_string(),
            output: Some(OutputFormat::Json),
            io_threads: Some(1),
            hash_timeout: Some(5),
            strict: true,
            ignore_patterns: vec!["b".to_string()],
            ..Default::default()
        };
        let base = Config {
            ignore_patterns: vec!["a".to_string()],
            ..Default::default()
        };

        let config = base.with_scan_args(&args).unwrap();
        assert_eq!(config.io_threads, 1);
        assert_eq!(config.hash_timeout_secs, Some(5));
        assert_eq!(config.output, OutputFormat::Json);
        assert!(config.strict);
        assert!(!config.skip_hidden);
        assert_eq!(config.ignore_patterns, vec!["a", "b"]);
    }

    #[test]
    fn test_zero_timeout_flag_rejected_after_merge() {
        let args = ScanArgs {
            path: "/x".to_string(),
            hash_timeout: Some(0),
            ..Default::default()
        };

        let err = Config::default().with_scan_args(&args).unwrap_err();
        assert!(err.to_string().contains("hash_timeout_secs"));
    }

    #[test]
    fn test_finder_config_mapping() {
        let config = Config {
            io_threads: 3,
            hash_timeout_secs: Some(7),
            skip_hidden: true,
            ..Default::default()
        };
        let finder = config.finder_config(Some(10), None);
        assert_eq!(finder.io_threads, 3);
        assert_eq!(finder.hash_timeout, Some(Duration::from_secs(7)));
        assert!(finder.walker_config.skip_hidden);
        assert_eq!(finder.walker_config.min_size, Some(10));
    }

    #[test]
    fn test_to_toml_round_trips_through_loader() {
        let config = Config {
            io_threads: 8,
            output: OutputFormat::Json,
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("io_threads = 8"));
        assert!(text.contains("output = \"json\""));
        assert!(!text.contains("hash_timeout_secs"));

        Jail::expect_with(|jail| {
            jail.create_file("round.toml", &text)?;
            let loaded = Config::load(Some(Path::new("round.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(loaded, config);
            Ok(())
        });
    }
}
