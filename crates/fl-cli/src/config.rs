//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use fl_core::{
    DEFAULT_PARALLEL_THRESHOLD, DEFAULT_TIMESTAMP_FORMATS, KindLabels, MalformedPolicy,
    NormalizeOptions, ReconcileOptions,
};
use fl_source::SourceConfig;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Movement log to read when `--input` is not given. Unset means stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<PathBuf>,

    /// Accepted timestamp layouts, tried in order.
    pub timestamp_formats: Vec<String>,

    /// Kind column value for departures.
    pub departure_label: String,

    /// Kind column value for arrivals.
    pub arrival_label: String,

    /// What to do with malformed rows.
    pub malformed: MalformedPolicy,

    /// Batch size from which groups are paired in parallel.
    pub parallel_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        let labels = KindLabels::default();
        Self {
            input_path: None,
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(ToString::to_string)
                .collect(),
            departure_label: labels.departure,
            arrival_label: labels.arrival,
            malformed: MalformedPolicy::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but this is only called once at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (FL_*)
        figment = figment.merge(Env::prefixed("FL_"));

        figment.extract()
    }

    pub fn labels(&self) -> KindLabels {
        KindLabels {
            departure: self.departure_label.clone(),
            arrival: self.arrival_label.clone(),
        }
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            normalize: NormalizeOptions {
                timestamp_formats: self.timestamp_formats.clone(),
                labels: self.labels(),
            },
            parallel_threshold: self.parallel_threshold,
        }
    }

    /// Source settings; `input` overrides `input_path`.
    pub fn source_config(&self, input: Option<&Path>, policy: MalformedPolicy) -> SourceConfig {
        SourceConfig {
            path: input
                .map(Path::to_path_buf)
                .or_else(|| self.input_path.clone()),
            labels: self.labels(),
            strict: policy == MalformedPolicy::Abort,
        }
    }
}

/// Returns the platform-specific config directory for fleetlog.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("fleetlog"))
}
