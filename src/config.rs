use std::path::PathBuf;

use thiserror::Error;

use crate::tag::classifier::ArchMarkers;
use crate::tag::registries::{github_packages, mcr};
use crate::tag::selection::{SelectionOptions, VersionWindow};
use crate::tag::semver::parse_tag_version;

// =============================================================================
// Selection defaults
// =============================================================================

/// Number of most recent release lines kept when no window is configured
pub const DEFAULT_FLOOR_COUNT: usize = 10;

/// Prefix a tag must start with to be considered a version tag
pub const DEFAULT_TAG_PREFIX: &str = "v";

/// `TAG_PREFIX` value that disables the prefix check
pub const ANY_PREFIX: &str = "*";

pub const DEFAULT_ARM64_MARKER: &str = "arm64";
pub const DEFAULT_AMD64_MARKER: &str = "amd64";

// =============================================================================
// HTTP
// =============================================================================

pub const USER_AGENT: &str = "tag-matrix";

/// Value sent in the `X-GitHub-Api-Version` header
pub const GITHUB_API_VERSION: &str = "2022-11-28";

// =============================================================================
// Environment keys
// =============================================================================

pub const ENV_IMAGE_NAME: &str = "IMAGE_NAME";
pub const ENV_OUTPUT: &str = "GITHUB_OUTPUT";
pub const ENV_LIMIT: &str = "LIMIT";
pub const ENV_MIN_VERSION: &str = "MIN_VERSION";
pub const ENV_TAG_PREFIX: &str = "TAG_PREFIX";
pub const ENV_STATE_FILE: &str = "STATE_FILE";
pub const ENV_DOWNSTREAM_ORG: &str = "DOWNSTREAM_ORG";
pub const ENV_DOWNSTREAM_PACKAGE: &str = "DOWNSTREAM_PACKAGE";
pub const ENV_TOKEN: &str = "GITHUB_TOKEN";
pub const ENV_ARM64_MARKER: &str = "ARM64_MARKER";
pub const ENV_AMD64_MARKER: &str = "AMD64_MARKER";
pub const ENV_SOURCE_REGISTRY_URL: &str = "SOURCE_REGISTRY_URL";
pub const ENV_DOWNSTREAM_API_URL: &str = "DOWNSTREAM_API_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} and {1} cannot be used together")]
    Conflict(&'static str, &'static str),
}

/// Where already-processed tags are read from
#[derive(Clone, PartialEq, Eq)]
pub enum BaselineConfig {
    /// Every selected tag is emitted
    None,
    /// Local JSON state file, rewritten after each run
    StateFile(PathBuf),
    /// Live listing of the downstream GitHub package
    Downstream {
        org: String,
        package: String,
        token: Option<String>,
    },
}

impl std::fmt::Debug for BaselineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineConfig::None => f.write_str("None"),
            BaselineConfig::StateFile(path) => f.debug_tuple("StateFile").field(path).finish(),
            BaselineConfig::Downstream {
                org,
                package,
                token,
            } => f
                .debug_struct("Downstream")
                .field("org", org)
                .field("package", package)
                .field("token", &token.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Run configuration, built once from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Image path in the source registry (e.g., "dotnet/runtime")
    pub image_name: String,
    /// File the `key=value` results are appended to
    pub output_path: PathBuf,
    pub selection: SelectionOptions,
    pub baseline: BaselineConfig,
    pub source_registry_url: String,
    pub downstream_api_url: String,
}

impl Config {
    /// Reads the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let image_name = require(ENV_IMAGE_NAME)?;
        let output_path = PathBuf::from(require(ENV_OUTPUT)?);

        let window = match (get(ENV_MIN_VERSION), get(ENV_LIMIT)) {
            (Some(min), _) => VersionWindow::MinVersion(parse_tag_version(&min).ok_or_else(
                || ConfigError::Invalid {
                    key: ENV_MIN_VERSION,
                    value: min.clone(),
                    reason: "expected MAJOR.MINOR.PATCH".to_string(),
                },
            )?),
            (None, Some(limit)) => VersionWindow::FloorCount(parse_floor_count(&limit)?),
            (None, None) => VersionWindow::FloorCount(DEFAULT_FLOOR_COUNT),
        };

        let require_prefix = match get(ENV_TAG_PREFIX) {
            Some(prefix) if prefix == ANY_PREFIX => None,
            Some(prefix) => Some(prefix),
            None => Some(DEFAULT_TAG_PREFIX.to_string()),
        };

        let markers = ArchMarkers {
            arm64: get(ENV_ARM64_MARKER).unwrap_or_else(|| DEFAULT_ARM64_MARKER.to_string()),
            amd64: get(ENV_AMD64_MARKER).unwrap_or_else(|| DEFAULT_AMD64_MARKER.to_string()),
        };
        if markers.arm64.contains(&markers.amd64) || markers.amd64.contains(&markers.arm64) {
            return Err(ConfigError::Invalid {
                key: ENV_AMD64_MARKER,
                value: markers.amd64,
                reason: format!("overlaps with {}={}", ENV_ARM64_MARKER, markers.arm64),
            });
        }

        let baseline = match (
            get(ENV_STATE_FILE),
            get(ENV_DOWNSTREAM_ORG),
            get(ENV_DOWNSTREAM_PACKAGE),
        ) {
            (Some(_), Some(_), _) => {
                return Err(ConfigError::Conflict(ENV_STATE_FILE, ENV_DOWNSTREAM_ORG));
            }
            (Some(_), None, Some(_)) => {
                return Err(ConfigError::Conflict(ENV_STATE_FILE, ENV_DOWNSTREAM_PACKAGE));
            }
            (Some(path), None, None) => BaselineConfig::StateFile(PathBuf::from(path)),
            (None, Some(org), Some(package)) => BaselineConfig::Downstream {
                org,
                package,
                token: get(ENV_TOKEN),
            },
            (None, Some(_), None) => return Err(ConfigError::Missing(ENV_DOWNSTREAM_PACKAGE)),
            (None, None, Some(_)) => return Err(ConfigError::Missing(ENV_DOWNSTREAM_ORG)),
            (None, None, None) => BaselineConfig::None,
        };

        Ok(Self {
            image_name,
            output_path,
            selection: SelectionOptions {
                require_prefix,
                window,
                markers,
            },
            baseline,
            source_registry_url: get(ENV_SOURCE_REGISTRY_URL)
                .unwrap_or_else(|| mcr::DEFAULT_BASE_URL.to_string()),
            downstream_api_url: get(ENV_DOWNSTREAM_API_URL)
                .unwrap_or_else(|| github_packages::DEFAULT_BASE_URL.to_string()),
        })
    }
}

fn parse_floor_count(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ConfigError::Invalid {
            key: ENV_LIMIT,
            value: value.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}
