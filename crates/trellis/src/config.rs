// File: src/config.rs
// Purpose: Configuration parsing from trellis.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;
use trellis_router::{MatchOptions, MatchPolicy};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

/// Routing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Directory containing the route hierarchy (default: "routes")
    #[serde(default = "default_routes_dir")]
    pub routes_dir: String,

    /// Case-insensitive matching of literal segments
    #[serde(default)]
    pub case_insensitive: bool,

    /// Entry ordering policy: "ranked" or "declaration"
    #[serde(default = "default_match_policy")]
    pub match_policy: String,
}

/// Build output configuration, consumed by deployment adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Directory adapters write packaging files into (default: "dist")
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_routes_dir() -> String {
    "routes".to_string()
}

fn default_match_policy() -> String {
    "ranked".to_string()
}

fn default_output_dir() -> String {
    "dist".to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            routes_dir: default_routes_dir(),
            case_insensitive: false,
            match_policy: default_match_policy(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl RoutingConfig {
    /// Translates this configuration into matcher options.
    pub fn match_options(&self) -> MatchOptions {
        let policy = match self.match_policy.as_str() {
            "ranked" => MatchPolicy::Ranked,
            "declaration" => MatchPolicy::DeclarationOrder,
            other => {
                warn!(policy = other, "unknown match policy, using ranked");
                MatchPolicy::Ranked
            }
        };
        MatchOptions {
            case_insensitive: self.case_insensitive,
            policy,
        }
    }
}

impl Config {
    /// Loads configuration from a `trellis.toml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml(&raw)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parsing trellis.toml")
    }
}
