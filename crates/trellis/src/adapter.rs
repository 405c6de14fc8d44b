// File: src/adapter.rs
// Purpose: The two-valued contract between the manifest and deployment adapters

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;
use trellis_router::CompiledManifest;

/// Everything an adapter gets to see: the compiled server entry
/// identifiers (read-only, opaque, filename-safe) and the output
/// directory. Adapters package; they never influence matching or
/// composition.
#[derive(Debug, Clone)]
pub struct AdapterInput {
    server_entries: Vec<String>,
    output_dir: PathBuf,
}

impl AdapterInput {
    pub fn new(manifest: &CompiledManifest, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            server_entries: manifest.server_entries(),
            output_dir: output_dir.into(),
        }
    }

    pub fn server_entries(&self) -> &[String] {
        &self.server_entries
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Selects one entry identifier by prefix match, the adapter-side
    /// lookup convention.
    pub fn find_entry(&self, prefix: &str) -> Option<&str> {
        self.server_entries
            .iter()
            .find(|entry| entry.starts_with(prefix))
            .map(String::as_str)
    }
}

/// A host-specific packaging step.
pub trait DeploymentAdapter {
    fn name(&self) -> &'static str;

    /// Emits packaging files into the output directory.
    fn package(&self, input: &AdapterInput) -> Result<()>;
}

/// Reference adapter: writes a JSON function-trigger descriptor for the
/// server entry matching a configured route prefix.
#[derive(Debug, Clone)]
pub struct FunctionTriggerAdapter {
    pub route_prefix: String,
}

impl DeploymentAdapter for FunctionTriggerAdapter {
    fn name(&self) -> &'static str {
        "function-trigger"
    }

    fn package(&self, input: &AdapterInput) -> Result<()> {
        let Some(entry) = input.find_entry(&self.route_prefix) else {
            bail!(
                "no server entry matches prefix `{}` (have {})",
                self.route_prefix,
                input.server_entries().len()
            );
        };

        let descriptor = json!({
            "entry": entry,
            "trigger": {
                "kind": "http",
                "methods": ["GET", "POST", "PUT", "PATCH", "DELETE"],
            },
        });

        fs::create_dir_all(input.output_dir()).with_context(|| {
            format!("creating output directory {}", input.output_dir().display())
        })?;
        let target = input.output_dir().join(format!("{entry}.trigger.json"));
        fs::write(&target, serde_json::to_string_pretty(&descriptor)?)
            .with_context(|| format!("writing trigger descriptor {}", target.display()))?;

        info!(adapter = self.name(), entry, path = %target.display(), "packaged server entry");
        Ok(())
    }
}
