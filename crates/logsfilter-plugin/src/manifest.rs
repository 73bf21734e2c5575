//! Plugin descriptor parsing and validation.
//!
//! Every plugin package carries a `plugin.toml` that names the plugin,
//! declares its version and points at the WASM binary.

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// File name of the descriptor inside a plugin package.
pub const MANIFEST_FILE: &str = "plugin.toml";

/// Plugin manifest parsed from `plugin.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub plugin: PluginMeta,
    pub build: BuildConfig,
}

/// Plugin metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMeta {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub min_host_version: Option<String>,
}

/// Build configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub wasm: String,
}

// ─── Validation helpers ─────────────────────────────────────────────

/// Validate a plugin name against `^[a-z][a-z0-9-]{1,63}$`.
fn validate_plugin_name(name: &str) -> Result<(), PluginError> {
    let len = name.len();
    if !(2..=64).contains(&len) {
        return Err(PluginError::InvalidManifest(format!(
            "plugin name must be 2-64 characters, got {len}"
        )));
    }

    let mut chars = name.chars();

    if let Some(first) = chars.next() {
        if !first.is_ascii_lowercase() {
            return Err(PluginError::InvalidManifest(format!(
                "plugin name must start with a lowercase letter, got '{first}'"
            )));
        }
    }

    for ch in chars {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
            return Err(PluginError::InvalidManifest(format!(
                "plugin name contains invalid character '{ch}'"
            )));
        }
    }

    Ok(())
}

fn validate_semver(value: &str, field_name: &str) -> Result<semver::Version, PluginError> {
    semver::Version::parse(value).map_err(|_| {
        PluginError::InvalidManifest(format!("{field_name} is not valid semver: '{value}'"))
    })
}

/// Validate that a path is safe (no `..` components, not absolute).
fn validate_path_safety(path: &str, field_name: &str) -> Result<(), PluginError> {
    let p = std::path::Path::new(path);
    if p.is_absolute() {
        return Err(PluginError::InvalidManifest(format!(
            "{field_name} must be a relative path, got absolute: '{path}'"
        )));
    }
    for component in p.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err(PluginError::InvalidManifest(format!(
                "{field_name} must not contain '..': '{path}'"
            )));
        }
    }
    Ok(())
}

impl PluginManifest {
    /// Parse a plugin manifest from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, PluginError> {
        let manifest: PluginManifest = toml::from_str(toml_str)?;
        Ok(manifest)
    }

    /// Validate all fields against the running host version.
    pub fn validate(&self, host_version: &semver::Version) -> Result<(), PluginError> {
        validate_plugin_name(&self.plugin.name)?;
        validate_semver(&self.plugin.version, "plugin.version")?;

        if let Some(ref description) = self.plugin.description {
            if description.len() > 500 {
                return Err(PluginError::InvalidManifest(format!(
                    "plugin.description must be at most 500 characters, got {}",
                    description.len()
                )));
            }
        }

        if let Some(ref min_ver) = self.plugin.min_host_version {
            let required = validate_semver(min_ver, "plugin.min_host_version")?;
            if *host_version < required {
                return Err(PluginError::InvalidManifest(format!(
                    "plugin requires host {required} or newer, running {host_version}"
                )));
            }
        }

        validate_path_safety(&self.build.wasm, "build.wasm")?;

        if !self.build.wasm.ends_with(".wasm") {
            return Err(PluginError::InvalidManifest(format!(
                "build.wasm must end with '.wasm', got '{}'",
                self.build.wasm
            )));
        }

        Ok(())
    }

    /// Parse and validate a plugin manifest from a TOML string.
    pub fn parse_and_validate(
        toml_str: &str,
        host_version: &semver::Version,
    ) -> Result<Self, PluginError> {
        let manifest = Self::parse(toml_str)?;
        manifest.validate(host_version)?;
        Ok(manifest)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
