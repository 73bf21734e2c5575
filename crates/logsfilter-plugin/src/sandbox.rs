//! Extism runtime for a single plugin package.
//!
//! Every package gets its own instance, capped in linear memory and in fuel
//! per call. Listener proxies talk to the package only through
//! [`PluginSandbox::call_json`] and [`PluginSandbox::query_json`].

use std::path::Path;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PluginError;

const WASM_PAGE_SIZE: usize = 64 * 1024;
const MIB: usize = 1024 * 1024;

const DEFAULT_MEMORY_LIMIT_MB: usize = 32;
const DEFAULT_FUEL_LIMIT: u64 = 10_000_000;
const DEFAULT_MAX_WASM_SIZE_MB: u64 = 50;

/// Resource limits applied to every plugin sandbox.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Linear memory cap in bytes.
    pub memory_limit: usize,
    /// Fuel granted to each export call.
    pub fuel_limit: u64,
    /// Largest accepted `.wasm` file in bytes.
    pub max_wasm_size: u64,
    /// Broker clients usually need WASI for sockets and clocks.
    pub wasi_enabled: bool,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            memory_limit: DEFAULT_MEMORY_LIMIT_MB * MIB,
            fuel_limit: DEFAULT_FUEL_LIMIT,
            max_wasm_size: DEFAULT_MAX_WASM_SIZE_MB * MIB as u64,
            wasi_enabled: false,
        }
    }
}

impl SandboxConfig {
    /// Limits from `EVENT_PLUGIN_*` variables, defaulting what is unset or
    /// unparsable.
    pub fn from_env() -> Self {
        Self {
            memory_limit: env_parse("EVENT_PLUGIN_MEMORY_LIMIT_MB")
                .unwrap_or(DEFAULT_MEMORY_LIMIT_MB)
                * MIB,
            fuel_limit: env_parse("EVENT_PLUGIN_FUEL_LIMIT").unwrap_or(DEFAULT_FUEL_LIMIT),
            max_wasm_size: env_parse("EVENT_PLUGIN_MAX_WASM_SIZE_MB")
                .unwrap_or(DEFAULT_MAX_WASM_SIZE_MB)
                * MIB as u64,
            wasi_enabled: std::env::var("EVENT_PLUGIN_WASI_ENABLED")
                .is_ok_and(|v| v.eq_ignore_ascii_case("true")),
        }
    }

    fn memory_pages(&self) -> u32 {
        u32::try_from(self.memory_limit / WASM_PAGE_SIZE).unwrap_or(u32::MAX)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

/// One package's Extism instance.
pub struct PluginSandbox {
    plugin: extism::Plugin,
    plugin_name: String,
}

impl PluginSandbox {
    /// Instantiate the module at `wasm_path`.
    pub fn load(wasm_path: &Path, config: &SandboxConfig, name: &str) -> Result<Self, PluginError> {
        let wasm = std::fs::read(wasm_path)?;
        Self::from_bytes(wasm, config, name)
    }

    pub fn from_bytes(
        wasm: impl Into<Vec<u8>>,
        config: &SandboxConfig,
        name: &str,
    ) -> Result<Self, PluginError> {
        if config.wasi_enabled {
            tracing::warn!(plugin = %name, "WASI enabled, plugin can reach network and environment");
        }

        let manifest = extism::Manifest::new([extism::Wasm::data(wasm.into())])
            .with_memory_max(config.memory_pages());

        let plugin = extism::PluginBuilder::new(manifest)
            .with_wasi(config.wasi_enabled)
            .with_fuel_limit(config.fuel_limit)
            .build()
            .map_err(|e| PluginError::Sandbox(e.to_string()))?;

        Ok(Self {
            plugin,
            plugin_name: name.to_string(),
        })
    }

    /// Call an export with raw bytes in and out.
    pub fn call(&mut self, function_name: &str, input: &[u8]) -> Result<Vec<u8>, PluginError> {
        self.plugin
            .call::<&[u8], Vec<u8>>(function_name, input)
            .map_err(|e| call_failure(&self.plugin_name, e.to_string()))
    }

    /// Call an export with a JSON document as input. Output is discarded.
    pub fn call_json<I: Serialize>(
        &mut self,
        function_name: &str,
        input: &I,
    ) -> Result<(), PluginError> {
        let input = serde_json::to_vec(input)?;
        self.call(function_name, &input).map(drop)
    }

    /// Call an input-less export and decode its JSON output.
    pub fn query_json<O: DeserializeOwned>(&mut self, function_name: &str) -> Result<O, PluginError> {
        let output = self.call(function_name, &[])?;
        Ok(serde_json::from_slice(&output)?)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.plugin.function_exists(name)
    }

    pub fn name(&self) -> &str {
        &self.plugin_name
    }
}

/// Map an Extism call error onto the resource limit it hit, if any.
fn call_failure(plugin: &str, message: String) -> PluginError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("fuel") {
        PluginError::FuelExhausted(plugin.to_string())
    } else if lower.contains("memory") {
        PluginError::MemoryExceeded(plugin.to_string())
    } else {
        PluginError::Sandbox(message)
    }
}
