//! Plugin package discovery and WASM binary validation.
//!
//! A package is a directory holding a `plugin.toml` descriptor and the
//! WASM binary it references. The path handed to the loader may point at
//! the directory or at the descriptor itself.

use std::path::{Path, PathBuf};

use crate::error::PluginError;
use crate::manifest::{PluginManifest, MANIFEST_FILE};

/// WASM magic bytes: `\0asm`
const WASM_MAGIC: &[u8; 4] = b"\0asm";

/// Allowed WASM import namespaces. Imports outside these are rejected.
const ALLOWED_IMPORT_NAMESPACES: &[&str] = &[
    "env",
    "extism:host/env",
    "wasi_snapshot_preview1",
    "wasi_unstable",
];

/// A validated plugin package on disk.
#[derive(Debug, Clone)]
pub struct PluginPackage {
    pub manifest: PluginManifest,
    pub root: PathBuf,
    pub wasm_path: PathBuf,
}

impl PluginPackage {
    /// Locate the descriptor under `path`, validate it and the WASM binary.
    pub fn open(path: &Path, max_wasm_size: u64) -> Result<Self, PluginError> {
        let (root, manifest_path) = if path.is_dir() {
            (path.to_path_buf(), path.join(MANIFEST_FILE))
        } else {
            let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (root, path.to_path_buf())
        };

        if manifest_path.file_name().and_then(|n| n.to_str()) != Some(MANIFEST_FILE)
            || !manifest_path.is_file()
        {
            return Err(PluginError::Manifest(format!(
                "no {MANIFEST_FILE} descriptor found at '{}'",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&manifest_path)?;
        let manifest = PluginManifest::parse_and_validate(&content, &host_version())?;

        let wasm_path = root.join(&manifest.build.wasm);
        validate_wasm(&wasm_path, max_wasm_size)?;

        Ok(Self {
            manifest,
            root,
            wasm_path,
        })
    }

    pub fn name(&self) -> &str {
        &self.manifest.plugin.name
    }
}

/// Version of this crate, checked against `min_host_version`.
pub fn host_version() -> semver::Version {
    semver::Version::parse(env!("CARGO_PKG_VERSION")).unwrap_or_else(|_| semver::Version::new(0, 0, 0))
}

/// Check size, magic bytes and import namespaces of a WASM binary.
fn validate_wasm(wasm_path: &Path, max_wasm_size: u64) -> Result<(), PluginError> {
    let metadata = std::fs::metadata(wasm_path).map_err(|e| {
        PluginError::WasmValidation(format!(
            "failed to read WASM metadata for '{}': {e}",
            wasm_path.display()
        ))
    })?;

    let size = metadata.len();
    if size > max_wasm_size {
        return Err(PluginError::WasmValidation(format!(
            "WASM binary too large: {size} bytes (max: {max_wasm_size} bytes)"
        )));
    }

    let wasm_bytes = std::fs::read(wasm_path)
        .map_err(|e| PluginError::WasmValidation(format!("failed to read WASM binary: {e}")))?;

    if wasm_bytes.len() < 4 || &wasm_bytes[..4] != WASM_MAGIC {
        return Err(PluginError::WasmValidation(
            "invalid WASM binary: magic bytes mismatch".into(),
        ));
    }

    validate_wasm_imports(&wasm_bytes)
}

fn validate_wasm_imports(wasm_bytes: &[u8]) -> Result<(), PluginError> {
    use wasmparser::{Parser, Payload};

    for payload in Parser::new(0).parse_all(wasm_bytes) {
        let payload =
            payload.map_err(|e| PluginError::WasmValidation(format!("failed to parse WASM: {e}")))?;

        if let Payload::ImportSection(reader) = payload {
            for import in reader {
                let import = import.map_err(|e| {
                    PluginError::WasmValidation(format!("failed to read import: {e}"))
                })?;

                if !ALLOWED_IMPORT_NAMESPACES.contains(&import.module) {
                    return Err(PluginError::WasmValidation(format!(
                        "unauthorized import namespace: '{}' (function: '{}'); \
                         allowed namespaces: {:?}",
                        import.module, import.name, ALLOWED_IMPORT_NAMESPACES
                    )));
                }
            }
        }
    }

    Ok(())
}
