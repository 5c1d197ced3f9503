//! # Utility Module
//!
//! Small helpers shared by the binary and the library: CLI backend mapping,
//! output directory checks and content hashing.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Result, anyhow};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::export::ExportBackendKind;

/// Convert CLI export backend to internal enum
pub fn backend_from_cli(backend: crate::cli::ExportBackend) -> ExportBackendKind {
    match backend {
        crate::cli::ExportBackend::Jsonl => ExportBackendKind::Jsonl,
        crate::cli::ExportBackend::Csv => ExportBackendKind::Csv,
        crate::cli::ExportBackend::Parquet => ExportBackendKind::Parquet,
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Ensure output directory exists and is writable, warning on unsafe permissions.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_dir() {
            return Err(anyhow!(
                "output path is not a directory: {}",
                path.display()
            ));
        }
    } else {
        std::fs::create_dir_all(path)?;
    }

    let probe_path = path.join(".watchlens_write_probe");
    match OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&probe_path)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe_path);
        }
        Err(err) => {
            return Err(anyhow!(
                "output directory is not writable: {} ({})",
                path.display(),
                err
            ));
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)?.permissions().mode();
        if mode & 0o002 != 0 {
            warn!("output directory is world-writable: {}", path.display());
        }
    }

    Ok(())
}
