//! Versioned on-disk copy of a validated registry.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;
use crate::registry::model::Team;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RegistrySnapshot {
    version: u32,
    teams: Vec<Team>,
    error_logs: Vec<ValidationError>,
}

/// Reads a snapshot. Returns `None` when the file is missing or was written
/// by a different snapshot version.
pub fn load(path: &Path) -> Result<Option<(Vec<Team>, Vec<ValidationError>)>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read snapshot {}", path.display())),
    };
    let snapshot: RegistrySnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parse snapshot {}", path.display()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        warn!(
            path = %path.display(),
            found = snapshot.version,
            expected = SNAPSHOT_VERSION,
            "Ignoring snapshot from another version"
        );
        return Ok(None);
    }
    Ok(Some((snapshot.teams, snapshot.error_logs)))
}

/// Writes a snapshot through a temp file so a crash never leaves half a file.
pub fn save(path: &Path, teams: &[Team], error_logs: &[ValidationError]) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).context("create snapshot dir")?;
        }
    }
    let snapshot = RegistrySnapshot {
        version: SNAPSHOT_VERSION,
        teams: teams.to_vec(),
        error_logs: error_logs.to_vec(),
    };
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(&snapshot).context("serialize snapshot")?;
    fs::write(&tmp, json).context("write snapshot")?;
    fs::rename(&tmp, path).context("swap snapshot")?;
    Ok(())
}
