//! Anonymized per-install identifier.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Salt prepended to the machine ID before hashing.
const SALT: &str = "gnome-info-collect";

pub const DEFAULT_MACHINE_ID_PATH: &str = "/etc/machine-id";

/// Inputs for the salted machine-ID hash.
#[derive(Debug, Clone)]
pub struct MachineIdentity {
    machine_id_path: PathBuf,
    username: String,
}

impl MachineIdentity {
    pub fn new(machine_id_path: impl Into<PathBuf>, username: impl Into<String>) -> Self {
        Self {
            machine_id_path: machine_id_path.into(),
            username: username.into(),
        }
    }

    /// Identity of the calling user, hashing the given machine-ID file.
    pub fn for_current_user(machine_id_path: impl Into<PathBuf>) -> Result<Self> {
        let username = users::get_current_username()
            .context("could not determine the current username")?
            .to_string_lossy()
            .into_owned();
        Ok(Self::new(machine_id_path, username))
    }

    /// Lowercase hex SHA-256 of salt, machine-ID file contents and username.
    ///
    /// The file contents are hashed as read, trailing newline included.
    pub fn salted_hash(&self) -> Result<String> {
        let machine_id = std::fs::read_to_string(&self.machine_id_path)
            .with_context(|| format!("reading {}", self.machine_id_path.display()))?;
        Ok(salted_hash(&machine_id, &self.username))
    }
}

fn salted_hash(machine_id: &str, username: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(SALT.as_bytes());
    hasher.update(machine_id.as_bytes());
    hasher.update(username.as_bytes());
    format!("{:x}", hasher.finalize())
}
