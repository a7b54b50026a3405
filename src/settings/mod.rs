//! Desktop settings store access.
//!
//! The store is reached through the `gsettings` tool so no GLib bindings are
//! needed. Callers receive a [`SettingsProvider`] rather than a global handle.

pub mod variant;

use std::cell::OnceCell;

use thiserror::Error;
use tracing::{debug, warn};

use crate::tools::{self, CommandError, CommandRunner};
pub use variant::Variant;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings store is not available")]
    Unavailable,

    #[error("reading {schema} {key}")]
    Read {
        schema: String,
        key: String,
        #[source]
        source: CommandError,
    },

    #[error(transparent)]
    Parse(#[from] variant::ParseError),
}

pub trait SettingsProvider {
    /// Whether the schema is installed, relocatable schemas included.
    fn has_schema(&self, schema: &str) -> bool;

    fn has_key(&self, schema: &str, path: Option<&str>, key: &str) -> bool;

    /// Read a key. `path` selects the instance of a relocatable schema.
    fn get(&self, schema: &str, path: Option<&str>, key: &str) -> Result<Variant, SettingsError>;
}

/// [`SettingsProvider`] backed by the `gsettings` command.
///
/// The installed schema list is read once per instance.
pub struct GSettingsCli<'a> {
    runner: &'a dyn CommandRunner,
    schemas: OnceCell<Vec<String>>,
}

const GSETTINGS: &str = "gsettings";

impl<'a> GSettingsCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            schemas: OnceCell::new(),
        }
    }

    fn installed_schemas(&self) -> &[String] {
        self.schemas.get_or_init(|| {
            ["list-schemas", "list-relocatable-schemas"]
                .iter()
                .filter_map(|cmd| self.lines(&[*cmd]))
                .flatten()
                .collect()
        })
    }

    fn lines(&self, args: &[&str]) -> Option<Vec<String>> {
        match tools::run_checked(self.runner, GSETTINGS, args) {
            Ok(out) => Some(out.lines().map(|l| l.trim().to_string()).collect()),
            Err(CommandError::NotFound { .. }) => {
                debug!("gsettings is not installed");
                None
            }
            Err(e) => {
                debug!(error = %e, ?args, "gsettings query failed");
                None
            }
        }
    }
}

fn qualified_schema(schema: &str, path: Option<&str>) -> String {
    match path {
        Some(p) => format!("{}:{}", schema, p),
        None => schema.to_string(),
    }
}

impl SettingsProvider for GSettingsCli<'_> {
    fn has_schema(&self, schema: &str) -> bool {
        self.installed_schemas().iter().any(|s| s == schema)
    }

    fn has_key(&self, schema: &str, path: Option<&str>, key: &str) -> bool {
        let qualified = qualified_schema(schema, path);
        self.lines(&["list-keys", &qualified])
            .is_some_and(|keys| keys.iter().any(|k| k == key))
    }

    fn get(&self, schema: &str, path: Option<&str>, key: &str) -> Result<Variant, SettingsError> {
        let qualified = qualified_schema(schema, path);
        let out = tools::run_checked(self.runner, GSETTINGS, &["get", &qualified, key]).map_err(
            |source| match source {
                CommandError::NotFound { .. } => SettingsError::Unavailable,
                source => SettingsError::Read {
                    schema: qualified.clone(),
                    key: key.to_string(),
                    source,
                },
            },
        )?;
        Ok(Variant::parse(&out)?)
    }
}

/// Read a key if its schema and key exist, or `None` when either is absent.
///
/// Presence is checked first so hosts with older schemas never see a read
/// error for keys they do not have.
pub fn read_optional(
    settings: &dyn SettingsProvider,
    schema: &str,
    path: Option<&str>,
    key: &str,
) -> Option<Variant> {
    if !settings.has_schema(schema) {
        debug!(schema, "settings schema not installed");
        return None;
    }
    if !settings.has_key(schema, path, key) {
        debug!(schema, key, "settings key not present");
        return None;
    }
    match settings.get(schema, path, key) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, schema, key, "failed to read setting");
            None
        }
    }
}

pub fn read_bool(settings: &dyn SettingsProvider, schema: &str, key: &str) -> bool {
    read_bool_at(settings, schema, None, key)
}

pub fn read_bool_at(
    settings: &dyn SettingsProvider,
    schema: &str,
    path: Option<&str>,
    key: &str,
) -> bool {
    read_optional(settings, schema, path, key)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

pub fn read_strv(settings: &dyn SettingsProvider, schema: &str, key: &str) -> Vec<String> {
    read_optional(settings, schema, None, key)
        .and_then(|v| v.as_str_array().map(<[String]>::to_vec))
        .unwrap_or_default()
}

pub const SHARING_SCHEMA: &str = "org.gnome.settings-daemon.plugins.sharing.service";
const SHARING_PATH_BASE: &str = "/org/gnome/settings-daemon/plugins/sharing/";

/// Whether a sharing service has any enabled connections.
///
/// An empty `enabled-connections` array, or a missing schema, means disabled.
pub fn sharing_enabled(settings: &dyn SettingsProvider, service: &str) -> bool {
    let path = format!("{}{}/", SHARING_PATH_BASE, service);
    read_optional(settings, SHARING_SCHEMA, Some(&path), "enabled-connections")
        .is_some_and(|v| !v.is_empty_array())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::*;

    /// In-memory settings keyed by `schema[:path]` then key.
    #[derive(Default)]
    pub struct FakeSettings {
        schemas: HashMap<String, HashMap<String, String>>,
    }

    impl FakeSettings {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, schema: &str, path: Option<&str>, key: &str, text: &str) -> Self {
            self.schemas
                .entry(qualified_schema(schema, path))
                .or_default()
                .insert(key.to_string(), text.to_string());
            // The bare schema must be known for presence checks.
            self.schemas.entry(schema.to_string()).or_default();
            self
        }
    }

    impl SettingsProvider for FakeSettings {
        fn has_schema(&self, schema: &str) -> bool {
            self.schemas.contains_key(schema)
        }

        fn has_key(&self, schema: &str, path: Option<&str>, key: &str) -> bool {
            self.schemas
                .get(&qualified_schema(schema, path))
                .is_some_and(|keys| keys.contains_key(key))
        }

        fn get(
            &self,
            schema: &str,
            path: Option<&str>,
            key: &str,
        ) -> Result<Variant, SettingsError> {
            let text = self
                .schemas
                .get(&qualified_schema(schema, path))
                .and_then(|keys| keys.get(key))
                .ok_or(SettingsError::Unavailable)?;
            Ok(Variant::parse(text)?)
        }
    }
}
