//! Parental-controls application filter (malcontent).
//!
//! The filter lives on the user's AccountsService object as the `AppFilter`
//! property, typed `(bas)`: an allow-list flag and a list of entries. Entries
//! are absolute executable paths, flatpak refs (`app/<id>/<arch>/<branch>`)
//! or content types.

use anyhow::{anyhow, Context, Result};
use tracing::debug;
use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

use super::introspect;
use crate::apps::DesktopEntry;
use crate::tools;

const ACCOUNTS_BUS_NAME: &str = "org.freedesktop.Accounts";
const APP_FILTER_INTERFACE: &str = "com.endlessm.ParentalControls.AppFilter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppFilter {
    pub allowlist: bool,
    pub entries: Vec<String>,
}

/// Outcome of probing for a parental-controls filter.
#[derive(Debug)]
pub enum FilterProbe {
    /// The subsystem is not installed or exposes no filter for this user.
    Absent,
    /// The subsystem is installed but reading the filter failed.
    Failed(anyhow::Error),
    Present(AppFilter),
}

impl AppFilter {
    fn listed(&self, item: &str) -> bool {
        self.entries.iter().any(|e| e == item)
    }

    fn lists_flatpak(&self, app_id: &str) -> bool {
        self.entries.iter().any(|e| {
            e.strip_prefix("app/")
                .and_then(|rest| rest.split('/').next())
                .is_some_and(|id| id == app_id)
        })
    }

    fn admits(&self, listed: bool) -> bool {
        listed == self.allowlist
    }

    /// Whether the entry may be shown to the user.
    ///
    /// Its resolved executable, its flatpak ID and each declared content type
    /// are checked on their own. An allow-list admits an identifier when it is
    /// listed; a block-list when it is not. The entry is rejected as soon as
    /// one present identifier is not admitted, so an entry with no
    /// identifiers is allowed.
    pub fn is_entry_allowed(&self, entry: &DesktopEntry) -> bool {
        if let Some(path) = entry.executable().and_then(|exe| tools::find(&exe)) {
            if !self.admits(self.listed(&path.to_string_lossy())) {
                return false;
            }
        }
        if let Some(id) = entry.flatpak_id.as_deref() {
            if !self.admits(self.lists_flatpak(id)) {
                return false;
            }
        }
        entry
            .mime_types
            .iter()
            .all(|t| self.admits(self.listed(t)))
    }
}

/// Probe and read the calling user's filter from the system bus.
pub fn probe(conn: &Connection, uid: u32) -> FilterProbe {
    match super::service_available(conn, ACCOUNTS_BUS_NAME) {
        Ok(true) => {}
        Ok(false) => return FilterProbe::Absent,
        Err(e) => return FilterProbe::Failed(e),
    }

    let user_path = match find_user(conn, uid) {
        Ok(path) => path,
        Err(e) => return FilterProbe::Failed(e),
    };

    match introspect::introspect(conn, ACCOUNTS_BUS_NAME, user_path.as_str()) {
        Ok(xml) if introspect::interfaces(&xml).iter().any(|i| i == APP_FILTER_INTERFACE) => {}
        Ok(_) => {
            debug!("parental controls not installed");
            return FilterProbe::Absent;
        }
        Err(e) => return FilterProbe::Failed(e),
    }

    match read_filter(conn, user_path.as_str()) {
        Ok(filter) => FilterProbe::Present(filter),
        Err(e) => FilterProbe::Failed(e),
    }
}

fn find_user(conn: &Connection, uid: u32) -> Result<OwnedObjectPath> {
    let proxy = Proxy::new(
        conn,
        ACCOUNTS_BUS_NAME,
        "/org/freedesktop/Accounts",
        "org.freedesktop.Accounts",
    )
    .context("creating AccountsService proxy")?;
    let path: OwnedObjectPath = proxy
        .call("FindUserById", &(i64::from(uid),))
        .with_context(|| format!("looking up user {}", uid))?;
    Ok(path)
}

fn read_filter(conn: &Connection, user_path: &str) -> Result<AppFilter> {
    let proxy = Proxy::new(
        conn,
        ACCOUNTS_BUS_NAME,
        user_path,
        "org.freedesktop.DBus.Properties",
    )
    .context("creating properties proxy for parental controls")?;
    let value: OwnedValue = proxy
        .call("Get", &(APP_FILTER_INTERFACE, "AppFilter"))
        .context("reading AppFilter property")?;
    decode(&value)
}

fn decode(value: &OwnedValue) -> Result<AppFilter> {
    let Value::Structure(structure) = &**value else {
        return Err(anyhow!("AppFilter is not a structure"));
    };
    match structure.fields() {
        [Value::Bool(allowlist), Value::Array(items)] => {
            let entries = items
                .iter()
                .filter_map(|item| match item {
                    Value::Str(s) => Some(s.as_str().to_string()),
                    _ => None,
                })
                .collect();
            Ok(AppFilter {
                allowlist: *allowlist,
                entries,
            })
        }
        _ => Err(anyhow!("AppFilter has an unexpected signature")),
    }
}
