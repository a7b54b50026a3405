//! Online account providers from the GNOME Online Accounts daemon.
//!
//! Two interchangeable sources produce the same flat list of provider names.
//! [`select`] probes the daemon and picks one.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::debug;
use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};

use super::introspect;

const GOA_BUS_NAME: &str = "org.gnome.OnlineAccounts";
const GOA_ROOT_PATH: &str = "/org/gnome/OnlineAccounts";
const GOA_ACCOUNTS_PATH: &str = "/org/gnome/OnlineAccounts/Accounts";
const ACCOUNT_INTERFACE: &str = "org.gnome.OnlineAccounts.Account";
const OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";

pub trait AccountsSource {
    /// Human-readable provider name of every configured account.
    fn provider_names(&self) -> Result<Vec<String>>;
}

type ManagedObjects = HashMap<OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>>;

/// Reads every account in one `GetManagedObjects` call.
pub struct ObjectManagerAccounts<'a> {
    conn: &'a Connection,
}

impl AccountsSource for ObjectManagerAccounts<'_> {
    fn provider_names(&self) -> Result<Vec<String>> {
        let proxy = Proxy::new(
            self.conn,
            GOA_BUS_NAME,
            GOA_ROOT_PATH,
            OBJECT_MANAGER_INTERFACE,
        )
        .context("creating ObjectManager proxy for online accounts")?;
        let objects: ManagedObjects = proxy
            .call("GetManagedObjects", &())
            .context("calling GetManagedObjects on online accounts")?;
        Ok(managed_provider_names(&objects))
    }
}

/// Provider names of the account objects in a `GetManagedObjects` reply, in
/// object path order.
fn managed_provider_names(objects: &ManagedObjects) -> Vec<String> {
    let mut paths: Vec<&OwnedObjectPath> = objects.keys().collect();
    paths.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let names = paths.into_iter().map(|path| {
        objects
            .get(path)
            .and_then(|ifaces| ifaces.get(ACCOUNT_INTERFACE))
            .and_then(|props| props.get("ProviderName"))
            .and_then(string_value)
    });
    collect_names(names)
}

/// Walks the account object tree and reads `ProviderName` per account.
pub struct IntrospectedAccounts<'a> {
    conn: &'a Connection,
}

impl AccountsSource for IntrospectedAccounts<'_> {
    fn provider_names(&self) -> Result<Vec<String>> {
        let xml = introspect::introspect(self.conn, GOA_BUS_NAME, GOA_ACCOUNTS_PATH)?;
        let mut children = introspect::child_nodes(&xml);
        children.sort();

        let mut names = Vec::with_capacity(children.len());
        for child in children {
            let path = format!("{}/{}", GOA_ACCOUNTS_PATH, child);
            names.push(self.provider_name(&path)?);
        }
        Ok(collect_names(names))
    }
}

impl IntrospectedAccounts<'_> {
    fn provider_name(&self, path: &str) -> Result<Option<String>> {
        let proxy = Proxy::new(
            self.conn,
            GOA_BUS_NAME,
            path,
            "org.freedesktop.DBus.Properties",
        )
        .with_context(|| format!("creating properties proxy for {}", path))?;
        let reply: zbus::Result<OwnedValue> =
            proxy.call("Get", &(ACCOUNT_INTERFACE, "ProviderName"));
        match reply {
            Ok(value) => Ok(string_value(&value)),
            Err(e) if super::is_absent(&e) => {
                debug!(path, "object is not an account");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("reading ProviderName of {}", path)),
        }
    }
}

fn string_value(value: &OwnedValue) -> Option<String> {
    match &**value {
        Value::Str(s) => Some(s.as_str().to_string()),
        _ => None,
    }
}

/// Objects without a provider name are skipped.
fn collect_names(names: impl IntoIterator<Item = Option<String>>) -> Vec<String> {
    names.into_iter().flatten().collect()
}

/// Pick an accounts source, or `None` when the daemon is not available.
pub fn select(conn: &Connection) -> Result<Option<Box<dyn AccountsSource + '_>>> {
    if !super::service_available(conn, GOA_BUS_NAME)? {
        debug!("online accounts daemon not available");
        return Ok(None);
    }

    let xml = introspect::introspect(conn, GOA_BUS_NAME, GOA_ROOT_PATH)?;
    if introspect::interfaces(&xml)
        .iter()
        .any(|i| i == OBJECT_MANAGER_INTERFACE)
    {
        debug!("reading online accounts through ObjectManager");
        Ok(Some(Box::new(ObjectManagerAccounts { conn })))
    } else {
        debug!("reading online accounts through introspection");
        Ok(Some(Box::new(IntrospectedAccounts { conn })))
    }
}
