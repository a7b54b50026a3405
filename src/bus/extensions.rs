//! GNOME Shell extension registry.

use std::collections::HashMap;

use anyhow::{Context, Result};
use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::{OwnedValue, Value};

/// Shell extension state code for an enabled, running extension.
pub const STATE_ENABLED: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub uuid: Option<String>,
    pub state: Option<f64>,
}

/// UUIDs of enabled extensions. Entries missing either field are skipped.
pub fn enabled_uuids(extensions: &[Extension]) -> Vec<String> {
    extensions
        .iter()
        .filter(|e| e.state == Some(STATE_ENABLED))
        .filter_map(|e| e.uuid.clone())
        .collect()
}

/// Call `org.gnome.Shell.Extensions.ListExtensions` on the session bus.
pub fn list(conn: &Connection) -> Result<Vec<Extension>> {
    let proxy = Proxy::new(
        conn,
        "org.gnome.Shell",
        "/org/gnome/Shell",
        "org.gnome.Shell.Extensions",
    )
    .context("creating org.gnome.Shell.Extensions proxy")?;

    let reply: ExtensionMap = proxy
        .call("ListExtensions", &())
        .context("calling ListExtensions")?;
    Ok(decode_all(&reply))
}

/// `a{sa{sv}}` reply of `ListExtensions`, keyed by UUID.
type ExtensionMap = HashMap<String, HashMap<String, OwnedValue>>;

/// Decode every entry, sorted by UUID. Fields of an unexpected type read as
/// absent.
fn decode_all(reply: &ExtensionMap) -> Vec<Extension> {
    let mut extensions: Vec<Extension> = reply.values().map(decode).collect();
    extensions.sort_by(|a, b| a.uuid.cmp(&b.uuid));
    extensions
}

fn decode(props: &HashMap<String, OwnedValue>) -> Extension {
    let uuid = props.get("uuid").and_then(|v| match &**v {
        Value::Str(s) => Some(s.as_str().to_string()),
        _ => None,
    });
    let state = props.get("state").and_then(|v| match &**v {
        Value::F64(f) => Some(*f),
        _ => None,
    });
    Extension { uuid, state }
}
