//! Capability probing through `org.freedesktop.DBus.Introspectable`.

use anyhow::{Context, Result};
use regex::Regex;
use zbus::blocking::{Connection, Proxy};

/// Introspection XML of an object.
pub fn introspect(conn: &Connection, destination: &str, path: &str) -> Result<String> {
    let proxy = Proxy::new(
        conn,
        destination,
        path,
        "org.freedesktop.DBus.Introspectable",
    )
    .with_context(|| format!("creating introspection proxy for {} {}", destination, path))?;
    let xml: String = proxy
        .call("Introspect", &())
        .with_context(|| format!("introspecting {} {}", destination, path))?;
    Ok(xml)
}

/// Interface names an object implements.
pub fn interfaces(xml: &str) -> Vec<String> {
    attribute_values(xml, "interface")
}

/// Names of the direct child nodes of an object.
pub fn child_nodes(xml: &str) -> Vec<String> {
    attribute_values(xml, "node")
}

fn attribute_values(xml: &str, element: &str) -> Vec<String> {
    let pattern = format!(r#"<{}\s+name\s*=\s*"([^"]+)""#, element);
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNTS_XML: &str = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node>
  <interface name="org.freedesktop.DBus.Properties">
    <method name="Get"/>
  </interface>
  <interface name="org.freedesktop.DBus.Introspectable"/>
  <node name="account_1681300000_0"/>
  <node name="account_1681300000_1"/>
</node>
"#;

    #[test]
    fn test_child_nodes() {
        assert_eq!(
            child_nodes(ACCOUNTS_XML),
            vec!["account_1681300000_0", "account_1681300000_1"]
        );
    }

    #[test]
    fn test_interfaces() {
        let ifaces = interfaces(ACCOUNTS_XML);
        assert!(ifaces.iter().any(|i| i == "org.freedesktop.DBus.Properties"));
        assert!(!ifaces.iter().any(|i| i == "org.freedesktop.DBus.ObjectManager"));
    }

    #[test]
    fn test_root_node_without_name_is_skipped() {
        assert!(child_nodes("<node>\n</node>").is_empty());
    }
}
