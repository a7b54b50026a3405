//! Collected record: the flat label → value mapping that is shown and uploaded.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Every label a full collection pass produces, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    OperatingSystem,
    HardwareVendor,
    HardwareModel,
    FlatpakInstalled,
    FlathubEnabled,
    InstalledApps,
    FavouritedApps,
    OnlineAccounts,
    FileSharing,
    RemoteDesktop,
    MultimediaSharing,
    RemoteLogin,
    WorkspacesOnlyOnPrimary,
    WorkspacesDynamic,
    NumberOfUsers,
    DefaultBrowser,
    EnabledExtensions,
    UniqueId,
}

impl Label {
    pub const ALL: [Label; 18] = [
        Label::OperatingSystem,
        Label::HardwareVendor,
        Label::HardwareModel,
        Label::FlatpakInstalled,
        Label::FlathubEnabled,
        Label::InstalledApps,
        Label::FavouritedApps,
        Label::OnlineAccounts,
        Label::FileSharing,
        Label::RemoteDesktop,
        Label::MultimediaSharing,
        Label::RemoteLogin,
        Label::WorkspacesOnlyOnPrimary,
        Label::WorkspacesDynamic,
        Label::NumberOfUsers,
        Label::DefaultBrowser,
        Label::EnabledExtensions,
        Label::UniqueId,
    ];

    /// The exact key used on screen and in the upload body.
    pub fn as_str(self) -> &'static str {
        match self {
            Label::OperatingSystem => "Operating system",
            Label::HardwareVendor => "Hardware vendor",
            Label::HardwareModel => "Hardware model",
            Label::FlatpakInstalled => "Flatpak installed",
            Label::FlathubEnabled => "Flathub enabled",
            Label::InstalledApps => "Installed apps",
            Label::FavouritedApps => "Favourited apps",
            Label::OnlineAccounts => "Online accounts",
            Label::FileSharing => "File sharing",
            Label::RemoteDesktop => "Remote desktop",
            Label::MultimediaSharing => "Multimedia sharing",
            Label::RemoteLogin => "Remote login",
            Label::WorkspacesOnlyOnPrimary => "Workspaces only on primary",
            Label::WorkspacesDynamic => "Workspaces dynamic",
            Label::NumberOfUsers => "Number of users",
            Label::DefaultBrowser => "Default browser",
            Label::EnabledExtensions => "Enabled extensions",
            Label::UniqueId => "Unique ID",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value placeholder for a field whose source could not be parsed.
pub const ERROR_VALUE: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Flag(bool),
    Count(u64),
    List(Vec<String>),
}

impl Value {
    pub fn error() -> Self {
        Value::Text(ERROR_VALUE.to_string())
    }

    /// "active" / "inactive", the form sharing settings are reported in.
    pub fn activity(active: bool) -> Self {
        Value::Text(if active { "active" } else { "inactive" }.to_string())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Flag(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Count(n)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Flag(b) => write!(f, "{}", b),
            Value::Count(n) => write!(f, "{}", n),
            Value::List(items) if items.is_empty() => f.write_str("None"),
            Value::List(items) => {
                let quoted: Vec<String> = items.iter().map(|i| format!("'{}'", i)).collect();
                f.write_str(&quoted.join(", "))
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Flag(b) => serializer.serialize_bool(*b),
            Value::Count(n) => serializer.serialize_u64(*n),
            Value::List(items) => items.serialize(serializer),
        }
    }
}

/// Insertion-ordered record. Inserting an existing label replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    entries: Vec<(Label, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: Label, value: impl Into<Value>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: Label) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, &Value)> {
        self.entries.iter().map(|(l, v)| (*l, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Labels a full pass should have produced but this record lacks.
    pub fn missing_labels(&self) -> Vec<Label> {
        Label::ALL
            .iter()
            .copied()
            .filter(|l| self.get(*l).is_none())
            .collect()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label.as_str(), value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_in_insertion_order_with_exact_keys() {
        let mut record = Record::new();
        record.insert(Label::HardwareModel, "Test");
        record.insert(Label::OnlineAccounts, vec!["Google".to_string()]);
        record.insert(Label::NumberOfUsers, 2u64);
        record.insert(Label::FlatpakInstalled, false);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Hardware model":"Test","Online accounts":["Google"],"Number of users":2,"Flatpak installed":false}"#
        );
    }

    #[test]
    fn test_insert_replaces_without_reordering() {
        let mut record = Record::new();
        record.insert(Label::OperatingSystem, "Fedora");
        record.insert(Label::HardwareVendor, "Lenovo");
        record.insert(Label::OperatingSystem, "Fedora Linux 40");

        let labels: Vec<Label> = record.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec![Label::OperatingSystem, Label::HardwareVendor]);
        assert_eq!(
            record.get(Label::OperatingSystem),
            Some(&Value::from("Fedora Linux 40"))
        );
    }

    #[test]
    fn test_missing_labels() {
        let mut record = Record::new();
        assert_eq!(record.missing_labels().len(), Label::ALL.len());
        for label in Label::ALL {
            record.insert(label, Value::error());
        }
        assert!(record.missing_labels().is_empty());
    }

    #[test]
    fn test_list_display() {
        assert_eq!(Value::List(vec![]).to_string(), "None");
        assert_eq!(
            Value::List(vec!["a".into(), "b".into()]).to_string(),
            "'a', 'b'"
        );
    }
}
