//! Desktop entry (`.desktop` file) parsing.

use std::collections::HashMap;

/// Parsed `[Desktop Entry]` group of a desktop file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    /// Desktop ID, e.g. `org.gnome.Nautilus.desktop`.
    pub id: String,
    pub entry_type: String,
    pub name: Option<String>,
    pub exec: Option<String>,
    pub try_exec: Option<String>,
    pub no_display: bool,
    pub hidden: bool,
    pub only_show_in: Vec<String>,
    pub not_show_in: Vec<String>,
    pub mime_types: Vec<String>,
    /// Flatpak application ID for exported flatpak apps.
    pub flatpak_id: Option<String>,
}

impl DesktopEntry {
    /// Parse desktop file content. Returns `None` when there is no
    /// `[Desktop Entry]` group.
    pub fn parse(id: &str, content: &str) -> Option<Self> {
        let group = main_group(content)?;
        let get = |key: &str| group.get(key).cloned();
        let flag = |key: &str| group.get(key).is_some_and(|v| v == "true");

        Some(Self {
            id: id.to_string(),
            entry_type: get("Type").unwrap_or_default(),
            name: get("Name"),
            exec: get("Exec"),
            try_exec: get("TryExec"),
            no_display: flag("NoDisplay"),
            hidden: flag("Hidden"),
            only_show_in: get("OnlyShowIn").map(|v| split_list(&v)).unwrap_or_default(),
            not_show_in: get("NotShowIn").map(|v| split_list(&v)).unwrap_or_default(),
            mime_types: get("MimeType").map(|v| split_list(&v)).unwrap_or_default(),
            flatpak_id: get("X-Flatpak"),
        })
    }

    /// The ID without its `.desktop` suffix.
    pub fn short_id(&self) -> &str {
        strip_desktop_suffix(&self.id)
    }

    /// First word of `Exec`, unquoted.
    pub fn executable(&self) -> Option<String> {
        let exec = self.exec.as_deref()?.trim();
        if let Some(rest) = exec.strip_prefix('"') {
            return rest.split('"').next().map(str::to_string);
        }
        exec.split_whitespace().next().map(str::to_string)
    }

    /// Whether the entry should appear in menus on the given desktops
    /// (`XDG_CURRENT_DESKTOP` split on `:`).
    ///
    /// `TryExec` resolution is checked separately by the registry.
    pub fn should_show(&self, current_desktops: &[String]) -> bool {
        if self.entry_type != "Application" || self.hidden || self.no_display {
            return false;
        }
        shown_in(self, current_desktops)
    }
}

fn shown_in(entry: &DesktopEntry, current_desktops: &[String]) -> bool {
    let matches = |list: &[String]| {
        current_desktops
            .iter()
            .any(|d| list.iter().any(|l| l.eq_ignore_ascii_case(d)))
    };

    if !entry.only_show_in.is_empty() {
        return matches(&entry.only_show_in);
    }
    !matches(&entry.not_show_in)
}

pub fn strip_desktop_suffix(id: &str) -> &str {
    id.strip_suffix(".desktop").unwrap_or(id)
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Key/value pairs of the `[Desktop Entry]` group. Localized keys such as
/// `Name[de]` are skipped.
fn main_group(content: &str) -> Option<HashMap<String, String>> {
    let mut in_group = false;
    let mut found = false;
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_group = line == "[Desktop Entry]";
            found |= in_group;
            continue;
        }
        if !in_group {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            if key.contains('[') {
                continue;
            }
            values
                .entry(key.to_string())
                .or_insert_with(|| value.trim().to_string());
        }
    }

    found.then_some(values)
}
