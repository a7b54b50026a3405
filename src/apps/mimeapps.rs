//! `mimeapps.list` parsing for default-application lookup.

/// Associations declared by one `mimeapps.list` file for a content type.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Associations {
    pub defaults: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// Read the `[Default Applications]`, `[Added Associations]` and
/// `[Removed Associations]` entries for `content_type`.
pub fn associations_for(content: &str, content_type: &str) -> Associations {
    let mut section = "";
    let mut result = Associations::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            section = match line {
                "[Default Applications]" => "default",
                "[Added Associations]" => "added",
                "[Removed Associations]" => "removed",
                _ => "",
            };
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != content_type {
            continue;
        }
        let ids = value
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        match section {
            "default" => result.defaults.extend(ids),
            "added" => result.added.extend(ids),
            "removed" => result.removed.extend(ids),
            _ => {}
        }
    }

    result
}
