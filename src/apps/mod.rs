//! Installed application registry built from XDG desktop entries.

pub mod desktop_entry;
pub mod mimeapps;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::tools;
pub use desktop_entry::DesktopEntry;

/// XDG base directories relevant to application lookup.
#[derive(Debug, Clone, Default)]
pub struct XdgDirs {
    /// Data directories in precedence order (`XDG_DATA_HOME` first).
    pub data_dirs: Vec<PathBuf>,
    /// Config directories in precedence order (`XDG_CONFIG_HOME` first).
    pub config_dirs: Vec<PathBuf>,
    /// Lowercased `XDG_CURRENT_DESKTOP` components.
    pub desktops: Vec<String>,
}

impl XdgDirs {
    pub fn from_env() -> Self {
        let mut data_dirs: Vec<PathBuf> = dirs::data_dir().into_iter().collect();
        data_dirs.extend(env_paths("XDG_DATA_DIRS", "/usr/local/share/:/usr/share/"));

        let mut config_dirs: Vec<PathBuf> = dirs::config_dir().into_iter().collect();
        config_dirs.extend(env_paths("XDG_CONFIG_DIRS", "/etc/xdg"));

        let desktops = std::env::var("XDG_CURRENT_DESKTOP")
            .unwrap_or_default()
            .split(':')
            .filter(|d| !d.is_empty())
            .map(str::to_lowercase)
            .collect();

        Self {
            data_dirs,
            config_dirs,
            desktops,
        }
    }
}

fn env_paths(var: &str, default: &str) -> Vec<PathBuf> {
    let value = std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string());
    std::env::split_paths(&value)
        .filter(|p| p.is_absolute())
        .collect()
}

/// All desktop entries visible to the user, first occurrence of each ID kept.
pub struct AppRegistry {
    entries: Vec<DesktopEntry>,
    dirs: XdgDirs,
}

impl AppRegistry {
    pub fn load(dirs: XdgDirs) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for data_dir in &dirs.data_dirs {
            let apps_dir = data_dir.join("applications");
            for (id, path) in desktop_files(&apps_dir) {
                if !seen.insert(id.clone()) {
                    continue;
                }
                let Ok(content) = std::fs::read_to_string(&path) else {
                    debug!(path = %path.display(), "unreadable desktop file");
                    continue;
                };
                if let Some(entry) = DesktopEntry::parse(&id, &content) {
                    entries.push(entry);
                }
            }
        }

        Self { entries, dirs }
    }

    /// Entries that would be shown in application menus.
    pub fn visible(&self) -> impl Iterator<Item = &DesktopEntry> {
        self.entries
            .iter()
            .filter(|e| e.should_show(&self.dirs.desktops) && is_runnable(e))
    }

    /// A non-hidden entry whose `TryExec`, if any, resolves.
    pub fn get(&self, id: &str) -> Option<&DesktopEntry> {
        self.entries
            .iter()
            .find(|e| e.id == id && !e.hidden && is_runnable(e))
    }

    /// Default handler for a content type.
    ///
    /// `mimeapps.list` files are consulted in precedence order, desktop
    /// specific ones first; explicit defaults win over added associations,
    /// which win over any installed app declaring the type. Removed
    /// associations exclude an app from the last two.
    pub fn default_for(&self, content_type: &str) -> Option<&DesktopEntry> {
        let lists = self.mimeapps_lists();
        let contents: Vec<String> = lists
            .iter()
            .filter_map(|p| std::fs::read_to_string(p).ok())
            .collect();
        let associations: Vec<mimeapps::Associations> = contents
            .iter()
            .map(|c| mimeapps::associations_for(c, content_type))
            .collect();

        let removed: HashSet<&str> = associations
            .iter()
            .flat_map(|a| a.removed.iter().map(String::as_str))
            .collect();

        associations
            .iter()
            .flat_map(|a| a.defaults.iter())
            .find_map(|id| self.get(id))
            .or_else(|| {
                associations
                    .iter()
                    .flat_map(|a| a.added.iter())
                    .filter(|id| !removed.contains(id.as_str()))
                    .find_map(|id| self.get(id))
            })
            .or_else(|| {
                self.entries.iter().find(|e| {
                    !e.hidden
                        && !removed.contains(e.id.as_str())
                        && is_runnable(e)
                        && e.mime_types.iter().any(|m| m == content_type)
                })
            })
    }

    fn mimeapps_lists(&self) -> Vec<PathBuf> {
        let mut names: Vec<String> = self
            .dirs
            .desktops
            .iter()
            .map(|d| format!("{}-mimeapps.list", d))
            .collect();
        names.push("mimeapps.list".to_string());

        let config = self.dirs.config_dirs.iter().cloned();
        let data = self.dirs.data_dirs.iter().map(|d| d.join("applications"));
        config
            .chain(data)
            .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
            .collect()
    }
}

fn is_runnable(entry: &DesktopEntry) -> bool {
    entry
        .try_exec
        .as_deref()
        .map_or(true, |t| tools::find(t).is_some())
}

/// `(desktop ID, path)` pairs under an applications directory, with
/// subdirectory components joined by `-`. Sorted for a stable order.
fn desktop_files(apps_dir: &Path) -> Vec<(String, PathBuf)> {
    let mut found = Vec::new();
    collect_desktop_files(apps_dir, "", &mut found);
    found.sort();
    found
}

fn collect_desktop_files(dir: &Path, prefix: &str, found: &mut Vec<(String, PathBuf)>) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in read_dir.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            collect_desktop_files(&path, &format!("{}{}-", prefix, name), found);
        } else if name.ends_with(".desktop") {
            found.push((format!("{}{}", prefix, name), path));
        }
    }
}
