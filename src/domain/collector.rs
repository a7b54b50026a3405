//! Collector facade: runs every query in display order and assembles the
//! record.
//!
//! Optional features degrade to their documented default. The host-info
//! command and the identity hash are required; their failures abort the pass,
//! as does a command that cannot be spawned at all.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::identity::MachineIdentity;
use super::parsers::{self, FlathubState};
use super::record::{Label, Record, Value};
use crate::apps::desktop_entry::strip_desktop_suffix;
use crate::bus::ServiceDirectory;
use crate::settings::{self, SettingsProvider};
use crate::tools::{self, CommandRunner};

const SHELL_SCHEMA: &str = "org.gnome.shell";
const MUTTER_SCHEMA: &str = "org.gnome.mutter";
const RDP_SCHEMA: &str = "org.gnome.desktop.remote-desktop.rdp";

const FILE_SHARING_SERVICE: &str = "gnome-user-share-webdav";
const REMOTE_DESKTOP_SERVICES: [&str; 2] = ["gnome-remote-desktop", "vino-server"];
const MEDIA_SHARING_SERVICE: &str = "rygel";

pub struct Collector<'a> {
    runner: &'a dyn CommandRunner,
    settings: &'a dyn SettingsProvider,
    services: &'a dyn ServiceDirectory,
    identity: &'a MachineIdentity,
}

impl<'a> Collector<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        settings: &'a dyn SettingsProvider,
        services: &'a dyn ServiceDirectory,
        identity: &'a MachineIdentity,
    ) -> Self {
        Self {
            runner,
            settings,
            services,
            identity,
        }
    }

    /// Collect a complete record. Every label is present on success.
    pub fn collect(&self) -> Result<Record> {
        let mut record = Record::new();

        self.collect_host(&mut record)?;
        self.collect_flatpak(&mut record)?;

        record.insert(Label::InstalledApps, self.installed_apps());
        record.insert(Label::FavouritedApps, self.favourited_apps());
        record.insert(Label::OnlineAccounts, self.online_accounts());

        self.collect_sharing(&mut record);
        record.insert(Label::RemoteLogin, self.remote_login()?);

        record.insert(
            Label::WorkspacesOnlyOnPrimary,
            settings::read_bool(self.settings, MUTTER_SCHEMA, "workspaces-only-on-primary"),
        );
        record.insert(
            Label::WorkspacesDynamic,
            settings::read_bool(self.settings, MUTTER_SCHEMA, "dynamic-workspaces"),
        );

        record.insert(Label::NumberOfUsers, self.number_of_users());
        record.insert(Label::DefaultBrowser, self.default_browser());
        record.insert(Label::EnabledExtensions, self.enabled_extensions());
        record.insert(
            Label::UniqueId,
            self.identity
                .salted_hash()
                .context("computing the unique ID")?,
        );

        debug!(entries = record.len(), "collection finished");
        Ok(record)
    }

    fn collect_host(&self, record: &mut Record) -> Result<()> {
        let output = tools::run_checked(self.runner, "hostnamectl", &[])
            .context("querying host information")?;
        let host = parsers::parse_hostnamectl(&output);

        for (label, field) in [
            (Label::OperatingSystem, host.operating_system),
            (Label::HardwareVendor, host.hardware_vendor),
            (Label::HardwareModel, host.hardware_model),
        ] {
            let value = field.map(Value::from).unwrap_or_else(|| {
                debug!(label = label.as_str(), "field missing from hostnamectl output");
                Value::error()
            });
            record.insert(label, value);
        }
        Ok(())
    }

    fn collect_flatpak(&self, record: &mut Record) -> Result<()> {
        let installed = tools::is_installed(self.runner, "flatpak")
            .context("probing for flatpak")?;
        record.insert(Label::FlatpakInstalled, installed);

        if !installed {
            debug!("flatpak not installed");
            record.insert(Label::FlathubEnabled, false);
            return Ok(());
        }

        let remotes = self
            .runner
            .run("flatpak", &["remotes", "--columns", "url,filter"])
            .context("listing flatpak remotes")?;
        if !remotes.success() {
            warn!(
                code = ?remotes.code,
                stderr = %remotes.stderr.trim(),
                "flatpak remotes failed, parsing partial output"
            );
        }
        let flathub = match parsers::parse_flatpak_remotes(&remotes.stdout) {
            FlathubState::Enabled => Value::from(true),
            FlathubState::Filtered => Value::from("filtered"),
            FlathubState::Absent => Value::from(false),
        };
        record.insert(Label::FlathubEnabled, flathub);
        Ok(())
    }

    fn installed_apps(&self) -> Vec<String> {
        self.services
            .list_applications()
            .map(|apps| {
                apps.iter()
                    .map(|id| strip_desktop_suffix(id).to_string())
                    .collect()
            })
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to list installed applications");
                Vec::new()
            })
    }

    fn favourited_apps(&self) -> Vec<String> {
        settings::read_strv(self.settings, SHELL_SCHEMA, "favorite-apps")
            .iter()
            .map(|id| strip_desktop_suffix(id).to_string())
            .collect()
    }

    fn online_accounts(&self) -> Vec<String> {
        self.services.list_accounts().unwrap_or_else(|e| {
            warn!(error = %e, "failed to list online accounts");
            Vec::new()
        })
    }

    fn collect_sharing(&self, record: &mut Record) {
        let file_sharing = settings::sharing_enabled(self.settings, FILE_SHARING_SERVICE);
        record.insert(Label::FileSharing, Value::activity(file_sharing));

        let remote_desktop = REMOTE_DESKTOP_SERVICES
            .iter()
            .any(|service| settings::sharing_enabled(self.settings, service))
            || settings::read_bool(self.settings, RDP_SCHEMA, "enable");
        record.insert(Label::RemoteDesktop, Value::activity(remote_desktop));

        let media_sharing = settings::sharing_enabled(self.settings, MEDIA_SHARING_SERVICE);
        record.insert(Label::MultimediaSharing, Value::activity(media_sharing));
    }

    /// `systemctl is-active` exits non-zero for inactive units, so only a
    /// failure to run it is an error.
    fn remote_login(&self) -> Result<String> {
        let output = self
            .runner
            .run("systemctl", &["is-active", "sshd"])
            .context("querying the sshd unit")?;
        Ok(output.stdout.trim().to_string())
    }

    fn number_of_users(&self) -> u64 {
        self.services.count_users().unwrap_or_else(|e| {
            warn!(error = %e, "failed to count user accounts");
            0
        })
    }

    fn default_browser(&self) -> Value {
        match self.services.default_browser() {
            Ok(Some(name)) => Value::from(name),
            Ok(None) => {
                debug!("no default browser configured");
                Value::error()
            }
            Err(e) => {
                warn!(error = %e, "failed to resolve the default browser");
                Value::error()
            }
        }
    }

    fn enabled_extensions(&self) -> Vec<String> {
        self.services.list_extensions().unwrap_or_else(|e| {
            warn!(error = %e, "failed to list shell extensions");
            Vec::new()
        })
    }
}
