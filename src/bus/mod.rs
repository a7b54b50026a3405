//! Session and system bus queries behind a typed [`ServiceDirectory`].

pub mod accounts;
pub mod extensions;
pub mod introspect;
pub mod parental;

use std::cell::OnceCell;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use zbus::blocking::{Connection, Proxy};
use zbus::fdo;
use zbus::zvariant::OwnedObjectPath;

use crate::apps::{AppRegistry, XdgDirs};
use parental::FilterProbe;

/// Content type whose default handler is reported as the browser.
pub const BROWSER_CONTENT_TYPE: &str = "x-scheme-handler/https";

/// Desktop services the collector queries, one method per data point.
pub trait ServiceDirectory {
    /// IDs (without `.desktop`) of apps shown in menus and allowed by
    /// parental controls.
    fn list_applications(&self) -> Result<Vec<String>>;

    /// Display name of the default web browser, if one is set up.
    fn default_browser(&self) -> Result<Option<String>>;

    /// UUIDs of enabled shell extensions.
    fn list_extensions(&self) -> Result<Vec<String>>;

    /// Provider names of configured online accounts.
    fn list_accounts(&self) -> Result<Vec<String>>;

    fn count_users(&self) -> Result<u64>;
}

/// [`ServiceDirectory`] backed by D-Bus and the XDG application directories.
///
/// Connections and the application registry are opened on first use.
pub struct DesktopDirectory {
    xdg: XdgDirs,
    uid: u32,
    session: OnceCell<Connection>,
    system: OnceCell<Connection>,
    registry: OnceCell<AppRegistry>,
}

impl DesktopDirectory {
    pub fn new(xdg: XdgDirs, uid: u32) -> Self {
        Self {
            xdg,
            uid,
            session: OnceCell::new(),
            system: OnceCell::new(),
            registry: OnceCell::new(),
        }
    }

    fn session(&self) -> Result<&Connection> {
        if let Some(conn) = self.session.get() {
            return Ok(conn);
        }
        let conn = Connection::session().context("connecting to the session bus")?;
        Ok(self.session.get_or_init(|| conn))
    }

    fn system(&self) -> Result<&Connection> {
        if let Some(conn) = self.system.get() {
            return Ok(conn);
        }
        let conn = Connection::system().context("connecting to the system bus")?;
        Ok(self.system.get_or_init(|| conn))
    }

    fn registry(&self) -> &AppRegistry {
        self.registry
            .get_or_init(|| AppRegistry::load(self.xdg.clone()))
    }

    fn parental_filter(&self) -> Option<parental::AppFilter> {
        let conn = match self.system() {
            Ok(conn) => conn,
            Err(e) => {
                debug!(error = %e, "system bus unavailable, not filtering apps");
                return None;
            }
        };
        match parental::probe(conn, self.uid) {
            FilterProbe::Present(filter) => Some(filter),
            FilterProbe::Absent => None,
            FilterProbe::Failed(e) => {
                warn!(error = %e, "parental controls present but unreadable, not filtering apps");
                None
            }
        }
    }
}

impl ServiceDirectory for DesktopDirectory {
    fn list_applications(&self) -> Result<Vec<String>> {
        let filter = self.parental_filter();
        Ok(self
            .registry()
            .visible()
            .filter(|e| filter.as_ref().map_or(true, |f| f.is_entry_allowed(e)))
            .map(|e| e.short_id().to_string())
            .collect())
    }

    fn default_browser(&self) -> Result<Option<String>> {
        Ok(self
            .registry()
            .default_for(BROWSER_CONTENT_TYPE)
            .map(|e| e.name.clone().unwrap_or_else(|| e.short_id().to_string())))
    }

    fn list_extensions(&self) -> Result<Vec<String>> {
        let all = extensions::list(self.session()?)?;
        Ok(extensions::enabled_uuids(&all))
    }

    fn list_accounts(&self) -> Result<Vec<String>> {
        match accounts::select(self.session()?)? {
            Some(source) => source.provider_names(),
            None => Ok(Vec::new()),
        }
    }

    fn count_users(&self) -> Result<u64> {
        let proxy = Proxy::new(
            self.system()?,
            "org.freedesktop.Accounts",
            "/org/freedesktop/Accounts",
            "org.freedesktop.Accounts",
        )
        .context("creating AccountsService proxy")?;
        let users: Vec<OwnedObjectPath> = proxy
            .call("ListCachedUsers", &())
            .context("calling ListCachedUsers")?;
        Ok(users.len() as u64)
    }
}

/// Whether a bus name is owned or can be activated.
pub(crate) fn service_available(conn: &Connection, name: &str) -> Result<bool> {
    let proxy = Proxy::new(
        conn,
        "org.freedesktop.DBus",
        "/org/freedesktop/DBus",
        "org.freedesktop.DBus",
    )
    .context("creating bus daemon proxy")?;

    let owned: bool = proxy
        .call("NameHasOwner", &(name,))
        .with_context(|| format!("checking owner of {}", name))?;
    if owned {
        return Ok(true);
    }
    let activatable: Vec<String> = proxy
        .call("ListActivatableNames", &())
        .context("listing activatable bus names")?;
    Ok(activatable.iter().any(|n| n == name))
}

/// Errors that mean the queried service, object, interface or property does
/// not exist, as opposed to a failure of something that does.
pub(crate) fn is_absent(err: &zbus::Error) -> bool {
    const ABSENT: [&str; 5] = [
        "org.freedesktop.DBus.Error.ServiceUnknown",
        "org.freedesktop.DBus.Error.UnknownObject",
        "org.freedesktop.DBus.Error.UnknownInterface",
        "org.freedesktop.DBus.Error.UnknownMethod",
        "org.freedesktop.DBus.Error.UnknownProperty",
    ];
    match err {
        zbus::Error::MethodError(name, _, _) => ABSENT.contains(&name.as_str()),
        zbus::Error::FDO(e) => matches!(
            **e,
            fdo::Error::ServiceUnknown(_)
                | fdo::Error::UnknownObject(_)
                | fdo::Error::UnknownInterface(_)
                | fdo::Error::UnknownMethod(_)
                | fdo::Error::UnknownProperty(_)
        ),
        zbus::Error::InterfaceNotFound => true,
        _ => false,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;

    use anyhow::bail;

    use super::*;

    /// Scripted directory. `None` fields make the query fail.
    #[derive(Default)]
    pub struct FakeDirectory {
        pub applications: Option<Vec<String>>,
        pub browser: Option<Option<String>>,
        pub extensions: Option<Vec<String>>,
        pub accounts: Option<Vec<String>>,
        pub users: Option<u64>,
        pub calls: Cell<usize>,
    }

    impl FakeDirectory {
        pub fn populated() -> Self {
            Self {
                applications: Some(vec!["org.gnome.Nautilus".into(), "firefox".into()]),
                browser: Some(Some("Firefox".into())),
                extensions: Some(vec!["appindicatorsupport@rgcjonas.gmail.com".into()]),
                accounts: Some(vec!["Google".into()]),
                users: Some(2),
                calls: Cell::new(0),
            }
        }

        fn answer<T: Clone>(&self, value: &Option<T>, what: &str) -> Result<T> {
            self.calls.set(self.calls.get() + 1);
            match value {
                Some(v) => Ok(v.clone()),
                None => bail!("{} unavailable", what),
            }
        }
    }

    impl ServiceDirectory for FakeDirectory {
        fn list_applications(&self) -> Result<Vec<String>> {
            self.answer(&self.applications, "applications")
        }

        fn default_browser(&self) -> Result<Option<String>> {
            self.answer(&self.browser, "browser")
        }

        fn list_extensions(&self) -> Result<Vec<String>> {
            self.answer(&self.extensions, "extensions")
        }

        fn list_accounts(&self) -> Result<Vec<String>> {
            self.answer(&self.accounts, "accounts")
        }

        fn count_users(&self) -> Result<u64> {
            self.answer(&self.users, "users")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fdo_unknown_errors_are_absence() {
        let err = zbus::Error::FDO(Box::new(fdo::Error::ServiceUnknown(
            "org.gnome.OnlineAccounts".into(),
        )));
        assert!(is_absent(&err));

        let err = zbus::Error::FDO(Box::new(fdo::Error::AccessDenied("nope".into())));
        assert!(!is_absent(&err));
    }

    #[test]
    fn test_interface_not_found_is_absence() {
        assert!(is_absent(&zbus::Error::InterfaceNotFound));
        assert!(!is_absent(&zbus::Error::Unsupported));
    }
}
