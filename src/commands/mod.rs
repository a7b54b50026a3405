pub mod show;
pub mod status;
pub mod upload;

use anyhow::Result;

use crate::apps::XdgDirs;
use crate::bus::DesktopDirectory;
use crate::config::Config;
use crate::domain::collector::Collector;
use crate::domain::identity::MachineIdentity;
use crate::settings::GSettingsCli;
use crate::tools::SystemRunner;

/// Wire the collector to the live system and hand it to `f`.
pub fn with_collector<T>(config: &Config, f: impl FnOnce(&Collector<'_>) -> Result<T>) -> Result<T> {
    let runner = SystemRunner;
    let settings = GSettingsCli::new(&runner);
    let services = DesktopDirectory::new(XdgDirs::from_env(), users::get_current_uid());
    let identity = MachineIdentity::for_current_user(config.machine_id_path.clone())?;
    let collector = Collector::new(&runner, &settings, &services, &identity);
    f(&collector)
}
