//! `gnome-info-collect show`: collect and print without uploading.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::upload::present;

pub fn run(config: &Config, format: &str) -> Result<()> {
    let record = super::with_collector(config, |collector| collector.collect())?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&record)?;
            println!("{}", json);
        }
        "table" => {
            let stdout = std::io::stdout();
            present::render(&record, &mut stdout.lock())?;
        }
        other => bail!("unknown format '{}', expected table or json", other),
    }
    Ok(())
}
