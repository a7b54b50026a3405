use anyhow::Result;
use colored::Colorize;

use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let marker = config.marker()?;

    println!("{}", "gnome-info-collect status".bold());
    if marker.exists() {
        println!("  upload:   {}", "completed".green());
    } else {
        println!("  upload:   {}", "not uploaded".yellow());
    }
    println!("  marker:   {}", marker.path().display());
    println!("  address:  {}", config.upload_url);
    Ok(())
}
