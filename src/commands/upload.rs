//! `gnome-info-collect upload`: show the record, ask, then send it.

use anyhow::Result;
use tracing::debug;

use crate::config::Config;
use crate::upload::{Confirmation, HttpUploader, StdinSource, UploadFlow};

pub fn run(config: &Config, yes: bool) -> Result<()> {
    let marker = config.marker()?;
    let uploader = HttpUploader::new(&config.upload_url)?;
    let flow = UploadFlow::new(&marker, &uploader);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let outcome = super::with_collector(config, |collector| {
        if yes {
            flow.run(collector, Confirmation::Given, &mut out)
        } else {
            let mut answers = StdinSource;
            flow.run(collector, Confirmation::Ask(&mut answers), &mut out)
        }
    })?;

    debug!(?outcome, url = uploader.url(), "upload flow finished");
    Ok(())
}
