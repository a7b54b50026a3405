//! Presentation and upload flow.
//!
//! The flow checks the marker before anything else, so a machine that has
//! already uploaded never collects again. A marker is written only after the
//! server accepted the record.

pub mod http;
pub mod present;
pub mod prompt;

use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::collector::Collector;
use crate::domain::marker::UploadMarker;
use crate::domain::record::Record;
pub use http::{HttpUploader, UploadReceipt, Uploader};
pub use prompt::{LineSource, StdinSource};

pub const ALREADY_UPLOADED: &str = "Information was already successfully uploaded.";
pub const NOT_COLLECTING: &str = "Not collecting or sending any data, exiting...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    AlreadyUploaded,
    Declined,
    Uploaded,
}

/// How the user agrees to the upload.
pub enum Confirmation<'a> {
    Ask(&'a mut dyn LineSource),
    /// Agreed up front on the command line.
    Given,
}

pub struct UploadFlow<'a> {
    marker: &'a UploadMarker,
    uploader: &'a dyn Uploader,
}

impl<'a> UploadFlow<'a> {
    pub fn new(marker: &'a UploadMarker, uploader: &'a dyn Uploader) -> Self {
        Self { marker, uploader }
    }

    pub fn run(
        &self,
        collector: &Collector<'_>,
        confirmation: Confirmation<'_>,
        out: &mut dyn Write,
    ) -> Result<Outcome> {
        if self.marker.exists() {
            info!(marker = %self.marker.path().display(), "marker present, skipping collection");
            writeln!(out, "{}", ALREADY_UPLOADED)?;
            writeln!(out, "{}", NOT_COLLECTING)?;
            return Ok(Outcome::AlreadyUploaded);
        }

        let record = collector.collect()?;
        present::render(&record, out)?;

        let accepted = match confirmation {
            Confirmation::Ask(source) => {
                prompt::confirm(source, out).context("reading confirmation")?
            }
            Confirmation::Given => true,
        };
        if !accepted {
            info!("upload declined");
            return Ok(Outcome::Declined);
        }

        writeln!(out, "Uploading...")?;
        self.submit(&record)?;
        writeln!(out, "Complete! Thank you for helping to improve GNOME.")?;
        Ok(Outcome::Uploaded)
    }

    /// Upload the record and, once accepted, write the marker.
    pub fn submit(&self, record: &Record) -> Result<UploadReceipt> {
        let receipt = self.uploader.upload(record)?;
        info!(status = receipt.status, "upload accepted");
        self.marker
            .create()
            .context("recording the successful upload")?;
        Ok(receipt)
    }
}
