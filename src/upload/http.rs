//! Record upload over HTTP.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::record::Record;

/// Accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    pub status: u16,
}

pub trait Uploader {
    /// Send the record once. Any non-2xx answer is an error.
    fn upload(&self, record: &Record) -> Result<UploadReceipt>;
}

/// Posts the record as a JSON object to a fixed address.
pub struct HttpUploader {
    url: String,
    http: Client,
}

impl HttpUploader {
    pub fn new(url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, record: &Record) -> Result<UploadReceipt> {
        debug!(url = %self.url, entries = record.len(), "uploading record");
        let resp = self
            .http
            .post(&self.url)
            .json(record)
            .send()
            .with_context(|| format!("POST {}", self.url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("{} returned {}", self.url, status);
        }
        Ok(UploadReceipt {
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use anyhow::anyhow;

    use super::*;

    /// Records what it was asked to send.
    pub struct FakeUploader {
        status: u16,
        pub sent: RefCell<Vec<Record>>,
    }

    impl FakeUploader {
        pub fn answering(status: u16) -> Self {
            Self {
                status,
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl Uploader for FakeUploader {
        fn upload(&self, record: &Record) -> Result<UploadReceipt> {
            self.sent.borrow_mut().push(record.clone());
            if (200..300).contains(&self.status) {
                Ok(UploadReceipt {
                    status: self.status,
                })
            } else {
                Err(anyhow!("server returned {}", self.status))
            }
        }
    }
}
