//! Passenger count reporting over HTTP.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server responded {0}")]
    Status(reqwest::StatusCode),
}

/// Body of one count report: `{"fecha": "YYYY-MM-DD HH:MM:SS", "cantidad": N}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountReport {
    #[serde(rename = "fecha")]
    pub timestamp: String,
    #[serde(rename = "cantidad")]
    pub count: usize,
}

impl CountReport {
    /// Stamp `count` with `time` at second precision, in `time`'s own zone.
    pub fn at<Tz>(time: &DateTime<Tz>, count: usize) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Self {
            timestamp: time.format(TIMESTAMP_FORMAT).to_string(),
            count,
        }
    }
}

/// A sink for count reports. Returns the HTTP status on success.
pub trait Reporter {
    fn send(&mut self, report: &CountReport) -> Result<u16, ReportError>;
}

/// POSTs reports as JSON to a fixed endpoint. One attempt per report.
pub struct HttpReporter {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpReporter {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ReportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ReportError::Client)?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Reporter for HttpReporter {
    fn send(&mut self, report: &CountReport) -> Result<u16, ReportError> {
        let response = self.client.post(&self.endpoint).json(report).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status(status));
        }
        Ok(status.as_u16())
    }
}
