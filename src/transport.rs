//! Delivery of sensor reports to PRTG.
//!
//! The core never interprets the response; it is only logged.

use crate::channel::ChannelRecord;
use crate::error::Result;
use crate::report::SensorReport;
use log::debug;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Body of a PRTG HTTP push: `{"prtg": {"Result": [...], "Text": "..."}}`.
#[derive(Debug, Clone, Serialize)]
pub struct PrtgPayload<'a> {
    pub prtg: PrtgResult<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrtgResult<'a> {
    #[serde(rename = "Result")]
    pub result: &'a [ChannelRecord],
    #[serde(rename = "Text")]
    pub text: &'a str,
}

impl<'a> From<&'a SensorReport> for PrtgPayload<'a> {
    fn from(report: &'a SensorReport) -> Self {
        PrtgPayload {
            prtg: PrtgResult {
                result: &report.channels,
                text: &report.message,
            },
        }
    }
}

/// What the backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Pushes a payload to one sensor.
pub trait Transport {
    fn push(&mut self, sensor: &str, payload: &PrtgPayload<'_>) -> Result<TransportResponse>;
}

/// POSTs payloads to `base_url + sensor`.
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport {
            base_url: base_url.to_string(),
            client,
        })
    }

    /// Endpoint for a sensor. The token is appended verbatim.
    pub fn endpoint(&self, sensor: &str) -> String {
        format!("{}{}", self.base_url, sensor)
    }
}

impl Transport for HttpTransport {
    fn push(&mut self, sensor: &str, payload: &PrtgPayload<'_>) -> Result<TransportResponse> {
        let url = self.endpoint(sensor);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(payload)?)
            .send()?;

        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(TransportResponse { status, body })
    }
}

#[derive(Serialize)]
struct WrittenPush<'a> {
    sensor: &'a str,
    payload: &'a PrtgPayload<'a>,
}

/// Writes one JSON line per push, e.g. to stdout for a dry run.
pub struct WriterTransport<W: Write> {
    writer: W,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> Self {
        WriterTransport { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn push(&mut self, sensor: &str, payload: &PrtgPayload<'_>) -> Result<TransportResponse> {
        serde_json::to_writer(&mut self.writer, &WrittenPush { sensor, payload })?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(TransportResponse {
            status: 200,
            body: String::new(),
        })
    }
}
