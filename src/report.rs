//! Per-sensor report assembly.
//!
//! A sensor's report moves through `Idle → Accumulating → Finalized →
//! Flushed` and back to `Idle` on [`ReportBuilder::reset`]. Availability is
//! sensor-scoped: one vendor run in downtime drops the whole sensor to 0.

use crate::aggregator::VendorRunState;
use crate::channel::{emit_availability_channel, emit_vendor_channels, ChannelRecord};
use crate::error::{MonitorError, Result};
use log::debug;
use serde::Serialize;

/// Message sent when nothing overrides it.
pub const DEFAULT_MESSAGE: &str = "Ok";

/// Lifecycle phase of a [`ReportBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPhase {
    Idle,
    Accumulating,
    Finalized,
    Flushed,
}

/// Everything pushed to one sensor for one reporting cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorReport {
    pub channels: Vec<ChannelRecord>,
    pub message: String,
}

/// Accumulates vendor runs for one sensor.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    phase: ReportPhase,
    channels: Vec<ChannelRecord>,
    message: String,
    downtime: bool,
    stf_vendor_count: u64,
}

impl ReportBuilder {
    pub fn new() -> Self {
        ReportBuilder {
            phase: ReportPhase::Idle,
            channels: Vec::new(),
            message: DEFAULT_MESSAGE.to_string(),
            downtime: false,
            stf_vendor_count: 0,
        }
    }

    pub fn phase(&self) -> ReportPhase {
        self.phase
    }

    pub fn downtime(&self) -> bool {
        self.downtime
    }

    /// Vendor runs that ended in store-and-forward since the last reset.
    pub fn stf_vendor_count(&self) -> u64 {
        self.stf_vendor_count
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn channels(&self) -> &[ChannelRecord] {
        &self.channels
    }

    fn ensure_open(&self, action: &'static str) -> Result<()> {
        match self.phase {
            ReportPhase::Idle | ReportPhase::Accumulating => Ok(()),
            phase => Err(MonitorError::InvalidTransition { phase, action }),
        }
    }

    /// Replaces the report message, e.g. with one supplied alongside a batch.
    pub fn set_message(&mut self, message: &str) -> Result<()> {
        self.ensure_open("set the message of")?;
        self.message = message.to_string();
        Ok(())
    }

    /// Appends a vendor run's `STF`/`LIVE`/`TOTAL` channels.
    pub fn record_run(&mut self, run: &VendorRunState) -> Result<()> {
        self.ensure_open("record a run into")?;

        self.channels.extend(emit_vendor_channels(run));
        if run.is_stf() {
            self.stf_vendor_count += 1;
        }
        if run.downtime {
            self.downtime = true;
        }
        if let Some(message) = &run.message {
            self.message = message.clone();
        }

        self.phase = ReportPhase::Accumulating;
        Ok(())
    }

    /// Appends `SERVICE AVAILABILITY` and returns the finished report.
    pub fn finalize(&mut self) -> Result<SensorReport> {
        self.ensure_open("finalize")?;

        self.channels.push(emit_availability_channel(self.downtime));
        self.phase = ReportPhase::Finalized;

        Ok(SensorReport {
            channels: self.channels.clone(),
            message: self.message.clone(),
        })
    }

    /// Records that the finalized report was handed to the transport.
    pub fn mark_flushed(&mut self) -> Result<()> {
        if self.phase != ReportPhase::Finalized {
            return Err(MonitorError::InvalidTransition {
                phase: self.phase,
                action: "flush",
            });
        }
        self.phase = ReportPhase::Flushed;
        Ok(())
    }

    /// Clears all per-sensor state and returns to `Idle`.
    pub fn reset(&mut self) {
        debug!(
            "Resetting sensor report (phase {:?}, {} channels)",
            self.phase,
            self.channels.len()
        );
        *self = Self::new();
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::STF_MESSAGE;
    use crate::channel::AVAILABILITY_CHANNEL;

    fn run(live: u64, stf: bool, downtime: bool) -> VendorRunState {
        VendorRunState {
            vendor: "tfd".to_string(),
            live_or_other_count: live,
            stf_count: u64::from(stf),
            downtime,
            message: stf.then(|| STF_MESSAGE.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut builder = ReportBuilder::new();
        assert_eq!(builder.phase(), ReportPhase::Idle);

        builder.record_run(&run(2, false, false)).unwrap();
        assert_eq!(builder.phase(), ReportPhase::Accumulating);

        let report = builder.finalize().unwrap();
        assert_eq!(builder.phase(), ReportPhase::Finalized);
        assert_eq!(report.channels.len(), 4);
        assert_eq!(report.channels[3].channel, AVAILABILITY_CHANNEL);
        assert_eq!(report.channels[3].value, 100);
        assert_eq!(report.message, DEFAULT_MESSAGE);

        builder.mark_flushed().unwrap();
        assert_eq!(builder.phase(), ReportPhase::Flushed);

        builder.reset();
        assert_eq!(builder.phase(), ReportPhase::Idle);
        assert!(builder.channels().is_empty());
    }

    #[test]
    fn test_downtime_is_sensor_scoped() {
        let mut builder = ReportBuilder::new();
        builder.record_run(&run(1, false, true)).unwrap();
        builder.record_run(&run(5, false, false)).unwrap();

        let report = builder.finalize().unwrap();
        assert_eq!(report.channels.len(), 7);
        assert_eq!(report.channels.last().unwrap().value, 0);
    }

    #[test]
    fn test_stf_run_sets_message_and_count() {
        let mut builder = ReportBuilder::new();
        builder.set_message("custom").unwrap();
        builder.record_run(&run(1, true, false)).unwrap();

        assert_eq!(builder.stf_vendor_count(), 1);
        assert_eq!(builder.message(), STF_MESSAGE);
    }

    #[test]
    fn test_batch_message_kept_when_not_stf() {
        let mut builder = ReportBuilder::new();
        builder.set_message("maintenance window").unwrap();
        builder.record_run(&run(1, false, false)).unwrap();

        assert_eq!(builder.finalize().unwrap().message, "maintenance window");
    }

    #[test]
    fn test_finalize_from_idle_emits_availability_only() {
        let mut builder = ReportBuilder::new();
        let report = builder.finalize().unwrap();

        assert_eq!(report.channels.len(), 1);
        assert_eq!(report.channels[0].channel, AVAILABILITY_CHANNEL);
    }

    #[test]
    fn test_illegal_transitions() {
        let mut builder = ReportBuilder::new();
        assert!(matches!(
            builder.mark_flushed(),
            Err(MonitorError::InvalidTransition {
                phase: ReportPhase::Idle,
                ..
            })
        ));

        builder.finalize().unwrap();
        assert!(builder.finalize().is_err());
        assert!(builder.record_run(&run(1, false, false)).is_err());

        builder.mark_flushed().unwrap();
        assert!(matches!(
            builder.record_run(&run(1, false, false)),
            Err(MonitorError::InvalidTransition {
                phase: ReportPhase::Flushed,
                ..
            })
        ));
        assert!(builder.set_message("late").is_err());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut builder = ReportBuilder::new();
        builder.set_message("x").unwrap();
        builder.record_run(&run(3, true, true)).unwrap();

        builder.reset();
        let first = (
            builder.phase(),
            builder.downtime(),
            builder.stf_vendor_count(),
            builder.message().to_string(),
            builder.channels().len(),
        );
        builder.reset();
        let second = (
            builder.phase(),
            builder.downtime(),
            builder.stf_vendor_count(),
            builder.message().to_string(),
            builder.channels().len(),
        );

        assert_eq!(first, second);
        assert_eq!(first, (ReportPhase::Idle, false, 0, DEFAULT_MESSAGE.to_string(), 0));
    }
}
