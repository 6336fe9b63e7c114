//! One reporting cycle across all sensors.
//!
//! Sensors are processed strictly in order. A failed vendor run or a failed
//! push is logged and counted; it never stops the remaining sensors.

use crate::aggregator::Aggregator;
use crate::envelope::SensorBatch;
use crate::error::Result;
use crate::report::{ReportBuilder, SensorReport};
use crate::transport::{PrtgPayload, Transport};
use crate::vendor::VendorRegistry;
use log::{error, info, warn};

/// Outcome counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub pushed: usize,
    pub failed_pushes: usize,
    pub failed_runs: usize,
}

impl CycleSummary {
    pub fn is_clean(&self) -> bool {
        self.failed_pushes == 0
    }
}

/// Aggregates vendor batches into sensor reports and pushes them.
pub struct Monitor<T: Transport> {
    registry: VendorRegistry,
    transport: T,
    debug: bool,
    builder: ReportBuilder,
    pushed_reports: Vec<(String, SensorReport)>,
}

impl<T: Transport> Monitor<T> {
    pub fn new(registry: VendorRegistry, transport: T) -> Self {
        Monitor {
            registry,
            transport,
            debug: false,
            builder: ReportBuilder::new(),
            pushed_reports: Vec::new(),
        }
    }

    /// Dumps every pushed payload to the log at the end of a cycle.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the report for one sensor without pushing it.
    ///
    /// Leaves the internal builder `Finalized`; callers must flush or reset.
    pub fn build_report(&mut self, sensor: &SensorBatch) -> Result<(SensorReport, usize)> {
        let aggregator = Aggregator::new(&self.registry);
        let mut failed_runs = 0;

        for batch in &sensor.vendors {
            match aggregator.run(&batch.vendor, batch.lines.as_slice(), batch.is_down) {
                Ok(run) => {
                    if let Some(message) = &batch.message {
                        self.builder.set_message(message)?;
                    }
                    self.builder.record_run(&run)?;
                }
                Err(e) if e.is_run_scoped() => {
                    error!(
                        "Sensor {}: vendor {} run failed, no channels reported: {}",
                        sensor.sensor, batch.vendor, e
                    );
                    failed_runs += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let report = self.builder.finalize()?;
        Ok((report, failed_runs))
    }

    /// Processes and pushes every sensor in order.
    pub fn run_cycle(&mut self, sensors: &[SensorBatch]) -> Result<CycleSummary> {
        let mut summary = CycleSummary::default();
        self.pushed_reports.clear();

        for sensor in sensors {
            self.builder.reset();
            let (report, failed_runs) = self.build_report(sensor)?;
            summary.failed_runs += failed_runs;

            match self
                .transport
                .push(&sensor.sensor, &PrtgPayload::from(&report))
            {
                Ok(response) => {
                    info!(
                        "Sensor response: {}, {}, {}",
                        sensor.sensor, response.status, response.body
                    );
                    summary.pushed += 1;
                }
                Err(e) => {
                    error!("Sensor {}: push failed: {}", sensor.sensor, e);
                    summary.failed_pushes += 1;
                }
            }

            self.builder.mark_flushed()?;
            self.builder.reset();
            self.pushed_reports.push((sensor.sensor.clone(), report));
        }

        if self.debug {
            self.dump_reports();
        }

        if !summary.is_clean() {
            warn!(
                "Cycle finished with {} failed pushes out of {} sensors",
                summary.failed_pushes,
                sensors.len()
            );
        }

        Ok(summary)
    }

    /// Reports handed to the transport during the last cycle.
    pub fn pushed_reports(&self) -> &[(String, SensorReport)] {
        &self.pushed_reports
    }

    fn dump_reports(&self) {
        for (sensor, report) in &self.pushed_reports {
            match serde_json::to_string_pretty(&PrtgPayload::from(report)) {
                Ok(json) => info!("SENSOR: {} - CHANNELS: {}", sensor, json),
                Err(e) => warn!("SENSOR: {} - could not render payload: {}", sensor, e),
            }
        }
    }
}
