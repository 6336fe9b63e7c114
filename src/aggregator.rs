//! Per-vendor aggregation of a batch of log lines.
//!
//! Aggregation policy: the last transaction line in arrival order decides
//! the vendor's status. A batch mixing `Live` and `ST&F` lines reports
//! whichever came last.

use crate::error::Result;
use crate::line::{classify, Classification, Status, TokenizedLine};
use crate::vendor::VendorRegistry;
use log::{debug, info};

/// Report message used when a vendor is in store-and-forward.
pub const STF_MESSAGE: &str = "Service is In Store and Forward";

/// Counters and status for one (sensor, vendor) pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorRunState {
    /// Vendor identifier the run was made for.
    pub vendor: String,

    /// Non-handshake transaction lines.
    pub live_or_other_count: u64,

    /// Handshake lines.
    pub handshake_count: u64,

    /// 1 when the run ended in store-and-forward.
    pub stf_count: u64,

    /// Status of the last transaction line, `None` if there was none.
    pub final_status: Option<Status>,

    /// Status of the last handshake line. Informational only.
    pub handshake_status: Option<Status>,

    /// Set when the final status is neither `Live`, `STF` nor unset, or
    /// when an empty batch was reported as down.
    pub downtime: bool,

    /// Message this run contributes to the sensor report.
    pub message: Option<String>,
}

impl VendorRunState {
    fn new(vendor: &str) -> Self {
        VendorRunState {
            vendor: vendor.to_string(),
            ..Default::default()
        }
    }

    /// Value of the `LIVE` channel.
    pub fn live(&self) -> u64 {
        self.live_or_other_count
    }

    /// Value of the `TOTAL` channel: transactions plus handshakes.
    pub fn total(&self) -> u64 {
        self.live_or_other_count + self.handshake_count
    }

    /// Returns `true` if the run ended in store-and-forward.
    pub fn is_stf(&self) -> bool {
        self.stf_count > 0
    }
}

/// Drives the classifier over a vendor's batch.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'r> {
    registry: &'r VendorRegistry,
}

impl<'r> Aggregator<'r> {
    pub fn new(registry: &'r VendorRegistry) -> Self {
        Aggregator { registry }
    }

    /// Processes one vendor's lines in order.
    ///
    /// `is_down` is only consulted when `lines` is empty: there is nothing
    /// to derive availability from, so the caller's flag is taken as is.
    ///
    /// An error aborts this run only; the caller decides what to do with
    /// the rest of the sensor.
    pub fn run<S: AsRef<str>>(
        &self,
        vendor_id: &str,
        lines: &[S],
        is_down: bool,
    ) -> Result<VendorRunState> {
        if lines.is_empty() {
            info!("Vendor {}: empty batch, is_down={}", vendor_id, is_down);
            return Ok(Self::empty_run(vendor_id, is_down));
        }

        let profile = self.registry.lookup(vendor_id);
        let mut state = VendorRunState::new(vendor_id);

        for raw in lines {
            let line = TokenizedLine::tokenize(profile, raw.as_ref());

            // Blank lines have no first field and fall out here too.
            if !line.is_transaction_bearing() {
                continue;
            }

            match classify(profile, &line)? {
                Classification::Handshake(status) => {
                    state.handshake_count += 1;
                    state.handshake_status = Some(status);
                }
                Classification::Transaction(status) => {
                    state.live_or_other_count += 1;
                    state.final_status = Some(status);
                }
            }
        }

        match &state.final_status {
            Some(Status::Stf) => {
                state.stf_count += 1;
                state.message = Some(STF_MESSAGE.to_string());
            }
            Some(Status::Live) | None => {}
            Some(Status::Other(token)) => {
                debug!("Vendor {}: final status {:?} marks downtime", vendor_id, token);
                state.downtime = true;
            }
        }

        info!(
            "Vendor {}: {} lines, live={} handshakes={} status={}",
            vendor_id,
            lines.len(),
            state.live(),
            state.handshake_count,
            state
                .final_status
                .as_ref()
                .map(Status::to_string)
                .unwrap_or_else(|| "-".to_string())
        );

        Ok(state)
    }

    fn empty_run(vendor_id: &str, is_down: bool) -> VendorRunState {
        VendorRunState {
            downtime: is_down,
            ..VendorRunState::new(vendor_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonitorError;

    fn run(vendor: &str, lines: &[&str]) -> VendorRunState {
        let registry = VendorRegistry::builtin();
        Aggregator::new(&registry).run(vendor, lines, false).unwrap()
    }

    #[test]
    fn test_handshakes_are_counted_but_not_live() {
        let state = run("tfd", &["IN,0200,0800,Live", "IN,0200,0800,Live"]);

        assert_eq!(state.handshake_count, 2);
        assert_eq!(state.live(), 0);
        assert_eq!(state.total(), 2);
        assert_eq!(state.final_status, None);
        assert_eq!(state.handshake_status, Some(Status::Live));
        assert!(!state.is_stf());
        assert!(!state.downtime);
    }

    #[test]
    fn test_last_transaction_wins() {
        let state = run("tfd", &["IN,0900,foo,Live", "IN,0900,foo,ST&F"]);

        assert_eq!(state.live(), 2);
        assert_eq!(state.total(), 2);
        assert_eq!(state.final_status, Some(Status::Stf));
        assert_eq!(state.stf_count, 1);
        assert_eq!(state.message.as_deref(), Some(STF_MESSAGE));

        let state = run("tfd", &["IN,0900,foo,ST&F", "IN,0900,foo,Live"]);
        assert_eq!(state.final_status, Some(Status::Live));
        assert!(!state.is_stf());
        assert_eq!(state.message, None);
    }

    #[test]
    fn test_handshake_does_not_override_final_status() {
        let state = run("tfd", &["IN,0900,foo,ST&F", "IN,0200,0800,Live"]);

        assert_eq!(state.final_status, Some(Status::Stf));
        assert_eq!(state.handshake_count, 1);
        assert!(state.is_stf());
    }

    #[test]
    fn test_non_bearing_lines_are_ignored() {
        let state = run("tfd", &["OUT,0200,foo,Live", "header", "IN,0900,foo,Live"]);

        assert_eq!(state.live(), 1);
        assert_eq!(state.total(), 1);
    }

    #[test]
    fn test_unknown_status_sets_downtime() {
        let state = run("stp", &["IN,0900,Declined"]);

        assert_eq!(state.final_status, Some(Status::Other("Declined".to_string())));
        assert!(state.downtime);
        assert_eq!(state.stf_count, 0);
    }

    #[test]
    fn test_empty_terminal_token_sets_downtime() {
        let state = run("stp", &["IN,0900,"]);

        assert_eq!(state.final_status, Some(Status::Other(String::new())));
        assert!(state.downtime);
    }

    #[test]
    fn test_only_ignored_lines_is_not_downtime() {
        let state = run("stp", &["OUT,0900,Declined"]);

        assert_eq!(state.final_status, None);
        assert!(!state.downtime);
        assert_eq!(state.total(), 0);
    }

    #[test]
    fn test_empty_batch_uses_is_down() {
        let registry = VendorRegistry::builtin();
        let aggregator = Aggregator::new(&registry);
        let empty: [&str; 0] = [];

        let down = aggregator.run("tfd", &empty, true).unwrap();
        assert!(down.downtime);
        assert_eq!(down.total(), 0);
        assert_eq!(down.live(), 0);
        assert!(!down.is_stf());

        let up = aggregator.run("tfd", &empty, false).unwrap();
        assert!(!up.downtime);
    }

    #[test]
    fn test_is_down_ignored_for_non_empty_batch() {
        let registry = VendorRegistry::builtin();
        let state = Aggregator::new(&registry)
            .run("tfd", &["IN,0900,foo,Live"], true)
            .unwrap();

        assert!(!state.downtime);
    }

    #[test]
    fn test_malformed_line_aborts_run() {
        let registry = VendorRegistry::builtin();
        let err = Aggregator::new(&registry)
            .run("tfd", &["IN,0900,foo,Live", "IN,Live"], false)
            .unwrap_err();

        assert!(err.is_run_scoped());
        assert!(matches!(err, MonitorError::MalformedLine { index: 2, .. }));
    }

    #[test]
    fn test_blank_lines_are_ignored_for_whitespace_vendor() {
        let state = run("eds", &["IN :1804 Live", "", "   ", "IN :1804 ST&F"]);

        assert_eq!(state.live(), 2);
        assert_eq!(state.total(), 2);
        assert_eq!(state.final_status, Some(Status::Stf));
        assert!(state.is_stf());
    }

    #[test]
    fn test_eds_whitespace_split() {
        let state = run("eds", &["IN :1804 Live"]);

        assert_eq!(state.live(), 1);
        assert_eq!(state.final_status, Some(Status::Live));
    }
}
