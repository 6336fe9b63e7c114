//! PRTG channel records.

use crate::aggregator::VendorRunState;
use serde::Serialize;

pub const STF_CHANNEL: &str = "STF";
pub const LIVE_CHANNEL: &str = "LIVE";
pub const TOTAL_CHANNEL: &str = "TOTAL";
pub const AVAILABILITY_CHANNEL: &str = "SERVICE AVAILABILITY";

/// Channel value written for a full percentage.
pub const FULL: u64 = 100;

/// Warning limits PRTG applies to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitAttributes {
    #[serde(rename = "limitmode")]
    pub mode: u8,
    #[serde(rename = "LimitMaxWarning")]
    pub max_warning: u64,
    #[serde(rename = "LimitWarningMsg")]
    pub warning_message: String,
    pub unit: String,
    pub custom: u8,
}

impl LimitAttributes {
    /// Limits on the `STF` channel: warn above 99 percent.
    pub fn stf() -> Self {
        LimitAttributes {
            mode: 1,
            max_warning: 99,
            warning_message: "in STF".to_string(),
            unit: "Percent".to_string(),
            custom: 1,
        }
    }
}

/// One named value pushed to a sensor.
///
/// Serializes to the flat object PRTG expects, with limit attributes (if
/// any) inlined next to `Channel`/`Value`/`Mode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelRecord {
    #[serde(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "Value")]
    pub value: u64,
    #[serde(rename = "Mode")]
    pub mode: &'static str,
    #[serde(flatten)]
    pub limits: Option<LimitAttributes>,
}

impl ChannelRecord {
    /// Creates an absolute-mode channel without limits.
    pub fn absolute(channel: &str, value: u64) -> Self {
        ChannelRecord {
            channel: channel.to_string(),
            value,
            mode: "Absolute",
            limits: None,
        }
    }

    pub fn with_limits(mut self, limits: LimitAttributes) -> Self {
        self.limits = Some(limits);
        self
    }
}

/// Emits `STF`, `LIVE` and `TOTAL` for one vendor run, in that order.
pub fn emit_vendor_channels(state: &VendorRunState) -> [ChannelRecord; 3] {
    let stf = if state.is_stf() { FULL } else { 0 };
    [
        ChannelRecord::absolute(STF_CHANNEL, stf).with_limits(LimitAttributes::stf()),
        ChannelRecord::absolute(LIVE_CHANNEL, state.live()),
        ChannelRecord::absolute(TOTAL_CHANNEL, state.total()),
    ]
}

/// Emits `SERVICE AVAILABILITY`: 0 when down, 100 otherwise.
pub fn emit_availability_channel(downtime: bool) -> ChannelRecord {
    ChannelRecord::absolute(AVAILABILITY_CHANNEL, if downtime { 0 } else { FULL })
}
