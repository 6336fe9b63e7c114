//! # PRTG STF Monitor
//!
//! Classifies transaction log excerpts from payment network adapters and
//! reports, per PRTG sensor, whether each network is live, in
//! store-and-forward (STF), or down.
//!
//! ## Design Principles
//!
//! - **Profiles are data**: per-vendor handshake literals and split rules
//!   live in a [`VendorRegistry`], never in per-vendor types
//! - **Last write wins**: the last transaction line of a batch decides the
//!   vendor's status
//! - **Strict invariant**: `TOTAL == LIVE + handshakes` for every vendor run
//! - **Isolated failures**: a malformed line drops only its own vendor run
//!
//! ## Example
//!
//! ```
//! use prtg_stf_monitor::{emit_vendor_channels, Aggregator, VendorRegistry};
//!
//! let registry = VendorRegistry::builtin();
//! let run = Aggregator::new(&registry)
//!     .run("tfd", &["IN,0900,foo,Live", "IN,0900,foo,ST&F"], false)
//!     .unwrap();
//!
//! let [stf, live, total] = emit_vendor_channels(&run);
//! assert_eq!((stf.value, live.value, total.value), (100, 2, 2));
//! ```

pub mod aggregator;
pub mod channel;
pub mod envelope;
pub mod error;
pub mod line;
pub mod monitor;
pub mod report;
pub mod transport;
pub mod vendor;

pub use aggregator::{Aggregator, VendorRunState, STF_MESSAGE};
pub use channel::{emit_availability_channel, emit_vendor_channels, ChannelRecord, LimitAttributes};
pub use envelope::{Envelope, SensorBatch, VendorBatch};
pub use error::{MonitorError, Result};
pub use line::{classify, Classification, Status, TokenizedLine};
pub use monitor::{CycleSummary, Monitor};
pub use report::{ReportBuilder, ReportPhase, SensorReport};
pub use transport::{HttpTransport, PrtgPayload, Transport, TransportResponse, WriterTransport};
pub use vendor::{SplitRule, VendorProfile, VendorRegistry};
