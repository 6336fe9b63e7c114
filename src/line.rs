//! Log line tokenization and classification.
//!
//! Only a fixed field position and a handful of literal tokens are
//! inspected; the vendor wire protocol itself is never parsed.

use crate::error::{MonitorError, Result};
use crate::vendor::VendorProfile;
use std::fmt;

/// Terminal token some vendors write for store-and-forward.
pub const STF_TOKEN: &str = "ST&F";

/// One raw log line split into fields per the vendor's split rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine<'a> {
    raw: &'a str,
    fields: Vec<&'a str>,
}

impl<'a> TokenizedLine<'a> {
    /// Splits `raw` using the profile's split rule.
    pub fn tokenize(profile: &VendorProfile, raw: &'a str) -> Self {
        TokenizedLine {
            raw,
            fields: profile.split_rule.split(raw),
        }
    }

    /// The untouched input line.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn fields(&self) -> &[&'a str] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn first(&self) -> Option<&'a str> {
        self.fields.first().copied()
    }

    pub fn last(&self) -> Option<&'a str> {
        self.fields.last().copied()
    }

    /// Returns `true` if the line records an inbound or outbound message.
    ///
    /// Accepted first tokens: exactly `IN`, anything containing `IN :`, or
    /// anything containing `ISOOUT:`. Every other line is ignored.
    pub fn is_transaction_bearing(&self) -> bool {
        match self.first() {
            Some(first) => first == "IN" || first.contains("IN :") || first.contains("ISOOUT:"),
            None => false,
        }
    }
}

/// Terminal status carried by the last field of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Store-and-forward (`ST&F` or `STF`).
    Stf,
    /// Online with the upstream network.
    Live,
    /// Any other vendor literal, including the empty string.
    Other(String),
}

impl Status {
    /// Normalizes a terminal token.
    pub fn from_token(token: &str) -> Self {
        match token {
            STF_TOKEN | "STF" => Status::Stf,
            "Live" => Status::Live,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn is_stf(&self) -> bool {
        matches!(self, Status::Stf)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Stf => write!(f, "STF"),
            Status::Live => write!(f, "Live"),
            Status::Other(token) => write!(f, "{}", token),
        }
    }
}

/// Outcome of classifying one transaction-bearing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Keep-alive line. The status is kept only as a side value and never
    /// feeds the vendor's final status.
    Handshake(Status),

    /// Real transaction carrying its terminal status.
    Transaction(Status),
}

/// Classifies a tokenized line against the vendor profile.
///
/// Fails with [`MonitorError::MalformedLine`] when the handshake field
/// index is past the end of the line, and with
/// [`MonitorError::InconsistentBatch`] when the line has no fields at all.
pub fn classify(profile: &VendorProfile, line: &TokenizedLine<'_>) -> Result<Classification> {
    let last = line.last().ok_or_else(|| MonitorError::InconsistentBatch {
        vendor: profile.id.clone(),
        line: line.raw().to_string(),
        reason: "line has no fields".to_string(),
    })?;
    let status = Status::from_token(last);

    if let Some(handshake) = &profile.handshake {
        let field = line
            .fields()
            .get(handshake.field_index)
            .ok_or_else(|| MonitorError::MalformedLine {
                vendor: profile.id.clone(),
                line: line.raw().to_string(),
                index: handshake.field_index,
                fields: line.len(),
            })?;

        if *field == handshake.literal {
            return Ok(Classification::Handshake(status));
        }
    }

    Ok(Classification::Transaction(status))
}
