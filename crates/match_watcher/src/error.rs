//! Error taxonomy pro seam mezi core a adaptery.
//!
//! Malformed snapshot (prázdné sety/gamy/body) NENÍ error — state machine
//! ho tiše přeskočí jako "insufficient data". Sem patří jen transport.

use crate::snapshot::MatchId;
use thiserror::Error;

/// Transientní selhání fetchu detailu zápasu. Recovery = přeskočit cyklus
/// pro daný zápas, stav zůstává nedotčený.
#[derive(Debug, Error)]
#[error("fetch failed for match {match_id}: {reason}")]
pub struct FetchError {
    pub match_id: MatchId,
    pub reason: String,
}

impl FetchError {
    pub fn new(match_id: MatchId, reason: impl Into<String>) -> Self {
        Self {
            match_id,
            reason: reason.into(),
        }
    }
}

/// Notifikační sink odmítl zprávu. Doručení je best-effort — stav se
/// označí jako "sent" i tak, aby transientní výpadek sinku nespamoval.
#[derive(Debug, Error)]
#[error("notification sink failed: {reason}")]
pub struct DispatchError {
    pub reason: String,
}

impl DispatchError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
