//! Edge assessment.
//!
//! Compares the model's fair line to the market line, caps suspect edges,
//! and quantizes the result into a signal tier. A capped edge means the
//! model disagrees with the market by more than the configured ceiling;
//! historically that signals bad input data far more often than a real
//! opportunity, so those plays are flagged for review, never recommended.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::types::{Confidence, SignalTier};

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which side of the matchup a recommendation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Away,
    Home,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Away => write!(f, "AWAY"),
            Side::Home => write!(f, "HOME"),
        }
    }
}

/// Pick-direction contract: both lines are in home orientation, so a fair
/// line below the market means the model rates the home team better than
/// the market does.
pub fn recommended_side(fair_line: f64, market_line: f64) -> Side {
    if fair_line < market_line {
        Side::Home
    } else {
        Side::Away
    }
}

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Capped-edge assessment of one matchup.
#[derive(Debug, Clone)]
pub struct EdgeAssessment {
    pub fair_line: f64,
    pub market_line: f64,
    /// |fair − market| before capping.
    pub raw_edge: f64,
    /// Edge after the cap; this is what sizing uses.
    pub edge: f64,
    pub capped: bool,
    pub side: Side,
    pub tier: SignalTier,
}

impl fmt::Display for EdgeAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | fair {:+.2} vs market {:+.2} | edge {:.2}{} | {}",
            self.side,
            self.fair_line,
            self.market_line,
            self.edge,
            if self.capped { " (capped)" } else { "" },
            self.tier,
        )
    }
}

impl EdgeAssessment {
    /// Capped plays are review-required, not actionable.
    pub fn actionable(&self) -> bool {
        !self.capped && self.tier != SignalTier::NoPlay
    }
}

pub struct EdgeCalculator {
    cap: f64,
}

impl EdgeCalculator {
    pub fn new(cap: f64) -> Self {
        Self { cap }
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    pub fn assess(&self, fair_line: f64, market_line: f64, confidence: Confidence) -> EdgeAssessment {
        let raw_edge = round2((fair_line - market_line).abs());
        let edge = raw_edge.min(self.cap);
        let capped = raw_edge > self.cap;
        let side = recommended_side(fair_line, market_line);
        let tier = tier_for(edge, confidence, capped);

        if capped {
            debug!(
                raw_edge,
                cap = self.cap,
                "Edge exceeds cap, flagged for review"
            );
        }

        EdgeAssessment {
            fair_line,
            market_line,
            raw_edge,
            edge,
            capped,
            side,
            tier,
        }
    }
}

/// Quantize (edge, confidence) into a tier. Low confidence knocks the play
/// down one step; a capped edge overrides everything.
fn tier_for(edge: f64, confidence: Confidence, capped: bool) -> SignalTier {
    if capped {
        return SignalTier::ReviewRequired;
    }
    let base = if edge < 2.0 {
        SignalTier::NoPlay
    } else if edge < 5.0 {
        SignalTier::Lean
    } else if edge < 8.0 {
        SignalTier::Play
    } else {
        SignalTier::Strong
    };
    if confidence == Confidence::Low {
        match base {
            SignalTier::Strong => SignalTier::Play,
            SignalTier::Play => SignalTier::Lean,
            SignalTier::Lean => SignalTier::NoPlay,
            other => other,
        }
    } else {
        base
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
