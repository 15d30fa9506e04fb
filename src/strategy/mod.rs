//! Staking strategy — edge assessment and Kelly sizing.

pub mod edge;
pub mod kelly;

use std::fmt;
use tracing::info;

use crate::engine::FairLineBreakdown;
use edge::{EdgeAssessment, EdgeCalculator};
use kelly::KellyCalculator;

/// A fully computed recommendation for one matchup, ready to print or log.
#[derive(Debug, Clone)]
pub struct StakeAdvice {
    pub assessment: EdgeAssessment,
    /// Percent of bankroll to risk.
    pub stake_percent: f64,
    /// Dollar stake at the configured bankroll.
    pub stake_amount: f64,
}

impl fmt::Display for StakeAdvice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | risk {:.2}% (${:.2})",
            self.assessment, self.stake_percent, self.stake_amount,
        )
    }
}

/// Pipelines fair line → capped edge → quarter-Kelly stake.
pub struct Advisor {
    edge: EdgeCalculator,
    kelly: KellyCalculator,
    bankroll: f64,
}

impl Advisor {
    pub fn new(edge: EdgeCalculator, kelly: KellyCalculator, bankroll: f64) -> Self {
        Self {
            edge,
            kelly,
            bankroll,
        }
    }

    /// Assess a matchup against the market. Capped edges get a zero stake;
    /// the play needs manual review, not sizing.
    pub fn advise(&self, breakdown: &FairLineBreakdown, market_line: f64) -> StakeAdvice {
        let assessment = self
            .edge
            .assess(breakdown.fair_line, market_line, breakdown.confidence);

        let (stake_percent, stake_amount) = if assessment.capped {
            (0.0, 0.0)
        } else {
            (
                self.kelly.stake_percent(assessment.edge),
                self.kelly.stake_amount(assessment.edge, self.bankroll),
            )
        };

        info!(
            away = %breakdown.away,
            home = %breakdown.home,
            side = %assessment.side,
            edge = assessment.edge,
            capped = assessment.capped,
            tier = %assessment.tier,
            stake_pct = stake_percent,
            "Stake advice"
        );

        StakeAdvice {
            assessment,
            stake_percent,
            stake_amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
