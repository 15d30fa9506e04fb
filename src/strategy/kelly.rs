//! Kelly criterion stake sizing.
//!
//! Conservative quarter-Kelly against −110 spread pricing. The edge→win-
//! probability mapping is deliberately flat (1.5% per point, ceiling 70%):
//! point-spread edges are noisy and full Kelly would badly over-stake them.

use tracing::debug;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Kelly sizing configuration.
#[derive(Debug, Clone)]
pub struct KellyConfig {
    /// Fractional Kelly multiplier (0.25 = quarter-Kelly). Lower = more conservative.
    pub multiplier: f64,
    /// Net payout per dollar at standard −110 pricing.
    pub payout: f64,
    /// Win probability at zero edge (just above the 52.4% breakeven).
    pub prob_base: f64,
    /// Win-probability gain per point of edge.
    pub prob_slope: f64,
    pub prob_min: f64,
    pub prob_max: f64,
}

impl Default for KellyConfig {
    fn default() -> Self {
        Self {
            multiplier: 0.25,
            payout: 0.91,
            prob_base: 0.524,
            prob_slope: 0.015,
            prob_min: 0.48,
            prob_max: 0.70,
        }
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

pub struct KellyCalculator {
    config: KellyConfig,
}

impl KellyCalculator {
    pub fn new(config: KellyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KellyConfig {
        &self.config
    }

    /// Estimated cover probability for a given (capped) edge in points.
    pub fn win_probability(&self, edge: f64) -> f64 {
        (self.config.prob_base + edge * self.config.prob_slope)
            .clamp(self.config.prob_min, self.config.prob_max)
    }

    /// Recommended stake as a percent of bankroll, rounded to 2 decimals.
    ///
    /// Kelly formula: f* = (bp − q) / b, then scaled by the fractional
    /// multiplier. Guarded to 0 for non-positive edges and negative Kelly.
    pub fn stake_percent(&self, edge: f64) -> f64 {
        if edge <= 0.0 {
            return 0.0;
        }
        let b = self.config.payout;
        let p = self.win_probability(edge);
        let q = 1.0 - p;
        let kelly = (b * p - q) / b;
        let pct = (kelly.max(0.0) * self.config.multiplier) * 100.0;
        let pct = (pct * 100.0).round() / 100.0;
        debug!(edge, p, kelly, pct, "Stake sized");
        pct
    }

    /// Dollar stake for a bankroll.
    pub fn stake_amount(&self, edge: f64, bankroll: f64) -> f64 {
        if bankroll <= 0.0 {
            return 0.0;
        }
        self.stake_percent(edge) / 100.0 * bankroll
    }
}

impl Default for KellyCalculator {
    fn default() -> Self {
        Self::new(KellyConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
