//! Energy gate: keep loud segments, drop silence

/// Result of gating one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    pub energy: f64,
    pub threshold: f64,
    pub transmit: bool,
}

/// RMS threshold filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyGate {
    threshold: f64,
}

impl EnergyGate {
    pub const DEFAULT_THRESHOLD: f64 = 50.0;

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Root-mean-square of `samples`, accumulated in `f64`.
    ///
    /// An empty slice has energy 0.
    pub fn measure(samples: &[i16]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = samples
            .iter()
            .map(|&s| {
                let s = s as f64;
                s * s
            })
            .sum();
        (sum_squares / samples.len() as f64).sqrt()
    }

    /// True iff the block's energy reaches the threshold
    pub fn decide(&self, samples: &[i16]) -> bool {
        self.evaluate(samples).transmit
    }

    pub fn evaluate(&self, samples: &[i16]) -> GateDecision {
        let energy = Self::measure(samples);
        GateDecision {
            energy,
            threshold: self.threshold,
            transmit: energy >= self.threshold,
        }
    }
}

impl Default for EnergyGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}
