//! How often a live loop runs its retention trim

/// Trim cadence for one live loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionCadence {
    EveryCycle,
    /// Counter-based: trims on every `n`-th cycle
    EveryNCycles { n: u32, counter: u32 },
    /// Never automatic; only an explicit maintenance action trims
    OnRequest,
}

impl RetentionCadence {
    /// `0` means on request only, `1` every cycle
    pub fn every(n: u32) -> Self {
        match n {
            0 => RetentionCadence::OnRequest,
            1 => RetentionCadence::EveryCycle,
            n => RetentionCadence::EveryNCycles { n, counter: 0 },
        }
    }

    /// Advance by one cycle; `true` if this cycle should trim
    pub fn tick(&mut self) -> bool {
        match self {
            RetentionCadence::EveryCycle => true,
            RetentionCadence::OnRequest => false,
            RetentionCadence::EveryNCycles { n, counter } => {
                *counter += 1;
                if *counter >= *n {
                    *counter = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Undo the last `tick` after the cycle it belonged to rolled back
    pub fn rewind(&mut self, trimmed: bool) {
        if let RetentionCadence::EveryNCycles { n, counter } = self {
            *counter = if trimmed { *n - 1 } else { counter.saturating_sub(1) };
        }
    }
}
