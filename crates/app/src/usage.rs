/// How the assistant mascot feels about the remaining daily budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageMood {
    Energetic,
    Steady,
    Tired,
    Exhausted,
}

impl UsageMood {
    pub fn status_line(self) -> &'static str {
        match self {
            Self::Energetic => "Plenty of energy left today to help you learn!",
            Self::Steady => "Still enough energy to support your studies today.",
            Self::Tired => "Today's energy is running low, use your tokens wisely!",
            Self::Exhausted => "Almost out of energy for today. See you tomorrow!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenUsage {
    used_today: u64,
    daily_limit: u64,
}

impl TokenUsage {
    pub fn new(used_today: u64, daily_limit: u64) -> Self {
        Self {
            used_today: used_today.min(daily_limit),
            daily_limit,
        }
    }

    pub fn used_today(&self) -> u64 {
        self.used_today
    }

    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    pub fn remaining(&self) -> u64 {
        self.daily_limit.saturating_sub(self.used_today)
    }

    pub fn remaining_percent(&self) -> f64 {
        if self.daily_limit == 0 {
            return 0.0;
        }
        self.remaining() as f64 / self.daily_limit as f64 * 100.0
    }

    pub fn mood(&self) -> UsageMood {
        let remaining = self.remaining_percent();
        if remaining > 70.0 {
            UsageMood::Energetic
        } else if remaining > 30.0 {
            UsageMood::Steady
        } else if remaining > 10.0 {
            UsageMood::Tired
        } else {
            UsageMood::Exhausted
        }
    }

    /// Charges tokens against today's budget, saturating at the limit.
    pub fn record(&mut self, tokens: u64) {
        self.used_today = self.used_today.saturating_add(tokens).min(self.daily_limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_follows_remaining_share() {
        assert_eq!(TokenUsage::new(0, 10_000).mood(), UsageMood::Energetic);
        assert_eq!(TokenUsage::new(3_000, 10_000).mood(), UsageMood::Steady);
        assert_eq!(TokenUsage::new(7_000, 10_000).mood(), UsageMood::Tired);
        assert_eq!(TokenUsage::new(9_000, 10_000).mood(), UsageMood::Exhausted);
    }

    #[test]
    fn recording_saturates_at_the_limit() {
        let mut usage = TokenUsage::new(9_500, 10_000);
        usage.record(1_000);

        assert_eq!(usage.remaining(), 0);
        assert_eq!(TokenUsage::new(0, 0).mood(), UsageMood::Exhausted);
    }
}
