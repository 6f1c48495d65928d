//! Simulated typing delay before a reply is shown.

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDelay {
    pub typed_min: Duration,
    pub typed_max: Duration,
    pub quick_reply: Duration,
}

impl ReplyDelay {
    /// No delay at all.
    pub fn none() -> Self {
        Self {
            typed_min: Duration::ZERO,
            typed_max: Duration::ZERO,
            quick_reply: Duration::ZERO,
        }
    }

    /// Delay for a typed message, uniform in `[typed_min, typed_max]`.
    pub fn typed<R: Rng>(&self, rng: &mut R) -> Duration {
        if self.typed_max <= self.typed_min {
            return self.typed_min;
        }
        rng.gen_range(self.typed_min..=self.typed_max)
    }

    /// Delay for a quick-reply button.
    pub fn quick(&self) -> Duration {
        self.quick_reply
    }
}

impl Default for ReplyDelay {
    fn default() -> Self {
        Self {
            typed_min: Duration::from_millis(1000),
            typed_max: Duration::from_millis(2000),
            quick_reply: Duration::from_millis(800),
        }
    }
}
