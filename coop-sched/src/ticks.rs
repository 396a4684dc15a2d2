use core::cmp;

/// The ticks of a clock.
pub trait Ticks: Copy + PartialEq + Eq {
    /// Represents a single tick.
    const ONE_TICK: Self;

    /// Compares to another tick count.
    ///
    /// Takes into account timer wrapping; if the difference is more than
    /// half the value range, the result will be flipped.
    fn compare(self, other: Self) -> cmp::Ordering;

    /// True if `self` is at the same time as `other` or later.
    ///
    /// Takes into account timer wrapping; if the difference is more than
    /// half the value range, the result will be negated.
    fn is_at_least(self, other: Self) -> bool {
        match self.compare(other) {
            cmp::Ordering::Less => false,
            cmp::Ordering::Equal => true,
            cmp::Ordering::Greater => true,
        }
    }

    /// Wrapping addition.
    fn wrapping_add(self, other: Self) -> Self;

    /// Converts a millisecond count at `hz` ticks per second, rounding up.
    ///
    /// Returns `None` if the result, plus one tick, would not fit into half the value range:
    /// an instant that far ahead compares as being in the past.
    fn from_millis(ms: u32, hz: u32) -> Option<Self>;
}

impl Ticks for u32 {
    const ONE_TICK: Self = 1;

    fn compare(self, other: Self) -> cmp::Ordering {
        (self.wrapping_sub(other) as i32).cmp(&0)
    }

    fn wrapping_add(self, other: Self) -> Self {
        u32::wrapping_add(self, other)
    }

    fn from_millis(ms: u32, hz: u32) -> Option<Self> {
        let ticks = (u64::from(ms) * u64::from(hz)).div_ceil(1_000);
        u32::try_from(ticks)
            .ok()
            .filter(|ticks| *ticks < i32::MAX as u32)
    }
}

impl Ticks for u64 {
    const ONE_TICK: Self = 1;

    fn compare(self, other: Self) -> cmp::Ordering {
        (self.wrapping_sub(other) as i64).cmp(&0)
    }

    fn wrapping_add(self, other: Self) -> Self {
        u64::wrapping_add(self, other)
    }

    fn from_millis(ms: u32, hz: u32) -> Option<Self> {
        // At most u32::MAX * u32::MAX / 1000, far below half the range
        Some((u64::from(ms) * u64::from(hz)).div_ceil(1_000))
    }
}
