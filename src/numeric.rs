//! Fixed-point summation for running durations.
//!
//! Every addend is scaled by [`FIXED_POINT_SCALE`] before it is accumulated
//! and the total is scaled back once, so sums such as `0.1 + 0.2` come out as
//! `0.3` instead of `0.30000000000000004`.

/// Scale applied to each addend before accumulation.
pub const FIXED_POINT_SCALE: f64 = 10_000.0;

/// Sum a sequence of seconds values with the fixed-point discipline.
pub fn fixed_sum<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut acc = FixedSum::new();
    for v in values {
        acc.add(v);
    }
    acc.value()
}

/// Running fixed-point accumulator, used by cursors that walk a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedSum {
    scaled: f64,
}

impl FixedSum {
    pub fn new() -> Self {
        Self { scaled: 0.0 }
    }

    /// Start the accumulator at `value` instead of zero.
    pub fn starting_at(value: f64) -> Self {
        Self {
            scaled: value * FIXED_POINT_SCALE,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.scaled += value * FIXED_POINT_SCALE;
    }

    pub fn value(&self) -> f64 {
        self.scaled / FIXED_POINT_SCALE
    }
}
