/// One slot of the progress timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Segment {
    fill_fraction: f64,
}

impl Segment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&self) -> f64 {
        self.fill_fraction
    }

    /// Writes are clamped to `[0.0, 1.0]`; NaN reads as empty.
    pub fn set_fill(&mut self, fraction: f64) {
        self.fill_fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
    }

    pub fn is_complete(&self) -> bool {
        self.fill_fraction >= 1.0
    }
}
