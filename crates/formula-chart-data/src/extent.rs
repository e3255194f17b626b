/// `[min, max]` of a dimension over the active items.
///
/// An extent with no defined value is `[+inf, -inf]`, which reads as empty and widens correctly
/// when folded with further values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub const EMPTY: Extent = Extent {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Widen to include `value`. Missing values are skipped.
    pub fn include(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.min, self.max]
    }
}

impl Default for Extent {
    fn default() -> Self {
        Extent::EMPTY
    }
}

impl FromIterator<f64> for Extent {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut extent = Extent::EMPTY;
        for value in iter {
            extent.include(value);
        }
        extent
    }
}
