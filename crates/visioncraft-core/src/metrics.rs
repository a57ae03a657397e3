use serde::Serialize;

/// Sizes reported by the service after a transform, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SizeReport {
    pub original_kb: f64,
    pub compressed_kb: f64,
}

impl SizeReport {
    pub fn new(original_kb: f64, compressed_kb: f64) -> Self {
        Self {
            original_kb,
            compressed_kb,
        }
    }

    pub fn saved_percentage(&self) -> i64 {
        saved_percentage(self.original_kb, self.compressed_kb)
    }

    pub fn saved_kb(&self) -> f64 {
        self.original_kb - self.compressed_kb
    }
}

/// `round((original - compressed) / original * 100)`, rounding half up.
///
/// A non-positive (or non-finite) original size reports 0. Output larger than the
/// input gives a negative percentage.
pub fn saved_percentage(original_kb: f64, compressed_kb: f64) -> i64 {
    if !original_kb.is_finite() || !compressed_kb.is_finite() || original_kb <= 0.0 {
        return 0;
    }
    let ratio = (original_kb - compressed_kb) / original_kb * 100.0;
    (ratio + 0.5).floor() as i64
}
