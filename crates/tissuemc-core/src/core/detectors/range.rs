use super::input::DetectorError;
use serde::Serialize;

/// `number` evenly spaced bin edges from `start` to `stop`, giving `number - 1` bins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoubleRange {
    start: f64,
    stop: f64,
    number: usize,
}

impl DoubleRange {
    pub fn new(start: f64, stop: f64, number: usize) -> Result<Self, DetectorError> {
        if !start.is_finite() || !stop.is_finite() || stop <= start || number < 2 {
            return Err(DetectorError::InvalidRange {
                start,
                stop,
                number,
            });
        }
        Ok(Self {
            start,
            stop,
            number,
        })
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> f64 {
        self.stop
    }

    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }

    #[inline]
    pub fn bin_count(&self) -> usize {
        self.number - 1
    }

    #[inline]
    pub fn delta(&self) -> f64 {
        (self.stop - self.start) / (self.number - 1) as f64
    }

    pub fn edges(&self) -> Vec<f64> {
        let delta = self.delta();
        (0..self.number)
            .map(|i| {
                if i == self.number - 1 {
                    self.stop
                } else {
                    self.start + i as f64 * delta
                }
            })
            .collect()
    }

    /// Bin holding `value` under the closed-open convention `[edge_i, edge_i+1)`, or `None`
    /// when the value lies outside `[start, stop)` or is NaN.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if !(value >= self.start && value < self.stop) {
            return None;
        }
        let index = ((value - self.start) / self.delta()) as usize;
        Some(index.min(self.bin_count() - 1))
    }
}
