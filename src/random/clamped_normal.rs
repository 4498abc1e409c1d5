use rand_distr::Normal;

use crate::rand::distr::Distribution;
use crate::rand::Rng;

/// A normal distribution centered on `center` whose draws are clamped to a window of width
/// `spread` around the center.
///
/// The standard deviation is `spread / 6`, so about 99.7% of unclamped draws already land in
/// `[center - spread / 2, center + spread / 2]`; the rest are pinned to the nearer bound.
/// This is the shared "number around X" utility used for household sizes and for
/// per-individual ambient degree targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampedNormal {
    center: f64,
    spread: f64,
    normal: Option<Normal<f64>>,
}

impl ClampedNormal {
    /// Creates the distribution. Negative or non-finite spreads are treated as zero, in which
    /// case every draw returns `center`.
    #[must_use]
    pub fn new(center: f64, spread: f64) -> Self {
        let spread = if spread.is_finite() && spread > 0.0 {
            spread
        } else {
            0.0
        };
        // `Normal::new` only fails for a negative or non-finite standard deviation.
        let normal = if spread > 0.0 {
            Normal::new(center, spread / 6.0).ok()
        } else {
            None
        };
        ClampedNormal {
            center,
            spread,
            normal,
        }
    }

    #[must_use]
    pub fn center(&self) -> f64 {
        self.center
    }

    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.center - self.spread / 2.0
    }

    #[must_use]
    pub fn upper_bound(&self) -> f64 {
        self.center + self.spread / 2.0
    }

    /// Draws a value and rounds it to the nearest non-negative integer.
    pub fn sample_count<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let value = self.sample(rng).round();
        if value <= 0.0 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = value as usize;
            count
        }
    }
}

impl Distribution<f64> for ClampedNormal {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.normal {
            Some(normal) => normal
                .sample(rng)
                .clamp(self.lower_bound(), self.upper_bound()),
            None => self.center,
        }
    }
}
