use rand::Rng;
use rand_distr::{Distribution as _, Exp};
use testing_framework_config::constants::DEFAULT_AMOUNT_MEAN;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AmountSamplerError {
    #[error("amount mean must be a positive finite number (got {0})")]
    InvalidMean(f64),
}

/// Draws strictly positive amounts from an exponential distribution:
/// `ceil(Exp(mean)) + 1`.
#[derive(Clone, Copy, Debug)]
pub struct AmountSampler {
    mean: f64,
    distribution: Exp<f64>,
}

impl AmountSampler {
    pub fn new(mean: f64) -> Result<Self, AmountSamplerError> {
        if !mean.is_finite() || mean <= 0.0 {
            return Err(AmountSamplerError::InvalidMean(mean));
        }
        let distribution = Exp::new(1.0 / mean).map_err(|_| AmountSamplerError::InvalidMean(mean))?;
        Ok(Self { mean, distribution })
    }

    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sample<R>(&self, rng: &mut R) -> u64
    where
        R: Rng + ?Sized,
    {
        let raw = self.distribution.sample(rng);
        // `as` saturates, so a pathological draw cannot wrap to zero.
        (raw.ceil() as u64).saturating_add(1)
    }
}

impl Default for AmountSampler {
    fn default() -> Self {
        Self {
            mean: DEFAULT_AMOUNT_MEAN,
            distribution: Exp::new(1.0 / DEFAULT_AMOUNT_MEAN)
                .unwrap_or_else(|_| unreachable!("default mean is positive")),
        }
    }
}
