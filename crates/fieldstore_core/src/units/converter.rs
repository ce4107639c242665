//! Conversion strategies between a unit and its dimension's base quantity.

use super::error::{UnitError, UnitResult};
use std::fmt::Debug;

/// Maps values between one unit and the implicit base quantity of its
/// dimension.
///
/// Implementations must be inverse of each other up to floating-point error:
/// `from_base(to_base(x)) ≈ x`.
pub trait UnitConverter: Debug + Send + Sync {
    fn to_base(&self, value: f64) -> f64;
    fn from_base(&self, value: f64) -> f64;
}

/// Linear scale converter: one base quantity equals `factor` of this unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorConverter {
    factor: f64,
}

impl FactorConverter {
    /// Creates a scale converter.
    ///
    /// # Errors
    /// - Returns `InvalidFactor` when `factor` is zero, NaN or infinite.
    pub fn new(factor: f64) -> UnitResult<Self> {
        if !factor.is_finite() || factor == 0.0 {
            return Err(UnitError::InvalidFactor(factor));
        }
        Ok(Self { factor })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl UnitConverter for FactorConverter {
    fn to_base(&self, value: f64) -> f64 {
        value / self.factor
    }

    fn from_base(&self, value: f64) -> f64 {
        value * self.factor
    }
}

#[cfg(test)]
mod tests {
    use super::{FactorConverter, UnitConverter};
    use crate::units::UnitError;

    #[test]
    fn factor_converter_scales_in_both_directions() {
        let cents = FactorConverter::new(100.0).unwrap();
        assert_eq!(cents.from_base(2.5), 250.0);
        assert_eq!(cents.to_base(250.0), 2.5);
    }

    #[test]
    fn rejects_degenerate_factors() {
        for factor in [0.0, f64::NAN, f64::INFINITY] {
            let err = FactorConverter::new(factor).unwrap_err();
            assert!(matches!(err, UnitError::InvalidFactor(_)));
        }
    }
}
