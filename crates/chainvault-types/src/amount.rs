use crate::error::TypesError;
use std::fmt;

/// A token amount in base units (wei, lamports, sun, or token base units)
/// together with the number of decimals of its asset.
///
/// `u128` covers every supply the wallet deals with: the total ETH supply in
/// wei is around 2^87.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Amount {
    base_units: u128,
    decimals: u8,
}

impl Amount {
    /// Largest decimals value for which `10^decimals` fits in a u128
    pub const MAX_DECIMALS: u8 = 38;

    pub const fn from_base_units(base_units: u128, decimals: u8) -> Self {
        Self {
            base_units,
            decimals,
        }
    }

    pub const fn zero(decimals: u8) -> Self {
        Self::from_base_units(0, decimals)
    }

    pub const fn base_units(&self) -> u128 {
        self.base_units
    }

    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    pub const fn is_zero(&self) -> bool {
        self.base_units == 0
    }

    /// Parse a human decimal string such as `"1.5"` or `".25"` exactly.
    pub fn parse(s: &str, decimals: u8) -> Result<Self, TypesError> {
        if decimals > Self::MAX_DECIMALS {
            return Err(TypesError::InvalidAmount(format!(
                "unsupported decimals: {}",
                decimals
            )));
        }
        let s = s.trim();
        if s.is_empty() {
            return Err(TypesError::InvalidAmount("empty amount".to_string()));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(TypesError::InvalidAmount(s.to_string()));
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(TypesError::InvalidAmount(s.to_string()));
        }
        if frac.len() > decimals as usize {
            return Err(TypesError::TooManyDecimals {
                max: decimals,
                actual: frac.len(),
            });
        }

        let scale = 10u128.pow(decimals as u32);
        let whole_units = if whole.is_empty() {
            0u128
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| TypesError::AmountOverflow)?
        };

        let mut frac_units = 0u128;
        if !frac.is_empty() {
            let padded = format!("{:0<width$}", frac, width = decimals as usize);
            frac_units = padded
                .parse::<u128>()
                .map_err(|_| TypesError::AmountOverflow)?;
        }

        let base_units = whole_units
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_units))
            .ok_or(TypesError::AmountOverflow)?;

        Ok(Self {
            base_units,
            decimals,
        })
    }

    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        if self.decimals != rhs.decimals {
            return None;
        }
        self.base_units
            .checked_add(rhs.base_units)
            .map(|v| Self::from_base_units(v, self.decimals))
    }

    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        if self.decimals != rhs.decimals {
            return None;
        }
        self.base_units
            .checked_sub(rhs.base_units)
            .map(|v| Self::from_base_units(v, self.decimals))
    }

    /// Lossy conversion for display and fiat valuation only
    pub fn to_f64(&self) -> f64 {
        self.base_units as f64 / 10f64.powi(self.decimals as i32)
    }
}

impl fmt::Display for Amount {
    /// Exact decimal rendering with trailing zeros trimmed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.base_units);
        }
        // past MAX_DECIMALS every u128 is below one whole unit
        let (whole, frac) = match 10u128.checked_pow(self.decimals as u32) {
            Some(scale) => (self.base_units / scale, self.base_units % scale),
            None => (0, self.base_units),
        };
        if frac == 0 {
            return write!(f, "{}", whole);
        }
        let frac_str = format!("{:0>width$}", frac, width = self.decimals as usize);
        write!(f, "{}.{}", whole, frac_str.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        let a = Amount::parse("1.5", 18).unwrap();
        assert_eq!(a.base_units(), 1_500_000_000_000_000_000);

        let b = Amount::parse(".25", 6).unwrap();
        assert_eq!(b.base_units(), 250_000);

        let c = Amount::parse("42", 9).unwrap();
        assert_eq!(c.base_units(), 42_000_000_000);

        let d = Amount::parse("3.", 6).unwrap();
        assert_eq!(d.base_units(), 3_000_000);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Amount::parse("", 18).is_err());
        assert!(Amount::parse(".", 18).is_err());
        assert!(Amount::parse("-1", 18).is_err());
        assert!(Amount::parse("1e18", 18).is_err());
        assert!(Amount::parse("1.2.3", 18).is_err());
        assert_eq!(
            Amount::parse("0.0000001", 6),
            Err(TypesError::TooManyDecimals { max: 6, actual: 7 })
        );
    }

    #[test]
    fn test_parse_overflow() {
        let huge = "9".repeat(40);
        assert_eq!(Amount::parse(&huge, 18), Err(TypesError::AmountOverflow));
    }

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(Amount::from_base_units(1_500_000, 6).to_string(), "1.5");
        assert_eq!(Amount::from_base_units(1_000_000, 6).to_string(), "1");
        assert_eq!(Amount::from_base_units(1, 9).to_string(), "0.000000001");
        assert_eq!(Amount::from_base_units(17, 0).to_string(), "17");
    }

    #[test]
    fn test_mixed_decimals_arithmetic_refused() {
        let a = Amount::from_base_units(1, 6);
        let b = Amount::from_base_units(1, 9);
        assert!(a.checked_add(&b).is_none());
        assert!(a.checked_sub(&b).is_none());
        assert_eq!(b.checked_sub(&b).unwrap(), Amount::zero(9));
    }

    #[test]
    fn test_display_beyond_max_decimals() {
        assert_eq!(
            Amount::from_base_units(1, 39).to_string(),
            format!("0.{}1", "0".repeat(38))
        );
        assert_eq!(Amount::from_base_units(0, 200).to_string(), "0");
        let max = Amount::from_base_units(u128::MAX, 255).to_string();
        assert!(max.starts_with("0.") && max.ends_with(&u128::MAX.to_string()));
    }

    proptest! {
        #[test]
        fn prop_display_parse_identity(units in any::<u64>(), decimals in 0u8..=18) {
            let amount = Amount::from_base_units(units as u128, decimals);
            let parsed = Amount::parse(&amount.to_string(), decimals).unwrap();
            prop_assert_eq!(parsed, amount);
        }
    }
}
