//! Conversions between base units and human-scale amounts
//!
//! Display values go through a coarser integer unit first (microether for
//! balances, milli-gwei for gas prices). Anything below that granularity is
//! truncated on the way in and on the way out:
//!
//! - `1.000000000001` ether -> `10^18` wei -> `1.0` ether
//! - `0.0000009` ether -> `0` wei
//!
//! Amounts headed into a transaction are scaled from their decimal text
//! with integer arithmetic only, so binary floating point error never
//! reaches the signed value.

use thiserror::Error;

/// Wei per ether
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Wei per gwei
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Fractional decimal digits kept for ether amounts (microether)
pub const ETHER_DISPLAY_DECIMALS: u32 = 6;

/// Fractional decimal digits kept for gas prices in gwei
pub const GWEI_DISPLAY_DECIMALS: u32 = 3;

/// Unit conversion errors
#[derive(Error, Debug, PartialEq)]
pub enum UnitError {
    #[error("Amount must be finite and non-negative: {0}")]
    InvalidAmount(String),
    #[error("Amount too large: {0}")]
    Overflow(String),
}

/// A decimal denomination of the base unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denomination {
    /// Base units per display unit, as a power of ten
    pub decimals: u32,
    /// Fractional digits kept when converting
    pub kept_decimals: u32,
}

/// Ether with microether granularity
pub const ETHER: Denomination = Denomination {
    decimals: 18,
    kept_decimals: ETHER_DISPLAY_DECIMALS,
};

/// Gwei with 10^-3 gwei granularity
pub const GWEI: Denomination = Denomination {
    decimals: 9,
    kept_decimals: GWEI_DISPLAY_DECIMALS,
};

impl Denomination {
    /// Base units per smallest kept step
    fn step(&self) -> u128 {
        10u128.pow(self.decimals - self.kept_decimals)
    }

    /// Base units -> display units, truncating below the kept granularity
    pub fn to_display(&self, base: u128) -> f64 {
        let steps = base / self.step();
        steps as f64 / 10u128.pow(self.kept_decimals) as f64
    }

    /// Display units -> base units, truncating below the kept granularity
    pub fn from_display(&self, amount: f64) -> Result<u128, UnitError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(UnitError::InvalidAmount(amount.to_string()));
        }
        if amount == 0.0 {
            return Ok(0);
        }
        // Display for f64 is the shortest decimal that round-trips and never
        // uses exponent notation.
        self.parse(&amount.to_string())
    }

    /// Decimal text -> base units, truncating below the kept granularity
    pub fn parse(&self, text: &str) -> Result<u128, UnitError> {
        let text = text.trim();
        let invalid = || UnitError::InvalidAmount(text.to_string());
        let overflow = || UnitError::Overflow(text.to_string());

        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let kept = self.kept_decimals as usize;
        let mut fraction_digits: String = fraction.chars().take(kept).collect();
        while fraction_digits.len() < kept {
            fraction_digits.push('0');
        }

        let whole_value: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let fraction_value: u128 = if fraction_digits.is_empty() {
            0
        } else {
            fraction_digits.parse().map_err(|_| invalid())?
        };

        let steps = whole_value
            .checked_mul(10u128.pow(self.kept_decimals))
            .and_then(|v| v.checked_add(fraction_value))
            .ok_or_else(overflow)?;
        steps.checked_mul(self.step()).ok_or_else(overflow)
    }
}

/// Wei -> ether at microether granularity
pub fn wei_to_ether(wei: u128) -> f64 {
    ETHER.to_display(wei)
}

/// Ether -> wei, truncated to whole microether
pub fn ether_to_wei(ether: f64) -> Result<u128, UnitError> {
    ETHER.from_display(ether)
}

/// Wei -> gwei at 10^-3 gwei granularity
pub fn wei_to_gwei(wei: u128) -> f64 {
    GWEI.to_display(wei)
}

/// Gwei -> wei, truncated to 10^-3 gwei
pub fn gwei_to_wei(gwei: f64) -> Result<u128, UnitError> {
    GWEI.from_display(gwei)
}
