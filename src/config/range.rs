//! Hostname range expansion for `ws` lines.
//!
//! `w20-575-[1-3].mit.edu` expands to `w20-575-1.mit.edu`, `w20-575-2.mit.edu`
//! and `w20-575-3.mit.edu`. Only the first `[` of a token is considered; a token
//! without a well-formed `[<digits>-<digits>]` group is a literal hostname.

use thiserror::Error;

/// Errors for a well-formed but unusable range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("range [{low}-{high}] is inverted")]
    Inverted { low: u32, high: u32 },

    #[error("range bound {0} is too large")]
    BoundTooLarge(String),

    #[error("range [{low}-{high}] expands to more than {max} hosts", max = MAX_RANGE_LEN)]
    TooLarge { low: u32, high: u32 },
}

/// Most hostnames a single range may expand to.
pub const MAX_RANGE_LEN: u64 = 65_536;

/// A bracketed numeric range found in a host token.
///
/// Only [`find_numeric_range`] builds one, so `low <= high` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRange<'a> {
    prefix: &'a str,
    low: u32,
    high: u32,
    suffix: &'a str,
}

impl<'a> NumericRange<'a> {
    /// Text before the `[`.
    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    /// Text after the `]`.
    pub fn suffix(&self) -> &'a str {
        self.suffix
    }

    pub fn low(&self) -> u32 {
        self.low
    }

    pub fn high(&self) -> u32 {
        self.high
    }

    /// Number of hostnames the range expands to.
    pub fn len(&self) -> usize {
        self.high.saturating_sub(self.low) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Hostnames from `low` to `high` inclusive.
    pub fn hostnames(&self) -> impl Iterator<Item = String> + 'a {
        let range = *self;
        (range.low..=range.high).map(move |i| format!("{}{}{}", range.prefix, i, range.suffix))
    }
}

/// Locate a numeric range in `token`.
///
/// Returns `Ok(None)` when the token has no well-formed range.
pub fn find_numeric_range(token: &str) -> Result<Option<NumericRange<'_>>, RangeError> {
    let Some(open) = token.find('[') else {
        return Ok(None);
    };
    let prefix = &token[..open];
    let rest = &token[open + 1..];

    let low_len = digit_prefix_len(rest);
    if low_len == 0 {
        return Ok(None);
    }
    let Some(after_dash) = rest[low_len..].strip_prefix('-') else {
        return Ok(None);
    };
    let high_len = digit_prefix_len(after_dash);
    if high_len == 0 {
        return Ok(None);
    }
    let Some(suffix) = after_dash[high_len..].strip_prefix(']') else {
        return Ok(None);
    };

    let low = parse_bound(&rest[..low_len])?;
    let high = parse_bound(&after_dash[..high_len])?;
    if low > high {
        return Err(RangeError::Inverted { low, high });
    }
    if u64::from(high - low) + 1 > MAX_RANGE_LEN {
        return Err(RangeError::TooLarge { low, high });
    }

    Ok(Some(NumericRange {
        prefix,
        low,
        high,
        suffix,
    }))
}

/// Expand a host token into the hostnames it denotes.
pub fn expand_hostspec(token: &str) -> Result<Vec<String>, RangeError> {
    match find_numeric_range(token)? {
        Some(range) => Ok(range.hostnames().collect()),
        None => Ok(vec![token.to_string()]),
    }
}

fn digit_prefix_len(s: &str) -> usize {
    s.bytes().take_while(|b| b.is_ascii_digit()).count()
}

fn parse_bound(digits: &str) -> Result<u32, RangeError> {
    digits
        .parse()
        .map_err(|_| RangeError::BoundTooLarge(digits.to_string()))
}
