// file: src/models/event.rs
// description: tabular business event row and its fixed-point amount
// reference: https://clickhouse.com/docs/en/sql-reference/data-types/decimal

use chrono::{DateTime, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Row of the `events` table (and of the S3-backed `s3_events` table).
#[derive(Debug, Clone, PartialEq, Row, Serialize, Deserialize)]
pub struct TabularEvent {
    pub event_id: u32,
    #[serde(with = "clickhouse::serde::chrono::datetime")]
    pub event_time: DateTime<Utc>,
    pub customer_id: u32,
    pub event_type: String,
    pub amount: Amount,
}

/// Money amount stored as `Decimal(10, 2)`, i.e. a Decimal64 scaled by 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub const SCALE: u32 = 2;
    const FACTOR: i64 = 100;
    /// Largest magnitude `Decimal(10, 2)` holds: 99,999,999.99.
    pub const MAX_CENTS: i64 = 9_999_999_999;

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{}{}.{:02}",
            sign,
            abs / Self::FACTOR as u64,
            abs % Self::FACTOR as u64
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAmountError(String);

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid amount '{}'", self.0)
    }
}

impl std::error::Error for ParseAmountError {}

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Accepts plain decimal notation; digits past the second decimal are rounded half away from zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseAmountError(s.to_string());
        let trimmed = s.trim();

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut digits = fraction.bytes().map(|b| (b - b'0') as i64);
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().map(|d| d >= 5).unwrap_or(false);

        let mut cents = whole_value
            .checked_mul(Self::FACTOR)
            .and_then(|v| v.checked_add(tenths * 10 + hundredths))
            .ok_or_else(invalid)?;
        if round_up {
            cents = cents.checked_add(1).ok_or_else(invalid)?;
        }
        if cents > Self::MAX_CENTS {
            return Err(invalid());
        }

        Ok(Self(if negative { -cents } else { cents }))
    }
}
