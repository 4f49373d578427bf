//! Pre-built test data for common entities

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{Currency, GroupId, Money, ParticipantId};

/// CZK amount from a decimal literal; panics on sub-minor precision
pub fn czk(amount: Decimal) -> Money {
    Money::new(amount, Currency::CZK).expect("fixture amount must be minor-unit exact")
}

/// CZK amount from minor units
pub fn czk_minor(minor: i64) -> Money {
    Money::from_minor(minor, Currency::CZK)
}

/// A fixed, valid purchase date
pub fn purchase_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

/// `n` fresh participant identifiers in a stable order
pub fn participants(n: usize) -> Vec<ParticipantId> {
    (0..n).map(|_| ParticipantId::new()).collect()
}

/// A fresh group identifier
pub fn group() -> GroupId {
    GroupId::new()
}
