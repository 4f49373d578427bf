//! Integration tests for the money kernel

use core_kernel::{Currency, Money, MoneyError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn minor_unit_conversion_is_exact_for_valid_input() {
    let m = Money::new(dec!(100.00), Currency::CZK).unwrap();
    assert_eq!(m.to_minor().unwrap(), 10_000);

    let m = Money::new(dec!(0.01), Currency::CZK).unwrap();
    assert_eq!(m.to_minor().unwrap(), 1);
}

#[test]
fn sub_minor_precision_is_rejected_not_rounded() {
    for raw in [dec!(0.001), dec!(33.333), dec!(99.999)] {
        let result = Money::new(raw, Currency::CZK);
        assert!(
            matches!(result, Err(MoneyError::SubMinorPrecision(_))),
            "{raw} should be rejected"
        );
    }
}

#[test]
fn display_is_locale_neutral() {
    let m = Money::from_minor(85_000, Currency::CZK);
    assert_eq!(m.to_string(), "850.00 CZK");
    assert_eq!(m.fixed_point(), "850.00");
}

#[test]
fn cross_currency_arithmetic_is_refused() {
    let czk = Money::from_minor(100, Currency::CZK);
    let eur = Money::from_minor(100, Currency::EUR);
    assert!(czk.checked_add(&eur).is_err());
    assert!(czk.checked_sub(&eur).is_err());
    assert!(czk.saturating_sub(&eur).is_err());
}

#[test]
fn minor_unit_conversion_fails_beyond_i64() {
    let huge = Decimal::from_i128_with_scale(100_000_000_000_000_000_000, 0);
    let m = Money::new(huge, Currency::CZK).unwrap();
    assert!(matches!(m.to_minor(), Err(MoneyError::InvalidAmount(_))));
}
