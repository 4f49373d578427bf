//! Purchase split calculator
//!
//! Splits a purchase total among an ordered participant list with zero
//! rounding loss. All arithmetic happens in integer minor units; the first
//! `total mod n` participants absorb the remainder, one minor unit each, so
//! no two shares differ by more than one minor unit.
//!
//! The function is pure: same total and same participant order always produce
//! the same shares. Participant order is significant and caller-controlled
//! (typically group-membership order).

use core_kernel::{Money, ParticipantId};

use crate::error::SettlementError;

/// One participant's computed share of a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Share {
    pub participant: ParticipantId,
    pub amount: Money,
}

/// Splits `total` among `participants` exactly
///
/// # Errors
///
/// - `EmptyParticipants` if the list is empty
/// - `InvalidAmount` if the total is not strictly positive, or too small to
///   give every participant at least one minor unit
/// - `SplitIntegrity` if the shares fail to sum back to the total; this is
///   a defensive check against internal bugs and is never auto-corrected
pub fn split(total: Money, participants: &[ParticipantId]) -> Result<Vec<Share>, SettlementError> {
    if participants.is_empty() {
        return Err(SettlementError::EmptyParticipants);
    }
    if !total.is_positive() {
        return Err(SettlementError::invalid_amount(format!(
            "purchase total must be positive, got {total}"
        )));
    }

    let currency = total.currency();
    let total_units = total.to_minor()?;
    let n = participants.len() as i64;

    if total_units < n {
        return Err(SettlementError::invalid_amount(format!(
            "total of {total_units} minor units cannot cover {n} participants"
        )));
    }

    let base = total_units / n;
    let remainder = total_units % n;

    let shares: Vec<Share> = participants
        .iter()
        .enumerate()
        .map(|(i, participant)| {
            let units = if (i as i64) < remainder { base + 1 } else { base };
            Share {
                participant: *participant,
                amount: Money::from_minor(units, currency),
            }
        })
        .collect();

    // The shares must reconstruct the total exactly.
    let sum: i64 = shares
        .iter()
        .map(|s| s.amount.to_minor())
        .sum::<Result<i64, _>>()?;
    if sum != total_units {
        return Err(SettlementError::SplitIntegrity {
            expected: total.amount(),
            actual: Money::from_minor(sum, currency).amount(),
        });
    }

    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn czk(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::CZK).unwrap()
    }

    fn participants(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|_| ParticipantId::new()).collect()
    }

    #[test]
    fn splits_100_czk_three_ways() {
        let people = participants(3);
        let shares = split(czk(dec!(100.00)), &people).unwrap();

        assert_eq!(shares[0].amount.amount(), dec!(33.34));
        assert_eq!(shares[1].amount.amount(), dec!(33.33));
        assert_eq!(shares[2].amount.amount(), dec!(33.33));
    }

    #[test]
    fn splits_850_czk_two_ways_evenly() {
        let people = participants(2);
        let shares = split(czk(dec!(850.00)), &people).unwrap();

        assert_eq!(shares[0].amount.amount(), dec!(425.00));
        assert_eq!(shares[1].amount.amount(), dec!(425.00));
    }

    #[test]
    fn single_participant_gets_everything() {
        let people = participants(1);
        let shares = split(czk(dec!(320.00)), &people).unwrap();

        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].amount.amount(), dec!(320.00));
    }

    #[test]
    fn remainder_goes_to_first_participants() {
        let people = participants(3);
        // 100.01 / 3 = 33.33 base, 2 units of remainder
        let shares = split(czk(dec!(100.01)), &people).unwrap();

        assert_eq!(shares[0].amount.amount(), dec!(33.34));
        assert_eq!(shares[1].amount.amount(), dec!(33.34));
        assert_eq!(shares[2].amount.amount(), dec!(33.33));
    }

    #[test]
    fn order_is_deterministic() {
        let people = participants(5);
        let a = split(czk(dec!(77.77)), &people).unwrap();
        let b = split(czk(dec!(77.77)), &people).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_empty_participants() {
        let result = split(czk(dec!(100.00)), &[]);
        assert!(matches!(result, Err(SettlementError::EmptyParticipants)));
    }

    #[test]
    fn rejects_non_positive_total() {
        let people = participants(2);
        assert!(matches!(
            split(Money::zero(Currency::CZK), &people),
            Err(SettlementError::InvalidAmount(_))
        ));
        assert!(matches!(
            split(czk(dec!(-5.00)), &people),
            Err(SettlementError::InvalidAmount(_))
        ));
    }

    #[test]
    fn rejects_total_too_small_to_cover_everyone() {
        let people = participants(3);
        let result = split(czk(dec!(0.02)), &people);
        assert!(matches!(result, Err(SettlementError::InvalidAmount(_))));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::Currency;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn shares_sum_exactly_to_total(
            units in 1i64..100_000_000i64,
            n in 1usize..50usize
        ) {
            prop_assume!(units >= n as i64);
            let total = Money::from_minor(units, Currency::CZK);
            let people: Vec<ParticipantId> = (0..n).map(|_| ParticipantId::new()).collect();

            let shares = split(total, &people).unwrap();
            let sum: i64 = shares.iter().map(|s| s.amount.to_minor().unwrap()).sum();
            prop_assert_eq!(sum, units);
        }

        #[test]
        fn share_spread_is_at_most_one_minor_unit(
            units in 1i64..100_000_000i64,
            n in 1usize..50usize
        ) {
            prop_assume!(units >= n as i64);
            let total = Money::from_minor(units, Currency::CZK);
            let people: Vec<ParticipantId> = (0..n).map(|_| ParticipantId::new()).collect();

            let shares = split(total, &people).unwrap();
            let min = shares.iter().map(|s| s.amount.to_minor().unwrap()).min().unwrap();
            let max = shares.iter().map(|s| s.amount.to_minor().unwrap()).max().unwrap();
            prop_assert!(max - min <= 1);
        }

        #[test]
        fn remainder_positions_are_stable(
            units in 1i64..1_000_000i64,
            n in 2usize..20usize
        ) {
            prop_assume!(units >= n as i64);
            let total = Money::from_minor(units, Currency::CZK);
            let people: Vec<ParticipantId> = (0..n).map(|_| ParticipantId::new()).collect();

            let shares = split(total, &people).unwrap();
            let remainder = (units % n as i64) as usize;
            for (i, share) in shares.iter().enumerate() {
                let expected = units / n as i64 + if i < remainder { 1 } else { 0 };
                prop_assert_eq!(share.amount.to_minor().unwrap(), expected);
            }
        }
    }
}
