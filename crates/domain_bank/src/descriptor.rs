//! Payment descriptor codec
//!
//! Encodes the bank-readable descriptor string consumed by an external QR
//! renderer. The wire format is an ordered, `*`-delimited string of
//! `key:value` tokens with the protocol marker first:
//!
//! ```text
//! SPD*1.0*ACC:CZ6508000000192000145399*AM:425.00*CC:CZK*RN:OFFICE COFFEE*MSG:BEANS JUNE*X-REF:3F9A01BC-482917
//! ```
//!
//! Downstream scanners parse positionally by key prefix, not by index, but
//! expect the marker first; field order and delimiter are stable. Optional
//! fields (recipient name, message) are emitted only when present. The amount
//! is always fixed-point with exactly two decimals, locale-neutral.

use serde::{Deserialize, Serialize};

use core_kernel::Money;
use domain_settlement::SettlementReference;

/// Protocol marker and version emitted at the head of every descriptor
const PROTOCOL_MARKER: &str = "SPD*1.0";
const DELIMITER: char = '*';

/// Recipient data for descriptor encoding
///
/// The account identifier belongs to whoever fronted the purchase; it comes
/// from configuration, not from the core data model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Bank account identifier (IBAN)
    pub account: String,
    /// Optional display name shown by the paying app
    pub name: Option<String>,
}

impl Recipient {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Encodes the descriptor for one obligation
///
/// Deterministic: the same inputs always produce a byte-identical string,
/// which is what makes persisting the descriptor for re-rendering sound.
pub fn encode(
    recipient: &Recipient,
    amount: Money,
    reference: &SettlementReference,
    message: Option<&str>,
) -> String {
    let mut descriptor = String::from(PROTOCOL_MARKER);

    push_field(&mut descriptor, "ACC", &recipient.account);
    push_field(&mut descriptor, "AM", &amount.fixed_point());
    push_field(&mut descriptor, "CC", amount.currency().code());

    if let Some(name) = &recipient.name {
        let sanitized = sanitize(name);
        if !sanitized.is_empty() {
            push_field(&mut descriptor, "RN", &sanitized);
        }
    }
    if let Some(message) = message {
        let sanitized = sanitize(message);
        if !sanitized.is_empty() {
            push_field(&mut descriptor, "MSG", &sanitized);
        }
    }

    push_field(&mut descriptor, "X-REF", reference.as_str());
    descriptor
}

fn push_field(descriptor: &mut String, key: &str, value: &str) {
    descriptor.push(DELIMITER);
    descriptor.push_str(key);
    descriptor.push(':');
    descriptor.push_str(value);
}

/// Strips every character a bank-side parser could choke on
///
/// Allowed: alphanumerics, space, hyphen, comma, period. Everything else is
/// dropped, not escaped.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | ',' | '.'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, ObligationId};
    use rust_decimal_macros::dec;

    fn reference() -> SettlementReference {
        SettlementReference::from_stored("3F9A01BC-482917")
    }

    #[test]
    fn encodes_all_fields_in_stable_order() {
        let recipient = Recipient::new("CZ6508000000192000145399").with_name("Office Coffee");
        let amount = Money::new(dec!(425.00), Currency::CZK).unwrap();

        let descriptor = encode(&recipient, amount, &reference(), Some("Beans June"));

        assert_eq!(
            descriptor,
            "SPD*1.0*ACC:CZ6508000000192000145399*AM:425.00*CC:CZK\
             *RN:Office Coffee*MSG:Beans June*X-REF:3F9A01BC-482917"
        );
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let recipient = Recipient::new("CZ6508000000192000145399");
        let amount = Money::new(dec!(33.34), Currency::CZK).unwrap();

        let descriptor = encode(&recipient, amount, &reference(), None);

        assert!(!descriptor.contains("RN:"));
        assert!(!descriptor.contains("MSG:"));
        assert!(descriptor.starts_with("SPD*1.0*ACC:"));
        assert!(descriptor.ends_with("X-REF:3F9A01BC-482917"));
    }

    #[test]
    fn amount_always_has_two_decimals() {
        let recipient = Recipient::new("CZ65");
        let amount = Money::new(dec!(100), Currency::CZK).unwrap();

        let descriptor = encode(&recipient, amount, &reference(), None);
        assert!(descriptor.contains("*AM:100.00*"));
    }

    #[test]
    fn message_is_sanitized_not_escaped() {
        let recipient = Recipient::new("CZ65");
        let amount = Money::new(dec!(10.00), Currency::CZK).unwrap();

        let descriptor = encode(
            &recipient,
            amount,
            &reference(),
            Some("káva*: 50% (sleva)! ok-1, v2.0"),
        );

        // Diacritics, asterisks, colons, percent, parens, bang all stripped
        assert!(descriptor.contains("MSG:kva 50 sleva ok-1, v2.0*"));
    }

    #[test]
    fn blank_message_after_sanitization_is_dropped() {
        let recipient = Recipient::new("CZ65");
        let amount = Money::new(dec!(10.00), Currency::CZK).unwrap();

        let descriptor = encode(&recipient, amount, &reference(), Some("*:!?"));
        assert!(!descriptor.contains("MSG:"));
    }

    #[test]
    fn encoding_is_deterministic() {
        let recipient = Recipient::new("CZ6508000000192000145399").with_name("Kancelar");
        let amount = Money::new(dec!(33.33), Currency::CZK).unwrap();
        let id = ObligationId::new();
        let reference = SettlementReference::generate(id);

        let a = encode(&recipient, amount, &reference, Some("espresso"));
        let b = encode(&recipient, amount, &reference, Some("espresso"));
        assert_eq!(a, b);
    }
}
