//! Builder patterns for test data construction

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{GroupId, Money, ParticipantId};
use domain_settlement::NewPurchase;

use crate::fixtures::{czk, participants, purchase_date};

/// Builds `NewPurchase` requests with sensible defaults
///
/// Defaults to a group purchase of 100.00 CZK among three participants.
pub struct PurchaseBuilder {
    group_id: Option<GroupId>,
    total: Money,
    purchased_on: NaiveDate,
    participants: Vec<ParticipantId>,
    location: Option<String>,
    note: Option<String>,
}

impl Default for PurchaseBuilder {
    fn default() -> Self {
        Self {
            group_id: Some(GroupId::new()),
            total: czk(Decimal::new(10_000, 2)),
            purchased_on: purchase_date(),
            participants: participants(3),
            location: None,
            note: None,
        }
    }
}

impl PurchaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Personal purchase: no group, exactly one participant
    pub fn personal(mut self) -> Self {
        self.group_id = None;
        self.participants = participants(1);
        self
    }

    pub fn group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn total(mut self, total: Money) -> Self {
        self.total = total;
        self
    }

    pub fn participants(mut self, participants: Vec<ParticipantId>) -> Self {
        self.participants = participants;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.purchased_on = date;
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn build(self) -> NewPurchase {
        NewPurchase {
            group_id: self.group_id,
            total: self.total,
            purchased_on: self.purchased_on,
            participants: self.participants,
            location: self.location,
            note: self.note,
        }
    }
}
