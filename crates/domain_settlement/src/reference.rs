//! Settlement references
//!
//! A settlement reference is the sole key external bank systems use to
//! address an obligation. It is generated exactly once when the obligation
//! is created, never regenerated, and never reused.

use core_kernel::ObligationId;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-typeable ASCII token identifying one obligation to banks
///
/// Format: an 8-character uppercase hex fragment of the obligation id,
/// a hyphen, and a 6-digit random disambiguator (`3F9A01BC-482917`).
/// The fragment makes the token traceable to its obligation; the
/// disambiguator keeps tokens unpredictable and collision-resistant even
/// if id fragments ever coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettlementReference(String);

impl SettlementReference {
    /// Generates the reference for a freshly created obligation
    pub fn generate(obligation_id: ObligationId) -> Self {
        let hex = obligation_id.as_uuid().simple().to_string();
        let fragment = hex[..8].to_uppercase();
        let disambiguator: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        Self(format!("{fragment}-{disambiguator}"))
    }

    /// Rehydrates a reference loaded from the store. No validation: stored
    /// references were validated at generation time and are immutable.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SettlementReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
