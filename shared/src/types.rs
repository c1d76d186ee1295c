//! Common types used across the platform

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Decimal places kept for lengths, weights and money
pub const LENGTH_SCALE: u32 = 4;

/// Round a length to the shared fixed-point precision.
///
/// Midpoints round away from zero. The result is normalized so that equal
/// lengths always serialize identically ("500" rather than "500.0000").
pub fn round_length(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(LENGTH_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Which materials a recompute or change notification covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "material_ids")]
pub enum MaterialScope {
    /// Every material in the catalog
    All,
    /// Only the listed materials
    Materials(Vec<Uuid>),
}

impl MaterialScope {
    /// Scope covering the given ids, deduplicated in first-seen order
    pub fn materials(ids: impl IntoIterator<Item = Uuid>) -> Self {
        let mut unique: Vec<Uuid> = Vec::new();
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        MaterialScope::Materials(unique)
    }

    /// Material filter for store queries; `None` means no filter
    pub fn as_filter(&self) -> Option<&[Uuid]> {
        match self {
            MaterialScope::All => None,
            MaterialScope::Materials(ids) => Some(ids.as_slice()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, MaterialScope::Materials(ids) if ids.is_empty())
    }
}

impl From<Option<Vec<Uuid>>> for MaterialScope {
    fn from(ids: Option<Vec<Uuid>>) -> Self {
        match ids {
            Some(ids) => MaterialScope::materials(ids),
            None => MaterialScope::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_length_four_places() {
        let value = Decimal::from_str("12.345678").unwrap();
        assert_eq!(round_length(value), Decimal::from_str("12.3457").unwrap());
    }

    #[test]
    fn test_round_length_midpoint_away_from_zero() {
        assert_eq!(
            round_length(Decimal::from_str("0.00005").unwrap()),
            Decimal::from_str("0.0001").unwrap()
        );
        assert_eq!(
            round_length(Decimal::from_str("-0.00005").unwrap()),
            Decimal::from_str("-0.0001").unwrap()
        );
    }

    #[test]
    fn test_round_length_normalizes_scale() {
        let value = Decimal::from_str("500.0000").unwrap();
        assert_eq!(round_length(value).to_string(), "500");
    }

    #[test]
    fn test_scope_deduplicates() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let scope = MaterialScope::materials([id, other, id]);
        assert_eq!(scope, MaterialScope::Materials(vec![id, other]));
    }

    #[test]
    fn test_scope_filter() {
        assert_eq!(MaterialScope::All.as_filter(), None);
        assert!(MaterialScope::Materials(vec![]).is_empty());
        assert!(!MaterialScope::All.is_empty());
    }
}
