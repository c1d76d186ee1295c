//! Validation utilities for purchase orders and length adjustments

use rust_decimal::Decimal;

use crate::types::LENGTH_SCALE;

/// Longest note accepted on orders and adjustments
pub const MAX_NOTE_LENGTH: usize = 2000;

/// Validate an ordered quantity (non-negative, four decimals at most)
pub fn validate_order_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err("Ordered quantity cannot be negative");
    }
    if exceeds_length_scale(quantity) {
        return Err("Ordered quantity allows at most four decimal places");
    }
    Ok(())
}

/// Validate a length adjustment (non-zero, four decimals at most)
pub fn validate_adjustment_length(length: Decimal) -> Result<(), &'static str> {
    if length.is_zero() {
        return Err("Adjustment length cannot be zero");
    }
    if exceeds_length_scale(length) {
        return Err("Adjustment length allows at most four decimal places");
    }
    Ok(())
}

/// Validate free-text notes
pub fn validate_note(note: &str) -> Result<(), &'static str> {
    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err("Note is too long");
    }
    Ok(())
}

fn exceeds_length_scale(value: Decimal) -> bool {
    value.normalize().scale() > LENGTH_SCALE
}
