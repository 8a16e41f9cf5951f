//! Validation utilities for the stock ledger
//!
//! Quantity and cost checks applied at the ledger boundary before any
//! storage round-trip.

use rust_decimal::Decimal;

/// Validate a mutation quantity (receive, issue, reserve, release,
/// transfer). Fractional units are allowed, zero and negatives are not.
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate an absolute counted quantity. Zero is a legitimate count.
pub fn validate_counted_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Counted quantity cannot be negative");
    }
    Ok(())
}

/// Validate a per-unit cost supplied by the caller
pub fn validate_unit_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_positive_quantity() {
        assert!(validate_positive_quantity(dec("0.001")).is_ok());
        assert!(validate_positive_quantity(dec("100")).is_ok());
        assert!(validate_positive_quantity(Decimal::ZERO).is_err());
        assert!(validate_positive_quantity(dec("-5")).is_err());
    }

    #[test]
    fn test_validate_counted_quantity() {
        assert!(validate_counted_quantity(Decimal::ZERO).is_ok());
        assert!(validate_counted_quantity(dec("12.5")).is_ok());
        assert!(validate_counted_quantity(dec("-0.1")).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost(Decimal::ZERO).is_ok());
        assert!(validate_unit_cost(dec("19.99")).is_ok());
        assert!(validate_unit_cost(dec("-1")).is_err());
    }
}
