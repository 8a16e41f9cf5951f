//! Stock level transition tests
//!
//! Covers the quantity rules behind every ledger operation:
//! - available == quantity - reserved after any transition
//! - all three fields stay non-negative
//! - reservation round-trips restore the pre-reserve state
//! - counts below the reserved quantity clamp available at zero

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{StockLevelError, StockLevels};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn levels(q: &str, r: &str, a: &str) -> StockLevels {
    StockLevels::new(dec(q), dec(r), dec(a))
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_receive_into_empty_record() {
        let next = StockLevels::ZERO.receive(dec("100")).unwrap();
        assert_eq!(next, levels("100", "0", "100"));
        assert!(next.is_consistent());
    }

    #[test]
    fn test_receive_accumulates() {
        let next = levels("40", "10", "30").receive(dec("2.5")).unwrap();
        assert_eq!(next, levels("42.5", "10", "32.5"));
    }

    #[test]
    fn test_receive_rejects_non_positive() {
        assert_eq!(
            StockLevels::ZERO.receive(Decimal::ZERO),
            Err(StockLevelError::NonPositiveQuantity(Decimal::ZERO))
        );
        assert!(StockLevels::ZERO.receive(dec("-1")).is_err());
    }

    #[test]
    fn test_issue_reduces_on_hand_and_available() {
        let next = levels("100", "30", "70").issue(dec("70")).unwrap();
        assert_eq!(next, levels("30", "30", "0"));
    }

    #[test]
    fn test_issue_more_than_available_fails() {
        let current = levels("30", "30", "0");
        let result = current.issue(dec("1"));
        assert_eq!(
            result,
            Err(StockLevelError::InsufficientAvailable {
                requested: dec("1"),
                available: dec("0"),
            })
        );
        // The failed transition leaves the original value untouched
        assert_eq!(current, levels("30", "30", "0"));
    }

    #[test]
    fn test_issue_cannot_touch_reserved_stock() {
        // 20 on hand, 15 reserved: only 5 can be issued directly
        let current = levels("20", "15", "5");
        assert!(current.issue(dec("5")).is_ok());
        assert!(matches!(
            current.issue(dec("6")),
            Err(StockLevelError::InsufficientAvailable { .. })
        ));
    }

    #[test]
    fn test_reserve_moves_available_to_reserved() {
        let next = levels("100", "0", "100").reserve(dec("30")).unwrap();
        assert_eq!(next, levels("100", "30", "70"));
    }

    #[test]
    fn test_reserve_exactly_available_succeeds() {
        let next = levels("50", "10", "40").reserve(dec("40")).unwrap();
        assert_eq!(next, levels("50", "50", "0"));
        assert!(next.is_consistent());
    }

    #[test]
    fn test_reserve_one_over_available_fails() {
        let current = levels("50", "10", "40");
        assert_eq!(
            current.reserve(dec("41")),
            Err(StockLevelError::InsufficientAvailable {
                requested: dec("41"),
                available: dec("40"),
            })
        );
    }

    #[test]
    fn test_release_returns_units_to_available() {
        let next = levels("100", "30", "70").release(dec("30")).unwrap();
        assert_eq!(next, levels("100", "0", "100"));
    }

    #[test]
    fn test_release_more_than_reserved_fails() {
        assert_eq!(
            levels("100", "30", "70").release(dec("31")),
            Err(StockLevelError::InsufficientReserved {
                requested: dec("31"),
                reserved: dec("30"),
            })
        );
    }

    #[test]
    fn test_reserve_release_round_trip() {
        let before = levels("80", "20", "60");
        let after = before
            .reserve(dec("25"))
            .unwrap()
            .release(dec("25"))
            .unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn test_set_absolute_count_down() {
        let (next, delta) = levels("20", "0", "20").set_absolute(dec("15"));
        assert_eq!(next, levels("15", "0", "15"));
        assert_eq!(delta, dec("-5"));
    }

    #[test]
    fn test_set_absolute_no_change_has_zero_delta() {
        let (next, delta) = levels("20", "5", "15").set_absolute(dec("20"));
        assert_eq!(next, levels("20", "5", "15"));
        assert_eq!(delta, Decimal::ZERO);
    }

    #[test]
    fn test_set_absolute_below_reserved_clamps_available() {
        // Miscount: 30 reserved but only 15 counted. Available clamps at
        // zero and the excess hold stays in place.
        let (next, delta) = levels("50", "30", "20").set_absolute(dec("15"));
        assert_eq!(next, levels("15", "30", "0"));
        assert_eq!(delta, dec("-35"));
        assert!(next.available >= Decimal::ZERO);
        // The identity is knowingly broken until the holds are released
        assert!(!next.is_consistent());
    }

    #[test]
    fn test_release_after_count_below_reserved_never_exceeds_on_hand() {
        // 30 reserved but only 15 counted; clearing the whole hold must
        // not make more available than is physically on hand
        let (clamped, _) = levels("30", "30", "0").set_absolute(dec("15"));
        assert_eq!(clamped, levels("15", "30", "0"));

        let next = clamped.release(dec("30")).unwrap();
        assert_eq!(next, levels("15", "0", "15"));
        assert!(next.available <= next.quantity);
        assert!(next.is_consistent());
    }

    #[test]
    fn test_partial_releases_after_clamped_count_heal_gradually() {
        let (clamped, _) = levels("50", "30", "20").set_absolute(dec("15"));
        assert_eq!(clamped, levels("15", "30", "0"));

        // Releasing 10 still leaves holds exceeding on-hand
        let next = clamped.release(dec("10")).unwrap();
        assert_eq!(next, levels("15", "20", "0"));

        // Clearing the rest restores the identity
        let next = next.release(dec("20")).unwrap();
        assert_eq!(next, levels("15", "0", "15"));
        assert!(next.is_consistent());
    }

    #[test]
    fn test_set_absolute_on_uninitialized_coordinate() {
        let (next, delta) = StockLevels::ZERO.set_absolute(dec("12"));
        assert_eq!(next, levels("12", "0", "12"));
        assert_eq!(delta, dec("12"));
    }

    #[test]
    fn test_fractional_units() {
        // Liters, not pieces
        let next = StockLevels::ZERO.receive(dec("2.75")).unwrap();
        let next = next.issue(dec("0.5")).unwrap();
        assert_eq!(next, levels("2.25", "0", "2.25"));
    }

    /// Walkthrough: receive 100, reserve 30, issue the unreserved 70, then
    /// one more unit is refused
    #[test]
    fn test_receive_reserve_issue_walkthrough() {
        let s = StockLevels::ZERO.receive(dec("100")).unwrap();
        assert_eq!(s, levels("100", "0", "100"));

        let s = s.reserve(dec("30")).unwrap();
        assert_eq!(s, levels("100", "30", "70"));

        let s = s.issue(dec("70")).unwrap();
        assert_eq!(s, levels("30", "30", "0"));

        assert!(matches!(
            s.issue(dec("1")),
            Err(StockLevelError::InsufficientAvailable { .. })
        ));
    }

    /// Walkthrough: transfer 10 units from a stocked location to one with
    /// no prior record
    #[test]
    fn test_transfer_as_paired_issue_and_receive() {
        let source = levels("50", "0", "50");
        let destination = StockLevels::ZERO;

        let source = source.issue(dec("10")).unwrap();
        let destination = destination.receive(dec("10")).unwrap();

        assert_eq!(source, levels("40", "0", "40"));
        assert_eq!(destination, levels("10", "0", "10"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for generating valid quantities (positive decimals)
    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10000i64).prop_map(|n| Decimal::new(n, 1)) // 0.1 to 1000.0
    }

    #[derive(Debug, Clone)]
    enum Op {
        Receive(Decimal),
        Issue(Decimal),
        Reserve(Decimal),
        Release(Decimal),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            quantity_strategy().prop_map(Op::Receive),
            quantity_strategy().prop_map(Op::Issue),
            quantity_strategy().prop_map(Op::Reserve),
            quantity_strategy().prop_map(Op::Release),
        ]
    }

    fn apply(levels: StockLevels, op: &Op) -> StockLevels {
        // Failed transitions leave the state untouched, as the engine does
        let result = match op {
            Op::Receive(q) => levels.receive(*q),
            Op::Issue(q) => levels.issue(*q),
            Op::Reserve(q) => levels.reserve(*q),
            Op::Release(q) => levels.release(*q),
        };
        result.unwrap_or(levels)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// available == quantity - reserved after any delta operation
        /// sequence, and no field ever goes negative
        #[test]
        fn prop_invariants_hold_under_delta_operations(
            ops in prop::collection::vec(op_strategy(), 1..40)
        ) {
            let mut state = StockLevels::ZERO;
            for op in &ops {
                state = apply(state, op);
                prop_assert!(state.is_consistent());
                prop_assert!(state.quantity >= Decimal::ZERO);
                prop_assert!(state.reserved >= Decimal::ZERO);
                prop_assert!(state.available >= Decimal::ZERO);
            }
        }

        /// reserve then release with no intervening operation restores the
        /// pre-reserve levels
        #[test]
        fn prop_reservation_round_trip(
            initial in quantity_strategy(),
            hold in quantity_strategy()
        ) {
            let before = StockLevels::ZERO.receive(initial).unwrap();
            if let Ok(held) = before.reserve(hold) {
                let after = held.release(hold).unwrap();
                prop_assert_eq!(after, before);
            }
        }

        /// Issuing everything that was received leaves a valid zero-stock
        /// state
        #[test]
        fn prop_full_issue_reaches_zero(quantity in quantity_strategy()) {
            let state = StockLevels::ZERO.receive(quantity).unwrap();
            let state = state.issue(quantity).unwrap();
            prop_assert_eq!(state, StockLevels::ZERO);
            prop_assert!(state.is_consistent());
        }

        /// A count never yields negative available, no matter how far below
        /// the reserved quantity it lands
        #[test]
        fn prop_count_clamps_available_at_zero(
            on_hand in quantity_strategy(),
            counted in quantity_strategy()
        ) {
            let state = StockLevels::ZERO.receive(on_hand).unwrap();
            let state = match state.reserve(on_hand) {
                Ok(s) => s,
                Err(_) => state,
            };
            let (next, _) = state.set_absolute(counted);
            prop_assert!(next.available >= Decimal::ZERO);
            prop_assert_eq!(next.quantity, counted);
            prop_assert_eq!(next.reserved, state.reserved);
        }

        /// Clearing every hold after a count restores the availability
        /// identity, however far below the reserved quantity the count
        /// landed; available never exceeds on-hand along the way
        #[test]
        fn prop_release_after_count_restores_identity(
            on_hand in quantity_strategy(),
            counted in quantity_strategy()
        ) {
            let state = StockLevels::ZERO.receive(on_hand).unwrap();
            let state = state.reserve(on_hand).unwrap();
            let (state, _) = state.set_absolute(counted);
            let state = state.release(on_hand).unwrap();
            prop_assert!(state.available <= state.quantity);
            prop_assert_eq!(state.quantity, counted);
            prop_assert!(state.is_consistent());
        }

        /// The delta reported by a count is exactly what replaying an
        /// adjustment of that magnitude would apply
        #[test]
        fn prop_count_delta_matches_quantity_change(
            before in quantity_strategy(),
            counted in quantity_strategy()
        ) {
            let state = StockLevels::ZERO.receive(before).unwrap();
            let (next, delta) = state.set_absolute(counted);
            prop_assert_eq!(state.quantity + delta, next.quantity);
        }
    }
}
