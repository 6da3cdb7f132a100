// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property tests for fact normalization
//!
//! Verifies that:
//! - In-range numeric fields pass through unchanged
//! - Out-of-range numeric fields are rejected, never clamped
//! - Only exact vocabulary terms map
//! - Slugs are always NetBox-safe

use proptest::prelude::*;

use cim_netbox_reconciler::discovery::{InterfaceFact, SiteFact};
use cim_netbox_reconciler::domain::vocabulary::{
    map_link_state, map_status, INTERFACE_SPEED_MAX, STATUS_VOCABULARY,
};
use cim_netbox_reconciler::domain::{Slug, Status};
use cim_netbox_reconciler::normalize::{normalize_interface, normalize_site};
use cim_netbox_reconciler::ReconcileError;

fn interface(speed: Option<i64>, mtu: Option<i64>) -> InterfaceFact {
    InterfaceFact {
        device: "edge-01".to_string(),
        name: "Gi0/1".to_string(),
        interface_type: None,
        speed,
        mtu,
        mac_address: None,
        state: "up".to_string(),
    }
}

// ============================================================================
// Numeric Bounds
// ============================================================================

proptest! {
    #[test]
    fn prop_speed_in_range_passes_through(speed in 0..=INTERFACE_SPEED_MAX) {
        let normalized = normalize_interface(&interface(Some(speed), None)).unwrap();
        prop_assert_eq!(normalized.speed.map(|s| s.value()), Some(speed));
    }

    #[test]
    fn prop_speed_out_of_range_is_rejected(
        speed in prop_oneof![i64::MIN..0i64, (INTERFACE_SPEED_MAX + 1)..=i64::MAX]
    ) {
        let result = normalize_interface(&interface(Some(speed), None));
        prop_assert!(
            matches!(
                result,
                Err(ReconcileError::OutOfRange { field: "speed", value, .. }) if value == speed
            ),
            "speed {} was not rejected",
            speed
        );
    }

    #[test]
    fn prop_mtu_at_least_one_passes_through(mtu in 1i64..=i64::MAX) {
        let normalized = normalize_interface(&interface(None, Some(mtu))).unwrap();
        prop_assert_eq!(normalized.mtu.map(|m| m.value()), Some(mtu));
    }

    #[test]
    fn prop_mtu_below_one_is_rejected(mtu in i64::MIN..1i64) {
        let result = normalize_interface(&interface(None, Some(mtu)));
        let is_out_of_range = matches!(result, Err(ReconcileError::OutOfRange { field: "mtu", .. }));
        prop_assert!(is_out_of_range);
    }
}

// ============================================================================
// Vocabulary Mapping
// ============================================================================

proptest! {
    #[test]
    fn prop_unknown_status_is_rejected(term in "[a-zA-Z ]{0,12}") {
        prop_assume!(term != "alive" && term != "dead");

        prop_assert_eq!(map_status(&term), Err(ReconcileError::UnknownStatus(term.clone())));

        let site = normalize_site(&SiteFact {
            name: "DC East".to_string(),
            status: term.clone(),
        });
        prop_assert!(site.is_err());
    }

    #[test]
    fn prop_unknown_link_state_is_rejected(term in "[a-zA-Z]{0,8}") {
        prop_assume!(term != "up" && term != "down");
        prop_assert_eq!(map_link_state(&term), Err(ReconcileError::UnknownState(term.clone())));
    }

    #[test]
    fn prop_known_status_terms_map(index in 0usize..2) {
        let term = STATUS_VOCABULARY.sources().nth(index).unwrap();
        let expected = if term == "alive" { Status::Active } else { Status::Offline };
        prop_assert_eq!(map_status(term), Ok(expected));
    }
}

// ============================================================================
// Slug Derivation
// ============================================================================

proptest! {
    #[test]
    fn prop_slug_is_netbox_safe(name in "\\PC{0,150}") {
        if let Ok(slug) = Slug::from_name(&name) {
            let slug = slug.as_str();
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.len() <= Slug::MAX_LENGTH);
            prop_assert!(!slug.starts_with('-'));
            prop_assert!(!slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'));
        }
    }

    #[test]
    fn prop_slug_is_idempotent(name in "[A-Za-z0-9 ._/-]{1,40}") {
        if let Ok(slug) = Slug::from_name(&name) {
            let again = Slug::from_name(slug.as_str()).unwrap();
            prop_assert_eq!(again, slug);
        }
    }

    #[test]
    fn prop_slug_ignores_case(name in "[A-Za-z0-9 ]{1,40}") {
        prop_assert_eq!(
            Slug::from_name(&name).ok(),
            Slug::from_name(name.to_lowercase()).ok()
        );
    }
}
