//! Property-based tests for the record store
//!
//! Tests invariants:
//! - A page never yields more than its limit
//! - A page is a contiguous slice of the input
//! - Identities from one generator are strictly increasing in both forms

use proptest::prelude::*;

use crate::core::store::{IdGenerator, Page};

proptest! {
    #[test]
    fn page_is_contiguous_window(
        len in 0usize..50,
        limit in proptest::option::of(0usize..60),
        offset in 0usize..60,
    ) {
        let records: Vec<usize> = (0..len).collect();
        let page = Page::new(limit, Some(offset));
        let window = page.apply(records.clone());

        if let Some(limit) = limit {
            prop_assert!(window.len() <= limit);
        }
        let expected = len.saturating_sub(offset).min(limit.unwrap_or(usize::MAX));
        prop_assert_eq!(window.len(), expected);
        if let Some(first) = window.first() {
            prop_assert_eq!(*first, offset);
        }
        prop_assert!(window.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn identities_strictly_increase(count in 1usize..200) {
        let generator = IdGenerator::new();
        let identities: Vec<_> = (0..count).map(|_| generator.next()).collect();

        for pair in identities.windows(2) {
            prop_assert!(pair[0].id < pair[1].id);
            prop_assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }
}
