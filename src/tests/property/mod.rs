//! Property-based tests
//!
//! - `store_props`: paging windows and identity ordering
//! - `picker_props`: substitution range and placeholder handling
//! - `input_validator_props`: document names and usernames
//!
//! By default proptest runs 256 cases per property; override with
//! `PROPTEST_CASES`.

mod store_props;
