//! Unused-class resolution

use crate::crawler::UsageTable;

/// Returns every reference class the site never used
///
/// Order follows `reference`. A class recorded with a zero count is unused.
pub fn unused_classes(reference: &[String], usage: &UsageTable) -> Vec<String> {
    reference
        .iter()
        .filter(|class| !usage.is_used(class))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_difference() {
        let mut usage = UsageTable::new();
        usage.record("btn", 3);
        usage.record("btn-primary", 1);
        usage.record("not-in-stylesheet", 9);

        let unused = unused_classes(&reference(&["btn", "btn-primary", "unused-one"]), &usage);
        assert_eq!(unused, reference(&["unused-one"]));
    }

    #[test]
    fn test_preserves_reference_order() {
        let usage = UsageTable::new();
        let unused = unused_classes(&reference(&["zeta", "alpha", "mid"]), &usage);
        assert_eq!(unused, reference(&["zeta", "alpha", "mid"]));
    }

    #[test]
    fn test_zero_count_is_unused() {
        let mut usage = UsageTable::new();
        usage.record("ghost", 0);
        assert_eq!(unused_classes(&reference(&["ghost"]), &usage), reference(&["ghost"]));
    }

    #[test]
    fn test_empty_reference() {
        let mut usage = UsageTable::new();
        usage.record("btn", 1);
        assert!(unused_classes(&[], &usage).is_empty());
    }
}
