//! Property-based tests for cleaning, validation and aggregation.
//!
//! ```bash
//! cargo test -p soilcheck --test property_tests
//! PROPTEST_CASES=10000 cargo test -p soilcheck --test property_tests
//! ```

use proptest::prelude::*;

use soilcheck::aggregate::mode;
use soilcheck::{
    Cleaner, Dataset, RuleKind, RuleRegistry, ValidationEngine, Value,
    rules::RuleRecord,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// Cell text as it shows up in uploads: numbers, null tokens and junk.
fn cell() -> impl Strategy<Value = String> {
    prop_oneof![
        "-?[0-9]{1,4}(\\.[0-9]{1,3})?",
        Just(String::new()),
        Just("NA".to_string()),
        Just(" 12.5 ".to_string()),
        "[a-zA-Z<>]{1,6}",
    ]
}

fn dataset() -> impl Strategy<Value = Dataset> {
    (1usize..5, 0usize..20).prop_flat_map(|(cols, rows)| {
        prop::collection::vec(prop::collection::vec(cell(), cols), rows).prop_map(move |rows| {
            let headers = (0..cols).map(|c| format!("col_{}", c)).collect();
            Dataset::from_raw(headers, rows)
        })
    })
}

fn registry() -> RuleRegistry {
    let record = |variable: &str, required: &str, data_type: &str, rule: &str| RuleRecord {
        sheet: "Data".into(),
        variable: variable.into(),
        unique_by: "-".into(),
        required: required.into(),
        data_type: data_type.into(),
        description: String::new(),
        validation_rule: rule.into(),
    };
    RuleRegistry::from_records(vec![
        record("col_0", "true", "numeric", ">= 0"),
        record("col_1", "false", "integer", "no_duplicates"),
        record("col_2", "false", "character", "not_empty"),
        record("col_9", "true", "character", ""),
    ])
    .unwrap()
}

// =============================================================================
// Cleaner
// =============================================================================

proptest! {
    #[test]
    fn cleaner_preserves_shape(ds in dataset()) {
        let cleaner = Cleaner::new(["col_0", "col_1", "col_3"], ["col_3"]);
        let out = cleaner.clean(&ds);

        prop_assert_eq!(out.dataset.row_count(), ds.row_count());
        prop_assert_eq!(&out.dataset.headers, &ds.headers);
    }

    #[test]
    fn cleaner_leaves_only_numbers_or_missing(ds in dataset()) {
        let out = Cleaner::new(["col_0"], Vec::<String>::new()).clean(&ds);

        if let Some(idx) = out.dataset.column_index("col_0") {
            for value in out.dataset.column_values(idx) {
                prop_assert!(!matches!(value, Value::Text(_)));
            }
        }
    }

    #[test]
    fn cleaner_warns_once_per_missing_cell(ds in dataset()) {
        let out = Cleaner::new(["col_0"], Vec::<String>::new()).clean(&ds);

        let missing = out
            .dataset
            .column_index("col_0")
            .map(|idx| out.dataset.column_values(idx).filter(|v| v.is_missing()).count())
            .unwrap_or(0);
        prop_assert_eq!(out.warnings.len(), missing);
    }

    #[test]
    fn excluded_columns_are_untouched(ds in dataset()) {
        let out = Cleaner::new(["col_0"], ["col_0"]).clean(&ds);
        prop_assert_eq!(out.dataset, ds);
        prop_assert!(out.warnings.is_empty());
    }
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    #[test]
    fn validation_is_deterministic(ds in dataset()) {
        let rules = registry();
        let rules = rules.rules_for("Data").unwrap();
        let engine = ValidationEngine::new();

        let first = engine.validate(&ds, &rules);
        let second = engine.validate(&ds, &rules);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn absent_required_column_always_reported(ds in dataset()) {
        let rules = registry();
        let rules = rules.rules_for("Data").unwrap();
        let report = ValidationEngine::new().validate(&ds, &rules);

        prop_assert!(report
            .errors
            .iter()
            .any(|e| e.column == "col_9" && e.rule == RuleKind::Required));
        prop_assert!(!report.is_valid());
    }

    #[test]
    fn at_most_one_duplicate_issue_per_rule(ds in dataset()) {
        let rules = registry();
        let rules = rules.rules_for("Data").unwrap();
        let report = ValidationEngine::new().validate(&ds, &rules);

        let dups: Vec<_> =
            report.errors.iter().filter(|e| e.rule == RuleKind::NoDuplicates).collect();
        prop_assert!(dups.len() <= 1);
        for issue in dups {
            prop_assert!(issue.rows.len() >= 2);
        }
    }
}

// =============================================================================
// Aggregation helpers
// =============================================================================

proptest! {
    #[test]
    fn mode_is_a_most_frequent_value(values in prop::collection::vec("[abc]", 0..30)) {
        let result = mode(values.iter().map(String::as_str));

        match result {
            None => prop_assert!(values.is_empty()),
            Some(m) => {
                let count = |v: &str| values.iter().filter(|x| x.as_str() == v).count();
                let best = values.iter().map(|v| count(v)).max().unwrap_or(0);
                prop_assert_eq!(count(m), best);
                let first_best = values.iter().find(|v| count(v) == best).unwrap();
                prop_assert_eq!(m, first_best.as_str());
            }
        }
    }
}
