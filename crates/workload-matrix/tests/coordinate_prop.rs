use std::collections::HashSet;

use proptest::prelude::*;
use workload_matrix::{AttributionPolicy, CoordinateGroup, DimSpec, DimValue};

/// One dimension: `alternatives[i]` values per alternative; 0 values is a wildcard.
fn spec(alternatives: &[usize], dim: usize) -> DimSpec {
    let value = |alt: usize, n: usize| match n {
        0 => DimValue::Any,
        1 => DimValue::one(format!("d{dim}a{alt}")),
        n => DimValue::many((0..n).map(|v| format!("d{dim}a{alt}v{v}"))),
    };
    match alternatives {
        [n] => DimSpec::Value(value(0, *n)),
        alts => DimSpec::Alternatives(alts.iter().enumerate().map(|(a, &n)| value(a, n)).collect()),
    }
}

fn group_strategy() -> impl Strategy<Value = (Vec<Vec<usize>>, usize)> {
    (
        prop::collection::vec(prop::collection::vec(0usize..4, 1..4), 1..5),
        0usize..4,
    )
        .prop_map(|(dims, split)| {
            let split = split.min(dims.len());
            (dims, split)
        })
}

proptest! {
    #[test]
    fn sets_and_coordinates_are_cartesian_products((dims, split) in group_strategy()) {
        let specs: Vec<DimSpec> = dims.iter().enumerate().map(|(d, alts)| spec(alts, d)).collect();
        let (rows, cols) = specs.split_at(split);
        let group = CoordinateGroup::new(rows.to_vec(), cols.to_vec());

        let expected_sets: usize = dims.iter().map(Vec::len).product();
        prop_assert_eq!(group.set_count(), expected_sets);

        let sets: Vec<_> = group.sets().collect();
        prop_assert_eq!(sets.len(), expected_sets);
        for set in &sets {
            let coordinates: Vec<_> = set.coordinates().collect();
            prop_assert_eq!(coordinates.len(), set.len());
            let distinct: HashSet<_> = coordinates.iter().cloned().collect();
            prop_assert_eq!(distinct.len(), coordinates.len());
            for coordinate in &coordinates {
                prop_assert_eq!(coordinate.rows.len(), split);
                prop_assert_eq!(coordinate.cols.len(), dims.len() - split);
            }
        }
    }

    #[test]
    fn attribution_rates_sum_to_one(standards in prop::collection::vec(0.0f64..100.0, 1..8)) {
        for policy in [AttributionPolicy::Proportional, AttributionPolicy::Equal] {
            let rates = policy.rates(&standards);
            prop_assert_eq!(rates.len(), standards.len());
            let total: f64 = rates.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-9, "{policy:?} rates sum to {total}");
            prop_assert!(rates.iter().all(|r| *r >= 0.0));
        }
    }
}
