//! Property tests for rank reconciliation, permutations and canonical output

use proptest::prelude::*;
use serde_json::json;
use tensorspec_core::chunk_layout::ChunkLayout;
use tensorspec_core::codec::N5Compression;
use tensorspec_core::domain::IndexDomain;
use tensorspec_core::{validate_spec, ErrorKind, ValidationContext};

const UNIT_BASES: [&str; 4] = ["nm", "um", "s", ""];
const N5_TYPES: [&str; 6] = ["uint8", "uint16", "int32", "int64", "float32", "float64"];

proptest! {
    #[test]
    fn rank_mismatch_names_every_disagreeing_field(
        rank in 1usize..6,
        min_len in 1usize..7,
        shape_len in 1usize..7,
        labels_len in 1usize..7,
    ) {
        let doc = json!({
            "rank": rank,
            "inclusive_min": vec![0; min_len],
            "shape": vec![1; shape_len],
            "labels": (0..labels_len).map(|i| format!("d{}", i)).collect::<Vec<_>>(),
        });
        let result = IndexDomain::from_value(&doc, &ValidationContext::default());

        let expected: Vec<(String, usize)> = [("inclusive_min", min_len), ("shape", shape_len), ("labels", labels_len)]
            .into_iter()
            .filter(|(_, len)| *len != rank)
            .map(|(field, len)| (field.to_string(), len))
            .collect();

        if expected.is_empty() {
            prop_assert_eq!(result.unwrap().rank(), rank);
        } else {
            let err = result.unwrap_err();
            let ErrorKind::RankMismatch { rank: reported, mismatches } = err.kind else {
                panic!("expected RankMismatch");
            };
            prop_assert_eq!(reported, rank);
            let actual: Vec<(String, usize)> = mismatches.into_iter().map(|m| (m.field, m.length)).collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn shuffled_orders_are_permutations(
        order in (1usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
    ) {
        let layout = ChunkLayout::from_value(&json!({"inner_order": order.clone()}), &ValidationContext::default()).unwrap();
        prop_assert_eq!(layout.inner_order, Some(order));
    }

    #[test]
    fn orders_with_repeats_are_rejected(
        order in (2usize..8).prop_flat_map(|n| (Just(n), proptest::collection::vec(0..n, n)))
            .prop_filter("must repeat an axis", |(n, values)| {
                let mut sorted = values.clone();
                sorted.sort_unstable();
                sorted.dedup();
                sorted.len() < *n
            })
            .prop_map(|(_, values)| values)
    ) {
        let err = ChunkLayout::from_value(&json!({"inner_order": order}), &ValidationContext::default()).unwrap_err();
        prop_assert_eq!(err.kind.name(), "InvalidPermutation");
    }

    #[test]
    fn blosc_clevel_boundary(clevel in -5i64..20) {
        let result = N5Compression::from_value(&json!({"type": "blosc", "clevel": clevel}), &ValidationContext::default());
        prop_assert_eq!(result.is_ok(), (0..=9).contains(&clevel));
    }

    #[test]
    fn canonical_output_revalidates_to_the_same_spec(
        dims in proptest::collection::vec(1u64..4096, 1..5),
        dtype in proptest::sample::select(N5_TYPES.to_vec()),
        level in -1i64..10,
        path in "[a-z]{1,8}",
    ) {
        let block: Vec<u64> = dims.iter().map(|d| (*d).min(64)).collect();
        let spec = validate_spec(&json!({
            "driver": "n5",
            "kvstore": {"driver": "memory"},
            "path": path,
            "metadata": {
                "dimensions": dims,
                "blockSize": block,
                "dataType": dtype,
                "compression": {"type": "gzip", "level": level}
            }
        }))
        .unwrap();

        let canonical = spec.to_value().unwrap();
        let reparsed = validate_spec(&canonical).unwrap();
        prop_assert_eq!(reparsed.to_value().unwrap(), canonical);
        prop_assert_eq!(reparsed, spec);
    }

    #[test]
    fn dimension_units_survive_canonical_output(
        multipliers in proptest::collection::vec(1e-6f64..1e6, 1..4),
        base in proptest::sample::select(UNIT_BASES.to_vec()),
    ) {
        let units: Vec<String> = multipliers.iter().map(|m| format!("{}{}", m, base)).collect();
        let spec = validate_spec(&json!({
            "driver": "n5",
            "kvstore": "memory://",
            "schema": {"dimension_units": units}
        }))
        .unwrap();

        let canonical = spec.to_value().unwrap();
        let pairs = canonical["schema"]["dimension_units"].as_array().unwrap();
        for (pair, multiplier) in pairs.iter().zip(&multipliers) {
            prop_assert_eq!(pair, &json!([multiplier, base]));
        }
        let reparsed = validate_spec(&canonical).unwrap();
        prop_assert_eq!(reparsed, spec);
    }
}
