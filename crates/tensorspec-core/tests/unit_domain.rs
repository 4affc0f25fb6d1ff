//! Domain, transform and chunk layout rules

use serde_json::{json, Value};
use tensorspec_core::chunk_layout::ChunkLayout;
use tensorspec_core::domain::IndexDomain;
use tensorspec_core::transform::IndexTransform;
use tensorspec_core::{ErrorKind, ValidationContext, ValidationMode, ValidationResult};

fn domain(doc: Value, mode: ValidationMode) -> ValidationResult<IndexDomain> {
    IndexDomain::from_value(&doc, &ValidationContext::new(mode))
}

fn transform(doc: Value) -> ValidationResult<IndexTransform> {
    IndexTransform::from_value(&doc, &ValidationContext::default())
}

#[cfg(test)]
mod rank_reconciliation {
    use super::*;

    #[test]
    fn test_rank_from_first_populated_field() {
        let parsed = domain(json!({"inclusive_min": [0, 0], "labels": ["x", "y"]}), ValidationMode::Strict).unwrap();
        assert_eq!(parsed.rank(), 2);
        assert_eq!(parsed.labels(), Some(&["x".to_string(), "y".to_string()][..]));
    }

    #[test]
    fn test_indeterminate_rank() {
        let err = domain(json!({}), ValidationMode::Strict).unwrap_err();
        assert_eq!(err.kind, ErrorKind::RankIndeterminate);
    }

    #[test]
    fn test_mismatches_are_batched() {
        let err = domain(
            json!({"rank": 2, "inclusive_min": [0, 0, 0], "shape": [4], "labels": ["a", "b"]}),
            ValidationMode::Strict,
        )
        .unwrap_err();
        let ErrorKind::RankMismatch { rank, mismatches } = err.kind else {
            panic!("expected RankMismatch");
        };
        assert_eq!(rank, 2);
        let fields: Vec<_> = mismatches.iter().map(|m| (m.field.as_str(), m.length)).collect();
        assert_eq!(fields, vec![("inclusive_min", 3), ("shape", 1)]);
    }

    #[test]
    fn test_zero_extent_is_rejected() {
        assert!(domain(json!({"shape": [4, 0]}), ValidationMode::Strict).is_err());
    }
}

#[cfg(test)]
mod bounds {
    use super::*;

    #[test]
    fn test_conflicting_upper_bounds_in_strict_mode() {
        let doc = json!({"inclusive_min": [0], "exclusive_max": [10], "shape": [10]});
        let err = domain(doc.clone(), ValidationMode::Strict).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::ConflictingBoundsSpecification {
                fields: vec!["exclusive_max".to_string(), "shape".to_string()]
            }
        );
        assert!(domain(doc, ValidationMode::Partial).is_ok());
    }

    #[test]
    fn test_inconsistent_shape_in_partial_mode() {
        let err = domain(
            json!({"inclusive_min": [5, 0], "exclusive_max": [10, 8], "shape": [5, 7]}),
            ValidationMode::Partial,
        )
        .unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::BoundsShapeMismatch {
                dimension: 1,
                shape: 7,
                extent: 8
            }
        );
    }

    #[test]
    fn test_shape_derived_from_bounds() {
        let parsed = domain(json!({"inclusive_min": [2, 2], "inclusive_max": [5, 2]}), ValidationMode::Strict).unwrap();
        assert_eq!(parsed.shape(), Some(vec![4, 1]));
    }

    #[test]
    fn test_duplicate_labels() {
        let err = domain(json!({"labels": ["x", "", "", "x"]}), ValidationMode::Strict).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateLabel { label: "x".to_string() });
        assert_eq!(err.path, "$.labels[3]");
    }
}

#[cfg(test)]
mod transforms {
    use super::*;

    #[test]
    fn test_output_maps() {
        let parsed = transform(json!({
            "input_shape": [10, 20],
            "output": [
                {"input_dimension": 1, "offset": 5, "stride": 2},
                {"index_array": [[1, 2]], "index_array_bounds": [0, 9]}
            ]
        }))
        .unwrap();
        assert_eq!(parsed.input_rank(), 2);
        assert_eq!(parsed.output_rank(), 2);
    }

    #[test]
    fn test_output_map_errors() {
        let cases = [
            (json!({"offset": 3}), "UnderspecifiedOutputMap"),
            (json!({"input_dimension": 0, "index_array": [[0]]}), "AmbiguousOutputMap"),
            (json!({"input_dimension": 2}), "OutputDimensionOutOfRange"),
            (json!({"input_dimension": 0, "stride": 0}), "ZeroStride"),
            (json!({"input_dimension": 0, "index_array_bounds": [0, 1]}), "MisplacedIndexArrayBounds"),
        ];
        for (map, expected) in cases {
            let err = transform(json!({"input_rank": 2, "output": [map]})).unwrap_err();
            assert_eq!(err.kind.name(), expected, "for {}", err);
            assert!(err.path.starts_with("$.output[0]"));
        }
    }

    #[test]
    fn test_output_rank_must_match_maps() {
        let err = transform(json!({"input_rank": 1, "output_rank": 2, "output": [{"input_dimension": 0}]})).unwrap_err();
        assert_eq!(err.kind.name(), "RankMismatch");
    }

    #[test]
    fn test_input_side_uses_domain_rules() {
        let err = transform(json!({"input_labels": ["a", "a"]})).unwrap_err();
        assert_eq!(err.path, "$.input_labels[1]");
    }
}

#[cfg(test)]
mod chunk_layouts {
    use super::*;

    #[test]
    fn test_inner_order_permutation() {
        let ctx = ValidationContext::default();
        let parsed = ChunkLayout::from_value(&json!({"inner_order": [1, 0]}), &ctx).unwrap();
        assert_eq!(parsed.inner_order, Some(vec![1, 0]));

        let err = ChunkLayout::from_value(&json!({"rank": 3, "inner_order": [0, 1, 1]}), &ctx).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::InvalidPermutation {
                field: "inner_order".to_string(),
                values: vec![0, 1, 1],
                rank: 3
            }
        );
    }

    #[test]
    fn test_grid_fields_share_rank() {
        let ctx = ValidationContext::default();
        let err = ChunkLayout::from_value(
            &json!({"grid_origin": [0, 0], "write_chunk": {"shape": [8, 8, 8]}}),
            &ctx,
        )
        .unwrap_err();
        assert_eq!(err.kind.name(), "RankMismatch");
    }
}
