//! Per-driver rules reached through the dispatcher

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tensorspec_core::{
    validate_spec, validate_spec_with_mode, DataType, ErrorKind, ReadWriteMode, TensorStoreSpec, ValidationError,
    ValidationMode,
};

fn strict(doc: Value) -> Result<TensorStoreSpec, ValidationError> {
    validate_spec(&doc)
}

fn mismatched_fields(err: &ValidationError) -> Vec<String> {
    match &err.kind {
        ErrorKind::RankMismatch { mismatches, .. } => mismatches.iter().map(|m| m.field.clone()).collect(),
        other => panic!("expected RankMismatch, got {:?}", other),
    }
}

#[cfg(test)]
mod zarr {
    use super::*;
    use pretty_assertions::assert_eq;

    fn structured(field: Option<&str>) -> Value {
        let mut doc = json!({
            "driver": "zarr",
            "kvstore": "memory://",
            "metadata": {
                "shape": [10, 10],
                "chunks": [5, 5],
                "dtype": [["label", "<u2"], ["rgb", "|u1", [3]]]
            }
        });
        if let Some(field) = field {
            doc["field"] = json!(field);
        }
        doc
    }

    #[test]
    fn test_structured_dtype_field_selection() {
        let spec = strict(structured(Some("rgb"))).unwrap();
        assert_eq!(spec.rank(), Some(3));
        assert_eq!(spec.dtype(), Some(DataType::Uint8));

        let spec = strict(structured(Some("label"))).unwrap();
        assert_eq!(spec.rank(), Some(2));
        assert_eq!(spec.dtype(), Some(DataType::Uint16));
    }

    #[test]
    fn test_structured_dtype_needs_field() {
        let err = strict(structured(None)).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MissingRequiredField {
                field: "field".to_string()
            }
        );
        assert_eq!(err.path, "$.field");
        assert_eq!(err.driver.as_deref(), Some("zarr"));

        let err = strict(structured(Some("alpha"))).unwrap_err();
        assert_eq!(err.path, "$.field");
    }

    #[test]
    fn test_typestr_rules() {
        for dtype in ["<u2", ">f8", "|b1", "<c16"] {
            let doc = json!({"driver": "zarr", "kvstore": "memory://", "metadata": {"dtype": dtype}});
            assert!(strict(doc).is_ok(), "{}", dtype);
        }
        for dtype in ["|u2", "<u3", "u2", "<q8"] {
            let doc = json!({"driver": "zarr", "kvstore": "memory://", "metadata": {"dtype": dtype}});
            let err = strict(doc).unwrap_err();
            assert_eq!(err.path, "$.metadata.dtype", "{}", dtype);
        }
    }

    #[test]
    fn test_dtype_shortcut_against_metadata() {
        let err = strict(json!({
            "driver": "zarr",
            "kvstore": "memory://",
            "dtype": "float32",
            "metadata": {"dtype": "<u2"}
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.metadata.dtype");

        let err = strict(json!({"driver": "zarr", "kvstore": "memory://", "dtype": "string"})).unwrap_err();
        assert_eq!(err.kind.name(), "UnsupportedDType");
        assert_eq!(err.path, "$.dtype");
    }

    #[test]
    fn test_schema_rank_against_metadata() {
        let err = strict(json!({
            "driver": "zarr",
            "kvstore": "memory://",
            "schema": {"rank": 3},
            "metadata": {"shape": [10, 10], "chunks": [5, 5]}
        }))
        .unwrap_err();
        assert_eq!(mismatched_fields(&err), vec!["schema.rank".to_string()]);
    }

    #[test]
    fn test_metadata_extras_are_kept() {
        let spec = strict(json!({
            "driver": "zarr",
            "kvstore": "memory://",
            "metadata": {"shape": [4], "chunks": [2], "dtype": "<i4", "custom": {"owner": "lab"}}
        }))
        .unwrap();
        assert_eq!(spec.to_value().unwrap()["metadata"]["custom"], json!({"owner": "lab"}));
    }
}

#[cfg(test)]
mod zarr3 {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metadata_shape_and_dtype() {
        let spec = strict(json!({
            "driver": "zarr3",
            "kvstore": "memory://",
            "metadata": {
                "shape": [64, 64],
                "data_type": "bfloat16",
                "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [16, 16]}},
                "dimension_names": ["y", null]
            }
        }))
        .unwrap();
        assert_eq!(spec.rank(), Some(2));
        assert_eq!(spec.dtype(), Some(DataType::Bfloat16));
    }

    #[test]
    fn test_unsupported_data_type() {
        let err = strict(json!({"driver": "zarr3", "kvstore": "memory://", "metadata": {"data_type": "string"}})).unwrap_err();
        assert_eq!(err.kind.name(), "UnsupportedDType");
        assert_eq!(err.path, "$.metadata.data_type");
    }

    #[test]
    fn test_chunk_grid_rank() {
        let err = strict(json!({
            "driver": "zarr3",
            "kvstore": "memory://",
            "metadata": {
                "shape": [64, 64],
                "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [16, 16, 16]}}
            }
        }))
        .unwrap_err();
        assert_eq!(
            mismatched_fields(&err),
            vec!["chunk_grid.configuration.chunk_shape".to_string()]
        );
        assert_eq!(err.path, "$.metadata");
    }

    #[test]
    fn test_open_mode_flags() {
        let spec = strict(json!({"driver": "zarr3", "kvstore": "memory://", "create": true, "delete_existing": true})).unwrap();
        assert_eq!(spec.required_access(), ReadWriteMode::ReadWrite);

        let err = strict(json!({"driver": "zarr3", "kvstore": "memory://", "open": true, "delete_existing": true}))
            .unwrap_err();
        assert_eq!(err.kind.name(), "InvalidOpenModeCombination");
        assert_eq!(err.driver.as_deref(), Some("zarr3"));
    }
}

#[cfg(test)]
mod n5 {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_metadata_fields_share_rank() {
        let err = strict(json!({
            "driver": "n5",
            "kvstore": "memory://",
            "metadata": {"dimensions": [10, 10, 10], "axes": ["x", "y"], "resolution": [4.0, 4.0, 40.0, 1.0]}
        }))
        .unwrap_err();
        assert_eq!(mismatched_fields(&err), vec!["axes".to_string(), "resolution".to_string()]);
    }

    #[test]
    fn test_data_type_allow_list() {
        let err = strict(json!({"driver": "n5", "kvstore": "memory://", "metadata": {"dataType": "bool"}})).unwrap_err();
        assert_eq!(err.kind.name(), "UnsupportedDType");
        assert_eq!(err.path, "$.metadata.dataType");
    }

    #[test]
    fn test_overflowing_unit_multiplier() {
        let err = strict(json!({
            "driver": "n5",
            "kvstore": "memory://",
            "schema": {"dimension_units": ["1e999nm"]}
        }))
        .unwrap_err();
        assert_eq!(err.kind.name(), "InvalidValue");
        assert_eq!(err.path, "$.schema.dimension_units[0]");
    }

    #[test]
    fn test_cross_checks_skipped_in_basic_mode() {
        let doc = json!({
            "driver": "n5",
            "kvstore": "memory://",
            "dtype": "uint8",
            "metadata": {"dimensions": [8, 8], "dataType": "uint16"}
        });
        assert!(validate_spec(&doc).is_err());
        assert!(validate_spec_with_mode(&doc, ValidationMode::Partial).is_err());
        let spec = validate_spec_with_mode(&doc, ValidationMode::Basic).unwrap();
        assert_eq!(spec.dtype(), Some(DataType::Uint8));
    }
}

#[cfg(test)]
mod neuroglancer {
    use super::*;
    use pretty_assertions::assert_eq;

    fn volume(data_type: &str, encoding: &str) -> Value {
        json!({
            "driver": "neuroglancer_precomputed",
            "kvstore": "memory://",
            "multiscale_metadata": {"type": "image", "data_type": data_type, "num_channels": 1},
            "scale_metadata": {"size": [64, 64, 32], "chunk_size": [32, 32, 32], "encoding": encoding}
        })
    }

    #[test]
    fn test_rank_is_fixed() {
        let spec = strict(volume("uint8", "raw")).unwrap();
        assert_eq!(spec.rank(), Some(4));

        let mut doc = volume("uint8", "raw");
        doc["rank"] = json!(3);
        let err = strict(doc).unwrap_err();
        assert_eq!(err.kind.name(), "RankMismatch");
    }

    #[test]
    fn test_encoding_restricts_data_type() {
        assert!(strict(volume("uint8", "jpeg")).is_ok());
        let err = strict(volume("uint16", "jpeg")).unwrap_err();
        assert_eq!(err.path, "$.scale_metadata.encoding");

        assert!(strict(volume("uint64", "compressed_segmentation")).is_ok());
        assert!(strict(volume("float32", "compressed_segmentation")).is_err());
        assert!(strict(volume("float32", "png")).is_ok());
    }

    #[test]
    fn test_xyz_fields_have_three_elements() {
        let err = strict(json!({
            "driver": "neuroglancer_precomputed",
            "kvstore": "memory://",
            "scale_metadata": {"size": [64, 64]}
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.scale_metadata.size");
    }
}

#[cfg(test)]
mod tiff_and_auto {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tiff_is_read_only_uint8() {
        let spec = strict(json!({"driver": "tiff", "kvstore": "file:///images/", "path": "slice.tif"})).unwrap();
        assert_eq!(spec.required_access(), ReadWriteMode::Read);
        assert_eq!(spec.effective_path().as_deref(), Some("/images/slice.tif"));

        let err = strict(json!({"driver": "tiff", "kvstore": "memory://", "dtype": "float32"})).unwrap_err();
        assert_eq!(err.kind.name(), "UnsupportedDType");
    }

    #[test]
    fn test_auto_keeps_unknown_members() {
        let doc = json!({"driver": "auto", "kvstore": "memory://data/", "format_hint": "zarr"});
        let spec = strict(doc.clone()).unwrap();
        assert_eq!(spec.to_value().unwrap()["format_hint"], json!("zarr"));
        assert_eq!(spec.effective_path().as_deref(), Some("data/"));
    }
}

#[cfg(test)]
mod array {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_elements_coerced_to_dtype() {
        let spec = strict(json!({"driver": "array", "array": [1, 2.0, 3], "dtype": "float32"})).unwrap();
        assert_eq!(spec.dtype(), Some(DataType::Float32));
        assert_eq!(spec.required_access(), ReadWriteMode::ReadWrite);

        let err = strict(json!({"driver": "array", "array": [1, 256], "dtype": "uint8"})).unwrap_err();
        assert_eq!(err.kind.name(), "DTypeCoercionError");
        assert_eq!(err.path, "$.array[1]");
    }

    #[test]
    fn test_dtype_is_required() {
        let err = strict(json!({"driver": "array", "array": [1, 2]})).unwrap_err();
        assert_eq!(err.path, "$.dtype");
    }

    #[test]
    fn test_rank_against_schema_domain() {
        let err = strict(json!({
            "driver": "array",
            "array": [[1, 2], [3, 4]],
            "dtype": "int32",
            "schema": {"domain": {"shape": [2, 2, 2]}}
        }))
        .unwrap_err();
        assert_eq!(mismatched_fields(&err), vec!["schema.rank".to_string()]);
    }
}
