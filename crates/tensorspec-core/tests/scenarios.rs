//! End-to-end scenarios through the public entry points

use pretty_assertions::assert_eq;
use serde_json::json;
use tensorspec_core::{
    validate_json, validate_spec, DriverKind, ErrorKind, KvStoreSpec, LengthMismatch, TensorStoreSpec,
};

#[test]
fn test_inline_array_shape() {
    let spec = validate_spec(&json!({"driver": "array", "array": [[1, 2, 3], [4, 5, 6]], "dtype": "int32"})).unwrap();
    let TensorStoreSpec::Array(array) = &spec else {
        panic!("expected an array spec, got {:?}", spec);
    };
    assert_eq!(array.shape(), &[2, 3]);
    assert_eq!(spec.rank(), Some(2));
}

#[test]
fn test_ragged_array_is_rejected() {
    let err = validate_spec(&json!({"driver": "array", "array": [[1, 2], [3, 4, 5]], "dtype": "int32"})).unwrap_err();
    assert_eq!(err.kind.name(), "IrregularArrayShape");
    assert_eq!(err.driver.as_deref(), Some("array"));
    assert!(err.path.starts_with("$.array"));
}

#[test]
fn test_zarr_without_kvstore() {
    let err = validate_spec(&json!({"driver": "zarr", "path": "x.zarr"})).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::MissingRequiredField {
            field: "kvstore".to_string()
        }
    );
    assert_eq!(err.path, "$.kvstore");
}

#[test]
fn test_n5_block_size_length() {
    let err = validate_spec(&json!({
        "driver": "n5",
        "kvstore": {"driver": "memory"},
        "metadata": {"dimensions": [10, 10], "blockSize": [5, 5, 5]}
    }))
    .unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::RankMismatch {
            rank: 2,
            mismatches: vec![LengthMismatch {
                field: "blockSize".to_string(),
                length: 3,
            }],
        }
    );
    assert_eq!(err.path, "$.metadata");
}

#[test]
fn test_s3_url_shorthand() {
    let spec = validate_spec(&json!({"driver": "zarr", "kvstore": "s3://my-bucket/a/b"})).unwrap();
    let kvstore = spec.kvstore().unwrap();
    assert_eq!(
        serde_json::to_value(kvstore).unwrap(),
        json!({"driver": "s3", "bucket": "my-bucket", "path": "a/b"})
    );
    assert!(matches!(kvstore, KvStoreSpec::S3(_)));
}

#[test]
fn test_unknown_driver_lists_registry() {
    let err = validate_spec(&json!({"driver": "unknown_x"})).unwrap_err();
    let ErrorKind::UnknownDriver { driver, registered } = &err.kind else {
        panic!("expected UnknownDriver, got {:?}", err.kind);
    };
    assert_eq!(driver, "unknown_x");
    assert_eq!(registered, &DriverKind::registered_names());
    assert!(registered.contains(&"zarr3".to_string()));
    assert!(err.kind.is_dispatch_error());
}

#[test]
fn test_json_text_entry_point() {
    let spec = validate_json(r#"{"driver": "n5", "kvstore": "memory://", "path": "volume"}"#).unwrap();
    assert_eq!(spec.driver(), "n5");
    assert_eq!(spec.effective_path().as_deref(), Some("volume"));

    let err = validate_json("{driver: n5}").unwrap_err();
    assert_eq!(err.kind.name(), "MalformedInput");
}

#[test]
fn test_full_zarr_spec() {
    let spec = validate_spec(&json!({
        "driver": "zarr",
        "kvstore": {"driver": "file", "path": "/data/volumes/"},
        "path": "raw.zarr",
        "open": true,
        "recheck_cached_data": "open",
        "context": {"cache_pool": {"total_bytes_limit": 100000000}, "data_copy_concurrency": 4},
        "schema": {
            "dtype": "uint16",
            "domain": {"shape": [512, 512, 64], "labels": ["x", "y", "z"]},
            "chunk_layout": {"inner_order": [2, 1, 0]},
            "dimension_units": ["4nm", "4nm", [40, "nm"]]
        },
        "metadata": {
            "zarr_format": 2,
            "shape": [512, 512, 64],
            "chunks": [64, 64, 64],
            "dtype": "<u2",
            "compressor": {"id": "blosc", "cname": "zstd", "clevel": 5, "shuffle": 1},
            "fill_value": 0,
            "order": "C"
        }
    }))
    .unwrap();
    assert_eq!(spec.rank(), Some(3));
    assert_eq!(spec.effective_path().as_deref(), Some("/data/volumes/raw.zarr"));
}
