//! Format detection adapter
//!
//! The concrete format is only known once the store is inspected, so any
//! fields besides the common ones and `kvstore` are carried through as-is.

use super::base::{DriverConstraints, SpecBase};
use crate::error::ValidationResult;
use crate::kvstore::KvStoreSpec;
use crate::validation::reader::ObjectReader;
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    pub kvstore: KvStoreSpec,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AutoSpec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.skip("driver");
        let base = SpecBase::read(&mut reader)?;
        let kvstore = reader.required("kvstore", KvStoreSpec::from_value)?;
        let extra = reader.into_extras();
        base.check_constraints(&DriverConstraints::default(), ctx)?;
        Ok(Self { base, kvstore, extra })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extra_fields_are_preserved() {
        let ctx = ValidationContext::default().with_driver("auto");
        let spec = AutoSpec::from_value(
            &json!({"driver": "auto", "kvstore": "file:///data/volume.zarr", "open": true}),
            &ctx,
        )
        .unwrap();
        assert_eq!(spec.extra["open"], json!(true));
        assert!(!spec.extra.contains_key("driver"));

        let err = AutoSpec::from_value(&json!({"driver": "auto"}), &ctx).unwrap_err();
        assert_eq!(err.kind.name(), "MissingRequiredField");
    }
}
