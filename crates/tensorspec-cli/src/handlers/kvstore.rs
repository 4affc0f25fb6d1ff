//! Kvstore URL expansion handler

use crate::cli::KvStoreArgs;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use serde_json::Value;
use tensorspec_core::{KvStoreSpec, ValidationContext};
use tracing::debug;

/// Expand a URL such as `s3://bucket/path` and print the validated object form
pub fn handle_kvstore(args: KvStoreArgs, output: &mut OutputWriter) -> Result<()> {
    let spec = expand_url(&args.url)?;
    debug!(url = %args.url, driver = spec.driver(), "expanded kvstore URL");
    output.data(&spec)
}

pub fn expand_url(url: &str) -> Result<KvStoreSpec> {
    if !url.contains("://") {
        return Err(Error::invalid_args(format!("'{}' is not a URL (expected e.g. s3://bucket/path)", url)));
    }
    let ctx = ValidationContext::default().child("kvstore");
    Ok(KvStoreSpec::from_value(&Value::String(url.to_string()), &ctx)?)
}
