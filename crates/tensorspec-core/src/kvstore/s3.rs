//! S3-compatible object store

use crate::error::ValidationResult;
use crate::types::ContextResource;
use crate::validation::reader::{parse_bool, parse_non_empty_string, parse_string, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct S3KvStore {
    pub bucket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_pays: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_conditional_write: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_request_concurrency: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_request_retries: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental_s3_rate_limiter: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_copy_concurrency: Option<ContextResource>,
}

impl S3KvStore {
    pub(crate) fn read(reader: &mut ObjectReader<'_>) -> ValidationResult<Self> {
        Ok(Self {
            bucket: reader.required("bucket", parse_non_empty_string)?,
            path: reader.optional("path", parse_string)?,
            requester_pays: reader.optional("requester_pays", parse_bool)?,
            aws_region: reader.optional("aws_region", parse_non_empty_string)?,
            endpoint: reader.optional("endpoint", parse_endpoint)?,
            host_header: reader.optional("host_header", parse_non_empty_string)?,
            use_conditional_write: reader.optional("use_conditional_write", parse_bool)?,
            aws_credentials: reader.optional("aws_credentials", ContextResource::for_field("aws_credentials"))?,
            s3_request_concurrency: reader
                .optional("s3_request_concurrency", ContextResource::for_field("s3_request_concurrency"))?,
            s3_request_retries: reader.optional("s3_request_retries", ContextResource::for_field("s3_request_retries"))?,
            experimental_s3_rate_limiter: reader.optional(
                "experimental_s3_rate_limiter",
                ContextResource::for_field("experimental_s3_rate_limiter"),
            )?,
            data_copy_concurrency: reader
                .optional("data_copy_concurrency", ContextResource::for_field("data_copy_concurrency"))?,
        })
    }
}

/// Endpoints must be absolute `http` or `https` URLs with a host
fn parse_endpoint(value: &Value, ctx: &ValidationContext) -> ValidationResult<String> {
    let endpoint = parse_string(value, ctx)?;
    let valid = Url::parse(&endpoint)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false);
    if !valid {
        return Err(ctx.invalid_value("http or https URL", format!("\"{}\"", endpoint)));
    }
    Ok(endpoint)
}
