//! Validation command handler

use super::utils::load_document;
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tensorspec_core::{
    validate_specs_batch, TensorStoreSpec, ValidationConfig, ValidationContext, ValidationError, ValidationErrors,
};
use tracing::{debug, info, instrument, warn};

/// Outcome of validating one file
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    pub valid: bool,
    pub documents: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub canonical: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

/// Handle the validate command
#[instrument(skip_all, fields(files = args.files.len()))]
pub fn handle_validate(args: ValidateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &format!("{} file(s)", args.files.len()));
    let batch = config.validation_config(args.mode.map(Into::into), args.fail_fast, args.max_errors)?;
    info!(mode = %batch.mode, fail_fast = batch.fail_fast, max_errors = batch.max_errors, "starting validation");

    let progress = output.progress_bar(args.files.len() as u64, "validating");
    let mut reports = Vec::with_capacity(args.files.len());
    let mut total = 0;
    let mut failed = 0;

    for path in &args.files {
        let report = validate_file(path, &batch, args.canonical)?;
        total += report.documents;
        failed += report.errors.len();

        if output.is_human() {
            if let Some(pb) = &progress {
                pb.suspend(|| print_human_report(output, &report, args.detailed))?;
            } else {
                print_human_report(output, &report, args.detailed)?;
            }
        }
        reports.push(report);

        if let Some(pb) = &progress {
            pb.inc(1);
        }
        if batch.should_stop(failed) {
            if reports.len() < args.files.len() {
                warn!(remaining = args.files.len() - reports.len(), "stopping early");
            }
            break;
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if !output.is_human() {
        output.data(&reports)?;
    }

    if failed > 0 {
        return Err(Error::ValidationFailed { failed, total });
    }

    output.success(&format!("{} spec(s) valid", total))?;
    Ok(())
}

/// Validate a single file; a top-level list is validated as a batch
pub fn validate_file(path: &Path, batch: &ValidationConfig, canonical: bool) -> Result<FileReport> {
    let document = load_document(path)?;
    debug!(path = %path.display(), "validating document");

    let (documents, result) = match &document {
        Value::Array(items) => (items.len(), validate_specs_batch(items, batch)),
        single => (
            1,
            TensorStoreSpec::from_value(single, &ValidationContext::new(batch.mode))
                .map(|spec| vec![spec])
                .map_err(ValidationErrors::from),
        ),
    };

    let (canonical, errors) = match result {
        Ok(specs) if canonical => (
            specs
                .iter()
                .map(TensorStoreSpec::to_value)
                .collect::<tensorspec_core::Result<Vec<_>>>()?,
            Vec::new(),
        ),
        Ok(_) => (Vec::new(), Vec::new()),
        Err(errors) => (Vec::new(), errors.errors),
    };

    Ok(FileReport {
        file: path.display().to_string(),
        valid: errors.is_empty(),
        documents,
        canonical,
        errors,
    })
}

fn print_human_report(output: &mut OutputWriter, report: &FileReport, detailed: bool) -> Result<()> {
    if report.valid {
        output.success(&format!("{} ({} spec(s))", report.file, report.documents))?;
        for spec in &report.canonical {
            output.data(spec)?;
        }
    } else {
        output.error(&format!("{} ({} of {} spec(s) invalid)", report.file, report.errors.len(), report.documents))?;
        output.validation_errors(&ValidationErrors::from(report.errors.clone()), detailed)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use tensorspec_core::ValidationMode;

    const ZARR_SPEC: &str = r#"{
        "driver": "zarr",
        "kvstore": "memory://",
        "path": "arr",
        "metadata": {"shape": [10, 20], "chunks": [5, 5], "dtype": "<f4"},
        "extra": true
    }"#;

    #[test]
    fn test_single_document_modes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.json");
        fs::write(&path, ZARR_SPEC).unwrap();

        let report = validate_file(&path, &ValidationConfig::strict(), false).unwrap();
        assert!(!report.valid);
        assert_eq!(report.errors[0].path, "$.extra");

        let report = validate_file(&path, &ValidationConfig::partial(), true).unwrap();
        assert!(report.valid);
        assert_eq!(report.canonical.len(), 1);
        assert_eq!(report.canonical[0]["driver"], "zarr");
        assert!(report.canonical[0].get("extra").is_none());
    }

    #[test]
    fn test_list_is_validated_as_batch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("specs.yaml");
        fs::write(
            &path,
            "- driver: array\n  dtype: int32\n  array: [1, 2, 3]\n- driver: nope\n- driver: auto\n  kvstore: memory://\n",
        )
        .unwrap();

        let report = validate_file(&path, &ValidationConfig::default(), false).unwrap();
        assert_eq!(report.documents, 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "$[1]");

        let basic = ValidationConfig {
            mode: ValidationMode::Basic,
            ..ValidationConfig::default()
        };
        assert_eq!(validate_file(&path, &basic, false).unwrap().errors.len(), 1);
    }
}
