//! Result snapshots on disk and the console summary.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{PromptestError, Result};
use crate::runner::{ModelRunSummary, TestOutcome};
use crate::suite::RunConfig;

/// Timestamp format of run directories
pub const RUN_DIR_TIME_FORMAT: &str = "%Y_%m_%d_%H_%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub passes: usize,
    pub inconclusive: usize,
    pub total: usize,
}

/// One model's results as written to `<model>_test_result.yml`
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub model: &'a str,
    pub results: &'a [TestOutcome],
    pub totals: Totals,
    pub temperature: f64,
    pub max_tokens: u32,
    pub prompt_template: &'a str,
}

impl<'a> Snapshot<'a> {
    pub fn new(summary: &'a ModelRunSummary, config: &RunConfig, template: &'a str) -> Self {
        Self {
            model: &summary.model,
            results: &summary.results,
            totals: Totals {
                passes: summary.passes,
                inconclusive: summary.inconclusive,
                total: summary.total,
            },
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            prompt_template: template,
        }
    }
}

/// Template name used in the run directory: the prompt file's stem
pub fn template_name(prompt_path: &Path) -> String {
    prompt_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "prompt".to_string())
}

/// `<root>/<YYYY_MM_DD_HH_MM>-<template_name>`
pub fn output_directory(root: &Path, template_name: &str, timestamp: DateTime<Local>) -> PathBuf {
    root.join(format!(
        "{}-{}",
        timestamp.format(RUN_DIR_TIME_FORMAT),
        template_name
    ))
}

/// Snapshot file names, one per model, unique even for repeated models
pub fn snapshot_file_names<'a, I>(models: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut taken: HashSet<String> = HashSet::new();

    models
        .into_iter()
        .map(|model| {
            let base = sanitize_model_name(model);
            let mut stem = base.clone();
            let mut suffix = 1;
            while taken.contains(&stem) {
                suffix += 1;
                stem = format!("{}_{}", base, suffix);
            }
            let name = format!("{}_test_result.yml", stem);
            taken.insert(stem);
            name
        })
        .collect()
}

/// Make a model name (possibly a path) safe as a file name
fn sanitize_model_name(model: &str) -> String {
    let replaced: String = model
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect();
    let trimmed = replaced.trim_start_matches(&['.', '_'][..]);
    if trimmed.is_empty() {
        "model".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write one snapshot per model into `dir`, creating it if needed.
pub fn save_snapshots(
    dir: &Path,
    summaries: &[ModelRunSummary],
    config: &RunConfig,
    template: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .map_err(|e| PromptestError::io_operation("create directory", dir.display(), e))?;

    let names = snapshot_file_names(summaries.iter().map(|s| s.model.as_str()));

    summaries
        .iter()
        .zip(names)
        .map(|(summary, name)| {
            let path = dir.join(name);
            let yaml = serde_yaml::to_string(&Snapshot::new(summary, config, template))?;
            fs::write(&path, yaml)
                .map_err(|e| PromptestError::io_operation("write", path.display(), e))?;
            tracing::debug!(path = %path.display(), model = %summary.model, "snapshot_written");
            Ok(path)
        })
        .collect()
}

pub fn summary_line(summary: &ModelRunSummary) -> String {
    format!(
        "Model: {}, Passes: {}, Total: {}, Passes/Total Ratio: {:.2}",
        summary.model,
        summary.passes,
        summary.total,
        summary.ratio()
    )
}

/// One summary line per model, in run order
pub fn write_summary<W: Write>(out: &mut W, summaries: &[ModelRunSummary]) -> std::io::Result<()> {
    for summary in summaries {
        writeln!(out, "{}", summary_line(summary))?;
    }
    Ok(())
}
