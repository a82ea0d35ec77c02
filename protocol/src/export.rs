//! Binding generation for the TypeScript front-end that renders the history.

use crate::HISTORY_KEY;
use crate::HistoryMessage;
use crate::RETENTION_CONFIG_KEY;
use crate::RetentionConfig;
use crate::VisitRecord;
use anyhow::Context;
use anyhow::Result;
use anyhow::anyhow;
use schemars::schema::RootSchema;
use schemars::schema_for;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use ts_rs::TS;

const HEADER: &str = "// GENERATED CODE! DO NOT MODIFY BY HAND!\n\n";

/// Writes `.ts` declarations for every record plus an `index.ts` barrel.
/// When `prettier` is given the generated files are formatted in place.
pub fn generate_ts(out_dir: &Path, prettier: Option<&Path>) -> Result<()> {
    ensure_dir(out_dir)?;

    VisitRecord::export_all_to(out_dir)?;
    RetentionConfig::export_all_to(out_dir)?;
    HistoryMessage::export_all_to(out_dir)?;

    let index_path = generate_index_ts(out_dir)?;

    let mut ts_files = ts_files_in(out_dir)?;
    ts_files.push(index_path);
    ts_files.sort();
    ts_files.dedup();

    for file in &ts_files {
        prepend_header_if_missing(file)?;
    }

    if let Some(prettier_bin) = prettier
        && !ts_files.is_empty()
    {
        let status = Command::new(prettier_bin)
            .arg("--write")
            .args(ts_files.iter().map(|p| p.as_os_str()))
            .status()
            .with_context(|| format!("Failed to invoke Prettier at {}", prettier_bin.display()))?;
        if !status.success() {
            return Err(anyhow!("Prettier failed with status {status}"));
        }
    }

    Ok(())
}

/// Writes one JSON schema per persisted storage key and one for the
/// broadcast message.
pub fn generate_json_schema(out_dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_dir(out_dir)?;
    let schemas: [(&str, RootSchema); 3] = [
        (HISTORY_KEY, schema_for!(Vec<VisitRecord>)),
        (RETENTION_CONFIG_KEY, schema_for!(RetentionConfig)),
        ("HistoryMessage", schema_for!(HistoryMessage)),
    ];

    let mut written = Vec::with_capacity(schemas.len());
    for (name, schema) in schemas {
        let path = out_dir.join(format!("{name}.schema.json"));
        let data = serde_json::to_vec_pretty(&schema)
            .with_context(|| format!("Failed to serialize schema for {name}"))?;
        fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

fn prepend_header_if_missing(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.starts_with(HEADER) {
        return Ok(());
    }
    fs::write(path, format!("{HEADER}{content}"))
        .with_context(|| format!("Failed to write header to {}", path.display()))
}

fn ts_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read dir {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension() == Some(OsStr::new("ts")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn generate_index_ts(out_dir: &Path) -> Result<PathBuf> {
    let mut stems: Vec<String> = ts_files_in(out_dir)?
        .into_iter()
        .filter_map(|p| {
            let stem = p.file_stem()?.to_string_lossy().into_owned();
            if stem == "index" { None } else { Some(stem) }
        })
        .collect();
    stems.sort();
    stems.dedup();

    let mut content = String::from(HEADER);
    for name in &stems {
        content.push_str(&format!("export type {{ {name} }} from \"./{name}\";\n"));
    }

    let index_path = out_dir.join("index.ts");
    fs::write(&index_path, content)
        .with_context(|| format!("Failed to write {}", index_path.display()))?;
    Ok(index_path)
}
