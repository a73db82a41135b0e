use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::analyze::ReportRow;
use crate::record::{CleanRecord, RawRecord, CLEAN_COLUMNS};
use crate::skills::{coerce_skills, SkillsValue};
use crate::utils::ensure_parent_dir;

/// Raw postings from a scraper CSV. Column presence may vary.
pub fn read_raw_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let headers = rdr.headers()?.clone();
    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row.with_context(|| format!("Bad CSV row in {:?}", path))?;
        out.push(RawRecord::from_fields(headers.iter().zip(row.iter())));
    }
    Ok(out)
}

/// Raw postings from a JSON array of objects.
pub fn read_raw_json(path: &Path) -> Result<Vec<RawRecord>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let doc: Value =
        serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {:?}", path))?;
    let Value::Array(items) = doc else {
        bail!("{:?}: expected a JSON array of postings", path);
    };
    Ok(items.iter().map(RawRecord::from_json).collect())
}

/// Pick the reader from the file extension; anything but `.json` is CSV.
pub fn read_raw(path: &Path) -> Result<Vec<RawRecord>> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => read_raw_json(path),
        _ => read_raw_csv(path),
    }
}

pub fn write_clean_csv(path: &Path, records: &[CleanRecord]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    wtr.write_record(CLEAN_COLUMNS)?;
    for rec in records {
        wtr.write_record(rec.to_row())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Processed rows written by `write_clean_csv` (or an older layout of it).
pub fn read_clean_csv(path: &Path) -> Result<Vec<CleanRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let headers = rdr.headers()?.clone();
    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row.with_context(|| format!("Bad CSV row in {:?}", path))?;
        out.push(CleanRecord::from_row(headers.iter().zip(row.iter())));
    }
    Ok(out)
}

/// Parsed-report rows (`report_name`, `text`, `skills`) from the PDF extraction step.
pub fn read_reports_csv(path: &Path) -> Result<Vec<ReportRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    let headers = rdr.headers()?.clone();
    let name_idx = headers.iter().position(|h| h.trim() == "report_name");
    let text_idx = headers.iter().position(|h| h.trim() == "text");
    let skills_idx = headers.iter().position(|h| h.trim() == "skills");
    let mut out = Vec::new();
    for row in rdr.records() {
        let row = row.with_context(|| format!("Bad CSV row in {:?}", path))?;
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("").trim();
        out.push(ReportRow {
            report_name: cell(name_idx).to_string(),
            text: cell(text_idx).to_string(),
            skills: coerce_skills(&SkillsValue::Text(cell(skills_idx).to_string())),
        });
    }
    Ok(out)
}

pub fn write_reports_csv(path: &Path, reports: &[ReportRow]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("Failed to create {:?}", path))?;
    wtr.write_record(["report_name", "text", "skills"])?;
    for r in reports {
        wtr.write_record([
            r.report_name.as_str(),
            r.text.as_str(),
            serde_json::to_string(&r.skills)?.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))
}
