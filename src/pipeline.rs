//! Batch normalization and deduplication.
//!
//! Passes, in order: trim/default the text fields, drop repeated `job_url`s,
//! drop repeated content fingerprints, then derive salary, location and
//! classification columns per record. Dedupe is first-occurrence-wins over
//! batch order; the enrichment pass has no cross-record state.

use std::collections::HashSet;
use tracing::{debug, info};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::classify::Classifier;
use crate::location::parse_city_state;
use crate::record::{CleanRecord, RawRecord};
use crate::salary::extract_salary;
use crate::skills::coerce_skills;

/// Counts from one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub input: usize,
    pub url_duplicates: usize,
    pub content_duplicates: usize,
    pub output: usize,
}

pub fn clean_and_dedupe(batch: &[RawRecord], classifier: &Classifier) -> Vec<CleanRecord> {
    clean_and_dedupe_with_report(batch, classifier).0
}

pub fn clean_and_dedupe_with_report(
    batch: &[RawRecord],
    classifier: &Classifier,
) -> (Vec<CleanRecord>, CleanReport) {
    let mut report = CleanReport {
        input: batch.len(),
        ..Default::default()
    };

    let normalized: Vec<CleanRecord> = batch.iter().map(normalize).collect();

    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut by_url = Vec::with_capacity(normalized.len());
    for rec in normalized {
        if !rec.job_url.is_empty() && !seen_urls.insert(rec.job_url.clone()) {
            debug!(job_url = %rec.job_url, "dropping repeated job_url");
            report.url_duplicates += 1;
            continue;
        }
        by_url.push(rec);
    }

    let mut seen_prints: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(by_url.len());
    for rec in by_url {
        if !seen_prints.insert(rec.fingerprint()) {
            debug!(title = %rec.title, company = %rec.company, "dropping repeated content");
            report.content_duplicates += 1;
            continue;
        }
        unique.push(rec);
    }

    let out = enrich_all(unique, classifier);
    report.output = out.len();
    info!(
        input = report.input,
        url_duplicates = report.url_duplicates,
        content_duplicates = report.content_duplicates,
        output = report.output,
        "cleaned batch"
    );
    (out, report)
}

fn normalize(raw: &RawRecord) -> CleanRecord {
    let field = |v: &Option<String>| v.as_deref().unwrap_or("").trim().to_string();
    CleanRecord {
        source: field(&raw.source),
        title: field(&raw.title),
        company: field(&raw.company),
        location: field(&raw.location),
        date_posted: field(&raw.date_posted),
        job_url: field(&raw.job_url),
        description: field(&raw.description),
        skills: coerce_skills(&raw.skills),
        ..Default::default()
    }
}

/// Fill the derived columns of one record. Reads only that record.
pub fn enrich(mut rec: CleanRecord, classifier: &Classifier) -> CleanRecord {
    let salary = extract_salary(&rec.description);
    rec.salary_min = salary.min;
    rec.salary_max = salary.max;
    rec.currency = salary.currency.map(str::to_string);

    let (city, state) = parse_city_state(&rec.location);
    rec.city = city;
    rec.state = state;

    rec.job_type = classifier
        .infer_job_type(&rec.title, &rec.description)
        .to_string();
    rec.seniority = classifier
        .infer_seniority(&rec.title, &rec.description)
        .to_string();
    rec.url = rec.job_url.clone();
    rec
}

#[cfg(feature = "rayon")]
fn enrich_all(records: Vec<CleanRecord>, classifier: &Classifier) -> Vec<CleanRecord> {
    records
        .into_par_iter()
        .map(|r| enrich(r, classifier))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn enrich_all(records: Vec<CleanRecord>, classifier: &Classifier) -> Vec<CleanRecord> {
    records.into_iter().map(|r| enrich(r, classifier)).collect()
}
