//! Job-type and seniority classification from configurable pattern sets.
//!
//! The config is a JSON document with two sections, `job_type` and
//! `seniority`, each mapping bucket name to an ordered list of entries. An
//! entry is either a regex string or an object with a `pattern` field.
//! Buckets are tried in document order; the first whose patterns match
//! anywhere in `title + " " + description` wins.

use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{PatternError, PatternErrors};

pub const JOB_TYPE: &str = "job_type";
pub const SENIORITY: &str = "seniority";

/// One bucket and its patterns as declared. `None` marks an entry that has
/// no usable pattern string.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRule {
    pub bucket: String,
    pub patterns: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternConfig {
    pub job_type: Vec<ClassificationRule>,
    pub seniority: Vec<ClassificationRule>,
}

impl PatternConfig {
    pub fn load(path: &Path) -> Result<Self, PatternError> {
        let text = fs::read_to_string(path).map_err(|source| PatternError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, PatternError> {
        let doc: Value = serde_json::from_str(text)?;
        Ok(PatternConfig {
            job_type: parse_section(&doc, JOB_TYPE)?,
            seniority: parse_section(&doc, SENIORITY)?,
        })
    }

    fn sections(&self) -> [(&'static str, &[ClassificationRule]); 2] {
        [(JOB_TYPE, &self.job_type), (SENIORITY, &self.seniority)]
    }

    /// Check every entry and report all problems, not just the first.
    pub fn validate(&self) -> Result<(), PatternErrors> {
        let mut problems = PatternErrors::default();
        for (section, rules) in self.sections() {
            for rule in rules {
                for (index, entry) in rule.patterns.iter().enumerate() {
                    if let Err(e) = compile_entry(section, &rule.bucket, index, entry.as_deref()) {
                        problems.0.push(e);
                    }
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.sections()
            .iter()
            .flat_map(|(_, rules)| rules.iter())
            .map(|r| r.patterns.len())
            .sum()
    }
}

fn parse_section(doc: &Value, section: &str) -> Result<Vec<ClassificationRule>, PatternError> {
    let Some(raw) = doc.get(section) else {
        return Ok(Vec::new());
    };
    let obj = raw.as_object().ok_or_else(|| PatternError::SectionShape {
        section: section.to_string(),
    })?;

    let mut rules = Vec::with_capacity(obj.len());
    for (bucket, entries) in obj {
        let entries = entries.as_array().ok_or_else(|| PatternError::BucketShape {
            section: section.to_string(),
            bucket: bucket.clone(),
        })?;
        let patterns = entries
            .iter()
            .map(|e| match e {
                Value::String(s) => Some(s.clone()),
                Value::Object(o) => o.get("pattern").and_then(Value::as_str).map(str::to_string),
                _ => None,
            })
            .map(|p| p.filter(|s| !s.is_empty()))
            .collect();
        rules.push(ClassificationRule {
            bucket: bucket.clone(),
            patterns,
        });
    }
    Ok(rules)
}

fn compile_entry(
    section: &str,
    bucket: &str,
    index: usize,
    entry: Option<&str>,
) -> Result<Regex, PatternError> {
    let pattern = entry.ok_or_else(|| PatternError::MissingPattern {
        section: section.to_string(),
        bucket: bucket.to_string(),
        index,
    })?;
    Regex::new(&format!("(?i){pattern}")).map_err(|source| PatternError::InvalidRegex {
        section: section.to_string(),
        bucket: bucket.to_string(),
        pattern: pattern.to_string(),
        source: Box::new(source),
    })
}

#[derive(Debug)]
struct CompiledRule {
    bucket: String,
    re: Regex,
}

fn compile_section(
    section: &str,
    rules: &[ClassificationRule],
) -> Result<Vec<CompiledRule>, PatternError> {
    let mut compiled = Vec::with_capacity(rules.len());
    for rule in rules {
        let mut parts = Vec::with_capacity(rule.patterns.len());
        for (index, entry) in rule.patterns.iter().enumerate() {
            compile_entry(section, &rule.bucket, index, entry.as_deref())?;
            if let Some(p) = entry {
                parts.push(format!("(?:{p})"));
            }
        }
        if parts.is_empty() {
            debug!(section, bucket = %rule.bucket, "bucket has no patterns; it never matches");
            continue;
        }
        let combined = format!("(?i){}", parts.join("|"));
        let re = Regex::new(&combined).map_err(|source| PatternError::InvalidRegex {
            section: section.to_string(),
            bucket: rule.bucket.clone(),
            pattern: combined.clone(),
            source: Box::new(source),
        })?;
        compiled.push(CompiledRule {
            bucket: rule.bucket.clone(),
            re,
        });
    }
    Ok(compiled)
}

/// Compiled, immutable ruleset. Build once and share by reference.
#[derive(Debug)]
pub struct Classifier {
    job_type: Vec<CompiledRule>,
    seniority: Vec<CompiledRule>,
}

impl Classifier {
    pub fn new(config: &PatternConfig) -> Result<Self, PatternError> {
        Ok(Classifier {
            job_type: compile_section(JOB_TYPE, &config.job_type)?,
            seniority: compile_section(SENIORITY, &config.seniority)?,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, PatternError> {
        Self::new(&PatternConfig::load(path)?)
    }

    pub fn infer_job_type(&self, title: &str, description: &str) -> &str {
        first_match(&self.job_type, title, description)
    }

    pub fn infer_seniority(&self, title: &str, description: &str) -> &str {
        first_match(&self.seniority, title, description)
    }
}

fn first_match<'a>(rules: &'a [CompiledRule], title: &str, description: &str) -> &'a str {
    let text = format!("{title} {description}");
    rules
        .iter()
        .find(|r| r.re.is_match(&text))
        .map(|r| r.bucket.as_str())
        .unwrap_or("")
}
