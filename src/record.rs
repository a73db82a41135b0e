use serde::Serialize;
use serde_json::Value;

use crate::fingerprint::hash_row;
use crate::skills::{coerce_skills, SkillsValue};

/// Output column order for flat-file persistence. Written as the header even
/// when the batch is empty.
pub const CLEAN_COLUMNS: [&str; 16] = [
    "source",
    "title",
    "company",
    "location",
    "date_posted",
    "job_url",
    "description",
    "skills",
    "city",
    "state",
    "job_type",
    "seniority",
    "salary_min",
    "salary_max",
    "currency",
    "url",
];

/// One scraped or parsed posting, as delivered by a source. Every field may
/// be absent.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub source: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub date_posted: Option<String>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub skills: SkillsValue,
}

impl RawRecord {
    /// Build from (column, cell) pairs. Unknown columns are ignored.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut raw = RawRecord::default();
        for (name, value) in fields {
            if name.trim() == "skills" {
                raw.skills = SkillsValue::Text(value.to_string());
            } else if let Some(slot) = raw.slot_mut(name.trim()) {
                *slot = Some(value.to_string());
            }
        }
        raw
    }

    /// Build from a JSON object. Scalars are stringified; nulls, arrays and
    /// nested objects in textual fields are treated as absent.
    pub fn from_json(value: &Value) -> Self {
        let mut raw = RawRecord::default();
        let Some(obj) = value.as_object() else {
            return raw;
        };
        for (name, v) in obj {
            if name == "skills" {
                raw.skills = SkillsValue::from(v);
                continue;
            }
            let Some(slot) = raw.slot_mut(name) else {
                continue;
            };
            *slot = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            };
        }
        raw
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "source" => Some(&mut self.source),
            "title" => Some(&mut self.title),
            "company" => Some(&mut self.company),
            "location" => Some(&mut self.location),
            "date_posted" => Some(&mut self.date_posted),
            "job_url" => Some(&mut self.job_url),
            "description" => Some(&mut self.description),
            _ => None,
        }
    }
}

/// A normalized, deduplicated posting. Keyed by `job_url` when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanRecord {
    pub source: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub date_posted: String,
    pub job_url: String,
    pub description: String,
    pub skills: Vec<String>,
    pub city: String,
    pub state: String,
    pub job_type: String,
    pub seniority: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub currency: Option<String>,
    pub url: String,
}

impl CleanRecord {
    pub fn fingerprint(&self) -> String {
        hash_row(&self.title, &self.company, &self.description)
    }

    /// Cells in `CLEAN_COLUMNS` order. Nulls become empty cells; skills are a
    /// JSON array.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.source.clone(),
            self.title.clone(),
            self.company.clone(),
            self.location.clone(),
            self.date_posted.clone(),
            self.job_url.clone(),
            self.description.clone(),
            skills_cell(&self.skills),
            self.city.clone(),
            self.state.clone(),
            self.job_type.clone(),
            self.seniority.clone(),
            opt_num(self.salary_min),
            opt_num(self.salary_max),
            self.currency.clone().unwrap_or_default(),
            self.url.clone(),
        ]
    }

    /// Rebuild from a processed row. Columns may be missing or reordered.
    pub fn from_row<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut rec = CleanRecord::default();
        for (name, value) in fields {
            let value = value.trim();
            match name.trim() {
                "source" => rec.source = value.to_string(),
                "title" => rec.title = value.to_string(),
                "company" => rec.company = value.to_string(),
                "location" => rec.location = value.to_string(),
                "date_posted" => rec.date_posted = value.to_string(),
                "job_url" => rec.job_url = value.to_string(),
                "description" => rec.description = value.to_string(),
                "skills" => rec.skills = coerce_skills(&SkillsValue::Text(value.to_string())),
                "city" => rec.city = value.to_string(),
                "state" => rec.state = value.to_string(),
                "job_type" => rec.job_type = value.to_string(),
                "seniority" => rec.seniority = value.to_string(),
                "salary_min" => rec.salary_min = value.parse().ok(),
                "salary_max" => rec.salary_max = value.parse().ok(),
                "currency" => {
                    rec.currency = Some(value.to_string()).filter(|c| !c.is_empty())
                }
                "url" => rec.url = value.to_string(),
                _ => {}
            }
        }
        if rec.url.is_empty() {
            rec.url = rec.job_url.clone();
        }
        rec
    }
}

/// A JSON array, so skills containing delimiters read back intact.
fn skills_cell(skills: &[String]) -> String {
    if skills.is_empty() {
        return String::new();
    }
    serde_json::to_string(skills).unwrap_or_default()
}

fn opt_num(v: Option<f64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_default()
}
