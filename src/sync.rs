use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::record::CleanRecord;

/// Keys already handed to the append-only sink. Persisted between runs.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenSet {
    #[serde(default)]
    pub urls: BTreeSet<String>,
    #[serde(default)]
    pub fingerprints: BTreeSet<String>,
}

impl SeenSet {
    /// Missing cache file means nothing has been synced yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(SeenSet::default());
        }
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Corrupt seen-set cache {:?}", path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::export::write_json(path, self)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Records not seen before, by both URL and fingerprint. Selected records
    /// are marked seen. Records with no `job_url` are never selected.
    pub fn select_unseen<'a>(&mut self, records: &'a [CleanRecord]) -> Vec<&'a CleanRecord> {
        let mut fresh = Vec::new();
        for rec in records {
            if rec.job_url.is_empty() || self.urls.contains(&rec.job_url) {
                continue;
            }
            let print = rec.fingerprint();
            if self.fingerprints.contains(&print) {
                continue;
            }
            self.urls.insert(rec.job_url.clone());
            self.fingerprints.insert(print);
            fresh.push(rec);
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(url: &str, title: &str) -> CleanRecord {
        CleanRecord {
            job_url: url.into(),
            title: title.into(),
            company: "CRC".into(),
            ..Default::default()
        }
    }

    #[test]
    fn appends_only_new_rows() {
        let mut seen = SeenSet::default();
        let first = vec![rec("https://x/1", "A"), rec("https://x/2", "B")];
        assert_eq!(seen.select_unseen(&first).len(), 2);

        let second = vec![
            rec("https://x/2", "B"),
            rec("https://x/3", "a"), // same content as x/1
            rec("https://x/4", "D"),
            rec("", "E"),
        ];
        let fresh = seen.select_unseen(&second);
        let urls: Vec<&str> = fresh.iter().map(|r| r.job_url.as_str()).collect();
        assert_eq!(urls, ["https://x/4"]);
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn cache_persists_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache/seen.json");

        let mut seen = SeenSet::load(&path).unwrap();
        assert!(seen.is_empty());
        seen.select_unseen(&[rec("https://x/1", "A")]);
        seen.save(&path).unwrap();

        let mut again = SeenSet::load(&path).unwrap();
        assert_eq!(again, seen);
        assert!(again.select_unseen(&[rec("https://x/1", "A")]).is_empty());
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.json");
        fs::write(&path, "not json").unwrap();
        assert!(SeenSet::load(&path).is_err());
    }
}
