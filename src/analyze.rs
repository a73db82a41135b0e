//! Aggregate market analytics over cleaned postings.

use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::classify::SENIORITY;
use crate::record::CleanRecord;

const TOP_EMPLOYERS: usize = 10;

/// A parsed report (PDF text already extracted upstream) and its skills.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRow {
    pub report_name: String,
    pub text: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    pub num_jobs: usize,
    pub unique_employers: usize,
    pub top_skills: Vec<(String, usize)>,
    pub top_employers: Vec<(String, usize)>,
    pub report_skills: Vec<(String, usize)>,
    pub run_timestamp: String,
}

pub fn analyze_market(
    jobs: &[CleanRecord],
    reports: Option<&[ReportRow]>,
    top_n: usize,
) -> MarketAnalysis {
    let unique_employers = jobs
        .iter()
        .map(|j| j.company.as_str())
        .filter(|c| !c.is_empty())
        .unique()
        .count();

    let report_skills = reports
        .map(|rs| ranked(rs.iter().flat_map(|r| r.skills.iter().map(String::as_str)), top_n))
        .unwrap_or_default();

    MarketAnalysis {
        num_jobs: jobs.len(),
        unique_employers,
        top_skills: ranked(jobs.iter().flat_map(|j| j.skills.iter().map(String::as_str)), top_n),
        top_employers: ranked(jobs.iter().map(|j| j.company.as_str()), TOP_EMPLOYERS),
        report_skills,
        run_timestamp: Utc::now().to_rfc3339(),
    }
}

/// Non-empty values by count descending, ties broken by name.
pub fn ranked<'a, I>(values: I, n: usize) -> Vec<(String, usize)>
where
    I: Iterator<Item = &'a str>,
{
    values
        .filter(|v| !v.is_empty())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(n)
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn jobs_by_state(jobs: &[CleanRecord]) -> Vec<(String, usize)> {
    ranked(jobs.iter().map(|j| j.state.as_str()), usize::MAX)
}

/// Postings per classification bucket for `section` (`job_type` or `seniority`).
pub fn counts_by_bucket(jobs: &[CleanRecord], section: &str) -> Vec<(String, usize)> {
    let values = jobs.iter().map(|j| match section {
        SENIORITY => j.seniority.as_str(),
        _ => j.job_type.as_str(),
    });
    ranked(values, usize::MAX)
}

/// Postings per `YYYY-MM`, oldest first. Unparsable dates are skipped.
pub fn monthly_postings(jobs: &[CleanRecord]) -> Vec<(String, usize)> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for date in jobs.iter().filter_map(|j| parse_date(&j.date_posted)) {
        *months.entry(date.format("%Y-%m").to_string()).or_default() += 1;
    }
    months.into_iter().collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d", "%B %d, %Y", "%b %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSalary {
    pub skill: String,
    pub n: usize,
    pub avg_low: Option<f64>,
    pub avg_high: Option<f64>,
}

/// Mean advertised salary per skill, for skills seen at least `min_n` times.
pub fn salary_by_skill(jobs: &[CleanRecord], min_n: usize) -> Vec<SkillSalary> {
    #[derive(Default)]
    struct Acc {
        n: usize,
        low: Vec<f64>,
        high: Vec<f64>,
    }

    let mut by_skill: BTreeMap<&str, Acc> = BTreeMap::new();
    for job in jobs {
        for skill in job.skills.iter().filter(|s| !s.is_empty()) {
            let acc = by_skill.entry(skill.as_str()).or_default();
            acc.n += 1;
            acc.low.extend(job.salary_min);
            acc.high.extend(job.salary_max);
        }
    }

    by_skill
        .into_iter()
        .filter(|(_, acc)| acc.n >= min_n)
        .map(|(skill, acc)| SkillSalary {
            skill: skill.to_string(),
            n: acc.n,
            avg_low: mean(&acc.low),
            avg_high: mean(&acc.high),
        })
        .sorted_by(|a, b| b.n.cmp(&a.n).then_with(|| a.skill.cmp(&b.skill)))
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(company: &str, state: &str, date: &str, skills: &[&str], low: Option<f64>) -> CleanRecord {
        CleanRecord {
            company: company.into(),
            state: state.into(),
            date_posted: date.into(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            salary_min: low,
            ..Default::default()
        }
    }

    fn sample() -> Vec<CleanRecord> {
        vec![
            job("Heritage Research", "AZ", "2025-01-15", &["ArcGIS", "Section 106", "OSHA 10"], None),
            job("CRC", "CO", "2025-01-14", &["NEPA", "GIS", "Section 106"], Some(60000.0)),
            job("CRC", "CO", "2025-02-02", &["NEPA"], Some(70000.0)),
            job("", "", "not a date", &[], None),
        ]
    }

    #[test]
    fn counts_jobs_and_employers() {
        let a = analyze_market(&sample(), None, 30);
        assert_eq!(a.num_jobs, 4);
        assert_eq!(a.unique_employers, 2);
        assert_eq!(a.top_employers[0], ("CRC".to_string(), 2));
        assert!(a.report_skills.is_empty());
    }

    #[test]
    fn top_skills_sorted_by_count_then_name() {
        let a = analyze_market(&sample(), None, 30);
        let skills: BTreeMap<_, _> = a.top_skills.iter().cloned().collect();
        assert_eq!(skills["Section 106"], 2);
        assert_eq!(a.top_skills[0], ("NEPA".to_string(), 2));
        assert_eq!(a.top_skills[1], ("Section 106".to_string(), 2));
        let counts: Vec<usize> = a.top_skills.iter().map(|(_, c)| *c).collect();
        let mut sorted = counts.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(counts, sorted);
    }

    #[test]
    fn top_n_limits_output() {
        let a = analyze_market(&sample(), None, 2);
        assert_eq!(a.top_skills.len(), 2);
    }

    #[test]
    fn empty_input() {
        let a = analyze_market(&[], None, 30);
        assert_eq!(a.num_jobs, 0);
        assert_eq!(a.unique_employers, 0);
        assert!(a.top_skills.is_empty());
    }

    #[test]
    fn deterministic_except_timestamp() {
        let a = analyze_market(&sample(), None, 30);
        let b = analyze_market(&sample(), None, 30);
        assert_eq!(a.top_skills, b.top_skills);
        assert_eq!(a.top_employers, b.top_employers);
    }

    #[test]
    fn report_skills_are_ranked() {
        let reports = vec![
            ReportRow {
                report_name: "a.pdf".into(),
                skills: vec!["LiDAR".into(), "NAGPRA".into()],
                ..Default::default()
            },
            ReportRow {
                report_name: "b.pdf".into(),
                skills: vec!["NAGPRA".into()],
                ..Default::default()
            },
        ];
        let a = analyze_market(&sample(), Some(&reports), 30);
        assert_eq!(a.report_skills[0], ("NAGPRA".to_string(), 2));
    }

    #[test]
    fn serializes_to_json() {
        let a = analyze_market(&sample(), None, 30);
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["num_jobs"], 4);
        assert_eq!(v["top_employers"][0][0], "CRC");
    }

    #[test]
    fn state_and_month_breakdowns() {
        let jobs = sample();
        assert_eq!(
            jobs_by_state(&jobs),
            vec![("CO".to_string(), 2), ("AZ".to_string(), 1)]
        );
        assert_eq!(
            monthly_postings(&jobs),
            vec![("2025-01".to_string(), 2), ("2025-02".to_string(), 1)]
        );
    }

    #[test]
    fn bucket_counts_follow_section() {
        let mut jobs = sample();
        jobs[0].job_type = "field-tech".into();
        jobs[1].job_type = "field-tech".into();
        jobs[1].seniority = "senior".into();
        assert_eq!(
            counts_by_bucket(&jobs, crate::classify::JOB_TYPE),
            vec![("field-tech".to_string(), 2)]
        );
        assert_eq!(
            counts_by_bucket(&jobs, SENIORITY),
            vec![("senior".to_string(), 1)]
        );
    }

    #[test]
    fn parses_common_date_layouts() {
        assert!(parse_date("2025-03-01T12:00:00Z").is_some());
        assert!(parse_date("03/01/2025").is_some());
        assert!(parse_date("March 1, 2025").is_some());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn salary_by_skill_respects_min_n() {
        let out = salary_by_skill(&sample(), 2);
        let names: Vec<&str> = out.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(names, ["NEPA", "Section 106"]);
        assert_eq!(out[0].avg_low, Some(65000.0));
        assert_eq!(out[1].avg_low, Some(60000.0));
        assert_eq!(out[1].avg_high, None);
    }
}
