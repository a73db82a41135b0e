use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::{debug, warn};

use crate::analyze::ReportRow;
use crate::record::CleanRecord;
use crate::utils::ensure_parent_dir;

pub fn connect(path: &Path) -> Result<Connection> {
    ensure_parent_dir(path)?;
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            source      TEXT,
            title       TEXT,
            company     TEXT,
            location    TEXT,
            date_posted TEXT,
            job_url     TEXT UNIQUE,
            description TEXT,
            city        TEXT,
            state       TEXT,
            job_type    TEXT,
            seniority   TEXT,
            salary_min  REAL,
            salary_max  REAL,
            currency    TEXT,
            created_at  TEXT DEFAULT (datetime('now')),
            updated_at  TEXT DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_company ON jobs(company);
        CREATE INDEX IF NOT EXISTS idx_jobs_date ON jobs(date_posted);
        CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state);

        CREATE TABLE IF NOT EXISTS job_skills (
            job_id INTEGER NOT NULL REFERENCES jobs(id),
            skill  TEXT NOT NULL,
            UNIQUE(job_id, skill)
        );
        CREATE INDEX IF NOT EXISTS idx_jobskills_skill ON job_skills(skill);
        CREATE INDEX IF NOT EXISTS idx_jobskills_jobid ON job_skills(job_id);

        CREATE TABLE IF NOT EXISTS reports (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            report_name TEXT UNIQUE,
            text        TEXT,
            created_at  TEXT DEFAULT (datetime('now'))
        );
        "#,
    )?;
    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertCounts {
    pub written: usize,
    pub skipped_no_url: usize,
    pub skills: usize,
}

/// Insert-or-update keyed by `job_url`, in one transaction. Rows without a
/// `job_url` have no stable key and are skipped.
pub fn upsert_jobs(conn: &mut Connection, records: &[CleanRecord]) -> Result<UpsertCounts> {
    let tx = conn.transaction()?;
    let mut counts = UpsertCounts::default();
    {
        let mut stmt_job = tx.prepare(
            r#"
            INSERT INTO jobs (
                source, title, company, location, date_posted, job_url, description,
                city, state, job_type, seniority, salary_min, salary_max, currency
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(job_url) DO UPDATE SET
                source = excluded.source,
                title = excluded.title,
                company = excluded.company,
                location = excluded.location,
                date_posted = excluded.date_posted,
                description = excluded.description,
                city = excluded.city,
                state = excluded.state,
                job_type = excluded.job_type,
                seniority = excluded.seniority,
                salary_min = excluded.salary_min,
                salary_max = excluded.salary_max,
                currency = excluded.currency,
                updated_at = datetime('now')
            "#,
        )?;
        let mut stmt_id = tx.prepare("SELECT id FROM jobs WHERE job_url = ?1")?;
        let mut stmt_clear = tx.prepare("DELETE FROM job_skills WHERE job_id = ?1")?;
        let mut stmt_skill =
            tx.prepare("INSERT OR IGNORE INTO job_skills (job_id, skill) VALUES (?1, ?2)")?;

        for rec in records {
            if rec.job_url.is_empty() {
                counts.skipped_no_url += 1;
                continue;
            }
            stmt_job.execute(params![
                rec.source,
                rec.title,
                rec.company,
                rec.location,
                rec.date_posted,
                rec.job_url,
                rec.description,
                rec.city,
                rec.state,
                rec.job_type,
                rec.seniority,
                rec.salary_min,
                rec.salary_max,
                rec.currency,
            ])?;
            counts.written += 1;

            // The incoming skill list replaces whatever the previous version had.
            let job_id: i64 = stmt_id.query_row([&rec.job_url], |r| r.get(0))?;
            stmt_clear.execute([job_id])?;
            for skill in &rec.skills {
                counts.skills += stmt_skill.execute(params![job_id, skill])?;
            }
        }
    }
    tx.commit()?;

    if counts.skipped_no_url > 0 {
        warn!(skipped = counts.skipped_no_url, "rows without job_url were not persisted");
    }
    debug!(?counts, "upsert complete");
    Ok(counts)
}

/// All persisted jobs with their skills, ordered by insertion.
pub fn fetch_jobs(conn: &Connection) -> Result<Vec<CleanRecord>> {
    let mut stmt = conn.prepare(
        "SELECT j.source, j.title, j.company, j.location, j.date_posted, j.job_url,
                j.description, j.city, j.state, j.job_type, j.seniority,
                j.salary_min, j.salary_max, j.currency, j.id
         FROM jobs j
         ORDER BY j.id",
    )?;
    let mut stmt_skills =
        conn.prepare("SELECT skill FROM job_skills WHERE job_id = ?1 ORDER BY rowid")?;

    let rows = stmt
        .query_map([], |row| {
            let job_url: String = row.get::<_, Option<String>>(5)?.unwrap_or_default();
            let job_id: i64 = row.get(14)?;
            let skills = stmt_skills
                .query_map([job_id], |r| r.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(CleanRecord {
                source: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                company: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                location: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                date_posted: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                description: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                city: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                state: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
                job_type: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                seniority: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                salary_min: row.get(11)?,
                salary_max: row.get(12)?,
                currency: row.get(13)?,
                skills,
                url: job_url.clone(),
                job_url,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn count_jobs(conn: &Connection) -> Result<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))?;
    Ok(n as usize)
}

/// Store parsed report text keyed by `report_name`. Re-running with the same
/// report replaces its text. Rows without a name are skipped.
pub fn upsert_reports(conn: &mut Connection, reports: &[ReportRow]) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO reports (report_name, text) VALUES (?1, ?2)
             ON CONFLICT(report_name) DO UPDATE SET text = excluded.text",
        )?;
        for report in reports.iter().filter(|r| !r.report_name.is_empty()) {
            written += stmt.execute(params![report.report_name, report.text])?;
        }
    }
    tx.commit()?;
    debug!(written, "reports stored");
    Ok(written)
}

pub fn count_reports(conn: &Connection) -> Result<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM reports", [], |r| r.get(0))?;
    Ok(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn rec(url: &str, title: &str, skills: &[&str]) -> CleanRecord {
        CleanRecord {
            title: title.into(),
            company: "Heritage Research Inc".into(),
            job_url: url.into(),
            url: url.into(),
            state: "AZ".into(),
            salary_min: Some(65000.0),
            currency: Some("USD".into()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn upsert_is_idempotent_by_url() {
        let mut conn = mem();
        let batch = vec![
            rec("https://x/1", "Field Technician", &["ArcGIS", "NEPA"]),
            rec("https://x/2", "Lab Analyst", &[]),
        ];
        upsert_jobs(&mut conn, &batch).unwrap();
        let counts = upsert_jobs(&mut conn, &batch).unwrap();
        assert_eq!(counts.written, 2);
        assert_eq!(counts.skills, 2);
        assert_eq!(count_jobs(&conn).unwrap(), 2);
        assert_eq!(fetch_jobs(&conn).unwrap()[0].skills, vec!["ArcGIS", "NEPA"]);
    }

    #[test]
    fn new_skill_list_replaces_old_one() {
        let mut conn = mem();
        upsert_jobs(&mut conn, &[rec("https://x/1", "Field Tech", &["NEPA"])]).unwrap();
        upsert_jobs(&mut conn, &[rec("https://x/1", "Field Tech", &["GIS"])]).unwrap();
        assert_eq!(fetch_jobs(&conn).unwrap()[0].skills, vec!["GIS"]);

        upsert_jobs(&mut conn, &[rec("https://x/1", "Field Tech", &[])]).unwrap();
        assert!(fetch_jobs(&conn).unwrap()[0].skills.is_empty());
    }

    #[test]
    fn skills_read_back_in_insertion_order() {
        let mut conn = mem();
        let skills = ["Section 106", "ArcGIS", "NEPA", "LiDAR"];
        upsert_jobs(&mut conn, &[rec("https://x/1", "Field Tech", &skills)]).unwrap();
        assert_eq!(fetch_jobs(&conn).unwrap()[0].skills, skills);
    }

    #[test]
    fn reports_are_keyed_by_name() {
        let mut conn = mem();
        let report = |name: &str, text: &str| ReportRow {
            report_name: name.into(),
            text: text.into(),
            skills: Vec::new(),
        };
        let n = upsert_reports(
            &mut conn,
            &[report("survey_2024.pdf", "draft"), report("", "orphan")],
        )
        .unwrap();
        assert_eq!(n, 1);
        upsert_reports(&mut conn, &[report("survey_2024.pdf", "final")]).unwrap();
        assert_eq!(count_reports(&conn).unwrap(), 1);
        let text: String = conn
            .query_row(
                "SELECT text FROM reports WHERE report_name = 'survey_2024.pdf'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(text, "final");
    }

    #[test]
    fn changed_record_replaces_old_one() {
        let mut conn = mem();
        upsert_jobs(&mut conn, &[rec("https://x/1", "Field Tech", &[])]).unwrap();
        upsert_jobs(&mut conn, &[rec("https://x/1", "Senior Field Tech", &["GIS"])]).unwrap();

        let rows = fetch_jobs(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Senior Field Tech");
        assert_eq!(rows[0].skills, vec!["GIS"]);
        assert_eq!(rows[0].salary_min, Some(65000.0));
        assert_eq!(rows[0].currency.as_deref(), Some("USD"));
        assert_eq!(rows[0].url, "https://x/1");
    }

    #[test]
    fn rows_without_url_are_skipped() {
        let mut conn = mem();
        let counts = upsert_jobs(&mut conn, &[rec("", "Orphan", &["GIS"])]).unwrap();
        assert_eq!(counts.skipped_no_url, 1);
        assert_eq!(counts.written, 0);
        assert_eq!(count_jobs(&conn).unwrap(), 0);
    }
}
