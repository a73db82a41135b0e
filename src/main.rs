use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use charm_jobs::analyze::{self, MarketAnalysis, ReportRow};
use charm_jobs::classify::{Classifier, PatternConfig, JOB_TYPE, SENIORITY};
use charm_jobs::db;
use charm_jobs::export;
use charm_jobs::insights;
use charm_jobs::pipeline::clean_and_dedupe_with_report;
use charm_jobs::record::CleanRecord;
use charm_jobs::settings::Settings;
use charm_jobs::sync::SeenSet;

const DB_CHUNK: usize = 500;

#[derive(Parser)]
#[command(name = "charm", about = "Heritage job-market pipeline: clean, dedupe, store, analyze")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean and dedupe a scraped batch, store it, and write analytics
    Run {
        /// Scraper output (.csv or .json)
        #[arg(short, long)]
        input: PathBuf,
        /// Pattern config (default: settings.patterns_path)
        #[arg(short, long)]
        patterns: Option<PathBuf>,
        /// Output directory (default: settings.processed_dir)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Parsed-report CSV (report_name, text, skills) to store and analyze
        #[arg(short, long)]
        reports: Option<PathBuf>,
        /// Skip the SQLite upsert
        #[arg(long)]
        no_sqlite: bool,
    },
    /// Recompute analytics from processed jobs
    Analyze {
        /// Processed jobs CSV (default: <processed_dir>/jobs.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Parsed-report skills CSV
        #[arg(short, long)]
        reports: Option<PathBuf>,
    },
    /// Per-bucket, per-state and per-month tables from the database
    Stats,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(?settings, "settings loaded");

    let result = match cli.command {
        Commands::Run {
            input,
            patterns,
            out,
            reports,
            no_sqlite,
        } => {
            let patterns = patterns.unwrap_or_else(|| settings.patterns_path.clone());
            let out = out.unwrap_or_else(|| settings.processed_dir.clone());
            run(&settings, &input, &patterns, &out, reports.as_deref(), no_sqlite)
        }
        Commands::Analyze { input, reports } => {
            let input = input.unwrap_or_else(|| settings.processed_dir.join("jobs.csv"));
            let jobs = export::read_clean_csv(&input)?;
            println!("Loaded {} processed jobs from {:?}", jobs.len(), input);
            let report_rows = reports.as_deref().map(export::read_reports_csv).transpose()?;
            write_analysis(&settings, &settings.processed_dir, &jobs, report_rows.as_deref())
        }
        Commands::Stats => stats(&settings),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }
    result
}

fn load_classifier(path: &Path) -> Result<Classifier> {
    let config = PatternConfig::load(path)?;
    config
        .validate()
        .with_context(|| format!("Refusing to run with invalid patterns in {:?}", path))?;
    info!(patterns = config.pattern_count(), path = ?path, "pattern config validated");
    Ok(Classifier::new(&config)?)
}

fn run(
    settings: &Settings,
    input: &Path,
    patterns: &Path,
    out: &Path,
    reports: Option<&Path>,
    no_sqlite: bool,
) -> Result<()> {
    let classifier = load_classifier(patterns)?;

    let raw = export::read_raw(input)?;
    println!("Read {} raw postings from {:?}", raw.len(), input);
    let report_rows = reports.map(export::read_reports_csv).transpose()?;

    let t_clean = Instant::now();
    let (jobs, report) = clean_and_dedupe_with_report(&raw, &classifier);
    println!(
        "Cleaned {} -> {} ({} repeated URLs, {} repeated content) in {:.1}s",
        report.input,
        report.output,
        report.url_duplicates,
        report.content_duplicates,
        t_clean.elapsed().as_secs_f64()
    );

    let jobs_csv = out.join("jobs.csv");
    export::write_clean_csv(&jobs_csv, &jobs)?;
    println!("Wrote {:?}", jobs_csv);
    if let Some(rows) = &report_rows {
        let reports_csv = out.join("reports.csv");
        export::write_reports_csv(&reports_csv, rows)?;
        println!("Wrote {} reports to {:?}", rows.len(), reports_csv);
    }

    if settings.use_sqlite && !no_sqlite {
        store(&settings.db_path, &jobs, report_rows.as_deref())?;
    }

    let mut seen = SeenSet::load(&settings.seen_cache_path)?;
    let fresh: Vec<CleanRecord> = seen.select_unseen(&jobs).into_iter().cloned().collect();
    let new_csv = out.join("new_jobs.csv");
    export::write_clean_csv(&new_csv, &fresh)?;
    seen.save(&settings.seen_cache_path)?;
    println!("{} new postings for the sheet ({} seen overall) -> {:?}", fresh.len(), seen.len(), new_csv);

    write_analysis(settings, out, &jobs, report_rows.as_deref())
}

fn store(db_path: &Path, jobs: &[CleanRecord], reports: Option<&[ReportRow]>) -> Result<()> {
    let mut conn = db::connect(db_path)?;
    db::init_schema(&conn)?;

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut written = 0;
    let mut skipped = 0;
    for chunk in jobs.chunks(DB_CHUNK) {
        let counts = db::upsert_jobs(&mut conn, chunk)?;
        written += counts.written;
        skipped += counts.skipped_no_url;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    println!(
        "Upserted {} jobs into {:?} ({} without job_url skipped, {} total stored)",
        written,
        db_path,
        skipped,
        db::count_jobs(&conn)?
    );

    if let Some(reports) = reports {
        let n = db::upsert_reports(&mut conn, reports)?;
        println!("Upserted {} reports ({} total stored)", n, db::count_reports(&conn)?);
    }
    Ok(())
}

fn write_analysis(
    settings: &Settings,
    out: &Path,
    jobs: &[CleanRecord],
    reports: Option<&[ReportRow]>,
) -> Result<()> {
    let analysis: MarketAnalysis = analyze::analyze_market(jobs, reports, settings.top_n_skills);

    let analysis_json = out.join("analysis.json");
    export::write_json(&analysis_json, &analysis)?;
    let insights_md = out.join("insights.md");
    export::write_text(&insights_md, &insights::render_insights(&analysis))?;

    println!(
        "Analysis: {} jobs, {} employers, {} skills ranked -> {:?}, {:?}",
        analysis.num_jobs,
        analysis.unique_employers,
        analysis.top_skills.len(),
        analysis_json,
        insights_md
    );
    Ok(())
}

fn stats(settings: &Settings) -> Result<()> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    let jobs = db::fetch_jobs(&conn)?;
    if jobs.is_empty() {
        println!("No jobs stored. Run 'run' first.");
        return Ok(());
    }

    let markdown = insights::render_stats(
        jobs.len(),
        &analyze::counts_by_bucket(&jobs, JOB_TYPE),
        &analyze::counts_by_bucket(&jobs, SENIORITY),
        &analyze::jobs_by_state(&jobs),
        &analyze::monthly_postings(&jobs),
    );
    println!("{markdown}");

    let by_skill = analyze::salary_by_skill(&jobs, 3);
    if !by_skill.is_empty() {
        println!("### Advertised salary by skill (n >= 3)");
        println!("{:<28} | {:>4} | {:>10} | {:>10}", "Skill", "n", "avg low", "avg high");
        println!("{}", "-".repeat(60));
        for s in &by_skill {
            println!(
                "{:<28} | {:>4} | {:>10} | {:>10}",
                s.skill,
                s.n,
                fmt_amount(s.avg_low),
                fmt_amount(s.avg_high)
            );
        }
    }
    Ok(())
}

fn fmt_amount(v: Option<f64>) -> String {
    v.map(|x| format!("{:.0}", x)).unwrap_or_else(|| "-".into())
}
