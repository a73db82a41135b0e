//! Lint a job-pattern config without running the pipeline.
//!
//! Usage: `validate_patterns [PATH]`. Exits non-zero if any entry is missing
//! its pattern or fails to compile.

use std::path::PathBuf;
use std::process::ExitCode;

use charm_jobs::classify::PatternConfig;
use charm_jobs::settings::Settings;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => match Settings::load() {
            Ok(s) => s.patterns_path,
            Err(e) => {
                eprintln!("{:#}", e);
                return ExitCode::from(2);
            }
        },
    };

    let config = match PatternConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.validate() {
        Ok(()) => {
            println!(
                "OK: {} patterns compiled successfully ({} patterns).",
                path.display(),
                config.pattern_count()
            );
            ExitCode::SUCCESS
        }
        Err(problems) => {
            eprintln!("{}", problems);
            eprintln!("{} problem(s) in {}", problems.len(), path.display());
            ExitCode::FAILURE
        }
    }
}
