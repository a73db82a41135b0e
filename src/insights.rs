use crate::analyze::MarketAnalysis;
use crate::utils::percent;

const SKILL_LINES: usize = 20;
const RECOMMENDED_SKILLS: usize = 12;
const DEFAULT_PROGRAMS: &[&str] = &["workshop", "certificate"];

fn programs_for(skill: &str) -> &'static [&'static str] {
    match skill {
        "ArcGIS" | "QGIS" => &["certificate", "microlearning", "undergrad"],
        "NAGPRA" => &["workshop", "post-bacc", "grad"],
        "LiDAR" => &["certificate", "undergrad"],
        "Photogrammetry (3D)" => &["certificate", "workshop", "undergrad"],
        "Project Management" | "Collections Management" => {
            &["certificate", "post-bacc", "workshop"]
        }
        "OSHA 10" => &["microlearning", "workshop", "certificate"],
        _ => DEFAULT_PROGRAMS,
    }
}

/// Rules-based markdown brief for program planning.
pub fn render_insights(analysis: &MarketAnalysis) -> String {
    let mut out = String::new();
    out.push_str("# CHARM Market Insights\n\n");
    out.push_str(&format!(
        "- Total job postings: **{}**\n- Unique employers: **{}**\n",
        analysis.num_jobs, analysis.unique_employers
    ));

    out.push_str("\n## In-demand Skills\n");
    if analysis.top_skills.is_empty() {
        out.push_str("- (no skill signals found)\n");
    }
    for (skill, count) in analysis.top_skills.iter().take(SKILL_LINES) {
        out.push_str(&format!("- {}: {}\n", skill, count));
    }

    if !analysis.report_skills.is_empty() {
        out.push_str("\n## Skills in Reports\n");
        for (skill, count) in analysis.report_skills.iter().take(SKILL_LINES) {
            out.push_str(&format!("- {}: {}\n", skill, count));
        }
    }

    out.push_str("\n## Program Recommendations\n");
    for (skill, count) in analysis.top_skills.iter().take(RECOMMENDED_SKILLS) {
        out.push_str(&format!(
            "- **{}** (demand signal: {}) -> {}\n",
            skill,
            count,
            programs_for(skill).join(", ")
        ));
    }
    out
}

/// Breakdown tables printed by `charm stats`.
pub fn render_stats(
    total: usize,
    by_job_type: &[(String, usize)],
    by_seniority: &[(String, usize)],
    by_state: &[(String, usize)],
    by_month: &[(String, usize)],
) -> String {
    let mut out = String::new();
    out.push_str("## Job Stats\n");
    out.push_str(&format!("- Total jobs: {}\n", total));

    for (heading, rows) in [
        ("Job type", by_job_type),
        ("Seniority", by_seniority),
        ("State", by_state),
    ] {
        out.push_str(&format!("\n### {}\n", heading));
        for (label, count) in rows {
            out.push_str(&format!(
                "- {}: {} ({:.1}%)\n",
                label,
                count,
                percent(*count, total)
            ));
        }
    }

    out.push_str("\n### Postings by month\n");
    for (month, count) in by_month {
        out.push_str(&format!("- {}: {}\n", month, count));
    }
    out
}
