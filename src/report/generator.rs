//! Report generation.
//!
//! This module assembles the analytics report of an institution and
//! renders it, or an institution listing, as Markdown or JSON.

use crate::analysis::adapter::granular_records;
use crate::analysis::{completion_rate, kind_breakdown, main_metrics, merge_by_subject};
use crate::models::{
    AnalyticsReport, AssessmentKind, Category, CompletionRates, FilterState, Institution,
    KindBreakdown, LabelStyle, Metric, MonthlyCount, PaginationMeta, ReportMetadata, StatsData,
    SubjectComparison, Window,
};
use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::path::Path;

/// Inputs that shape an analytics report besides the stats themselves.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub filter: FilterState,
    pub window: Window,
    pub labels: LabelStyle,
    pub api_base_url: String,
}

/// Build the analytics report of one institution.
pub fn build_analytics_report(
    institution_id: &str,
    stats: &StatsData,
    options: &ReportOptions,
) -> AnalyticsReport {
    let assigned = match options.window {
        Window::AllTime => &stats.assigned,
        Window::Today => stats.assigned_today.as_ref().unwrap_or(&Value::Null),
    };

    let breakdowns = AssessmentKind::ALL
        .iter()
        .map(|kind| kind_breakdown(assigned, *kind, &options.filter, options.labels))
        .collect();

    let exams = granular_records(assigned, AssessmentKind::Exams);
    let quizzes = granular_records(assigned, AssessmentKind::Quizzes);
    let subjects = merge_by_subject(&exams.by_school, &quizzes.by_school);

    let totals = &stats.totals;
    let completion = CompletionRates {
        exams: completion_rate(totals.completed_exams, totals.exams),
        quizzes: completion_rate(totals.quiz_submissions, totals.quizzes),
        projects: completion_rate(totals.completed_projects, totals.projects),
    };

    AnalyticsReport {
        metadata: ReportMetadata {
            institution_id: institution_id.to_string(),
            generated_at: Utc::now(),
            scope: options.filter.describe(),
            window: options.window,
            api_base_url: options.api_base_url.clone(),
        },
        metrics: main_metrics(totals),
        completion,
        breakdowns,
        subjects,
        growth: stats.growth.students_by_month.clone(),
    }
}

/// Generate a complete Markdown analytics report.
pub fn generate_markdown_report(report: &AnalyticsReport) -> String {
    let mut output = String::new();

    output.push_str("# Institution Analytics Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_metrics_section(&report.metrics));
    output.push_str(&generate_completion_section(&report.completion));
    output.push_str(&generate_breakdown_section(&report.breakdowns));
    output.push_str(&generate_subjects_section(&report.subjects));
    output.push_str(&generate_growth_section(&report.growth));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Institution:** `{}`\n", metadata.institution_id));
    section.push_str(&format!("- **Scope:** {}\n", metadata.scope));
    section.push_str(&format!("- **Window:** {}\n", metadata.window));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **API:** {}\n", metadata.api_base_url));
    section.push('\n');

    section
}

fn generate_metrics_section(metrics: &[Metric]) -> String {
    let mut section = String::new();

    section.push_str("## Headline Metrics\n\n");
    section.push_str("| Metric | Value | Change | |\n");
    section.push_str("|:---|:---:|:---:|:---|\n");
    for metric in metrics {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            metric.name, metric.value, metric.change.change, metric.description
        ));
    }
    section.push('\n');

    section
}

fn generate_completion_section(completion: &CompletionRates) -> String {
    let mut section = String::new();

    section.push_str("## Completion Rates\n\n");
    section.push_str("| Exams | Quizzes | Projects |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {}% | {}% | {}% |\n\n",
        completion.exams, completion.quizzes, completion.projects
    ));

    section
}

fn generate_breakdown_section(breakdowns: &[KindBreakdown]) -> String {
    let mut section = String::new();

    section.push_str("## Category Breakdown\n\n");

    for breakdown in breakdowns {
        section.push_str(&format!("### {}\n\n", breakdown.kind));
        section.push_str("| Category | Count |\n");
        section.push_str("|:---|:---:|\n");
        for datum in &breakdown.chart {
            section.push_str(&format!("| {} | {} |\n", datum.label, datum.value));
        }

        if breakdown.totals.sum() == 0 {
            section.push_str(&format!(
                "\n*No {} recorded for this scope.*\n",
                breakdown.kind.to_string().to_lowercase()
            ));
        }

        let uncategorized = breakdown.totals.get(Category::Other);
        if uncategorized != 0 {
            section.push_str(&format!(
                "\n*{} item(s) did not match any category.*\n",
                uncategorized
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_subjects_section(subjects: &[SubjectComparison]) -> String {
    if subjects.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Exams vs Quizzes by Subject\n\n");
    section.push_str("| Subject | Exams | Quizzes |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for subject in subjects {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            subject.subject, subject.exams, subject.quizzes
        ));
    }
    section.push('\n');

    section
}

fn generate_growth_section(growth: &[MonthlyCount]) -> String {
    if growth.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Student Growth\n\n");
    section.push_str("| Month | New Students |\n");
    section.push_str("|:---|:---:|\n");
    for month in growth {
        section.push_str(&format!("| {} | {} |\n", month.month, month.count));
    }
    section.push('\n');

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by institution-insights v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON analytics report.
pub fn generate_json_report(report: &AnalyticsReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render a page of institutions as a Markdown table.
pub fn generate_institutions_markdown(
    institutions: &[&Institution],
    pagination: &PaginationMeta,
) -> String {
    let mut output = String::new();

    output.push_str("# Institutions\n\n");

    if institutions.is_empty() {
        output.push_str("No institutions found.\n\n");
    } else {
        output.push_str("| ID | Name | Type | Board | Students | Status |\n");
        output.push_str("|:---|:---|:---|:---|:---:|:---|\n");
        for institution in institutions {
            output.push_str(&format!(
                "| `{}` | {} | {} | {} | {} | {} |\n",
                institution.id,
                institution.name,
                institution.kind,
                institution.affiliated_board,
                institution.total_student_strength,
                institution.approval_status
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "*Page {} of {} ({} total, {} per page)*\n",
        pagination.page,
        pagination.total_pages.max(1),
        pagination.total,
        pagination.limit
    ));

    output
}

/// Render a page of institutions as JSON.
pub fn generate_institutions_json(
    institutions: &[&Institution],
    pagination: &PaginationMeta,
) -> Result<String> {
    let value = serde_json::json!({
        "data": institutions,
        "meta": pagination,
    });
    serde_json::to_string_pretty(&value).map_err(Into::into)
}

/// Write rendered output to a file.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
