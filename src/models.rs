//! Data models for institution analytics.
//!
//! This module contains the core data structures used throughout the
//! application: subject count records, categories, chart data, and the
//! institution/stats payloads exchanged with the dashboard backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Subject category used to bucket free-text subject names for charting.
///
/// Variant order is the display order of every chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Mathematics and its sub-topics.
    Math,
    /// Physics, chemistry, biology and general science.
    Science,
    /// History, geography and civics.
    #[serde(rename = "Social studies")]
    SocialStudies,
    /// Language and literature.
    English,
    /// Undergraduate programmes.
    #[serde(rename = "UG")]
    Ug,
    /// Postgraduate programmes.
    #[serde(rename = "PG")]
    Pg,
    /// Catch-all bucket, never charted.
    Other,
}

impl Category {
    /// Categories that appear in chart output, in display order.
    pub const CHARTED: [Category; 6] = [
        Category::Math,
        Category::Science,
        Category::SocialStudies,
        Category::English,
        Category::Ug,
        Category::Pg,
    ];

    /// Every category, including the catch-all.
    pub const ALL: [Category; 7] = [
        Category::Math,
        Category::Science,
        Category::SocialStudies,
        Category::English,
        Category::Ug,
        Category::Pg,
        Category::Other,
    ];

    /// Full display label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Math => "Math",
            Category::Science => "Science",
            Category::SocialStudies => "Social studies",
            Category::English => "English",
            Category::Ug => "UG",
            Category::Pg => "PG",
            Category::Other => "Other",
        }
    }

    /// Compact label for bar charts where horizontal space is tight.
    pub fn short_label(&self) -> &'static str {
        match self {
            Category::SocialStudies => "SST",
            other => other.label(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One observation of how many assessment items exist for a subject.
///
/// School-wide records carry no scoping keys; class records carry the
/// standard keys; section records carry the section keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCountRecord {
    /// Free-text subject or topic name.
    #[serde(default)]
    pub subject: String,
    /// Tally of items for this subject.
    #[serde(default)]
    pub count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
}

#[cfg(test)]
impl SubjectCountRecord {
    /// Creates a school-wide record.
    pub fn school(subject: impl Into<String>, count: i64) -> Self {
        Self {
            subject: subject.into(),
            count,
            ..Self::default()
        }
    }

    /// Creates a class-scoped record.
    pub fn class(
        subject: impl Into<String>,
        count: i64,
        standard_id: impl Into<String>,
        standard_name: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            count,
            standard_id: Some(standard_id.into()),
            standard_name: Some(standard_name.into()),
            ..Self::default()
        }
    }

    /// Creates a section-scoped record.
    pub fn section(
        subject: impl Into<String>,
        count: i64,
        section_id: impl Into<String>,
        section_name: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            count,
            section_id: Some(section_id.into()),
            section_name: Some(section_name.into()),
            ..Self::default()
        }
    }
}

/// Per-category sums. Always holds every category, zero when untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals(BTreeMap<Category, i64>);

impl Default for CategoryTotals {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryTotals {
    /// Creates totals with every category at zero.
    pub fn new() -> Self {
        Self(Category::ALL.iter().map(|c| (*c, 0)).collect())
    }

    /// Adds `count` to the given category.
    ///
    /// Saturates at the `i64` bounds instead of overflowing.
    pub fn add(&mut self, category: Category, count: i64) {
        let total = self.0.entry(category).or_insert(0);
        *total = total.saturating_add(count);
    }

    /// Returns the accumulated value for a category.
    pub fn get(&self, category: Category) -> i64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    /// Sum over all buckets, `Other` included.
    pub fn sum(&self) -> i64 {
        self.0.values().fold(0i64, |acc, v| acc.saturating_add(*v))
    }

    /// Iterates buckets in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, i64)> + '_ {
        self.0.iter().map(|(c, v)| (*c, *v))
    }
}

/// A single chart point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDatum {
    pub label: String,
    pub value: i64,
}

impl ChartDatum {
    pub fn new(label: impl Into<String>, value: i64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Label style used when converting totals to chart data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    #[default]
    Full,
    /// Renames "Social studies" to "SST".
    Short,
}

/// The three assessment kinds tracked by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Exams,
    Quizzes,
    Projects,
}

impl AssessmentKind {
    pub const ALL: [AssessmentKind; 3] = [
        AssessmentKind::Exams,
        AssessmentKind::Quizzes,
        AssessmentKind::Projects,
    ];

    /// Key of this kind inside the `assigned` payload.
    pub fn payload_key(&self) -> &'static str {
        match self {
            AssessmentKind::Exams => "exams",
            AssessmentKind::Quizzes => "quizzes",
            AssessmentKind::Projects => "projects",
        }
    }
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssessmentKind::Exams => write!(f, "Exams"),
            AssessmentKind::Quizzes => write!(f, "Quizzes"),
            AssessmentKind::Projects => write!(f, "Projects"),
        }
    }
}

/// Time window of the assigned counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    #[default]
    AllTime,
    Today,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::AllTime => write!(f, "All time"),
            Window::Today => write!(f, "Today"),
        }
    }
}

/// Records of one assessment kind at every granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GranularRecords {
    pub by_school: Vec<SubjectCountRecord>,
    pub by_class: Vec<SubjectCountRecord>,
    pub by_section: Vec<SubjectCountRecord>,
}

/// A selected section together with the name of the grade that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFilter {
    pub section_id: String,
    pub grade_name: Option<String>,
}

/// Hierarchical UI filter: section beats grade beats school-wide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub grade_id: Option<String>,
    pub section: Option<SectionFilter>,
}

#[cfg(test)]
impl FilterState {
    /// School-wide filter.
    pub fn school() -> Self {
        Self::default()
    }

    /// Filter on a single grade.
    pub fn grade(grade_id: impl Into<String>) -> Self {
        Self {
            grade_id: Some(grade_id.into()),
            section: None,
        }
    }
}

impl FilterState {
    /// Builds a filter from raw ids, resolving the section's owning grade
    /// name through the stats breakdown.
    pub fn resolve(
        breakdown: &Breakdown,
        grade_id: Option<&str>,
        section_id: Option<&str>,
    ) -> Self {
        let section = section_id.map(|id| {
            let grade_name = breakdown
                .sections_with_strength
                .iter()
                .find(|s| s.section_id == id)
                .and_then(|s| {
                    breakdown
                        .grades_with_strength
                        .iter()
                        .find(|g| g.standard_id == s.standard_id)
                })
                .map(|g| g.grade.clone());
            SectionFilter {
                section_id: id.to_string(),
                grade_name,
            }
        });

        Self {
            grade_id: grade_id.map(String::from),
            section,
        }
    }

    /// Short description for report headers.
    pub fn describe(&self) -> String {
        match (&self.section, &self.grade_id) {
            (Some(section), _) => format!("section {}", section.section_id),
            (None, Some(grade)) => format!("grade {}", grade),
            (None, None) => "school-wide".to_string(),
        }
    }
}

/// Standard envelope wrapping every backend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

/// Administrator account returned by login and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload of login and registration responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub admin: Admin,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl RegisterRequest {
    /// Role every dashboard registration is created with.
    pub const ROLE: &'static str = "SUPER_INSTITUTION_ADMIN";

    pub fn new(first_name: String, last_name: String, email: String, password: String) -> Self {
        Self {
            first_name,
            last_name,
            email,
            password,
            role: Self::ROLE.to_string(),
        }
    }
}

/// Profile fields decoded from the session token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// An institution managed by the current administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub affiliated_board: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub year_of_establishment: String,
    #[serde(default)]
    pub total_student_strength: u64,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub approval_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Pagination metadata of a listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PaginationMeta {
    /// Metadata for a page with no results.
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            total: 0,
            total_pages: 0,
        }
    }
}

/// One page of institutions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionPage {
    pub data: Vec<Institution>,
    pub meta: PaginationMeta,
}

/// Headline counters of an institution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Totals {
    pub students: u64,
    pub quizzes: u64,
    pub quiz_submissions: u64,
    pub exams: u64,
    pub completed_exams: u64,
    pub projects: u64,
    pub completed_projects: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeStrength {
    pub standard_id: String,
    pub grade: String,
    #[serde(default)]
    pub strength: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStrength {
    pub section_id: String,
    pub section: String,
    pub standard_id: String,
    #[serde(default)]
    pub strength: u64,
}

/// Enrollment breakdown used to resolve section ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Breakdown {
    pub grades_with_strength: Vec<GradeStrength>,
    pub sections_with_strength: Vec<SectionStrength>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Growth {
    pub students_by_month: Vec<MonthlyCount>,
}

/// Analytics payload of one institution.
///
/// The `assigned` sections are kept as raw JSON: their shape drifts between
/// backend versions and is normalized by [`crate::analysis::adapter`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    #[serde(default)]
    pub totals: Totals,
    #[serde(default)]
    pub breakdown: Breakdown,
    #[serde(default)]
    pub assigned: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_today: Option<serde_json::Value>,
    #[serde(default)]
    pub growth: Growth,
}

/// Direction of a headline metric change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Increase,
    Decrease,
}

/// Formatted change of a metric against a previous period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// Signed percentage, e.g. `+12.5%`.
    pub change: String,
    pub kind: ChangeKind,
}

/// A headline metric card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: u64,
    pub change: Change,
    pub description: String,
}

/// Exam and quiz counts for one subject label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectComparison {
    pub subject: String,
    pub exams: i64,
    pub quizzes: i64,
}

/// Chart data of one assessment kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindBreakdown {
    pub kind: AssessmentKind,
    pub totals: CategoryTotals,
    pub chart: Vec<ChartDatum>,
}

/// Completion percentages, formatted to one decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRates {
    pub exams: String,
    pub quizzes: String,
    pub projects: String,
}

/// Metadata about an analytics report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub institution_id: String,
    pub generated_at: DateTime<Utc>,
    pub scope: String,
    pub window: Window,
    pub api_base_url: String,
}

/// The complete analytics report of one institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub metadata: ReportMetadata,
    pub metrics: Vec<Metric>,
    pub completion: CompletionRates,
    pub breakdowns: Vec<KindBreakdown>,
    pub subjects: Vec<SubjectComparison>,
    pub growth: Vec<MonthlyCount>,
}
