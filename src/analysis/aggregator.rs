//! Category aggregation and dashboard statistics.
//!
//! This module folds subject count records into per-category totals, picks
//! the record set matching the active filter, and derives the headline
//! numbers shown next to the charts.

use crate::analysis::adapter::granular_records;
use crate::analysis::classifier::{classify, grade_category};
use crate::models::{
    AssessmentKind, Category, CategoryTotals, Change, ChangeKind, ChartDatum, FilterState,
    GranularRecords, KindBreakdown, LabelStyle, Metric, SubjectComparison, SubjectCountRecord,
    Totals,
};
use serde_json::Value;
use std::collections::HashMap;

/// Sum record counts per category.
///
/// A record whose `standard_name` is literally "UG" or "PG" is counted
/// twice: once under its subject's category and once under the grade's.
pub fn aggregate(records: &[SubjectCountRecord]) -> CategoryTotals {
    let mut totals = CategoryTotals::new();

    for record in records {
        totals.add(classify(&record.subject), record.count);

        if let Some(grade) = record.standard_name.as_deref() {
            if let Some(category) = grade_category(grade) {
                totals.add(category, record.count);
            }
        }
    }

    totals
}

/// Pick the records matching the filter: section, else grade, else school.
///
/// Section records carry no grade name of their own, so the owning grade's
/// name is stamped onto them. That keeps the UG/PG contribution of the
/// parent grade in [`aggregate`].
pub fn select_granularity(
    records: &GranularRecords,
    filter: &FilterState,
) -> Vec<SubjectCountRecord> {
    if let Some(section) = &filter.section {
        let owning_grade = section
            .grade_name
            .as_deref()
            .filter(|name| grade_category(name).is_some());

        return records
            .by_section
            .iter()
            .filter(|r| r.section_id.as_deref() == Some(section.section_id.as_str()))
            .map(|r| {
                let mut record = r.clone();
                if record.standard_name.is_none() {
                    record.standard_name = owning_grade.map(String::from);
                }
                record
            })
            .collect();
    }

    if let Some(grade_id) = filter.grade_id.as_deref() {
        return records
            .by_class
            .iter()
            .filter(|r| r.standard_id.as_deref() == Some(grade_id))
            .cloned()
            .collect();
    }

    records.by_school.clone()
}

/// Convert totals to chart points in display order, dropping `Other`.
pub fn to_chart_data(totals: &CategoryTotals) -> Vec<ChartDatum> {
    to_chart_data_with(totals, LabelStyle::Full)
}

/// Like [`to_chart_data`], with a choice of label style.
pub fn to_chart_data_with(totals: &CategoryTotals, style: LabelStyle) -> Vec<ChartDatum> {
    Category::CHARTED
        .iter()
        .map(|category| {
            let label = match style {
                LabelStyle::Full => category.label(),
                LabelStyle::Short => category.short_label(),
            };
            ChartDatum::new(label, totals.get(*category))
        })
        .collect()
}

/// Aggregate one assessment kind of an `assigned` payload under a filter.
pub fn kind_breakdown(
    assigned: &Value,
    kind: AssessmentKind,
    filter: &FilterState,
    style: LabelStyle,
) -> KindBreakdown {
    let records = granular_records(assigned, kind);
    let selected = select_granularity(&records, filter);
    let totals = aggregate(&selected);
    let chart = match style {
        LabelStyle::Full => to_chart_data(&totals),
        LabelStyle::Short => to_chart_data_with(&totals, style),
    };

    KindBreakdown {
        kind,
        totals,
        chart,
    }
}

/// Percentage of `done` over `total` to one decimal, `"0"` when empty.
pub fn completion_rate(done: u64, total: u64) -> String {
    if total == 0 {
        return "0".to_string();
    }
    format!("{:.1}", done as f64 / total as f64 * 100.0)
}

/// Signed percentage change from `previous` to `current`.
pub fn calculate_change(current: u64, previous: u64) -> Change {
    if previous == 0 {
        return Change {
            change: "+0%".to_string(),
            kind: ChangeKind::Increase,
        };
    }

    let percent = (current as f64 - previous as f64) / previous as f64 * 100.0;
    let sign = if percent >= 0.0 { "+" } else { "" };

    Change {
        change: format!("{}{:.1}%", sign, percent),
        kind: if percent >= 0.0 {
            ChangeKind::Increase
        } else {
            ChangeKind::Decrease
        },
    }
}

/// The four headline metric cards.
///
/// The backend has no previous-period figures yet, so each card compares
/// against a fixed offset below the current value.
pub fn main_metrics(totals: &Totals) -> Vec<Metric> {
    let card = |name: &str, value: u64, offset: u64, description: &str| Metric {
        name: name.to_string(),
        value,
        change: calculate_change(value, value.saturating_sub(offset)),
        description: description.to_string(),
    };

    vec![
        card(
            "Total Students",
            totals.students,
            2,
            "Active enrolled students",
        ),
        card(
            "Total Quizzes",
            totals.quizzes,
            5,
            "Quizzes created this term",
        ),
        card("Total Exams", totals.exams, 3, "Exams scheduled"),
        card(
            "Total Projects",
            totals.projects,
            1,
            "Active project assignments",
        ),
    ]
}

/// Merge school-wide exam and quiz counts by exact subject label.
///
/// Subjects keep first-seen order, exams first. A repeated label
/// overwrites the earlier count of the same kind.
pub fn merge_by_subject(
    exams: &[SubjectCountRecord],
    quizzes: &[SubjectCountRecord],
) -> Vec<SubjectComparison> {
    let mut merged: Vec<SubjectComparison> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for exam in exams {
        match index.get(&exam.subject) {
            Some(&i) => merged[i].exams = exam.count,
            None => {
                index.insert(exam.subject.clone(), merged.len());
                merged.push(SubjectComparison {
                    subject: exam.subject.clone(),
                    exams: exam.count,
                    quizzes: 0,
                });
            }
        }
    }

    for quiz in quizzes {
        match index.get(&quiz.subject) {
            Some(&i) => merged[i].quizzes = quiz.count,
            None => {
                index.insert(quiz.subject.clone(), merged.len());
                merged.push(SubjectComparison {
                    subject: quiz.subject.clone(),
                    exams: 0,
                    quizzes: quiz.count,
                });
            }
        }
    }

    merged
}

/// Generate a one-line-per-category text summary.
pub fn summary_text(kind: AssessmentKind, totals: &CategoryTotals) -> String {
    let parts: Vec<String> = totals
        .iter()
        .filter(|(category, _)| *category != Category::Other)
        .map(|(category, value)| format!("{} {}", category.short_label(), value))
        .collect();

    let mut line = format!("{}: {}", kind, parts.join(" | "));
    let other = totals.get(Category::Other);
    if other != 0 {
        line.push_str(&format!(" (uncategorized {})", other));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::adapter::normalize_records;
    use crate::models::SectionFilter;
    use serde_json::json;

    fn class_record(subject: &str, count: i64, grade: &str) -> SubjectCountRecord {
        SubjectCountRecord::class(subject, count, format!("id-{}", grade), grade)
    }

    #[test]
    fn test_scenario_without_grades() {
        let records = vec![
            SubjectCountRecord::school("Algebra II", 10),
            SubjectCountRecord::school("Biology", 5),
            SubjectCountRecord::school("Woodworking", 3),
        ];

        let totals = aggregate(&records);
        assert_eq!(totals.get(Category::Math), 10);
        assert_eq!(totals.get(Category::Science), 5);
        assert_eq!(totals.get(Category::Other), 3);
        assert_eq!(totals.get(Category::SocialStudies), 0);
        assert_eq!(totals.get(Category::English), 0);
        assert_eq!(totals.get(Category::Ug), 0);
        assert_eq!(totals.get(Category::Pg), 0);

        let chart = to_chart_data(&totals);
        assert_eq!(
            chart,
            vec![
                ChartDatum::new("Math", 10),
                ChartDatum::new("Science", 5),
                ChartDatum::new("Social studies", 0),
                ChartDatum::new("English", 0),
                ChartDatum::new("UG", 0),
                ChartDatum::new("PG", 0),
            ]
        );
    }

    #[test]
    fn test_ug_grade_counts_twice() {
        let records = vec![SubjectCountRecord {
            subject: "Math".to_string(),
            count: 4,
            standard_name: Some("UG".to_string()),
            ..SubjectCountRecord::default()
        }];

        let totals = aggregate(&records);
        assert_eq!(totals.get(Category::Math), 4);
        assert_eq!(totals.get(Category::Ug), 4);
        assert_eq!(totals.sum(), 8);
        assert_eq!(
            totals.iter().filter(|(_, v)| *v != 0).count(),
            2,
            "only Math and UG should be non-zero"
        );
    }

    #[test]
    fn test_sum_conserved_without_ug_pg_grades() {
        let records = vec![
            class_record("History", 2, "Grade 7"),
            class_record("English", 6, "Grade 8"),
            class_record("Pottery", 1, "Grade 8"),
            SubjectCountRecord::school("Chemistry", 9),
        ];
        let input: i64 = records.iter().map(|r| r.count).sum();
        assert_eq!(aggregate(&records).sum(), input);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let records = vec![
            class_record("Physics", 3, "PG"),
            class_record("Literature", 2, "ug"),
        ];
        let first = aggregate(&records);
        let second = aggregate(&records);
        assert_eq!(first, second);
        assert_eq!(first.get(Category::Pg), 3);
        assert_eq!(first.get(Category::Ug), 2);
    }

    #[test]
    fn test_negative_counts_pass_through() {
        let totals = aggregate(&[SubjectCountRecord::school("Math", -2)]);
        assert_eq!(totals.get(Category::Math), -2);
    }

    #[test]
    fn test_other_never_charted() {
        let totals = aggregate(&[SubjectCountRecord::school("Woodworking", 42)]);
        assert_eq!(totals.get(Category::Other), 42);

        let chart = to_chart_data(&totals);
        assert!(chart.iter().all(|d| d.label != "Other"));
        assert_eq!(chart, to_chart_data(&totals));
    }

    #[test]
    fn test_short_labels_leave_values_alone() {
        let totals = aggregate(&[SubjectCountRecord::school("Geography", 7)]);
        let full = to_chart_data(&totals);
        let short = to_chart_data_with(&totals, LabelStyle::Short);

        assert_eq!(short[2], ChartDatum::new("SST", 7));
        assert_eq!(full[2], ChartDatum::new("Social studies", 7));
        assert_eq!(
            full.iter().map(|d| d.value).collect::<Vec<_>>(),
            short.iter().map(|d| d.value).collect::<Vec<_>>()
        );
    }

    fn fixture() -> GranularRecords {
        GranularRecords {
            by_school: vec![SubjectCountRecord::school("English", 50)],
            by_class: vec![
                SubjectCountRecord::class("Biology", 8, "g-ug", "UG"),
                SubjectCountRecord::class("History", 4, "g-9", "9th Grade"),
            ],
            by_section: vec![
                SubjectCountRecord::section("Calculus", 3, "sec-a", "A"),
                SubjectCountRecord::section("Biology", 1, "sec-b", "B"),
            ],
        }
    }

    #[test]
    fn test_school_wide_by_default() {
        let selected = select_granularity(&fixture(), &FilterState::school());
        assert_eq!(selected, vec![SubjectCountRecord::school("English", 50)]);
    }

    #[test]
    fn test_grade_filter_uses_class_records() {
        let selected = select_granularity(&fixture(), &FilterState::grade("g-ug"));
        assert_eq!(selected.len(), 1);

        let totals = aggregate(&selected);
        assert_eq!(totals.get(Category::Science), 8);
        assert_eq!(totals.get(Category::Ug), 8);
        assert_eq!(totals.get(Category::English), 0);
    }

    #[test]
    fn test_section_beats_grade() {
        let filter = FilterState {
            grade_id: Some("g-9".to_string()),
            section: Some(SectionFilter {
                section_id: "sec-a".to_string(),
                grade_name: Some("9th Grade".to_string()),
            }),
        };

        let totals = aggregate(&select_granularity(&fixture(), &filter));
        assert_eq!(totals.get(Category::Math), 3);
        assert_eq!(totals.get(Category::SocialStudies), 0);
        assert_eq!(totals.sum(), 3);
    }

    #[test]
    fn test_section_folds_in_ug_parent() {
        let filter = FilterState {
            grade_id: None,
            section: Some(SectionFilter {
                section_id: "sec-b".to_string(),
                grade_name: Some("UG".to_string()),
            }),
        };

        let totals = aggregate(&select_granularity(&fixture(), &filter));
        assert_eq!(totals.get(Category::Science), 1);
        assert_eq!(totals.get(Category::Ug), 1);
    }

    #[test]
    fn test_kind_breakdown_from_payload() {
        let assigned = json!({
            "quizzes": {
                "bySchoolSubject": [
                    { "subject": "Fractions", "count": 2 },
                    { "topic": "Motion", "_count": 5 }
                ],
                "byClassSubject": [],
                "bySectionSubject": []
            }
        });

        let breakdown = kind_breakdown(
            &assigned,
            AssessmentKind::Quizzes,
            &FilterState::school(),
            LabelStyle::Full,
        );
        assert_eq!(breakdown.totals.get(Category::Math), 2);
        assert_eq!(breakdown.totals.get(Category::Science), 5);
        assert_eq!(breakdown.chart.len(), 6);
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(completion_rate(12, 20), "60.0");
        assert_eq!(completion_rate(1, 3), "33.3");
        assert_eq!(completion_rate(5, 0), "0");
    }

    #[test]
    fn test_calculate_change() {
        let up = calculate_change(5, 3);
        assert_eq!(up.change, "+66.7%");
        assert_eq!(up.kind, ChangeKind::Increase);

        let down = calculate_change(3, 4);
        assert_eq!(down.change, "-25.0%");
        assert_eq!(down.kind, ChangeKind::Decrease);

        let flat = calculate_change(7, 0);
        assert_eq!(flat.change, "+0%");
        assert_eq!(flat.kind, ChangeKind::Increase);
    }

    #[test]
    fn test_main_metrics() {
        let totals = Totals {
            students: 5,
            quizzes: 29,
            exams: 20,
            projects: 0,
            ..Totals::default()
        };

        let metrics = main_metrics(&totals);
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].name, "Total Students");
        assert_eq!(metrics[0].change.change, "+66.7%");
        assert_eq!(metrics[3].change.change, "+0%");
    }

    #[test]
    fn test_merge_by_subject() {
        let exams = vec![
            SubjectCountRecord::school("Math", 3),
            SubjectCountRecord::school("Physics", 1),
        ];
        let quizzes = vec![
            SubjectCountRecord::school("Physics", 4),
            SubjectCountRecord::school("Art", 2),
        ];

        let merged = merge_by_subject(&exams, &quizzes);
        let subjects: Vec<&str> = merged.iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Math", "Physics", "Art"]);
        assert_eq!(merged[1].exams, 1);
        assert_eq!(merged[1].quizzes, 4);
        assert_eq!(merged[2].exams, 0);
    }

    #[test]
    fn test_summary_text() {
        let totals = aggregate(&[
            SubjectCountRecord::school("Math", 1),
            SubjectCountRecord::school("Pottery", 2),
        ]);
        let text = summary_text(AssessmentKind::Exams, &totals);
        assert!(text.starts_with("Exams: Math 1 | Science 0 | SST 0"));
        assert!(text.ends_with("(uncategorized 2)"));
    }

    #[test]
    fn test_aggregate_huge_counts_saturate() {
        let records = normalize_records(Some(&json!([
            { "subject": "Math", "count": u64::MAX },
            { "subject": "Algebra", "count": 1 },
            { "subject": "Biology", "count": 4 }
        ])));
        assert_eq!(records[0].count, i64::MAX);

        let totals = aggregate(&records);
        assert_eq!(totals.get(Category::Math), i64::MAX);
        assert_eq!(totals.get(Category::Science), 4);
        assert_eq!(totals.sum(), i64::MAX);
        assert_eq!(to_chart_data(&totals)[0], ChartDatum::new("Math", i64::MAX));
    }
}
