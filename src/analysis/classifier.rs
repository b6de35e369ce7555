//! Subject classification.
//!
//! Maps free-text subject and topic names onto the fixed [`Category`] set
//! using ordered, case-insensitive substring rules. The first matching rule
//! wins, so the rule order is part of the behavior.

use crate::models::Category;

const MATH_KEYWORDS: &[&str] = &["math", "algebra", "calculus", "fraction", "linear equation"];

const SCIENCE_KEYWORDS: &[&str] = &[
    "physics",
    "chemistry",
    "biology",
    "photosynthesis",
    "force",
    "motion",
    "science",
    "wave",
];

const ENGLISH_KEYWORDS: &[&str] = &["english", "literature"];

const SOCIAL_KEYWORDS: &[&str] = &["history", "geography", "social"];

/// Upstream data sometimes truncates "Fractions" to a bare "f".
const TRUNCATED_MATH_LABEL: &str = "f";

/// Classify a subject label into a category.
pub fn classify(subject: &str) -> Category {
    let normalized = subject.to_lowercase();
    let text = normalized.as_str();

    if text.contains("ug") {
        Category::Ug
    } else if text.contains("pg") {
        Category::Pg
    } else if text == TRUNCATED_MATH_LABEL || contains_any(text, MATH_KEYWORDS) {
        Category::Math
    } else if contains_any(text, SCIENCE_KEYWORDS) {
        Category::Science
    } else if contains_any(text, ENGLISH_KEYWORDS) {
        Category::English
    } else if contains_any(text, SOCIAL_KEYWORDS) {
        Category::SocialStudies
    } else {
        Category::Other
    }
}

/// Returns the UG/PG category when a grade name is literally "UG" or "PG".
pub fn grade_category(grade_name: &str) -> Option<Category> {
    if grade_name.eq_ignore_ascii_case("ug") {
        Some(Category::Ug)
    } else if grade_name.eq_ignore_ascii_case("pg") {
        Some(Category::Pg)
    } else {
        None
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}
