//! Report rendering.

mod generator;

pub use generator::{
    build_analytics_report, generate_institutions_json, generate_institutions_markdown,
    generate_json_report, generate_markdown_report, write_output, ReportOptions,
};
