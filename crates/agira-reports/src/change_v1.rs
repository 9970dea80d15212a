//! Change Report v1 (`change.v1`).
//!
//! Story layout, in order:
//!   title
//!   project / creator / date line
//!   status and risk
//!   planned start, planned end, executed at
//!   description, risk description, mitigation, rollback plan,
//!     communication plan (heading + one paragraph per non-blank line)
//!   related items table (only when there are items)
//!   approvals table (only when there are approvals)
//!
//! Missing scalar values print as `N/A`; a missing or empty list drops its
//! heading and table entirely.

use chrono::Utc;
use serde_json::{json, Value};

use agira_contracts::{error::AgiraResult, report::ReportContext};
use agira_core::traits::ReportTemplate;
use agira_render::{Flowable, Font, PageCanvas, PageInfo, CM};

pub const CHANGE_REPORT_KEY: &str = "change.v1";

/// Placeholder for absent scalar values.
pub const NOT_AVAILABLE: &str = "N/A";

const REPORT_TITLE: &str = "Change Report";

/// Long-text sections in display order: (context key, heading).
const TEXT_SECTIONS: [(&str, &str); 5] = [
    ("description", "Description"),
    ("risk_description", "Risk Description"),
    ("mitigation", "Mitigation"),
    ("rollback_plan", "Rollback Plan"),
    ("communication_plan", "Communication Plan"),
];

/// Render a JSON value for display; `None` for null or blank strings.
fn display(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn field(object: &serde_json::Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(display)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Objects of the list at `key`; absent, null, or non-array yields nothing.
fn records<'c>(context: &'c ReportContext, key: &str) -> Vec<&'c serde_json::Map<String, Value>> {
    context
        .get(key)
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

/// The `change.v1` report template.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeReportV1;

impl ChangeReportV1 {
    fn text_section(story: &mut Vec<Flowable>, context: &ReportContext, key: &str, heading: &str) {
        story.push(Flowable::heading(heading));

        let paragraphs: Vec<String> = context
            .get(key)
            .and_then(display)
            .map(|text| {
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if paragraphs.is_empty() {
            story.push(Flowable::body(NOT_AVAILABLE));
        } else {
            story.extend(paragraphs.into_iter().map(Flowable::body));
        }
    }
}

impl ReportTemplate for ChangeReportV1 {
    fn build_story(&self, context: &ReportContext) -> AgiraResult<Vec<Flowable>> {
        let mut story = Vec::new();

        story.push(Flowable::title(field(context, "title")));
        story.push(Flowable::body(format!(
            "Project: {} | Created by: {} | Date: {}",
            field(context, "project"),
            field(context, "created_by"),
            field(context, "created_at"),
        )));
        story.push(Flowable::Spacer(6.0));

        story.push(Flowable::body(format!("Status: {}", field(context, "status"))));
        story.push(Flowable::body(format!("Risk: {}", field(context, "risk"))));
        story.push(Flowable::Spacer(6.0));

        story.push(Flowable::body(format!("Planned Start: {}", field(context, "planned_start"))));
        story.push(Flowable::body(format!("Planned End: {}", field(context, "planned_end"))));
        story.push(Flowable::body(format!("Executed At: {}", field(context, "executed_at"))));

        for (key, heading) in TEXT_SECTIONS {
            Self::text_section(&mut story, context, key, heading);
        }

        let items = records(context, "items");
        if !items.is_empty() {
            story.push(Flowable::heading("Related Items"));
            story.push(Flowable::table(
                vec!["Title".to_string(), "Status".to_string()],
                items
                    .iter()
                    .map(|item| vec![field(item, "title"), field(item, "status")])
                    .collect(),
            ));
        }

        let approvals = records(context, "approvals");
        if !approvals.is_empty() {
            story.push(Flowable::heading("Approvals"));
            story.push(Flowable::table(
                vec![
                    "Approver".to_string(),
                    "Status".to_string(),
                    "Decision At".to_string(),
                ],
                approvals
                    .iter()
                    .map(|a| {
                        vec![
                            field(a, "approver"),
                            field(a, "status"),
                            field(a, "decision_at"),
                        ]
                    })
                    .collect(),
            ));
        }

        Ok(story)
    }

    fn draw_header_footer(&self, canvas: &mut PageCanvas, page: &PageInfo, context: &ReportContext) {
        let geometry = page.geometry;
        let left = geometry.frame_left();
        let right = geometry.frame_right();
        let height = geometry.size.height;

        canvas.set_font(Font::HelveticaBold, 12.0);
        canvas.draw_string(left, height - 1.4 * CM, REPORT_TITLE);
        canvas.set_font(Font::Helvetica, 9.0);
        canvas.draw_string(
            left,
            height - 1.4 * CM - 14.0,
            &format!("Project: {}", field(context, "project")),
        );

        canvas.set_line_width(0.5);
        canvas.set_stroke_gray(0.6);
        canvas.line(left, height - 2.4 * CM, right, height - 2.4 * CM);
        canvas.line(left, 1.8 * CM, right, 1.8 * CM);

        // Evaluated per page; the hash is taken over the finished bytes.
        let generated = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        canvas.set_font(Font::Helvetica, 8.0);
        canvas.draw_string(left, 1.2 * CM, &format!("Generated on {}", generated));
        canvas.draw_right_string(right, 1.2 * CM, &format!("Page {}", page.page_number));
    }

    fn context_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": ["array", "null"],
                    "items": { "type": "object" }
                },
                "approvals": {
                    "type": ["array", "null"],
                    "items": { "type": "object" }
                }
            }
        }))
    }
}
