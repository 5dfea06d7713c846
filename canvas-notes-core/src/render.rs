//! Note rendering.
//!
//! [`render_note`] builds the complete markdown body for a freshly seen
//! assignment. [`update_schedule_fields`] is the narrow edit applied to notes
//! that already exist: it only rewrites the `due` and `assigned` frontmatter
//! lines so anything the user wrote elsewhere survives.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::assignment::{RemoteAssignment, RubricCriterion};
use crate::contract::HtmlConverter;
use crate::course::CourseConfig;

pub const BASE_TAG: &str = "assignment";

const DUE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const ASSIGNED_FORMAT: &str = "%Y-%m-%d";
const FENCE: &str = "---";

/// How rubric criteria are laid out in a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RubricMode {
    /// One unchecked checklist item per criterion.
    #[default]
    TodoList,
    /// A Criteria / Points / Description table.
    Table,
}

impl FromStr for RubricMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "todo-list" | "todo" | "checklist" => Ok(RubricMode::TodoList),
            "table" => Ok(RubricMode::Table),
            other => Err(format!(
                "unknown rubric mode `{other}` (expected `todo-list` or `table`)"
            )),
        }
    }
}

impl Display for RubricMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RubricMode::TodoList => f.write_str("todo-list"),
            RubricMode::Table => f.write_str("table"),
        }
    }
}

/// Time zone used for the `due` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl DisplayZone {
    pub fn render(
        &self,
        assignment: &RemoteAssignment,
        course: &CourseConfig,
        mode: RubricMode,
        converter: &dyn HtmlConverter,
    ) -> String {
        match self {
            DisplayZone::Local => render_note_in(assignment, course, mode, converter, &Local),
            DisplayZone::Fixed(offset) => {
                render_note_in(assignment, course, mode, converter, offset)
            }
        }
    }

    pub fn update(&self, note: &str, assignment: &RemoteAssignment) -> String {
        match self {
            DisplayZone::Local => update_schedule_fields(note, assignment, &Local),
            DisplayZone::Fixed(offset) => update_schedule_fields(note, assignment, offset),
        }
    }
}

/// Render a note with due dates shown in the machine's local time zone.
pub fn render_note(
    assignment: &RemoteAssignment,
    course: &CourseConfig,
    mode: RubricMode,
    converter: &dyn HtmlConverter,
) -> String {
    render_note_in(assignment, course, mode, converter, &Local)
}

/// Render a note with due dates shown in `tz`.
pub fn render_note_in<Tz>(
    assignment: &RemoteAssignment,
    course: &CourseConfig,
    mode: RubricMode,
    converter: &dyn HtmlConverter,
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    out.push_str(FENCE);
    out.push('\n');
    out.push_str("tags:\n");
    for tag in std::iter::once(BASE_TAG).chain(course.extra_tags.iter().map(String::as_str)) {
        out.push_str(&format!("  - {tag}\n"));
    }
    push_field(&mut out, "due", &format_due(assignment.due_at.as_ref(), tz));
    push_field(&mut out, "assigned", &format_assigned(&assignment.created_at));
    push_field(&mut out, "url", &assignment.url);
    // Submission state is not tracked.
    push_field(&mut out, "done", "false");
    for (key, value) in &course.extra_frontmatter {
        push_field(&mut out, key, value);
    }
    out.push_str(FENCE);
    out.push('\n');

    if let Some(description) = &assignment.description {
        out.push_str("\n## Description\n\n");
        let markdown = converter.to_markdown(&prepare_description(description));
        out.push_str(markdown.trim_end());
        out.push('\n');
    }

    if let Some(rubric) = &assignment.rubric {
        out.push_str("\n## Rubric\n\n");
        match mode {
            RubricMode::TodoList => push_todo_list(&mut out, rubric),
            RubricMode::Table => push_table(&mut out, rubric),
        }
    }

    out
}

/// Rewrite the `due` and `assigned` frontmatter lines of an existing note.
pub fn update_schedule_fields<Tz>(note: &str, assignment: &RemoteAssignment, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let fields = [
        ("due", format_due(assignment.due_at.as_ref(), tz)),
        ("assigned", format_assigned(&assignment.created_at)),
    ];
    set_frontmatter_fields(note, &fields)
}

/// Set `fields` in the leading frontmatter block of `note`, leaving every other
/// line byte-for-byte as it was. Only the first line of each key is rewritten.
/// Missing keys are added before the closing fence; a note without frontmatter
/// gets a new block.
pub fn set_frontmatter_fields(note: &str, fields: &[(&str, String)]) -> String {
    let mut lines = note.split_inclusive('\n');
    let opens_frontmatter = lines.next().is_some_and(|l| l.trim_end() == FENCE);
    if !opens_frontmatter {
        return prepend_frontmatter(note, fields);
    }

    let mut out = String::with_capacity(note.len() + 64);
    out.push_str(FENCE);
    out.push_str(line_ending(note.split_inclusive('\n').next().unwrap_or_default()));

    let mut seen = vec![false; fields.len()];
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == FENCE {
            for ((key, value), seen) in fields.iter().zip(&seen) {
                if !seen {
                    push_field(&mut out, key, value);
                }
            }
            out.push_str(line);
            closed = true;
            break;
        }
        match fields.iter().position(|(key, _)| is_key_line(line, key)) {
            Some(index) if !seen[index] => {
                seen[index] = true;
                let (key, value) = &fields[index];
                out.push_str(&field_line(key, value));
                out.push_str(line_ending(line));
            }
            _ => out.push_str(line),
        }
    }

    if !closed {
        return prepend_frontmatter(note, fields);
    }
    for line in lines {
        out.push_str(line);
    }
    out
}

fn prepend_frontmatter(note: &str, fields: &[(&str, String)]) -> String {
    let mut out = String::from(FENCE);
    out.push('\n');
    for (key, value) in fields {
        push_field(&mut out, key, value);
    }
    out.push_str(FENCE);
    out.push('\n');
    out.push_str(note);
    out
}

fn is_key_line(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.starts_with(':'))
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn field_line(key: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{key}:")
    } else {
        format!("{key}: {value}")
    }
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(&field_line(key, value));
    out.push('\n');
}

fn format_due<Tz>(due_at: Option<&DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    due_at
        .map(|due| due.with_timezone(tz).format(DUE_FORMAT).to_string())
        .unwrap_or_default()
}

fn format_assigned(created_at: &DateTime<Utc>) -> String {
    created_at.format(ASSIGNED_FORMAT).to_string()
}

/// The first newline goes and the first `h2` becomes an `h3`, so the
/// description nests under the note's own `## Description` heading.
fn prepare_description(html: &str) -> String {
    html.replacen('\n', "", 1)
        .replacen("<h2", "<h3", 1)
        .replacen("</h2>", "</h3>", 1)
}

fn push_todo_list(out: &mut String, rubric: &[RubricCriterion]) {
    for criterion in rubric {
        out.push_str(&format!(
            "- [ ] **{}** ({} points)\n",
            criterion.description, criterion.points
        ));
        if let Some(long) = &criterion.long_description {
            out.push_str(&format!("    *{}*\n", single_line(long)));
        }
    }
}

fn push_table(out: &mut String, rubric: &[RubricCriterion]) {
    out.push_str("| Criteria | Points | Description |\n");
    out.push_str("| --- | --- | --- |\n");
    for criterion in rubric {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            table_cell(&criterion.description),
            criterion.points,
            table_cell(criterion.long_description.as_deref().unwrap_or_default()),
        ));
    }
}

/// Markdown inline spans can't cross a line break.
fn single_line(text: &str) -> String {
    text.trim().replace("\r\n", "<br>").replace('\n', "<br>")
}

fn table_cell(text: &str) -> String {
    single_line(text).replace('|', "\\|")
}
