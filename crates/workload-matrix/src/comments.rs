//! Latest-comments status report: one row per shown comment of each item,
//! laid out on a sheet with the item columns merged over its comment rows.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use workload_grid::{
    Alignment, Border, CellRef, Color, Fill, Font, Grid, GridError, HorizontalAlignment, LineStyle,
    Range, VerticalAlignment, VerticalMergeMode,
};

use crate::issue::{Comment, WorkItem, WorkItemKind};

const COLUMN_WIDTHS: [(&str, f64); 5] = [
    ("A", 20.0),
    ("B", 30.0),
    ("C", 40.0),
    ("D", 15.0),
    ("E", 100.0),
];

const DATE_FORMAT: &str = "%b %d, %a";

/// Which comments of an item are listed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentWindow {
    All,
    /// The last `n` comments.
    Latest(usize),
}

impl Default for CommentWindow {
    fn default() -> Self {
        Self::Latest(1)
    }
}

impl CommentWindow {
    fn select(self, comments: &[Comment]) -> &[Comment] {
        match self {
            CommentWindow::All => comments,
            CommentWindow::Latest(n) => &comments[comments.len().saturating_sub(n)..],
        }
    }
}

/// One comment of one item, with the item columns repeated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommentRow {
    pub project: String,
    pub summary: String,
    /// `[KEY(type)]labels`; epics show their certification instead when set.
    pub labels: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_color: Option<Color>,
    pub comment: String,
}

/// Comment rows of `items`, sorted by project, summary and labels.
///
/// Items without comments get one placeholder row dated `today`.
pub fn comments_table<'a>(
    items: impl IntoIterator<Item = &'a WorkItem>,
    window: CommentWindow,
    today: NaiveDate,
) -> Vec<CommentRow> {
    let mut rows = Vec::new();
    for item in items {
        let is_epic = item.kind() == WorkItemKind::Epic;
        let summary = match item.platform() {
            Some(platform) if is_epic => platform.to_string(),
            _ => item.summary.clone(),
        };
        let tags = match &item.certification {
            Some(certification) if is_epic => certification.to_string(),
            _ => item.labels.join(", "),
        };
        let labels = format!("[{}({})]{tags}", item.key, item.issue_type);

        let shown = window.select(&item.comments);
        let texts: Vec<String> = if shown.is_empty() {
            vec![format!(
                "### {}, Auto: \n### No comments.",
                today.format(DATE_FORMAT)
            )]
        } else {
            shown.iter().map(comment_text).collect()
        };
        rows.extend(texts.into_iter().map(|comment| CommentRow {
            project: item.project.name.clone(),
            summary: summary.clone(),
            labels: labels.clone(),
            status: item.status.name.clone(),
            status_color: item.status.category.color(),
            comment,
        }));
    }
    rows.sort_by(|a, b| {
        (&a.project, &a.summary, &a.labels).cmp(&(&b.project, &b.summary, &b.labels))
    });
    rows
}

/// `>>>Mar 04, Mon, Author: \nbody`; an unparseable timestamp is shown as-is.
fn comment_text(comment: &Comment) -> String {
    let date = DateTime::parse_from_str(&comment.created, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(&comment.created))
        .map(|at| at.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|_| comment.created.clone());
    format!(
        ">>>{date}, {}: \n{}",
        comment.author.display_name,
        clean_text(&comment.body)
    )
}

/// Normalize tracker markup: `&amp;`, `<br/>`, runs of blank lines and
/// horizontal whitespace; trims both ends.
pub fn clean_text(text: &str) -> String {
    static BREAKS: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let breaks = BREAKS.get_or_init(|| Regex::new(r"(?:<br/>|[\r\n])+").expect("valid regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(r"[ \t\x0B\x0C]+").expect("valid regex"));

    let text = text.replace("&amp;", "&");
    let text = breaks.replace_all(&text, "\n");
    let text = spaces.replace_all(&text, " ");
    text.trim().to_string()
}

/// Lay `rows` out on a `Comments` sheet.
///
/// Project, summary and labels runs are merged down their columns and the
/// status column copies the label merges. The status cell is filled with the
/// category color in bold white.
pub fn comments_grid(rows: &[CommentRow]) -> Result<Grid, GridError> {
    let mut grid = Grid::new("Comments");
    for row in rows {
        grid.append_row([
            row.project.as_str(),
            row.summary.as_str(),
            row.labels.as_str(),
            row.status.as_str(),
            row.comment.as_str(),
        ]);
    }
    let Some(body) = Range::with_extent(CellRef::new(0, 0), rows.len() as u32, 5) else {
        return Ok(grid);
    };

    let black = Color::from_rgb(0, 0, 0);
    grid.update_styles(body, |style| {
        style.border = Some(Border::all(LineStyle::Thin, black));
    });
    for col in 0..5u32 {
        let (horizontal, wrap_text) = match col {
            0 | 3 => (HorizontalAlignment::Center, false),
            1 => (HorizontalAlignment::Center, true),
            _ => (HorizontalAlignment::Left, true),
        };
        let column = Range::new(CellRef::new(0, col), CellRef::new(body.end.row, col));
        grid.update_styles(column, |style| {
            style.alignment = Some(Alignment {
                horizontal: Some(horizontal),
                vertical: Some(VerticalAlignment::Center),
                wrap_text,
            });
        });
    }
    for (i, row) in rows.iter().enumerate() {
        let Some(color) = row.status_color else {
            continue;
        };
        let cell = CellRef::new(i as u32, 3);
        grid.update_styles(Range::new(cell, cell), |style| {
            style.fill = Some(Fill::solid(color));
            let font = style.font.get_or_insert_with(Font::default);
            font.bold = true;
            font.color = Some(Color::white());
        });
    }

    grid.set_column_widths(COLUMN_WIDTHS)?;
    let mut merged = 0;
    for col in 0..3 {
        merged += grid.merge_vertical(col, VerticalMergeMode::All)?;
    }
    grid.copy_vertical_merges(2, &[3])?;
    log::debug!("comments sheet: {} rows, {merged} runs merged", rows.len());
    Ok(grid)
}
