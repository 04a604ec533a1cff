use serde::Serialize;
use workload_grid::{
    Alignment, Border, CellRef, CellValue, Font, Grid, GridError, LineStyle, Range,
    VerticalAlignment, VerticalMergeMode, Workbook,
};

use crate::aggregation::WorkloadMatrix;
use crate::config::ExportOptions;

/// Task key and summary of workloads whose item hangs directly under an epic.
pub const NO_TASK: &str = "# NoTask";

const HEADER: [&str; 14] = [
    "Coordinate",
    "Item",
    "Type",
    "Summary",
    "Task",
    "Task summary",
    "Epic",
    "Epic summary",
    "Project",
    "Contributor",
    "Comment",
    "Person-hours",
    "Rate",
    "Table",
];

const COLUMN_WIDTHS: [(&str, f64); 4] = [("A", 60.0), ("B", 40.0), ("C", 40.0), ("D", 40.0)];

/// One attributed worklog, flattened for tabular output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorklogRow {
    pub coordinate: String,
    pub item_key: String,
    pub item_type: String,
    pub item_summary: String,
    pub task_key: String,
    pub task_summary: String,
    pub epic_key: String,
    pub epic_summary: String,
    pub project: String,
    pub contributor: String,
    pub comment: String,
    pub hours: f64,
    pub rate: f64,
    pub table: String,
}

impl WorklogRow {
    fn cells(&self) -> Vec<CellValue> {
        vec![
            self.coordinate.as_str().into(),
            self.item_key.as_str().into(),
            self.item_type.as_str().into(),
            self.item_summary.as_str().into(),
            self.task_key.as_str().into(),
            self.task_summary.as_str().into(),
            self.epic_key.as_str().into(),
            self.epic_summary.as_str().into(),
            self.project.as_str().into(),
            self.contributor.as_str().into(),
            self.comment.as_str().into(),
            self.hours.into(),
            self.rate.into(),
            self.table.as_str().into(),
        ]
    }
}

/// Every workload of every cell, sorted by project, item type and contributor.
pub fn worklog_table(matrix: &WorkloadMatrix) -> Vec<WorklogRow> {
    let mut rows: Vec<WorklogRow> = matrix
        .cells()
        .iter()
        .flat_map(|cell| {
            let coordinate = cell.coordinate.to_string();
            cell.workloads.iter().map(move |w| {
                let (task_key, task_summary) = match &w.chain.task {
                    Some(task) => (task.key.clone(), task.summary.clone()),
                    None => (NO_TASK.to_string(), NO_TASK.to_string()),
                };
                WorklogRow {
                    coordinate: coordinate.clone(),
                    item_key: w.item.key.clone(),
                    item_type: w.item.issue_type.clone(),
                    item_summary: w.item.summary.clone(),
                    task_key,
                    task_summary,
                    epic_key: w.chain.epic.key.clone(),
                    epic_summary: w.chain.epic.summary.clone(),
                    project: w.item.project.name.clone(),
                    contributor: w.worklog.author.display_name.clone(),
                    comment: w.worklog.comment.clone(),
                    hours: w.person_hours(),
                    rate: w.rate,
                    table: cell.table.to_string(),
                }
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        (&a.project, &a.item_type, &a.contributor).cmp(&(&b.project, &b.item_type, &b.contributor))
    });
    rows
}

/// Lay `rows` out on a `Worklogs` sheet under a bold, underlined header row.
pub fn worklog_grid(rows: &[WorklogRow]) -> Result<Grid, GridError> {
    let mut grid = Grid::new("Worklogs");
    grid.append_row(HEADER);
    grid.update_styles(
        Range::new(CellRef::new(0, 0), CellRef::new(0, HEADER.len() as u32 - 1)),
        |style| {
            let font = style.font.get_or_insert_with(Font::default);
            font.bold = true;
            style.border = Some(Border {
                bottom: LineStyle::Thin,
                ..Border::default()
            });
        },
    );
    for row in rows {
        grid.append_row(row.cells());
    }
    if let Some(body) = Range::with_extent(CellRef::new(1, 0), rows.len() as u32, 1) {
        grid.update_styles(body, |style| {
            style.alignment = Some(Alignment {
                vertical: Some(VerticalAlignment::Top),
                wrap_text: true,
                ..Alignment::default()
            });
        });
    }
    grid.set_column_widths(COLUMN_WIDTHS)?;
    let merged = grid.merge_vertical(0, VerticalMergeMode::Same)?;
    log::debug!("worklog sheet: {} rows, {merged} coordinate runs merged", rows.len());
    Ok(grid)
}

/// "Count of" and "Time of" sheets for every loaded reference table.
pub fn matrix_workbook(
    matrix: &WorkloadMatrix,
    options: &ExportOptions,
) -> Result<Workbook, GridError> {
    let config = matrix.config();
    let palette = options.palette();
    let mut workbook = Workbook::new();
    for (table, grid) in matrix.tables().loaded() {
        let sheet = grid.name().to_string();
        let counts = matrix.build_matrix(table, |cell| cell.num_items() as f64);
        let times = matrix.build_matrix(table, |cell| cell.cumulative(config));
        let (Some(counts), Some(times)) = (counts, times) else {
            continue;
        };
        let sheets = [
            (format!("Count of {table}"), format!("Count of {sheet}"), counts),
            (
                format!("Time of {table}"),
                format!("Cumulative workload of {sheet}(person·{})", config.unit),
                times,
            ),
        ];
        for (name, title, values) in sheets {
            log::info!("rendering sheet {name:?}");
            let mut out = if options.is_downmixed() {
                grid.render_downmixed(&values, options.collapse_x, options.collapse_y, palette)?
            } else {
                grid.render_matrix(&values, palette)?
            };
            out.set_name(name);
            out.set_value(CellRef::new(0, 0), title);
            workbook.add_sheet(out)?;
        }
    }
    Ok(workbook)
}
