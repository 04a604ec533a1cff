use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use workload_grid::{CellRef, Color, HorizontalAlignment, LineStyle};
use workload_matrix::{
    comments_grid, comments_table, CascadeValue, Comment, CommentWindow, Project,
    StatusCategory, User, WorkItem, WorkflowStatus,
};

fn status(name: &str, category: StatusCategory) -> WorkflowStatus {
    WorkflowStatus {
        name: name.to_string(),
        category,
    }
}

fn comment(body: &str, created: &str) -> Comment {
    Comment {
        author: User::new("alice", "Alice"),
        body: body.to_string(),
        created: created.to_string(),
    }
}

fn project(name: &str) -> Project {
    Project {
        key: name.to_uppercase(),
        name: name.to_string(),
    }
}

fn batch() -> Vec<WorkItem> {
    let mut epic = WorkItem::new("1", "P-1", "Epic");
    epic.summary = "HDR10 certification".into();
    epic.project = project("Panel");
    epic.certification = Some(CascadeValue::new("Dolby", "HDR10"));
    epic.base_platform = Some("MT9653".into());
    epic.status = status("In Progress", StatusCategory::InProgress);
    epic.comments = vec![
        comment("first pass", "2024-03-01T09:00:00.000+0800"),
        comment("second &amp; final<br/>run", "2024-03-04T10:20:30.000+0800"),
    ];

    let mut task = WorkItem::new("2", "P-2", "Task");
    task.summary = "Audio tuning".into();
    task.project = project("Panel");
    task.labels = vec!["audio".into(), "dsp".into()];
    task.status = status("Done", StatusCategory::Done);

    let mut other = WorkItem::new("3", "A-3", "Bug");
    other.summary = "Boot logo".into();
    other.project = project("Alpha");
    other.status = status("Backlog", StatusCategory::Undefined);
    other.comments = vec![comment("seen on rev B", "yesterday")];

    vec![epic, task, other]
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
}

#[test]
fn latest_comment_rows_per_item() {
    let items = batch();
    let rows = comments_table(&items, CommentWindow::default(), today());
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].labels, "[A-3(Bug)]");
    assert_eq!(rows[0].comment, ">>>yesterday, Alice: \nseen on rev B");
    assert_eq!(rows[0].status_color, None);

    assert_eq!(rows[1].summary, "Audio tuning");
    assert_eq!(rows[1].labels, "[P-2(Task)]audio, dsp");
    assert_eq!(rows[1].comment, "### Mar 08, Fri, Auto: \n### No comments.");
    assert_eq!(rows[1].status_color, Some(Color::new_argb(0xFF00_B050)));

    // Epics show platform and certification.
    assert_eq!(rows[2].summary, "MT9653");
    assert_eq!(rows[2].labels, "[P-1(Epic)]Dolby-HDR10");
    assert_eq!(rows[2].status, "In Progress");
    assert_eq!(rows[2].comment, ">>>Mar 04, Mon, Alice: \nsecond & final\nrun");

    let json = serde_json::to_value(&rows[1]).unwrap();
    assert_eq!(json["status_color"], "#FF00B050");
    assert!(serde_json::to_value(&rows[0]).unwrap().get("status_color").is_none());
}

#[test]
fn comments_sheet_merges_item_columns() {
    let items = batch();
    let rows = comments_table(&items, CommentWindow::All, today());
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[2].comment, ">>>Mar 01, Fri, Alice: \nfirst pass");

    let sheet = comments_grid(&rows).unwrap();
    assert_eq!(sheet.name(), "Comments");
    assert_eq!(sheet.row_count(), 4);
    let merged: Vec<String> = sheet
        .merged_regions()
        .iter()
        .map(|r| r.range.to_string())
        .collect();
    assert_eq!(merged, vec!["A2:A4", "B3:B4", "C3:C4", "D3:D4"]);
    assert_eq!(sheet.value(CellRef::new(2, 3)).to_string(), "In Progress");
    assert_eq!(sheet.value(CellRef::new(3, 3)).to_string(), "");

    let badge = sheet.style(CellRef::new(2, 3));
    assert_eq!(badge.background(), Some(Color::from_rgb(0x00, 0xB0, 0xF0)));
    let font = badge.font.as_ref().unwrap();
    assert!(font.bold);
    assert_eq!(font.color, Some(Color::white()));
    assert_eq!(sheet.style(CellRef::new(0, 3)).background(), None);

    let comment_cell = sheet.style(CellRef::new(0, 4));
    let alignment = comment_cell.alignment.as_ref().unwrap();
    assert!(alignment.wrap_text);
    assert_eq!(alignment.horizontal, Some(HorizontalAlignment::Left));
    assert_eq!(
        comment_cell.border.as_ref().map(|b| b.right),
        Some(LineStyle::Thin)
    );
    assert_eq!(sheet.column_width(4), Some(100.0));
    assert_eq!(sheet.column_width(0), Some(20.0));
}

#[test]
fn empty_batch_gives_an_empty_sheet() {
    let none: Vec<WorkItem> = Vec::new();
    let rows = comments_table(&none, CommentWindow::All, today());
    assert!(rows.is_empty());
    let sheet = comments_grid(&rows).unwrap();
    assert_eq!(sheet.row_count(), 0);
    assert!(sheet.merged_regions().is_empty());
}
