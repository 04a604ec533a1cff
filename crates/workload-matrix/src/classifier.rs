use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CoordinateLabels;
use crate::coordinate::{CoordinateGroup, DimSpec};
use crate::issue::{CascadeValue, WorkItem, WorkItemKind};
use crate::repository::ParentChain;

/// Reference table a work item resolves against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTable {
    Test,
    Manage,
    Generic,
}

impl ReferenceTable {
    pub const ALL: [ReferenceTable; 3] = [
        ReferenceTable::Test,
        ReferenceTable::Manage,
        ReferenceTable::Generic,
    ];
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceTable::Test => "Test",
            ReferenceTable::Manage => "Manage",
            ReferenceTable::Generic => "Generic",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("unable to generate coordinates, because: no attribute {field}")]
    MissingField { field: &'static str },
    #[error("unable to generate coordinates, because: {issue_type} is not task-like")]
    NotTaskLike { issue_type: String },
}

/// Coordinates of one work item and the table they address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub table: ReferenceTable,
    pub group: CoordinateGroup,
}

fn certification_child(epic: &WorkItem) -> Result<&str, CoordinateError> {
    epic.certification
        .as_ref()
        .map(|c| c.child.as_str())
        .ok_or(CoordinateError::MissingField {
            field: "certification",
        })
}

fn components(item: &WorkItem) -> Result<DimSpec, CoordinateError> {
    if item.components.is_empty() {
        return Err(CoordinateError::MissingField {
            field: "components",
        });
    }
    Ok(DimSpec::many(item.components.iter().cloned()))
}

fn epic_name(epic: &WorkItem) -> Result<DimSpec, CoordinateError> {
    epic.epic_name
        .as_deref()
        .map(DimSpec::one)
        .ok_or(CoordinateError::MissingField { field: "epic_name" })
}

fn test_rule(
    item: &WorkItem,
    epic: &WorkItem,
    task_type: Option<&CascadeValue>,
) -> Result<Classification, CoordinateError> {
    let certification = certification_child(epic)?;
    let components = components(item)?;
    let task_type = task_type.ok_or(CoordinateError::MissingField { field: "task_type" })?;
    Ok(Classification {
        table: ReferenceTable::Test,
        group: CoordinateGroup::new(
            vec![DimSpec::one(certification), components],
            vec![
                DimSpec::one(task_type.parent.as_str()),
                DimSpec::one(task_type.child.as_str()),
            ],
        ),
    })
}

fn manage_rule(
    item: &WorkItem,
    epic: &WorkItem,
    labels: &CoordinateLabels,
) -> Result<Classification, CoordinateError> {
    let certification = certification_child(epic)?;
    let components = components(item)?;
    Ok(Classification {
        table: ReferenceTable::Manage,
        group: CoordinateGroup::new(
            vec![DimSpec::one(certification), components],
            vec![DimSpec::one(labels.management.as_str()), DimSpec::any()],
        ),
    })
}

fn generic_rule(epic: &WorkItem, column: &str) -> Result<Classification, CoordinateError> {
    Ok(Classification {
        table: ReferenceTable::Generic,
        group: CoordinateGroup::new(
            vec![epic_name(epic)?, DimSpec::any()],
            vec![DimSpec::one(column), DimSpec::any()],
        ),
    })
}

/// Build the coordinate group of a task-like item from its parent chain.
///
/// Subtasks take the rule of their parent task: a test task's rule with the
/// subtask's own task type (falling back to the parent's), a management task's
/// rule, or the generic subtask pairing otherwise.
pub fn classify(
    item: &WorkItem,
    chain: &ParentChain,
    labels: &CoordinateLabels,
) -> Result<Classification, CoordinateError> {
    let epic = chain.epic.as_ref();
    match item.kind() {
        WorkItemKind::Task => generic_rule(epic, &labels.unlabeled_task),
        WorkItemKind::TestTask => test_rule(item, epic, item.task_type.as_ref()),
        WorkItemKind::ManageTask => manage_rule(item, epic, labels),
        WorkItemKind::Subtask => {
            let parent = chain.task.as_deref();
            match parent.map(WorkItem::kind) {
                Some(WorkItemKind::TestTask) => {
                    let task_type = item
                        .task_type
                        .as_ref()
                        .or_else(|| parent.and_then(|p| p.task_type.as_ref()));
                    test_rule(item, epic, task_type)
                }
                Some(WorkItemKind::ManageTask) => manage_rule(item, epic, labels),
                _ => generic_rule(epic, &labels.unlabeled_subtask),
            }
        }
        WorkItemKind::Epic | WorkItemKind::Other => Err(CoordinateError::NotTaskLike {
            issue_type: item.issue_type.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn epic() -> WorkItem {
        let mut epic = WorkItem::new("1", "P-1", "Epic");
        epic.epic_name = Some("Panel bring-up".into());
        epic.certification = Some(CascadeValue::new("Dolby", "HDR10"));
        epic
    }

    fn test_task() -> WorkItem {
        let mut task = WorkItem::new("2", "P-2", "Test Task");
        task.epic_link = Some("P-1".into());
        task.components = vec!["UI".into()];
        task.task_type = Some(CascadeValue::new("Display", "Brightness"));
        task
    }

    fn chain(task: Option<WorkItem>) -> ParentChain {
        ParentChain {
            task: task.map(Arc::new),
            epic: Arc::new(epic()),
        }
    }

    #[test]
    fn test_task_rows_and_columns() {
        let task = test_task();
        let result = classify(&task, &chain(Some(task.clone())), &CoordinateLabels::default())
            .unwrap();
        assert_eq!(result.table, ReferenceTable::Test);
        assert_eq!(
            result.group,
            CoordinateGroup::new(
                vec![DimSpec::one("HDR10"), DimSpec::many(["UI"])],
                vec![DimSpec::one("Display"), DimSpec::one("Brightness")],
            )
        );
    }

    #[test]
    fn test_task_requires_fields() {
        let mut task = test_task();
        task.task_type = None;
        let err = classify(&task, &chain(None), &CoordinateLabels::default()).unwrap_err();
        assert_eq!(err, CoordinateError::MissingField { field: "task_type" });

        task.components.clear();
        let err = classify(&task, &chain(None), &CoordinateLabels::default()).unwrap_err();
        assert_eq!(err, CoordinateError::MissingField { field: "components" });

        let mut bare = chain(None);
        bare.epic = Arc::new(WorkItem::new("1", "P-1", "Epic"));
        let err = classify(&test_task(), &bare, &CoordinateLabels::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unable to generate coordinates, because: no attribute certification"
        );
    }

    #[test]
    fn generic_task_uses_epic_name() {
        let mut task = WorkItem::new("3", "P-3", "Task");
        task.epic_link = Some("P-1".into());
        let result = classify(&task, &chain(Some(task.clone())), &CoordinateLabels::default())
            .unwrap();
        assert_eq!(result.table, ReferenceTable::Generic);
        assert_eq!(
            result.group,
            CoordinateGroup::new(
                vec![DimSpec::one("Panel bring-up"), DimSpec::any()],
                vec![DimSpec::one("unlabeled task"), DimSpec::any()],
            )
        );
    }

    #[test]
    fn subtask_follows_parent_kind() {
        let labels = CoordinateLabels {
            management: "mgmt".into(),
            ..CoordinateLabels::default()
        };
        let mut sub = WorkItem::new("4", "P-4", "Sub-task");
        sub.parent_key = Some("P-2".into());
        sub.components = vec!["Audio".into()];

        // Own task type missing: the parent test task's one is used.
        let result = classify(&sub, &chain(Some(test_task())), &labels).unwrap();
        assert_eq!(result.table, ReferenceTable::Test);
        assert_eq!(
            result.group.cols,
            vec![DimSpec::one("Display"), DimSpec::one("Brightness")]
        );

        sub.task_type = Some(CascadeValue::new("Audio", "Volume"));
        let result = classify(&sub, &chain(Some(test_task())), &labels).unwrap();
        assert_eq!(result.group.cols, vec![DimSpec::one("Audio"), DimSpec::one("Volume")]);

        let mut manage = test_task();
        manage.issue_type = "Manage Task".into();
        let result = classify(&sub, &chain(Some(manage)), &labels).unwrap();
        assert_eq!(result.table, ReferenceTable::Manage);
        assert_eq!(result.group.cols, vec![DimSpec::one("mgmt"), DimSpec::any()]);

        let result = classify(&sub, &chain(None), &labels).unwrap();
        assert_eq!(result.table, ReferenceTable::Generic);
        assert_eq!(
            result.group.cols,
            vec![DimSpec::one("unlabeled subtask"), DimSpec::any()]
        );
    }

    #[test]
    fn epics_are_not_task_like() {
        let err = classify(&epic(), &chain(None), &CoordinateLabels::default()).unwrap_err();
        assert_eq!(
            err,
            CoordinateError::NotTaskLike {
                issue_type: "Epic".into()
            }
        );
    }
}
