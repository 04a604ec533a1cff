use std::fmt;

use serde::{Deserialize, Serialize};
use workload_grid::Color;

/// Discriminant of a tracker issue, derived from its issue-type display name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Epic,
    Task,
    TestTask,
    ManageTask,
    Subtask,
    Other,
}

impl WorkItemKind {
    /// Map a tracker issue-type name. Both the English names and the tracker's
    /// localized names are recognized; anything else is [`WorkItemKind::Other`].
    pub fn from_type_name(name: &str) -> Self {
        match name.trim() {
            "Epic" => Self::Epic,
            "Task" | "任务" => Self::Task,
            "Sub-task" | "Subtask" | "子任务" => Self::Subtask,
            "Test Task" | "Certification Test Task" | "认证测试任务" => Self::TestTask,
            "Manage Task" | "Certification Management Task" | "认证管理任务" => Self::ManageTask,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn is_task_like(self) -> bool {
        matches!(
            self,
            Self::Task | Self::TestTask | Self::ManageTask | Self::Subtask
        )
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Epic => "Epic",
            Self::Task => "Task",
            Self::TestTask => "TestTask",
            Self::ManageTask => "ManageTask",
            Self::Subtask => "Subtask",
            Self::Other => "Other",
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub key: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            email: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    pub key: String,
    pub name: String,
}

/// Value of a two-level cascading select field (e.g. task type, certification).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CascadeValue {
    pub parent: String,
    pub child: String,
}

impl CascadeValue {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
        }
    }
}

impl fmt::Display for CascadeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.parent, self.child)
    }
}

/// Tracker-wide grouping of workflow statuses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    #[default]
    Undefined,
    New,
    InProgress,
    Done,
}

impl StatusCategory {
    /// Map the tracker's numeric category id (`2` new, `4` in progress, `3` done).
    pub fn from_id(id: u32) -> Self {
        match id {
            2 => Self::New,
            4 => Self::InProgress,
            3 => Self::Done,
            _ => Self::Undefined,
        }
    }

    /// Badge color of the category on status reports.
    pub fn color(self) -> Option<Color> {
        match self {
            Self::New => Some(Color::from_rgb(0xA6, 0xA6, 0xA6)),
            Self::InProgress => Some(Color::from_rgb(0x00, 0xB0, 0xF0)),
            Self::Done => Some(Color::from_rgb(0x00, 0xB0, 0x50)),
            Self::Undefined => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub name: String,
    #[serde(default)]
    pub category: StatusCategory,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comment {
    pub author: User,
    #[serde(default)]
    pub body: String,
    /// Creation timestamp as reported by the tracker.
    #[serde(default)]
    pub created: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Worklog {
    #[serde(default)]
    pub id: String,
    pub author: User,
    #[serde(default)]
    pub comment: String,
    pub seconds: u64,
    /// Start timestamp as reported by the tracker.
    #[serde(default)]
    pub started: String,
}

/// One issue as read from the tracker.
///
/// Kind-specific fields are optional: `epic_link` is set on tasks,
/// `parent_key` on subtasks, `epic_name` and `certification` on epics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub key: String,
    /// Issue-type display name.
    pub issue_type: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub project: Project,
    #[serde(default)]
    pub creator: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<CascadeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification: Option<CascadeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_platform: Option<String>,
}

impl WorkItem {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        issue_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            issue_type: issue_type.into(),
            summary: String::new(),
            project: Project::default(),
            creator: User::default(),
            assignee: None,
            status: WorkflowStatus::default(),
            labels: Vec::new(),
            components: Vec::new(),
            comments: Vec::new(),
            worklogs: Vec::new(),
            task_type: None,
            epic_link: None,
            parent_key: None,
            epic_name: None,
            certification: None,
            base_platform: None,
            other_platform: None,
        }
    }

    pub fn kind(&self) -> WorkItemKind {
        WorkItemKind::from_type_name(&self.issue_type)
    }

    pub fn is_task_like(&self) -> bool {
        self.kind().is_task_like()
    }

    /// Key of the item this one hangs under: the parent task for subtasks,
    /// the linked epic for other task-like items.
    pub fn parent_ref(&self) -> Option<&str> {
        match self.kind() {
            WorkItemKind::Subtask => self.parent_key.as_deref(),
            WorkItemKind::Task | WorkItemKind::TestTask | WorkItemKind::ManageTask => {
                self.epic_link.as_deref()
            }
            WorkItemKind::Epic | WorkItemKind::Other => None,
        }
    }

    /// `[KEY(type)]summary`
    pub fn info_string(&self) -> String {
        format!("[{}({})]{}", self.key, self.issue_type, self.summary)
    }

    /// Platform text: the base platform unless it is `Other`, in which case the
    /// free-text platform is used.
    pub fn platform(&self) -> Option<&str> {
        match self.base_platform.as_deref() {
            None | Some("Other") => self.other_platform.as_deref(),
            Some(base) => Some(base),
        }
    }

    /// The user a missing worklog is attributed to.
    pub fn responsible(&self) -> &User {
        self.assignee.as_ref().unwrap_or(&self.creator)
    }
}
