use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::issue::{WorkItem, WorkItemKind};

/// Errors raised by an [`IssueSource`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("issue {0} does not exist")]
    NotFound(String),
    #[error("issue source unavailable: {0}")]
    Unavailable(String),
    #[error("malformed issue data: {0}")]
    Malformed(String),
}

/// Boundary to the external issue tracker.
pub trait IssueSource {
    /// Fetch one issue by key (`PROJ-12`) or numeric id.
    fn fetch(&self, key_or_id: &str) -> Result<WorkItem, SourceError>;
}

impl<S: IssueSource + ?Sized> IssueSource for &S {
    fn fetch(&self, key_or_id: &str) -> Result<WorkItem, SourceError> {
        (**self).fetch(key_or_id)
    }
}

/// In-memory issue source.
#[derive(Clone, Debug, Default)]
pub struct StaticIssueSource {
    items: Vec<WorkItem>,
}

impl StaticIssueSource {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items }
    }

    /// Load a JSON array of issues.
    pub fn from_json_str(json: &str) -> Result<Self, SourceError> {
        let items = serde_json::from_str(json).map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IssueSource for StaticIssueSource {
    fn fetch(&self, key_or_id: &str) -> Result<WorkItem, SourceError> {
        self.items
            .iter()
            .find(|item| item.key == key_or_id || item.id == key_or_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(key_or_id.to_string()))
    }
}

/// Which link of the parent chain failed to resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParentLevel {
    Task,
    Epic,
}

impl fmt::Display for ParentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParentLevel::Task => "Task",
            ParentLevel::Epic => "Epic",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("getting issue [{}({level})] failed, because: {reason}", .key.as_deref().unwrap_or("None"))]
pub struct ParentLookupError {
    /// Key that was looked up; `None` when the item carries no link at all.
    pub key: Option<String>,
    pub level: ParentLevel,
    pub reason: String,
}

impl ParentLookupError {
    fn new(key: Option<&str>, level: ParentLevel, reason: impl Into<String>) -> Self {
        Self {
            key: key.map(str::to_string),
            level,
            reason: reason.into(),
        }
    }
}

/// Resolved parents of a task-like item.
///
/// `task` is the item itself for tasks, the parent task for subtasks, and
/// `None` for subtasks filed directly under an epic.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentChain {
    pub task: Option<Arc<WorkItem>>,
    pub epic: Arc<WorkItem>,
}

/// Call counters of an [`IssueRepository`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Number of `find_item` calls.
    pub find_calls: usize,
    /// Number of calls that reached the source.
    pub source_calls: usize,
}

impl fmt::Display for LookupStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "find calls: {}, source calls: {}",
            self.find_calls, self.source_calls
        )
    }
}

/// Issue cache in front of an [`IssueSource`].
///
/// The cache is consulted by key and by id before the source is called, and
/// every fetched issue is cached.
#[derive(Debug)]
pub struct IssueRepository<S> {
    source: S,
    items: Vec<Arc<WorkItem>>,
    by_key: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    stats: LookupStats,
}

impl<S: IssueSource> IssueRepository<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            items: Vec::new(),
            by_key: HashMap::new(),
            by_id: HashMap::new(),
            stats: LookupStats::default(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    fn insert(&mut self, item: WorkItem) -> Arc<WorkItem> {
        if let Some(&idx) = self.by_key.get(&item.key) {
            return Arc::clone(&self.items[idx]);
        }
        let idx = self.items.len();
        self.by_key.insert(item.key.clone(), idx);
        self.by_id.entry(item.id.clone()).or_insert(idx);
        let item = Arc::new(item);
        self.items.push(Arc::clone(&item));
        item
    }

    /// Cache a batch, returning shared handles in input order.
    ///
    /// An item whose key is already cached keeps the cached copy.
    pub fn add_cache<I>(&mut self, items: I) -> Vec<Arc<WorkItem>>
    where
        I: IntoIterator<Item = WorkItem>,
    {
        items.into_iter().map(|item| self.insert(item)).collect()
    }

    fn cached(&self, key_or_id: &str) -> Option<Arc<WorkItem>> {
        self.by_key
            .get(key_or_id)
            .or_else(|| self.by_id.get(key_or_id))
            .map(|&idx| Arc::clone(&self.items[idx]))
    }

    pub fn find_item(&mut self, key_or_id: &str) -> Result<Arc<WorkItem>, SourceError> {
        self.stats.find_calls += 1;
        if let Some(item) = self.cached(key_or_id) {
            return Ok(item);
        }
        self.stats.source_calls += 1;
        log::debug!("fetching issue {key_or_id} from source");
        let item = self.source.fetch(key_or_id)?;
        Ok(self.insert(item))
    }

    /// Resolve the task and epic an item belongs to.
    pub fn find_parent_chain(&mut self, item: &Arc<WorkItem>) -> Result<ParentChain, ParentLookupError> {
        let parent = if item.kind() == WorkItemKind::Subtask {
            let key = item.parent_key.as_deref();
            let Some(key) = key else {
                return Err(ParentLookupError::new(
                    None,
                    ParentLevel::Task,
                    "subtask has no parent key",
                ));
            };
            self.find_item(key)
                .map_err(|e| ParentLookupError::new(Some(key), ParentLevel::Task, e.to_string()))?
        } else {
            Arc::clone(item)
        };

        if parent.kind() == WorkItemKind::Epic {
            return Ok(ParentChain {
                task: None,
                epic: parent,
            });
        }

        let Some(link) = parent.epic_link.as_deref() else {
            return Err(ParentLookupError::new(
                None,
                ParentLevel::Epic,
                format!("{} has no epic link", parent.key),
            ));
        };
        let epic = self
            .find_item(link)
            .map_err(|e| ParentLookupError::new(Some(link), ParentLevel::Epic, e.to_string()))?;
        if epic.kind() != WorkItemKind::Epic {
            return Err(ParentLookupError::new(
                Some(link),
                ParentLevel::Epic,
                format!("linked issue is a {}, not an epic", epic.issue_type),
            ));
        }
        Ok(ParentChain {
            task: Some(parent),
            epic,
        })
    }
}
