//! `workload-matrix` maps issue-tracker work items onto the cells of labelled
//! reference tables and aggregates their logged time per cell.
//!
//! A load runs in one pass: items are cached in an [`IssueRepository`], items
//! that are not leaves are skipped, each remaining item is classified into a
//! [`CoordinateGroup`], the group is resolved against its [`ReferenceTable`]
//! and the item's worklogs are attributed to the resolved cells. The result
//! is exported as per-table count/time sheets and a flat worklog table; a
//! separate comments report lists the latest comments of any item batch.

mod aggregation;
mod classifier;
mod comments;
mod config;
mod coordinate;
mod export;
mod issue;
mod repository;
mod resolver;

pub use aggregation::{
    AggregationCell, ItemStatus, LoadReport, ReferenceTables, StatusKind, TableError,
    WorkItemRecord, Workload, WorkloadMatrix, EMPTY_WORKLOG_COMMENT,
};
pub use classifier::{classify, Classification, CoordinateError, ReferenceTable};
pub use comments::{clean_text, comments_grid, comments_table, CommentRow, CommentWindow};
pub use config::{
    AttributionPolicy, ConfigError, CoordinateLabels, ExportOptions, MatrixConfig, WorkloadUnit,
};
pub use coordinate::{
    Coordinate, CoordinateGroup, CoordinateSet, CoordinateValue, DimSpec, DimValue,
};
pub use export::{matrix_workbook, worklog_grid, worklog_table, WorklogRow, NO_TASK};
pub use issue::{
    CascadeValue, Comment, Project, StatusCategory, User, WorkItem, WorkItemKind, WorkflowStatus,
    Worklog,
};
pub use repository::{
    IssueRepository, IssueSource, LookupStats, ParentChain, ParentLevel, ParentLookupError,
    SourceError, StaticIssueSource,
};
pub use resolver::{CoordinateResolver, GroupMismatch, ResolvedSet, SetMismatch};
