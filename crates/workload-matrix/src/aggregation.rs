use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use workload_grid::{GridError, LabelledGrid, OriginPoint, ValueMatrix, Workbook};

use crate::classifier::{classify, ReferenceTable};
use crate::config::MatrixConfig;
use crate::coordinate::Coordinate;
use crate::issue::{WorkItem, Worklog};
use crate::repository::{IssueRepository, IssueSource, LookupStats, ParentChain};
use crate::resolver::CoordinateResolver;

/// Comment of the placeholder worklog of an item nobody logged time on.
pub const EMPTY_WORKLOG_COMMENT: &str = "# EmptyWorklog";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Processing state of one work item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Skipped(String),
    Success(String),
    Failed(String),
}

/// [`ItemStatus`] without its detail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatusKind {
    Pending,
    Skipped,
    Success,
    Failed,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusKind::Pending => "Pending",
            StatusKind::Skipped => "Skipped",
            StatusKind::Success => "Success",
            StatusKind::Failed => "Failed",
        })
    }
}

impl ItemStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            ItemStatus::Pending => StatusKind::Pending,
            ItemStatus::Skipped(_) => StatusKind::Skipped,
            ItemStatus::Success(_) => StatusKind::Success,
            ItemStatus::Failed(_) => StatusKind::Failed,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ItemStatus::Pending => "",
            ItemStatus::Skipped(d) | ItemStatus::Success(d) | ItemStatus::Failed(d) => d,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Pending)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Pending => f.write_str("Pending"),
            _ => write!(f, "{}: {}", self.kind(), self.detail()),
        }
    }
}

/// A work item of the batch and what became of it.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkItemRecord {
    item: Arc<WorkItem>,
    status: ItemStatus,
}

impl WorkItemRecord {
    pub fn new(item: Arc<WorkItem>) -> Self {
        Self {
            item,
            status: ItemStatus::Pending,
        }
    }

    pub fn item(&self) -> &Arc<WorkItem> {
        &self.item
    }

    pub fn status(&self) -> &ItemStatus {
        &self.status
    }

    /// Move a pending record to `status`. Terminal records never change;
    /// returns whether the transition applied.
    pub fn transition(&mut self, status: ItemStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }
}

/// One worklog attributed to one aggregation cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Workload {
    pub item: Arc<WorkItem>,
    pub chain: ParentChain,
    pub worklog: Worklog,
    /// Placeholder for an item without worklogs.
    pub empty: bool,
    /// Share of the worklog attributed to the cell.
    pub rate: f64,
}

impl Workload {
    /// Zero-second workload charged to the item's assignee, or its creator.
    pub fn empty(item: Arc<WorkItem>, chain: ParentChain, rate: f64) -> Self {
        let worklog = Worklog {
            id: String::new(),
            author: item.responsible().clone(),
            comment: EMPTY_WORKLOG_COMMENT.to_string(),
            seconds: 0,
            started: String::new(),
        };
        Self {
            item,
            chain,
            worklog,
            empty: true,
            rate,
        }
    }

    pub fn person_hours(&self) -> f64 {
        self.rate * self.worklog.seconds as f64 / SECONDS_PER_HOUR
    }

    pub fn person_days(&self, hours_per_day: f64) -> f64 {
        self.person_hours() / hours_per_day
    }
}

/// Workloads accumulated on one reference-table cell.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregationCell {
    pub table: ReferenceTable,
    /// `(row, col)` in the table's value region.
    pub index: (usize, usize),
    pub coordinate: Coordinate,
    /// Standard value held by the reference cell.
    pub standard: f64,
    pub workloads: Vec<Workload>,
}

impl AggregationCell {
    /// Number of distinct work items with a workload here.
    pub fn num_items(&self) -> usize {
        self.workloads
            .iter()
            .map(|w| w.item.key.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of real worklogs, placeholders excluded.
    pub fn num_worklogs(&self) -> usize {
        self.workloads.iter().filter(|w| !w.empty).count()
    }

    pub fn cumulative_hours(&self) -> f64 {
        self.workloads.iter().map(Workload::person_hours).sum()
    }

    /// Cumulative workload in the configured unit.
    pub fn cumulative(&self, config: &MatrixConfig) -> f64 {
        config.in_unit(self.cumulative_hours())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("reference workbook has no sheet #{index} for the {table} table")]
    MissingSheet { index: usize, table: ReferenceTable },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// The reference tables items resolve against.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceTables {
    pub test: LabelledGrid,
    pub manage: LabelledGrid,
    pub generic: Option<LabelledGrid>,
}

impl ReferenceTables {
    pub fn new(test: LabelledGrid, manage: LabelledGrid) -> Self {
        Self {
            test,
            manage,
            generic: None,
        }
    }

    #[must_use]
    pub fn with_generic(mut self, generic: LabelledGrid) -> Self {
        self.generic = Some(generic);
        self
    }

    pub fn get(&self, table: ReferenceTable) -> Option<&LabelledGrid> {
        match table {
            ReferenceTable::Test => Some(&self.test),
            ReferenceTable::Manage => Some(&self.manage),
            ReferenceTable::Generic => self.generic.as_ref(),
        }
    }

    /// Tables present, in [`ReferenceTable::ALL`] order.
    pub fn loaded(&self) -> impl Iterator<Item = (ReferenceTable, &LabelledGrid)> + '_ {
        ReferenceTable::ALL
            .into_iter()
            .filter_map(|table| self.get(table).map(|grid| (table, grid)))
    }

    /// Sheet 1 is the test table, sheet 2 the management table and an
    /// optional sheet 3 the generic table.
    pub fn from_workbook(workbook: &Workbook, origin: OriginPoint) -> Result<Self, TableError> {
        let sheet = |index: usize, table: ReferenceTable| {
            workbook
                .sheet_at(index)
                .ok_or(TableError::MissingSheet { index: index + 1, table })
        };
        let test = LabelledGrid::new(sheet(0, ReferenceTable::Test)?, origin)?;
        let manage = LabelledGrid::new(sheet(1, ReferenceTable::Manage)?, origin)?;
        let mut tables = Self::new(test, manage);
        if let Some(generic) = workbook.sheet_at(2) {
            tables.generic = Some(LabelledGrid::new(generic, origin)?);
        }
        Ok(tables)
    }
}

/// Per-status counts and per-item outcome of one load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub counts: BTreeMap<StatusKind, usize>,
    /// `(item info, status)` in batch order.
    pub items: Vec<(String, ItemStatus)>,
}

impl LoadReport {
    pub fn count(&self, kind: StatusKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loaded {} work items:", self.items.len())?;
        for (kind, count) in &self.counts {
            write!(f, " {kind}={count}")?;
        }
        for (info, status) in &self.items {
            write!(f, "\n  {info} {status}")?;
        }
        Ok(())
    }
}

/// Workloads of a batch of work items mapped onto reference-table cells.
#[derive(Clone, Debug)]
pub struct WorkloadMatrix {
    config: MatrixConfig,
    tables: ReferenceTables,
    records: Vec<WorkItemRecord>,
    cells: Vec<AggregationCell>,
    cell_index: HashMap<(ReferenceTable, Coordinate), usize>,
    lookup_stats: LookupStats,
}

impl WorkloadMatrix {
    /// Process `items` and attribute their worklogs to reference cells.
    ///
    /// Every item ends `Skipped`, `Success` or `Failed`; per-item failures
    /// never abort the batch.
    pub fn load<S, I>(
        items: I,
        repository: &mut IssueRepository<S>,
        tables: ReferenceTables,
        config: MatrixConfig,
    ) -> Self
    where
        S: IssueSource,
        I: IntoIterator<Item = WorkItem>,
    {
        let records: Vec<WorkItemRecord> = repository
            .add_cache(items)
            .into_iter()
            .map(WorkItemRecord::new)
            .collect();
        log::info!("loading {} work items", records.len());

        let mut matrix = Self {
            config,
            tables,
            records,
            cells: Vec::new(),
            cell_index: HashMap::new(),
            lookup_stats: LookupStats::default(),
        };
        matrix.skip_non_leaves();
        for idx in 0..matrix.records.len() {
            if matrix.records[idx].status.is_terminal() {
                continue;
            }
            let item = Arc::clone(&matrix.records[idx].item);
            let status = matrix.resolve_one(&item, repository);
            log::debug!("{} {status}", item.info_string());
            matrix.records[idx].transition(status);
        }

        assert!(
            matrix.records.iter().all(|r| r.status.is_terminal()),
            "work item left pending after load"
        );
        matrix.lookup_stats = repository.stats();
        log::info!("{}", matrix.report());
        log::info!("issue lookups: {}", matrix.lookup_stats);
        matrix
    }

    /// Skip repeated keys, items that are not task-like, then items with a
    /// child in the batch.
    fn skip_non_leaves(&mut self) {
        let mut seen = HashSet::new();
        let first: Vec<bool> = self
            .records
            .iter()
            .map(|record| seen.insert(record.item.key.as_str()))
            .collect();

        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for (idx, record) in self.records.iter().enumerate() {
            if !first[idx] || !record.item.is_task_like() {
                continue;
            }
            if let Some(parent) = record.item.parent_ref() {
                children.entry(parent).or_default().push(record.item.key.as_str());
            }
        }
        let mut updates = Vec::new();
        for (idx, record) in self.records.iter().enumerate() {
            let item = &record.item;
            if !first[idx] {
                updates.push((idx, ItemStatus::Skipped(format!("duplicate of: {}", item.key))));
                continue;
            }
            if !item.is_task_like() {
                updates.push((
                    idx,
                    ItemStatus::Skipped(format!("not task-like: {}", item.issue_type)),
                ));
                continue;
            }
            let keys = children
                .get(item.key.as_str())
                .or_else(|| children.get(item.id.as_str()));
            if let Some(keys) = keys {
                updates.push((
                    idx,
                    ItemStatus::Skipped(format!("parent of: {}", keys.join(", "))),
                ));
            }
        }
        for (idx, status) in updates {
            self.records[idx].transition(status);
        }
    }

    fn resolve_one<S: IssueSource>(
        &mut self,
        item: &Arc<WorkItem>,
        repository: &mut IssueRepository<S>,
    ) -> ItemStatus {
        let chain = match repository.find_parent_chain(item) {
            Ok(chain) => chain,
            Err(e) => return ItemStatus::Failed(e.to_string()),
        };
        let classification = match classify(item, &chain, &self.config.labels) {
            Ok(c) => c,
            Err(e) => return ItemStatus::Failed(e.to_string()),
        };
        let table = classification.table;
        let Some(grid) = self.tables.get(table) else {
            return ItemStatus::Failed(format!("no {table} reference table loaded"));
        };
        let resolved = match CoordinateResolver::new(grid).resolve_group(&classification.group) {
            Ok(resolved) => resolved,
            Err(e) => return ItemStatus::Failed(format!("unresolved in {table} table: {e}")),
        };

        let standards: Vec<f64> = resolved.cells.iter().map(|(_, cell)| cell.value()).collect();
        let rates = self.config.attribution.rates(&standards);
        let mut labels = Vec::with_capacity(resolved.cells.len());
        for ((coordinate, located), rate) in resolved.cells.into_iter().zip(rates) {
            labels.push(coordinate.to_string());
            let cell = self.cell_mut(table, coordinate, located.index(), located.value());
            if item.worklogs.is_empty() {
                cell.workloads
                    .push(Workload::empty(Arc::clone(item), chain.clone(), rate));
            } else {
                cell.workloads.extend(item.worklogs.iter().map(|worklog| Workload {
                    item: Arc::clone(item),
                    chain: chain.clone(),
                    worklog: worklog.clone(),
                    empty: false,
                    rate,
                }));
            }
        }

        let detail = format!("Coordinate(s): {}", labels.join(" & "));
        ItemStatus::Success(match resolved.label {
            Some(label) => format!("{label} {detail}"),
            None => detail,
        })
    }

    fn cell_mut(
        &mut self,
        table: ReferenceTable,
        coordinate: Coordinate,
        index: (usize, usize),
        standard: f64,
    ) -> &mut AggregationCell {
        let cells = &mut self.cells;
        let idx = *self
            .cell_index
            .entry((table, coordinate.clone()))
            .or_insert_with(|| {
                cells.push(AggregationCell {
                    table,
                    index,
                    coordinate,
                    standard,
                    workloads: Vec::new(),
                });
                cells.len() - 1
            });
        &mut self.cells[idx]
    }

    /// Matrix shaped like `table`'s value region holding `property` of each
    /// cell; cells without workload are zero. `None` when the table is absent.
    pub fn build_matrix<F>(&self, table: ReferenceTable, property: F) -> Option<ValueMatrix>
    where
        F: Fn(&AggregationCell) -> f64,
    {
        let grid = self.tables.get(table)?;
        let (rows, cols) = grid.value_shape();
        let mut matrix = ValueMatrix::zeros(rows, cols);
        for cell in self.cells.iter().filter(|c| c.table == table) {
            let (row, col) = cell.index;
            matrix.add(row, col, property(cell));
        }
        Some(matrix)
    }

    pub fn records(&self) -> &[WorkItemRecord] {
        &self.records
    }

    pub fn record(&self, key: &str) -> Option<&WorkItemRecord> {
        self.records.iter().find(|r| r.item.key == key)
    }

    /// Cells in creation order.
    pub fn cells(&self) -> &[AggregationCell] {
        &self.cells
    }

    pub fn cell(&self, table: ReferenceTable, coordinate: &Coordinate) -> Option<&AggregationCell> {
        self.cell_index
            .get(&(table, coordinate.clone()))
            .map(|&idx| &self.cells[idx])
    }

    pub fn count(&self, kind: StatusKind) -> usize {
        self.records.iter().filter(|r| r.status.kind() == kind).count()
    }

    pub fn report(&self) -> LoadReport {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.status.kind()).or_insert(0) += 1;
        }
        LoadReport {
            counts,
            items: self
                .records
                .iter()
                .map(|r| (r.item.info_string(), r.status.clone()))
                .collect(),
        }
    }

    pub fn lookup_stats(&self) -> LookupStats {
        self.lookup_stats
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }
}
