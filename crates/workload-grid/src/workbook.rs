use serde::{Deserialize, Serialize};

use crate::{Grid, GridError};

/// Ordered collection of uniquely named grids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    sheets: Vec<Grid>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&self) -> &[Grid] {
        &self.sheets
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Append a sheet; names are compared case-insensitively.
    pub fn add_sheet(&mut self, sheet: Grid) -> Result<(), GridError> {
        if self.sheet(sheet.name()).is_some() {
            return Err(GridError::DuplicateSheet(sheet.name().to_string()));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    pub fn sheet(&self, name: &str) -> Option<&Grid> {
        self.sheets
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    pub fn sheet_at(&self, index: usize) -> Option<&Grid> {
        self.sheets.get(index)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Grid::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheet_names_are_unique() {
        let mut wb = Workbook::new();
        wb.add_sheet(Grid::new("Test")).unwrap();
        wb.add_sheet(Grid::new("Manage")).unwrap();
        assert_eq!(
            wb.add_sheet(Grid::new("test")),
            Err(GridError::DuplicateSheet("test".into()))
        );
        assert_eq!(wb.sheet_names(), vec!["Test", "Manage"]);
        assert_eq!(wb.sheet_at(1).map(Grid::name), Some("Manage"));
        assert!(wb.sheet("MANAGE").is_some());
    }
}
