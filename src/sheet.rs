//! Per-sheet row bookkeeping.
//!
//! A sheet hands out 1-based row numbers strictly in sequence and never
//! reuses one. Named rows are indexed so formulas can address them.

use crate::engine::SheetId;
use crate::format::{Thresholds, ValueFormat};
use std::collections::HashMap;

/// Column-B content of a data row, after placeholder resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Formula { source: String, resolved: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// A row of a data sheet: label in A, content in B.
    Data(Cell),
    /// Bold label, no values, never a reference target.
    Section,
    /// Scenario input: one literal per scenario column.
    Input { values: Vec<f64> },
    /// Scenario output: one resolved formula per scenario column.
    Output {
        formulas: Vec<String>,
        format: ValueFormat,
        thresholds: Option<Thresholds>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    label: String,
    number: u32,
    name: Option<String>,
    kind: RowKind,
}

impl Row {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// 1-based row number in the sheet.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> &RowKind {
        &self.kind
    }

    pub fn is_blank(&self) -> bool {
        self.label.is_empty() && matches!(self.kind, RowKind::Data(Cell::Empty))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    /// Label column plus a single value column.
    Data,
    /// Header row of scenario labels, one value column per scenario.
    Scenario { labels: Vec<String> },
}

impl Layout {
    pub fn scenario<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Layout::Scenario {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Row 1 of a scenario sheet is its header.
    fn first_row(&self) -> u32 {
        match self {
            Layout::Data => 1,
            Layout::Scenario { .. } => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    id: SheetId,
    name: String,
    layout: Layout,
    rows: Vec<Row>,
    row_index: HashMap<String, u32>,
    next_row: u32,
}

impl Sheet {
    pub fn new(id: SheetId, name: &str, layout: Layout) -> Self {
        let next_row = layout.first_row();
        Self {
            id,
            name: name.to_string(),
            layout,
            rows: Vec::new(),
            row_index: HashMap::new(),
            next_row,
        }
    }

    pub fn id(&self) -> SheetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The row number the next append will receive.
    pub fn next_row(&self) -> u32 {
        self.next_row
    }

    pub fn row_of(&self, name: &str) -> Option<u32> {
        self.row_index.get(name).copied()
    }

    pub fn row(&self, number: u32) -> Option<&Row> {
        self.rows.iter().find(|r| r.number == number)
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.row_of(name)
            .and_then(|n| self.row(n))
            .is_some_and(|r| matches!(r.kind, RowKind::Input { .. }))
    }

    /// A sheet built by the scenario builder, or holding any input row.
    pub fn is_scenario(&self) -> bool {
        matches!(self.layout, Layout::Scenario { .. })
            || self.rows.iter().any(|r| matches!(r.kind, RowKind::Input { .. }))
    }

    pub fn scenario_labels(&self) -> &[String] {
        match &self.layout {
            Layout::Scenario { labels } => labels,
            Layout::Data => &[],
        }
    }

    /// Number of value columns after the label column.
    pub fn value_columns(&self) -> u32 {
        match &self.layout {
            Layout::Data => 1,
            Layout::Scenario { labels } => labels.len() as u32,
        }
    }

    /// Append a row and index its name. Callers validate the name first.
    pub(crate) fn push_row(&mut self, label: String, name: Option<String>, kind: RowKind) -> u32 {
        let number = self.next_row;
        self.next_row += 1;
        if let Some(name) = &name {
            self.row_index.insert(name.clone(), number);
        }
        self.rows.push(Row {
            label,
            number,
            name,
            kind,
        });
        number
    }

    /// Bind a sheet laid out ahead of time to the engine sheet it was written to.
    pub(crate) fn assign_id(&mut self, id: SheetId) {
        self.id = id;
    }

    pub(crate) fn push_blank(&mut self) -> u32 {
        self.push_row(String::new(), None, RowKind::Data(Cell::Empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_sequential_from_one() {
        let mut sheet = Sheet::new(SheetId(0), "Data", Layout::Data);
        let numbers: Vec<u32> = (0..5)
            .map(|i| sheet.push_row(format!("r{}", i), None, RowKind::Data(Cell::Number(i as f64))))
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(sheet.next_row(), 6);
    }

    #[test]
    fn test_blank_rows_consume_numbers() {
        let mut sheet = Sheet::new(SheetId(0), "Data", Layout::Data);
        assert_eq!(sheet.push_blank(), 1);
        assert_eq!(sheet.push_row("Section".into(), None, RowKind::Section), 2);
        assert_eq!(sheet.push_blank(), 3);
        assert!(sheet.rows()[0].is_blank());
        assert!(!sheet.rows()[1].is_blank());
    }

    #[test]
    fn test_scenario_layout_starts_below_header() {
        let mut sheet = Sheet::new(SheetId(2), "Scen", Layout::scenario(["Base", "Stress"]));
        assert_eq!(sheet.value_columns(), 2);
        assert_eq!(sheet.scenario_labels(), ["Base", "Stress"]);
        let row = sheet.push_row(
            "Rate".into(),
            Some("Rate".into()),
            RowKind::Input {
                values: vec![0.1, 0.3],
            },
        );
        assert_eq!(row, 2);
        assert!(sheet.is_input("Rate"));
        assert!(sheet.is_scenario());
        assert_eq!(sheet.row_of("Rate"), Some(2));
    }

    #[test]
    fn test_name_lookup() {
        let mut sheet = Sheet::new(SheetId(0), "Data", Layout::Data);
        sheet.push_row("Assets".into(), Some("Assets".into()), RowKind::Data(Cell::Number(100.0)));
        assert_eq!(sheet.row_of("Assets"), Some(1));
        assert_eq!(sheet.row_of("Liabilities"), None);
        assert!(!sheet.is_input("Assets"));
        assert!(!sheet.is_scenario());
        assert_eq!(sheet.row(1).map(|r| r.label()), Some("Assets"));
    }
}
