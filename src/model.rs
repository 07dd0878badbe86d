//! The workbook aggregate: sheets, their rows, the name registry and the
//! engine they are mirrored into.

use crate::engine::{CellInput, Engine, FormualizerEngine, SheetId, Value};
use crate::error::{Collision, Error, Result};
use crate::names::NameRegistry;
use crate::reference::{absolute_reference, Resolver, VALUE_COLUMN};
use crate::sheet::{Cell, Layout, RowKind, Sheet};
use std::ops::RangeInclusive;

/// What goes into column B of a data row.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    Empty,
    Number(f64),
    Text(String),
    /// Formula text with `{Name}` placeholders, including the leading `=`.
    Formula(String),
}

impl From<f64> for Content {
    fn from(n: f64) -> Self {
        Content::Number(n)
    }
}

impl From<i64> for Content {
    fn from(n: i64) -> Self {
        Content::Number(n as f64)
    }
}

impl From<i32> for Content {
    fn from(n: i32) -> Self {
        Content::Number(n as f64)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Content::Empty
        } else if s.starts_with('=') {
            Content::Formula(s.to_string())
        } else {
            Content::Text(s.to_string())
        }
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::from(s.as_str())
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Content::Empty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowOptions {
    /// Register the row under this name, usable as `{name}` in formulas.
    pub name: Option<String>,
}

impl RowOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// A financial model addressed by labels and names rather than coordinates.
pub struct SheetModel<E: Engine = FormualizerEngine> {
    pub(crate) engine: E,
    pub(crate) sheets: Vec<Sheet>,
    pub(crate) names: NameRegistry,
}

impl SheetModel<FormualizerEngine> {
    pub fn new() -> Self {
        Self::with_engine(FormualizerEngine::new())
    }
}

impl Default for SheetModel<FormualizerEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> SheetModel<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            sheets: Vec::new(),
            names: NameRegistry::default(),
        }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name() == name)
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub(crate) fn sheet_index(&self, name: &str) -> Result<usize> {
        self.sheets
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| Error::SheetNotFound {
                name: name.to_string(),
                available: self
                    .sheets
                    .iter()
                    .map(|s| s.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    pub fn add_sheet(&mut self, name: &str) -> Result<()> {
        self.create_sheet(name, Layout::Data)
    }

    pub(crate) fn create_sheet(&mut self, name: &str, layout: Layout) -> Result<()> {
        if self.sheet(name).is_some() {
            return Err(Error::DuplicateSheet(name.to_string()));
        }
        let id = self.engine.add_sheet(name).map_err(|e| Error::Engine {
            sheet: name.to_string(),
            row: 0,
            cell: String::new(),
            label: String::new(),
            message: e.0,
        })?;
        log::debug!("added sheet {} ({:?})", name, id);
        self.sheets.push(Sheet::new(id, name, layout));
        Ok(())
    }

    /// Append a labelled row to a data sheet and return its 1-based row number.
    ///
    /// Formula content is resolved and evaluated before anything is recorded:
    /// on failure the sheet, its row registry and the name registry are left
    /// exactly as they were.
    pub fn add_row(
        &mut self,
        sheet: &str,
        label: &str,
        content: impl Into<Content>,
        options: RowOptions,
    ) -> Result<u32> {
        self.append(sheet, label, content.into(), options.name, false)
    }

    pub fn add_blank(&mut self, sheet: &str) -> Result<u32> {
        self.append(sheet, "", Content::Empty, None, false)
    }

    /// A bold label with no value. Never a reference target.
    pub fn add_section(&mut self, sheet: &str, label: &str) -> Result<u32> {
        self.append(sheet, label, Content::Empty, None, true)
    }

    fn append(
        &mut self,
        sheet: &str,
        label: &str,
        content: Content,
        name: Option<String>,
        section: bool,
    ) -> Result<u32> {
        let idx = self.sheet_index(sheet)?;
        let current = &self.sheets[idx];
        let row = current.next_row();
        let id = current.id();
        let cell = format!("{}{}", VALUE_COLUMN, row);

        if let Some(name) = &name {
            self.names.check(name)?;
            if let Some(existing) = current.row_of(name) {
                return Err(Error::NameCollision {
                    name: name.clone(),
                    reason: Collision::AlreadyRegistered {
                        existing: absolute_reference(sheet, existing),
                    },
                });
            }
        }

        let resolved = match content {
            Content::Empty => Cell::Empty,
            Content::Number(n) => Cell::Number(n),
            Content::Text(s) => Cell::Text(s),
            Content::Formula(source) => {
                let resolver = Resolver::new(&self.sheets, &self.names);
                let resolved = resolver.resolve(&source, current)?;
                Cell::Formula { source, resolved }
            }
        };

        let engine_error = |message: String| Error::Engine {
            sheet: sheet.to_string(),
            row,
            cell: cell.clone(),
            label: label.to_string(),
            message,
        };

        let input = match &resolved {
            Cell::Empty => None,
            Cell::Number(n) => Some(CellInput::Number(*n)),
            Cell::Text(s) => Some(CellInput::Text(s.clone())),
            Cell::Formula { resolved, .. } => Some(CellInput::Formula(resolved.clone())),
        };
        if let Some(input) = input {
            if let Err(e) = self.engine.write(id, 1, row, input) {
                self.clear_row(idx, row);
                return Err(engine_error(e.0));
            }
        }
        if !label.is_empty() {
            if let Err(e) = self.engine.write(id, 0, row, CellInput::Text(label.to_string())) {
                self.clear_row(idx, row);
                return Err(engine_error(e.0));
            }
        }

        let reference = absolute_reference(sheet, row);
        if let Some(name) = &name {
            if let Err(e) = self.engine.add_named_expression(name, id, 1, row) {
                self.clear_row(idx, row);
                return Err(engine_error(e.0));
            }
            self.names.register(name, &reference)?;
        }

        let kind = if section {
            RowKind::Section
        } else {
            RowKind::Data(resolved)
        };
        let number = self.sheets[idx].push_row(label.to_string(), name, kind);
        log::debug!("{}!{} <- {:?}", sheet, cell, label);
        Ok(number)
    }

    /// Best-effort reset of a row the engine partially accepted.
    fn clear_row(&mut self, idx: usize, row: u32) {
        let id = self.sheets[idx].id();
        let columns = self.sheets[idx].value_columns();
        self.clear_cells(id, columns, row..=row);
    }

    /// Best-effort reset of a block of engine cells, label column included.
    pub(crate) fn clear_cells(&mut self, id: SheetId, columns: u32, rows: RangeInclusive<u32>) {
        for row in rows {
            for col in 0..=columns {
                let _ = self.engine.write(id, col, row, CellInput::Empty);
            }
        }
    }

    /// Evaluated value of a named row (column B, the first scenario column on
    /// scenario sheets).
    pub fn value(&mut self, sheet: &str, name: &str) -> Result<Value> {
        self.scenario_value(sheet, 0, name)
    }

    /// Evaluated value of a named row in scenario column `scenario` (0-based).
    pub fn scenario_value(&mut self, sheet: &str, scenario: u32, name: &str) -> Result<Value> {
        let idx = self.sheet_index(sheet)?;
        let s = &self.sheets[idx];
        let row = s.row_of(name).ok_or_else(|| Error::UnknownReference {
            placeholder: format!("{{{}}}", name),
            sheet: sheet.to_string(),
            formula: None,
        })?;
        let id = s.id();
        Ok(self.engine.value(id, scenario + 1, row))
    }

    /// Evaluated value at a zero-based column and 1-based row.
    pub fn cell_value(&mut self, sheet: &str, col: u32, row: u32) -> Result<Value> {
        let idx = self.sheet_index(sheet)?;
        let id = self.sheets[idx].id();
        Ok(self.engine.value(id, col, row))
    }
}
