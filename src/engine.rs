//! Evaluation engine seam and its formualizer-backed implementation.
//!
//! The model never evaluates formulas itself. It writes labels, literals and
//! resolved formula text through [`Engine`] and reads evaluated values back.
//! Columns are zero-based (0 = A), rows are 1-based as in A1 notation.

use formualizer_eval::engine::named_range::{NameScope, NamedDefinition};
use formualizer_eval::reference::{CellRef, Coord};
use formualizer_workbook::{LiteralValue, Workbook};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub usize);

/// Content written into one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    Empty,
    Number(f64),
    Text(String),
    /// Formula text including the leading `=`.
    Formula(String),
}

/// An evaluated cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Error(e) => f.write_str(e),
        }
    }
}

impl From<LiteralValue> for Value {
    fn from(value: LiteralValue) -> Self {
        match value {
            LiteralValue::Empty => Value::Empty,
            LiteralValue::Int(i) => Value::Number(i as f64),
            LiteralValue::Number(n) => Value::Number(n),
            LiteralValue::Text(s) => Value::Text(s),
            LiteralValue::Boolean(b) => Value::Boolean(b),
            LiteralValue::Error(e) => Value::Error(format!("{}", e)),
            LiteralValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
            LiteralValue::DateTime(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            LiteralValue::Time(t) => Value::Text(t.format("%H:%M:%S").to_string()),
            LiteralValue::Duration(dur) => Value::Text(format!("{}s", dur.num_seconds())),
            LiteralValue::Array(_) => Value::Text(String::from("{...}")),
            LiteralValue::Pending => Value::Empty,
        }
    }
}

/// A rejection from the engine: unparseable formula, failed evaluation, bad sheet.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct EngineError(pub String);

pub trait Engine {
    fn add_sheet(&mut self, name: &str) -> Result<SheetId, EngineError>;

    fn write(&mut self, sheet: SheetId, col: u32, row: u32, input: CellInput)
        -> Result<(), EngineError>;

    /// Evaluated value of a cell; `Value::Empty` for untouched cells.
    fn value(&mut self, sheet: SheetId, col: u32, row: u32) -> Value;

    /// Formula text as written, or `None` for literal cells.
    fn formula_text(&self, sheet: SheetId, col: u32, row: u32) -> Option<String>;

    /// Define `name` as a workbook-scoped alias for one cell.
    fn add_named_expression(
        &mut self,
        name: &str,
        sheet: SheetId,
        col: u32,
        row: u32,
    ) -> Result<(), EngineError>;
}

/// [`Engine`] over an in-memory formualizer workbook.
pub struct FormualizerEngine {
    workbook: Workbook,
    sheet_names: Vec<String>,
    formulas: HashMap<(SheetId, u32, u32), String>,
}

impl Default for FormualizerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormualizerEngine {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheet_names: Vec::new(),
            formulas: HashMap::new(),
        }
    }

    fn sheet_name(&self, sheet: SheetId) -> Result<&str, EngineError> {
        self.sheet_names
            .get(sheet.0)
            .map(String::as_str)
            .ok_or_else(|| EngineError(format!("no sheet with id {}", sheet.0)))
    }
}

impl Engine for FormualizerEngine {
    fn add_sheet(&mut self, name: &str) -> Result<SheetId, EngineError> {
        if !self.workbook.has_sheet(name) {
            self.workbook
                .add_sheet(name)
                .map_err(|e| EngineError(format!("formualizer: {}", e)))?;
        }
        self.sheet_names.push(name.to_string());
        Ok(SheetId(self.sheet_names.len() - 1))
    }

    fn write(
        &mut self,
        sheet: SheetId,
        col: u32,
        row: u32,
        input: CellInput,
    ) -> Result<(), EngineError> {
        let name = self.sheet_name(sheet)?.to_string();
        let key = (sheet, col, row);
        match input {
            CellInput::Formula(formula) => {
                self.workbook
                    .set_formula(&name, row, col + 1, &formula)
                    .map_err(|e| EngineError(format!("formualizer: {}", e)))?;
                self.workbook
                    .evaluate_cell(&name, row, col + 1)
                    .map_err(|e| EngineError(format!("evaluation failed: {}", e)))?;
                self.formulas.insert(key, formula);
                return Ok(());
            }
            CellInput::Empty => {
                self.workbook.set_value(&name, row, col + 1, LiteralValue::Empty)
            }
            CellInput::Number(n) => {
                self.workbook.set_value(&name, row, col + 1, LiteralValue::Number(n))
            }
            CellInput::Text(s) => self.workbook.set_value(&name, row, col + 1, LiteralValue::Text(s)),
        }
        .map_err(|e| EngineError(format!("formualizer: {}", e)))?;
        self.formulas.remove(&key);
        Ok(())
    }

    fn value(&mut self, sheet: SheetId, col: u32, row: u32) -> Value {
        let Ok(name) = self.sheet_name(sheet).map(str::to_string) else {
            return Value::Empty;
        };
        if self.formulas.contains_key(&(sheet, col, row)) {
            if let Ok(v) = self.workbook.evaluate_cell(&name, row, col + 1) {
                return v.into();
            }
        }
        self.workbook
            .get_value(&name, row, col + 1)
            .map(Value::from)
            .unwrap_or(Value::Empty)
    }

    fn formula_text(&self, sheet: SheetId, col: u32, row: u32) -> Option<String> {
        self.formulas.get(&(sheet, col, row)).cloned()
    }

    fn add_named_expression(
        &mut self,
        name: &str,
        sheet: SheetId,
        col: u32,
        row: u32,
    ) -> Result<(), EngineError> {
        let sheet_name = self.sheet_name(sheet)?.to_string();
        let engine = self.workbook.engine_mut();
        let sheet_id = engine
            .sheet_id(&sheet_name)
            .ok_or_else(|| EngineError(format!("formualizer: no sheet named {}", sheet_name)))?;
        let cell = CellRef::new(sheet_id, Coord::new(row, col + 1, true, true));
        engine
            .define_name(name, NamedDefinition::Cell(cell), NameScope::Workbook)
            .map_err(|e| EngineError(format!("formualizer: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Number(40.0).to_string(), "40");
        assert_eq!(Value::Number(0.25).to_string(), "0.25");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(Value::Empty.to_string(), "");
        assert_eq!(Value::Number(f64::NAN).as_number(), None);
        assert_eq!(Value::Text("x".into()).as_number(), None);
    }

    #[test]
    fn test_named_expression_keeps_keywords_and_strings() {
        let mut engine = FormualizerEngine::new();
        let data = engine.add_sheet("Data").unwrap();
        engine.write(data, 1, 1, CellInput::Number(5.0)).unwrap();
        engine.add_named_expression("Assets", data, 1, 1).unwrap();
        engine
            .write(data, 1, 2, CellInput::Formula("=IF(TRUE, Assets, 2)".into()))
            .unwrap();
        engine
            .write(data, 1, 3, CellInput::Formula("=\"Assets\"".into()))
            .unwrap();

        assert_eq!(engine.value(data, 1, 2).as_number(), Some(5.0));
        assert_eq!(engine.value(data, 1, 3), Value::Text("Assets".into()));
        assert_eq!(
            engine.formula_text(data, 1, 2).as_deref(),
            Some("=IF(TRUE, Assets, 2)")
        );
        assert!(engine.add_named_expression("Assets", data, 1, 2).is_err());
    }

    #[test]
    fn test_write_and_evaluate() {
        let mut engine = FormualizerEngine::new();
        let sheet = engine.add_sheet("Data").unwrap();
        engine.write(sheet, 1, 1, CellInput::Number(10.0)).unwrap();
        engine.write(sheet, 1, 2, CellInput::Number(20.0)).unwrap();
        engine
            .write(sheet, 1, 3, CellInput::Formula("=B1+B2".into()))
            .unwrap();

        assert_eq!(engine.value(sheet, 1, 3).as_number(), Some(30.0));
        assert_eq!(engine.formula_text(sheet, 1, 3).as_deref(), Some("=B1+B2"));
        assert_eq!(engine.formula_text(sheet, 1, 1), None);
    }

    #[test]
    fn test_named_expression_across_sheets() {
        let mut engine = FormualizerEngine::new();
        let data = engine.add_sheet("Data").unwrap();
        let calc = engine.add_sheet("Calc").unwrap();
        engine.write(data, 1, 1, CellInput::Number(7.0)).unwrap();
        engine.add_named_expression("Units", data, 1, 1).unwrap();
        engine
            .write(calc, 1, 1, CellInput::Formula("=Units*3".into()))
            .unwrap();

        assert_eq!(engine.value(calc, 1, 1).as_number(), Some(21.0));
        assert_eq!(engine.formula_text(calc, 1, 1).as_deref(), Some("=Units*3"));
    }

    #[test]
    fn test_unknown_sheet_id() {
        let mut engine = FormualizerEngine::new();
        assert!(engine.write(SheetId(3), 0, 1, CellInput::Number(1.0)).is_err());
        assert!(engine.add_named_expression("Units", SheetId(3), 1, 1).is_err());
        assert_eq!(engine.value(SheetId(3), 0, 1), Value::Empty);
    }
}
