//! Scenario comparison sheets.
//!
//! A scenario sheet has three bands: a header row of scenario labels, one row
//! per input with a literal per scenario column, then (after a blank row) one
//! row per output whose template is instantiated once per scenario column.
//! Rows are laid out strictly in the order given; a template may only refer to
//! inputs, workbook names, and outputs placed above it.

use crate::engine::{CellInput, Engine, SheetId};
use crate::error::{Collision, Error, Result};
use crate::format::{Thresholds, ValueFormat};
use crate::model::SheetModel;
use crate::names::check_reserved;
use crate::reference::{column_letter, Resolver};
use crate::sheet::{Layout, Row, RowKind, Sheet};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioInput {
    pub name: String,
    pub label: String,
}

impl ScenarioInput {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    pub label: String,
    /// Input name to value. Inputs missing here evaluate as 0 in this scenario.
    #[serde(default)]
    pub values: HashMap<String, f64>,
}

impl Scenario {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: HashMap::new(),
        }
    }

    pub fn value(mut self, input: impl Into<String>, value: f64) -> Self {
        self.values.insert(input.into(), value);
        self
    }

    /// Value of `input` in this scenario. Absent inputs default to 0.
    pub fn value_of(&self, input: &str) -> f64 {
        self.values.get(input).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioOutput {
    pub label: String,
    /// Template such as `={Revenue} * {Margin}`. `None` makes a section header.
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub format: ValueFormat,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
}

impl ScenarioOutput {
    pub fn new(label: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            formula: Some(formula.into()),
            format: ValueFormat::default(),
            name: None,
            thresholds: None,
        }
    }

    pub fn section(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            formula: None,
            format: ValueFormat::default(),
            name: None,
            thresholds: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub inputs: Vec<ScenarioInput>,
    pub scenarios: Vec<Scenario>,
    #[serde(default)]
    pub outputs: Vec<ScenarioOutput>,
}

/// An output as placed on the sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedOutput {
    pub output: ScenarioOutput,
    pub row: u32,
}

/// Where the builder put everything.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioLayout {
    pub inputs: BTreeMap<String, u32>,
    pub outputs: Vec<PlacedOutput>,
}

fn check_row_name(sheet: &Sheet, name: &str) -> Result<()> {
    check_reserved(name)?;
    match sheet.row_of(name) {
        Some(row) => Err(Error::NameCollision {
            name: name.to_string(),
            reason: Collision::AlreadyRegistered {
                existing: format!("{}!{}", sheet.name(), row),
            },
        }),
        None => Ok(()),
    }
}

impl<E: Engine> SheetModel<E> {
    /// Build a scenario comparison sheet in one call.
    ///
    /// The whole sheet is laid out and every template resolved before the
    /// engine sees any of it; a resolution error leaves the model untouched.
    pub fn add_scenario_sheet(&mut self, name: &str, config: &ScenarioConfig) -> Result<ScenarioLayout> {
        if self.sheet(name).is_some() {
            return Err(Error::DuplicateSheet(name.to_string()));
        }

        let labels: Vec<&str> = config.scenarios.iter().map(|s| s.label.as_str()).collect();
        let mut sheet = Sheet::new(SheetId(usize::MAX), name, Layout::scenario(labels));
        let mut layout = ScenarioLayout {
            inputs: BTreeMap::new(),
            outputs: Vec::new(),
        };

        for input in &config.inputs {
            check_row_name(&sheet, &input.name)?;
            let values = config
                .scenarios
                .iter()
                .map(|s| s.value_of(&input.name))
                .collect();
            let row = sheet.push_row(
                input.label.clone(),
                Some(input.name.clone()),
                RowKind::Input { values },
            );
            layout.inputs.insert(input.name.clone(), row);
        }

        sheet.push_blank();

        let resolver = Resolver::new(&self.sheets, &self.names);
        for output in &config.outputs {
            let Some(template) = &output.formula else {
                let row = sheet.push_row(output.label.clone(), None, RowKind::Section);
                layout.outputs.push(PlacedOutput {
                    output: output.clone(),
                    row,
                });
                continue;
            };
            if let Some(out_name) = &output.name {
                check_row_name(&sheet, out_name)?;
                // A workbook name would shadow this row in later templates.
                self.names.check(out_name)?;
            }

            let template = format!("={}", template.trim_start_matches('='));
            let formulas = (0..config.scenarios.len() as u32)
                .map(|i| resolver.resolve_in_column(&template, &sheet, &column_letter(i + 1)))
                .collect::<Result<Vec<_>>>()?;
            let row = sheet.push_row(
                output.label.clone(),
                output.name.clone(),
                RowKind::Output {
                    formulas,
                    format: output.format,
                    thresholds: output.thresholds,
                },
            );
            layout.outputs.push(PlacedOutput {
                output: output.clone(),
                row,
            });
        }

        if let Err(e) = self.write_scenario_sheet(&mut sheet) {
            // The engine keeps the grid under this name; leave it empty.
            if sheet.id() != SheetId(usize::MAX) {
                let last_row = sheet.next_row() - 1;
                self.clear_cells(sheet.id(), sheet.value_columns(), 1..=last_row);
            }
            return Err(e);
        }
        log::debug!(
            "built scenario sheet {} ({} scenarios, {} rows)",
            name,
            config.scenarios.len(),
            sheet.rows().len()
        );
        self.sheets.push(sheet);
        Ok(layout)
    }

    fn write_scenario_sheet(&mut self, sheet: &mut Sheet) -> Result<()> {
        let name = sheet.name().to_string();
        let id = self.engine.add_sheet(&name).map_err(|e| Error::Engine {
            sheet: name.clone(),
            row: 0,
            cell: String::new(),
            label: String::new(),
            message: e.0,
        })?;
        sheet.assign_id(id);

        let fail = |row: &Row, col: u32, message: String| Error::Engine {
            sheet: name.clone(),
            row: row.number(),
            cell: format!("{}{}", column_letter(col), row.number()),
            label: row.label().to_string(),
            message,
        };

        for (i, label) in sheet.scenario_labels().iter().enumerate() {
            let col = i as u32 + 1;
            self.engine
                .write(id, col, 1, CellInput::Text(label.clone()))
                .map_err(|e| Error::Engine {
                    sheet: name.clone(),
                    row: 1,
                    cell: format!("{}1", column_letter(col)),
                    label: label.clone(),
                    message: e.0,
                })?;
        }

        for row in sheet.rows() {
            if !row.label().is_empty() {
                self.engine
                    .write(id, 0, row.number(), CellInput::Text(row.label().to_string()))
                    .map_err(|e| fail(row, 0, e.0))?;
            }
            let cells: Vec<CellInput> = match row.kind() {
                RowKind::Input { values } => values.iter().map(|v| CellInput::Number(*v)).collect(),
                RowKind::Output { formulas, .. } => {
                    formulas.iter().cloned().map(CellInput::Formula).collect()
                }
                RowKind::Section | RowKind::Data(_) => Vec::new(),
            };
            for (i, input) in cells.into_iter().enumerate() {
                let col = i as u32 + 1;
                self.engine
                    .write(id, col, row.number(), input)
                    .map_err(|e| fail(row, col, e.0))?;
            }
        }
        Ok(())
    }
}
