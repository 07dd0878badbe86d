//! Model definition files (.json / .toml) replayed through the model API.

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::model::{Content, RowOptions, SheetModel};
use crate::scenario::ScenarioConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelDefinition {
    #[serde(default)]
    pub sheets: Vec<SheetDefinition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SheetDefinition {
    Data {
        name: String,
        #[serde(default)]
        rows: Vec<RowDefinition>,
    },
    Scenario {
        name: String,
        #[serde(flatten)]
        config: ScenarioConfig,
    },
}

impl SheetDefinition {
    pub fn name(&self) -> &str {
        match self {
            SheetDefinition::Data { name, .. } | SheetDefinition::Scenario { name, .. } => name,
        }
    }
}

/// One data row. No label and no value makes a blank spacer row.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RowDefinition {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: Option<RowValue>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub section: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Number(f64),
    Text(String),
}

impl From<RowValue> for Content {
    fn from(value: RowValue) -> Self {
        match value {
            RowValue::Number(n) => Content::Number(n),
            RowValue::Text(s) => Content::from(s),
        }
    }
}

impl ModelDefinition {
    pub fn from_json_str(source: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn from_toml_str(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Build a model on the default engine.
    pub fn build(&self) -> Result<SheetModel> {
        let mut model = SheetModel::new();
        self.apply(&mut model)?;
        Ok(model)
    }

    /// Replay every sheet, in order, into `model`.
    pub fn apply<E: Engine>(&self, model: &mut SheetModel<E>) -> Result<()> {
        for sheet in &self.sheets {
            match sheet {
                SheetDefinition::Data { name, rows } => {
                    model.add_sheet(name)?;
                    for row in rows {
                        if row.section {
                            model.add_section(name, &row.label)?;
                        } else if row.label.is_empty() && row.value.is_none() {
                            model.add_blank(name)?;
                        } else {
                            model.add_row(
                                name,
                                &row.label,
                                row.value.clone(),
                                RowOptions {
                                    name: row.name.clone(),
                                },
                            )?;
                        }
                    }
                }
                SheetDefinition::Scenario { name, config } => {
                    model.add_scenario_sheet(name, config)?;
                }
            }
        }
        Ok(())
    }
}

pub fn open_definition(path: &Path) -> Result<ModelDefinition> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let invalid = |details: String| Error::InvalidDefinition {
        path: path.to_path_buf(),
        details,
    };

    match extension.as_str() {
        "json" => {
            let source = std::fs::read_to_string(path)?;
            ModelDefinition::from_json_str(&source).map_err(|e| invalid(e.to_string()))
        }
        "toml" => {
            let source = std::fs::read_to_string(path)?;
            ModelDefinition::from_toml_str(&source).map_err(|e| invalid(e.to_string()))
        }
        _ => Err(Error::UnsupportedFormat(extension)),
    }
}
