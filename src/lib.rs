//! Label-addressed financial models.
//!
//! Rows are appended to sheets by label and optional semantic name; formulas
//! refer to other rows through `{Name}` placeholders that are resolved to
//! absolute references when the row is added. Scenario sheets compare a set of
//! inputs across several columns. A model evaluates as it is built and
//! exports to a styled xlsx workbook.
//!
//! ```no_run
//! use sheetmodel::{RowOptions, SheetModel};
//!
//! let mut model = SheetModel::new();
//! model.add_sheet("Balance")?;
//! model.add_row("Balance", "Assets", 100.0, RowOptions::named("Assets"))?;
//! model.add_row("Balance", "Liabilities", 60.0, RowOptions::named("Liabilities"))?;
//! model.add_row("Balance", "Equity", "={Assets} - {Liabilities}", RowOptions::default())?;
//! # Ok::<(), sheetmodel::Error>(())
//! ```

mod console;
pub mod definition;
pub mod engine;
pub mod error;
mod export;
pub mod format;
mod model;
pub mod names;
pub mod reference;
mod scenario;
pub mod sheet;
pub mod writer;

pub use engine::{CellInput, Engine, EngineError, FormualizerEngine, SheetId, Value};
pub use error::{Collision, Error, Result};
pub use export::ExportOptions;
pub use format::{flag, Flag, Thresholds, ValueFormat};
pub use model::{Content, RowOptions, SheetModel};
pub use names::{NameRegistry, NamedReference};
pub use reference::column_letter;
pub use scenario::{
    PlacedOutput, Scenario, ScenarioConfig, ScenarioInput, ScenarioLayout, ScenarioOutput,
};
pub use sheet::{Cell, Layout, Row, RowKind, Sheet};
