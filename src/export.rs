//! Styled xlsx export.
//!
//! Data sheets become a two-column label/value layout with the label column
//! frozen. Scenario sheets get a styled header row, shaded inputs, and
//! three-band conditional fills on outputs that carry thresholds. Every
//! workbook name becomes a defined name so exported formulas keep working.

use crate::engine::{Engine, SheetId, Value};
use crate::error::Result;
use crate::format::{Thresholds, ValueFormat};
use crate::model::SheetModel;
use crate::reference::{absolute_reference, quote_sheet_name};
use crate::sheet::{Cell, Row, RowKind, Sheet};
use rust_xlsxwriter::{
    Color, ConditionalFormatCell, ConditionalFormatCellRule, DocProperties, Format, FormatAlign,
    FormatBorder, Formula, Workbook, Worksheet,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Author recorded in the document properties.
    pub creator: String,
    /// RGB fill of scenario header rows.
    pub header_color: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            creator: "sheetmodel".to_string(),
            header_color: 0x1B3A5C,
        }
    }
}

const INPUT_FILL: u32 = 0xDAEEF3;
const GOOD_FILL: u32 = 0xE2EFDA;
const WARNING_FILL: u32 = 0xFFF2CC;
const BAD_FILL: u32 = 0xFCE4EC;

struct Styles {
    header: Format,
    section: Format,
    number: Format,
    formula: Format,
    input_label: Format,
    input: Format,
    good: Format,
    warning: Format,
    bad: Format,
}

impl Styles {
    fn new(options: &ExportOptions) -> Self {
        let fill = |rgb: u32| Format::new().set_background_color(Color::RGB(rgb));
        Self {
            header: Format::new()
                .set_bold()
                .set_font_size(11)
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(options.header_color))
                .set_align(FormatAlign::Center)
                .set_text_wrap()
                .set_border(FormatBorder::Thin),
            section: Format::new().set_bold().set_font_size(11),
            number: Format::new().set_num_format(ValueFormat::Number.code()),
            formula: Format::new()
                .set_bold()
                .set_num_format(ValueFormat::Number.code()),
            input_label: Format::new().set_italic(),
            input: Format::new()
                .set_background_color(Color::RGB(INPUT_FILL))
                .set_border(FormatBorder::Thin),
            good: fill(GOOD_FILL),
            warning: fill(WARNING_FILL),
            bad: fill(BAD_FILL),
        }
    }

    fn output(&self, format: ValueFormat) -> Format {
        Format::new()
            .set_num_format(format.code())
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Right)
    }
}

/// Formula cell carrying the engine's evaluated value as its cached result.
fn formula_with_result(text: &str, value: Value) -> Formula {
    let formula = Formula::new(text);
    match value {
        Value::Empty => formula,
        other => formula.set_result(other.to_string()),
    }
}

impl<E: Engine> SheetModel<E> {
    /// Write the model to an xlsx file and return its path.
    pub fn export_xlsx(&mut self, path: impl AsRef<Path>, options: &ExportOptions) -> Result<PathBuf> {
        let path = path.as_ref();
        let styles = Styles::new(options);
        let mut workbook = Workbook::new();
        let properties = DocProperties::new().set_author(&options.creator);
        workbook.set_properties(&properties);

        for sheet in &self.sheets {
            let mut worksheet = Worksheet::new();
            worksheet.set_name(sheet.name())?;
            if sheet.is_scenario() {
                write_scenario_sheet(sheet, &mut self.engine, &mut worksheet, &styles)?;
            } else {
                write_data_sheet(sheet, &mut self.engine, &mut worksheet, &styles)?;
            }
            workbook.push_worksheet(worksheet);
        }

        for named in self.names.iter() {
            workbook.define_name(&named.name, &format!("={}", named.reference))?;
        }

        // Scenario inputs and outputs are named on their own sheet only,
        // bound to the first scenario column.
        for sheet in self.sheets.iter().filter(|s| s.is_scenario()) {
            for row in sheet.rows() {
                let Some(name) = row.name() else { continue };
                if !matches!(row.kind(), RowKind::Input { .. } | RowKind::Output { .. }) {
                    continue;
                }
                workbook.define_name(
                    &format!("{}!{}", quote_sheet_name(sheet.name()), name),
                    &format!("={}", absolute_reference(sheet.name(), row.number())),
                )?;
            }
        }

        workbook.save(path)?;
        log::debug!(
            "exported {} sheets and {} names to {}",
            self.sheets.len(),
            self.names.len(),
            path.display()
        );
        Ok(path.to_path_buf())
    }
}

fn write_data_sheet<E: Engine>(
    sheet: &Sheet,
    engine: &mut E,
    ws: &mut Worksheet,
    styles: &Styles,
) -> Result<()> {
    ws.set_column_width(0, 35)?;
    ws.set_column_width(1, 18)?;
    ws.set_freeze_panes(0, 1)?;

    for row in sheet.rows() {
        let r = row.number() - 1;
        match row.kind() {
            RowKind::Section => {
                ws.write_string_with_format(r, 0, row.label(), &styles.section)?;
                continue;
            }
            _ if !row.label().is_empty() => {
                ws.write_string(r, 0, row.label())?;
            }
            _ => {}
        }

        write_data_cell(sheet, row, engine, ws, styles)?;
    }
    Ok(())
}

/// Column B of a data row.
fn write_data_cell<E: Engine>(
    sheet: &Sheet,
    row: &Row,
    engine: &mut E,
    ws: &mut Worksheet,
    styles: &Styles,
) -> Result<()> {
    let r = row.number() - 1;
    match row.kind() {
        RowKind::Data(Cell::Number(n)) => {
            ws.write_number_with_format(r, 1, *n, &styles.number)?;
        }
        RowKind::Data(Cell::Text(s)) => {
            ws.write_string(r, 1, s)?;
        }
        RowKind::Data(Cell::Formula { resolved, .. }) => {
            let value = engine.value(sheet.id(), 1, row.number());
            ws.write_formula_with_format(r, 1, formula_with_result(resolved, value), &styles.formula)?;
        }
        _ => {}
    }
    Ok(())
}

fn write_scenario_sheet<E: Engine>(
    sheet: &Sheet,
    engine: &mut E,
    ws: &mut Worksheet,
    styles: &Styles,
) -> Result<()> {
    let id: SheetId = sheet.id();
    let columns = sheet.value_columns() as u16;

    ws.set_column_width(0, 30)?;
    for col in 1..=columns {
        ws.set_column_width(col, 20)?;
    }

    ws.write_blank(0, 0, &styles.header)?;
    for (i, label) in sheet.scenario_labels().iter().enumerate() {
        ws.write_string_with_format(0, i as u16 + 1, label, &styles.header)?;
    }

    for row in sheet.rows() {
        let r = row.number() - 1;
        match row.kind() {
            RowKind::Input { values } => {
                ws.write_string_with_format(r, 0, row.label(), &styles.input_label)?;
                for (i, v) in values.iter().enumerate() {
                    ws.write_number_with_format(r, i as u16 + 1, *v, &styles.input)?;
                }
            }
            RowKind::Section => {
                ws.write_string_with_format(r, 0, row.label(), &styles.section)?;
            }
            RowKind::Output {
                formulas,
                format,
                thresholds,
            } => {
                ws.write_string(r, 0, row.label())?;
                let cell_format = styles.output(*format);
                for (i, formula) in formulas.iter().enumerate() {
                    let col = i as u16 + 1;
                    let value = engine.value(id, col as u32, row.number());
                    ws.write_formula_with_format(r, col, formula_with_result(formula, value), &cell_format)?;
                }
                if let (Some(t), true) = (thresholds, columns > 0) {
                    add_threshold_bands(ws, r, columns, t, styles)?;
                }
            }
            RowKind::Data(_) => {
                if !row.label().is_empty() {
                    ws.write_string(r, 0, row.label())?;
                }
                write_data_cell(sheet, row, engine, ws, styles)?;
            }
        }
    }

    ws.set_freeze_panes(1, 1)?;
    Ok(())
}

/// Good / bad / warning fills over the scenario columns of one row.
fn add_threshold_bands(
    ws: &mut Worksheet,
    row: u32,
    last_col: u16,
    t: &Thresholds,
    styles: &Styles,
) -> Result<()> {
    let rules = if t.invert {
        [
            (ConditionalFormatCellRule::LessThanOrEqualTo(t.good), &styles.good),
            (ConditionalFormatCellRule::GreaterThan(t.bad), &styles.bad),
            (ConditionalFormatCellRule::Between(t.good, t.bad), &styles.warning),
        ]
    } else {
        [
            (ConditionalFormatCellRule::GreaterThanOrEqualTo(t.good), &styles.good),
            (ConditionalFormatCellRule::LessThan(t.bad), &styles.bad),
            (ConditionalFormatCellRule::Between(t.bad, t.good), &styles.warning),
        ]
    };
    for (rule, format) in rules {
        let band = ConditionalFormatCell::new()
            .set_rule(rule)
            .set_format(format.clone());
        ws.add_conditional_format(row, 1, row, last_col, &band)?;
    }
    Ok(())
}
