use crate::engine::Engine;
use crate::error::Result;
use crate::model::SheetModel;
use clap::ValueEnum;
use csv::WriterBuilder;
use std::io::Write;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
    European,
}

impl OutputFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
            OutputFormat::European => b';',
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CsvConfig {
    pub format: OutputFormat,
    pub empty_value: String,
}

/// Write an evaluated sheet to CSV output: every allocated row, label column
/// first, then one column per value column.
pub fn write_evaluated_sheet<E: Engine, W: Write>(
    model: &mut SheetModel<E>,
    sheet_name: &str,
    writer: W,
    config: &CsvConfig,
) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .delimiter(config.format.delimiter())
        .from_writer(writer);

    let idx = model.sheet_index(sheet_name)?;
    let sheet = &model.sheets[idx];
    let id = sheet.id();
    let max_row = sheet.next_row() - 1;
    let max_col = sheet.value_columns();

    for row in 1..=max_row {
        let mut record: Vec<String> = Vec::with_capacity(max_col as usize + 1);

        for col in 0..=max_col {
            let value = model.engine.value(id, col, row).to_string();
            if value.is_empty() {
                record.push(config.empty_value.clone());
            } else {
                record.push(value);
            }
        }

        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RowOptions;
    use crate::scenario::{Scenario, ScenarioConfig, ScenarioInput, ScenarioOutput};

    fn render(model: &mut SheetModel, sheet: &str, config: &CsvConfig) -> Vec<String> {
        let mut buf = Vec::new();
        write_evaluated_sheet(model, sheet, &mut buf, config).unwrap();
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_data_sheet_csv() {
        let mut model = SheetModel::new();
        model.add_sheet("Balance").unwrap();
        model
            .add_row("Balance", "Assets", 100.0, RowOptions::named("Assets"))
            .unwrap();
        model
            .add_row("Balance", "Liabilities", 60.0, RowOptions::named("Liabilities"))
            .unwrap();
        model.add_blank("Balance").unwrap();
        model
            .add_row("Balance", "Equity", "={Assets} - {Liabilities}", RowOptions::default())
            .unwrap();

        let config = CsvConfig {
            format: OutputFormat::European,
            empty_value: "-".to_string(),
        };
        let lines = render(&mut model, "Balance", &config);
        assert_eq!(lines, vec!["Assets;100", "Liabilities;60", "-;-", "Equity;40"]);
    }

    #[test]
    fn test_scenario_sheet_csv() {
        let mut model = SheetModel::new();
        let config = ScenarioConfig {
            inputs: vec![ScenarioInput::new("Units", "Units")],
            scenarios: vec![
                Scenario::new("Low").value("Units", 2.0),
                Scenario::new("High").value("Units", 5.0),
            ],
            outputs: vec![ScenarioOutput::new("Total", "={Units} * 3")],
        };
        model.add_scenario_sheet("Plan", &config).unwrap();

        let lines = render(&mut model, "Plan", &CsvConfig::default());
        assert_eq!(lines, vec![",Low,High", "Units,2,5", ",,", "Total,6,15"]);
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(OutputFormat::Csv.delimiter(), b',');
        assert_eq!(OutputFormat::Tsv.delimiter(), b'\t');
        assert_eq!(OutputFormat::European.delimiter(), b';');
    }
}
