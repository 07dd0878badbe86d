//! Plain-text scenario report.

use crate::engine::Engine;
use crate::error::Result;
use crate::format::flag;
use crate::model::SheetModel;
use crate::sheet::RowKind;
use std::io::{self, Write};

const RULE_WIDTH: usize = 68;
const LABEL_WIDTH: usize = 28;
const VALUE_WIDTH: usize = 12;

impl<E: Engine> SheetModel<E> {
    /// Print every scenario column of `sheet` to stdout.
    pub fn print_scenarios(&mut self, sheet: &str) -> Result<()> {
        let stdout = io::stdout();
        let handle = stdout.lock();
        self.write_scenarios(sheet, handle)
    }

    /// One block per scenario: its label, then each output row with its
    /// formatted value and threshold flag. Inputs and blank rows are skipped.
    pub fn write_scenarios<W: Write>(&mut self, sheet: &str, mut out: W) -> Result<()> {
        let idx = self.sheet_index(sheet)?;
        let s = &self.sheets[idx];
        let id = s.id();

        for (i, scenario) in s.scenario_labels().iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "  {}", scenario)?;
            writeln!(out, "  {}", "─".repeat(RULE_WIDTH))?;

            for row in s.rows() {
                if row.label().is_empty() {
                    continue;
                }
                match row.kind() {
                    RowKind::Section => {
                        writeln!(out)?;
                        writeln!(out, "    {}", row.label())?;
                    }
                    RowKind::Output {
                        format, thresholds, ..
                    } => {
                        let value = self.engine.value(id, i as u32 + 1, row.number()).as_number();
                        let text = value
                            .map(|v| format.render(v))
                            .unwrap_or_else(|| "—".to_string());
                        writeln!(
                            out,
                            "    {:<lw$}{:>vw$}  {}",
                            row.label(),
                            text,
                            flag(value, thresholds.as_ref()),
                            lw = LABEL_WIDTH,
                            vw = VALUE_WIDTH
                        )?;
                    }
                    RowKind::Input { .. } | RowKind::Data(_) => {}
                }
            }
        }
        out.flush()?;
        Ok(())
    }
}
