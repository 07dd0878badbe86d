//! Placeholder resolution for formula text.
//!
//! Formulas are authored against semantic names: `{Assets}` for a row of the
//! sheet being written, `{Data.Assets}` for a row of another sheet. Before a
//! formula reaches the engine every placeholder is rewritten into a concrete
//! A1 coordinate, or left as a bare name when the workbook defines it as a
//! named expression.

use crate::error::{Error, Result};
use crate::names::NameRegistry;
use crate::sheet::Sheet;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// The column every data sheet keeps its values in.
pub const VALUE_COLUMN: &str = "B";

fn placeholder_re() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{(\w+)(?:\.(\w+))?\}").expect("placeholder regex must compile")
    })
}

/// Convert a zero-based column index to its spreadsheet label (0 -> A, 26 -> AA).
pub fn column_letter(index: u32) -> String {
    let mut n = index as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a sheet name for use in a qualified reference when it needs it.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Absolute reference to the value cell of `row` on `sheet`, e.g. `Data!$B$21`.
pub fn absolute_reference(sheet: &str, row: u32) -> String {
    format!("{}!${}${}", quote_sheet_name(sheet), VALUE_COLUMN, row)
}

/// Rewrites placeholders against the sheets and names of one workbook.
pub(crate) struct Resolver<'a> {
    sheets: &'a [Sheet],
    names: &'a NameRegistry,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(sheets: &'a [Sheet], names: &'a NameRegistry) -> Self {
        Self { sheets, names }
    }

    /// Resolve a data-sheet formula. Rows of `current` become `$B$<row>`.
    pub(crate) fn resolve(&self, formula: &str, current: &Sheet) -> Result<String> {
        rewrite(formula, |caps| {
            if let Some(qualified) = self.qualified(caps, formula)? {
                return Ok(qualified);
            }
            let name = &caps[1];
            if self.names.contains(name) {
                return Ok(name.to_string());
            }
            match current.row_of(name) {
                Some(row) => Ok(format!("${}${}", VALUE_COLUMN, row)),
                None => Err(unknown(&caps[0], current, formula)),
            }
        })
    }

    /// Resolve a scenario template for one scenario column. Inputs and rows of
    /// `current` become column-relative `<column><row>` references.
    pub(crate) fn resolve_in_column(
        &self,
        template: &str,
        current: &Sheet,
        column: &str,
    ) -> Result<String> {
        rewrite(template, |caps| {
            if let Some(qualified) = self.qualified(caps, template)? {
                return Ok(qualified);
            }
            let name = &caps[1];
            if current.is_input(name) {
                if let Some(row) = current.row_of(name) {
                    return Ok(format!("{}{}", column, row));
                }
            }
            if self.names.contains(name) {
                return Ok(name.to_string());
            }
            match current.row_of(name) {
                Some(row) => Ok(format!("{}{}", column, row)),
                None => Err(unknown(&caps[0], current, template)),
            }
        })
    }

    /// `{Sheet.Name}` resolves to an absolute reference on the named sheet.
    fn qualified(&self, caps: &Captures<'_>, formula: &str) -> Result<Option<String>> {
        let Some(name) = caps.get(2) else {
            return Ok(None);
        };
        let sheet_name = &caps[1];
        let sheet = self
            .sheets
            .iter()
            .find(|s| s.name() == sheet_name)
            .ok_or_else(|| Error::UnknownSheet {
                sheet: sheet_name.to_string(),
                placeholder: caps[0].to_string(),
                formula: formula.to_string(),
            })?;
        let row = sheet
            .row_of(name.as_str())
            .ok_or_else(|| unknown(&caps[0], sheet, formula))?;
        Ok(Some(absolute_reference(sheet.name(), row)))
    }
}

fn unknown(placeholder: &str, sheet: &Sheet, formula: &str) -> Error {
    Error::UnknownReference {
        placeholder: placeholder.to_string(),
        sheet: sheet.name().to_string(),
        formula: Some(formula.to_string()),
    }
}

fn rewrite<F>(formula: &str, mut replace: F) -> Result<String>
where
    F: FnMut(&Captures<'_>) -> Result<String>,
{
    let mut out = String::with_capacity(formula.len());
    let mut last = 0;
    for caps in placeholder_re().captures_iter(formula) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&formula[last..whole.start()]);
        let replacement = replace(&caps)?;
        log::trace!("resolved {} -> {}", whole.as_str(), replacement);
        out.push_str(&replacement);
        last = whole.end();
    }
    out.push_str(&formula[last..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SheetId;
    use crate::sheet::{Cell, Layout, RowKind};

    fn data_sheet(name: &str, rows: &[(&str, &str)]) -> Sheet {
        let mut sheet = Sheet::new(SheetId(0), name, Layout::Data);
        for (label, row_name) in rows {
            sheet.push_row(
                label.to_string(),
                Some(row_name.to_string()),
                RowKind::Data(Cell::Number(1.0)),
            );
        }
        sheet
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(1), "B");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(51), "AZ");
        assert_eq!(column_letter(52), "BA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
        assert_eq!(column_letter(16383), "XFD");
    }

    #[test]
    fn test_column_letter_is_bijective_over_two_letters() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..702 {
            let label = column_letter(i);
            assert!(label.len() <= 2);
            assert!(seen.insert(label));
        }
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("Data"), "Data");
        assert_eq!(quote_sheet_name("Balance Sheet"), "'Balance Sheet'");
        assert_eq!(quote_sheet_name("O'Brien"), "'O''Brien'");
        assert_eq!(quote_sheet_name("2024"), "'2024'");
    }

    #[test]
    fn test_resolve_current_sheet_rows() {
        let sheet = data_sheet("Data", &[("Assets", "Assets"), ("Debt", "Debt")]);
        let names = NameRegistry::default();
        let sheets: [Sheet; 0] = [];
        let resolver = Resolver::new(&sheets, &names);

        let resolved = resolver.resolve("={Assets} - {Debt}", &sheet).unwrap();
        assert_eq!(resolved, "=$B$1 - $B$2");
        // Same placeholder, same coordinate, wherever it appears.
        let again = resolver.resolve("=SUM({Debt}, {Debt})", &sheet).unwrap();
        assert_eq!(again, "=SUM($B$2, $B$2)");
    }

    #[test]
    fn test_registered_names_stay_bare() {
        let sheet = data_sheet("Data", &[("Assets", "Assets")]);
        let mut names = NameRegistry::default();
        names.register("Assets", "Data!$B$1").unwrap();
        let sheets: [Sheet; 0] = [];
        let resolver = Resolver::new(&sheets, &names);

        assert_eq!(resolver.resolve("={Assets}*2", &sheet).unwrap(), "=Assets*2");
    }

    #[test]
    fn test_cross_sheet_reference() {
        let other = data_sheet("Balance Sheet", &[("Cash", "Cash"), ("Loans", "Loans")]);
        let current = data_sheet("Data", &[]);
        let names = NameRegistry::default();
        let sheets = [other];
        let resolver = Resolver::new(&sheets, &names);

        // Sheet identifiers in placeholders are word characters only.
        let err = resolver.resolve("={Balance.Cash}", &current).unwrap_err();
        assert!(matches!(err, Error::UnknownSheet { ref sheet, .. } if sheet == "Balance"));

        let sheets = [data_sheet("Balance", &[("Cash", "Cash"), ("Loans", "Loans")])];
        let resolver = Resolver::new(&sheets, &names);
        assert_eq!(
            resolver.resolve("={Balance.Loans}", &current).unwrap(),
            "=Balance!$B$2"
        );
        let err = resolver.resolve("={Balance.Equity}", &current).unwrap_err();
        assert!(matches!(err, Error::UnknownReference { ref placeholder, .. } if placeholder == "{Balance.Equity}"));
    }

    #[test]
    fn test_unknown_reference_reports_formula() {
        let sheet = data_sheet("Data", &[]);
        let names = NameRegistry::default();
        let sheets: [Sheet; 0] = [];
        let resolver = Resolver::new(&sheets, &names);

        match resolver.resolve("={Missing} + 1", &sheet) {
            Err(Error::UnknownReference {
                placeholder,
                formula,
                sheet,
            }) => {
                assert_eq!(placeholder, "{Missing}");
                assert_eq!(sheet, "Data");
                assert_eq!(formula.as_deref(), Some("={Missing} + 1"));
            }
            other => panic!("expected UnknownReference, got {:?}", other),
        }
    }

    #[test]
    fn test_formula_without_placeholders_is_untouched() {
        let sheet = data_sheet("Data", &[]);
        let names = NameRegistry::default();
        let sheets: [Sheet; 0] = [];
        let resolver = Resolver::new(&sheets, &names);
        assert_eq!(resolver.resolve("=SUM(1,2,3)", &sheet).unwrap(), "=SUM(1,2,3)");
    }

    #[test]
    fn test_resolve_in_column() {
        let mut sheet = Sheet::new(SheetId(1), "Scenarios", Layout::scenario(["Base", "Stress"]));
        sheet.push_row("Rate".into(), Some("X".into()), RowKind::Input { values: vec![0.1, 0.3] });
        sheet.push_blank();
        sheet.push_row(
            "Prior".into(),
            Some("Y".into()),
            RowKind::Output {
                formulas: vec![],
                format: Default::default(),
                thresholds: None,
            },
        );
        let mut names = NameRegistry::default();
        names.register("Revenue", "Data!$B$4").unwrap();
        let sheets: [Sheet; 0] = [];
        let resolver = Resolver::new(&sheets, &names);

        assert_eq!(
            resolver.resolve_in_column("={X} + {Y}", &sheet, "B").unwrap(),
            "=B2 + B4"
        );
        assert_eq!(
            resolver.resolve_in_column("={X} + {Y}", &sheet, "C").unwrap(),
            "=C2 + C4"
        );
        assert_eq!(
            resolver
                .resolve_in_column("={Revenue} * {X}", &sheet, "C")
                .unwrap(),
            "=Revenue * C2"
        );
        assert!(resolver.resolve_in_column("={Z}", &sheet, "B").is_err());
    }
}
