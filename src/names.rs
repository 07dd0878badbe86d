//! Workbook-wide registry of named references.

use crate::error::{Collision, Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn cell_reference_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| Regex::new(r"^[A-Z]{1,3}[0-9]+$").expect("cell regex must compile"))
}

fn word_re() -> &'static Regex {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();
    WORD_RE.get_or_init(|| Regex::new(r"^[^\W\d]\w*$").expect("word regex must compile"))
}

const KEYWORDS: [&str; 2] = ["TRUE", "FALSE"];

fn r1c1_re() -> &'static Regex {
    static R1C1_RE: OnceLock<Regex> = OnceLock::new();
    R1C1_RE.get_or_init(|| Regex::new(r"^R[0-9]*C[0-9]*$").expect("r1c1 regex must compile"))
}

/// Check whether `name` could not be used as a placeholder or would be read
/// as grid addressing or a literal by a formula parser. Case-insensitive.
pub fn reserved_collision(name: &str) -> Option<Collision> {
    let upper = name.to_ascii_uppercase();
    if !word_re().is_match(name) {
        Some(Collision::NotAWord)
    } else if KEYWORDS.contains(&upper.as_str()) {
        Some(Collision::Keyword)
    } else if cell_reference_re().is_match(&upper) {
        Some(Collision::CellReference)
    } else if (1..=2).contains(&upper.len()) && upper.bytes().all(|b| b.is_ascii_uppercase()) {
        Some(Collision::ColumnToken)
    } else if r1c1_re().is_match(&upper) {
        Some(Collision::R1C1)
    } else {
        None
    }
}

/// Fail with `NameCollision` if `name` is reserved grid syntax.
pub fn check_reserved(name: &str) -> Result<()> {
    match reserved_collision(name) {
        Some(reason) => Err(Error::NameCollision {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedReference {
    pub name: String,
    /// Absolute reference without the leading `=`, e.g. `Data!$B$21`.
    pub reference: String,
}

/// Names are registered once and never removed. Lookups are exact; the
/// duplicate check ignores case, as spreadsheet defined names do.
#[derive(Debug, Default, Clone)]
pub struct NameRegistry {
    entries: Vec<NamedReference>,
    by_name: HashMap<String, usize>,
    folded: HashMap<String, usize>,
}

impl NameRegistry {
    /// Validate a prospective name without registering it.
    pub fn check(&self, name: &str) -> Result<()> {
        check_reserved(name)?;
        if let Some(&idx) = self.folded.get(&name.to_ascii_uppercase()) {
            return Err(Error::NameCollision {
                name: name.to_string(),
                reason: Collision::AlreadyRegistered {
                    existing: self.entries[idx].reference.clone(),
                },
            });
        }
        Ok(())
    }

    pub fn register(&mut self, name: &str, reference: &str) -> Result<()> {
        self.check(name)?;
        let idx = self.entries.len();
        self.entries.push(NamedReference {
            name: name.to_string(),
            reference: reference.to_string(),
        });
        self.by_name.insert(name.to_string(), idx);
        self.folded.insert(name.to_ascii_uppercase(), idx);
        log::debug!("registered name {} -> {}", name, reference);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|&idx| self.entries[idx].reference.as_str())
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedReference> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_references_are_reserved() {
        for name in ["A1", "ac100", "XFD1048576", "Zz9", "B21"] {
            assert_eq!(reserved_collision(name), Some(Collision::CellReference), "{}", name);
        }
    }

    #[test]
    fn test_column_tokens_are_reserved() {
        for name in ["A", "l", "PN", "zz", "Ab"] {
            assert_eq!(reserved_collision(name), Some(Collision::ColumnToken), "{}", name);
        }
    }

    #[test]
    fn test_r1c1_tokens_are_reserved() {
        for name in ["R1C1", "r10c2", "RC3", "R2C"] {
            assert!(reserved_collision(name).is_some(), "{}", name);
        }
        assert_eq!(reserved_collision("R1C1"), Some(Collision::R1C1));
    }

    #[test]
    fn test_keywords_are_reserved() {
        for name in ["TRUE", "false", "True"] {
            assert_eq!(reserved_collision(name), Some(Collision::Keyword), "{}", name);
        }
        assert_eq!(reserved_collision("TrueUp"), None);
    }

    #[test]
    fn test_names_must_be_single_words() {
        for name in ["Total Assets", "Net-Debt", "", "2024Revenue", "Rate.Base", "_x y"] {
            assert_eq!(reserved_collision(name), Some(Collision::NotAWord), "{:?}", name);
        }
        let mut names = NameRegistry::default();
        assert!(names.register("Net-Debt", "Data!$B$1").is_err());
        assert!(names.is_empty());
    }

    #[test]
    fn test_descriptive_names_are_allowed() {
        for name in ["Assets", "TotalPN", "ABCD1", "Rate", "Revenue2024", "R1C1X", "A_1", "_Base"] {
            assert_eq!(reserved_collision(name), None, "{}", name);
        }
    }

    #[test]
    fn test_register_twice_fails() {
        let mut names = NameRegistry::default();
        names.register("Equity", "Data!$B$3").unwrap();

        let err = names.register("Equity", "Other!$B$9").unwrap_err();
        assert!(matches!(
            err,
            Error::NameCollision {
                reason: Collision::AlreadyRegistered { .. },
                ..
            }
        ));
        assert!(names.register("EQUITY", "Other!$B$9").is_err());

        // The first registration survives.
        assert_eq!(names.get("Equity"), Some("Data!$B$3"));
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_reserved_names_are_never_registered() {
        let mut names = NameRegistry::default();
        assert!(names.register("A", "Data!$B$1").is_err());
        assert!(names.register("r1c1", "Data!$B$1").is_err());
        assert!(names.is_empty());
        assert!(!names.contains("A"));
    }

    #[test]
    fn test_iteration_keeps_registration_order() {
        let mut names = NameRegistry::default();
        names.register("Revenue", "Data!$B$2").unwrap();
        names.register("Costs", "Data!$B$3").unwrap();
        let order: Vec<&str> = names.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(order, vec!["Revenue", "Costs"]);
    }
}
