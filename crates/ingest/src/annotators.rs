use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;

/// Maps raw annotation-tool user ids to canonical annotator names.
///
/// One person may have several accounts, so several ids can map to the
/// same name. An id may never map to two names.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotatorTable {
    names_by_id: BTreeMap<u64, String>,
}

impl AnnotatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a tab-separated `annotator_name<TAB>annotator_ids` table.
    /// The header row, blank lines and `#` comments are optional.
    pub fn parse(content: &str) -> Result<Self> {
        let mut table = Self::new();

        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let Some((name, ids)) = line.split_once('\t') else {
                bail!("Line {}: expected `annotator_name<TAB>annotator_ids`", line_no);
            };
            let name = name.trim().trim_matches('"');
            let ids = ids.trim().trim_matches('"');

            if name == "annotator_name" {
                continue;
            }
            if name.is_empty() {
                bail!("Line {}: empty annotator name", line_no);
            }

            let ids = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| {
                    id.parse::<u64>()
                        .with_context(|| format!("Line {}: invalid annotator id {:?}", line_no, id))
                })
                .collect::<Result<Vec<_>>>()?;

            if ids.is_empty() {
                bail!("Line {}: no annotator ids for {}", line_no, name);
            }

            table
                .insert(name, ids)
                .with_context(|| format!("Line {}", line_no))?;
        }

        Ok(table)
    }

    /// Register `ids` as aliases of `name`
    pub fn insert(&mut self, name: &str, ids: impl IntoIterator<Item = u64>) -> Result<()> {
        for id in ids {
            match self.names_by_id.get(&id) {
                Some(existing) if existing != name => {
                    bail!("Annotator id {} is claimed by both {} and {}", id, existing, name);
                }
                _ => {
                    self.names_by_id.insert(id, name.to_string());
                }
            }
        }
        Ok(())
    }

    pub fn name_for(&self, id: u64) -> Option<&str> {
        self.names_by_id.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names_by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_aliases() {
        let content =
            "annotator_name\tannotator_ids\nalice\t1,7\nbob\t2\n\n# retired\ncarol\t\"3, 4\"\n";
        let table = AnnotatorTable::parse(content).unwrap();

        assert_eq!(table.len(), 5);
        assert_eq!(table.name_for(1), Some("alice"));
        assert_eq!(table.name_for(7), Some("alice"));
        assert_eq!(table.name_for(4), Some("carol"));
        assert_eq!(table.name_for(9), None);
    }

    #[test]
    fn test_header_is_optional() {
        let table = AnnotatorTable::parse("alice\t1\r\n").unwrap();
        assert_eq!(table.name_for(1), Some("alice"));
    }

    #[test]
    fn test_rejects_bad_rows() {
        let err = AnnotatorTable::parse("alice\t1\nbob 2\n").unwrap_err();
        assert!(err.to_string().contains("Line 2"));

        assert!(AnnotatorTable::parse("alice\tone\n").is_err());
        assert!(AnnotatorTable::parse("alice\t\n").is_err());
        assert!(AnnotatorTable::parse("\t1\n").is_err());
    }

    #[test]
    fn test_rejects_conflicting_ids() {
        let err = AnnotatorTable::parse("alice\t1,2\nbob\t2\n").unwrap_err();
        assert!(format!("{:#}", err).contains("claimed by both"));
    }
}
