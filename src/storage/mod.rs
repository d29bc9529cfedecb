// src/storage/mod.rs
use std::collections::HashMap;
use std::path::Path;

use crate::screener::models::Variant;
use crate::utils::error::StorageError;

/// Numeric ids keyed by upper-cased symbol.
#[derive(Debug, Clone, Default, PartialEq)]
struct CompanyIds {
    standalone: Option<String>,
    consolidated: Option<String>,
}

/// Read-only symbol → company id table maintained by an offline batch job.
///
/// Expected columns: `Symbol`, `CompanyID` and optionally `CompanyID_Consolidated`.
#[derive(Debug, Clone, Default)]
pub struct CompanyIdTable {
    ids: HashMap<String, CompanyIds>,
}

impl CompanyIdTable {
    /// Loads the table from a CSV file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let file = std::fs::File::open(path.as_ref()).map_err(StorageError::IoError)?;
        let table = Self::from_reader(file)?;
        if table.is_empty() {
            tracing::warn!("Company id table {} has no rows", path.as_ref().display());
        }
        tracing::info!(
            "Loaded {} company ids from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Loads the table, degrading to an empty one when the file is missing or unreadable.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    "Company id table {} unavailable ({}); continuing without it",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self, StorageError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);
        let symbol_col = column("Symbol").ok_or(StorageError::MissingColumn("Symbol"))?;
        let id_col = column("CompanyID");
        let consolidated_col = column("CompanyID_Consolidated");
        if id_col.is_none() && consolidated_col.is_none() {
            return Err(StorageError::MissingColumn("CompanyID"));
        }

        let non_empty = |record: &csv::StringRecord, col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut ids = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let Some(symbol) = record.get(symbol_col).map(normalize_symbol) else {
                continue;
            };
            if symbol.is_empty() {
                continue;
            }
            // First row for a symbol wins, like a lookup on the first match.
            ids.entry(symbol).or_insert_with(|| CompanyIds {
                standalone: non_empty(&record, id_col),
                consolidated: non_empty(&record, consolidated_col),
            });
        }

        Ok(Self { ids })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resolves the numeric id for a symbol. The consolidated variant prefers its
    /// own column and falls back to the standalone id.
    pub fn lookup(&self, symbol: &str, variant: Variant) -> Option<String> {
        let entry = self.ids.get(&normalize_symbol(symbol))?;
        match variant {
            Variant::Consolidated => entry
                .consolidated
                .clone()
                .or_else(|| entry.standalone.clone()),
            Variant::Standalone => entry.standalone.clone(),
        }
    }
}

pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lookup_normalizes_symbols() {
        let csv = "Symbol , CompanyID\n reliance ,2726\nTCS,3365\n";
        let table = CompanyIdTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("Reliance ", Variant::Standalone).as_deref(), Some("2726"));
        assert_eq!(table.lookup("INFY", Variant::Standalone), None);
    }

    #[test]
    fn consolidated_prefers_its_own_column() {
        let csv = "Symbol,CompanyID,CompanyID_Consolidated\nABC,10,11\nXYZ,20,\n";
        let table = CompanyIdTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.lookup("ABC", Variant::Consolidated).as_deref(), Some("11"));
        assert_eq!(table.lookup("ABC", Variant::Standalone).as_deref(), Some("10"));
        assert_eq!(table.lookup("XYZ", Variant::Consolidated).as_deref(), Some("20"));
    }

    #[test]
    fn empty_id_cells_are_treated_as_missing() {
        let csv = "Symbol,CompanyID\nNOID,\n";
        let table = CompanyIdTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.lookup("NOID", Variant::Standalone), None);
    }

    #[test]
    fn missing_symbol_column_is_an_error() {
        let csv = "Ticker,CompanyID\nABC,1\n";
        assert!(matches!(
            CompanyIdTable::from_reader(csv.as_bytes()),
            Err(StorageError::MissingColumn("Symbol"))
        ));
    }

    #[test]
    fn load_from_disk_and_degrade_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Symbol,CompanyID").unwrap();
        writeln!(file, "SBIN,1234").unwrap();
        drop(file);

        let table = CompanyIdTable::load(&path).unwrap();
        assert_eq!(table.lookup("sbin", Variant::Standalone).as_deref(), Some("1234"));

        let missing = CompanyIdTable::load_or_empty(dir.path().join("nope.csv"));
        assert!(missing.is_empty());
    }
}
