//! Structured game-data tables.
//!
//! Scope resolution only needs to read numeric file-ID columns out of a few tables, so
//! rows are exposed as a name -> integer map. [`Table`] holds rows in memory and can be
//! filled from a CSV export (header row, `ID` column first by convention).

use camino::Utf8Path;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

/// Read access to a table's rows by numeric row ID.
pub trait TableSource: Send + Sync {
    /// All row IDs, in ascending order.
    fn row_ids(&self) -> Vec<u32>;

    fn row(&self, id: u32) -> Option<TableRow>;
}

/// One table row. Field names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    fields: HashMap<String, u32>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: u32) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: u32) {
        self.fields.insert(name.to_ascii_lowercase(), value);
    }

    /// Reads an optional file-ID field. Absent fields and zero both mean "no file".
    pub fn field(&self, name: &str) -> Option<u32> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .copied()
            .filter(|&value| value != 0)
    }
}

/// In-memory table.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    rows: BTreeMap<u32, TableRow>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, id: u32, row: TableRow) {
        self.rows.insert(id, row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Loads a CSV export. A missing file yields an empty table.
    pub async fn load_csv_or_empty(name: &str, path: impl AsRef<Utf8Path>) -> Result<Self> {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path.as_std_path()).await {
            Ok(text) => {
                let table = Self::from_csv(name, &text)?;
                tracing::info!("Loaded table {} ({} rows) from {}", name, table.len(), path);
                Ok(table)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Table {} not found at {}, treating as empty", name, path);
                Ok(Self::new(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parses a CSV export with a header row.
    ///
    /// Only unsigned integer cells are kept; text and negative cells are ignored since
    /// no file-ID column ever holds them.
    pub fn from_csv(name: &str, text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header = lines.next().ok_or_else(|| Error::Table {
            table: name.to_string(),
            message: "missing header row".to_string(),
        })?;

        let columns = split_csv_line(header);
        let id_column = columns
            .iter()
            .position(|column| column.eq_ignore_ascii_case("ID"))
            .ok_or_else(|| Error::Table {
                table: name.to_string(),
                message: "no ID column".to_string(),
            })?;

        let mut table = Self::new(name);
        for line in lines {
            let cells = split_csv_line(line);
            let Some(id) = cells.get(id_column).and_then(|cell| cell.parse::<u32>().ok()) else {
                tracing::debug!("Skipping {} row without a numeric ID: {}", name, line);
                continue;
            };

            let mut row = TableRow::new();
            for (column, cell) in columns.iter().zip(cells.iter()) {
                if let Ok(value) = cell.parse::<u32>() {
                    row.insert(column, value);
                }
            }
            table.insert(id, row);
        }

        Ok(table)
    }
}

impl TableSource for Table {
    fn row_ids(&self) -> Vec<u32> {
        self.rows.keys().copied().collect()
    }

    fn row(&self, id: u32) -> Option<TableRow> {
        self.rows.get(&id).cloned()
    }
}

/// Splits one CSV line, honouring double-quoted cells and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());

    cells
}
