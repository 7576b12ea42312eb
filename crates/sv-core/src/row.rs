//! Column schema and raw rows

use ahash::AHashMap;

/// Ordered, unique column names taken from the header line
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    names: Vec<String>,
    positions: AHashMap<String, usize>,
}

impl ColumnSchema {
    /// Build a schema from raw header names.
    ///
    /// Repeated names are made unique by appending `.1`, `.2`, ... to the later
    /// occurrences, skipping suffixes that are already taken.
    pub fn from_headers<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut positions = AHashMap::new();
        let mut repeats: AHashMap<String, usize> = AHashMap::new();

        for header in headers {
            let header: String = header.into();
            let mut name = header.clone();

            if positions.contains_key(&name) {
                let counter = repeats.entry(header.clone()).or_insert(0);
                loop {
                    *counter += 1;
                    name = format!("{}.{}", header, counter);
                    if !positions.contains_key(&name) {
                        break;
                    }
                }
            }

            positions.insert(name.clone(), names.len());
            names.push(name);
        }

        Self { names, positions }
    }

    /// Column names in header order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a column in the header
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Whether the header contains a column
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

/// One data record of the source, still as raw text
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 0-based index of the record among all data records of the file,
    /// malformed ones included
    pub record_index: u64,

    /// Raw field values in schema order
    pub fields: Vec<String>,
}

impl Row {
    /// Create a new row
    pub fn new(record_index: u64, fields: Vec<String>) -> Self {
        Self { record_index, fields }
    }

    /// Raw value of a named column
    pub fn get<'a>(&'a self, schema: &ColumnSchema, column: &str) -> Option<&'a str> {
        schema
            .position(column)
            .and_then(|idx| self.fields.get(idx))
            .map(|s| s.as_str())
    }
}
