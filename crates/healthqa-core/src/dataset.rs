use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::value::Value;

/// A single record: one value per dataset column, in column order.
pub type Row = Vec<Value>;

/// Ordered tabular dataset with a fixed column set.
///
/// Every row holds exactly one value per column; absent fields are stored as
/// [`Value::Null`]. Transformations build new datasets instead of mutating
/// their inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from column names and rows of matching width.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        ensure_unique_columns(&columns)?;
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::InvalidDataset(format!(
                    "row {} has {} value(s), expected {}",
                    idx + 1,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a dataset with no rows.
    pub fn empty(columns: Vec<String>) -> Result<Self> {
        Self::new(columns, Vec::new())
    }

    /// Build a dataset from field mappings.
    ///
    /// Columns follow first-seen order across records; fields missing from a
    /// record become null.
    pub fn from_records<I, K>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<(K, Value)>>,
        K: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut lookup: HashMap<String, usize> = HashMap::new();
        let mut mapped: Vec<BTreeMap<usize, Value>> = Vec::new();

        for record in records {
            let mut fields = BTreeMap::new();
            for (name, value) in record {
                let name = name.into();
                let idx = match lookup.get(&name) {
                    Some(idx) => *idx,
                    None => {
                        columns.push(name.clone());
                        lookup.insert(name, columns.len() - 1);
                        columns.len() - 1
                    }
                };
                fields.insert(idx, value);
            }
            mapped.push(fields);
        }

        let width = columns.len();
        let rows = mapped
            .into_iter()
            .map(|mut fields| {
                (0..width)
                    .map(|idx| fields.remove(&idx).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Value at `row` for the named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|values| values.get(idx))
    }

    /// Iterate over the values of one column.
    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    /// Number of null values in one column.
    pub fn null_count(&self, idx: usize) -> usize {
        self.column_values(idx).filter(|value| value.is_null()).count()
    }

    /// Record view as `(field, value)` pairs.
    pub fn record(&self, row: usize) -> Option<Vec<(&str, &Value)>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(values.iter())
                .collect(),
        )
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Row>) {
        (self.columns, self.rows)
    }
}

fn ensure_unique_columns(columns: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.as_str()) {
            return Err(Error::InvalidDataset(format!(
                "duplicate column name: {column}"
            )));
        }
    }
    Ok(())
}
