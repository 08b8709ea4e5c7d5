//! Table payload stored on `table` blocks.
//!
//! The payload is the one bit-exact artifact of the block model: it
//! serializes to `{"rows":[{"cells":[...]}],"headerRowIndex":n}` and
//! round-trips identically. Older documents stored tables as a delimited
//! string; [`TablePayload::parse_legacy`] reads that shape but nothing
//! writes it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default cell delimiter of the legacy string shape
pub const LEGACY_CELL_DELIMITER: char = '|';

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableRow {
    pub cells: Vec<String>,
}

impl TableRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePayload {
    pub rows: Vec<TableRow>,
    pub header_row_index: usize,
}

impl TablePayload {
    /// Empty `rows` x `cols` grid with the first row as header
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows: (0..rows)
                .map(|_| TableRow {
                    cells: vec![String::new(); cols],
                })
                .collect(),
            header_row_index: 0,
        }
    }

    pub fn is_header_row(&self, row: usize) -> bool {
        row == self.header_row_index
    }

    /// Read a payload from a lenient JSON value.
    ///
    /// Degrades per row: a row without a `cells` array becomes an empty row,
    /// non-string cells are kept as their JSON text, and a missing or invalid
    /// `headerRowIndex` falls back to 0. Returns `None` only when the value is
    /// not an object with a `rows` array.
    pub fn from_value(value: &Value) -> Option<Self> {
        let rows = value.get("rows")?.as_array()?;
        let rows = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| match row.get("cells").and_then(Value::as_array) {
                Some(cells) => TableRow {
                    cells: cells.iter().map(cell_text).collect(),
                },
                None => {
                    log::warn!("table row {idx} has no cells array, keeping it empty");
                    TableRow::default()
                }
            })
            .collect();

        let header_row_index = value
            .get("headerRowIndex")
            .and_then(Value::as_u64)
            .map(|idx| idx as usize)
            .unwrap_or(0);

        Some(Self {
            rows,
            header_row_index,
        })
    }

    /// Parse the legacy string shape: rows split on `\n`, cells on
    /// `delimiter`, every cell trimmed, header row 0.
    pub fn parse_legacy(content: &str, delimiter: char) -> Self {
        let rows = content
            .trim()
            .split('\n')
            .map(|line| TableRow {
                cells: line
                    .split(delimiter)
                    .map(|cell| cell.trim().to_string())
                    .collect(),
            })
            .collect();

        Self {
            rows,
            header_row_index: 0,
        }
    }

    /// Migrate the `content` of a table block that carries no payload: a JSON
    /// payload first, the legacy string shape otherwise.
    pub fn from_stored(content: &str, delimiter: char) -> Self {
        serde_json::from_str::<Value>(content)
            .ok()
            .and_then(|value| Self::from_value(&value))
            .unwrap_or_else(|| Self::parse_legacy(content, delimiter))
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `deserialize_with` hook for the `table` field of a block
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<TablePayload>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| {
        let payload = TablePayload::from_value(&value);
        if payload.is_none() && !value.is_null() {
            log::warn!("ignoring malformed table payload: {value}");
        }
        payload
    }))
}
