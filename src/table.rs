use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::Serialize;

use crate::document::{DataFileRef, Scalar};
use crate::error::IsaError;

pub const SHIFTED_WHITESPACE_TYPE: &str = "Maxime-RDF";
pub const CSV_TYPE: &str = "CSV";
pub const TSV_TYPE: &str = "TSV";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValues {
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Float(values) => values.len(),
            ColumnValues::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            ColumnValues::Float(values) => Some(values),
            ColumnValues::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            ColumnValues::Text(values) => Some(values),
            ColumnValues::Float(_) => None,
        }
    }

    pub fn display_at(&self, row: usize) -> Option<String> {
        match self {
            ColumnValues::Float(values) => values.get(row).map(|v| v.to_string()),
            ColumnValues::Text(values) => values.get(row).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

/// Column-oriented table. All columns have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<Column>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Scalar>,
}

impl Table {
    /// Build a table from labelled rows. Labels must be unique and each row
    /// must have one cell per label. A column becomes numeric when every one
    /// of its cells parses as a float, and text otherwise.
    pub fn from_rows<S: AsRef<str>>(labels: Vec<String>, rows: &[Vec<S>]) -> Result<Self, String> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = labels.iter().find(|label| !seen.insert(label.as_str())) {
            return Err(format!("duplicate column label `{duplicate}`"));
        }
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != labels.len())
        {
            return Err(format!(
                "row {} has {} fields, expected {}",
                index + 1,
                row.len(),
                labels.len()
            ));
        }

        let columns = labels
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let cells = rows.iter().map(|row| cell(row, index));
                let numeric = cells
                    .clone()
                    .map(|cell| cell.parse::<f64>().ok())
                    .collect::<Option<Vec<_>>>();
                let values = match numeric {
                    Some(values) => ColumnValues::Float(values),
                    None => {
                        let parsed = cells.clone().filter(|c| c.parse::<f64>().is_ok()).count();
                        if parsed > 0 {
                            tracing::warn!(
                                column = %name,
                                numeric_cells = parsed,
                                "column mixes numbers and text, keeping it as text"
                            );
                        }
                        ColumnValues::Text(cells.map(str::to_string).collect())
                    }
                };
                Column { name, values }
            })
            .collect();

        Ok(Self {
            columns,
            attributes: BTreeMap::new(),
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Scalar> {
        &self.attributes
    }

    pub fn attach_attribute(&mut self, name: impl Into<String>, value: Scalar) {
        self.attributes.insert(name.into(), value);
    }

    /// Append a column repeating `value` on every row. Fails if a column of
    /// that name already exists.
    pub fn attach_column(&mut self, name: impl Into<String>, value: &Scalar) -> Result<(), IsaError> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(IsaError::ColumnExists(name));
        }
        let rows = self.row_count();
        let values = match value.as_f64() {
            Some(number) => ColumnValues::Float(vec![number; rows]),
            None => ColumnValues::Text(vec![value.to_string(); rows]),
        };
        self.columns.push(Column { name, values });
        Ok(())
    }
}

fn cell<S: AsRef<str>>(row: &[S], index: usize) -> &str {
    row[index].as_ref()
}

/// Parses one kind of data file into a [`Table`].
pub trait TableConverter: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Table, IsaError>;
}

impl<F> TableConverter for F
where
    F: Fn(&Path) -> Result<Table, IsaError> + Send + Sync,
{
    fn parse(&self, path: &Path) -> Result<Table, IsaError> {
        self(path)
    }
}

/// Maps a data file `type` tag to the converter that understands it.
pub struct ConverterRegistry {
    converters: HashMap<String, Box<dyn TableConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(SHIFTED_WHITESPACE_TYPE, ShiftedWhitespaceConverter);
        registry.register(CSV_TYPE, DelimitedConverter::new(b','));
        registry.register(TSV_TYPE, DelimitedConverter::new(b'\t'));
        registry
    }

    /// Register `converter` for `file_type`, returning the converter it
    /// replaces.
    pub fn register(
        &mut self,
        file_type: impl Into<String>,
        converter: impl TableConverter + 'static,
    ) -> Option<Box<dyn TableConverter>> {
        self.converters.insert(file_type.into(), Box::new(converter))
    }

    pub fn contains(&self, file_type: &str) -> bool {
        self.converters.contains_key(file_type)
    }

    pub fn types(&self) -> Vec<&str> {
        let mut types = self.converters.keys().map(String::as_str).collect::<Vec<_>>();
        types.sort_unstable();
        types
    }

    /// Parse the file named by `data_file`, taking its name as the path.
    pub fn materialize(&self, data_file: &DataFileRef) -> Result<Table, IsaError> {
        self.materialize_at(data_file, Path::new(&data_file.name))
    }

    /// Parse `data_file` from `path`. An unregistered type fails before the
    /// file is touched.
    pub fn materialize_at(&self, data_file: &DataFileRef, path: &Path) -> Result<Table, IsaError> {
        let converter = self
            .converters
            .get(&data_file.file_type)
            .ok_or_else(|| IsaError::UnknownFileType(data_file.file_type.clone()))?;
        tracing::debug!(
            file_type = %data_file.file_type,
            path = %path.display(),
            "materializing data file"
        );
        converter.parse(path)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Read a data file as text, decompressing `.gz` files on the way.
pub fn read_text(path: &Path) -> Result<String, IsaError> {
    let read_err = |err: std::io::Error| IsaError::DataFileRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let file = File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    let is_gz = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if is_gz {
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .map_err(read_err)?;
    } else {
        let mut file = file;
        file.read_to_end(&mut bytes).map_err(read_err)?;
    }
    String::from_utf8(bytes).map_err(|err| IsaError::TableFormat {
        path: path.to_path_buf(),
        message: format!("not valid UTF-8: {err}"),
    })
}

/// Whitespace-separated text whose header starts with a `#` comment marker.
///
/// The marker is not a column: labels are the header tokens after it. Data
/// rows carrying one token more than there are labels have their leading
/// token dropped, so every value lines up under the label that sits above
/// it once the marker is removed. Later `#` lines and blank lines are
/// skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftedWhitespaceConverter;

impl TableConverter for ShiftedWhitespaceConverter {
    fn parse(&self, path: &Path) -> Result<Table, IsaError> {
        let text = read_text(path)?;
        parse_shifted_whitespace(&text).map_err(|message| IsaError::TableFormat {
            path: path.to_path_buf(),
            message,
        })
    }
}

pub fn parse_shifted_whitespace(text: &str) -> Result<Table, String> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines.next().ok_or_else(|| "file is empty".to_string())?;
    let labels = header_labels(header)?;

    let mut rows = Vec::new();
    for (line_no, line) in lines {
        if line.starts_with('#') {
            continue;
        }
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        let row = if tokens.len() == labels.len() + 1 {
            tokens[1..].to_vec()
        } else if tokens.len() == labels.len() {
            tokens
        } else {
            return Err(format!(
                "line {line_no}: expected {} or {} fields, found {}",
                labels.len(),
                labels.len() + 1,
                tokens.len()
            ));
        };
        rows.push(row);
    }

    Table::from_rows(labels, &rows)
}

fn header_labels(header: &str) -> Result<Vec<String>, String> {
    let mut tokens = header.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    let glued = first
        .strip_prefix('#')
        .ok_or_else(|| "header does not start with a `#` marker".to_string())?;

    let labels = (!glued.is_empty())
        .then_some(glued)
        .into_iter()
        .chain(tokens)
        .map(str::to_string)
        .collect::<Vec<_>>();
    if labels.is_empty() {
        return Err("header has no column labels".to_string());
    }
    Ok(labels)
}

/// Delimited text with a header row, read with the `csv` crate.
#[derive(Debug, Clone, Copy)]
pub struct DelimitedConverter {
    delimiter: u8,
}

impl DelimitedConverter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl TableConverter for DelimitedConverter {
    fn parse(&self, path: &Path) -> Result<Table, IsaError> {
        let text = read_text(path)?;
        let format_err = |message: String| IsaError::TableFormat {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        let labels = reader
            .headers()
            .map_err(|err| format_err(err.to_string()))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|record| record.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|err| format_err(err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Table::from_rows(labels, &rows).map_err(format_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_marker_may_be_glued_to_first_label() {
        assert_eq!(header_labels("#r g(r)").unwrap(), vec!["r", "g(r)"]);
        assert_eq!(header_labels("# r g(r)").unwrap(), vec!["r", "g(r)"]);
    }

    #[test]
    fn header_without_marker_is_rejected() {
        assert!(header_labels("r g(r)").is_err());
        assert!(header_labels("#").is_err());
    }

    #[test]
    fn mixed_column_stays_text() {
        let table = Table::from_rows(vec!["a".to_string()], &[vec!["1"], vec!["n/a"]]).unwrap();
        assert_eq!(
            table.column("a").unwrap().values,
            ColumnValues::Text(vec!["1".to_string(), "n/a".to_string()])
        );
    }
}
