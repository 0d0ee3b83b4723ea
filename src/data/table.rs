//! In-memory tables
//!
//! `DataTable` is the loose, string-or-number view of a source file, exactly
//! as loaded. `LabeledMatrix` is the numeric working type the figures reshape,
//! with `NaN` standing in for missing values.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::io::Write;

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;

use crate::error::{ReportError, Result};

/// One table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw field from a delimited file
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        match s {
            "" | "NA" | "NaN" | "nan" | "null" | "None" => Cell::Missing,
            _ => match s.parse::<f64>() {
                Ok(v) if v.is_finite() => Cell::Number(v),
                _ => Cell::Text(s.to_string()),
            },
        }
    }

    pub fn number(v: f64) -> Self {
        if v.is_nan() {
            Cell::Missing
        } else {
            Cell::Number(v)
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Number(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// File format of a stored table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited(u8),
    Parquet,
}

impl TableFormat {
    /// Pick the format from a file name or key
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Ok(TableFormat::Delimited(b',')),
            "tsv" | "txt" => Ok(TableFormat::Delimited(b'\t')),
            "parquet" => Ok(TableFormat::Parquet),
            _ => Err(ReportError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Guess the delimiter of an uploaded file from its header line
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    [b',', b'\t', b';', b'|']
        .into_iter()
        .map(|d| (d, header.iter().filter(|b| **b == d).count()))
        .filter(|(_, n)| *n > 0)
        .max_by_key(|(_, n)| *n)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

/// Row-major table with named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DataTable {
    /// The "absent" sentinel returned by every failed load
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width, Cell::Missing);
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like `column_index`, but a missing column is an error
    pub fn require(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let j = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(j))
    }

    /// Column values rendered as strings (missing cells become "")
    pub fn text_column(&self, name: &str) -> Result<Vec<String>> {
        let j = self.require(name)?;
        Ok(self.rows.iter().map(|r| r[j].to_string()).collect())
    }

    /// Column values as numbers (non-numeric cells become NaN)
    pub fn number_column(&self, name: &str) -> Result<Vec<f64>> {
        let j = self.require(name)?;
        Ok(self
            .rows
            .iter()
            .map(|r| r[j].as_f64().unwrap_or(f64::NAN))
            .collect())
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(j) = self.column_index(from) {
            self.columns[j] = to.to_string();
        }
    }

    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|j| !names.contains(&self.columns[*j].as_str()))
            .collect();
        self.columns = keep.iter().map(|j| self.columns[*j].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|j| row[*j].clone()).collect();
        }
    }

    pub fn push_column(&mut self, name: &str, values: Vec<Cell>) {
        self.columns.push(name.to_string());
        for (row, v) in self.rows.iter_mut().zip(values) {
            row.push(v);
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, Cell::Missing);
        }
    }

    /// Keep only the rows matching the predicate
    pub fn filter_rows(&self, mut keep: impl FnMut(&[Cell]) -> bool) -> DataTable {
        DataTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Project onto the named columns, silently skipping absent ones
    pub fn select(&self, names: &[&str]) -> DataTable {
        let idx: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        DataTable {
            columns: idx.iter().map(|j| self.columns[*j].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|r| idx.iter().map(|j| r[*j].clone()).collect())
                .collect(),
        }
    }

    /// Distinct rows in first-seen order
    pub fn distinct(&self) -> DataTable {
        let mut seen = BTreeSet::new();
        let rows = self
            .rows
            .iter()
            .filter(|r| seen.insert(r.iter().map(|c| c.to_string()).collect::<Vec<_>>()))
            .cloned()
            .collect();
        DataTable {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Split `column` on `sep` and emit one row per piece
    pub fn explode(&self, column: &str, sep: char) -> Result<DataTable> {
        let j = self.require(column)?;
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            match &row[j] {
                Cell::Text(s) if s.contains(sep) => {
                    for piece in s.split(sep).map(str::trim).filter(|p| !p.is_empty()) {
                        let mut r = row.clone();
                        r[j] = Cell::text(piece);
                        rows.push(r);
                    }
                }
                _ => rows.push(row.clone()),
            }
        }
        Ok(DataTable {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Long-to-wide reshape; duplicate (index, column) pairs are averaged.
    /// Rows and columns come out sorted.
    pub fn pivot(&self, index: &str, columns: &str, values: &str) -> Result<LabeledMatrix> {
        let (ri, ci, vi) = (self.require(index)?, self.require(columns)?, self.require(values)?);
        let mut acc: BTreeMap<String, BTreeMap<String, (f64, usize)>> = BTreeMap::new();
        let mut col_names = BTreeSet::new();
        for row in &self.rows {
            let Some(v) = row[vi].as_f64() else { continue };
            let (r, c) = (row[ri].to_string(), row[ci].to_string());
            col_names.insert(c.clone());
            let slot = acc.entry(r).or_default().entry(c).or_insert((0.0, 0));
            slot.0 += v;
            slot.1 += 1;
        }
        let col_names: Vec<String> = col_names.into_iter().collect();
        let mut matrix = LabeledMatrix::filled(
            acc.keys().cloned().collect(),
            col_names.clone(),
            f64::NAN,
        );
        for (i, cols) in acc.values().enumerate() {
            for (j, name) in col_names.iter().enumerate() {
                if let Some((sum, n)) = cols.get(name) {
                    matrix.values[i][j] = sum / *n as f64;
                }
            }
        }
        Ok(matrix)
    }

    // ── Readers ──

    pub fn from_bytes(bytes: &[u8], format: TableFormat) -> Result<Self> {
        match format {
            TableFormat::Delimited(d) => Self::read_delimited(bytes, d),
            TableFormat::Parquet => Self::read_parquet(bytes),
        }
    }

    pub fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let columns: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect());
        }
        Ok(Self::new(columns, rows))
    }

    pub fn read_parquet(bytes: &[u8]) -> Result<Self> {
        let reader = SerializedFileReader::new(bytes::Bytes::copy_from_slice(bytes))?;
        let columns: Vec<String> = reader
            .metadata()
            .file_metadata()
            .schema()
            .get_fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect();

        let mut rows = Vec::with_capacity(reader.metadata().file_metadata().num_rows() as usize);
        for row in reader.get_row_iter(None)? {
            let row = row?;
            rows.push(row.get_column_iter().map(|(_, f)| field_to_cell(f)).collect());
        }
        Ok(Self::new(columns, rows))
    }

    // ── Writer ──

    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|c| c.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn field_to_cell(field: &Field) -> Cell {
    match field {
        Field::Null => Cell::Missing,
        Field::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Field::Byte(v) => Cell::Number(*v as f64),
        Field::Short(v) => Cell::Number(*v as f64),
        Field::Int(v) => Cell::Number(*v as f64),
        Field::Long(v) => Cell::Number(*v as f64),
        Field::UByte(v) => Cell::Number(*v as f64),
        Field::UShort(v) => Cell::Number(*v as f64),
        Field::UInt(v) => Cell::Number(*v as f64),
        Field::ULong(v) => Cell::Number(*v as f64),
        Field::Float(v) => Cell::number(*v as f64),
        Field::Double(v) => Cell::number(*v),
        Field::Str(s) if s.is_empty() => Cell::Missing,
        Field::Str(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

/// Numeric matrix with row and column labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledMatrix {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// Row-major, `values[row][column]`
    pub values: Vec<Vec<f64>>,
}

impl LabeledMatrix {
    pub fn new(rows: Vec<String>, columns: Vec<String>, values: Vec<Vec<f64>>) -> Self {
        Self {
            rows,
            columns,
            values,
        }
    }

    pub fn filled(rows: Vec<String>, columns: Vec<String>, value: f64) -> Self {
        let values = vec![vec![value; columns.len()]; rows.len()];
        Self {
            rows,
            columns,
            values,
        }
    }

    /// Take `index` as row labels and every other listed column as values.
    /// With no value columns given, every column except the index is used.
    pub fn from_table(table: &DataTable, index: &str, value_columns: &[&str]) -> Result<Self> {
        let ri = table.require(index)?;
        let cols: Vec<usize> = if value_columns.is_empty() {
            (0..table.n_cols()).filter(|j| *j != ri).collect()
        } else {
            value_columns
                .iter()
                .map(|c| table.require(c))
                .collect::<Result<_>>()?
        };
        Ok(Self {
            rows: table.rows.iter().map(|r| r[ri].to_string()).collect(),
            columns: cols.iter().map(|j| table.columns[*j].clone()).collect(),
            values: table
                .rows
                .iter()
                .map(|r| {
                    cols.iter()
                        .map(|j| r[*j].as_f64().unwrap_or(f64::NAN))
                        .collect()
                })
                .collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, j: usize) -> Vec<f64> {
        self.values.iter().map(|r| r[j]).collect()
    }

    pub fn set_column(&mut self, j: usize, values: &[f64]) {
        for (row, v) in self.values.iter_mut().zip(values) {
            row[j] = *v;
        }
    }

    /// Apply `f` to every value
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows.clone(),
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|r| r.iter().map(|v| f(*v)).collect())
                .collect(),
        }
    }

    pub fn transpose(&self) -> Self {
        let values = (0..self.n_cols()).map(|j| self.column(j)).collect();
        Self {
            rows: self.columns.clone(),
            columns: self.rows.clone(),
            values,
        }
    }

    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            rows: indices.iter().map(|i| self.rows[*i].clone()).collect(),
            columns: self.columns.clone(),
            values: indices.iter().map(|i| self.values[*i].clone()).collect(),
        }
    }

    pub fn select_columns(&self, indices: &[usize]) -> Self {
        Self {
            rows: self.rows.clone(),
            columns: indices.iter().map(|j| self.columns[*j].clone()).collect(),
            values: self
                .values
                .iter()
                .map(|r| indices.iter().map(|j| r[*j]).collect())
                .collect(),
        }
    }

    /// Keep columns whose label is in `names`, preserving matrix order
    pub fn retain_columns(&self, names: &BTreeSet<String>) -> Self {
        let idx: Vec<usize> = (0..self.n_cols())
            .filter(|j| names.contains(&self.columns[*j]))
            .collect();
        self.select_columns(&idx)
    }

    /// Contiguous window of rows, clamped to the matrix
    pub fn row_window(&self, start: usize, len: usize) -> Self {
        let start = start.min(self.n_rows());
        let end = (start + len).min(self.n_rows());
        self.select_rows(&(start..end).collect::<Vec<_>>())
    }

    /// Drop rows whose label was already seen
    pub fn dedup_rows(&self) -> Self {
        let mut seen = HashMap::new();
        let idx: Vec<usize> = (0..self.n_rows())
            .filter(|i| seen.insert(self.rows[*i].clone(), ()).is_none())
            .collect();
        self.select_rows(&idx)
    }

    /// Finite values of one column
    pub fn finite_column(&self, j: usize) -> Vec<f64> {
        self.values
            .iter()
            .map(|r| r[j])
            .filter(|v| v.is_finite())
            .collect()
    }

    pub fn to_table(&self, index_name: &str) -> DataTable {
        let mut columns = vec![index_name.to_string()];
        columns.extend(self.columns.iter().cloned());
        let rows = self
            .rows
            .iter()
            .zip(&self.values)
            .map(|(label, vals)| {
                let mut r = vec![Cell::text(label.clone())];
                r.extend(vals.iter().map(|v| Cell::number(*v)));
                r
            })
            .collect();
        DataTable { columns, rows }
    }
}
