//! crates/production_tracker_core/src/normalize.rs
//!
//! Turns loosely-typed payloads (remote spreadsheet responses, stored blobs) into
//! canonical records in two steps:
//!
//! 1. `decode_table` checks the shape of the payload and binds positional rows to
//!    column names. Positional rows are only accepted when the payload says which
//!    columns they hold, either through a header row or a schema version.
//! 2. `Normalizer` coerces each keyed record into its entity. Absent fields take
//!    defaults; present fields that cannot be read as their type are rejected.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::clock::site_offset;
use crate::domain::{
    ActivityLog, Category, Collection, OffDay, ProcessType, ProductionEntry, Role, Unit, User,
};

/// A record keyed by canonical (camelCase) field name.
pub type FieldMap = Map<String, Value>;

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not a table: {0}")]
    NotATable(String),
    #[error("positional rows carry no header row or schema version")]
    MissingSchema,
    #[error("unsupported schema version {0}")]
    UnsupportedSchemaVersion(String),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("row has {found} values but the layout has {expected} columns")]
    TooManyValues { expected: usize, found: usize },
    #[error("unsupported record shape: {0}")]
    UnsupportedShape(&'static str),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invalid value for field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// A single row that could not be decoded. The rest of its table is unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub index: usize,
    pub error: DecodeError,
}

//=========================================================================================
// Column layouts
//=========================================================================================

const PRODUCTION_COLUMNS: &[&str] = &[
    "id",
    "date",
    "category",
    "process",
    "productName",
    "planQuantity",
    "actualQuantity",
    "unit",
    "batchNo",
    "manpower",
    "lastUpdatedBy",
    "updatedAt",
    "remark",
];
const OFF_DAY_COLUMNS: &[&str] = &["id", "date", "description", "createdBy"];
const LOG_COLUMNS: &[&str] = &["id", "timestamp", "userId", "userName", "action", "details"];
const USER_COLUMNS: &[&str] = &[
    "id", "name", "username", "email", "role", "category", "password", "avatar",
];

/// The only positional schema version the spreadsheet has ever produced.
pub const LEGACY_SCHEMA_VERSION: u64 = 1;

/// The canonical fields of a collection, in legacy column order.
pub fn columns_of(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Production => PRODUCTION_COLUMNS,
        Collection::OffDays => OFF_DAY_COLUMNS,
        Collection::Logs => LOG_COLUMNS,
        Collection::Users => USER_COLUMNS,
    }
}

/// Lowercases and strips everything but letters and digits, so that
/// `Product Name`, `product_name` and `productName` compare equal.
fn column_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Maps positional values to canonical field names.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    columns: Vec<&'static str>,
}

impl ColumnLayout {
    /// The fixed column order of schema version 1.
    pub fn legacy(collection: Collection) -> Self {
        Self {
            columns: columns_of(collection).to_vec(),
        }
    }

    /// Builds a layout from header cells naming the columns.
    pub fn from_header(collection: Collection, header: &[Value]) -> Result<Self, DecodeError> {
        let known = columns_of(collection);
        let columns = header
            .iter()
            .map(|cell| {
                let name = cell.as_str().ok_or_else(|| {
                    DecodeError::NotATable("header cells must be strings".to_string())
                })?;
                let key = column_key(name);
                known
                    .iter()
                    .copied()
                    .find(|field| column_key(field) == key)
                    .ok_or_else(|| DecodeError::UnknownColumn(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { columns })
    }

    /// Whether a row looks like a header for this collection: every cell is a
    /// string naming a known column.
    fn is_header(collection: Collection, row: &[Value]) -> bool {
        !row.is_empty() && Self::from_header(collection, row).is_ok()
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Binds a positional row. Short rows leave the trailing fields absent.
    pub fn bind(&self, values: &[Value]) -> Result<FieldMap, DecodeError> {
        if values.len() > self.columns.len() {
            return Err(DecodeError::TooManyValues {
                expected: self.columns.len(),
                found: values.len(),
            });
        }
        Ok(self
            .columns
            .iter()
            .zip(values)
            .filter(|(_, value)| !value.is_null())
            .map(|(column, value)| (column.to_string(), value.clone()))
            .collect())
    }
}

//=========================================================================================
// Shape decoding
//=========================================================================================

/// The keyed records of a payload plus the rows that were rejected on shape.
/// Indices count rows of the payload itself, header row included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedTable {
    pub records: Vec<(usize, FieldMap)>,
    pub rejected: Vec<RowError>,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validates the shape of a collection payload.
///
/// Accepted shapes:
/// * `[{..}, {..}]`: keyed records;
/// * `[["id", "date", ..], [..], ..]`: a header row followed by positional rows;
/// * `{"schemaVersion": 1, "rows": [..]}`: rows in the legacy column order;
/// * `{"columns": [..], "rows": [..]}`: rows in the named column order.
///
/// Positional rows without a header or version fail the whole table with
/// `DecodeError::MissingSchema`.
pub fn decode_table(collection: Collection, payload: &Value) -> Result<DecodedTable, DecodeError> {
    match payload {
        Value::Array(items) => {
            let header = match items.first() {
                Some(Value::Array(cells)) if ColumnLayout::is_header(collection, cells) => {
                    Some(ColumnLayout::from_header(collection, cells)?)
                }
                _ => None,
            };
            let skip = usize::from(header.is_some());
            decode_rows(&items[skip..], skip, header.as_ref())
        }
        Value::Object(envelope) => {
            let rows = match envelope.get("rows") {
                Some(Value::Array(rows)) => rows,
                Some(other) => {
                    return Err(DecodeError::NotATable(format!(
                        "'rows' is {}",
                        kind_of(other)
                    )))
                }
                None => return Err(DecodeError::NotATable("object without 'rows'".to_string())),
            };
            let layout = match (envelope.get("columns"), envelope.get("schemaVersion")) {
                (Some(Value::Array(columns)), _) => {
                    Some(ColumnLayout::from_header(collection, columns)?)
                }
                (Some(other), _) => {
                    return Err(DecodeError::NotATable(format!(
                        "'columns' is {}",
                        kind_of(other)
                    )))
                }
                (None, Some(version)) => match version.as_u64() {
                    Some(LEGACY_SCHEMA_VERSION) => Some(ColumnLayout::legacy(collection)),
                    _ => return Err(DecodeError::UnsupportedSchemaVersion(version.to_string())),
                },
                (None, None) => None,
            };
            decode_rows(rows, 0, layout.as_ref())
        }
        other => Err(DecodeError::NotATable(format!("payload is {}", kind_of(other)))),
    }
}

fn decode_rows(
    rows: &[Value],
    offset: usize,
    layout: Option<&ColumnLayout>,
) -> Result<DecodedTable, DecodeError> {
    let mut table = DecodedTable::default();
    for (i, row) in rows.iter().enumerate() {
        let index = offset + i;
        match row {
            Value::Object(map) => table.records.push((index, map.clone())),
            Value::Array(values) => {
                let layout = layout.ok_or(DecodeError::MissingSchema)?;
                match layout.bind(values) {
                    Ok(record) => table.records.push((index, record)),
                    Err(error) => table.rejected.push(RowError { index, error }),
                }
            }
            other => table.rejected.push(RowError {
                index,
                error: DecodeError::UnsupportedShape(kind_of(other)),
            }),
        }
    }
    Ok(table)
}

//=========================================================================================
// Field coercion
//=========================================================================================

/// Returns the value of a field unless it is absent, null or blank.
fn present<'a>(record: &'a FieldMap, field: &str) -> Option<&'a Value> {
    match record.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(value) => Some(value),
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> DecodeError {
    DecodeError::InvalidField {
        field,
        reason: reason.into(),
    }
}

/// Renders whole numbers without a fractional part, as spreadsheets show them.
fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

fn optional_text(record: &FieldMap, field: &'static str) -> Result<Option<String>, DecodeError> {
    match present(record, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(number_text(n))),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(invalid(field, format!("expected text, found {}", kind_of(other)))),
    }
}

fn text(record: &FieldMap, field: &'static str, default: &str) -> Result<String, DecodeError> {
    Ok(optional_text(record, field)?.unwrap_or_else(|| default.to_string()))
}

fn number(record: &FieldMap, field: &'static str) -> Result<f64, DecodeError> {
    let parsed = match present(record, field) {
        None => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', "").parse::<f64>().ok(),
        Some(other) => {
            return Err(invalid(
                field,
                format!("expected a number, found {}", kind_of(other)),
            ))
        }
    };
    match parsed {
        Some(value) if value.is_finite() => Ok(value),
        _ => Err(invalid(field, "not a finite number")),
    }
}

fn record_id(record: &FieldMap) -> Result<String, DecodeError> {
    Ok(optional_text(record, "id")?.unwrap_or_else(|| Uuid::new_v4().to_string()))
}

/// Reduces a date or timestamp to its `YYYY-MM-DD` day in site-local time.
/// Absent dates become the empty string; callers drop those records.
fn date(record: &FieldMap, field: &'static str) -> Result<String, DecodeError> {
    let Some(raw) = optional_text(record, field)? else {
        return Ok(String::new());
    };
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant
            .with_timezone(&site_offset())
            .date_naive()
            .format("%Y-%m-%d")
            .to_string());
    }
    let day = raw
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| invalid(field, format!("'{raw}' is not a calendar date")))
}

fn parsed<T>(
    record: &FieldMap,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, DecodeError> {
    match optional_text(record, field)? {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or_else(|| invalid(field, format!("unknown value '{raw}'"))),
    }
}

//=========================================================================================
// Normalizer
//=========================================================================================

/// Coerces keyed records into entities.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fallback_timestamp: String,
}

impl Normalizer {
    /// `fallback_timestamp` fills timestamp fields that are absent.
    pub fn new(fallback_timestamp: impl Into<String>) -> Self {
        Self {
            fallback_timestamp: fallback_timestamp.into(),
        }
    }

    pub fn production(&self, record: &FieldMap) -> Result<ProductionEntry, DecodeError> {
        Ok(ProductionEntry {
            id: record_id(record)?,
            date: date(record, "date")?,
            category: parsed(record, "category", Category::parse)?.unwrap_or(Category::Healthcare),
            process: parsed(record, "process", ProcessType::parse)?.unwrap_or(ProcessType::Mixing),
            product_name: text(record, "productName", "Unknown")?,
            plan_quantity: number(record, "planQuantity")?,
            actual_quantity: number(record, "actualQuantity")?,
            unit: parsed(record, "unit", Unit::parse)?.unwrap_or_default(),
            batch_no: text(record, "batchNo", "")?,
            manpower: number(record, "manpower")?,
            remark: text(record, "remark", "")?,
            last_updated_by: text(record, "lastUpdatedBy", "")?,
            updated_at: text(record, "updatedAt", &self.fallback_timestamp)?,
        })
    }

    pub fn off_day(&self, record: &FieldMap) -> Result<OffDay, DecodeError> {
        Ok(OffDay {
            id: record_id(record)?,
            date: date(record, "date")?,
            description: text(record, "description", "Holiday")?,
            created_by: text(record, "createdBy", "System")?,
        })
    }

    pub fn log(&self, record: &FieldMap) -> Result<ActivityLog, DecodeError> {
        Ok(ActivityLog {
            id: record_id(record)?,
            timestamp: text(record, "timestamp", &self.fallback_timestamp)?,
            user_id: text(record, "userId", "")?,
            user_name: text(record, "userName", "System")?,
            action: text(record, "action", "LOG")?,
            details: text(record, "details", "")?,
        })
    }

    /// Users need a username; everything else has a default. Missing roles
    /// fall back to the least privileged one.
    pub fn user(&self, record: &FieldMap) -> Result<User, DecodeError> {
        let username =
            optional_text(record, "username")?.ok_or(DecodeError::MissingField("username"))?;
        Ok(User {
            id: record_id(record)?,
            name: text(record, "name", &username)?,
            email: text(record, "email", "")?,
            role: parsed(record, "role", Role::parse)?.unwrap_or(Role::Operator),
            category: parsed(record, "category", Category::parse)?,
            password: optional_text(record, "password")?,
            avatar: optional_text(record, "avatar")?,
            username,
        })
    }

    /// Normalizes every record of a decoded table. Shape rejections carry over;
    /// records that fail normalization are added to them, and records that
    /// normalize but cannot be stored (no date) are counted as dropped.
    pub fn table<T: NormalizedRecord>(&self, table: DecodedTable) -> Normalized<T> {
        let mut out = Normalized {
            records: Vec::with_capacity(table.records.len()),
            rejected: table.rejected,
            dropped: 0,
        };
        for (index, record) in &table.records {
            match T::normalize(self, record) {
                Ok(item) if item.is_storable() => out.records.push(item),
                Ok(_) => out.dropped += 1,
                Err(error) => out.rejected.push(RowError {
                    index: *index,
                    error,
                }),
            }
        }
        out.rejected.sort_by_key(|row| row.index);
        out
    }

    /// `decode_table` followed by `table`.
    pub fn payload<T: NormalizedRecord>(&self, payload: &Value) -> Result<Normalized<T>, DecodeError> {
        Ok(self.table(decode_table(T::COLLECTION, payload)?))
    }
}

/// The outcome of normalizing a whole table.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub rejected: Vec<RowError>,
    pub dropped: usize,
}

/// An entity that lives in one of the four collections.
pub trait NormalizedRecord: Sized + Serialize + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn normalize(normalizer: &Normalizer, record: &FieldMap) -> Result<Self, DecodeError>;

    /// Whether the record may be written to storage.
    fn is_storable(&self) -> bool {
        true
    }
}

impl NormalizedRecord for ProductionEntry {
    const COLLECTION: Collection = Collection::Production;

    fn normalize(normalizer: &Normalizer, record: &FieldMap) -> Result<Self, DecodeError> {
        normalizer.production(record)
    }

    fn is_storable(&self) -> bool {
        !self.date.is_empty()
    }
}

impl NormalizedRecord for OffDay {
    const COLLECTION: Collection = Collection::OffDays;

    fn normalize(normalizer: &Normalizer, record: &FieldMap) -> Result<Self, DecodeError> {
        normalizer.off_day(record)
    }

    fn is_storable(&self) -> bool {
        !self.date.is_empty()
    }
}

impl NormalizedRecord for ActivityLog {
    const COLLECTION: Collection = Collection::Logs;

    fn normalize(normalizer: &Normalizer, record: &FieldMap) -> Result<Self, DecodeError> {
        normalizer.log(record)
    }
}

impl NormalizedRecord for User {
    const COLLECTION: Collection = Collection::Users;

    fn normalize(normalizer: &Normalizer, record: &FieldMap) -> Result<Self, DecodeError> {
        normalizer.user(record)
    }
}
