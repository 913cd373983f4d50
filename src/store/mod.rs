//! Record store contracts.
//!
//! The low-level fixed-record accessors are external collaborators; the
//! codecs only depend on these traits. [`memory`] provides in-process
//! implementations backed by plain vectors.

pub mod memory;

use crate::error::ShapeResult;
use crate::record::{ShapeRecord, ShapeType};

/// Native type code of a tabular attribute field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeType {
    /// Fixed-width character data.
    Character,
    /// Integer-valued numeric field.
    Integer,
    /// Numeric field with decimals.
    Double,
    /// Single-character logical field.
    Logical,
    /// Packed 8-digit date field.
    Date,
    /// Anything this crate does not understand.
    Invalid,
}

/// Per-column metadata of the fixed-width attribute format.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeField {
    /// Column name as stored.
    pub name: String,
    /// Native type code.
    pub native_type: NativeType,
    /// Declared field width in bytes.
    pub width: usize,
    /// Declared decimal count.
    pub precision: usize,
}

impl NativeField {
    /// Convenience constructor.
    pub fn new(name: &str, native_type: NativeType, width: usize, precision: usize) -> Self {
        Self {
            name: name.to_string(),
            native_type,
            width,
            precision,
        }
    }
}

/// Raw fixed-record geometry storage.
pub trait GeometryStore {
    /// The layer-wide shape type all records are expected to match.
    fn shape_type(&self) -> ShapeType;

    /// Number of geometry records.
    fn record_count(&self) -> usize;

    /// Reads one record. `Ok(None)` means the record is absent or unreadable,
    /// which decodes to "no geometry" rather than an error.
    fn read_record(&self, index: usize) -> ShapeResult<Option<ShapeRecord>>;

    /// Writes one record at `index`, or appends when `index` is `None`.
    /// Returns the index actually written.
    fn write_record(&mut self, index: Option<usize>, record: &ShapeRecord) -> ShapeResult<usize>;
}

/// Raw fixed-width tabular attribute storage.
pub trait AttributeStore {
    /// Number of attribute rows.
    fn record_count(&self) -> usize;

    /// Number of columns.
    fn field_count(&self) -> usize;

    /// Whether a row carries the deleted marker.
    fn is_deleted(&self, index: usize) -> bool;

    /// Column metadata.
    fn field_info(&self, field: usize) -> NativeField;

    /// Reads the stored value as text. `None` is the explicit null state.
    fn read_raw(&self, index: usize, field: usize) -> Option<String>;

    /// Writes a textual value, or the explicit null state for `None`. Rows
    /// past the current count are created on demand.
    fn write_raw(&mut self, index: usize, field: usize, value: Option<&str>) -> ShapeResult<()>;

    /// Materializes rows up to and including `index` without touching any
    /// cell. Needed for stores with no columns, where no cell write can
    /// advance the record count.
    fn ensure_record(&mut self, index: usize);

    /// Writes a double with the column's declared width/precision. `Ok(false)`
    /// means the value did not fit and nothing was stored.
    fn write_double(&mut self, index: usize, field: usize, value: f64) -> ShapeResult<bool>;

    /// Alters a column's metadata in place. Must succeed atomically; on
    /// failure the stored schema is unchanged.
    fn alter_field(&mut self, field: usize, info: NativeField) -> ShapeResult<()>;

    /// Appends a new column.
    fn add_field(&mut self, info: NativeField);
}
