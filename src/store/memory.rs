//! In-memory record stores.
//!
//! Geometry records are held as wire bytes so codec round-trips exercise the
//! real record layout; attribute rows are held as already-recoded text.

use crate::error::{ShapeError, ShapeResult};
use crate::record::{wire, ShapeRecord, ShapeType};
use crate::store::{AttributeStore, GeometryStore, NativeField};

/// Vector-backed geometry record store.
#[derive(Debug, Clone)]
pub struct MemoryGeometryStore {
    shape_type: ShapeType,
    records: Vec<Vec<u8>>,
}

impl MemoryGeometryStore {
    /// Creates an empty store for the given layer shape type.
    pub fn new(shape_type: ShapeType) -> Self {
        Self {
            shape_type,
            records: Vec::new(),
        }
    }
}

impl GeometryStore for MemoryGeometryStore {
    fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    fn record_count(&self) -> usize {
        self.records.len()
    }

    fn read_record(&self, index: usize) -> ShapeResult<Option<ShapeRecord>> {
        match self.records.get(index) {
            Some(bytes) => Ok(Some(wire::decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn write_record(&mut self, index: Option<usize>, record: &ShapeRecord) -> ShapeResult<usize> {
        let bytes = wire::encode(record)?;
        match index {
            None => {
                self.records.push(bytes);
                Ok(self.records.len() - 1)
            }
            Some(i) if i < self.records.len() => {
                self.records[i] = bytes;
                Ok(i)
            }
            Some(i) if i == self.records.len() => {
                self.records.push(bytes);
                Ok(i)
            }
            Some(i) => Err(ShapeError::AppDefined(format!(
                "Attempt to write shape with feature id ({i}) past the end of the store"
            ))),
        }
    }
}

/// Vector-backed fixed-width attribute store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttributeStore {
    fields: Vec<NativeField>,
    rows: Vec<Vec<Option<String>>>,
    deleted: Vec<bool>,
}

impl MemoryAttributeStore {
    /// Creates an empty store with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the given columns.
    pub fn with_fields(fields: Vec<NativeField>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
            deleted: Vec::new(),
        }
    }

    /// Marks a row deleted.
    pub fn mark_deleted(&mut self, index: usize) {
        if self.deleted.len() <= index {
            self.deleted.resize(index + 1, false);
        }
        self.deleted[index] = true;
    }

    fn ensure_row(&mut self, index: usize) {
        while self.rows.len() <= index {
            self.rows.push(vec![None; self.fields.len()]);
        }
        let ncols = self.fields.len();
        let row = &mut self.rows[index];
        if row.len() < ncols {
            row.resize(ncols, None);
        }
    }
}

impl AttributeStore for MemoryAttributeStore {
    fn record_count(&self) -> usize {
        self.rows.len()
    }

    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn is_deleted(&self, index: usize) -> bool {
        self.deleted.get(index).copied().unwrap_or(false)
    }

    fn field_info(&self, field: usize) -> NativeField {
        self.fields[field].clone()
    }

    fn read_raw(&self, index: usize, field: usize) -> Option<String> {
        self.rows.get(index)?.get(field)?.clone()
    }

    fn write_raw(&mut self, index: usize, field: usize, value: Option<&str>) -> ShapeResult<()> {
        if field >= self.fields.len() {
            return Err(ShapeError::AppDefined(format!(
                "Attempt to write unknown field {field}"
            )));
        }
        self.ensure_row(index);
        self.rows[index][field] = value.map(|v| v.to_string());
        Ok(())
    }

    fn ensure_record(&mut self, index: usize) {
        self.ensure_row(index);
    }

    fn write_double(&mut self, index: usize, field: usize, value: f64) -> ShapeResult<bool> {
        let info = self.field_info(field);
        let rendered = format!("{value:.prec$}", prec = info.precision);
        if rendered.len() > info.width {
            return Ok(false);
        }
        self.write_raw(index, field, Some(&rendered))?;
        Ok(true)
    }

    fn alter_field(&mut self, field: usize, info: NativeField) -> ShapeResult<()> {
        if field >= self.fields.len() {
            return Err(ShapeError::AppDefined(format!(
                "Attempt to alter unknown field {field}"
            )));
        }
        self.fields[field] = info;
        Ok(())
    }

    fn add_field(&mut self, info: NativeField) {
        self.fields.push(info);
        for row in &mut self.rows {
            row.push(None);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::NativeType;

    #[test]
    fn geometry_store_append_and_replace() {
        let mut store = MemoryGeometryStore::new(ShapeType::Point);
        let rec = ShapeRecord {
            shape_type: ShapeType::Point,
            x: vec![3.0],
            y: vec![4.0],
            z: vec![],
            m: None,
            part_starts: None,
            part_types: None,
        };
        let idx = store.write_record(None, &rec).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(store.record_count(), 1);
        assert_eq!(store.read_record(0).unwrap().unwrap(), rec);
        assert!(store.read_record(5).unwrap().is_none());

        let null = ShapeRecord::null();
        store.write_record(Some(0), &null).unwrap();
        assert_eq!(store.read_record(0).unwrap().unwrap(), null);
        assert!(store.write_record(Some(7), &null).is_err());
    }

    #[test]
    fn attribute_store_rows_and_fields() {
        let mut store = MemoryAttributeStore::with_fields(vec![NativeField::new(
            "NAME",
            NativeType::Character,
            10,
            0,
        )]);
        store.write_raw(0, 0, Some("abc")).unwrap();
        assert_eq!(store.read_raw(0, 0).as_deref(), Some("abc"));
        store.write_raw(2, 0, None).unwrap();
        assert_eq!(store.record_count(), 3);
        assert_eq!(store.read_raw(1, 0), None);

        store.add_field(NativeField::new("NUM", NativeType::Double, 5, 1));
        assert_eq!(store.field_count(), 2);
        assert!(store.write_double(0, 1, 12.3).unwrap());
        assert_eq!(store.read_raw(0, 1).as_deref(), Some("12.3"));
        // 123456.7 needs 8 characters but only 5 are declared.
        assert!(!store.write_double(0, 1, 123456.7).unwrap());

        assert!(!store.is_deleted(0));
        store.mark_deleted(0);
        assert!(store.is_deleted(0));
    }
}
