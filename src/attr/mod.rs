//! Typed attribute access over raw fixed-width columns.
//!
//! The store holds every value as already-recoded text; this module maps
//! between that text and typed values under an inferred
//! [`FieldDescriptor`](crate::schema::FieldDescriptor). Writing can widen a
//! column in place when a value does not fit its declared width; it never
//! narrows one.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::error::ShapeResult;
use crate::schema::{FieldDescriptor, FieldSubtype, FieldType};
use crate::store::{AttributeStore, NativeField};

/// Hard cap on text column width. Values longer than this are truncated at a
/// character boundary.
pub const MAX_FIELD_WIDTH: usize = 254;

/// Integers above this magnitude are not exactly representable as doubles,
/// so storing them through a zero-precision real column loses digits.
const MAX_EXACT_DOUBLE: f64 = 9_007_199_254_740_992.0;

/// A calendar date. Plain year/month/day triple with no timezone or time of
/// day; conversion to [`NaiveDate`] is fallible because stored dates can be
/// out of calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    /// Full year.
    pub year: i32,
    /// Month, 1 to 12.
    pub month: u32,
    /// Day of month, 1 to 31.
    pub day: u32,
}

impl DateValue {
    /// Creates a date value.
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// This date as a validated calendar date.
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for DateValue {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// A typed attribute value. Null is represented by the absence of a value,
/// not by a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// 32-bit integer.
    Integer(i32),
    /// 64-bit integer.
    Integer64(i64),
    /// Double-precision real.
    Real(f64),
    /// Text.
    String(String),
    /// Calendar date.
    Date(DateValue),
}

/// Reads and writes typed attribute values, widening columns on demand.
///
/// One codec instance corresponds to one session over a layer; it owns the
/// per-field truncation warnings and the precision-loss warning budget.
#[derive(Debug, Default)]
pub struct AttributeCodec {
    truncation_warned: HashSet<usize>,
    precision_warn_count: usize,
}

impl AttributeCodec {
    /// Creates a codec with fresh warning state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one typed value. `None` means the cell is unset, stores an
    /// empty string in a text column, or stores an all-zero date.
    pub fn read(
        &self,
        store: &dyn AttributeStore,
        field: &FieldDescriptor,
        field_index: usize,
        row: usize,
    ) -> Option<AttributeValue> {
        let raw = store.read_raw(row, field_index)?;
        match field.field_type {
            FieldType::String => {
                if raw.is_empty() {
                    None
                } else {
                    Some(AttributeValue::String(raw))
                }
            }
            FieldType::Integer if field.subtype == FieldSubtype::Boolean => {
                let truthy = matches!(raw.chars().next(), Some('T' | 't' | 'Y' | 'y'));
                Some(AttributeValue::Integer(i32::from(truthy)))
            }
            FieldType::Integer => Some(AttributeValue::Integer(
                raw.trim().parse().unwrap_or_default(),
            )),
            FieldType::Integer64 => Some(AttributeValue::Integer64(
                raw.trim().parse().unwrap_or_default(),
            )),
            FieldType::Real => Some(AttributeValue::Real(
                raw.trim().parse().unwrap_or_default(),
            )),
            FieldType::Date => parse_date(&raw).map(AttributeValue::Date),
        }
    }

    /// Writes one typed value, widening the column first when the rendered
    /// text exceeds the declared width. `None` clears the cell.
    pub fn write(
        &mut self,
        store: &mut dyn AttributeStore,
        field: &mut FieldDescriptor,
        field_index: usize,
        row: usize,
        value: Option<&AttributeValue>,
    ) -> ShapeResult<()> {
        let Some(value) = value else {
            return store.write_raw(row, field_index, None);
        };
        match value {
            AttributeValue::String(text) => {
                self.write_string(store, field, field_index, row, text)
            }
            AttributeValue::Integer(v) if field.subtype == FieldSubtype::Boolean => {
                store.write_raw(row, field_index, Some(if *v != 0 { "T" } else { "F" }))
            }
            AttributeValue::Integer(v) => {
                self.write_integer(store, field, field_index, row, i64::from(*v))
            }
            AttributeValue::Integer64(v) => {
                self.write_integer(store, field, field_index, row, *v)
            }
            AttributeValue::Real(v) => self.write_real(store, field, field_index, row, *v),
            AttributeValue::Date(date) => {
                if date.year < 0 || date.year > 9999 {
                    warn!(
                        "year {} out of range; unable to write to field {}",
                        date.year, field.name
                    );
                    return Ok(());
                }
                if date.year == 0 && date.month == 0 && date.day == 0 {
                    return store.write_raw(row, field_index, None);
                }
                let packed = date.year * 10_000 + date.month as i32 * 100 + date.day as i32;
                store.write_raw(row, field_index, Some(&packed.to_string()))
            }
        }
    }

    fn write_string(
        &mut self,
        store: &mut dyn AttributeStore,
        field: &mut FieldDescriptor,
        field_index: usize,
        row: usize,
        text: &str,
    ) -> ShapeResult<()> {
        let mut text = text;
        if text.len() > MAX_FIELD_WIDTH {
            // Cut at a character boundary so the stored text stays valid.
            let mut end = MAX_FIELD_WIDTH;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            if self.truncation_warned.insert(field_index) {
                warn!(
                    "value of field {} of record {row} truncated to {MAX_FIELD_WIDTH} \
                     characters; this warning will not be emitted again for this field",
                    field.name
                );
            }
            text = &text[..end];
        }
        if text.len() > field.width {
            grow_field(store, field, field_index, text.len())?;
        }
        store.write_raw(row, field_index, Some(text))
    }

    fn write_integer(
        &mut self,
        store: &mut dyn AttributeStore,
        field: &mut FieldDescriptor,
        field_index: usize,
        row: usize,
        value: i64,
    ) -> ShapeResult<()> {
        // Right-justified to the declared width, capped so huge declared
        // widths do not pad absurdly.
        let rendered = format!("{value:>width$}", width = field.width.min(31));
        if rendered.len() > field.width {
            grow_field(store, field, field_index, rendered.len())?;
        }
        store.write_raw(row, field_index, Some(&rendered))
    }

    fn write_real(
        &mut self,
        store: &mut dyn AttributeStore,
        field: &mut FieldDescriptor,
        field_index: usize,
        row: usize,
        value: f64,
    ) -> ShapeResult<()> {
        if field.precision == 0 && value.abs() > MAX_EXACT_DOUBLE {
            self.precision_warn_count += 1;
            if self.precision_warn_count <= 10 {
                warn!(
                    "value {value} stored in field {} of record {row} may lose precision",
                    field.name
                );
            }
        }
        if !store.write_double(row, field_index, value)? {
            warn!(
                "value {value} does not fit field {} of width {}; not written",
                field.name, field.width
            );
        }
        Ok(())
    }
}

/// Widens a column and keeps the descriptor in sync with the store.
fn grow_field(
    store: &mut dyn AttributeStore,
    field: &mut FieldDescriptor,
    field_index: usize,
    new_width: usize,
) -> ShapeResult<()> {
    warn!(
        "field {} extended from {} to {new_width} characters",
        field.name, field.width
    );
    let native = store.field_info(field_index);
    store.alter_field(
        field_index,
        NativeField::new(&native.name, native.native_type, new_width, native.precision),
    )?;
    field.width = new_width;
    Ok(())
}

/// Parses a stored date: either the split `MM/DD/YYYY` rendering or the
/// packed `YYYYMMDD` integer. All zeroes means no date.
fn parse_date(raw: &str) -> Option<DateValue> {
    let bytes = raw.as_bytes();
    if raw.len() >= 10 && bytes[2] == b'/' && bytes[5] == b'/' {
        let month: u32 = raw.get(0..2)?.parse().ok()?;
        let day: u32 = raw.get(3..5)?.parse().ok()?;
        let year: i32 = raw.get(6..10)?.parse().ok()?;
        return Some(DateValue::new(year, month, day));
    }
    let packed: i32 = raw.trim().parse().ok()?;
    if packed == 0 {
        return None;
    }
    Some(DateValue::new(
        packed / 10_000,
        (packed / 100 % 100) as u32,
        (packed % 100) as u32,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::store::memory::MemoryAttributeStore;
    use crate::store::NativeType;

    fn descriptor(field_type: FieldType, width: usize, precision: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: "F".to_string(),
            field_type,
            subtype: FieldSubtype::None,
            width,
            precision,
        }
    }

    fn store_for(native_type: NativeType, width: usize, precision: usize) -> MemoryAttributeStore {
        MemoryAttributeStore::with_fields(vec![NativeField::new("F", native_type, width, precision)])
    }

    #[test]
    fn string_round_trip_and_null() {
        let mut store = store_for(NativeType::Character, 10, 0);
        let mut field = descriptor(FieldType::String, 10, 0);
        let codec_read = AttributeCodec::new();
        let mut codec = AttributeCodec::new();

        codec
            .write(
                &mut store,
                &mut field,
                0,
                0,
                Some(&AttributeValue::String("abc".to_string())),
            )
            .unwrap();
        assert_eq!(
            codec_read.read(&store, &field, 0, 0),
            Some(AttributeValue::String("abc".to_string()))
        );

        codec.write(&mut store, &mut field, 0, 1, None).unwrap();
        assert_eq!(codec_read.read(&store, &field, 0, 1), None);

        // An empty stored string reads back as no value.
        store.write_raw(2, 0, Some("")).unwrap();
        assert_eq!(codec_read.read(&store, &field, 0, 2), None);
    }

    #[test]
    fn long_string_grows_the_field() {
        let mut store = store_for(NativeType::Character, 10, 0);
        let mut field = descriptor(FieldType::String, 10, 0);
        let mut codec = AttributeCodec::new();

        let text = "twenty-five characters!!!";
        assert_eq!(text.len(), 25);
        codec
            .write(
                &mut store,
                &mut field,
                0,
                0,
                Some(&AttributeValue::String(text.to_string())),
            )
            .unwrap();
        assert_eq!(field.width, 25);
        assert_eq!(store.field_info(0).width, 25);
        assert_eq!(store.read_raw(0, 0).as_deref(), Some(text));
    }

    #[test]
    fn oversized_string_truncates_at_char_boundary() {
        let mut store = store_for(NativeType::Character, MAX_FIELD_WIDTH, 0);
        let mut field = descriptor(FieldType::String, MAX_FIELD_WIDTH, 0);
        let mut codec = AttributeCodec::new();

        // 253 ASCII bytes then a 2-byte character straddling the cap.
        let text = format!("{}é", "x".repeat(253));
        assert_eq!(text.len(), 255);
        codec
            .write(
                &mut store,
                &mut field,
                0,
                0,
                Some(&AttributeValue::String(text)),
            )
            .unwrap();
        let stored = store.read_raw(0, 0).unwrap();
        assert_eq!(stored.len(), 253);
        assert!(stored.chars().all(|c| c == 'x'));
    }

    #[test]
    fn integer_is_right_justified_and_grows() {
        let mut store = store_for(NativeType::Double, 5, 0);
        let mut field = descriptor(FieldType::Integer, 5, 0);
        let mut codec = AttributeCodec::new();

        codec
            .write(&mut store, &mut field, 0, 0, Some(&AttributeValue::Integer(42)))
            .unwrap();
        assert_eq!(store.read_raw(0, 0).as_deref(), Some("   42"));

        codec
            .write(
                &mut store,
                &mut field,
                0,
                1,
                Some(&AttributeValue::Integer(1234567890)),
            )
            .unwrap();
        assert_eq!(field.width, 10);
        assert_eq!(
            codec.read(&store, &field, 0, 1),
            Some(AttributeValue::Integer(1234567890))
        );
    }

    #[test]
    fn integer64_grows_narrow_field() {
        let mut store = store_for(NativeType::Double, 5, 0);
        let mut field = descriptor(FieldType::Integer64, 5, 0);
        let mut codec = AttributeCodec::new();

        codec
            .write(
                &mut store,
                &mut field,
                0,
                0,
                Some(&AttributeValue::Integer64(5_000_000_000)),
            )
            .unwrap();
        assert!(field.width >= 10);
        assert_eq!(
            codec.read(&store, &field, 0, 0),
            Some(AttributeValue::Integer64(5_000_000_000))
        );
    }

    #[test]
    fn real_write_and_overflow_is_not_fatal() {
        let mut store = store_for(NativeType::Double, 8, 2);
        let mut field = descriptor(FieldType::Real, 8, 2);
        let mut codec = AttributeCodec::new();

        codec
            .write(&mut store, &mut field, 0, 0, Some(&AttributeValue::Real(3.25)))
            .unwrap();
        let Some(AttributeValue::Real(read_back)) = codec.read(&store, &field, 0, 0) else {
            panic!("expected a real value");
        };
        approx::assert_relative_eq!(read_back, 3.25);

        // Too wide for the column: skipped with a warning, not an error.
        codec
            .write(
                &mut store,
                &mut field,
                0,
                1,
                Some(&AttributeValue::Real(123456789.5)),
            )
            .unwrap();
        assert_eq!(store.read_raw(1, 0), None);
    }

    #[test]
    fn boolean_subtype_round_trip() {
        let mut store = store_for(NativeType::Logical, 1, 0);
        let mut field = descriptor(FieldType::Integer, 1, 0);
        field.subtype = FieldSubtype::Boolean;
        let mut codec = AttributeCodec::new();

        codec
            .write(&mut store, &mut field, 0, 0, Some(&AttributeValue::Integer(1)))
            .unwrap();
        assert_eq!(store.read_raw(0, 0).as_deref(), Some("T"));
        assert_eq!(
            codec.read(&store, &field, 0, 0),
            Some(AttributeValue::Integer(1))
        );

        codec
            .write(&mut store, &mut field, 0, 1, Some(&AttributeValue::Integer(0)))
            .unwrap();
        assert_eq!(
            codec.read(&store, &field, 0, 1),
            Some(AttributeValue::Integer(0))
        );
    }

    #[test]
    fn date_reads_both_renderings() {
        let store = {
            let mut s = store_for(NativeType::Date, 8, 0);
            s.write_raw(0, 0, Some("20240131")).unwrap();
            s.write_raw(1, 0, Some("01/31/2024")).unwrap();
            s.write_raw(2, 0, Some("0")).unwrap();
            s
        };
        let field = descriptor(FieldType::Date, 10, 0);
        let codec = AttributeCodec::new();

        let expected = AttributeValue::Date(DateValue::new(2024, 1, 31));
        assert_eq!(codec.read(&store, &field, 0, 0), Some(expected.clone()));
        assert_eq!(codec.read(&store, &field, 0, 1), Some(expected));
        // All zeroes is the stored form of "no date".
        assert_eq!(codec.read(&store, &field, 0, 2), None);
    }

    #[test]
    fn date_writes_packed_form() {
        let mut store = store_for(NativeType::Date, 8, 0);
        let mut field = descriptor(FieldType::Date, 10, 0);
        let mut codec = AttributeCodec::new();

        codec
            .write(
                &mut store,
                &mut field,
                0,
                0,
                Some(&AttributeValue::Date(DateValue::new(1999, 12, 5))),
            )
            .unwrap();
        assert_eq!(store.read_raw(0, 0).as_deref(), Some("19991205"));

        // Out-of-range years are skipped, not errors.
        codec
            .write(
                &mut store,
                &mut field,
                0,
                1,
                Some(&AttributeValue::Date(DateValue::new(12345, 1, 1))),
            )
            .unwrap();
        assert_eq!(store.read_raw(1, 0), None);

        // The all-zero triple is stored as an explicit null.
        codec
            .write(
                &mut store,
                &mut field,
                0,
                2,
                Some(&AttributeValue::Date(DateValue::new(0, 0, 0))),
            )
            .unwrap();
        assert_eq!(store.read_raw(2, 0), None);
    }

    #[test]
    fn date_value_calendar_conversion() {
        assert_eq!(
            DateValue::new(2024, 2, 29).to_naive_date(),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert!(DateValue::new(2023, 2, 29).to_naive_date().is_none());
        assert_eq!(
            DateValue::from(NaiveDate::from_ymd_opt(2001, 7, 4).unwrap()),
            DateValue::new(2001, 7, 4)
        );
    }
}
