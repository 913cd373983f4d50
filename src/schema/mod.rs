//! Attribute schema inference.
//!
//! Field descriptors are derived from the format's native per-column
//! metadata. The native format only distinguishes "integer-like" from
//! "float-like" by precision digits, not by actual range, so an optional
//! narrowing pass scans stored rows and demotes overly wide numeric types to
//! the narrowest type that is provably safe for the observed data.

use crate::geom::Dimension;
use crate::record::ShapeType;
use crate::store::{AttributeStore, NativeType};

/// Model-side attribute field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    Integer64,
    /// Double-precision real.
    Real,
    /// Text.
    String,
    /// Calendar date.
    Date,
}

/// Field subtype refining a [`FieldType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldSubtype {
    /// No refinement.
    #[default]
    None,
    /// Boolean stored as an integer.
    Boolean,
}

/// One attribute column: name, type, width, precision.
///
/// Width may be widened after creation (never narrowed); the other
/// attributes are fixed once the schema is built, except the one-shot
/// inference-time type demotion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Column name after encoding conversion.
    pub name: String,
    /// Model-side type.
    pub field_type: FieldType,
    /// Subtype tag.
    pub subtype: FieldSubtype,
    /// Declared width in characters.
    pub width: usize,
    /// Declared decimal count.
    pub precision: usize,
}

/// Base geometry family a layer declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Point layers.
    Point,
    /// MultiPoint layers.
    MultiPoint,
    /// Arc layers.
    LineString,
    /// Polygon layers.
    Polygon,
    /// No declared family (multipatch or null-typed layers); dimensional
    /// reconciliation is skipped for these.
    Unknown,
}

/// The layer's declared geometry type: family plus dimensional flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerGeometry {
    /// Geometry family.
    pub kind: GeometryKind,
    /// Declared Z/M presence.
    pub dimension: Dimension,
}

impl LayerGeometry {
    /// Derives the declared layer geometry from the store's shape type.
    /// Z-typed layers declare both Z and M; M-typed layers declare M only.
    pub fn from_shape_type(shape_type: ShapeType) -> Self {
        use crate::record::ShapeKind;
        let kind = match shape_type.kind() {
            ShapeKind::Point => GeometryKind::Point,
            ShapeKind::MultiPoint => GeometryKind::MultiPoint,
            ShapeKind::Arc => GeometryKind::LineString,
            ShapeKind::Polygon => GeometryKind::Polygon,
            ShapeKind::MultiPatch | ShapeKind::Null => GeometryKind::Unknown,
        };
        let dimension = if shape_type.has_z() {
            Dimension::XYZM
        } else if shape_type.has_m() {
            Dimension::XYM
        } else {
            Dimension::XY
        };
        Self { kind, dimension }
    }
}

/// An inferred layer schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Ordered attribute columns.
    pub fields: Vec<FieldDescriptor>,
    /// Declared geometry type, or `None` for attribute-only layers.
    pub geometry: Option<LayerGeometry>,
}

impl Schema {
    /// Schema with no attribute columns.
    pub fn geometry_only(geometry: LayerGeometry) -> Self {
        Self {
            fields: Vec::new(),
            geometry: Some(geometry),
        }
    }
}

/// Infers a schema from a store's native field descriptors.
///
/// With `narrow` set, zero-precision Integer64/Real fields are tentatively
/// demoted to Integer and promoted back only when a stored value is observed
/// to require the wider type.
pub fn infer_schema(
    store: &dyn AttributeStore,
    shape_type: Option<ShapeType>,
    narrow: bool,
) -> Schema {
    let mut fields = Vec::with_capacity(store.field_count());
    let mut adjustable_count = 0usize;

    for i in 0..store.field_count() {
        let native = store.field_info(i);
        let mut width = native.width;
        let mut subtype = FieldSubtype::None;
        let field_type = match native.native_type {
            NativeType::Date => {
                // The native rendering is 8 characters (YYYYMMDD); splitting
                // into YYYY/MM/DD needs 2 more.
                width = native.width + 2;
                FieldType::Date
            }
            NativeType::Double => {
                adjustable_count += usize::from(native.precision == 0);
                if native.precision == 0 && native.width < 19 {
                    FieldType::Integer64
                } else {
                    FieldType::Real
                }
            }
            NativeType::Integer => FieldType::Integer,
            NativeType::Logical => {
                subtype = FieldSubtype::Boolean;
                FieldType::Integer
            }
            NativeType::Character | NativeType::Invalid => FieldType::String,
        };
        fields.push(FieldDescriptor {
            name: native.name,
            field_type,
            subtype,
            width,
            precision: native.precision,
        });
    }

    if narrow && adjustable_count > 0 {
        narrow_numeric_fields(store, &mut fields);
    }

    Schema {
        fields,
        geometry: shape_type.map(LayerGeometry::from_shape_type),
    }
}

/// The narrowing pass: tentatively demote every zero-precision
/// Integer64/Real field to Integer, then scan stored rows and promote back
/// on observed overflow. A field is no longer rescanned once promoted to its
/// final type.
fn narrow_numeric_fields(store: &dyn AttributeStore, fields: &mut [FieldDescriptor]) {
    let mut adjustable = vec![false; fields.len()];
    let mut remaining = 0usize;
    for (i, field) in fields.iter_mut().enumerate() {
        if field.precision == 0
            && matches!(field.field_type, FieldType::Integer64 | FieldType::Real)
        {
            adjustable[i] = true;
            remaining += 1;
            field.field_type = FieldType::Integer;
        }
    }

    for row in 0..store.record_count() {
        if remaining == 0 {
            break;
        }
        for (i, field) in fields.iter_mut().enumerate() {
            if !adjustable[i] {
                continue;
            }
            let Some(value) = store.read_raw(row, i) else {
                continue;
            };
            let value = value.trim();
            // Anything under 10 characters fits a 32-bit integer.
            if value.len() < 10 {
                continue;
            }
            match value.parse::<i64>() {
                Err(_) => {
                    field.field_type = FieldType::Real;
                    adjustable[i] = false;
                    remaining -= 1;
                }
                Ok(v) => {
                    if i32::try_from(v).is_err() {
                        field.field_type = FieldType::Integer64;
                        if field.width <= 18 {
                            adjustable[i] = false;
                            remaining -= 1;
                        }
                    }
                }
            }
        }
    }
}
