//! Feature assembly: pairing geometry records with attribute rows.
//!
//! A feature id addresses the same index in the geometry store and the
//! attribute store. Reading reconciles the decoded geometry's Z/M presence
//! with the layer's declared type; writing puts the geometry down first and
//! aborts before touching attributes when it fails.

use tracing::debug;

use crate::attr::{AttributeCodec, AttributeValue};
use crate::codec::GeometryCodec;
use crate::error::{ShapeError, ShapeResult};
use crate::geom::Geometry;
use crate::schema::{GeometryKind, Schema};
use crate::store::{AttributeStore, GeometryStore, NativeField, NativeType};

/// One assembled feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    /// Feature id, or `None` for a not-yet-written feature.
    pub fid: Option<usize>,
    /// The geometry, if any.
    pub geometry: Option<Geometry>,
    /// One slot per schema field, in schema order. `None` is a null value.
    pub values: Vec<Option<AttributeValue>>,
}

/// Reads and writes whole features against a pair of stores.
#[derive(Debug)]
pub struct FeatureAssembler {
    schema: Schema,
    geometry_codec: GeometryCodec,
    attribute_codec: AttributeCodec,
    geometry_ignored: bool,
    ignored_fields: Vec<bool>,
}

impl FeatureAssembler {
    /// Creates an assembler for a layer described by `schema`.
    pub fn new(schema: Schema, geometry_codec: GeometryCodec) -> Self {
        let ignored_fields = vec![false; schema.fields.len()];
        Self {
            schema,
            geometry_codec,
            attribute_codec: AttributeCodec::new(),
            geometry_ignored: false,
            ignored_fields,
        }
    }

    /// The layer schema, reflecting any widening done by writes.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Skips geometry decoding on read.
    pub fn set_geometry_ignored(&mut self, ignored: bool) {
        self.geometry_ignored = ignored;
    }

    /// Skips the given field on read; its value slot stays `None`.
    pub fn set_field_ignored(&mut self, field_index: usize, ignored: bool) {
        if let Some(slot) = self.ignored_fields.get_mut(field_index) {
            *slot = ignored;
        }
    }

    /// Reads the feature with id `fid`.
    pub fn read(
        &mut self,
        geometries: Option<&dyn GeometryStore>,
        attributes: Option<&dyn AttributeStore>,
        fid: usize,
    ) -> ShapeResult<Feature> {
        // The id must be in range for both stores, not just one of them.
        if let Some(attrs) = attributes {
            if fid >= attrs.record_count() {
                return Err(out_of_range(fid));
            }
            if attrs.is_deleted(fid) {
                return Err(ShapeError::AppDefined(format!(
                    "Attempt to read shape with feature id ({fid}), but it is marked deleted."
                )));
            }
        }
        if let Some(geoms) = geometries {
            if fid >= geoms.record_count() {
                return Err(out_of_range(fid));
            }
        }

        let geometry = match geometries {
            Some(geoms) if !self.geometry_ignored => self.read_geometry(geoms, fid),
            _ => None,
        };

        let mut values = vec![None; self.schema.fields.len()];
        if let Some(attrs) = attributes {
            for (i, field) in self.schema.fields.iter().enumerate() {
                if self.ignored_fields[i] {
                    continue;
                }
                values[i] = self.attribute_codec.read(attrs, field, i, fid);
            }
        }

        Ok(Feature {
            fid: Some(fid),
            geometry,
            values,
        })
    }

    fn read_geometry(&mut self, geoms: &dyn GeometryStore, fid: usize) -> Option<Geometry> {
        let record = match geoms.read_record(fid) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(err) => {
                debug!("failed to read shape record {fid}: {err}");
                return None;
            }
        };
        let mut geometry = self.geometry_codec.decode(&record, fid)?;
        // Align the decoded dimensions with the layer's declared type. A
        // layer without a definite family leaves them as decoded.
        if let Some(layer) = &self.schema.geometry {
            if layer.kind != GeometryKind::Unknown {
                geometry.set_z(layer.dimension.has_z());
                geometry.set_m(layer.dimension.has_m());
            }
        }
        Some(geometry)
    }

    /// Writes a feature and returns its feature id.
    ///
    /// With `feature.fid` unset the feature is appended. An attribute store
    /// with no columns gets a placeholder integer id column on the first
    /// write so that rows exist at all.
    pub fn write(
        &mut self,
        geometries: Option<&mut dyn GeometryStore>,
        attributes: Option<&mut dyn AttributeStore>,
        feature: &Feature,
    ) -> ShapeResult<usize> {
        if geometries.is_none() && attributes.is_none() {
            return Err(ShapeError::AppDefined(
                "No store to write the feature to".to_string(),
            ));
        }

        let mut fid = feature.fid;
        if let Some(geoms) = geometries {
            let layer_dim = self
                .schema
                .geometry
                .map(|g| g.dimension)
                .unwrap_or_default();
            let record =
                self.geometry_codec
                    .encode(feature.geometry.as_ref(), geoms.shape_type(), layer_dim)?;
            fid = Some(geoms.write_record(fid, &record)?);
        }

        let Some(attrs) = attributes else {
            return Ok(fid.unwrap_or(0));
        };
        let fid = fid.unwrap_or_else(|| attrs.record_count());

        if self.schema.fields.is_empty() {
            if attrs.field_count() == 0 && attrs.record_count() == 0 {
                attrs.add_field(NativeField::new("FID", NativeType::Integer, 11, 0));
            }
            if attrs.field_count() == 1 {
                attrs.write_raw(fid, 0, Some(&fid.to_string()))?;
            } else {
                // No column to write through; the row must still exist so
                // the next auto-assigned id advances.
                attrs.ensure_record(fid);
            }
            return Ok(fid);
        }

        let Self {
            schema,
            attribute_codec,
            ..
        } = self;
        for (i, field) in schema.fields.iter_mut().enumerate() {
            let value = feature.values.get(i).and_then(|v| v.as_ref());
            attribute_codec.write(attrs, field, i, fid, value)?;
        }
        Ok(fid)
    }
}

fn out_of_range(fid: usize) -> ShapeError {
    ShapeError::AppDefined(format!(
        "Attempt to read shape with feature id ({fid}) out of available range."
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::attr::DateValue;
    use crate::codec::CodecOptions;
    use crate::geom::{Coord, Dimension, Point};
    use crate::record::ShapeType;
    use crate::schema::infer_schema;
    use crate::store::memory::{MemoryAttributeStore, MemoryGeometryStore};

    fn assembler(attrs: &MemoryAttributeStore, shape_type: ShapeType) -> FeatureAssembler {
        let schema = infer_schema(attrs, Some(shape_type), false);
        FeatureAssembler::new(schema, GeometryCodec::new(CodecOptions::default()))
    }

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::Point(Point::new(Coord::xy(x, y), Dimension::XY))
    }

    #[test]
    fn feature_round_trip() {
        let mut geoms = MemoryGeometryStore::new(ShapeType::Point);
        let mut attrs = MemoryAttributeStore::with_fields(vec![
            NativeField::new("NAME", NativeType::Character, 16, 0),
            NativeField::new("DT", NativeType::Date, 8, 0),
        ]);
        let mut assembler = assembler(&attrs, ShapeType::Point);

        let feature = Feature {
            fid: None,
            geometry: Some(point(3., 4.)),
            values: vec![
                Some(AttributeValue::String("spire".to_string())),
                Some(AttributeValue::Date(DateValue::new(2024, 1, 31))),
            ],
        };
        let fid = assembler
            .write(Some(&mut geoms), Some(&mut attrs), &feature)
            .unwrap();
        assert_eq!(fid, 0);

        let read = assembler.read(Some(&geoms), Some(&attrs), fid).unwrap();
        assert_eq!(read.fid, Some(0));
        assert_eq!(read.geometry, Some(point(3., 4.)));
        assert_eq!(read.values, feature.values);
    }

    #[test]
    fn out_of_range_and_deleted_reads_fail() {
        let mut attrs =
            MemoryAttributeStore::with_fields(vec![NativeField::new("A", NativeType::Character, 4, 0)]);
        attrs.write_raw(0, 0, Some("x")).unwrap();
        attrs.mark_deleted(0);
        let mut assembler = assembler(&attrs, ShapeType::Point);

        let err = assembler.read(None, Some(&attrs), 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempt to read shape with feature id (5) out of available range."
        );

        let err = assembler.read(None, Some(&attrs), 0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempt to read shape with feature id (0), but it is marked deleted."
        );
    }

    #[test]
    fn read_fid_must_be_in_range_for_both_stores() {
        // More attribute rows than geometry records: ids past the geometry
        // count are out of range even though the attribute row exists.
        let mut geoms = MemoryGeometryStore::new(ShapeType::Point);
        let mut attrs =
            MemoryAttributeStore::with_fields(vec![NativeField::new("A", NativeType::Character, 4, 0)]);
        for (row, v) in ["x", "y", "z"].iter().enumerate() {
            attrs.write_raw(row, 0, Some(v)).unwrap();
        }
        let mut assembler = assembler(&attrs, ShapeType::Point);
        assembler
            .write(Some(&mut geoms), None, &Feature {
                fid: None,
                geometry: Some(point(1., 1.)),
                values: vec![],
            })
            .unwrap();

        let err = assembler.read(Some(&geoms), Some(&attrs), 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Attempt to read shape with feature id (2) out of available range."
        );
        assert!(assembler.read(Some(&geoms), Some(&attrs), 0).is_ok());
    }

    #[test]
    fn zero_column_rows_still_advance_the_fid() {
        let mut attrs = MemoryAttributeStore::new();
        attrs.ensure_record(0);
        let mut assembler = assembler(&attrs, ShapeType::Point);

        // An existing row means no placeholder column gets created, but the
        // written row must still materialize.
        let fid = assembler
            .write(None, Some(&mut attrs), &Feature::default())
            .unwrap();
        assert_eq!(fid, 1);
        assert_eq!(attrs.field_count(), 0);
        assert_eq!(attrs.record_count(), 2);
    }

    #[test]
    fn geometry_error_aborts_before_attributes() {
        let mut geoms = MemoryGeometryStore::new(ShapeType::Arc);
        let mut attrs =
            MemoryAttributeStore::with_fields(vec![NativeField::new("A", NativeType::Character, 4, 0)]);
        let mut assembler = assembler(&attrs, ShapeType::Arc);

        let feature = Feature {
            fid: None,
            geometry: Some(point(1., 1.)),
            values: vec![Some(AttributeValue::String("x".to_string()))],
        };
        assert!(assembler
            .write(Some(&mut geoms), Some(&mut attrs), &feature)
            .is_err());
        assert_eq!(attrs.record_count(), 0);
        assert_eq!(geoms.record_count(), 0);
    }

    #[test]
    fn empty_schema_gets_placeholder_id_column() {
        let mut geoms = MemoryGeometryStore::new(ShapeType::Point);
        let mut attrs = MemoryAttributeStore::new();
        let mut assembler = assembler(&attrs, ShapeType::Point);

        let feature = Feature {
            fid: None,
            geometry: Some(point(0., 0.)),
            values: vec![],
        };
        let fid = assembler
            .write(Some(&mut geoms), Some(&mut attrs), &feature)
            .unwrap();
        assert_eq!(attrs.field_count(), 1);
        assert_eq!(attrs.field_info(0).name, "FID");
        assert_eq!(attrs.read_raw(fid, 0).as_deref(), Some("0"));
    }

    #[test]
    fn declared_dimensions_are_reconciled_on_read() {
        let mut geoms = MemoryGeometryStore::new(ShapeType::PointZ);
        let mut attrs = MemoryAttributeStore::new();
        let mut assembler = assembler(&attrs, ShapeType::PointZ);

        // A Z point without a measured M still comes back with the layer's
        // declared XYZM dimension.
        let feature = Feature {
            fid: None,
            geometry: Some(Geometry::Point(Point::new(
                Coord::xyz(1., 2., 3.),
                Dimension::XYZ,
            ))),
            values: vec![],
        };
        let fid = assembler
            .write(Some(&mut geoms), Some(&mut attrs), &feature)
            .unwrap();
        let read = assembler.read(Some(&geoms), Some(&attrs), fid).unwrap();
        assert_eq!(read.geometry.unwrap().dimension(), Dimension::XYZM);
    }

    #[test]
    fn ignored_geometry_and_fields_are_skipped() {
        let mut geoms = MemoryGeometryStore::new(ShapeType::Point);
        let mut attrs = MemoryAttributeStore::with_fields(vec![
            NativeField::new("A", NativeType::Character, 4, 0),
            NativeField::new("B", NativeType::Character, 4, 0),
        ]);
        let mut assembler = assembler(&attrs, ShapeType::Point);

        let feature = Feature {
            fid: None,
            geometry: Some(point(1., 2.)),
            values: vec![
                Some(AttributeValue::String("a".to_string())),
                Some(AttributeValue::String("b".to_string())),
            ],
        };
        let fid = assembler
            .write(Some(&mut geoms), Some(&mut attrs), &feature)
            .unwrap();

        assembler.set_geometry_ignored(true);
        assembler.set_field_ignored(0, true);
        let read = assembler.read(Some(&geoms), Some(&attrs), fid).unwrap();
        assert_eq!(read.geometry, None);
        assert_eq!(read.values[0], None);
        assert_eq!(
            read.values[1],
            Some(AttributeValue::String("b".to_string()))
        );
    }
}
