//! Decoding raw shape records into model geometries.

use std::ops::Range;

use tracing::{debug, warn};

use crate::codec::rings::{classify_rings, group_rings, RingGrouping};
use crate::codec::GeometryCodec;
use crate::geom::{
    Coord, Dimension, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon,
};
use crate::multipatch::MultiPatchParts;
use crate::record::{ShapeRecord, ShapeType};

impl GeometryCodec {
    /// Decodes one raw geometry record into a geometry value.
    ///
    /// `None` is a legitimate outcome, not an error: null records, records
    /// with no parts or vertices, and unsupported tags all decode to no
    /// geometry. `fid` is only used in diagnostics.
    pub fn decode(&mut self, record: &ShapeRecord, fid: usize) -> Option<Geometry> {
        match record.shape_type {
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => self.decode_point(record),
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                self.decode_multipoint(record)
            }
            ShapeType::Arc | ShapeType::ArcZ | ShapeType::ArcM => self.decode_arc(record),
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM => {
                self.decode_polygon(record, fid)
            }
            ShapeType::MultiPatch | ShapeType::MultiPatchM => self.decode_multipatch(record),
            ShapeType::Null => None,
        }
    }

    fn decode_point(&self, record: &ShapeRecord) -> Option<Geometry> {
        if record.x.is_empty() {
            return None;
        }
        let m0 = record.m.as_ref().and_then(|m| m.first().copied());
        let point = match record.shape_type {
            ShapeType::PointZ => {
                let z = record.z.first().copied().unwrap_or(0.0);
                match m0 {
                    Some(m) => Point::new(
                        Coord::xyzm(record.x[0], record.y[0], z, m),
                        Dimension::XYZM,
                    ),
                    None => Point::new(Coord::xyz(record.x[0], record.y[0], z), Dimension::XYZ),
                }
            }
            ShapeType::PointM => {
                // The Z slot may be physically present but the value is not
                // three-dimensional.
                Point::new(
                    Coord::xym(record.x[0], record.y[0], m0.unwrap_or(0.0)),
                    Dimension::XYM,
                )
            }
            _ => Point::new(Coord::xy(record.x[0], record.y[0]), Dimension::XY),
        };
        Some(Geometry::Point(point))
    }

    fn decode_multipoint(&self, record: &ShapeRecord) -> Option<Geometry> {
        if record.num_vertices() == 0 {
            return None;
        }
        let dim = record_dimension(record);
        let points = (0..record.num_vertices())
            .map(|i| Point::new(coord_at(record, i, dim), dim))
            .collect();
        Some(Geometry::MultiPoint(MultiPoint::new(points, dim)))
    }

    fn decode_arc(&self, record: &ShapeRecord) -> Option<Geometry> {
        let parts = record.part_ranges();
        if parts.is_empty() {
            return None;
        }
        let dim = record_dimension(record);
        if parts.len() == 1 {
            return Some(Geometry::LineString(slice_line(
                record,
                0..record.num_vertices(),
                dim,
            )));
        }
        let lines = parts
            .into_iter()
            .map(|range| slice_line(record, range, dim))
            .collect();
        Some(Geometry::MultiLineString(MultiLineString::new(lines, dim)))
    }

    fn decode_polygon(&mut self, record: &ShapeRecord, fid: usize) -> Option<Geometry> {
        let parts = record.part_ranges();
        if parts.is_empty() {
            return None;
        }

        let has_z = record.shape_type == ShapeType::PolygonZ;
        let has_m = has_z || record.shape_type == ShapeType::PolygonM;
        let dim = Dimension::from_flags(has_z, has_m && record.m.is_some());

        // Empty rings are silently dropped.
        let rings: Vec<LineString> = parts
            .into_iter()
            .filter(|range| !range.is_empty())
            .map(|range| slice_line(record, range, dim))
            .collect();

        match rings.len() {
            0 => None,
            // Surely the outer ring.
            1 => Some(Geometry::Polygon(Polygon::new(rings, dim))),
            _ => {
                // The winding heuristic only applies to 2D data.
                let grouping = if dim == Dimension::XY {
                    classify_rings(&rings)
                } else {
                    RingGrouping::ByWinding
                };
                if grouping == RingGrouping::ByContainment && !self.warned_bad_winding {
                    self.warned_bad_winding = true;
                    warn!(
                        "source contains polygon(s) with rings with invalid winding order; \
                         autocorrecting them, but the source data should be corrected"
                    );
                }
                let (polygons, valid) = group_rings(rings, grouping, dim);
                if !valid {
                    warn!(
                        "geometry of polygon of fid {fid} cannot be translated to simple \
                         geometry; all polygons will be contained in a multipolygon"
                    );
                }
                if valid && polygons.len() == 1 {
                    Some(Geometry::Polygon(polygons.into_iter().next()?))
                } else {
                    Some(Geometry::MultiPolygon(MultiPolygon::new(polygons, dim)))
                }
            }
        }
    }

    fn decode_multipatch(&self, record: &ShapeRecord) -> Option<Geometry> {
        let Some(adapter) = &self.adapter else {
            debug!("no multipatch adapter configured; record ignored");
            return None;
        };
        let parts = MultiPatchParts {
            part_starts: record.part_starts.clone().unwrap_or_default(),
            part_types: record.part_types.clone().unwrap_or_default(),
            x: record.x.clone(),
            y: record.y.clone(),
            z: record.z.clone(),
        };
        adapter.reconstruct(&parts)
    }
}

/// Z/M presence of a multipoint or arc record: Z per the type tag, M only
/// when the record physically stores an M block.
fn record_dimension(record: &ShapeRecord) -> Dimension {
    Dimension::from_flags(
        record.shape_type.has_z(),
        record.shape_type.has_m() && record.m.is_some(),
    )
}

fn coord_at(record: &ShapeRecord, i: usize, dim: Dimension) -> Coord {
    Coord {
        x: record.x[i],
        y: record.y[i],
        z: if dim.has_z() {
            record.z.get(i).copied().unwrap_or(0.0)
        } else {
            0.0
        },
        m: if dim.has_m() {
            record
                .m
                .as_ref()
                .and_then(|m| m.get(i).copied())
                .unwrap_or(0.0)
        } else {
            0.0
        },
    }
}

fn slice_line(record: &ShapeRecord, range: Range<usize>, dim: Dimension) -> LineString {
    LineString::new(range.map(|i| coord_at(record, i, dim)).collect(), dim)
}
