//! Encoding model geometries into raw shape records.

use tracing::debug;

use crate::codec::{GeometryCodec, WindingMode, NO_DATA_M};
use crate::error::{ShapeError, ShapeResult};
use crate::geom::{Dimension, Geometry, LineString, Point, Polygon};
use crate::record::{ShapeKind, ShapeRecord, ShapeType};

impl GeometryCodec {
    /// Encodes a geometry into a raw record for a layer of type `target`.
    ///
    /// `layer_dim` is the layer's declared Z/M presence; the M block is only
    /// written when both the target type and the layer declare M, with the
    /// no-data marker standing in for unmeasured input. A missing or empty
    /// geometry encodes to the explicit null record, which is legal in a
    /// layer of any type.
    pub fn encode(
        &self,
        geometry: Option<&Geometry>,
        target: ShapeType,
        layer_dim: Dimension,
    ) -> ShapeResult<ShapeRecord> {
        let Some(geometry) = geometry else {
            return Ok(ShapeRecord::null());
        };
        if geometry.is_empty() {
            return Ok(ShapeRecord::null());
        }

        let record = match target.kind() {
            ShapeKind::Point => self.encode_point(geometry, target, layer_dim)?,
            ShapeKind::MultiPoint => self.encode_multipoint(geometry, target, layer_dim)?,
            ShapeKind::Arc => self.encode_arc(geometry, target, layer_dim)?,
            ShapeKind::Polygon => self.encode_polygon(geometry, target, layer_dim)?,
            ShapeKind::MultiPatch => self.encode_multipatch(geometry, target)?,
            ShapeKind::Null => return Err(unsupported(geometry, target)),
        };
        self.check_finite(&record)?;
        Ok(record)
    }

    fn encode_point(
        &self,
        geometry: &Geometry,
        target: ShapeType,
        layer_dim: Dimension,
    ) -> ShapeResult<ShapeRecord> {
        let Geometry::Point(point) = geometry else {
            return Err(unsupported(geometry, target));
        };
        // Emptiness was handled by the caller.
        let coord = point.coord.ok_or_else(|| unsupported(geometry, target))?;
        Ok(ShapeRecord {
            shape_type: target,
            x: vec![coord.x],
            y: vec![coord.y],
            z: if target.has_z() { vec![coord.z] } else { vec![] },
            m: write_m(target, layer_dim).then(|| vec![m_value(&Some(coord), point.dim)]),
            part_starts: None,
            part_types: None,
        })
    }

    fn encode_multipoint(
        &self,
        geometry: &Geometry,
        target: ShapeType,
        layer_dim: Dimension,
    ) -> ShapeResult<ShapeRecord> {
        let Geometry::MultiPoint(multi) = geometry else {
            return Err(unsupported(geometry, target));
        };
        let members: Vec<&Point> = multi
            .points
            .iter()
            .filter(|p| {
                if p.is_empty() {
                    debug!("skipped empty point inside a multipoint");
                }
                !p.is_empty()
            })
            .collect();
        check_counts(members.len(), 1)?;

        let mut record = blank_record(target, layer_dim, members.len());
        for point in members {
            push_coord(&mut record, &point.coord.unwrap_or_default());
            if let Some(m) = &mut record.m {
                m.push(m_value(&point.coord, point.dim));
            }
        }
        Ok(record)
    }

    fn encode_arc(
        &self,
        geometry: &Geometry,
        target: ShapeType,
        layer_dim: Dimension,
    ) -> ShapeResult<ShapeRecord> {
        let lines = gather_lines(geometry).ok_or_else(|| unsupported(geometry, target))?;
        let lines: Vec<&LineString> = lines.into_iter().filter(|l| !l.is_empty()).collect();
        if lines.is_empty() {
            debug!("all line parts empty; null record written");
            return Ok(ShapeRecord::null());
        }
        let total: usize = lines.iter().map(|l| l.coords.len()).sum();
        check_counts(total, lines.len())?;

        let mut record = blank_record(target, layer_dim, total);
        let mut starts = Vec::with_capacity(lines.len());
        for line in &lines {
            starts.push(record.x.len() as i32);
            for coord in &line.coords {
                push_coord(&mut record, coord);
                if let Some(m) = &mut record.m {
                    m.push(m_value(&Some(*coord), line.dim));
                }
            }
        }
        record.part_starts = Some(starts);
        Ok(record)
    }

    fn encode_polygon(
        &self,
        geometry: &Geometry,
        target: ShapeType,
        layer_dim: Dimension,
    ) -> ShapeResult<ShapeRecord> {
        let polygons = gather_polygons(geometry).ok_or_else(|| unsupported(geometry, target))?;

        // (ring, is_exterior) in emission order, empty rings dropped.
        let mut rings: Vec<(&LineString, bool)> = Vec::new();
        for polygon in &polygons {
            for (i, ring) in polygon.rings.iter().enumerate() {
                if ring.is_empty() {
                    debug!("skipped empty ring of a polygon");
                } else {
                    rings.push((ring, i == 0));
                }
            }
        }
        if rings.is_empty() {
            debug!("polygon with only empty rings; null record written");
            return Ok(ShapeRecord::null());
        }
        let total: usize = rings.iter().map(|(r, _)| r.coords.len()).sum();
        check_counts(total, rings.len())?;

        let mut record = blank_record(target, layer_dim, total);
        let mut starts = Vec::with_capacity(rings.len());
        for (ring, is_exterior) in rings {
            starts.push(record.x.len() as i32);
            // Exterior rings must run clockwise and holes counter-clockwise.
            let reverse = self.options.winding == WindingMode::Enforce
                && ring.is_clockwise() != is_exterior;
            let coords: Vec<_> = if reverse {
                ring.coords.iter().rev().collect()
            } else {
                ring.coords.iter().collect()
            };
            for coord in coords {
                push_coord(&mut record, coord);
                if let Some(m) = &mut record.m {
                    m.push(m_value(&Some(*coord), ring.dim));
                }
            }
        }
        record.part_starts = Some(starts);
        Ok(record)
    }

    fn encode_multipatch(&self, geometry: &Geometry, target: ShapeType) -> ShapeResult<ShapeRecord> {
        let Some(adapter) = &self.adapter else {
            return Err(unsupported(geometry, target));
        };
        let parts = adapter.decompose(geometry)?;
        check_counts(parts.x.len(), parts.part_starts.len())?;
        Ok(ShapeRecord {
            shape_type: target,
            x: parts.x,
            y: parts.y,
            z: parts.z,
            m: None,
            part_starts: Some(parts.part_starts),
            part_types: Some(parts.part_types),
        })
    }

    fn check_finite(&self, record: &ShapeRecord) -> ShapeResult<()> {
        if self.options.allow_non_finite {
            return Ok(());
        }
        let all_finite = record.x.iter().all(|v| v.is_finite())
            && record.y.iter().all(|v| v.is_finite())
            && record.z.iter().all(|v| v.is_finite())
            && record
                .m
                .iter()
                .all(|m| m.iter().all(|v| v.is_finite()));
        if all_finite {
            Ok(())
        } else {
            Err(ShapeError::NonFiniteCoordinates)
        }
    }
}

fn unsupported(geometry: &Geometry, target: ShapeType) -> ShapeError {
    ShapeError::UnsupportedGeometryType {
        geometry: geometry.type_name().to_string(),
        target: target.kind().name().to_string(),
    }
}

/// Vertex and part counts must fit the format's signed 32-bit slots.
fn check_counts(vertices: usize, parts: usize) -> ShapeResult<()> {
    if i32::try_from(vertices).is_err() || i32::try_from(parts).is_err() {
        Err(ShapeError::GeometryTooLarge)
    } else {
        Ok(())
    }
}

/// Whether the output record carries an M block.
fn write_m(target: ShapeType, layer_dim: Dimension) -> bool {
    target.has_m() && layer_dim.has_m()
}

/// M ordinate for one vertex: the measured value when the source geometry is
/// measured, the no-data marker otherwise.
fn m_value(coord: &Option<crate::geom::Coord>, dim: Dimension) -> f64 {
    match coord {
        Some(c) if dim.has_m() => c.m,
        _ => NO_DATA_M,
    }
}

fn blank_record(target: ShapeType, layer_dim: Dimension, capacity: usize) -> ShapeRecord {
    ShapeRecord {
        shape_type: target,
        x: Vec::with_capacity(capacity),
        y: Vec::with_capacity(capacity),
        z: Vec::new(),
        m: write_m(target, layer_dim).then(|| Vec::with_capacity(capacity)),
        part_starts: None,
        part_types: None,
    }
}

fn push_coord(record: &mut ShapeRecord, coord: &crate::geom::Coord) {
    record.x.push(coord.x);
    record.y.push(coord.y);
    if record.shape_type.has_z() {
        record.z.push(coord.z);
    }
}

/// Every line part of a curve-like geometry, polygon boundaries included.
fn gather_lines(geometry: &Geometry) -> Option<Vec<&LineString>> {
    match geometry {
        Geometry::LineString(l) => Some(vec![l]),
        Geometry::MultiLineString(ml) => Some(ml.lines.iter().collect()),
        Geometry::Polygon(p) => Some(p.rings.iter().collect()),
        Geometry::MultiPolygon(mp) => {
            Some(mp.polygons.iter().flat_map(|p| p.rings.iter()).collect())
        }
        Geometry::GeometryCollection(gc) => {
            let mut lines = Vec::new();
            for member in &gc.geometries {
                lines.extend(gather_lines(member)?);
            }
            Some(lines)
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => None,
    }
}

/// Every polygon of a polygonal geometry.
fn gather_polygons(geometry: &Geometry) -> Option<Vec<&Polygon>> {
    match geometry {
        Geometry::Polygon(p) => Some(vec![p]),
        Geometry::MultiPolygon(mp) => Some(mp.polygons.iter().collect()),
        Geometry::GeometryCollection(gc) => {
            let mut polygons = Vec::new();
            for member in &gc.geometries {
                polygons.extend(gather_polygons(member)?);
            }
            Some(polygons)
        }
        _ => None,
    }
}
