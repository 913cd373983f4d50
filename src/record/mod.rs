//! Shape records: the geometry half of the legacy fixed-record format.
//!
//! A [`ShapeRecord`] is one decoded geometry entry: a type tag, parallel
//! coordinate arrays, and optional part-offset and part-type arrays. The
//! byte-level layout lives in [`wire`].

pub mod wire;

use std::ops::Range;

use itertools::Itertools;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The format-level geometry type tag. Exactly 15 values exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum ShapeType {
    /// Explicit "no geometry" record.
    Null = 0,
    /// Single 2D point.
    Point = 1,
    /// One or more 2D line parts.
    Arc = 3,
    /// One or more 2D rings.
    Polygon = 5,
    /// Set of 2D points.
    MultiPoint = 8,
    /// Point with Z (and optionally M).
    PointZ = 11,
    /// Arc with Z (and optionally M).
    ArcZ = 13,
    /// Polygon with Z (and optionally M).
    PolygonZ = 15,
    /// MultiPoint with Z (and optionally M).
    MultiPointZ = 18,
    /// Point with M.
    PointM = 21,
    /// Arc with M.
    ArcM = 23,
    /// Polygon with M.
    PolygonM = 25,
    /// MultiPoint with M.
    MultiPointM = 28,
    /// Mixed-part 3D surface mesh.
    MultiPatch = 31,
    /// MultiPatch with M.
    MultiPatchM = 32,
}

/// The base family of a [`ShapeType`], with Z/M variants folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Null shape.
    Null,
    /// Point family.
    Point,
    /// MultiPoint family.
    MultiPoint,
    /// Arc (line string) family.
    Arc,
    /// Polygon family.
    Polygon,
    /// MultiPatch family.
    MultiPatch,
}

impl ShapeKind {
    /// Lowercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Null => "NULL",
            ShapeKind::Point => "point",
            ShapeKind::MultiPoint => "multipoint",
            ShapeKind::Arc => "ARC",
            ShapeKind::Polygon => "POLYGON",
            ShapeKind::MultiPatch => "MULTIPATCH",
        }
    }
}

impl ShapeType {
    /// The base family of this tag.
    pub fn kind(&self) -> ShapeKind {
        use ShapeType::*;
        match self {
            Null => ShapeKind::Null,
            Point | PointZ | PointM => ShapeKind::Point,
            MultiPoint | MultiPointZ | MultiPointM => ShapeKind::MultiPoint,
            Arc | ArcZ | ArcM => ShapeKind::Arc,
            Polygon | PolygonZ | PolygonM => ShapeKind::Polygon,
            MultiPatch | MultiPatchM => ShapeKind::MultiPatch,
        }
    }

    /// Whether records of this type store a Z array.
    pub fn has_z(&self) -> bool {
        use ShapeType::*;
        matches!(
            self,
            PointZ | ArcZ | PolygonZ | MultiPointZ | MultiPatch | MultiPatchM
        )
    }

    /// Whether records of this type may store an M array. Z types carry an
    /// optional M block as well.
    pub fn has_m(&self) -> bool {
        use ShapeType::*;
        matches!(
            self,
            PointZ
                | ArcZ
                | PolygonZ
                | MultiPointZ
                | PointM
                | ArcM
                | PolygonM
                | MultiPointM
                | MultiPatch
                | MultiPatchM
        )
    }

    /// Whether records of this type carry part-offset arrays.
    pub fn has_parts(&self) -> bool {
        matches!(
            self.kind(),
            ShapeKind::Arc | ShapeKind::Polygon | ShapeKind::MultiPatch
        )
    }
}

/// Per-part type tag used by MultiPatch records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i32)]
pub enum PartType {
    /// Linked strip of triangles.
    TriangleStrip = 0,
    /// Fan of triangles sharing the first vertex.
    TriangleFan = 1,
    /// Outer ring of a polygon.
    OuterRing = 2,
    /// Hole of a polygon.
    InnerRing = 3,
    /// First ring of a polygon of unspecified kind.
    FirstRing = 4,
    /// Ring of a polygon of unspecified kind.
    Ring = 5,
}

/// One raw geometry record.
///
/// The `x` and `y` vectors are always parallel and equal length. `z` is empty
/// unless the type carries Z; `m` is present only when the record physically
/// stores an M block (presence varies per record, not just per type). An
/// absent `part_starts` means a single part spanning all vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    /// Geometry type tag.
    pub shape_type: ShapeType,
    /// X ordinates.
    pub x: Vec<f64>,
    /// Y ordinates.
    pub y: Vec<f64>,
    /// Z ordinates, empty when the type carries no Z.
    pub z: Vec<f64>,
    /// M ordinates when the record stores them.
    pub m: Option<Vec<f64>>,
    /// Start offset of each part into the vertex arrays.
    pub part_starts: Option<Vec<i32>>,
    /// Per-part type tags, MultiPatch only.
    pub part_types: Option<Vec<PartType>>,
}

impl ShapeRecord {
    /// The explicit "null shape" record: type tag Null, zero vertices.
    pub fn null() -> Self {
        Self {
            shape_type: ShapeType::Null,
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            m: None,
            part_starts: None,
            part_types: None,
        }
    }

    /// Number of vertices in the record.
    pub fn num_vertices(&self) -> usize {
        self.x.len()
    }

    /// Number of parts. An absent part-offset array counts as one implicit
    /// part when any vertices exist.
    pub fn num_parts(&self) -> usize {
        match &self.part_starts {
            Some(starts) => starts.len(),
            None => usize::from(!self.x.is_empty()),
        }
    }

    /// Vertex ranges of every part.
    ///
    /// Part `i` starts at its stored offset and ends one before the next
    /// part's start, or at the last vertex for the final part. Without a
    /// part-offset array a single part spans all vertices.
    pub fn part_ranges(&self) -> Vec<Range<usize>> {
        let n = self.x.len();
        match &self.part_starts {
            None => {
                if n == 0 {
                    Vec::new()
                } else {
                    vec![0..n]
                }
            }
            Some(starts) => starts
                .iter()
                .map(|&s| (s.max(0) as usize).min(n))
                .chain(std::iter::once(n))
                .tuple_windows()
                .map(|(start, end)| start..end.max(start))
                .collect(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shape_type_tags_round_trip() {
        for tag in [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28, 31, 32] {
            let st = ShapeType::try_from(tag).unwrap();
            assert_eq!(i32::from(st), tag);
        }
        assert!(ShapeType::try_from(2).is_err());
        assert!(ShapeType::try_from(33).is_err());
    }

    #[test]
    fn zm_flags() {
        assert!(ShapeType::PointZ.has_z());
        assert!(ShapeType::PointZ.has_m());
        assert!(!ShapeType::PointM.has_z());
        assert!(ShapeType::PointM.has_m());
        assert!(!ShapeType::Polygon.has_z());
        assert!(!ShapeType::Polygon.has_m());
        assert!(ShapeType::MultiPatch.has_z());
    }

    #[test]
    fn part_ranges_with_offsets() {
        let rec = ShapeRecord {
            shape_type: ShapeType::Polygon,
            x: vec![0.; 10],
            y: vec![0.; 10],
            z: vec![],
            m: None,
            part_starts: Some(vec![0, 4, 7]),
            part_types: None,
        };
        assert_eq!(rec.part_ranges(), vec![0..4, 4..7, 7..10]);
        assert_eq!(rec.num_parts(), 3);
    }

    #[test]
    fn part_ranges_implicit_single_part() {
        let rec = ShapeRecord {
            shape_type: ShapeType::Arc,
            x: vec![0.; 5],
            y: vec![0.; 5],
            z: vec![],
            m: None,
            part_starts: None,
            part_types: None,
        };
        assert_eq!(rec.part_ranges(), vec![0..5]);

        let empty = ShapeRecord::null();
        assert!(empty.part_ranges().is_empty());
        assert_eq!(empty.num_parts(), 0);
    }
}
