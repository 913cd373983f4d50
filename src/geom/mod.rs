//! Model-side simple-feature geometries.
//!
//! A closed tagged variant replaces the run-time type discrimination of
//! older object models: every codec branch is an exhaustive match on
//! [`Geometry`]. Z and M presence are tracked per geometry through
//! [`Dimension`] and can be reconciled after decode against a layer's
//! declared type with [`Geometry::set_z`] / [`Geometry::set_m`].

use geo::{coord, Winding};

/// The dimension of a geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    /// Two-dimensional.
    #[default]
    XY,
    /// Three-dimensional.
    XYZ,
    /// XYM (2D with measure).
    XYM,
    /// XYZM (3D with measure).
    XYZM,
}

impl Dimension {
    /// Builds a dimension from Z/M presence flags.
    pub fn from_flags(has_z: bool, has_m: bool) -> Self {
        match (has_z, has_m) {
            (false, false) => Dimension::XY,
            (true, false) => Dimension::XYZ,
            (false, true) => Dimension::XYM,
            (true, true) => Dimension::XYZM,
        }
    }

    /// Whether a Z ordinate is present.
    pub fn has_z(&self) -> bool {
        matches!(self, Dimension::XYZ | Dimension::XYZM)
    }

    /// Whether an M ordinate is present.
    pub fn has_m(&self) -> bool {
        matches!(self, Dimension::XYM | Dimension::XYZM)
    }

    /// This dimension with Z presence set to `has_z`.
    pub fn with_z(self, has_z: bool) -> Self {
        Self::from_flags(has_z, self.has_m())
    }

    /// This dimension with M presence set to `has_m`.
    pub fn with_m(self, has_m: bool) -> Self {
        Self::from_flags(self.has_z(), has_m)
    }

    /// Number of ordinates per coordinate.
    pub fn size(&self) -> usize {
        2 + usize::from(self.has_z()) + usize::from(self.has_m())
    }
}

/// One coordinate tuple. Ordinates not covered by the owning geometry's
/// dimension are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    /// X ordinate.
    pub x: f64,
    /// Y ordinate.
    pub y: f64,
    /// Z ordinate.
    pub z: f64,
    /// M ordinate.
    pub m: f64,
}

impl Coord {
    /// 2D coordinate.
    pub fn xy(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    /// 3D coordinate.
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            ..Default::default()
        }
    }

    /// Measured 2D coordinate.
    pub fn xym(x: f64, y: f64, m: f64) -> Self {
        Self {
            x,
            y,
            m,
            ..Default::default()
        }
    }

    /// Measured 3D coordinate.
    pub fn xyzm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self { x, y, z, m }
    }
}

/// A point, possibly empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Point {
    /// The coordinate, or `None` for an empty point.
    pub coord: Option<Coord>,
    /// Z/M presence.
    pub dim: Dimension,
}

impl Point {
    /// Creates a point from a coordinate.
    pub fn new(coord: Coord, dim: Dimension) -> Self {
        Self {
            coord: Some(coord),
            dim,
        }
    }

    /// Creates an empty point.
    pub fn empty(dim: Dimension) -> Self {
        Self { coord: None, dim }
    }

    /// Whether this point is empty.
    pub fn is_empty(&self) -> bool {
        self.coord.is_none()
    }
}

/// An ordered sequence of coordinates: a line part, or a closed ring when
/// used as a polygon boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineString {
    /// The coordinates.
    pub coords: Vec<Coord>,
    /// Z/M presence.
    pub dim: Dimension,
}

impl LineString {
    /// Creates a line string.
    pub fn new(coords: Vec<Coord>, dim: Dimension) -> Self {
        Self { coords, dim }
    }

    /// Number of points.
    pub fn num_points(&self) -> usize {
        self.coords.len()
    }

    /// Whether this line string has no points.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// 2D projection for the `geo` algorithms.
    pub fn to_geo(&self) -> geo::LineString<f64> {
        geo::LineString::new(
            self.coords
                .iter()
                .map(|c| coord! { x: c.x, y: c.y })
                .collect(),
        )
    }

    /// Winding direction by signed area of the 2D projection.
    pub fn is_clockwise(&self) -> bool {
        self.to_geo().is_cw()
    }
}

/// A polygon: ring 0 is the exterior, the rest are holes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    /// Exterior ring followed by interior rings.
    pub rings: Vec<LineString>,
    /// Z/M presence.
    pub dim: Dimension,
}

impl Polygon {
    /// Creates a polygon from rings. Ring 0 is the exterior.
    pub fn new(rings: Vec<LineString>, dim: Dimension) -> Self {
        Self { rings, dim }
    }

    /// The exterior ring, if any.
    pub fn exterior(&self) -> Option<&LineString> {
        self.rings.first()
    }

    /// Interior rings.
    pub fn interiors(&self) -> &[LineString] {
        self.rings.get(1..).unwrap_or(&[])
    }

    /// Whether this polygon has no exterior ring, or an empty one.
    pub fn is_empty(&self) -> bool {
        self.exterior().map(|r| r.is_empty()).unwrap_or(true)
    }
}

/// A set of points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPoint {
    /// The member points.
    pub points: Vec<Point>,
    /// Z/M presence.
    pub dim: Dimension,
}

impl MultiPoint {
    /// Creates a multipoint.
    pub fn new(points: Vec<Point>, dim: Dimension) -> Self {
        Self { points, dim }
    }

    /// Whether every member is empty.
    pub fn is_empty(&self) -> bool {
        self.points.iter().all(|p| p.is_empty())
    }
}

/// A set of line strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiLineString {
    /// The member line strings.
    pub lines: Vec<LineString>,
    /// Z/M presence.
    pub dim: Dimension,
}

impl MultiLineString {
    /// Creates a multilinestring.
    pub fn new(lines: Vec<LineString>, dim: Dimension) -> Self {
        Self { lines, dim }
    }

    /// Whether every member is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }
}

/// A set of polygons.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiPolygon {
    /// The member polygons.
    pub polygons: Vec<Polygon>,
    /// Z/M presence.
    pub dim: Dimension,
}

impl MultiPolygon {
    /// Creates a multipolygon.
    pub fn new(polygons: Vec<Polygon>, dim: Dimension) -> Self {
        Self { polygons, dim }
    }

    /// Whether every member is empty.
    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(|p| p.is_empty())
    }
}

/// A heterogeneous collection of geometries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryCollection {
    /// The member geometries.
    pub geometries: Vec<Geometry>,
    /// Z/M presence.
    pub dim: Dimension,
}

impl GeometryCollection {
    /// Creates a collection.
    pub fn new(geometries: Vec<Geometry>, dim: Dimension) -> Self {
        Self { geometries, dim }
    }

    /// Whether every member is empty.
    pub fn is_empty(&self) -> bool {
        self.geometries.iter().all(|g| g.is_empty())
    }
}

/// A tagged simple-feature geometry value.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Point.
    Point(Point),
    /// MultiPoint.
    MultiPoint(MultiPoint),
    /// LineString.
    LineString(LineString),
    /// MultiLineString.
    MultiLineString(MultiLineString),
    /// Polygon.
    Polygon(Polygon),
    /// MultiPolygon.
    MultiPolygon(MultiPolygon),
    /// GeometryCollection.
    GeometryCollection(GeometryCollection),
}

impl Geometry {
    /// Z/M presence of this geometry.
    pub fn dimension(&self) -> Dimension {
        match self {
            Geometry::Point(g) => g.dim,
            Geometry::MultiPoint(g) => g.dim,
            Geometry::LineString(g) => g.dim,
            Geometry::MultiLineString(g) => g.dim,
            Geometry::Polygon(g) => g.dim,
            Geometry::MultiPolygon(g) => g.dim,
            Geometry::GeometryCollection(g) => g.dim,
        }
    }

    /// Whether this geometry is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point(g) => g.is_empty(),
            Geometry::MultiPoint(g) => g.is_empty(),
            Geometry::LineString(g) => g.is_empty(),
            Geometry::MultiLineString(g) => g.is_empty(),
            Geometry::Polygon(g) => g.is_empty(),
            Geometry::MultiPolygon(g) => g.is_empty(),
            Geometry::GeometryCollection(g) => g.is_empty(),
        }
    }

    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "POINT",
            Geometry::MultiPoint(_) => "MULTIPOINT",
            Geometry::LineString(_) => "LINESTRING",
            Geometry::MultiLineString(_) => "MULTILINESTRING",
            Geometry::Polygon(_) => "POLYGON",
            Geometry::MultiPolygon(_) => "MULTIPOLYGON",
            Geometry::GeometryCollection(_) => "GEOMETRYCOLLECTION",
        }
    }

    /// Adds or strips the Z dimension recursively. Gained ordinates default
    /// to zero; stripped ordinates are zeroed.
    pub fn set_z(&mut self, has_z: bool) {
        self.adjust(|dim| dim.with_z(has_z), |c| if !has_z { c.z = 0.0 });
    }

    /// Adds or strips the M dimension recursively. Gained ordinates default
    /// to zero; stripped ordinates are zeroed.
    pub fn set_m(&mut self, has_m: bool) {
        self.adjust(|dim| dim.with_m(has_m), |c| if !has_m { c.m = 0.0 });
    }

    fn adjust(&mut self, set_dim: impl Fn(Dimension) -> Dimension + Copy, fix: impl Fn(&mut Coord) + Copy) {
        match self {
            Geometry::Point(g) => {
                g.dim = set_dim(g.dim);
                if let Some(c) = &mut g.coord {
                    fix(c);
                }
            }
            Geometry::MultiPoint(g) => {
                g.dim = set_dim(g.dim);
                for p in &mut g.points {
                    p.dim = set_dim(p.dim);
                    if let Some(c) = &mut p.coord {
                        fix(c);
                    }
                }
            }
            Geometry::LineString(g) => {
                g.dim = set_dim(g.dim);
                g.coords.iter_mut().for_each(fix);
            }
            Geometry::MultiLineString(g) => {
                g.dim = set_dim(g.dim);
                for l in &mut g.lines {
                    l.dim = set_dim(l.dim);
                    l.coords.iter_mut().for_each(fix);
                }
            }
            Geometry::Polygon(g) => {
                g.dim = set_dim(g.dim);
                for r in &mut g.rings {
                    r.dim = set_dim(r.dim);
                    r.coords.iter_mut().for_each(fix);
                }
            }
            Geometry::MultiPolygon(g) => {
                g.dim = set_dim(g.dim);
                for p in &mut g.polygons {
                    p.dim = set_dim(p.dim);
                    for r in &mut p.rings {
                        r.dim = set_dim(r.dim);
                        r.coords.iter_mut().for_each(fix);
                    }
                }
            }
            Geometry::GeometryCollection(g) => {
                g.dim = set_dim(g.dim);
                for child in &mut g.geometries {
                    child.adjust(set_dim, fix);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_cw(dim: Dimension) -> LineString {
        LineString::new(
            vec![
                Coord::xy(0., 0.),
                Coord::xy(0., 1.),
                Coord::xy(1., 1.),
                Coord::xy(1., 0.),
                Coord::xy(0., 0.),
            ],
            dim,
        )
    }

    #[test]
    fn winding_direction() {
        let ring = square_cw(Dimension::XY);
        assert!(ring.is_clockwise());
        let mut rev = ring.clone();
        rev.coords.reverse();
        assert!(!rev.is_clockwise());
    }

    #[test]
    fn dimension_flags() {
        assert_eq!(Dimension::from_flags(true, true), Dimension::XYZM);
        assert_eq!(Dimension::XYZM.with_z(false), Dimension::XYM);
        assert_eq!(Dimension::XY.with_m(true), Dimension::XYM);
        assert_eq!(Dimension::XYZ.size(), 3);
    }

    #[test]
    fn set_z_zeroes_stripped_ordinates() {
        let mut geom = Geometry::LineString(LineString::new(
            vec![Coord::xyz(0., 0., 5.), Coord::xyz(1., 1., 6.)],
            Dimension::XYZ,
        ));
        geom.set_z(false);
        assert_eq!(geom.dimension(), Dimension::XY);
        let Geometry::LineString(ls) = &geom else {
            unreachable!()
        };
        assert_eq!(ls.coords[0].z, 0.0);

        geom.set_z(true);
        assert_eq!(geom.dimension(), Dimension::XYZ);
    }

    #[test]
    fn emptiness() {
        assert!(Geometry::Point(Point::empty(Dimension::XY)).is_empty());
        assert!(Geometry::MultiPolygon(MultiPolygon::default()).is_empty());
        let poly = Polygon::new(vec![square_cw(Dimension::XY)], Dimension::XY);
        assert!(!Geometry::Polygon(poly).is_empty());
    }
}
