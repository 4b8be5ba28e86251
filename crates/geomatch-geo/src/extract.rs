//! Extraction of one kind's components from arbitrarily nested geometries

use std::collections::HashSet;

use geo::{
    BooleanOps, Coord, Geometry, Line, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use geomatch_core::models::GeometryKind;

/// Collect every component of `kind` from a geometry, walking nested
/// collections.
///
/// Polygons are unioned. Lines are split into segments and degenerate ones
/// dropped. Collinear segments are merged so overlaps count once, then
/// chained back together. Points are deduplicated. Returns `None` when
/// nothing of the kind remains.
pub fn recursive_extract(geometry: &Geometry, kind: GeometryKind) -> Option<Geometry> {
    let mut leaves = Leaves::default();
    leaves.collect(geometry, kind);

    match kind {
        GeometryKind::Polygon => leaves.polygons(),
        GeometryKind::Line => leaves.lines(),
        GeometryKind::Point => leaves.points(),
    }
}

#[derive(Default)]
struct Leaves {
    polygons: Vec<Polygon>,
    segments: Vec<Line>,
    points: Vec<Point>,
}

impl Leaves {
    fn collect(&mut self, geometry: &Geometry, kind: GeometryKind) {
        match (geometry, kind) {
            (Geometry::GeometryCollection(gc), _) => {
                for member in &gc.0 {
                    self.collect(member, kind);
                }
            }
            (Geometry::Polygon(p), GeometryKind::Polygon) => self.polygons.push(p.clone()),
            (Geometry::MultiPolygon(mp), GeometryKind::Polygon) => {
                self.polygons.extend(mp.0.iter().cloned())
            }
            (Geometry::Rect(r), GeometryKind::Polygon) => self.polygons.push(r.to_polygon()),
            (Geometry::Triangle(t), GeometryKind::Polygon) => self.polygons.push(t.to_polygon()),
            (Geometry::Line(l), GeometryKind::Line) => self.segments.push(*l),
            (Geometry::LineString(ls), GeometryKind::Line) => self.segments.extend(ls.lines()),
            (Geometry::MultiLineString(mls), GeometryKind::Line) => {
                self.segments.extend(mls.0.iter().flat_map(|ls| ls.lines()))
            }
            (Geometry::Point(p), GeometryKind::Point) => self.points.push(*p),
            (Geometry::MultiPoint(mp), GeometryKind::Point) => {
                self.points.extend(mp.0.iter().copied())
            }
            _ => {}
        }
    }

    fn polygons(self) -> Option<Geometry> {
        let merged = self
            .polygons
            .iter()
            .filter(|p| !p.exterior().0.is_empty())
            .fold(MultiPolygon::new(vec![]), |acc, p| acc.union(p));

        (!merged.0.is_empty()).then_some(Geometry::MultiPolygon(merged))
    }

    fn lines(self) -> Option<Geometry> {
        let mut groups: Vec<Collinear> = Vec::new();
        for segment in self.segments.into_iter().filter(|s| s.start != s.end) {
            match groups.iter_mut().find(|group| group.contains(&segment)) {
                Some(group) => group.push(segment),
                None => groups.push(Collinear::new(segment)),
            }
        }

        let mut chains: Vec<Vec<Coord>> = Vec::new();
        for segment in groups.into_iter().flat_map(Collinear::merged) {
            match chains.last_mut() {
                Some(chain) if chain.last() == Some(&segment.start) => chain.push(segment.end),
                Some(chain) if chain.last() == Some(&segment.end) => chain.push(segment.start),
                _ => chains.push(vec![segment.start, segment.end]),
            }
        }

        if chains.is_empty() {
            return None;
        }
        let lines = chains.into_iter().map(LineString::new).collect();
        Some(Geometry::MultiLineString(MultiLineString::new(lines)))
    }

    fn points(self) -> Option<Geometry> {
        let mut seen = HashSet::new();
        let unique: Vec<Point> =
            self.points.into_iter().filter(|p| seen.insert(coord_key(p.0))).collect();

        if unique.is_empty() {
            return None;
        }
        Some(Geometry::MultiPoint(MultiPoint::new(unique)))
    }
}

fn coord_key(coord: Coord) -> (u64, u64) {
    (coord.x.to_bits(), coord.y.to_bits())
}

/// Relative distance from a supporting line below which a point lies on it
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Part of a supporting line, as an interval of its parameter
#[derive(Debug, Clone, Copy)]
struct Span {
    from: f64,
    start: Coord,
    to: f64,
    end: Coord,
}

/// Segments lying on one supporting line.
///
/// The line is `origin + t * direction`, taken from the first segment.
/// Overlapping or touching spans are merged, whatever the direction of the
/// segments they came from.
struct Collinear {
    origin: Coord,
    direction: Coord,
    spans: Vec<Span>,
}

impl Collinear {
    fn new(segment: Line) -> Self {
        let mut group =
            Self { origin: segment.start, direction: segment.delta(), spans: Vec::new() };
        group.push(segment);
        group
    }

    fn contains(&self, segment: &Line) -> bool {
        self.is_on_line(segment.start) && self.is_on_line(segment.end)
    }

    fn is_on_line(&self, coord: Coord) -> bool {
        let offset = coord - self.origin;
        let cross = self.direction.x * offset.y - self.direction.y * offset.x;
        let length = self.direction.x.hypot(self.direction.y);
        cross.abs() <= COLLINEAR_TOLERANCE * length * length.max(offset.x.hypot(offset.y))
    }

    fn parameter(&self, coord: Coord) -> f64 {
        let offset = coord - self.origin;
        let d = self.direction;
        (offset.x * d.x + offset.y * d.y) / (d.x * d.x + d.y * d.y)
    }

    fn push(&mut self, segment: Line) {
        let (a, b) = (self.parameter(segment.start), self.parameter(segment.end));
        let span = if a <= b {
            Span { from: a, start: segment.start, to: b, end: segment.end }
        } else {
            Span { from: b, start: segment.end, to: a, end: segment.start }
        };
        self.spans.push(span);
    }

    fn merged(mut self) -> Vec<Line> {
        self.spans.sort_by(|a, b| a.from.total_cmp(&b.from));

        let mut merged: Vec<Span> = Vec::new();
        for span in self.spans {
            match merged.last_mut() {
                Some(last) if span.from <= last.to => {
                    if span.to > last.to {
                        last.to = span.to;
                        last.end = span.end;
                    }
                }
                _ => merged.push(span),
            }
        }

        merged.into_iter().map(|span| Line::new(span.start, span.end)).collect()
    }
}
