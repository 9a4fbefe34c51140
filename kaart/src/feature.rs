//! Vector features and their Well-Known-Text plumbing.

use std::sync::Arc;

use wkt::ToWkt as _;

use crate::style::{GeometryClass, StyleCatalog, StyleRecord};
use crate::Error;

/// Geometry of a single feature, in the map's working coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(geo_types::Point),
    Line(geo_types::LineString),
    Polygon(geo_types::Polygon),
}

impl Geometry {
    pub fn class(&self) -> GeometryClass {
        match self {
            Self::Point(_) => GeometryClass::Point,
            Self::Line(_) => GeometryClass::Line,
            Self::Polygon(_) => GeometryClass::Polygon,
        }
    }

    /// Parse a WKT literal. Only the three feature geometries are accepted;
    /// anything else (multi-geometries, collections) is malformed here.
    pub fn from_wkt(text: &str) -> Result<Self, Error> {
        let parsed: wkt::Wkt<f64> = text
            .trim()
            .parse()
            .map_err(|e| Error::MalformedGeometry(format!("{text:?}: {e}")))?;
        let geometry = geo_types::Geometry::try_from(parsed)
            .map_err(|e| Error::MalformedGeometry(format!("{text:?}: {e}")))?;

        match geometry {
            geo_types::Geometry::Point(point) => Ok(Self::Point(point)),
            geo_types::Geometry::LineString(line) => Ok(Self::Line(line)),
            geo_types::Geometry::Polygon(polygon) => Ok(Self::Polygon(polygon)),
            other => Err(Error::MalformedGeometry(format!(
                "unsupported geometry type: {other:?}"
            ))),
        }
    }

    /// Parse a WKT literal that arrived as comma-split fragments. Upstream
    /// query-string handling splits on commas, which breaks `LINESTRING` and
    /// `POLYGON` literals apart; they are rejoined here before parsing.
    pub fn from_wkt_fragments<S: AsRef<str>>(fragments: &[S]) -> Result<Self, Error> {
        let text = fragments
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        Self::from_wkt(&text)
    }

    /// Serialize back to the external WKT literal form.
    pub fn to_wkt(&self) -> String {
        match self {
            Self::Point(point) => geo_types::Geometry::from(*point).wkt_string(),
            Self::Line(line) => geo_types::Geometry::from(line.clone()).wkt_string(),
            Self::Polygon(polygon) => geo_types::Geometry::from(polygon.clone()).wkt_string(),
        }
    }

    /// The point, if this is a point geometry.
    pub fn as_point(&self) -> Option<geo_types::Point> {
        match self {
            Self::Point(point) => Some(*point),
            _ => None,
        }
    }
}

/// A vector feature: geometry, attributes, and a resolved style.
///
/// The style is shared with the catalog which owns the canonical record;
/// selection emphasis works on a mutated clone, never on the record itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Geometry,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Style id this feature was created with.
    pub styletype: String,
    pub style: Arc<StyleRecord>,
}

impl Feature {
    /// Build a feature from a WKT literal, resolving `style_id` in `styles`.
    pub fn from_wkt(
        wkt: &str,
        style_id: &str,
        name: Option<String>,
        description: Option<String>,
        styles: &StyleCatalog,
    ) -> Result<Self, Error> {
        let geometry = Geometry::from_wkt(wkt)?;
        Self::new(geometry, style_id, name, description, styles)
    }

    pub fn new(
        geometry: Geometry,
        style_id: &str,
        name: Option<String>,
        description: Option<String>,
        styles: &StyleCatalog,
    ) -> Result<Self, Error> {
        let style = styles
            .resolve(style_id)
            .ok_or_else(|| Error::Configuration(format!("unknown style id: {style_id}")))?;
        Ok(Self {
            geometry,
            name,
            description,
            styletype: style_id.to_owned(),
            style,
        })
    }
}

/// Ordered features bound to the single features layer; insertion order is
/// draw order.
#[derive(Debug, Default, Clone)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Feature> {
        self.features.get_mut(index)
    }

    pub fn last(&self) -> Option<&Feature> {
        self.features.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn as_slice(&self) -> &[Feature] {
        &self.features
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parsing_a_point() {
        let geometry = Geometry::from_wkt("POINT(136260 456394)").unwrap();
        let point = geometry.as_point().unwrap();
        assert_relative_eq!(point.x(), 136260.0);
        assert_relative_eq!(point.y(), 456394.0);
        assert_eq!(GeometryClass::Point, geometry.class());
    }

    #[test]
    fn parsing_garbage_is_an_observable_error() {
        let Err(Error::MalformedGeometry(_)) = Geometry::from_wkt("POINT(nope)") else {
            panic!("expected a malformed geometry error");
        };
    }

    #[test]
    fn multi_geometries_are_rejected() {
        let result = Geometry::from_wkt("MULTIPOINT((1 2), (3 4))");
        assert!(matches!(result, Err(Error::MalformedGeometry(_))));
    }

    #[test]
    fn rejoining_comma_split_fragments() {
        let geometry =
            Geometry::from_wkt_fragments(&["LINESTRING(0 0", "10 10", "20 0)"]).unwrap();
        let Geometry::Line(line) = &geometry else {
            panic!("expected a line");
        };
        assert_eq!(3, line.0.len());
    }

    #[test]
    fn wkt_round_trip_preserves_coordinates() {
        for literal in [
            "POINT(136260 456394)",
            "LINESTRING(0 0,10 10,20 0)",
            "POLYGON((0 0,10 0,10 10,0 0))",
        ] {
            let geometry = Geometry::from_wkt(literal).unwrap();
            let round_tripped = Geometry::from_wkt(&geometry.to_wkt()).unwrap();
            assert_eq!(geometry, round_tripped);
        }
    }

    #[test]
    fn feature_carries_attributes_and_resolved_style() {
        let styles = StyleCatalog::builtin();
        let feature = Feature::from_wkt(
            "POINT(136260 456394)",
            "mt1",
            Some("A name".to_owned()),
            Some("A description".to_owned()),
            &styles,
        )
        .unwrap();

        assert_eq!("mt1", feature.styletype);
        assert_eq!(
            feature.style.external_graphic,
            styles.resolve("mt1").unwrap().external_graphic
        );
    }

    #[test]
    fn unknown_style_id_fails_feature_creation() {
        let styles = StyleCatalog::builtin();
        let result = Feature::from_wkt("POINT(0 0)", "zz9", None, None, &styles);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }
}
