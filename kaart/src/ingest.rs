//! Bulk feature ingestion from external exchange formats.
//!
//! Two formats are supported: KML, whose coordinates are geographic
//! (WGS84) by definition, and a tab separated text format whose coordinates
//! default to the map's own projected grid. The two defaults are deliberately
//! different; everything that comes in is reprojected into the map's working
//! coordinate system before a feature is made of it.

use std::str::FromStr;

use crate::engine::{Crs, MapEngine};
use crate::feature::{Feature, Geometry};
use crate::style::StyleCatalog;
use crate::Error;

/// The supported bulk-ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Kml,
    Text,
}

impl FromStr for FormatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kml" => Ok(Self::Kml),
            "txt" | "text" => Ok(Self::Text),
            other => Err(Error::UnsupportedFormat(other.to_owned())),
        }
    }
}

impl FormatKind {
    fn reader(self) -> Box<dyn FormatReader> {
        match self {
            Self::Kml => Box::new(KmlReader),
            Self::Text => Box::new(TextReader),
        }
    }
}

/// Geometry and attributes as they come out of a format reader, still in the
/// source reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeature {
    pub geometry: Geometry,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// One implementation per supported format kind.
pub trait FormatReader {
    /// Reference system the coordinates are assumed to be in.
    fn source_crs(&self) -> Crs;

    fn read(&self, text: &str) -> Result<Vec<ParsedFeature>, Error>;
}

/// Parse a payload, reproject everything into `map_crs` and assign the
/// geometry-class default style where the format carries none.
pub(crate) fn ingest_features(
    payload: &str,
    kind: FormatKind,
    map_crs: Crs,
    styles: &StyleCatalog,
    engine: &dyn MapEngine,
) -> Result<Vec<Feature>, Error> {
    let reader = kind.reader();
    let source_crs = reader.source_crs();

    reader
        .read(payload)?
        .into_iter()
        .map(|parsed| {
            let geometry = engine.reproject(&parsed.geometry, source_crs, map_crs)?;
            let style_id = geometry.class().default_style_id();
            Feature::new(geometry, style_id, parsed.name, parsed.description, styles)
        })
        .collect()
}

/// KML reader. Coordinates are geographic per the KML specification.
pub struct KmlReader;

impl FormatReader for KmlReader {
    fn source_crs(&self) -> Crs {
        Crs::Wgs84
    }

    fn read(&self, text: &str) -> Result<Vec<ParsedFeature>, Error> {
        let document =
            kml::Kml::from_str(text).map_err(|e| Error::MalformedGeometry(format!("kml: {e}")))?;
        let mut features = Vec::new();
        collect_kml(&document, &mut features);
        Ok(features)
    }
}

fn collect_kml(element: &kml::Kml, features: &mut Vec<ParsedFeature>) {
    match element {
        kml::Kml::KmlDocument(document) => {
            for child in &document.elements {
                collect_kml(child, features);
            }
        }
        kml::Kml::Document { elements, .. } => {
            for child in elements {
                collect_kml(child, features);
            }
        }
        kml::Kml::Folder(folder) => {
            for child in &folder.elements {
                collect_kml(child, features);
            }
        }
        kml::Kml::Placemark(placemark) => {
            if let Some(geometry) = &placemark.geometry {
                collect_kml_geometry(
                    geometry,
                    placemark.name.clone(),
                    placemark.description.clone(),
                    features,
                );
            }
        }
        other => {
            log::debug!("Skipping KML element: {other:?}");
        }
    }
}

fn collect_kml_geometry(
    geometry: &kml::types::Geometry,
    name: Option<String>,
    description: Option<String>,
    features: &mut Vec<ParsedFeature>,
) {
    let converted = match geometry {
        kml::types::Geometry::Point(point) => Some(Geometry::Point(geo_types::Point::new(
            point.coord.x,
            point.coord.y,
        ))),
        kml::types::Geometry::LineString(line) => {
            Some(Geometry::Line(line_string(&line.coords)))
        }
        kml::types::Geometry::LinearRing(ring) => Some(Geometry::Polygon(
            geo_types::Polygon::new(line_string(&ring.coords), Vec::new()),
        )),
        kml::types::Geometry::Polygon(polygon) => {
            let interiors = polygon
                .inner
                .iter()
                .map(|ring| line_string(&ring.coords))
                .collect();
            Some(Geometry::Polygon(geo_types::Polygon::new(
                line_string(&polygon.outer.coords),
                interiors,
            )))
        }
        kml::types::Geometry::MultiGeometry(multi) => {
            for child in &multi.geometries {
                collect_kml_geometry(child, name.clone(), description.clone(), features);
            }
            None
        }
        other => {
            log::debug!("Skipping KML geometry: {other:?}");
            None
        }
    };

    if let Some(geometry) = converted {
        features.push(ParsedFeature {
            geometry,
            name,
            description,
        });
    }
}

fn line_string(coords: &[kml::types::Coord]) -> geo_types::LineString {
    coords
        .iter()
        .map(|c| geo_types::coord! { x: c.x, y: c.y })
        .collect()
}

/// Tab separated text reader: a header row naming either a `point` column
/// (`lat,lon`) or `lat` and `lon` columns, optionally `title` and
/// `description`. Point features only. Coordinates default to the map's
/// projected grid, not to geographic coordinates.
pub struct TextReader;

impl FormatReader for TextReader {
    fn source_crs(&self) -> Crs {
        Crs::Rd
    }

    fn read(&self, text: &str) -> Result<Vec<ParsedFeature>, Error> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let header: Vec<String> = lines
            .next()
            .ok_or_else(|| Error::MalformedGeometry("text: empty payload".to_owned()))?
            .split('\t')
            .map(|column| column.trim().to_ascii_lowercase())
            .collect();

        let column = |name: &str| header.iter().position(|c| c == name);
        let point_column = column("point");
        let lat_column = column("lat");
        let lon_column = column("lon");
        let title_column = column("title");
        let description_column = column("description");

        if point_column.is_none() && (lat_column.is_none() || lon_column.is_none()) {
            return Err(Error::MalformedGeometry(
                "text: header declares neither a point column nor lat/lon columns".to_owned(),
            ));
        }

        let mut features = Vec::new();
        for line in lines {
            let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
            let field = |index: Option<usize>| index.and_then(|i| fields.get(i).copied());

            let (y, x) = if let Some(point) = field(point_column) {
                let (y, x) = point.split_once(',').ok_or_else(|| {
                    Error::MalformedGeometry(format!("text: bad point {point:?}"))
                })?;
                (y.trim().to_owned(), x.trim().to_owned())
            } else {
                match (field(lat_column), field(lon_column)) {
                    (Some(y), Some(x)) => (y.to_owned(), x.to_owned()),
                    _ => {
                        return Err(Error::MalformedGeometry(format!(
                            "text: row without coordinates: {line:?}"
                        )))
                    }
                }
            };

            let parse = |value: &str| {
                value
                    .parse::<f64>()
                    .map_err(|e| Error::MalformedGeometry(format!("text: {value:?}: {e}")))
            };

            features.push(ParsedFeature {
                geometry: Geometry::Point(geo_types::Point::new(parse(&x)?, parse(&y)?)),
                // The text format calls it a title; features know it as a name.
                name: field(title_column).map(ToOwned::to_owned),
                description: field(description_column).map(ToOwned::to_owned),
            });
        }
        Ok(features)
    }
}
