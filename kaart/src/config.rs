//! Declarative map configuration.
//!
//! Embedding pages describe a map as flat key/value pairs, typically straight
//! from an URL query string. Query-string parsers commonly split values on
//! commas, so a single logical value may arrive as repeated pairs under the
//! same key; WKT geometries are put back together from those fragments here.

use std::collections::HashMap;

use crate::Error;

/// Numbered feature parameters are scanned up to this index.
pub const MAX_NUMBERED_FEATURES: usize = 100;

/// One feature described by the numbered `fgeom`/`ftype`/`fname`/`fdesc`
/// parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureConfig {
    pub wkt: String,
    pub styletype: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Everything an embedding page can ask for, parsed but not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Id of the DOM element to render into.
    pub div: Option<String>,
    /// Initial center, in map coordinates. Only used together with `zoom`.
    pub loc: Option<geo_types::Point>,
    pub zoom: Option<u8>,
    /// Initial extent. Takes precedence over `loc`/`zoom`.
    pub bbox: Option<geo_types::Rect>,
    /// Identifiers of predefined layers to add.
    pub layers: Vec<String>,
    /// Marker location shorthand, always a point.
    pub mloc: Option<geo_types::Point>,
    /// Style for the `mloc` marker.
    pub mt: Option<String>,
    /// Popup title for the `mloc` marker.
    pub title: Option<String>,
    /// Popup text for the `mloc` marker.
    pub text: Option<String>,
    pub wmsurl: Option<String>,
    pub wmslayers: Option<String>,
    pub wmtsurl: Option<String>,
    pub wmtslayer: Option<String>,
    pub wmtsmatrixset: Option<String>,
    pub tmsurl: Option<String>,
    pub tmslayer: Option<String>,
    pub tmstype: Option<String>,
    /// URL of a tab separated text payload to fetch and ingest.
    pub txturl: Option<String>,
    /// URL of a KML payload to fetch and ingest.
    pub kmlurl: Option<String>,
    pub show_popup: bool,
    pub hover_popup: bool,
    /// Custom style declarations as a JSON array.
    pub styles: Option<String>,
    pub features: Vec<FeatureConfig>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            div: None,
            loc: None,
            zoom: None,
            bbox: None,
            layers: Vec::new(),
            mloc: None,
            mt: None,
            title: None,
            text: None,
            wmsurl: None,
            wmslayers: None,
            wmtsurl: None,
            wmtslayer: None,
            wmtsmatrixset: None,
            tmsurl: None,
            tmslayer: None,
            tmstype: None,
            txturl: None,
            kmlurl: None,
            show_popup: true,
            hover_popup: true,
            styles: None,
            features: Vec::new(),
        }
    }
}

impl MapConfig {
    /// Parse key/value pairs. Unknown keys are ignored; for keys that are not
    /// comma-fragmented by nature, the last occurrence wins.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, Error> {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            values
                .entry(key.to_ascii_lowercase())
                .or_default()
                .push(value.to_owned());
        }
        let last = |key: &str| values.get(key).and_then(|v| v.last()).cloned();

        let mut config = Self {
            div: last("div"),
            // Coordinate pairs and extents arrive fragmented like WKT does;
            // rejoin every occurrence before parsing.
            loc: values
                .get("loc")
                .map(|v| parse_point("loc", &v.join(",")))
                .transpose()?,
            zoom: last("zoom").map(|v| parse_zoom(&v)).transpose()?,
            bbox: values
                .get("bbox")
                .map(|v| parse_bbox(&v.join(",")))
                .transpose()?,
            mloc: values
                .get("mloc")
                .map(|v| parse_point("mloc", &v.join(",")))
                .transpose()?,
            mt: last("mt"),
            title: last("title"),
            text: last("text"),
            wmsurl: last("wmsurl"),
            wmslayers: last("wmslayers"),
            wmtsurl: last("wmtsurl"),
            wmtslayer: last("wmtslayer"),
            wmtsmatrixset: last("wmtsmatrixset"),
            tmsurl: last("tmsurl"),
            tmslayer: last("tmslayer"),
            tmstype: last("tmstype"),
            txturl: last("txturl"),
            kmlurl: last("kmlurl"),
            show_popup: last("showpopup").map(|v| parse_bool(&v)).transpose()?.unwrap_or(true),
            hover_popup: last("hoverpopup").map(|v| parse_bool(&v)).transpose()?.unwrap_or(true),
            styles: last("styles"),
            ..Self::default()
        };

        // A layer parameter may be repeated, hold a comma separated list, or
        // both.
        if let Some(occurrences) = values.get("layer") {
            config.layers = occurrences
                .iter()
                .flat_map(|v| v.split(','))
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty())
                .collect();
        }

        // Numbered features. The scan stops at the first gap, so a page
        // cannot accidentally skip an index and silently lose the rest.
        for i in 1..=MAX_NUMBERED_FEATURES {
            let Some(fragments) = values.get(&format!("fgeom{i}")) else {
                break;
            };
            config.features.push(FeatureConfig {
                // A WKT value containing commas arrives fragmented.
                wkt: fragments.join(","),
                styletype: last(&format!("ftype{i}")),
                name: last(&format!("fname{i}")),
                description: last(&format!("fdesc{i}")),
            });
        }

        Ok(config)
    }
}

fn parse_point(key: &str, value: &str) -> Result<geo_types::Point, Error> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| Error::Configuration(format!("{key}: expected x,y, got {value:?}")))?;
    Ok(geo_types::Point::new(
        parse_number(key, x)?,
        parse_number(key, y)?,
    ))
}

fn parse_bbox(value: &str) -> Result<geo_types::Rect, Error> {
    let numbers: Vec<f64> = value
        .split(',')
        .map(|n| parse_number("bbox", n))
        .collect::<Result<_, _>>()?;
    if numbers.len() != 4 {
        return Err(Error::Configuration(format!(
            "bbox: expected 4 numbers, got {}",
            numbers.len()
        )));
    }
    Ok(geo_types::Rect::new(
        geo_types::coord! { x: numbers[0], y: numbers[1] },
        geo_types::coord! { x: numbers[2], y: numbers[3] },
    ))
}

fn parse_number(key: &str, value: &str) -> Result<f64, Error> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Configuration(format!("{key}: {value:?}: {e}")))
}

fn parse_zoom(value: &str) -> Result<u8, Error> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Configuration(format!("zoom: {value:?}: {e}")))
}

fn parse_bool(value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::Configuration(format!(
            "expected a boolean, got {other:?}"
        ))),
    }
}
