//! Named visual styles and the catalog resolving them.
//!
//! Style identifiers follow the convention established by the embedding
//! pages: the first character encodes the geometry class (`m` for markers,
//! `l` for lines, `p` for polygons), e.g. `mt3` or `pt0`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::Error;

/// Geometry class of a feature or a drawing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryClass {
    Point,
    Line,
    Polygon,
}

impl GeometryClass {
    /// Style id assigned to features whose source carries no style of its own.
    pub fn default_style_id(self) -> &'static str {
        match self {
            Self::Point => "mt0",
            Self::Line => "lt0",
            Self::Polygon => "pt0",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Point => 0,
            Self::Line => 1,
            Self::Polygon => 2,
        }
    }
}

/// Compatibility shim for the established identifier strings: derive the
/// geometry class from the first character of a style id.
pub fn classify(style_id: &str) -> Option<GeometryClass> {
    match style_id.chars().next() {
        Some('m') => Some(GeometryClass::Point),
        Some('l') => Some(GeometryClass::Line),
        Some('p') => Some(GeometryClass::Polygon),
        _ => None,
    }
}

/// Concrete visual style. Color values are opaque to this crate and are
/// interpreted by the map engine (`"red"`, `"#273397"`, ...).
#[derive(Debug, Clone, PartialEq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleRecord {
    /// Human readable name, used in style pickers.
    pub name: Option<String>,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_opacity: Option<f64>,
    /// URL or path of the marker icon.
    pub external_graphic: Option<String>,
    pub graphic_width: Option<f64>,
    pub graphic_height: Option<f64>,
    pub graphic_y_offset: Option<f64>,
    pub point_radius: Option<f64>,
}

impl StyleRecord {
    /// Right-biased default fill: every property absent here is copied from
    /// `baseline`, properties explicitly set are never overwritten. This is
    /// a shallow merge of top-level properties only.
    pub fn apply_defaults(mut self, baseline: &StyleRecord) -> StyleRecord {
        self.name = self.name.or_else(|| baseline.name.clone());
        self.fill_color = self.fill_color.or_else(|| baseline.fill_color.clone());
        self.fill_opacity = self.fill_opacity.or(baseline.fill_opacity);
        self.stroke_color = self.stroke_color.or_else(|| baseline.stroke_color.clone());
        self.stroke_width = self.stroke_width.or(baseline.stroke_width);
        self.stroke_opacity = self.stroke_opacity.or(baseline.stroke_opacity);
        self.external_graphic = self
            .external_graphic
            .or_else(|| baseline.external_graphic.clone());
        self.graphic_width = self.graphic_width.or(baseline.graphic_width);
        self.graphic_height = self.graphic_height.or(baseline.graphic_height);
        self.graphic_y_offset = self.graphic_y_offset.or(baseline.graphic_y_offset);
        self.point_radius = self.point_radius.or(baseline.point_radius);
        self
    }

    /// Copy with the icon graphic removed. Icons are point-only; line and
    /// polygon drawing tools get this variant assigned.
    pub fn without_graphic(&self) -> StyleRecord {
        StyleRecord {
            external_graphic: None,
            graphic_width: None,
            graphic_height: None,
            graphic_y_offset: None,
            ..self.clone()
        }
    }

    /// Copy with slightly exaggerated dimensions, used while a feature is
    /// selected so the selection stays visible despite the per-feature style.
    pub fn emphasized(&self) -> StyleRecord {
        StyleRecord {
            stroke_width: self.stroke_width.map(|w| w + 2.0),
            graphic_width: self.graphic_width.map(|w| w + 5.0),
            graphic_height: self.graphic_height.map(|h| h + 5.0),
            ..self.clone()
        }
    }
}

/// A style record together with the id under which it is registered.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct StyleDeclaration {
    pub id: String,
    #[serde(flatten)]
    pub record: StyleRecord,
}

/// Catalog of named styles, immutable once built.
///
/// Built from a list of declarations: a baseline marker record is registered
/// as `mt0` first, and every marker (`m*`) declaration is then filled with
/// the baseline's properties where it leaves them out. Line and polygon
/// declarations are taken as-is; whatever they do not declare falls back to
/// the engine's generic default style. Declaring the same id twice keeps the
/// later entry.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    records: HashMap<String, Arc<StyleRecord>>,
}

impl StyleCatalog {
    /// Catalog with the built-in marker, line and polygon declarations.
    pub fn builtin() -> Self {
        Self::with_declarations(builtin_declarations())
    }

    /// Catalog built from a caller-supplied style table. The table replaces
    /// the built-in declarations; the same defaulting pass still runs.
    pub fn with_declarations(declarations: Vec<StyleDeclaration>) -> Self {
        let baseline = baseline_marker();
        let mut records = HashMap::new();
        records.insert("mt0".to_owned(), Arc::new(baseline.clone()));

        for declaration in declarations {
            let record = if classify(&declaration.id) == Some(GeometryClass::Point) {
                declaration.record.apply_defaults(&baseline)
            } else {
                declaration.record
            };
            // Last one wins on duplicate ids.
            records.insert(declaration.id, Arc::new(record));
        }

        Self { records }
    }

    /// Parse a JSON style table, as shipped by embedding pages.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let declarations: Vec<StyleDeclaration> = serde_json::from_str(text)
            .map_err(|e| Error::Configuration(format!("style table: {e}")))?;
        Ok(Self::with_declarations(declarations))
    }

    pub fn resolve(&self, style_id: &str) -> Option<Arc<StyleRecord>> {
        self.records.get(style_id).cloned()
    }
}

/// The marker record every `m*` declaration is filled from.
fn baseline_marker() -> StyleRecord {
    StyleRecord {
        name: Some("Default marker".to_owned()),
        external_graphic: Some("markertypes/default.png".to_owned()),
        graphic_width: Some(32.0),
        graphic_height: Some(37.0),
        graphic_y_offset: Some(-37.0),
        ..StyleRecord::default()
    }
}

fn marker(id: &str, name: &str, graphic: &str) -> StyleDeclaration {
    StyleDeclaration {
        id: id.to_owned(),
        record: StyleRecord {
            name: Some(name.to_owned()),
            external_graphic: Some(format!("markertypes/{graphic}.png")),
            ..StyleRecord::default()
        },
    }
}

fn builtin_declarations() -> Vec<StyleDeclaration> {
    let mut declarations = vec![
        marker("mt0", "Star", "star"),
        marker("mt1", "Information blue", "information_blue"),
        marker("mt2", "Information green", "information_green"),
        marker("mt3", "Information yellow", "information_yellow"),
        marker("mt4", "Roadworks", "workman_ahead"),
        marker("mt5", "Warning", "general_warning"),
        marker("mt6", "Flammable", "flame"),
        marker("mt7", "No entry", "no_entry"),
        marker("mt8", "Stop", "stop_sign"),
        marker("mt9", "Traffic lights", "traffic_lights"),
    ];

    let shape = |id: &str, name: &str, record: StyleRecord| StyleDeclaration {
        id: id.to_owned(),
        record: StyleRecord {
            name: Some(name.to_owned()),
            ..record
        },
    };

    declarations.extend([
        shape(
            "pt0",
            "Default polygon",
            StyleRecord {
                fill_color: Some("#273397".to_owned()),
                fill_opacity: Some(0.3),
                stroke_color: Some("#273397".to_owned()),
                stroke_width: Some(2.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "pt1",
            "Red, black outline",
            StyleRecord {
                fill_color: Some("red".to_owned()),
                stroke_color: Some("black".to_owned()),
                stroke_width: Some(1.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "pt2",
            "Red, heavy black outline",
            StyleRecord {
                fill_color: Some("red".to_owned()),
                stroke_color: Some("black".to_owned()),
                stroke_width: Some(3.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "pt3",
            "Green, blue outline",
            StyleRecord {
                fill_color: Some("green".to_owned()),
                stroke_color: Some("blue".to_owned()),
                stroke_width: Some(1.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "pt4",
            "Green transparent, blue outline",
            StyleRecord {
                fill_color: Some("green".to_owned()),
                fill_opacity: Some(0.5),
                stroke_color: Some("blue".to_owned()),
                stroke_width: Some(3.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "lt0",
            "Default line",
            StyleRecord {
                stroke_color: Some("#273397".to_owned()),
                stroke_width: Some(5.0),
                stroke_opacity: Some(0.5),
                ..StyleRecord::default()
            },
        ),
        shape(
            "lt1",
            "Thin red line",
            StyleRecord {
                stroke_color: Some("red".to_owned()),
                stroke_width: Some(1.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "lt2",
            "Red line",
            StyleRecord {
                stroke_color: Some("red".to_owned()),
                stroke_width: Some(3.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "lt3",
            "Thin green line",
            StyleRecord {
                stroke_color: Some("green".to_owned()),
                stroke_width: Some(1.0),
                ..StyleRecord::default()
            },
        ),
        shape(
            "lt4",
            "Wide yellow line",
            StyleRecord {
                stroke_color: Some("#ffff00".to_owned()),
                stroke_width: Some(5.0),
                stroke_opacity: Some(0.5),
                ..StyleRecord::default()
            },
        ),
    ]);

    declarations
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn classify_by_first_character() {
        assert_eq!(Some(GeometryClass::Point), classify("mt13"));
        assert_eq!(Some(GeometryClass::Line), classify("lt0"));
        assert_eq!(Some(GeometryClass::Polygon), classify("pt4"));
        assert_eq!(None, classify("xt1"));
        assert_eq!(None, classify(""));
    }

    #[test]
    fn marker_styles_are_filled_from_the_baseline() {
        let catalog = StyleCatalog::builtin();
        let style = catalog.resolve("mt1").unwrap();

        // Explicitly set properties are kept.
        assert_eq!(
            Some("markertypes/information_blue.png"),
            style.external_graphic.as_deref()
        );
        // Omitted properties come from the baseline.
        assert_eq!(Some(32.0), style.graphic_width);
        assert_eq!(Some(37.0), style.graphic_height);
        assert_eq!(Some(-37.0), style.graphic_y_offset);
    }

    #[test]
    fn defaulting_is_right_biased_and_idempotent() {
        let baseline = baseline_marker();
        let declared = StyleRecord {
            external_graphic: Some("markertypes/custom.png".to_owned()),
            graphic_width: Some(16.0),
            ..StyleRecord::default()
        };

        let merged = declared.clone().apply_defaults(&baseline);
        assert_eq!(Some("markertypes/custom.png"), merged.external_graphic.as_deref());
        assert_eq!(Some(16.0), merged.graphic_width);
        assert_eq!(baseline.graphic_height, merged.graphic_height);

        // Merging again changes nothing.
        assert_eq!(merged, merged.clone().apply_defaults(&baseline));
    }

    #[test]
    fn line_and_polygon_styles_are_not_filled_from_the_marker_baseline() {
        let catalog = StyleCatalog::builtin();
        let line = catalog.resolve("lt0").unwrap();
        assert_eq!(None, line.external_graphic);
        assert_eq!(None, line.graphic_width);
        let polygon = catalog.resolve("pt0").unwrap();
        assert_eq!(None, polygon.external_graphic);
    }

    #[test]
    fn duplicate_declaration_keeps_the_later_entry() {
        let catalog = StyleCatalog::with_declarations(vec![
            StyleDeclaration {
                id: "lt1".to_owned(),
                record: StyleRecord {
                    stroke_width: Some(1.0),
                    ..StyleRecord::default()
                },
            },
            StyleDeclaration {
                id: "lt1".to_owned(),
                record: StyleRecord {
                    stroke_width: Some(7.0),
                    ..StyleRecord::default()
                },
            },
        ]);
        assert_eq!(Some(7.0), catalog.resolve("lt1").unwrap().stroke_width);
    }

    #[test]
    fn custom_table_replaces_the_builtin_declarations() {
        let catalog = StyleCatalog::from_json(
            r#"[{"id": "mt1", "externalGraphic": "markertypes/custom.png"}]"#,
        )
        .unwrap();

        let custom = catalog.resolve("mt1").unwrap();
        assert_eq!(
            Some("markertypes/custom.png"),
            custom.external_graphic.as_deref()
        );
        // Filled from the baseline by the same defaulting pass.
        assert_eq!(Some(37.0), custom.graphic_height);

        // Built-in declarations other than the baseline are gone.
        assert!(catalog.resolve("pt0").is_none());
        // The baseline itself is always resolvable.
        assert!(catalog.resolve("mt0").is_some());
    }

    #[test]
    fn stripping_the_graphic_keeps_the_rest() {
        let style = StyleRecord {
            stroke_color: Some("red".to_owned()),
            external_graphic: Some("markertypes/star.png".to_owned()),
            graphic_width: Some(32.0),
            ..StyleRecord::default()
        };
        let stripped = style.without_graphic();
        assert_eq!(None, stripped.external_graphic);
        assert_eq!(None, stripped.graphic_width);
        assert_eq!(Some("red"), stripped.stroke_color.as_deref());
    }
}
