//! Recording fakes for the engine and host traits.

use std::collections::HashMap;

use crate::engine::{Crs, Host, LayerId, MapEngine, MapInit};
use crate::feature::{Feature, Geometry};
use crate::layers::{TmsLayer, WmsLayer, WmtsLayer};
use crate::style::{GeometryClass, StyleRecord};
use crate::Error;

/// What kind of layer a [`FakeEngine`] was asked to construct.
#[derive(Debug, Clone, PartialEq)]
pub enum AddedLayer {
    Wms(WmsLayer),
    Wmts(WmtsLayer),
    Tms(TmsLayer),
    Vector(String),
}

/// Engine double that records every call and answers queries from the
/// recorded state. Reprojection uses a local affine approximation of the
/// Dutch grid, good enough to tell coordinate systems apart in assertions.
#[derive(Default)]
pub struct FakeEngine {
    next_layer: u64,
    pub init: Option<MapInit>,
    pub layers: Vec<(LayerId, AddedLayer)>,
    pub features: HashMap<LayerId, Vec<Feature>>,
    pub zoom: u8,
    pub center: Option<geo_types::Point>,
    pub zoomed_extent: Option<geo_types::Rect>,
    pub draw_tools_created: [usize; 3],
    pub draw_active: [bool; 3],
    pub assigned_draw_styles: [Option<StyleRecord>; 3],
    pub edit_tools_created: usize,
    pub edit_active: bool,
    pub selection: Option<(LayerId, bool)>,
    pub selection_active: bool,
    pub popup: Option<(LayerId, usize, String)>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn features_on(&self, layer: LayerId) -> &[Feature] {
        self.features.get(&layer).map_or(&[], Vec::as_slice)
    }
}

// Anchor of the affine approximation: the RD origin in Amersfoort.
const ANCHOR_LON: f64 = 5.387_638_888_888_89;
const ANCHOR_LAT: f64 = 52.156_160_555_555_55;
const ANCHOR_X: f64 = 155_000.0;
const ANCHOR_Y: f64 = 463_000.0;
const METERS_PER_DEGREE_LON: f64 = 68_000.0;
const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

fn transform(c: geo_types::Coord, from: Crs, to: Crs) -> geo_types::Coord {
    match (from, to) {
        (Crs::Wgs84, Crs::Rd) => geo_types::coord! {
            x: ANCHOR_X + (c.x - ANCHOR_LON) * METERS_PER_DEGREE_LON,
            y: ANCHOR_Y + (c.y - ANCHOR_LAT) * METERS_PER_DEGREE_LAT,
        },
        (Crs::Rd, Crs::Wgs84) => geo_types::coord! {
            x: ANCHOR_LON + (c.x - ANCHOR_X) / METERS_PER_DEGREE_LON,
            y: ANCHOR_LAT + (c.y - ANCHOR_Y) / METERS_PER_DEGREE_LAT,
        },
        _ => c,
    }
}

fn transform_line(line: &geo_types::LineString, from: Crs, to: Crs) -> geo_types::LineString {
    line.coords().map(|c| transform(*c, from, to)).collect()
}

impl MapEngine for FakeEngine {
    fn init(&mut self, init: &MapInit) {
        self.init = Some(init.clone());
    }

    fn add_wms(&mut self, layer: &WmsLayer) -> LayerId {
        self.add_layer(AddedLayer::Wms(layer.clone()))
    }

    fn add_wmts(&mut self, layer: &WmtsLayer) -> LayerId {
        self.add_layer(AddedLayer::Wmts(layer.clone()))
    }

    fn add_tms(&mut self, layer: &TmsLayer) -> LayerId {
        self.add_layer(AddedLayer::Tms(layer.clone()))
    }

    fn add_vector_layer(&mut self, name: &str) -> LayerId {
        self.add_layer(AddedLayer::Vector(name.to_owned()))
    }

    fn add_features(&mut self, layer: LayerId, features: &[Feature]) {
        self.features
            .entry(layer)
            .or_default()
            .extend_from_slice(features);
    }

    fn replace_feature(&mut self, layer: LayerId, index: usize, feature: &Feature) {
        self.features.entry(layer).or_default()[index] = feature.clone();
    }

    fn set_feature_style(&mut self, layer: LayerId, index: usize, style: &StyleRecord) {
        self.features.entry(layer).or_default()[index].style = std::sync::Arc::new(style.clone());
    }

    fn clear_features(&mut self, layer: LayerId) {
        self.features.entry(layer).or_default().clear();
    }

    fn zoom(&self) -> u8 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    fn set_center(&mut self, center: geo_types::Point) {
        self.center = Some(center);
    }

    fn zoom_to_extent(&mut self, extent: geo_types::Rect) {
        self.zoomed_extent = Some(extent);
    }

    fn create_draw_tool(&mut self, class: GeometryClass, _layer: LayerId) {
        self.draw_tools_created[class.index()] += 1;
    }

    fn activate_draw_tool(&mut self, class: GeometryClass, style: &StyleRecord) {
        self.draw_active[class.index()] = true;
        self.assigned_draw_styles[class.index()] = Some(style.clone());
    }

    fn deactivate_draw_tool(&mut self, class: GeometryClass) {
        self.draw_active[class.index()] = false;
    }

    fn create_edit_tool(&mut self, _layer: LayerId) {
        self.edit_tools_created += 1;
    }

    fn activate_edit_tool(&mut self) {
        self.edit_active = true;
    }

    fn deactivate_edit_tool(&mut self) {
        self.edit_active = false;
    }

    fn create_selection(&mut self, layer: LayerId, hover: bool) {
        self.selection = Some((layer, hover));
    }

    fn set_selection_active(&mut self, active: bool) {
        self.selection_active = active;
    }

    fn show_popup(&mut self, layer: LayerId, index: usize, content: &str) {
        self.popup = Some((layer, index, content.to_owned()));
    }

    fn hide_popup(&mut self) {
        self.popup = None;
    }

    fn reproject(&self, geometry: &Geometry, from: Crs, to: Crs) -> Result<Geometry, Error> {
        Ok(match geometry {
            Geometry::Point(point) => {
                Geometry::Point(transform(point.0, from, to).into())
            }
            Geometry::Line(line) => Geometry::Line(transform_line(line, from, to)),
            Geometry::Polygon(polygon) => Geometry::Polygon(geo_types::Polygon::new(
                transform_line(polygon.exterior(), from, to),
                polygon
                    .interiors()
                    .iter()
                    .map(|ring| transform_line(ring, from, to))
                    .collect(),
            )),
        })
    }
}

impl FakeEngine {
    fn add_layer(&mut self, layer: AddedLayer) -> LayerId {
        let id = LayerId(self.next_layer);
        self.next_layer += 1;
        self.layers.push((id, layer));
        id
    }
}

/// Host double with a programmable answer to confirmation dialogs.
pub struct FakeHost {
    pub confirm_response: bool,
    pub confirms: Vec<String>,
    pub notices: Vec<String>,
    pub fields: HashMap<String, String>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            confirm_response: true,
            confirms: Vec::new(),
            notices: Vec::new(),
            fields: HashMap::new(),
        }
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            confirm_response: false,
            ..Self::default()
        }
    }
}

impl Host for FakeHost {
    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_owned());
        self.confirm_response
    }

    fn notice(&mut self, message: &str) {
        self.notices.push(message.to_owned());
    }

    fn write_field(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_owned(), value.to_owned());
    }
}
