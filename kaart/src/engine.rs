//! Interface to the external map engine and the embedding host page.
//!
//! This crate orchestrates an engine that does the actual rendering,
//! projection math and input handling. Everything the engine must provide is
//! collected in [`MapEngine`]; everything the host page must provide
//! (blocking dialogs, form fields) in [`Host`]. The host runtime feeds user
//! interaction back in as [`EngineEvent`]s.

use crate::feature::{Feature, Geometry};
use crate::layers::{TmsLayer, WmsLayer, WmtsLayer};
use crate::style::{GeometryClass, StyleRecord};
use crate::Error;

/// Named coordinate reference systems this SDK speaks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    /// Geographic coordinates, EPSG:4326.
    Wgs84,
    /// The Dutch national projected grid (RD New), EPSG:28992. This is the
    /// map's working coordinate system.
    Rd,
}

impl Crs {
    pub fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Rd => 28992,
        }
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Parameters for the engine's map construction.
#[derive(Debug, Clone)]
pub struct MapInit {
    pub projection: Crs,
    pub units: &'static str,
    /// Resolutions per zoom level, map units per pixel. The zoom level range
    /// is `0..resolutions.len()`.
    pub resolutions: Vec<f64>,
    pub max_extent: geo_types::Rect,
    /// Id of the DOM element the map renders into.
    pub div: String,
}

impl MapInit {
    /// The RD grid setup: 14 zoom levels over the extent of the Netherlands.
    pub fn rd(div: impl Into<String>) -> Self {
        Self {
            projection: Crs::Rd,
            units: "m",
            resolutions: vec![
                3440.64, 1720.32, 860.16, 430.08, 215.04, 107.52, 53.76, 26.88, 13.44, 6.72,
                3.36, 1.68, 0.84, 0.42,
            ],
            max_extent: geo_types::Rect::new(
                geo_types::coord! { x: -285401.92, y: 22598.08 },
                geo_types::coord! { x: 595401.92, y: 903401.92 },
            ),
            div: div.into(),
        }
    }

    pub fn max_zoom(&self) -> u8 {
        self.resolutions.len().saturating_sub(1) as u8
    }
}

/// Handle to a layer constructed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// User interaction, delivered by the host runtime to
/// [`Api::handle_event`](crate::Api::handle_event).
///
/// All indices refer to positions in the features layer, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The viewport settled after a pan or zoom.
    MoveEnd,
    /// A draw gesture finished; the geometry is in the map's working
    /// coordinate system.
    FeatureDrawn(Geometry),
    /// The editing tool is about to modify a feature.
    BeforeFeatureModified { index: usize },
    /// The editing tool finished modifying a feature.
    FeatureModified { index: usize, geometry: Geometry },
    FeatureSelected { index: usize },
    FeatureUnselected { index: usize },
}

/// The rendering/tiling engine this SDK drives.
///
/// Layer configurations passed to the `add_*` methods are already normalized
/// (`normalize()` ran); the engine never needs to apply defaults itself.
pub trait MapEngine {
    fn init(&mut self, init: &MapInit);

    fn add_wms(&mut self, layer: &WmsLayer) -> LayerId;
    fn add_wmts(&mut self, layer: &WmtsLayer) -> LayerId;
    fn add_tms(&mut self, layer: &TmsLayer) -> LayerId;
    fn add_vector_layer(&mut self, name: &str) -> LayerId;

    fn add_features(&mut self, layer: LayerId, features: &[Feature]);
    fn replace_feature(&mut self, layer: LayerId, index: usize, feature: &Feature);
    fn set_feature_style(&mut self, layer: LayerId, index: usize, style: &StyleRecord);
    fn clear_features(&mut self, layer: LayerId);

    fn zoom(&self) -> u8;
    fn set_zoom(&mut self, zoom: u8);
    fn set_center(&mut self, center: geo_types::Point);
    fn zoom_to_extent(&mut self, extent: geo_types::Rect);

    /// Construct the drawing tool for `class` on `layer`. Called at most once
    /// per class; the tool is reused afterwards.
    fn create_draw_tool(&mut self, class: GeometryClass, layer: LayerId);
    fn activate_draw_tool(&mut self, class: GeometryClass, style: &StyleRecord);
    fn deactivate_draw_tool(&mut self, class: GeometryClass);

    /// Construct the single editing tool bound to `layer`. Called at most
    /// once.
    fn create_edit_tool(&mut self, layer: LayerId);
    fn activate_edit_tool(&mut self);
    fn deactivate_edit_tool(&mut self);

    /// Construct the selection control wrapping `layer`. `hover` selects on
    /// hover instead of click.
    fn create_selection(&mut self, layer: LayerId, hover: bool);
    fn set_selection_active(&mut self, active: bool);

    fn show_popup(&mut self, layer: LayerId, index: usize, content: &str);
    fn hide_popup(&mut self);

    /// Transform a geometry between two named reference systems. The engine
    /// owns the projection math.
    fn reproject(&self, geometry: &Geometry, from: Crs, to: Crs) -> Result<Geometry, Error>;
}

/// The embedding page around the map.
pub trait Host {
    /// Blocking confirmation dialog. Returns whether the user accepted.
    fn confirm(&mut self, message: &str) -> bool;

    /// Blocking notice dialog.
    fn notice(&mut self, message: &str);

    /// Write `value` into the form field named `name`. Fields that do not
    /// exist on the page are ignored.
    fn write_field(&mut self, name: &str, value: &str);
}
