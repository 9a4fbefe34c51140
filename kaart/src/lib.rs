#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

mod api;
mod capture;
mod config;
mod engine;
mod error;
mod feature;
mod fetch;
mod ingest;
mod layers;
mod style;
mod tools;

#[cfg(test)]
mod testutil;

pub use api::Api;
pub use capture::{CapturedLocation, FieldTarget};
pub use config::{FeatureConfig, MapConfig, MAX_NUMBERED_FEATURES};
pub use engine::{Crs, EngineEvent, Host, LayerId, MapEngine, MapInit};
pub use error::Error;
pub use feature::{Feature, FeatureCollection, Geometry};
pub use fetch::{FetchRequest, FetchedPayload};
pub use ingest::{FormatKind, FormatReader, KmlReader, ParsedFeature, TextReader};
pub use layers::{LayerCatalog, LayerSource, TmsLayer, WmsLayer, WmtsLayer};
pub use style::{classify, GeometryClass, StyleCatalog, StyleDeclaration, StyleRecord};
pub use tools::{FeatureCallback, ToolState};
