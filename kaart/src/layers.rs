//! Layer configurations and the catalog of predefined layers.
//!
//! The engine's layer constructors expect fully populated configurations;
//! `normalize()` fills whatever a configuration leaves out with the sensible
//! per-kind defaults, so partial configs from embedding pages keep working.

use std::collections::HashMap;

/// WMS layer configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WmsLayer {
    pub name: String,
    pub url: String,
    /// Comma separated WMS layer names.
    pub layers: String,
    pub styles: Option<String>,
    pub format: Option<String>,
    pub transparent: Option<bool>,
    pub single_tile: Option<bool>,
    pub visibility: Option<bool>,
    pub base_layer: Option<bool>,
}

impl WmsLayer {
    pub fn normalize(mut self) -> Self {
        self.styles.get_or_insert_with(String::new);
        self.format.get_or_insert_with(|| "image/png".to_owned());
        self.transparent.get_or_insert(true);
        self.single_tile.get_or_insert(true);
        self.visibility.get_or_insert(true);
        self.base_layer.get_or_insert(false);
        self
    }
}

/// WMTS layer configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WmtsLayer {
    pub name: String,
    pub url: String,
    pub layer: String,
    pub matrix_set: String,
    pub style: Option<String>,
    /// Tile matrix identifiers. When absent, they are derived from the
    /// matrix set name, which is what the national tile services use.
    pub matrix_ids: Option<Vec<String>>,
    pub format: Option<String>,
    pub visibility: Option<bool>,
    pub base_layer: Option<bool>,
}

impl WmtsLayer {
    pub fn normalize(mut self) -> Self {
        if self.matrix_ids.is_none() {
            self.matrix_ids = Some(
                (0..26)
                    .map(|i| format!("{}:{}", self.matrix_set, i))
                    .collect(),
            );
        }
        self.style.get_or_insert_with(|| "default".to_owned());
        self.format.get_or_insert_with(|| "image/png8".to_owned());
        self.visibility.get_or_insert(true);
        self.base_layer.get_or_insert(false);
        self
    }
}

/// TMS layer configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TmsLayer {
    pub name: String,
    pub url: String,
    pub layername: String,
    /// Tile image file extension.
    pub file_type: Option<String>,
    pub visibility: Option<bool>,
    pub base_layer: Option<bool>,
}

impl TmsLayer {
    pub fn normalize(mut self) -> Self {
        self.file_type.get_or_insert_with(|| "png".to_owned());
        self.visibility.get_or_insert(true);
        self.base_layer.get_or_insert(false);
        self
    }
}

/// A layer of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    Wms(WmsLayer),
    Wmts(WmtsLayer),
    Tms(TmsLayer),
}

impl LayerSource {
    pub fn is_base_layer(&self) -> bool {
        match self {
            Self::Wms(layer) => layer.base_layer.unwrap_or(false),
            Self::Wmts(layer) => layer.base_layer.unwrap_or(false),
            Self::Tms(layer) => layer.base_layer.unwrap_or(false),
        }
    }
}

/// Predefined layers addressable by identifier, immutable once built.
#[derive(Debug, Clone)]
pub struct LayerCatalog {
    entries: HashMap<String, LayerSource>,
}

impl LayerCatalog {
    /// The built-in set of national geo registry services.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();

        entries.insert(
            "BRT".to_owned(),
            LayerSource::Wmts(WmtsLayer {
                name: "BRT background map (wmts)".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/wmts/".to_owned(),
                layer: "brtachtergrondkaart".to_owned(),
                matrix_set: "EPSG:28992".to_owned(),
                base_layer: Some(true),
                ..WmtsLayer::default()
            }),
        );
        entries.insert(
            "BRT_TMS".to_owned(),
            LayerSource::Tms(TmsLayer {
                name: "BRT background map (tms)".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/tms/".to_owned(),
                layername: "brtachtergrondkaart".to_owned(),
                file_type: Some("png8".to_owned()),
                base_layer: Some(true),
                ..TmsLayer::default()
            }),
        );
        entries.insert(
            "TOP10NL".to_owned(),
            LayerSource::Wmts(WmtsLayer {
                name: "Top10NL (wmts)".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/wmts/".to_owned(),
                layer: "top10nl".to_owned(),
                matrix_set: "EPSG:28992".to_owned(),
                base_layer: Some(true),
                ..WmtsLayer::default()
            }),
        );
        entries.insert(
            "TOP10NL_TMS".to_owned(),
            LayerSource::Tms(TmsLayer {
                name: "Top10NL (tms)".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/tms/".to_owned(),
                layername: "top10nl".to_owned(),
                file_type: Some("png8".to_owned()),
                base_layer: Some(true),
                ..TmsLayer::default()
            }),
        );
        entries.insert(
            "AAN".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "Agricultural area".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/aan/wms".to_owned(),
                layers: "aan".to_owned(),
                ..WmsLayer::default()
            }),
        );
        entries.insert(
            "AHN25M".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "Elevation model, 25m grid".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/ahn25m/wms".to_owned(),
                layers: "ahn25m".to_owned(),
                ..WmsLayer::default()
            }),
        );
        entries.insert(
            "BBG2008".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "Land use 2008".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/bestandbodemgebruik2008/wms"
                    .to_owned(),
                layers: "bbg2008".to_owned(),
                ..WmsLayer::default()
            }),
        );
        entries.insert(
            "PROTECTED_NATURE".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "Protected nature monuments".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/beschermdenatuurmonumenten/wms"
                    .to_owned(),
                layers: "beschermdenatuurmonumenten".to_owned(),
                ..WmsLayer::default()
            }),
        );
        entries.insert(
            "NOK2011".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "Ecological network 2011".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/nok2011/wms".to_owned(),
                layers: "begrenzing,planologischeehs,verwervinginrichting".to_owned(),
                ..WmsLayer::default()
            }),
        );
        entries.insert(
            "ADDRESSES".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "Inspire addresses".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/inspireadressen/wms".to_owned(),
                layers: "inspireadressen".to_owned(),
                ..WmsLayer::default()
            }),
        );
        entries.insert(
            "MUNICIPALITIES".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "Municipal boundaries".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/bestuurlijkegrenzen/wms".to_owned(),
                layers: "gemeenten_2012".to_owned(),
                ..WmsLayer::default()
            }),
        );
        entries.insert(
            "NATURA2000".to_owned(),
            LayerSource::Tms(TmsLayer {
                name: "Natura2000 areas".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/tms/".to_owned(),
                layername: "natura2000".to_owned(),
                ..TmsLayer::default()
            }),
        );
        entries.insert(
            "NATIONAL_PARKS".to_owned(),
            LayerSource::Wms(WmsLayer {
                name: "National parks".to_owned(),
                url: "https://geodata.nationaalgeoregister.nl/nationaleparken/wms".to_owned(),
                layers: "nationaleparken".to_owned(),
                ..WmsLayer::default()
            }),
        );

        Self { entries }
    }

    pub fn with_entries(entries: HashMap<String, LayerSource>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&LayerSource> {
        self.entries.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
