//! The embeddable map API.
//!
//! [`Api`] owns the engine, the host bindings, the style and layer catalogs
//! and the features on the map. It is constructed from a [`MapConfig`] and
//! driven by [`EngineEvent`]s afterwards.

use crate::capture::ToolSession;
use crate::config::MapConfig;
use crate::engine::{Crs, EngineEvent, Host, LayerId, MapEngine, MapInit};
use crate::feature::{Feature, FeatureCollection, Geometry};
use crate::fetch::PayloadFetcher;
use crate::ingest::{ingest_features, FormatKind};
use crate::layers::{LayerCatalog, LayerSource, TmsLayer, WmsLayer, WmtsLayer};
use crate::style::StyleCatalog;
use crate::tools::{FeatureCallback, ToolController, ToolState};
use crate::Error;

/// Initial extent when neither `bbox` nor `loc`/`zoom` is configured; roughly
/// the land area of the Netherlands.
const DEFAULT_EXTENT: (f64, f64, f64, f64) = (-15000., 300000., 300000., 640000.);

pub struct Api<E, H> {
    pub(crate) engine: E,
    pub(crate) host: H,
    pub(crate) styles: StyleCatalog,
    catalog: LayerCatalog,
    pub(crate) features: FeatureCollection,
    pub(crate) features_layer: LayerId,
    pub(crate) tools: ToolController,
    pub(crate) session: Option<ToolSession>,
    fetcher: Option<PayloadFetcher>,
    /// Whether the page asked for popups at all.
    pub(crate) show_popup: bool,
    /// Whether popups are currently showing; the location tool suspends them.
    popups_enabled: bool,
}

impl<E: MapEngine, H: Host> Api<E, H> {
    /// Build the whole map from a declarative configuration.
    pub fn new(mut engine: E, mut host: H, config: MapConfig) -> Result<Self, Error> {
        let styles = match &config.styles {
            Some(json) => StyleCatalog::from_json(json)?,
            None => StyleCatalog::builtin(),
        };
        let catalog = LayerCatalog::builtin();

        engine.init(&MapInit::rd(config.div.as_deref().unwrap_or("map")));

        // Predefined layers. Unknown identifiers are skipped with a notice;
        // one bad layer id should not take the whole map down.
        let requested = if config.layers.is_empty() {
            vec!["BRT".to_owned()]
        } else {
            config.layers.clone()
        };
        let mut sources = Vec::new();
        for id in &requested {
            match catalog.get(id) {
                Some(source) => sources.push(source.clone()),
                None => host.notice(&format!("Unknown layer id: {id}")),
            }
        }
        // A map without a base layer renders nothing; fall back to the
        // default background map.
        if !sources.iter().any(LayerSource::is_base_layer) {
            if let Some(source) = catalog.get("BRT") {
                sources.insert(0, source.clone());
            }
        }
        for source in &sources {
            add_layer_source(&mut engine, source);
        }

        // Ad hoc service layers.
        if let (Some(url), Some(layers)) = (&config.wmsurl, &config.wmslayers) {
            engine.add_wms(&ad_hoc_wms(url, layers));
        }
        if let (Some(url), Some(layer), Some(matrix_set)) =
            (&config.wmtsurl, &config.wmtslayer, &config.wmtsmatrixset)
        {
            engine.add_wmts(&ad_hoc_wmts(url, layer, matrix_set));
        }
        if let (Some(url), Some(layer)) = (&config.tmsurl, &config.tmslayer) {
            engine.add_tms(&ad_hoc_tms(url, layer, config.tmstype.as_deref()));
        }

        // Viewport: an explicit extent wins over center and zoom.
        if let Some(bbox) = config.bbox {
            engine.zoom_to_extent(bbox);
        } else if let (Some(loc), Some(zoom)) = (config.loc, config.zoom) {
            engine.set_center(loc);
            engine.set_zoom(zoom);
        } else {
            let (min_x, min_y, max_x, max_y) = DEFAULT_EXTENT;
            engine.zoom_to_extent(geo_types::Rect::new(
                geo_types::coord! { x: min_x, y: min_y },
                geo_types::coord! { x: max_x, y: max_y },
            ));
        }

        let features_layer = engine.add_vector_layer("Features");
        engine.create_selection(features_layer, config.hover_popup);
        if config.show_popup {
            engine.set_selection_active(true);
        }

        let mut features = FeatureCollection::default();

        // The marker shorthand, always a point.
        if let Some(mloc) = config.mloc {
            let style_id = config.mt.as_deref().unwrap_or("mt0");
            features.push(Feature::new(
                Geometry::Point(mloc),
                style_id,
                config.title.clone(),
                config.text.clone(),
                &styles,
            )?);
        }

        // Numbered features.
        for declared in &config.features {
            let geometry = Geometry::from_wkt(&declared.wkt)?;
            let style_id = declared
                .styletype
                .clone()
                .unwrap_or_else(|| geometry.class().default_style_id().to_owned());
            features.push(Feature::new(
                geometry,
                &style_id,
                declared.name.clone(),
                declared.description.clone(),
                &styles,
            )?);
        }
        engine.add_features(features_layer, features.as_slice());

        let mut fetcher = None;
        if let Some(url) = &config.txturl {
            fetcher
                .get_or_insert_with(PayloadFetcher::new)
                .request(url, FormatKind::Text);
        }
        if let Some(url) = &config.kmlurl {
            fetcher
                .get_or_insert_with(PayloadFetcher::new)
                .request(url, FormatKind::Kml);
        }

        Ok(Self {
            engine,
            host,
            styles,
            catalog,
            features,
            features_layer,
            tools: ToolController::new(features_layer),
            session: None,
            fetcher,
            show_popup: config.show_popup,
            popups_enabled: config.show_popup,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The underlying engine, for whatever this crate has no operation for.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn features(&self) -> &FeatureCollection {
        &self.features
    }

    pub fn styles(&self) -> &StyleCatalog {
        &self.styles
    }

    pub fn tool_state(&self) -> &ToolState {
        self.tools.state()
    }

    /// Add a predefined layer after construction.
    pub fn add_predefined_layer(&mut self, id: &str) -> Result<LayerId, Error> {
        let source = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::UnknownLayer(id.to_owned()))?
            .clone();
        Ok(add_layer_source(&mut self.engine, &source))
    }

    pub fn add_wms(&mut self, url: &str, layers: &str) -> LayerId {
        self.engine.add_wms(&ad_hoc_wms(url, layers))
    }

    pub fn add_wmts(&mut self, url: &str, layer: &str, matrix_set: &str) -> LayerId {
        self.engine.add_wmts(&ad_hoc_wmts(url, layer, matrix_set))
    }

    pub fn add_tms(&mut self, url: &str, layer: &str, file_type: Option<&str>) -> LayerId {
        self.engine.add_tms(&ad_hoc_tms(url, layer, file_type))
    }

    /// Put a collection of WKT geometries on the map in one go, on a fresh
    /// vector layer with class-default styles. The features layer and its
    /// tools are not involved. One malformed literal fails the whole batch;
    /// nothing is added then.
    pub fn add_geometries<S: AsRef<str>>(&mut self, wkts: &[S]) -> Result<LayerId, Error> {
        let mut features = Vec::with_capacity(wkts.len());
        for wkt in wkts {
            let geometry = Geometry::from_wkt(wkt.as_ref())?;
            let style_id = geometry.class().default_style_id();
            features.push(Feature::new(geometry, style_id, None, None, &self.styles)?);
        }
        let layer = self.engine.add_vector_layer("Geometries");
        self.engine.add_features(layer, &features);
        Ok(layer)
    }

    /// Create a feature from a WKT literal and put it on the map.
    pub fn add_feature(
        &mut self,
        wkt: &str,
        style_id: &str,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), Error> {
        let feature = Feature::from_wkt(wkt, style_id, name, description, &self.styles)?;
        self.engine.add_features(self.features_layer, &[feature.clone()]);
        self.features.push(feature);
        Ok(())
    }

    /// Parse a payload and put its features on the map. Returns how many
    /// features were added.
    pub fn add_features_from_text(
        &mut self,
        payload: &str,
        kind: FormatKind,
    ) -> Result<usize, Error> {
        let features = ingest_features(payload, kind, Crs::Rd, &self.styles, &self.engine)?;
        self.engine.add_features(self.features_layer, &features);
        let count = features.len();
        for feature in features {
            self.features.push(feature);
        }
        Ok(count)
    }

    /// Download a payload in the background; it is ingested by a later
    /// [`Api::poll_fetched`] call.
    pub fn add_features_from_url(&mut self, url: &str, kind: FormatKind) {
        self.fetcher
            .get_or_insert_with(PayloadFetcher::new)
            .request(url, kind);
    }

    /// Drain finished downloads and ingest them. Call this regularly, e.g.
    /// once per frame; it never blocks.
    pub fn poll_fetched(&mut self) {
        let mut payloads = Vec::new();
        if let Some(fetcher) = self.fetcher.as_mut() {
            while let Some(payload) = fetcher.poll() {
                payloads.push(payload);
            }
        }
        for payload in payloads {
            match payload.body {
                Ok(body) => {
                    if let Err(e) = self.add_features_from_text(&body, payload.kind) {
                        self.host
                            .notice(&format!("Could not ingest {}: {e}", payload.url));
                    }
                }
                Err(e) => self
                    .host
                    .notice(&format!("Could not download {}: {e}", payload.url)),
            }
        }
    }

    pub fn clear_features(&mut self) {
        self.features.clear();
        self.engine.clear_features(self.features_layer);
    }

    pub fn set_location(&mut self, center: geo_types::Point) {
        self.engine.set_center(center);
    }

    pub fn set_zoom_level(&mut self, zoom: u8) {
        self.engine.set_zoom(zoom);
    }

    pub fn enable_drawing_tool(
        &mut self,
        style_id: &str,
        on_feature_added: Option<FeatureCallback>,
    ) -> Result<(), Error> {
        self.tools
            .enable_drawing_tool(&mut self.engine, &self.styles, style_id, on_feature_added)
    }

    pub fn disable_drawing_tool(&mut self) {
        self.tools.disable_drawing_tool(&mut self.engine);
    }

    pub fn enable_editing_tool(&mut self, on_modified: Option<FeatureCallback>) {
        self.tools.enable_editing_tool(&mut self.engine, on_modified);
    }

    pub fn disable_editing_tool(&mut self) {
        self.tools.disable_editing_tool(&mut self.engine);
    }

    pub fn enable_popups(&mut self) {
        self.popups_enabled = true;
        self.engine.set_selection_active(true);
    }

    /// Stop driving popups from selection events. Selection itself stays
    /// active, so emphasis on select keeps working.
    pub fn disable_popups(&mut self) {
        self.popups_enabled = false;
        self.engine.hide_popup();
    }

    /// Feed one engine event through the state machines.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::MoveEnd => {
                if self.session.is_some() {
                    self.location_tool_step();
                }
            }
            EngineEvent::FeatureDrawn(geometry) => self.feature_drawn(geometry),
            EngineEvent::BeforeFeatureModified { index } => {
                if let Some(feature) = self.features.get(index).cloned() {
                    self.feature_touched(&feature);
                }
            }
            EngineEvent::FeatureModified { index, geometry } => {
                let Some(feature) = self.features.get_mut(index) else {
                    log::warn!("Modified feature {index} is not on the features layer.");
                    return;
                };
                feature.geometry = geometry;
                let feature = feature.clone();
                self.engine
                    .replace_feature(self.features_layer, index, &feature);
                self.feature_touched(&feature);
            }
            EngineEvent::FeatureSelected { index } => {
                let Some(feature) = self.features.get(index) else {
                    return;
                };
                self.engine
                    .set_feature_style(self.features_layer, index, &feature.style.emphasized());
                if self.popups_enabled {
                    let content = popup_content(feature);
                    self.engine.show_popup(self.features_layer, index, &content);
                }
            }
            EngineEvent::FeatureUnselected { index } => {
                if let Some(feature) = self.features.get(index) {
                    self.engine
                        .set_feature_style(self.features_layer, index, &feature.style);
                }
                self.engine.hide_popup();
            }
        }
    }

    fn feature_drawn(&mut self, geometry: Geometry) {
        let ToolState::Drawing { style_id, .. } = self.tools.state() else {
            log::warn!("A feature was drawn but no drawing tool is active.");
            return;
        };
        let style_id = style_id.clone();

        let feature = match Feature::new(geometry, &style_id, None, None, &self.styles) {
            Ok(feature) => feature,
            Err(e) => {
                log::warn!("Dropping a drawn feature: {e}");
                return;
            }
        };
        self.features.push(feature.clone());
        self.engine.add_features(self.features_layer, &[feature.clone()]);

        if let Some(callback) = self.tools.on_feature_added.as_mut() {
            callback(&feature);
        }
        if self.session.is_some() {
            self.finish_location_capture(&feature);
        }
    }

    /// Common tail of the "about to modify" and "modified" notifications.
    fn feature_touched(&mut self, feature: &Feature) {
        if let Some(callback) = self.tools.on_modified.as_mut() {
            callback(feature);
        }
        if self.session.is_some() {
            self.finish_location_capture(feature);
        }
    }
}

fn add_layer_source(engine: &mut impl MapEngine, source: &LayerSource) -> LayerId {
    match source {
        LayerSource::Wms(layer) => engine.add_wms(&layer.clone().normalize()),
        LayerSource::Wmts(layer) => engine.add_wmts(&layer.clone().normalize()),
        LayerSource::Tms(layer) => engine.add_tms(&layer.clone().normalize()),
    }
}

fn ad_hoc_wms(url: &str, layers: &str) -> WmsLayer {
    WmsLayer {
        name: "WMS".to_owned(),
        url: url.to_owned(),
        layers: layers.to_owned(),
        ..WmsLayer::default()
    }
    .normalize()
}

fn ad_hoc_wmts(url: &str, layer: &str, matrix_set: &str) -> WmtsLayer {
    WmtsLayer {
        name: "WMTS".to_owned(),
        url: url.to_owned(),
        layer: layer.to_owned(),
        matrix_set: matrix_set.to_owned(),
        ..WmtsLayer::default()
    }
    .normalize()
}

fn ad_hoc_tms(url: &str, layer: &str, file_type: Option<&str>) -> TmsLayer {
    TmsLayer {
        name: "TMS".to_owned(),
        url: url.to_owned(),
        layername: layer.to_owned(),
        file_type: file_type.map(ToOwned::to_owned),
        ..TmsLayer::default()
    }
    .normalize()
}

fn popup_content(feature: &Feature) -> String {
    let mut content = String::new();
    if let Some(name) = &feature.name {
        content.push_str(name);
    }
    if let Some(description) = &feature.description {
        if !content.is_empty() {
            content.push_str("<br/>");
        }
        content.push_str(description);
    }
    if content.is_empty() {
        "-".to_owned()
    } else {
        content
    }
}
