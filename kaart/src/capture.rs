//! The location tool: let the user draw one geometry and write its
//! coordinates into form fields on the embedding page.
//!
//! Once something is on the map the tool switches from drawing to editing,
//! so the user refines the same geometry instead of stacking new ones. Every
//! refinement writes the fields again.

use crate::api::Api;
use crate::engine::{Host, MapEngine};
use crate::feature::Feature;
use crate::Error;

/// Where captured coordinates are written on the host page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// Two fields taking the coordinates of a point. Non-point geometries
    /// leave these untouched.
    Xy { x: String, y: String },
    /// One field taking the geometry as a WKT literal.
    Wkt(String),
}

/// Coordinates most recently captured by the location tool, mirroring what
/// was written to the host page.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedLocation {
    Xy { x: f64, y: f64 },
    Wkt(String),
}

/// State of a running location capture.
pub(crate) struct ToolSession {
    pub(crate) style_id: String,
    pub(crate) zoom_min: u8,
    pub(crate) zoom_max: u8,
    pub(crate) target: FieldTarget,
    /// Whether the zoom range dialog was already shown for the current
    /// excursion outside the range.
    pub(crate) alerted: bool,
    /// Last coordinates written, kept for callers that poll instead of
    /// reading the form fields back.
    pub(crate) captured: Option<CapturedLocation>,
}

impl<E: MapEngine, H: Host> Api<E, H> {
    /// Start capturing a location into `target`. Drawing is only allowed
    /// between `zoom_min` and `zoom_max`, inclusive; outside that range the
    /// user is offered a jump to the nearest allowed level.
    ///
    /// The features layer must be empty, otherwise there is no way to tell
    /// which geometry is the captured one.
    pub fn enable_location_tool(
        &mut self,
        style_id: &str,
        zoom_min: u8,
        zoom_max: u8,
        target: FieldTarget,
    ) -> Result<(), Error> {
        if !self.features.is_empty() {
            self.host
                .notice("The location tool needs an empty map; remove the existing features first.");
            return Err(Error::FeaturesPresent);
        }
        if self.styles.resolve(style_id).is_none() {
            return Err(Error::Configuration(format!("unknown style id: {style_id}")));
        }

        // Selection and popups both interfere with the drawing and editing
        // tools; unlike plain popup toggling, the capture turns off both.
        self.disable_popups();
        self.engine.set_selection_active(false);

        self.session = Some(ToolSession {
            style_id: style_id.to_owned(),
            zoom_min,
            zoom_max,
            target,
            alerted: false,
            captured: None,
        });
        self.location_tool_step();
        Ok(())
    }

    /// Stop the capture and restore popups if the page asked for them.
    pub fn disable_location_tool(&mut self) {
        self.session = None;
        self.disable_drawing_tool();
        self.disable_editing_tool();
        if self.show_popup {
            self.enable_popups();
        }
    }

    /// Reconsider which tool should be active. Runs when the capture starts,
    /// after every viewport move and after every captured geometry.
    pub(crate) fn location_tool_step(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let style_id = session.style_id.clone();
        let (zoom_min, zoom_max) = (session.zoom_min, session.zoom_max);

        if !self.features.is_empty() {
            // Something is captured already; switch to refining it.
            self.tools.enable_editing_tool(&mut self.engine, None);
            return;
        }

        let zoom = self.engine.zoom();
        if zoom >= zoom_min && zoom <= zoom_max {
            if let Some(session) = self.session.as_mut() {
                session.alerted = false;
            }
            if let Err(e) =
                self.tools
                    .enable_drawing_tool(&mut self.engine, &self.styles, &style_id, None)
            {
                log::warn!("Location tool could not enable drawing: {e}");
            }
        } else {
            let boundary = if zoom < zoom_min { zoom_min } else { zoom_max };
            let already_alerted = self.session.as_ref().is_some_and(|s| s.alerted);
            if !already_alerted {
                if let Some(session) = self.session.as_mut() {
                    session.alerted = true;
                }
                let message = format!(
                    "Drawing is only possible between zoom levels {zoom_min} and {zoom_max}; \
                     the map is at level {zoom} now. \
                     Click OK to jump to level {boundary}, or Cancel to zoom yourself."
                );
                if self.host.confirm(&message) {
                    self.engine.set_zoom(boundary);
                }
            }
            self.tools.disable_drawing_tool(&mut self.engine);
        }
    }

    /// Coordinates of the running capture, if it has produced any yet.
    pub fn captured_location(&self) -> Option<&CapturedLocation> {
        self.session.as_ref().and_then(|s| s.captured.as_ref())
    }

    /// Write the captured geometry to the host page and re-evaluate the
    /// tools, which switches the capture into editing mode.
    pub(crate) fn finish_location_capture(&mut self, feature: &Feature) {
        let Some(session) = &self.session else {
            return;
        };
        let captured = match session.target.clone() {
            FieldTarget::Xy { x, y } => {
                if let Some(point) = feature.geometry.as_point() {
                    self.host.write_field(&x, &point.x().to_string());
                    self.host.write_field(&y, &point.y().to_string());
                    Some(CapturedLocation::Xy {
                        x: point.x(),
                        y: point.y(),
                    })
                } else {
                    log::warn!("Captured a non-point geometry; x/y fields are left untouched.");
                    None
                }
            }
            FieldTarget::Wkt(field) => {
                let wkt = feature.geometry.to_wkt();
                self.host.write_field(&field, &wkt);
                Some(CapturedLocation::Wkt(wkt))
            }
        };
        if let Some(captured) = captured {
            if let Some(session) = self.session.as_mut() {
                session.captured = Some(captured);
            }
        }
        self.location_tool_step();
    }
}
