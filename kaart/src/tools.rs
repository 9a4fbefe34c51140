//! Controller for the drawing and editing tools.
//!
//! The engine provides one drawing tool per geometry class and a single
//! editing tool; this controller constructs them lazily, reuses them, and
//! makes sure no two of them are ever active at the same time.

use crate::engine::{LayerId, MapEngine};
use crate::feature::Feature;
use crate::style::{classify, GeometryClass, StyleCatalog};
use crate::Error;

/// Callback invoked with a feature that was just drawn or modified.
pub type FeatureCallback = Box<dyn FnMut(&Feature)>;

/// What the user is currently doing with the tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolState {
    Idle,
    Drawing {
        class: GeometryClass,
        style_id: String,
    },
    Editing,
}

pub(crate) struct ToolController {
    state: ToolState,
    features_layer: LayerId,
    draw_constructed: [bool; 3],
    edit_constructed: bool,
    /// Invoked for every finished draw gesture.
    pub(crate) on_feature_added: Option<FeatureCallback>,
    /// Invoked for both the "about to modify" and "modified" notifications.
    pub(crate) on_modified: Option<FeatureCallback>,
}

impl ToolController {
    pub(crate) fn new(features_layer: LayerId) -> Self {
        Self {
            state: ToolState::Idle,
            features_layer,
            draw_constructed: [false; 3],
            edit_constructed: false,
            on_feature_added: None,
            on_modified: None,
        }
    }

    pub(crate) fn state(&self) -> &ToolState {
        &self.state
    }

    /// Activate the drawing tool for the geometry class implied by
    /// `style_id`, deactivating whatever tool was active before. The tool is
    /// constructed on first use and reused afterwards. New features render
    /// with the resolved style right away; line and polygon tools get the
    /// style without its icon graphic.
    pub(crate) fn enable_drawing_tool(
        &mut self,
        engine: &mut dyn MapEngine,
        styles: &StyleCatalog,
        style_id: &str,
        on_feature_added: Option<FeatureCallback>,
    ) -> Result<(), Error> {
        let class = classify(style_id)
            .ok_or_else(|| Error::Configuration(format!("unknown style id: {style_id}")))?;
        let style = styles
            .resolve(style_id)
            .ok_or_else(|| Error::Configuration(format!("unknown style id: {style_id}")))?;

        self.disable_drawing_tool(engine);
        self.disable_editing_tool(engine);

        if !self.draw_constructed[class.index()] {
            engine.create_draw_tool(class, self.features_layer);
            self.draw_constructed[class.index()] = true;
        }

        let assigned = match class {
            GeometryClass::Point => (*style).clone(),
            GeometryClass::Line | GeometryClass::Polygon => style.without_graphic(),
        };
        engine.activate_draw_tool(class, &assigned);

        self.on_feature_added = on_feature_added;
        self.state = ToolState::Drawing {
            class,
            style_id: style_id.to_owned(),
        };
        log::debug!("Drawing tool enabled for {class:?} with style {style_id}.");
        Ok(())
    }

    /// Deactivate all three drawing tools. Safe to call when none are active.
    pub(crate) fn disable_drawing_tool(&mut self, engine: &mut dyn MapEngine) {
        for class in [
            GeometryClass::Point,
            GeometryClass::Line,
            GeometryClass::Polygon,
        ] {
            if self.draw_constructed[class.index()] {
                engine.deactivate_draw_tool(class);
            }
        }
        if matches!(self.state, ToolState::Drawing { .. }) {
            self.state = ToolState::Idle;
            self.on_feature_added = None;
        }
    }

    /// Activate the editing tool on the features layer, deactivating any
    /// drawing tool first. `on_modified` is registered for both the "about
    /// to modify" and the "modified" notifications.
    pub(crate) fn enable_editing_tool(
        &mut self,
        engine: &mut dyn MapEngine,
        on_modified: Option<FeatureCallback>,
    ) {
        self.disable_drawing_tool(engine);

        if !self.edit_constructed {
            engine.create_edit_tool(self.features_layer);
            self.edit_constructed = true;
        }
        engine.activate_edit_tool();

        self.on_modified = on_modified;
        self.state = ToolState::Editing;
        log::debug!("Editing tool enabled.");
    }

    /// Deactivate the editing tool, if it was ever constructed.
    pub(crate) fn disable_editing_tool(&mut self, engine: &mut dyn MapEngine) {
        if self.edit_constructed {
            engine.deactivate_edit_tool();
        }
        if self.state == ToolState::Editing {
            self.state = ToolState::Idle;
            self.on_modified = None;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::testutil::FakeEngine;

    fn controller_and_engine() -> (ToolController, FakeEngine, StyleCatalog) {
        let mut engine = FakeEngine::new();
        let layer = engine.add_vector_layer("Features");
        (ToolController::new(layer), engine, StyleCatalog::builtin())
    }

    #[test]
    fn drawing_tools_are_constructed_once_and_reused() {
        let (mut tools, mut engine, styles) = controller_and_engine();

        tools
            .enable_drawing_tool(&mut engine, &styles, "mt0", None)
            .unwrap();
        tools.disable_drawing_tool(&mut engine);
        tools
            .enable_drawing_tool(&mut engine, &styles, "mt1", None)
            .unwrap();

        assert_eq!(1, engine.draw_tools_created[GeometryClass::Point.index()]);
        assert!(engine.draw_active[GeometryClass::Point.index()]);
    }

    #[test]
    fn at_most_one_tool_is_active() {
        let (mut tools, mut engine, styles) = controller_and_engine();

        tools
            .enable_drawing_tool(&mut engine, &styles, "mt0", None)
            .unwrap();
        tools.enable_editing_tool(&mut engine, None);

        assert!(!engine.draw_active.iter().any(|active| *active));
        assert!(engine.edit_active);
        assert_eq!(&ToolState::Editing, tools.state());

        // And the other way around.
        tools
            .enable_drawing_tool(&mut engine, &styles, "pt0", None)
            .unwrap();
        assert!(!engine.edit_active);
        assert!(engine.draw_active[GeometryClass::Polygon.index()]);
        assert!(!engine.draw_active[GeometryClass::Point.index()]);
    }

    #[test]
    fn disabling_without_active_tools_is_harmless() {
        let (mut tools, mut engine, _styles) = controller_and_engine();

        tools.disable_drawing_tool(&mut engine);
        tools.disable_editing_tool(&mut engine);
        assert_eq!(&ToolState::Idle, tools.state());
    }

    #[test]
    fn line_drawing_strips_the_icon_graphic() {
        let (mut tools, mut engine, styles) = controller_and_engine();

        // A line style that, unusually, declares a graphic.
        let styles_with_graphic = StyleCatalog::with_declarations(vec![
            crate::style::StyleDeclaration {
                id: "lt9".to_owned(),
                record: crate::style::StyleRecord {
                    stroke_color: Some("red".to_owned()),
                    external_graphic: Some("markertypes/star.png".to_owned()),
                    ..crate::style::StyleRecord::default()
                },
            },
        ]);
        tools
            .enable_drawing_tool(&mut engine, &styles_with_graphic, "lt9", None)
            .unwrap();

        let assigned = engine.assigned_draw_styles[GeometryClass::Line.index()]
            .clone()
            .unwrap();
        assert_eq!(None, assigned.external_graphic);
        assert_eq!(Some("red"), assigned.stroke_color.as_deref());

        // Point drawing keeps the icon.
        tools
            .enable_drawing_tool(&mut engine, &styles, "mt0", None)
            .unwrap();
        let assigned = engine.assigned_draw_styles[GeometryClass::Point.index()]
            .clone()
            .unwrap();
        assert!(assigned.external_graphic.is_some());
    }

    #[test]
    fn unknown_style_is_a_configuration_error() {
        let (mut tools, mut engine, styles) = controller_and_engine();
        let result = tools.enable_drawing_tool(&mut engine, &styles, "qt0", None);
        assert!(matches!(result, Err(Error::Configuration(_))));
        assert_eq!(&ToolState::Idle, tools.state());
    }
}
