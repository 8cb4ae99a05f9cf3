//! The scene a [`crate::marker::manager::MarkerManager`] styles markers against.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use log::warn;

use crate::{
    coords::{MapProjection, MercatorProjection},
    settings::{SceneConfig, TessellationSettings},
    style::{
        builder::{BaseStyle, Style, StyleId, StyleKind},
        context::FunctionId,
    },
};

pub type SceneId = u32;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Styles, style functions and the projection of one loaded scene.
///
/// Every scene gets a process-wide unique id. Draw rules remember the id of the scene they
/// were compiled against, because their function ids index into that scene's functions.
pub struct Scene {
    id: SceneId,
    projection: Arc<dyn MapProjection>,
    styles: Vec<Box<dyn Style>>,
    functions: Vec<String>,
    settings: TessellationSettings,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Arc::new(MercatorProjection), TessellationSettings::default())
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field(
                "styles",
                &self.styles.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("functions", &self.functions)
            .finish()
    }
}

impl Scene {
    /// Creates a scene with the base styles `polygons`, `lines` and `points`.
    pub fn new(projection: Arc<dyn MapProjection>, settings: TessellationSettings) -> Self {
        let mut scene = Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            projection,
            styles: Vec::new(),
            functions: Vec::new(),
            settings,
        };
        for kind in StyleKind::ALL {
            scene.add_base_style(kind.name(), kind);
        }
        scene
    }

    pub fn from_config(config: SceneConfig) -> Self {
        let mut scene = Self::new(Arc::new(MercatorProjection), config.tessellation);
        for style in config.styles {
            scene.add_base_style(style.name, style.base);
        }
        for function in config.functions {
            scene.add_function(function.to_string());
        }
        scene
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_config(serde_json::from_str(text)?))
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn projection(&self) -> &Arc<dyn MapProjection> {
        &self.projection
    }

    pub fn settings(&self) -> &TessellationSettings {
        &self.settings
    }

    pub fn styles(&self) -> &[Box<dyn Style>] {
        &self.styles
    }

    pub fn find_style(&self, name: &str) -> Option<&dyn Style> {
        self.styles
            .iter()
            .find(|style| style.name() == name)
            .map(|style| style.as_ref())
    }

    pub fn next_style_id(&self) -> StyleId {
        self.styles.len() as StyleId
    }

    /// Registers `style`. Returns `false` if a style with the same name exists.
    pub fn add_style(&mut self, style: Box<dyn Style>) -> bool {
        if self.find_style(style.name()).is_some() {
            warn!("Style {} is already defined", style.name());
            return false;
        }
        self.styles.push(style);
        true
    }

    pub fn add_base_style(&mut self, name: impl Into<String>, kind: StyleKind) -> bool {
        let style = BaseStyle::new(name, self.next_style_id(), kind, self.settings.clone());
        self.add_style(Box::new(style))
    }

    /// The style function sources, in registration order.
    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    /// Appends a function source and returns its id. A source which is already registered
    /// keeps its id.
    pub fn add_function(&mut self, source: String) -> FunctionId {
        if let Some(id) = self.functions.iter().position(|f| *f == source) {
            return id;
        }
        self.functions.push(source);
        self.functions.len() - 1
    }
}
