use std::collections::HashMap;

use lyon::tessellation::{LineCap, LineJoin};

use crate::{
    scene::SceneId,
    style::param::{Rgba, StyleParam, StyleParamKey, StyleParamValue},
};

/// A named style reference plus the parameters of one styling document.
///
/// Function ids inside the parameters refer to the function sequence of the scene the rule
/// was compiled against.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRule {
    name: String,
    scene_id: SceneId,
    params: Vec<StyleParam>,
}

impl DrawRule {
    pub fn new(name: impl Into<String>, scene_id: SceneId, params: Vec<StyleParam>) -> Self {
        Self {
            name: name.into(),
            scene_id,
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The style a builder is looked up by: the `style` parameter, or the rule name.
    pub fn style_name(&self) -> &str {
        self.find(StyleParamKey::Style)
            .and_then(StyleParamValue::as_str)
            .unwrap_or(&self.name)
    }

    pub fn scene_id(&self) -> SceneId {
        self.scene_id
    }

    pub fn params(&self) -> &[StyleParam] {
        &self.params
    }

    pub fn find(&self, key: StyleParamKey) -> Option<&StyleParamValue> {
        self.params
            .iter()
            .find(|param| param.key == key)
            .map(|param| &param.value)
    }
}

/// Parameters of a [`DrawRule`] with every function and stop resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluatedRule {
    params: HashMap<StyleParamKey, StyleParamValue>,
}

impl EvaluatedRule {
    pub fn new(params: HashMap<StyleParamKey, StyleParamValue>) -> Self {
        Self { params }
    }

    pub fn get(&self, key: StyleParamKey) -> Option<&StyleParamValue> {
        self.params.get(&key)
    }

    pub fn number(&self, key: StyleParamKey) -> Option<f32> {
        self.get(key)?.as_number()
    }

    pub fn color(&self, key: StyleParamKey) -> Option<Rgba> {
        self.get(key)?.as_color()
    }

    pub fn bool(&self, key: StyleParamKey) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn cap(&self) -> Option<LineCap> {
        match self.get(StyleParamKey::Cap)? {
            StyleParamValue::Cap(cap) => Some(*cap),
            _ => None,
        }
    }

    pub fn join(&self) -> Option<LineJoin> {
        match self.get(StyleParamKey::Join)? {
            StyleParamValue::Join(join) => Some(*join),
            _ => None,
        }
    }

    pub fn order(&self) -> i32 {
        self.number(StyleParamKey::Order).unwrap_or(0.0) as i32
    }
}

#[cfg(test)]
mod tests {
    use crate::style::{
        draw_rule::DrawRule,
        param::{StyleParam, StyleParamKey, StyleParamValue},
    };

    #[test]
    fn test_style_name_prefers_style_param() {
        let rule = DrawRule::new(
            "marker",
            1,
            vec![StyleParam::new(
                StyleParamKey::Style,
                StyleParamValue::String("lines".to_string()),
            )],
        );
        assert_eq!(rule.style_name(), "lines");

        let rule = DrawRule::new("polygons", 1, vec![]);
        assert_eq!(rule.style_name(), "polygons");
    }
}
