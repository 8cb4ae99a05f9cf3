//! Evaluation of draw rules against a zoom level and a feature.

use std::collections::HashMap;

use log::{debug, error};
use serde_json::Value;

use crate::{
    coords::ZoomLevel,
    error::StylingError,
    geometry::Feature,
    scene::Scene,
    style::{
        draw_rule::{DrawRule, EvaluatedRule},
        expression::{EvaluationContext, Expression},
        param::{StyleParamKey, StyleParamValue},
    },
};

/// Index of a function in the scene's function sequence.
pub type FunctionId = usize;

/// Capability to evaluate dynamic style functions.
///
/// Functions are registered in the order of the scene's function sequence, so the n-th
/// registered function answers to [`FunctionId`] `n`.
pub trait StyleFunctions {
    fn add_function(&mut self, source: &str) -> Result<(), StylingError>;

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evaluate(&self, id: FunctionId, context: &EvaluationContext) -> Option<Value>;
}

/// [`StyleFunctions`] backed by the built-in [`Expression`] language.
#[derive(Default)]
pub struct ExpressionFunctions {
    functions: Vec<Option<Expression>>,
}

impl StyleFunctions for ExpressionFunctions {
    fn add_function(&mut self, source: &str) -> Result<(), StylingError> {
        match Expression::parse_str(source) {
            Ok(expression) => {
                self.functions.push(Some(expression));
                Ok(())
            }
            Err(e) => {
                // Keep the slot so later ids stay aligned with the scene.
                self.functions.push(None);
                Err(StylingError::Expression {
                    source_text: source.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    fn clear(&mut self) {
        self.functions.clear();
    }

    fn len(&self) -> usize {
        self.functions.len()
    }

    fn evaluate(&self, id: FunctionId, context: &EvaluationContext) -> Option<Value> {
        self.functions.get(id)?.as_ref()?.evaluate(context)
    }
}

/// Holds the evaluation state: the keyword zoom and the compiled functions of one scene.
pub struct StyleContext {
    functions: Box<dyn StyleFunctions>,
    zoom: f32,
}

impl Default for StyleContext {
    fn default() -> Self {
        Self::with_functions(Box::<ExpressionFunctions>::default())
    }
}

impl StyleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_functions(functions: Box<dyn StyleFunctions>) -> Self {
        Self {
            functions,
            zoom: 0.0,
        }
    }

    /// Drops all compiled functions and compiles the function sequence of `scene`.
    pub fn init_functions(&mut self, scene: &Scene) {
        self.functions.clear();
        for source in scene.functions() {
            if let Err(e) = self.functions.add_function(source) {
                error!("{}", e);
            }
        }
    }

    pub fn add_function(&mut self, source: &str) -> Result<(), StylingError> {
        self.functions.add_function(source)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn set_keyword_zoom(&mut self, zoom: ZoomLevel) {
        self.zoom = zoom.as_f32();
    }

    /// Resolves every parameter of `rule` for `feature` at the current zoom.
    ///
    /// Returns `None` if the rule does not apply: its filter evaluates to false or fails, or
    /// it is not visible.
    pub fn evaluate_rule(&self, rule: &DrawRule, feature: &Feature) -> Option<EvaluatedRule> {
        let context = EvaluationContext {
            zoom: self.zoom,
            properties: &feature.properties,
        };

        let mut params = HashMap::with_capacity(rule.params().len());
        for param in rule.params() {
            let value = match &param.value {
                StyleParamValue::Function(id) => {
                    let result = self
                        .functions
                        .evaluate(*id, &context)
                        .and_then(|value| StyleParamValue::parse(param.key, &value));
                    match result {
                        Some(value) => value,
                        None if param.key == StyleParamKey::Filter => return None,
                        None => {
                            debug!("function {} for {} produced no usable value", id, param.key);
                            continue;
                        }
                    }
                }
                StyleParamValue::Stops(stops) => stops.evaluate(self.zoom),
                value => value.clone(),
            };
            params.insert(param.key, value);
        }

        let evaluated = EvaluatedRule::new(params);
        if !evaluated.bool(StyleParamKey::Filter).unwrap_or(true)
            || !evaluated.bool(StyleParamKey::Visible).unwrap_or(true)
        {
            return None;
        }
        Some(evaluated)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        coords::ZoomLevel,
        geometry::Feature,
        scene::Scene,
        style::{
            context::{ExpressionFunctions, StyleContext, StyleFunctions},
            draw_rule::DrawRule,
            param::{StyleParam, StyleParamKey, StyleParamValue},
            stops::Stops,
        },
    };

    fn rule(scene: &Scene, params: Vec<StyleParam>) -> DrawRule {
        DrawRule::new("test", scene.id(), params)
    }

    #[test]
    fn test_failed_compile_keeps_slot() {
        let mut functions = ExpressionFunctions::default();
        assert!(functions.add_function("[\"nope\"]").is_err());
        assert!(functions.add_function("[\"zoom\"]").is_ok());
        assert_eq!(functions.len(), 2);
    }

    #[test]
    fn test_function_filter_excludes_zoom() {
        let mut scene = Scene::default();
        let id = scene.add_function(json!([">=", ["zoom"], 10]).to_string());
        let mut context = StyleContext::new();
        context.init_functions(&scene);

        let rule = rule(
            &scene,
            vec![StyleParam::new(
                StyleParamKey::Filter,
                StyleParamValue::Function(id),
            )],
        );

        context.set_keyword_zoom(ZoomLevel::new(5));
        assert!(context.evaluate_rule(&rule, &Feature::point()).is_none());
        context.set_keyword_zoom(ZoomLevel::new(12));
        assert!(context.evaluate_rule(&rule, &Feature::point()).is_some());
    }

    #[test]
    fn test_stops_resolve_at_zoom() {
        let scene = Scene::default();
        let mut context = StyleContext::new();
        context.init_functions(&scene);
        let stops = Stops::parse(StyleParamKey::Width, &json!({"stops": [[0, 0], [10, 10]]}))
            .unwrap();
        let rule = rule(
            &scene,
            vec![StyleParam::new(
                StyleParamKey::Width,
                StyleParamValue::Stops(stops),
            )],
        );

        context.set_keyword_zoom(ZoomLevel::new(4));
        let evaluated = context.evaluate_rule(&rule, &Feature::point()).unwrap();
        assert_eq!(evaluated.number(StyleParamKey::Width), Some(4.0));
    }

    #[test]
    fn test_invisible_rule_is_not_applicable() {
        let scene = Scene::default();
        let context = StyleContext::new();
        let rule = rule(
            &scene,
            vec![StyleParam::new(
                StyleParamKey::Visible,
                StyleParamValue::Bool(false),
            )],
        );
        assert!(context.evaluate_rule(&rule, &Feature::point()).is_none());
    }

    #[test]
    fn test_function_with_wrong_type_is_dropped() {
        let mut scene = Scene::default();
        let id = scene.add_function(json!(["get", "name"]).to_string());
        let mut context = StyleContext::new();
        context.init_functions(&scene);

        let rule = rule(
            &scene,
            vec![StyleParam::new(
                StyleParamKey::Width,
                StyleParamValue::Function(id),
            )],
        );
        let evaluated = context.evaluate_rule(&rule, &Feature::point()).unwrap();
        assert_eq!(evaluated.number(StyleParamKey::Width), None);
    }
}
