//! Compiles styling text into style parameters.
//!
//! Styling text is a JSON object, for example
//! `{"style": "lines", "color": "#ff0000", "width": ["interpolate", ["linear"], ["zoom"], 10, 1, 15, 4]}`.
//! Nested objects flatten into `parent:child` keys.

use log::warn;
use serde_json::{Map, Value};

use crate::{
    error::StylingError,
    scene::Scene,
    style::{
        expression::Expression,
        param::{StyleParam, StyleParamKey, StyleParamValue},
        stops::Stops,
    },
};

enum ParsedValue {
    Value(StyleParamValue),
    Function(String),
}

/// Parses `text` into style parameters. Function sources are appended to the scene's
/// function sequence only after the whole document was accepted.
///
/// Empty text yields no parameters.
pub fn parse_styling(text: &str, scene: &mut Scene) -> Result<Vec<StyleParam>, StylingError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: Value = serde_json::from_str(text)?;
    let Value::Object(object) = &document else {
        return Err(StylingError::NotAnObject);
    };

    let mut parsed = Vec::new();
    parse_object(object, "", &mut parsed)?;

    Ok(parsed
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                ParsedValue::Value(value) => value,
                ParsedValue::Function(source) => {
                    StyleParamValue::Function(scene.add_function(source))
                }
            };
            StyleParam::new(key, value)
        })
        .collect())
}

fn parse_object(
    object: &Map<String, Value>,
    prefix: &str,
    out: &mut Vec<(StyleParamKey, ParsedValue)>,
) -> Result<(), StylingError> {
    for (name, value) in object {
        let name = format!("{}{}", prefix, name);

        if value.is_object() && !Stops::is_stops(value) {
            if let Some(object) = value.as_object() {
                parse_object(object, &format!("{}:", name), out)?;
            }
            continue;
        }

        let Some(key) = StyleParamKey::from_name(&name) else {
            warn!("Unknown style parameter {}", name);
            continue;
        };

        if Expression::is_expression(value) {
            Expression::parse(value).map_err(|e| StylingError::Expression {
                source_text: value.to_string(),
                reason: e.to_string(),
            })?;
            out.push((key, ParsedValue::Function(value.to_string())));
        } else if Stops::is_stops(value) {
            match Stops::parse(key, value) {
                Some(stops) => out.push((key, ParsedValue::Value(StyleParamValue::Stops(stops)))),
                None => warn!("Invalid stops for style parameter {}", name),
            }
        } else {
            match StyleParamValue::parse(key, value) {
                Some(parsed) => out.push((key, ParsedValue::Value(parsed))),
                None => warn!("Invalid value {} for style parameter {}", value, name),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        error::StylingError,
        scene::Scene,
        style::{
            param::{StyleParamKey, StyleParamValue},
            parser::parse_styling,
        },
    };

    #[test]
    fn test_empty_styling() {
        let mut scene = Scene::default();
        assert!(parse_styling("", &mut scene).unwrap().is_empty());
        assert!(parse_styling("  \n", &mut scene).unwrap().is_empty());
    }

    #[test]
    fn test_nested_keys_flatten() {
        let mut scene = Scene::default();
        let params = parse_styling(
            r#"{"style": "polygons", "outline": {"width": "2px", "color": "red"}}"#,
            &mut scene,
        )
        .unwrap();

        let width = params
            .iter()
            .find(|p| p.key == StyleParamKey::OutlineWidth)
            .unwrap();
        assert_eq!(width.value, StyleParamValue::Number(2.0));
        assert!(params.iter().any(|p| p.key == StyleParamKey::OutlineColor));
    }

    #[test]
    fn test_functions_are_registered_once() {
        let mut scene = Scene::default();
        let styling = r#"{"style": "lines", "width": ["*", ["zoom"], 2]}"#;

        let first = parse_styling(styling, &mut scene).unwrap();
        let second = parse_styling(styling, &mut scene).unwrap();

        assert_eq!(scene.functions().len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_and_invalid_values_are_skipped() {
        let mut scene = Scene::default();
        let params = parse_styling(r#"{"colour": "red", "width": "wide"}"#, &mut scene).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_rejects_non_object() {
        let mut scene = Scene::default();
        assert!(matches!(
            parse_styling("[1, 2]", &mut scene),
            Err(StylingError::NotAnObject)
        ));
        assert!(matches!(
            parse_styling("{style:", &mut scene),
            Err(StylingError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_expression_registers_nothing() {
        let mut scene = Scene::default();
        let result = parse_styling(
            r#"{"color": ["get", "fill"], "width": ["frobnicate"]}"#,
            &mut scene,
        );
        assert!(matches!(result, Err(StylingError::Expression { .. })));
        assert!(scene.functions().is_empty());
    }
}
