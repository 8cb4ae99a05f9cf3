//! Zoom stops: `{"stops": [[zoom, value], ...]}` values interpolated by the current zoom.

use serde_json::Value;

use crate::style::param::{parse_color, parse_number, Rgba, StyleParamKey, StyleParamValue};

#[derive(Clone, Debug, PartialEq)]
pub enum StopValue {
    Number(f32),
    Color(Rgba),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub zoom: f32,
    pub value: StopValue,
}

/// Ordered zoom frames. Values are linearly interpolated between frames and clamped outside.
#[derive(Clone, Debug, PartialEq)]
pub struct Stops {
    frames: Vec<Frame>,
}

impl Stops {
    /// Returns `true` if `value` is an object carrying a `stops` member.
    pub fn is_stops(value: &Value) -> bool {
        value.get("stops").is_some()
    }

    /// Parses the stops object for `key`. Only interpolatable keys accept stops.
    pub fn parse(key: StyleParamKey, value: &Value) -> Option<Stops> {
        if !key.is_interpolatable() {
            return None;
        }

        let is_color = matches!(key, StyleParamKey::Color | StyleParamKey::OutlineColor);
        let mut frames = value
            .get("stops")?
            .as_array()?
            .iter()
            .map(|stop| {
                let stop = stop.as_array()?;
                let zoom = stop.first()?.as_f64()? as f32;
                let value = stop.get(1)?;
                let value = if is_color {
                    StopValue::Color(parse_color(value)?)
                } else {
                    StopValue::Number(parse_number(value)?)
                };
                Some(Frame { zoom, value })
            })
            .collect::<Option<Vec<_>>>()?;

        if frames.is_empty() {
            return None;
        }
        frames.sort_by(|a, b| a.zoom.total_cmp(&b.zoom));
        Some(Stops { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn evaluate(&self, zoom: f32) -> StyleParamValue {
        let upper = self.frames.partition_point(|frame| frame.zoom <= zoom);

        let value = if upper == 0 {
            self.frames[0].value.clone()
        } else if upper == self.frames.len() {
            self.frames[upper - 1].value.clone()
        } else {
            let lower = &self.frames[upper - 1];
            let upper = &self.frames[upper];
            let t = (zoom - lower.zoom) / (upper.zoom - lower.zoom);
            interpolate(&lower.value, &upper.value, t)
        };

        match value {
            StopValue::Number(n) => StyleParamValue::Number(n),
            StopValue::Color(c) => StyleParamValue::Color(c),
        }
    }
}

fn interpolate(a: &StopValue, b: &StopValue, t: f32) -> StopValue {
    match (a, b) {
        (StopValue::Number(a), StopValue::Number(b)) => StopValue::Number(a + (b - a) * t),
        (StopValue::Color(a), StopValue::Color(b)) => {
            let mut out = [0.0; 4];
            for i in 0..4 {
                out[i] = a[i] + (b[i] - a[i]) * t;
            }
            StopValue::Color(out)
        }
        // Frames of one stops object are always parsed for the same key.
        _ => a.clone(),
    }
}
