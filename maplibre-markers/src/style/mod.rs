//! Marker styling: compiling styling text into draw rules, evaluating them and building
//! meshes per style.

pub mod builder;
pub mod context;
pub mod draw_rule;
pub mod expression;
pub mod param;
pub mod parser;
pub mod point;
pub mod polygon;
pub mod polyline;
pub mod stops;

pub use builder::{BaseStyle, Style, StyleBuilder, StyleId, StyleKind};
pub use context::{ExpressionFunctions, FunctionId, StyleContext, StyleFunctions};
pub use draw_rule::{DrawRule, EvaluatedRule};
