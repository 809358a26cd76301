//! Fixed layer vocabulary and expression table.
//!
//! Decomposition produces one layer per entry in [`LAYER_TYPES`]; expression
//! generation produces one `expression` layer per (family, variation) pair
//! in [`EXPRESSION_FAMILIES`].

/// Layer types identified during decomposition, in insertion order.
pub const LAYER_TYPES: [&str; 8] = [
    "head",
    "ears",
    "eyes",
    "eyebrows",
    "nose",
    "mouth",
    "body",
    "accessories",
];

/// `layer_type` value used for every generated expression variant.
pub const EXPRESSION_LAYER_TYPE: &str = "expression";

/// Placeholder file reference for generated expressions.
pub const EXPRESSION_PLACEHOLDER_FILE: &str = "generated_expression.png";

/// A facial feature and the expression variations generated for it.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionFamily {
    pub family: &'static str,
    pub variations: &'static [&'static str],
}

pub const EXPRESSION_FAMILIES: [ExpressionFamily; 3] = [
    ExpressionFamily {
        family: "mouth",
        variations: &["A", "E", "I", "O", "U", "closed", "smile", "frown"],
    },
    ExpressionFamily {
        family: "eyes",
        variations: &["open", "closed", "half-closed", "left", "right", "up", "down"],
    },
    ExpressionFamily {
        family: "eyebrows",
        variations: &["neutral", "raised", "furrowed", "surprised", "angry", "sad"],
    },
];

/// Total number of (family, variation) pairs.
pub fn expression_count() -> usize {
    EXPRESSION_FAMILIES.iter().map(|f| f.variations.len()).sum()
}

/// Every (family, variation) pair in generation order.
pub fn expression_pairs() -> impl Iterator<Item = (&'static str, &'static str)> {
    EXPRESSION_FAMILIES
        .iter()
        .flat_map(|f| f.variations.iter().map(move |v| (f.family, *v)))
}

/// Name of the layer produced for a decomposition layer type.
pub fn decomposition_layer_name(layer_type: &str) -> String {
    format!("{layer_type}_layer")
}

/// Name of the layer produced for an expression variant.
pub fn expression_layer_name(family: &str, variation: &str) -> String {
    format!("{family}_{variation}")
}
