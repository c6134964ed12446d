//! Parameter grid specification and expansion.
//!
//! A [`ParamGrid`] maps parameter names to ordered candidate values (or holds
//! a union of such mappings) and expands into concrete [`ParamSet`]s in a
//! fixed, reproducible order: within a mapping, axes are sorted by name and
//! the cartesian product cycles the last axis fastest.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AfinarError, Result};

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Str(String),
}

impl ParamValue {
    /// Get as f64 if numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as i64 if integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as bool.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

/// One concrete assignment of parameter name to value.
///
/// Immutable once constructed; built either by [`ParamGrid::expand`] or with
/// the consuming [`with`](ParamSet::with) builder. Names iterate in sorted
/// order, which keeps [`Display`](std::fmt::Display) output and serialization
/// stable.
///
/// # Examples
///
/// ```
/// use afinar::grid::ParamSet;
///
/// let params = ParamSet::new().with("alpha", 0.1).with("depth", 4);
/// assert_eq!(params.get_f64("alpha"), Some(0.1));
/// assert_eq!(params.get_i64("depth"), Some(4));
/// assert_eq!(params.to_string(), "{alpha=0.1, depth=4}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParamSet {
    /// Create an empty parameter setting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Add a named value, consuming and returning the setting.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Get a value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Get a value as f64.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(ParamValue::as_f64)
    }

    /// Get a value as i64.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(ParamValue::as_i64)
    }

    /// Get a value as usize.
    #[must_use]
    pub fn get_usize(&self, name: &str) -> Option<usize> {
        self.get_i64(name).and_then(|v| usize::try_from(v).ok())
    }

    /// Get a value as bool.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(ParamValue::as_bool)
    }

    /// Get a value as string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(ParamValue::as_str)
    }

    /// Number of parameters in the setting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the setting is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over (name, value) pairs in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::fmt::Display for ParamSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .values
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// One axis of a grid mapping: a parameter name with its candidate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct GridAxis {
    name: String,
    values: Vec<ParamValue>,
}

/// A parameter grid: one mapping from names to candidate value lists, or a
/// union of such mappings.
///
/// # Examples
///
/// ```
/// use afinar::grid::ParamGrid;
///
/// let grid = ParamGrid::new()
///     .add("alpha", [0.1, 1.0])
///     .add("depth", [2, 4, 8]);
///
/// let settings = grid.expand().unwrap();
/// assert_eq!(settings.len(), 6);
/// // Axes sorted by name, last axis cycles fastest.
/// assert_eq!(settings[0].to_string(), "{alpha=0.1, depth=2}");
/// assert_eq!(settings[1].to_string(), "{alpha=0.1, depth=4}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    mappings: Vec<Vec<GridAxis>>,
}

impl ParamGrid {
    /// Create an empty grid with a single mapping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mappings: vec![Vec::new()],
        }
    }

    /// Add a parameter axis to the current mapping.
    #[must_use]
    pub fn add<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        let axis = GridAxis {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        };
        // new() guarantees at least one mapping
        if let Some(mapping) = self.mappings.last_mut() {
            mapping.push(axis);
        }
        self
    }

    /// Combine several grids into a union searched in the order given.
    #[must_use]
    pub fn union(grids: impl IntoIterator<Item = ParamGrid>) -> Self {
        Self {
            mappings: grids.into_iter().flat_map(|g| g.mappings).collect(),
        }
    }

    /// Number of mappings in the grid.
    #[must_use]
    pub fn n_mappings(&self) -> usize {
        self.mappings.len()
    }

    /// Expand the grid into concrete parameter settings.
    ///
    /// Mappings expand in the order given; within a mapping the axes are
    /// sorted by name and the cartesian product cycles the last axis fastest,
    /// so the enumeration order is fixed and reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`AfinarError::InvalidGrid`] if the grid has no mappings, a
    /// mapping has no axes, an axis has no candidate values, or a mapping
    /// repeats an axis name.
    pub fn expand(&self) -> Result<Vec<ParamSet>> {
        if self.mappings.is_empty() {
            return Err(AfinarError::invalid_grid("grid has no parameter mappings"));
        }

        let mut settings = Vec::new();
        for mapping in &self.mappings {
            settings.extend(expand_mapping(mapping)?);
        }
        Ok(settings)
    }
}

fn expand_mapping(mapping: &[GridAxis]) -> Result<Vec<ParamSet>> {
    if mapping.is_empty() {
        return Err(AfinarError::invalid_grid("mapping has no parameter axes"));
    }

    let mut axes: Vec<&GridAxis> = mapping.iter().collect();
    axes.sort_by(|a, b| a.name.cmp(&b.name));

    for pair in axes.windows(2) {
        if pair[0].name == pair[1].name {
            return Err(AfinarError::invalid_grid(format!(
                "duplicate axis '{}' in mapping",
                pair[0].name
            )));
        }
    }

    let mut settings = vec![ParamSet::new()];
    for axis in axes {
        if axis.values.is_empty() {
            return Err(AfinarError::invalid_grid(format!(
                "axis '{}' has no candidate values",
                axis.name
            )));
        }
        let mut next = Vec::with_capacity(settings.len() * axis.values.len());
        for setting in &settings {
            for value in &axis.values {
                next.push(setting.clone().with(axis.name.clone(), value.clone()));
            }
        }
        settings = next;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_cartesian_count() {
        let grid = ParamGrid::new()
            .add("a", [1, 2, 3])
            .add("b", [0.1, 0.2])
            .add("c", [true, false]);
        let settings = grid.expand().expect("expand");
        assert_eq!(settings.len(), 12);
    }

    #[test]
    fn test_expand_order_last_axis_fastest() {
        let grid = ParamGrid::new().add("a", [1, 2]).add("b", ["x", "y"]);
        let settings = grid.expand().expect("expand");
        let rendered: Vec<String> = settings.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["{a=1, b=x}", "{a=1, b=y}", "{a=2, b=x}", "{a=2, b=y}"]
        );
    }

    #[test]
    fn test_expand_order_independent_of_insertion() {
        let forward = ParamGrid::new().add("a", [1, 2]).add("b", ["x", "y"]);
        let reversed = ParamGrid::new().add("b", ["x", "y"]).add("a", [1, 2]);
        assert_eq!(
            forward.expand().expect("expand"),
            reversed.expand().expect("expand")
        );
    }

    #[test]
    fn test_expand_empty_grid_fails() {
        let grid = ParamGrid::new();
        let err = grid.expand().expect_err("empty grid must fail");
        assert!(matches!(err, AfinarError::InvalidGrid { .. }));
    }

    #[test]
    fn test_expand_empty_axis_fails() {
        let grid = ParamGrid::new().add("a", Vec::<i64>::new());
        let err = grid.expand().expect_err("empty axis must fail");
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_expand_duplicate_axis_fails() {
        let grid = ParamGrid::new().add("a", [1]).add("a", [2]);
        let err = grid.expand().expect_err("duplicate axis must fail");
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_union_concatenates_in_order() {
        let g1 = ParamGrid::new().add("a", [1, 2]);
        let g2 = ParamGrid::new().add("b", ["x"]);
        let union = ParamGrid::union([g1, g2]);
        assert_eq!(union.n_mappings(), 2);

        let settings = union.expand().expect("expand");
        let rendered: Vec<String> = settings.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["{a=1}", "{a=2}", "{b=x}"]);
    }

    #[test]
    fn test_union_surfaces_malformed_member() {
        let g1 = ParamGrid::new().add("a", [1]);
        let g2 = ParamGrid::new();
        let union = ParamGrid::union([g1, g2]);
        assert!(union.expand().is_err());
    }

    #[test]
    fn test_param_set_typed_getters() {
        let params = ParamSet::new()
            .with("f", 0.5)
            .with("i", 3)
            .with("b", true)
            .with("s", "adam");
        assert_eq!(params.get_f64("f"), Some(0.5));
        assert_eq!(params.get_f64("i"), Some(3.0));
        assert_eq!(params.get_i64("i"), Some(3));
        assert_eq!(params.get_usize("i"), Some(3));
        assert_eq!(params.get_bool("b"), Some(true));
        assert_eq!(params.get_str("s"), Some("adam"));
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::from(1.5).to_string(), "1.5");
        assert_eq!(ParamValue::from(7).to_string(), "7");
        assert_eq!(ParamValue::from(false).to_string(), "false");
        assert_eq!(ParamValue::from("sgd").to_string(), "sgd");
    }

    #[test]
    fn test_expand_is_reproducible() {
        let grid = ParamGrid::new().add("a", [1, 2, 3]).add("b", [0.1, 0.2]);
        assert_eq!(grid.expand().expect("first"), grid.expand().expect("second"));
    }

    #[test]
    fn test_serde_round_trip() {
        let grid = ParamGrid::new().add("alpha", [0.1, 1.0]).add("d", [2, 4]);
        let json = serde_json::to_string(&grid).expect("serialize");
        let back: ParamGrid = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.expand().expect("expand"), grid.expand().expect("expand"));
    }
}
