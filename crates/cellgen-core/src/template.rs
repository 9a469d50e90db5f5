//! Input templates: the default cell, the fields block, and the seed set.
//!
//! All three arrive as JSON documents next to the region data. The default
//! cell supplies the state every cell starts from and the self-loop weight;
//! the fields block is passed through untouched; the seed set patches the
//! initial state of a handful of cells to start the outbreak.

use cellgen_types::{NeighborhoodEntry, RegionId};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Key of the template neighborhood entry holding the self-loop defaults.
const DEFAULT_VICINITY_KEY: &str = "default_cell_id";

/// Errors raised while reading template documents.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The document is not valid JSON or does not match the expected shape.
    #[error("{template}: {source}")]
    Parse {
        /// Which template failed.
        template: &'static str,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A required key is absent.
    #[error("{template}: missing key `{path}`")]
    MissingKey {
        /// Which template failed.
        template: &'static str,
        /// Dotted path of the missing key.
        path: &'static str,
    },

    /// A key holds a value of the wrong JSON type.
    #[error("{template}: `{path}` must be {expected}")]
    WrongType {
        /// Which template failed.
        template: &'static str,
        /// Dotted path of the offending key.
        path: &'static str,
        /// Human-readable expected type.
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Default cell
// ---------------------------------------------------------------------------

/// The `default` cell template.
///
/// ```json
/// {"default": {"state": {...},
///              "neighborhood": {"default_cell_id": {"correlation": 1.0,
///                                                   "infection_correction_factors": {...}}}}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultCellTemplate {
    raw: Value,
    state: Map<String, Value>,
    correlation: f64,
    correction_factors: Value,
}

impl DefaultCellTemplate {
    const NAME: &'static str = "default cell template";

    /// Parse the template from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the text is not JSON or lacks a
    /// required key.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let value = serde_json::from_str(text).map_err(|source| TemplateError::Parse {
            template: Self::NAME,
            source,
        })?;
        Self::from_value(value)
    }

    /// Build the template from an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if a required key is missing or mistyped.
    pub fn from_value(mut document: Value) -> Result<Self, TemplateError> {
        let raw = document
            .get_mut("default")
            .map(Value::take)
            .ok_or(TemplateError::MissingKey {
                template: Self::NAME,
                path: "default",
            })?;

        let state = raw
            .get("state")
            .ok_or(TemplateError::MissingKey {
                template: Self::NAME,
                path: "default.state",
            })?
            .as_object()
            .cloned()
            .ok_or(TemplateError::WrongType {
                template: Self::NAME,
                path: "default.state",
                expected: "an object",
            })?;

        let vicinity = raw
            .get("neighborhood")
            .and_then(|n| n.get(DEFAULT_VICINITY_KEY))
            .ok_or(TemplateError::MissingKey {
                template: Self::NAME,
                path: "default.neighborhood.default_cell_id",
            })?;

        let correlation = vicinity
            .get("correlation")
            .ok_or(TemplateError::MissingKey {
                template: Self::NAME,
                path: "default.neighborhood.default_cell_id.correlation",
            })?
            .as_f64()
            .ok_or(TemplateError::WrongType {
                template: Self::NAME,
                path: "default.neighborhood.default_cell_id.correlation",
                expected: "a number",
            })?;

        let correction_factors = vicinity
            .get("infection_correction_factors")
            .cloned()
            .ok_or(TemplateError::MissingKey {
                template: Self::NAME,
                path: "default.neighborhood.default_cell_id.infection_correction_factors",
            })?;

        Ok(Self {
            raw,
            state,
            correlation,
            correction_factors,
        })
    }

    /// The `default` object exactly as it appeared in the document.
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// The template state.
    pub const fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    /// Correlation used for every self-loop.
    pub const fn default_correlation(&self) -> f64 {
        self.correlation
    }

    /// Correction factors attached to every neighborhood entry.
    pub const fn correction_factors(&self) -> &Value {
        &self.correction_factors
    }

    /// An independent copy of the template state with `population` set.
    pub fn instantiate_state(&self, population: u64) -> Map<String, Value> {
        let mut state = self.state.clone();
        state.insert("population".to_owned(), Value::from(population));
        state
    }

    /// Neighborhood entry for a geometric edge with the given weight.
    pub fn edge_entry(&self, correlation: f64) -> NeighborhoodEntry {
        NeighborhoodEntry {
            correlation,
            infection_correction_factors: self.correction_factors.clone(),
        }
    }

    /// Neighborhood entry linking a cell to itself.
    pub fn self_loop_entry(&self) -> NeighborhoodEntry {
        self.edge_entry(self.correlation)
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// The `fields` metadata block, passed through to the scenario verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldsTemplate(Value);

impl FieldsTemplate {
    const NAME: &'static str = "fields template";

    /// Parse the template from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] if the text is not JSON or lacks `fields`.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let value = serde_json::from_str(text).map_err(|source| TemplateError::Parse {
            template: Self::NAME,
            source,
        })?;
        Self::from_value(value)
    }

    /// Extract the `fields` value from a parsed document.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingKey`] if there is no `fields` key.
    pub fn from_value(mut document: Value) -> Result<Self, TemplateError> {
        document
            .get_mut("fields")
            .map(|fields| Self(fields.take()))
            .ok_or(TemplateError::MissingKey {
                template: Self::NAME,
                path: "fields",
            })
    }

    /// The metadata value.
    pub const fn value(&self) -> &Value {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Seeds
// ---------------------------------------------------------------------------

/// State fields a seed may overwrite.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedState {
    /// Replaces `state.susceptible`.
    pub susceptible: Value,
    /// Replaces `state.exposed`.
    pub exposed: Value,
    /// Replaces `state.infected` when the key is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    pub infected: Option<Value>,
    /// Replaces `state.recovered` when the key is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    pub recovered: Option<Value>,
    /// Replaces `state.fatalities` when the key is present, even as `null`.
    #[serde(default, deserialize_with = "present")]
    pub fatalities: Option<Value>,
}

/// A present key is `Some`, `null` included; only a missing key is `None`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// One entry of the seed set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedOverride {
    /// The partial state to overlay.
    pub state: SeedState,
}

/// Initial-infection overrides keyed by region id, in file order.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct SeedSet(IndexMap<RegionId, SeedOverride>);

impl SeedSet {
    const NAME: &'static str = "infected cell set";

    /// Parse the seed set from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Parse`] if the text is not JSON, or an entry
    /// lacks `state.susceptible` or `state.exposed`.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        serde_json::from_str(text).map_err(|source| TemplateError::Parse {
            template: Self::NAME,
            source,
        })
    }

    /// Build the seed set from an already parsed document.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SeedSet::parse`].
    pub fn from_value(document: Value) -> Result<Self, TemplateError> {
        serde_json::from_value(document).map_err(|source| TemplateError::Parse {
            template: Self::NAME,
            source,
        })
    }

    /// Iterate over seeds in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &SeedOverride)> {
        self.0.iter()
    }

    /// Number of seeds.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn default_document() -> Value {
        json!({
            "default": {
                "delay": "inertial",
                "state": {
                    "population": 0,
                    "susceptible": [1.0],
                    "exposed": [0.0],
                    "infected": [0.0],
                    "recovered": [0.0],
                    "fatalities": [0.0]
                },
                "neighborhood": {
                    "default_cell_id": {
                        "correlation": 1.0,
                        "infection_correction_factors": {"0.4": 0.6}
                    }
                }
            }
        })
    }

    #[test]
    fn default_template_extracts_parts() {
        let template = DefaultCellTemplate::from_value(default_document());
        assert!(template.is_ok());
        let Ok(template) = template else { return };
        assert!((template.default_correlation() - 1.0).abs() < f64::EPSILON);
        assert_eq!(template.correction_factors(), &json!({"0.4": 0.6}));
        assert_eq!(template.raw()["delay"], json!("inertial"));
        assert_eq!(template.state().len(), 6);
    }

    #[test]
    fn instantiated_state_is_independent() {
        let Ok(template) = DefaultCellTemplate::from_value(default_document()) else {
            return;
        };
        let mut first = template.instantiate_state(10);
        let second = template.instantiate_state(20);
        first.insert("susceptible".to_owned(), json!([0.5]));

        assert_eq!(first["population"], json!(10));
        assert_eq!(second["population"], json!(20));
        assert_eq!(second["susceptible"], json!([1.0]));
        assert_eq!(template.state()["population"], json!(0));
    }

    #[test]
    fn population_keeps_template_key_position() {
        let Ok(template) = DefaultCellTemplate::from_value(default_document()) else {
            return;
        };
        let state = template.instantiate_state(5);
        assert_eq!(state.keys().next().map(String::as_str), Some("population"));
    }

    #[test]
    fn default_template_requires_self_loop_entry() {
        let result = DefaultCellTemplate::from_value(json!({
            "default": {"state": {}, "neighborhood": {}}
        }));
        assert!(matches!(
            result,
            Err(TemplateError::MissingKey {
                path: "default.neighborhood.default_cell_id",
                ..
            })
        ));
    }

    #[test]
    fn default_template_rejects_non_numeric_correlation() {
        let result = DefaultCellTemplate::from_value(json!({
            "default": {"state": {}, "neighborhood": {"default_cell_id": {
                "correlation": "one", "infection_correction_factors": {}
            }}}
        }));
        assert!(matches!(result, Err(TemplateError::WrongType { .. })));
    }

    #[test]
    fn fields_passthrough() {
        let fields = FieldsTemplate::parse(r#"{"fields": {"susceptible": {"index": 0}}}"#);
        assert_eq!(
            fields.ok().map(|f| f.value().clone()),
            Some(json!({"susceptible": {"index": 0}}))
        );
        assert!(FieldsTemplate::parse("{}").is_err());
    }

    #[test]
    fn seed_set_keeps_file_order_and_optional_fields() {
        let seeds = SeedSet::parse(
            r#"{
                "35": {"state": {"susceptible": [0.9], "exposed": [0.1]}},
                "12": {"state": {"susceptible": [0.8], "exposed": [0.1], "infected": [0.1]}}
            }"#,
        )
        .unwrap_or_default();
        let ids: Vec<&str> = seeds.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["35", "12"]);
        let infected: Vec<bool> = seeds.iter().map(|(_, s)| s.state.infected.is_some()).collect();
        assert_eq!(infected, vec![false, true]);
    }

    #[test]
    fn seed_without_exposed_is_rejected() {
        let result = SeedSet::parse(r#"{"1": {"state": {"susceptible": [1.0]}}}"#);
        assert!(matches!(result, Err(TemplateError::Parse { .. })));
    }
}
