//! Wikidata EntityData Data Transfer Objects
//!
//! These types match EXACTLY the `Special:EntityData/{qid}.json` shape.
//! Only the image claim path (entities → claims → P18 → mainsnak →
//! datavalue → value) is modeled; everything else is ignored.
//!
//! API Reference: https://www.wikidata.org/wiki/Special:EntityData

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Top-level EntityData document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EntityResponse {
    pub entities: HashMap<String, Entity>,
}

/// One entity with its claims
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub claims: HashMap<String, Vec<Claim>>,
}

/// One claim statement
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Claim {
    pub mainsnak: Option<MainSnak>,
}

/// The claim's main snak
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MainSnak {
    pub datavalue: Option<DataValue>,
}

/// Snak value; P18 values are plain strings (Commons filenames)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataValue {
    pub value: Value,
}

impl Claim {
    /// The claim value as a non-empty string, when it is one.
    pub fn string_value(&self) -> Option<&str> {
        self.mainsnak
            .as_ref()?
            .datavalue
            .as_ref()?
            .value
            .as_str()
            .filter(|value| !value.is_empty())
    }
}

// ============================================================================
// CONTRACT TESTS
// ============================================================================
