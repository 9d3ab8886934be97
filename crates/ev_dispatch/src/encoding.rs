//! Label encoding of categorical ride attributes.
//!
//! Tables come from training: for each category the ordered list of classes the
//! encoder saw, where a value's code is its index in that list. Inference never
//! fails on an unseen value; it gets [`DEFAULT_CODE`]. That makes unseen values
//! indistinguishable from the first trained class, a known source of fare
//! distortion that is kept so codes stay compatible with existing artifacts.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

use crate::error::ArtifactError;

/// Code returned for anything the tables cannot resolve.
pub const DEFAULT_CODE: i64 = 0;

/// Categorical fields the fare model was trained on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    City,
    TrafficLevel,
    VehicleType,
    TimeOfDay,
    WeatherCondition,
    UserType,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::City,
        Category::TrafficLevel,
        Category::VehicleType,
        Category::TimeOfDay,
        Category::WeatherCondition,
        Category::UserType,
    ];

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Value -> code table for one category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    codes: HashMap<String, i64>,
}

impl LabelTable {
    /// Build from the training-time class list; code = position.
    pub fn from_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes = HashMap::new();
        for (index, class) in classes.into_iter().enumerate() {
            codes.entry(class.into()).or_insert(index as i64);
        }
        Self { codes }
    }

    pub fn code(&self, value: &str) -> Option<i64> {
        self.codes.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// All label tables of a trained model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelEncoders {
    tables: HashMap<Category, LabelTable>,
}

impl LabelEncoders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, category: Category, table: LabelTable) -> Self {
        self.tables.insert(category, table);
        self
    }

    /// Load tables from a JSON object mapping category name to class list,
    /// e.g. `{"city": ["Bangalore", "Delhi"], "user_type": ["premium", "regular"]}`.
    /// Categories this crate does not know are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(json)?;
        let mut encoders = Self::new();
        for (name, classes) in raw {
            match Category::from_str(&name) {
                Ok(category) => {
                    encoders
                        .tables
                        .insert(category, LabelTable::from_classes(classes));
                }
                Err(_) => tracing::debug!(category = %name, "ignoring unknown label category"),
            }
        }
        Ok(encoders)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, category: Category) -> Option<&LabelTable> {
        self.tables.get(&category)
    }

    /// Code for `value`, or `None` when the category or value was never trained.
    pub fn lookup(&self, value: &str, category: Category) -> Option<i64> {
        self.tables.get(&category)?.code(value)
    }

    /// Code for `value`, falling back to [`DEFAULT_CODE`].
    pub fn encode(&self, value: &str, category: Category) -> i64 {
        self.lookup(value, category).unwrap_or(DEFAULT_CODE)
    }
}
