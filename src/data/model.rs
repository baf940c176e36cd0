use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Column names of the metrics table
// ---------------------------------------------------------------------------

pub const COL_COMPONENT: &str = "Component";
pub const COL_KAPPA: &str = "kappa";
pub const COL_RHO: &str = "rho";
pub const COL_VARIANCE: &str = "variance explained";
pub const COL_NORMALIZED_VARIANCE: &str = "normalized variance explained";
pub const COL_CLASSIFICATION: &str = "classification";
pub const COL_TAGS: &str = "classification_tags";
pub const COL_RATIONALE: &str = "rationale";

/// Columns every record must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_COMPONENT,
    COL_KAPPA,
    COL_RHO,
    COL_VARIANCE,
    COL_CLASSIFICATION,
];

// ---------------------------------------------------------------------------
// FieldValue – a single cell of a raw record
// ---------------------------------------------------------------------------

/// A dynamically-typed cell of the metrics table.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Empty cell.
    Null,
}

impl fmt::Display for FieldValue {
    /// Full precision, so an exported table carries the values it was loaded with.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => Ok(()),
        }
    }
}

impl FieldValue {
    /// Interpret the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Parse a raw TSV cell, guessing the narrowest type.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return FieldValue::Float(f);
        }
        match s {
            "true" | "True" => FieldValue::Bool(true),
            "false" | "False" => FieldValue::Bool(false),
            _ => FieldValue::Text(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Cell – a loaded value plus its source text
// ---------------------------------------------------------------------------

/// One cell of a raw record: the parsed value and the exact text it was
/// read from, so unedited columns export as they were loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: FieldValue,
    pub text: String,
}

impl Cell {
    /// Parse a TSV cell, keeping the text verbatim.
    pub fn parse(s: &str) -> Self {
        Cell {
            value: FieldValue::parse(s),
            text: s.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn is_null(&self) -> bool {
        self.value == FieldValue::Null
    }
}

impl From<FieldValue> for Cell {
    fn from(value: FieldValue) -> Self {
        Cell {
            text: value.to_string(),
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Reviewer- or algorithm-assigned category of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Accepted,
    Rejected,
    Ignored,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::Accepted,
        Classification::Rejected,
        Classification::Ignored,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Accepted => "accepted",
            Classification::Rejected => "rejected",
            Classification::Ignored => "ignored",
        }
    }

    /// Grouping key of the navigation order: accepted, then rejected, then the rest.
    pub fn navigation_rank(self) -> u8 {
        match self {
            Classification::Accepted => 0,
            Classification::Rejected => 1,
            Classification::Ignored => 2,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "accepted" => Ok(Classification::Accepted),
            "rejected" => Ok(Classification::Rejected),
            "ignored" => Ok(Classification::Ignored),
            other => Err(CoreError::InvalidLabel(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Metrics and ranks
// ---------------------------------------------------------------------------

/// Numeric scores the views can plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Kappa,
    Rho,
    VarianceExplained,
}

impl Metric {
    pub fn label(self) -> &'static str {
        match self {
            Metric::Kappa => "Kappa",
            Metric::Rho => "Rho",
            Metric::VarianceExplained => "Variance explained",
        }
    }
}

/// Derived ranks of one component (1 = highest value).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Ranks {
    pub kappa: usize,
    pub rho: usize,
    /// Rank by normalized variance explained when the table has it,
    /// otherwise by variance explained.
    pub variance: usize,
}

impl Ranks {
    pub fn get(&self, metric: Metric) -> usize {
        match metric {
            Metric::Kappa => self.kappa,
            Metric::Rho => self.rho,
            Metric::VarianceExplained => self.variance,
        }
    }
}

// ---------------------------------------------------------------------------
// Component – one row of the metrics table
// ---------------------------------------------------------------------------

/// One decomposed signal source with its metrics and classification.
#[derive(Debug, Clone)]
pub struct Component {
    /// Value of the `Component` column, unique within a catalog.
    pub id: String,
    /// Position in the loaded table.
    pub ordinal: usize,
    /// The raw record, column → cell.
    pub fields: BTreeMap<String, Cell>,
    pub kappa: f64,
    pub rho: f64,
    pub variance_explained: f64,
    pub normalized_variance: Option<f64>,
    pub ranks: Ranks,
    pub(crate) classification: Classification,
    pub(crate) original_classification: Classification,
    pub(crate) tags: String,
    pub(crate) original_tags: String,
    pub(crate) rationale: Option<String>,
    pub(crate) original_rationale: Option<String>,
}

impl Component {
    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn original_classification(&self) -> Classification {
        self.original_classification
    }

    pub fn tags(&self) -> &str {
        &self.tags
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    /// Whether the reviewer changed the label since load.
    pub fn is_manually_changed(&self) -> bool {
        self.classification != self.original_classification
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Kappa => self.kappa,
            Metric::Rho => self.rho,
            Metric::VarianceExplained => self.variance_explained,
        }
    }

    /// Cell text for a column, taking live classification/tags/rationale
    /// over the loaded record. Every other column is the loaded text.
    pub fn cell(&self, column: &str) -> String {
        match column {
            COL_CLASSIFICATION => self.classification.to_string(),
            COL_TAGS => self.tags.clone(),
            COL_RATIONALE => self.rationale.clone().unwrap_or_default(),
            other => self
                .fields
                .get(other)
                .map(|c| c.text.clone())
                .unwrap_or_default(),
        }
    }
}
