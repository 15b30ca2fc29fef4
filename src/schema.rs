//! Declarative MT field schema model.
//!
//! A schema describes, per field, where in the message it lives (block,
//! tag, option), how its raw text decomposes (format type), and which
//! destination keys its components populate in the flat mapping. Schemas
//! are plain data loaded from JSON; the parser never hard-codes a field.

use std::collections::HashSet;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Schema for one MT message type (e.g. MT103).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MtSchema {
    /// Message type identifier, e.g. "103".
    pub message_type: String,

    /// Block ids that must be present in a message of this type.
    #[serde(default)]
    pub blocks: Vec<u8>,

    /// Ordered field definitions.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

/// Definition of one field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Tag within its block, e.g. "20", "32A", "50K"; "B1"/"B2" for the
    /// header blocks.
    pub tag: String,

    /// Letter option for fields that carry one (e.g. "A", "F", "K").
    #[serde(default)]
    pub option: Option<String>,

    /// Block the field belongs to (1-5).
    pub block: u8,

    /// Human-readable field name.
    #[serde(default)]
    pub name: Option<String>,

    /// Whether the field must appear in a well-formed message.
    #[serde(default)]
    pub mandatory: bool,

    /// Maximum number of occurrences of the tag.
    #[serde(default = "default_max_occurs")]
    pub max_occurs: u32,

    /// How the raw field text decomposes into components.
    pub format: FormatDef,

    /// Component-to-destination-key bindings.
    #[serde(default)]
    pub components: Vec<ComponentDef>,
}

fn default_max_occurs() -> u32 {
    1
}

/// Format descriptor for a field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDef {
    #[serde(rename = "type")]
    pub kind: FormatType,

    /// Maximum number of physical lines, for multiline formats.
    #[serde(default)]
    pub max_lines: Option<usize>,

    /// Maximum value length, for clipping formats.
    #[serde(default)]
    pub max_length: Option<usize>,
}

/// Closed set of supported format types.
///
/// Deserialization fails on an unknown type, so a misconfigured schema is
/// rejected when it is loaded rather than silently ignored at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatType {
    /// Single trimmed value, optionally clipped to `maxLength`.
    Simple,
    /// `YYMMDD` date + 3-letter currency + decimal amount.
    DateCurrencyAmount,
    /// 3-letter currency + decimal amount.
    CurrencyAmount,
    /// Verbatim trimmed rate value.
    Rate,
    /// Optional `/account` line, then name, then address lines.
    PartyLines,
    /// Same layout as `PartyLines`, for option-F style parties.
    StructuredParty,
    /// Optional `/account` line, then a BIC.
    BicParty,
    /// Optional `/account` line, then a name.
    AccountParty,
    /// Positional `lineN` components over physical lines.
    FreeTextLines,
    /// Positional `lineN` components over regulatory report lines.
    RegulatoryLines,
    /// Fixed-offset basic header envelope.
    Block1,
    /// Fixed-offset application header (input/output layouts).
    Block2,
    /// Verbatim `{tag:value}` user-header sub-field.
    Block3Tag,
}

/// Binds one decomposed component to its destination key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDef {
    /// Logical component name, e.g. "date", "ccy", "amount", "line0".
    pub name: String,

    /// Destination key in the flat mapping, e.g. "b4.32A.amount".
    pub key: String,
}

impl MtSchema {
    /// Deserialize a schema from its JSON representation and sanity-check it.
    pub fn from_json(json: &str) -> Result<Self> {
        let schema: MtSchema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Structural sanity checks on a loaded schema.
    ///
    /// Block ids outside 1-5 are rejected. Duplicate destination keys are a
    /// configuration hazard but not an error: the parser applies last-write-
    /// wins, so they are only logged.
    pub fn validate(&self) -> Result<()> {
        for block in &self.blocks {
            if !(1..=5).contains(block) {
                return Err(Error::InvalidSchema(format!(
                    "block id out of range: {block}"
                )));
            }
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !(1..=5).contains(&field.block) {
                return Err(Error::InvalidSchema(format!(
                    "field {} has block id out of range: {}",
                    field.tag, field.block
                )));
            }
            for component in &field.components {
                if !seen.insert(component.key.as_str()) {
                    tracing::warn!(
                        key = %component.key,
                        tag = %field.tag,
                        "duplicate destination key in schema; last write wins"
                    );
                }
            }
        }
        Ok(())
    }
}
