//! Configured MT → MX mapping rule engine.
//!
//! Ordered declarative rules bind flat-mapping keys (or literals,
//! optionally transformed) to destination paths in the output XML tree.
//! Rules with nothing to contribute are skipped individually; a single
//! rule never aborts the mapping.

use serde::Deserialize;

use crate::error::Result;
use crate::mt_parser::MtMessage;
use crate::xml_tree::{MxPath, XmlElement};
use crate::MessageType;

/// Ordered mapping configuration for one translation target.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    /// Source message type; selects the target document namespace.
    pub message_type: MessageType,

    /// Root element under `Document`, e.g. "FIToFICstmrCdtTrf" for
    /// pacs.008 or "FICdtTrf" for pacs.009.
    pub root: String,

    /// Rules, applied strictly in configured order.
    pub mappings: Vec<MappingRule>,
}

impl MappingConfig {
    /// Deserialize a mapping configuration from JSON. Destination paths
    /// are parsed and transform names resolved here; a bad rule fails the
    /// load rather than a later mapping call.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One declarative mapping rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    #[serde(flatten)]
    pub source: RuleSource,

    /// Destination path relative to the root element.
    pub target: MxPath,

    /// Optional transform applied before assignment.
    #[serde(default)]
    pub transform: Option<Transform>,
}

/// Where a rule's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleSource {
    /// Look the value up in the parsed flat mapping.
    Key(String),
    /// Use a configured constant.
    Literal(String),
}

/// Named pure string transforms available to mapping rules.
///
/// The set is closed: a configuration referencing an unknown transform
/// fails to deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transform {
    /// MT 71A charge codes to ISO charge-bearer codes.
    MapChargeBearer,
    /// SWIFT decimal comma to dot.
    NumericNormalize,
    /// Six-digit `YYMMDD` to `20YY-MM-DD`.
    ExpandYymmdd,
    /// Trim surrounding whitespace.
    Trim,
}

impl Transform {
    /// Apply the transform. Transforms are total: unrecognized input
    /// passes through unchanged. An empty result means "omit the rule".
    pub fn apply(self, value: &str) -> String {
        match self {
            Transform::MapChargeBearer => match value {
                "OUR" => "DEBT".to_string(),
                "BEN" => "CRED".to_string(),
                "SHA" => "SHAR".to_string(),
                _ => value.to_string(),
            },
            Transform::NumericNormalize => value.replace(',', "."),
            Transform::ExpandYymmdd => expand_yymmdd(value),
            Transform::Trim => value.trim().to_string(),
        }
    }
}

fn expand_yymmdd(value: &str) -> String {
    if value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("20{}-{}-{}", &value[0..2], &value[2..4], &value[4..6])
    } else {
        value.to_string()
    }
}

/// Applies an ordered mapping configuration to a parsed message.
#[derive(Debug, Clone)]
pub struct MxMapper {
    config: MappingConfig,
}

impl MxMapper {
    pub fn new(config: MappingConfig) -> Self {
        MxMapper { config }
    }

    /// Build the target XML tree.
    ///
    /// Rules whose source value is absent or empty are skipped, as are
    /// rules whose transform yields the empty string. Element insertion
    /// order in the tree follows rule application order.
    pub fn map(&self, message: &MtMessage) -> XmlElement {
        let mut document = XmlElement::new("Document");
        document.set_attribute("xmlns", self.config.message_type.namespace());
        let root = document.ensure_child(&self.config.root, 0);

        let mut applied = 0usize;
        for rule in &self.config.mappings {
            let value = match &rule.source {
                RuleSource::Literal(v) => v.clone(),
                RuleSource::Key(k) => match message.fields.get(k) {
                    Some(v) => v.to_string(),
                    None => continue,
                },
            };
            if value.is_empty() {
                continue;
            }
            let value = match rule.transform {
                Some(transform) => transform.apply(&value),
                None => value,
            };
            if value.is_empty() {
                continue;
            }
            rule.target.apply(root, &value);
            applied += 1;
        }
        tracing::debug!(
            rules = self.config.mappings.len(),
            applied,
            "mapping complete"
        );
        document
    }
}
