//! SWIFT MT → ISO 20022 Translation Engine
//!
//! A library for translating fixed-format SWIFT MT payment messages
//! (MT103, MT202) into ISO 20022 XML (pacs.008 / pacs.009), driven
//! entirely by declarative schema, mapping, and validation configuration.
//!
//! # Pipeline
//!
//! - **Parse**: a schema-driven parser decomposes the block-delimited MT
//!   text into a flat ordered key/value mapping.
//! - **Map**: ordered declarative rules bind flat-mapping keys (or
//!   literals, optionally transformed) to XML destination paths.
//! - **Validate**: declarative business rules evaluate over the same flat
//!   mapping and accumulate violations.
//!
//! All three engines are pure functions of (configuration, input):
//! configuration is loaded once and safe to share read-only across
//! threads, and every call builds its own mapping or tree.
//!
//! # Examples
//!
//! ## Parsing an MT103
//!
//! ```no_run
//! use swiftmx::{MtParser, MtSchema};
//!
//! let schema = MtSchema::from_json(&std::fs::read_to_string("mt103-schema.json")?)?;
//! let parser = MtParser::new(schema);
//! let message = parser.parse(&std::fs::read_to_string("payment.mt")?)?;
//! println!("reference: {:?}", message.fields.get("b4.20"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Translating to pacs.008
//!
//! ```no_run
//! use swiftmx::{MappingConfig, MtParser, MtSchema, MxMapper};
//!
//! let schema = MtSchema::from_json(&std::fs::read_to_string("mt103-schema.json")?)?;
//! let mapping = MappingConfig::from_json(&std::fs::read_to_string("mt103-to-pacs008.json")?)?;
//!
//! let message = MtParser::new(schema).parse(&std::fs::read_to_string("payment.mt")?)?;
//! let tree = MxMapper::new(mapping).map(&message);
//! println!("{}", tree.to_xml_string()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod mt_parser;
pub mod mx_mapping;
pub mod schema;
pub mod validation;
pub mod xml_tree;

use std::str::FromStr;

use serde::Deserialize;

// Re-export commonly used types
pub use error::{Error, Result};
pub use mt_parser::{FieldMap, MtMessage, MtParser};
pub use mx_mapping::{MappingConfig, MappingRule, MxMapper, RuleSource, Transform};
pub use schema::{ComponentDef, FieldSchema, FormatType, MtSchema};
pub use validation::{MtValidator, ValidationConfig, ValidationRule, Violation};
pub use xml_tree::{MxPath, PathSegment, XmlElement};

/// Supported source message types and their ISO 20022 targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum MessageType {
    /// Customer credit transfer; translates to pacs.008.
    Mt103,
    /// Financial-institution credit transfer; translates to pacs.009.
    Mt202,
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mt103" | "103" | "pacs008" | "pacs.008" => Ok(MessageType::Mt103),
            "mt202" | "202" | "pacs009" | "pacs.009" => Ok(MessageType::Mt202),
            _ => Err(Error::UnknownMessageType(s.to_string())),
        }
    }
}

impl TryFrom<String> for MessageType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl MessageType {
    /// ISO 20022 message identifier of the translation target.
    pub fn target_schema(&self) -> &'static str {
        match self {
            MessageType::Mt103 => "pacs.008.001.08",
            MessageType::Mt202 => "pacs.009.001.08",
        }
    }

    /// Namespace of the target document.
    pub fn namespace(&self) -> &'static str {
        match self {
            MessageType::Mt103 => "urn:iso:std:iso:20022:tech:xsd:pacs.008.001.08",
            MessageType::Mt202 => "urn:iso:std:iso:20022:tech:xsd:pacs.009.001.08",
        }
    }
}
