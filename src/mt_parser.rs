//! Schema-driven SWIFT MT parser.
//!
//! Splits a raw MT message into its five delimited blocks, then decodes
//! each block through the schema's format handlers into a flat ordered
//! key/value mapping. The mapping is the canonical intermediate form
//! consumed by both the mapping engine and the validator.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::schema::{FieldSchema, FormatType, MtSchema};

/// Matches a block 4 tag line like `:20:VALUE` or `:32A:...`.
static TAG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(\d{2,3}[A-Z]?):(.*)$").expect("static regex must compile")
});

/// Insertion-ordered destination-key mapping.
///
/// Re-inserting an existing key replaces its value in place, so iteration
/// order always reflects the first assignment of each key (last write wins
/// for the value, not the position).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A parsed MT message.
///
/// Built once per parse call and immutable afterward; the caller owns it
/// exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct MtMessage {
    /// Original message text.
    pub raw: String,
    /// Basic header block, including delimiters.
    pub block1: Option<String>,
    /// Application header block.
    pub block2: Option<String>,
    /// User header block.
    pub block3: Option<String>,
    /// Text block.
    pub block4: Option<String>,
    /// Trailer block.
    pub block5: Option<String>,
    /// Flat ordered destination-key mapping.
    pub fields: FieldMap,
}

/// Schema-driven parser for block-delimited MT text.
#[derive(Debug, Clone)]
pub struct MtParser {
    schema: MtSchema,
    block1_def: Option<usize>,
    block2_def: Option<usize>,
    block3_by_tag: HashMap<String, Vec<usize>>,
    block4_by_tag: HashMap<String, Vec<usize>>,
}

impl MtParser {
    /// Build a parser over a schema, indexing field definitions by block
    /// and tag.
    pub fn new(schema: MtSchema) -> Self {
        let mut block1_def = None;
        let mut block2_def = None;
        let mut block3_by_tag: HashMap<String, Vec<usize>> = HashMap::new();
        let mut block4_by_tag: HashMap<String, Vec<usize>> = HashMap::new();

        for (i, field) in schema.fields.iter().enumerate() {
            match field.block {
                1 if field.format.kind == FormatType::Block1 => {
                    block1_def.get_or_insert(i);
                }
                2 if field.format.kind == FormatType::Block2 => {
                    block2_def.get_or_insert(i);
                }
                3 if field.format.kind == FormatType::Block3Tag
                    && field.tag.bytes().all(|b| b.is_ascii_digit()) =>
                {
                    block3_by_tag.entry(field.tag.clone()).or_default().push(i);
                }
                4 => {
                    block4_by_tag.entry(field.tag.clone()).or_default().push(i);
                }
                _ => {}
            }
        }

        MtParser {
            schema,
            block1_def,
            block2_def,
            block3_by_tag,
            block4_by_tag,
        }
    }

    /// Access the underlying schema.
    pub fn schema(&self) -> &MtSchema {
        &self.schema
    }

    /// Parse a raw MT message into its flat mapping.
    ///
    /// A single deterministic pass: blocks are extracted, headers decoded
    /// at fixed offsets, block 3 sub-fields copied in document order, and
    /// block 4 fields decoded per the schema's format handlers. Repeated
    /// tags overwrite earlier destination-key assignments.
    pub fn parse(&self, raw: &str) -> Result<MtMessage> {
        let block1 = extract_block(raw, 1)?;
        let block2 = extract_block(raw, 2)?;
        let block3 = extract_block(raw, 3)?;
        let block4 = extract_block(raw, 4)?;
        let block5 = extract_block(raw, 5)?;

        for &block in &self.schema.blocks {
            let present = match block {
                1 => block1.is_some(),
                2 => block2.is_some(),
                3 => block3.is_some(),
                4 => block4.is_some(),
                5 => block5.is_some(),
                _ => false,
            };
            if !present {
                return Err(Error::MissingRequiredBlock { block });
            }
        }

        let mut fields = FieldMap::new();
        if let Some(ref b1) = block1 {
            self.decode_block1(b1, &mut fields);
        }
        if let Some(ref b2) = block2 {
            self.decode_block2(b2, &mut fields);
        }
        if let Some(ref b3) = block3 {
            self.decode_block3(b3, &mut fields);
        }
        if let Some(ref b4) = block4 {
            self.decode_block4(b4, &mut fields);
        }
        tracing::debug!(fields = fields.len(), "parsed MT message");

        Ok(MtMessage {
            raw: raw.to_string(),
            block1,
            block2,
            block3,
            block4,
            block5,
            fields,
        })
    }

    /* ---------- block 1: fixed-offset basic header ---------- */

    fn decode_block1(&self, block: &str, fields: &mut FieldMap) {
        let Some(def) = self.block1_def.map(|i| &self.schema.fields[i]) else {
            return;
        };
        let content = block_content(block);
        if content.len() < 20 {
            return;
        }
        let (Some(app_id), Some(service_id), Some(lt_address), Some(session)) = (
            content.get(0..1),
            content.get(1..3),
            content.get(3..15),
            content.get(15..19),
        ) else {
            return;
        };
        let sequence = content.get(19..content.len().min(25)).unwrap_or("");

        put_component(fields, def, "appId", app_id);
        put_component(fields, def, "serviceId", service_id);
        put_component(fields, def, "ltAddress", lt_address);
        // BIC prefixes derived from the logical terminal address
        put_component(fields, def, "senderBic11", &lt_address[..lt_address.len().min(11)]);
        put_component(fields, def, "senderBic8", &lt_address[..lt_address.len().min(8)]);
        put_component(fields, def, "sessionNumber", session);
        put_component(fields, def, "sequenceNumber", sequence);
    }

    /* ---------- block 2: fixed-offset application header ---------- */

    fn decode_block2(&self, block: &str, fields: &mut FieldMap) {
        let Some(def) = self.block2_def.map(|i| &self.schema.fields[i]) else {
            return;
        };
        let content = block_content(block);
        let Some(direction) = content.get(0..1) else {
            return;
        };

        let msg_type = content.get(1..4);
        let (receiver_bic, priority, input_time, mir) = match direction {
            "I" => (content.get(4..16), content.get(16..17), None, None),
            "O" => (
                content.get(7..19),
                content.get(19..20),
                content.get(4..8),
                content.get(8..29),
            ),
            _ => (None, None, None, None),
        };

        put_component(fields, def, "direction", direction);
        if let Some(v) = msg_type {
            put_component(fields, def, "msgType", v);
        }
        if let Some(v) = receiver_bic {
            put_component(fields, def, "receiverBic", v);
        }
        if let Some(v) = priority {
            put_component(fields, def, "priority", v);
        }
        if let Some(v) = input_time {
            put_component(fields, def, "inputTime", v);
        }
        if let Some(v) = mir {
            put_component(fields, def, "mir", v);
        }
    }

    /* ---------- block 3: nested {tag:value} sub-fields ---------- */

    fn decode_block3(&self, block: &str, fields: &mut FieldMap) {
        let content = block_content(block);
        let mut rest = content;
        while let Some(open) = rest.find('{') {
            let Some(colon) = rest[open..].find(':').map(|i| open + i) else {
                break;
            };
            let Some(close) = rest[colon..].find('}').map(|i| colon + i) else {
                break;
            };
            let tag = &rest[open + 1..colon];
            let value = &rest[colon + 1..close];
            if let Some(defs) = self.block3_by_tag.get(tag) {
                for &i in defs {
                    // copied verbatim, no decomposition
                    if let Some(component) = self.schema.fields[i].components.first() {
                        fields.insert(component.key.as_str(), value);
                    }
                }
            }
            rest = &rest[close + 1..];
        }
    }

    /* ---------- block 4: tag-line splitting + format handlers ---------- */

    fn decode_block4(&self, block: &str, fields: &mut FieldMap) {
        let mut body = block;
        if let Some(start) = body.find("{4:") {
            body = &body[start + 3..];
        }
        if let Some(end) = body.rfind("-}") {
            body = &body[..end];
        }

        let mut parsed: Vec<(String, String)> = Vec::new();
        let mut current: Option<(String, String)> = None;
        for line in body.lines() {
            if let Some(caps) = TAG_LINE.captures(line) {
                if let Some(done) = current.take() {
                    parsed.push(done);
                }
                current = Some((caps[1].to_string(), caps[2].to_string()));
            } else if let Some((_, value)) = current.as_mut() {
                value.push('\n');
                value.push_str(line);
            }
        }
        if let Some(done) = current.take() {
            parsed.push(done);
        }
        tracing::debug!(count = parsed.len(), "split block 4 into fields");

        for (tag, value) in &parsed {
            if let Some(defs) = self.block4_by_tag.get(tag.as_str()) {
                for &i in defs {
                    decode_field(&self.schema.fields[i], value, fields);
                }
            }
        }
    }
}

/// Locate and return the full delimited span of one block.
///
/// Blocks are matched by `{`/`}` nesting depth, except block 4, whose body
/// may contain literal braces and is terminated by the literal `-}`.
/// Returns `Ok(None)` when the block marker is absent.
fn extract_block(raw: &str, id: u8) -> Result<Option<String>> {
    let marker = format!("{{{id}:");
    let Some(start) = raw.find(&marker) else {
        return Ok(None);
    };

    if id == 4 {
        return match raw[start..].find("-}") {
            Some(end) => Ok(Some(raw[start..start + end + 2].to_string())),
            None => Err(Error::MalformedBlock {
                block: 4,
                reason: "missing -} terminator".to_string(),
            }),
        };
    }

    let mut depth = 0usize;
    for (i, c) in raw[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some(raw[start..start + i + 1].to_string()));
                }
            }
            _ => {}
        }
    }
    Err(Error::MalformedBlock {
        block: id,
        reason: "unbalanced braces".to_string(),
    })
}

/// Strip the `{N:` prefix and trailing `}` of a delimited block.
fn block_content(block: &str) -> &str {
    let start = block.find(':').map_or(0, |i| i + 1);
    let end = if block.ends_with('}') {
        block.len() - 1
    } else {
        block.len()
    };
    &block[start..end]
}

fn put_component(fields: &mut FieldMap, def: &FieldSchema, name: &str, value: &str) {
    for component in &def.components {
        if component.name == name {
            fields.insert(component.key.as_str(), value);
        }
    }
}

/* ---------- format handlers ---------- */

fn decode_field(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    match def.format.kind {
        FormatType::Simple => decode_simple(def, raw, fields),
        FormatType::DateCurrencyAmount => decode_date_currency_amount(def, raw, fields),
        FormatType::CurrencyAmount => decode_currency_amount(def, raw, fields),
        FormatType::Rate => decode_rate(def, raw, fields),
        FormatType::PartyLines | FormatType::StructuredParty => {
            decode_party_lines(def, raw, fields)
        }
        FormatType::BicParty => decode_bic_party(def, raw, fields),
        FormatType::AccountParty => decode_account_party(def, raw, fields),
        FormatType::FreeTextLines | FormatType::RegulatoryLines => {
            decode_text_lines(def, raw, fields)
        }
        // header formats never occur in block 4
        FormatType::Block1 | FormatType::Block2 | FormatType::Block3Tag => {}
    }
}

fn decode_simple(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let Some(component) = def.components.first() else {
        return;
    };
    let mut value = raw.trim();
    if let Some(max) = def.format.max_length {
        if value.len() > max {
            value = value.get(..max).unwrap_or(value);
        }
    }
    fields.insert(component.key.as_str(), value);
}

fn decode_date_currency_amount(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let joined = raw.replace('\n', "");
    let v = joined.trim();
    // YYMMDD + CCY + amount; too-short values are dropped, not errors
    if v.len() < 10 {
        return;
    }
    let (Some(date), Some(ccy), Some(amount_raw)) = (v.get(0..6), v.get(6..9), v.get(9..)) else {
        return;
    };
    let amount = amount_raw.replace(',', ".");
    for component in &def.components {
        match component.name.as_str() {
            "date" => fields.insert(component.key.as_str(), date),
            "ccy" => fields.insert(component.key.as_str(), ccy),
            "amount" => fields.insert(component.key.as_str(), amount.as_str()),
            _ => {}
        }
    }
}

fn decode_currency_amount(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let joined = raw.replace('\n', "");
    let v = joined.trim();
    if v.len() < 4 {
        return;
    }
    let (Some(ccy), Some(amount_raw)) = (v.get(0..3), v.get(3..)) else {
        return;
    };
    let amount = amount_raw.replace(',', ".");
    for component in &def.components {
        match component.name.as_str() {
            "ccy" => fields.insert(component.key.as_str(), ccy),
            "amount" => fields.insert(component.key.as_str(), amount.as_str()),
            _ => {}
        }
    }
}

fn decode_rate(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let joined = raw.replace('\n', "");
    let rate = joined.trim();
    for component in &def.components {
        if component.name == "rate" {
            fields.insert(component.key.as_str(), rate);
        }
    }
}

fn decode_party_lines(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let lines: Vec<&str> = raw.lines().collect();
    let has_account = lines.first().is_some_and(|l| l.starts_with('/'));
    for component in &def.components {
        match component.name.as_str() {
            "account" => {
                if has_account {
                    fields.insert(component.key.as_str(), &lines[0][1..]);
                }
            }
            "name" => {
                let idx = if has_account { 1 } else { 0 };
                if let Some(line) = lines.get(idx) {
                    fields.insert(component.key.as_str(), *line);
                }
            }
            other => {
                if let Some(n) = other
                    .strip_prefix("address")
                    .and_then(|s| s.parse::<usize>().ok())
                {
                    // addressN follows the name line
                    let base = if has_account { 1 } else { 0 };
                    if let Some(line) = lines.get(base + 1 + n) {
                        fields.insert(component.key.as_str(), *line);
                    }
                }
            }
        }
    }
}

fn decode_bic_party(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let lines: Vec<&str> = raw.lines().collect();
    let (account, bic) = match lines.as_slice() {
        [] => (None, None),
        [only] => (None, Some(only.trim())),
        [first, second, ..] if first.starts_with('/') => {
            (Some(first[1..].trim()), Some(second.trim()))
        }
        [first, ..] => (None, Some(first.trim())),
    };
    for component in &def.components {
        match component.name.as_str() {
            "account" => {
                if let Some(account) = account {
                    fields.insert(component.key.as_str(), account);
                }
            }
            "bic" => {
                if let Some(bic) = bic {
                    fields.insert(component.key.as_str(), bic);
                }
            }
            _ => {}
        }
    }
}

fn decode_account_party(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let lines: Vec<&str> = raw.lines().collect();
    let (account, name) = match lines.as_slice() {
        [] => (None, None),
        [first, rest @ ..] if first.starts_with('/') => {
            (Some(first[1..].trim()), rest.first().map(|s| s.trim()))
        }
        [first, ..] => (None, Some(first.trim())),
    };
    for component in &def.components {
        match component.name.as_str() {
            "account" => {
                if let Some(account) = account {
                    fields.insert(component.key.as_str(), account);
                }
            }
            "name" => {
                if let Some(name) = name {
                    fields.insert(component.key.as_str(), name);
                }
            }
            _ => {}
        }
    }
}

fn decode_text_lines(def: &FieldSchema, raw: &str, fields: &mut FieldMap) {
    let lines: Vec<&str> = raw.lines().collect();
    for component in &def.components {
        if let Some(n) = component
            .name
            .strip_prefix("line")
            .and_then(|s| s.parse::<usize>().ok())
        {
            if let Some(line) = lines.get(n) {
                fields.insert(component.key.as_str(), *line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> MtSchema {
        MtSchema::from_json(
            r#"{
                "messageType": "103",
                "blocks": [1, 2, 4],
                "fields": [
                    {"tag": "B1", "block": 1, "format": {"type": "block1"}, "components": [
                        {"name": "appId", "key": "b1.appId"},
                        {"name": "ltAddress", "key": "b1.ltAddress"},
                        {"name": "senderBic11", "key": "b1.senderBic11"},
                        {"name": "senderBic8", "key": "b1.senderBic8"},
                        {"name": "sessionNumber", "key": "b1.session"},
                        {"name": "sequenceNumber", "key": "b1.sequence"}
                    ]},
                    {"tag": "B2", "block": 2, "format": {"type": "block2"}, "components": [
                        {"name": "direction", "key": "b2.direction"},
                        {"name": "msgType", "key": "b2.msgType"},
                        {"name": "receiverBic", "key": "b2.receiverBic"},
                        {"name": "priority", "key": "b2.priority"}
                    ]},
                    {"tag": "108", "block": 3, "format": {"type": "block3Tag"}, "components": [
                        {"name": "value", "key": "b3.108"}
                    ]},
                    {"tag": "121", "block": 3, "format": {"type": "block3Tag"}, "components": [
                        {"name": "value", "key": "b3.121"}
                    ]},
                    {"tag": "20", "block": 4, "mandatory": true,
                     "format": {"type": "simple", "maxLength": 16},
                     "components": [{"name": "value", "key": "b4.20"}]},
                    {"tag": "32A", "block": 4, "mandatory": true,
                     "format": {"type": "dateCurrencyAmount"},
                     "components": [
                        {"name": "date", "key": "b4.32A.date"},
                        {"name": "ccy", "key": "b4.32A.ccy"},
                        {"name": "amount", "key": "b4.32A.amount"}
                    ]},
                    {"tag": "36", "block": 4, "format": {"type": "rate"},
                     "components": [{"name": "rate", "key": "b4.36"}]},
                    {"tag": "50K", "block": 4, "format": {"type": "partyLines", "maxLines": 5},
                     "components": [
                        {"name": "account", "key": "b4.50K.account"},
                        {"name": "name", "key": "b4.50K.name"},
                        {"name": "address0", "key": "b4.50K.address0"},
                        {"name": "address1", "key": "b4.50K.address1"}
                    ]},
                    {"tag": "57A", "block": 4, "format": {"type": "bicParty"},
                     "components": [
                        {"name": "account", "key": "b4.57A.account"},
                        {"name": "bic", "key": "b4.57A.bic"}
                    ]},
                    {"tag": "59", "block": 4, "format": {"type": "accountParty"},
                     "components": [
                        {"name": "account", "key": "b4.59.account"},
                        {"name": "name", "key": "b4.59.name"}
                    ]},
                    {"tag": "70", "block": 4, "format": {"type": "freeTextLines", "maxLines": 4},
                     "components": [
                        {"name": "line0", "key": "b4.70.line0"},
                        {"name": "line1", "key": "b4.70.line1"}
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    const SAMPLE: &str = concat!(
        "{1:F01AAAAUSC0ADDD0344000050}",
        "{2:I103BBBBUSC0XFFFN}",
        "{3:{108:MUR123}{121:123e4567-e89b-12d3-a456-426614174000}}",
        "{4:\n",
        ":20:REF123456789\n",
        ":32A:250201USD1234,56\n",
        ":50K:/1234567890\n",
        "JOHN DOE\n",
        "1 MAIN STREET\n",
        "NEW YORK\n",
        ":57A:/C/0023\n",
        "SGMBMAMCFCM\n",
        ":59:/9988776655\n",
        "ACME CORP\n",
        ":70:INVOICE 987\n",
        "PART TWO\n",
        "-}"
    );

    #[test]
    fn test_block_extraction() {
        let block4 = extract_block(SAMPLE, 4).unwrap().unwrap();
        assert!(block4.starts_with("{4:"));
        assert!(block4.ends_with("-}"));
        assert!(extract_block(SAMPLE, 5).unwrap().is_none());
    }

    #[test]
    fn test_block4_requires_terminator() {
        let result = extract_block("{1:F01AAAAUSC0ADDD0344000050}{4:\n:20:X\n", 4);
        assert!(matches!(
            result,
            Err(Error::MalformedBlock { block: 4, .. })
        ));
    }

    #[test]
    fn test_missing_mandatory_block() {
        let parser = MtParser::new(test_schema());
        let result = parser.parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}");
        assert!(matches!(
            result,
            Err(Error::MissingRequiredBlock { block: 4 })
        ));
    }

    #[test]
    fn test_header_blocks() {
        let parser = MtParser::new(test_schema());
        let mt = parser.parse(SAMPLE).unwrap();

        assert_eq!(mt.fields.get("b1.appId"), Some("F"));
        assert_eq!(mt.fields.get("b1.ltAddress"), Some("AAAAUSC0ADDD"));
        assert_eq!(mt.fields.get("b1.senderBic11"), Some("AAAAUSC0ADD"));
        assert_eq!(mt.fields.get("b1.senderBic8"), Some("AAAAUSC0"));
        assert_eq!(mt.fields.get("b1.session"), Some("0344"));
        assert_eq!(mt.fields.get("b1.sequence"), Some("000050"));

        assert_eq!(mt.fields.get("b2.direction"), Some("I"));
        assert_eq!(mt.fields.get("b2.msgType"), Some("103"));
        assert_eq!(mt.fields.get("b2.receiverBic"), Some("BBBBUSC0XFFF"));
        assert_eq!(mt.fields.get("b2.priority"), Some("N"));
    }

    #[test]
    fn test_block3_order_independent() {
        let parser = MtParser::new(test_schema());
        let a = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{3:{108:ABC}{121:UUID}}{4:\n:20:R\n-}")
            .unwrap();
        let b = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{3:{121:UUID}{108:ABC}}{4:\n:20:R\n-}")
            .unwrap();
        assert_eq!(a.fields.get("b3.108"), Some("ABC"));
        assert_eq!(a.fields.get("b3.121"), Some("UUID"));
        assert_eq!(b.fields.get("b3.108"), Some("ABC"));
        assert_eq!(b.fields.get("b3.121"), Some("UUID"));
    }

    #[test]
    fn test_date_currency_amount() {
        let parser = MtParser::new(test_schema());
        let mt = parser.parse(SAMPLE).unwrap();
        assert_eq!(mt.fields.get("b4.20"), Some("REF123456789"));
        assert_eq!(mt.fields.get("b4.32A.date"), Some("250201"));
        assert_eq!(mt.fields.get("b4.32A.ccy"), Some("USD"));
        assert_eq!(mt.fields.get("b4.32A.amount"), Some("1234.56"));
    }

    #[test]
    fn test_too_short_value_is_dropped() {
        let parser = MtParser::new(test_schema());
        let mt = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{4:\n:20:R\n:32A:250201\n-}")
            .unwrap();
        assert_eq!(mt.fields.get("b4.32A.date"), None);
        assert_eq!(mt.fields.get("b4.32A.amount"), None);
    }

    #[test]
    fn test_party_lines() {
        let parser = MtParser::new(test_schema());
        let mt = parser.parse(SAMPLE).unwrap();
        assert_eq!(mt.fields.get("b4.50K.account"), Some("1234567890"));
        assert_eq!(mt.fields.get("b4.50K.name"), Some("JOHN DOE"));
        assert_eq!(mt.fields.get("b4.50K.address0"), Some("1 MAIN STREET"));
        assert_eq!(mt.fields.get("b4.50K.address1"), Some("NEW YORK"));
    }

    #[test]
    fn test_party_lines_without_account() {
        let parser = MtParser::new(test_schema());
        let mt = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{4:\n:20:R\n:50K:JANE ROE\nSOMEWHERE\n-}")
            .unwrap();
        assert_eq!(mt.fields.get("b4.50K.account"), None);
        assert_eq!(mt.fields.get("b4.50K.name"), Some("JANE ROE"));
        assert_eq!(mt.fields.get("b4.50K.address0"), Some("SOMEWHERE"));
    }

    #[test]
    fn test_bic_party() {
        let parser = MtParser::new(test_schema());
        let mt = parser.parse(SAMPLE).unwrap();
        assert_eq!(mt.fields.get("b4.57A.account"), Some("C/0023"));
        assert_eq!(mt.fields.get("b4.57A.bic"), Some("SGMBMAMCFCM"));

        let bare = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{4:\n:20:R\n:57A:BANKMAMC\n-}")
            .unwrap();
        assert_eq!(bare.fields.get("b4.57A.account"), None);
        assert_eq!(bare.fields.get("b4.57A.bic"), Some("BANKMAMC"));
    }

    #[test]
    fn test_account_party_and_text_lines() {
        let parser = MtParser::new(test_schema());
        let mt = parser.parse(SAMPLE).unwrap();
        assert_eq!(mt.fields.get("b4.59.account"), Some("9988776655"));
        assert_eq!(mt.fields.get("b4.59.name"), Some("ACME CORP"));
        assert_eq!(mt.fields.get("b4.70.line0"), Some("INVOICE 987"));
        assert_eq!(mt.fields.get("b4.70.line1"), Some("PART TWO"));
    }

    #[test]
    fn test_repeated_tag_last_write_wins() {
        let parser = MtParser::new(test_schema());
        let mt = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{4:\n:20:FIRST\n:20:SECOND\n-}")
            .unwrap();
        assert_eq!(mt.fields.get("b4.20"), Some("SECOND"));
    }

    #[test]
    fn test_simple_clips_to_max_length() {
        let parser = MtParser::new(test_schema());
        let mt = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{4:\n:20:ABCDEFGHIJKLMNOPQRSTU\n-}")
            .unwrap();
        assert_eq!(mt.fields.get("b4.20"), Some("ABCDEFGHIJKLMNOP"));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = MtParser::new(test_schema());
        let a = parser.parse(SAMPLE).unwrap();
        let b = parser.parse(SAMPLE).unwrap();
        assert_eq!(a, b);
        let keys_a: Vec<&str> = a.fields.iter().map(|(k, _)| k).collect();
        let keys_b: Vec<&str> = b.fields.iter().map(|(k, _)| k).collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn test_crlf_line_endings() {
        let parser = MtParser::new(test_schema());
        let mt = parser
            .parse("{1:F01AAAAUSC0ADDD0344000050}{2:I103BBBBUSC0XFFFN}{4:\r\n:20:REF\r\n:50K:/42\r\nJOHN\r\n-}")
            .unwrap();
        assert_eq!(mt.fields.get("b4.20"), Some("REF"));
        assert_eq!(mt.fields.get("b4.50K.account"), Some("42"));
        assert_eq!(mt.fields.get("b4.50K.name"), Some("JOHN"));
    }
}
