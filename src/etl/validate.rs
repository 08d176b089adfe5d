use jsonschema::Validator;
use serde_json::Value;

use crate::data::ShapedElement;
use crate::errors::{Error, ErrorKind, Result};

const NODE_SCHEMA: &str = include_str!("../../schema/node.json");
const WAY_SCHEMA: &str = include_str!("../../schema/way.json");

/// Checks shaped elements against the JSON schemas in `schema/`.
///
/// Roughly an order of magnitude slower than shaping alone, so meant for
/// sample extracts rather than full planet files.
pub struct SchemaValidator {
    node: Validator,
    way: Validator,
}

impl SchemaValidator {
    pub fn new() -> Result<SchemaValidator> {
        Ok(SchemaValidator {
            node: Self::compile("node", NODE_SCHEMA)?,
            way: Self::compile("way", WAY_SCHEMA)?,
        })
    }

    fn compile(name: &str, source: &str) -> Result<Validator> {
        let schema: Value = serde_json::from_str(source)
            .map_err(|e| Error::new(ErrorKind::Config, format!("invalid {name} schema JSON: {e}")))?;
        Validator::new(&schema)
            .map_err(|e| Error::new(ErrorKind::Config, format!("could not compile {name} schema: {e}")))
    }

    /// Fails with [`ErrorKind::SchemaViolation`] naming the first sub-record
    /// (`node`, `way_tags`, ...) that does not conform, together with every
    /// field-level error found in that sub-record.
    pub fn validate(&self, element: &ShapedElement) -> Result<()> {
        let validator = match element {
            ShapedElement::Node { .. } => &self.node,
            ShapedElement::Way { .. } => &self.way,
        };
        let instance = serde_json::to_value(element)?;

        let errors: Vec<(String, String)> = validator.iter_errors(&instance)
            .map(|error| (error.instance_path().to_string(), error.to_string()))
            .collect();
        let Some((first_path, _)) = errors.first() else {
            return Ok(());
        };

        let sub_record = sub_record_of(first_path).to_string();
        let details: Vec<String> = errors.iter()
            .filter(|(path, _)| sub_record_of(path) == sub_record)
            .map(|(path, message)| format!("  {}: {}", display_path(path), message))
            .collect();

        Err(Error::schema_violation(format!(
            "Element of type '{}' has the following errors:\n{}",
            sub_record,
            details.join("\n"),
        )))
    }
}

/// First segment of a JSON pointer, e.g. `way_nodes` for `/way_nodes/2/node_id`.
fn sub_record_of(pointer: &str) -> &str {
    match pointer.trim_start_matches('/').split('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => "element",
    }
}

fn display_path(pointer: &str) -> &str {
    if pointer.is_empty() { "/" } else { pointer }
}
