use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::data::Row;
use crate::errors::{Error, Result};

/// OSM ids are carried verbatim as they appear in the source attributes.
pub type OsmId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
}

impl ElementKind {
    pub fn from_tag_name(name: &str) -> Option<ElementKind> {
        match name {
            "node" => Some(ElementKind::Node),
            "way" => Some(ElementKind::Way),
            _ => None,
        }
    }
}

/// Direct child of a node or way, e.g. `<tag k=".." v=".."/>` or `<nd ref=".."/>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildElement {
    pub name: String,
    pub attributes: HashMap<String, String>,
}

/// One top-level element as handed over by the OSM reader. Owns all of its
/// data, nothing points back into the reader's buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceElement {
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub children: Vec<ChildElement>,
}

impl SourceElement {
    pub fn attribute(&self, field: &str) -> Result<&str> {
        self.attributes
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| Error::malformed(format!(
                "<{}> element is missing required attribute '{}'", self.name, field
            )))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ChildElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }
}

impl ChildElement {
    pub fn attribute(&self, field: &str) -> Result<&str> {
        self.attributes
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| Error::malformed(format!(
                "<{}> child is missing required attribute '{}'", self.name, field
            )))
    }
}

/// Attribute subset of a node or way, keyed by field name.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct Attributes(pub BTreeMap<String, String>);

impl Attributes {
    /// Copies exactly `fields` out of the element, failing on the first absent one.
    pub fn extract(element: &SourceElement, fields: &[&str]) -> Result<Attributes> {
        let mut attributes = BTreeMap::new();
        for field in fields {
            attributes.insert(field.to_string(), element.attribute(field)?.to_string());
        }
        Ok(Attributes(attributes))
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl Row for Attributes {
    fn column(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(Cow::Borrowed)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: OsmId,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub tag_type: String,
}

impl Row for Tag {
    fn column(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "id" => Some(Cow::Borrowed(&self.id)),
            "key" => Some(Cow::Borrowed(&self.key)),
            "value" => Some(Cow::Borrowed(&self.value)),
            "type" => Some(Cow::Borrowed(&self.tag_type)),
            _ => None,
        }
    }
}

/// A way's reference to one of its nodes, `position` being the zero-based
/// index among the way's `nd` children.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct WayNode {
    pub id: OsmId,
    pub node_id: OsmId,
    pub position: usize,
}

impl Row for WayNode {
    fn column(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "id" => Some(Cow::Borrowed(&self.id)),
            "node_id" => Some(Cow::Borrowed(&self.node_id)),
            "position" => Some(Cow::Owned(self.position.to_string())),
            _ => None,
        }
    }
}
