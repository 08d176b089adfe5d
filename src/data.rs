use std::borrow::Cow;

use serde::Serialize;

use self::osm::{Attributes, Tag, WayNode};

pub mod osm;

/// Output table with its column order. The order must match the column order
/// of the SQL tables the CSVs are bulk-loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const NODES: TableSpec = TableSpec {
    name: "nodes",
    columns: &["id", "lat", "lon", "user", "uid", "version", "changeset", "timestamp"],
};

pub const NODE_TAGS: TableSpec = TableSpec {
    name: "nodes_tags",
    columns: &["id", "key", "value", "type"],
};

pub const WAYS: TableSpec = TableSpec {
    name: "ways",
    columns: &["id", "user", "uid", "version", "changeset", "timestamp"],
};

pub const WAY_NODES: TableSpec = TableSpec {
    name: "ways_nodes",
    columns: &["id", "node_id", "position"],
};

pub const WAY_TAGS: TableSpec = TableSpec {
    name: "ways_tags",
    columns: &["id", "key", "value", "type"],
};

pub const DEFAULT_TAG_TYPE: &str = "regular";

/// Anything that can be written as a CSV row, looked up column by column.
pub trait Row {
    fn column(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Table-ready form of one node or way.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ShapedElement {
    Node {
        node: Attributes,
        node_tags: Vec<Tag>,
    },
    Way {
        way: Attributes,
        way_nodes: Vec<WayNode>,
        way_tags: Vec<Tag>,
    },
}
