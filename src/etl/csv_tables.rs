use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::{Terminator, WriterBuilder};

use crate::data::{Row, ShapedElement, TableSpec, NODES, NODE_TAGS, WAYS, WAY_NODES, WAY_TAGS};
use crate::errors::{Error, ErrorKind, Result};
use crate::OutputPaths;

/// One output CSV. The header comes from `spec.columns` and every row is laid
/// out by looking those same columns up on the row value.
pub struct TableWriter<W: Write> {
    spec: TableSpec,
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> TableWriter<W> {
    pub fn new(spec: TableSpec, inner: W) -> Result<TableWriter<W>> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(inner);
        writer.write_record(spec.columns)?;
        Ok(TableWriter { spec, writer, rows: 0 })
    }

    pub fn append<R: Row>(&mut self, row: &R) -> Result<()> {
        let mut record = Vec::with_capacity(self.spec.columns.len());
        for column in self.spec.columns {
            let value = row.column(column).ok_or_else(|| Error::new(
                ErrorKind::Csv,
                format!("{} row has no value for column '{}'", self.spec.name, column),
            ))?;
            record.push(value);
        }
        self.writer.write_record(record.iter().map(|value| value.as_bytes()))?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Row counts per table after a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub nodes: u64,
    pub node_tags: u64,
    pub ways: u64,
    pub way_nodes: u64,
    pub way_tags: u64,
}

/// The five tables a map is flattened into.
pub struct OsmTables<W: Write> {
    nodes: TableWriter<W>,
    node_tags: TableWriter<W>,
    ways: TableWriter<W>,
    way_nodes: TableWriter<W>,
    way_tags: TableWriter<W>,
}

impl OsmTables<File> {
    pub fn create(outputs: &OutputPaths) -> Result<OsmTables<File>> {
        Ok(OsmTables {
            nodes: TableWriter::new(NODES, create_file(&outputs.nodes)?)?,
            node_tags: TableWriter::new(NODE_TAGS, create_file(&outputs.node_tags)?)?,
            ways: TableWriter::new(WAYS, create_file(&outputs.ways)?)?,
            way_nodes: TableWriter::new(WAY_NODES, create_file(&outputs.way_nodes)?)?,
            way_tags: TableWriter::new(WAY_TAGS, create_file(&outputs.way_tags)?)?,
        })
    }
}

fn create_file(path: &str) -> Result<File> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

impl<W: Write> OsmTables<W> {
    pub fn write(&mut self, element: &ShapedElement) -> Result<()> {
        match element {
            ShapedElement::Node { node, node_tags } => {
                self.nodes.append(node)?;
                for tag in node_tags {
                    self.node_tags.append(tag)?;
                }
            },
            ShapedElement::Way { way, way_nodes, way_tags } => {
                self.ways.append(way)?;
                for way_node in way_nodes {
                    self.way_nodes.append(way_node)?;
                }
                for tag in way_tags {
                    self.way_tags.append(tag)?;
                }
            },
        }
        Ok(())
    }

    pub fn counts(&self) -> TableCounts {
        TableCounts {
            nodes: self.nodes.rows(),
            node_tags: self.node_tags.rows(),
            ways: self.ways.rows(),
            way_nodes: self.way_nodes.rows(),
            way_tags: self.way_tags.rows(),
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.nodes.flush()?;
        self.node_tags.flush()?;
        self.ways.flush()?;
        self.way_nodes.flush()?;
        self.way_tags.flush()?;
        Ok(())
    }
}
