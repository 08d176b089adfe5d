use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use log::info;

use crate::UserConfig;
use crate::data::osm::SourceElement;
use crate::data::{ShapedElement, NODES, WAYS};
use crate::errors::Result;

use super::csv_tables::OsmTables;
use super::read_osm::{create_osm_reader, ElementStream};
use super::shape::shape_element;
use super::validate::SchemaValidator;
use super::Etl;

pub const ETL_NAME: &str = "osm_to_csv";

/// Relations and the document root never reach the shaper.
const ELEMENTS_OF_INTEREST: &[&str] = &["node", "way"];

/// Flattens an `.osm` export into the nodes, nodes_tags, ways, ways_nodes
/// and ways_tags CSVs. With `validate` set every shaped element is checked
/// against the schema first and the first violation aborts the run.
pub struct OsmToCsvEtl<'a> {
    config: &'a UserConfig,
    validator: Option<SchemaValidator>,
}

impl OsmToCsvEtl<'_> {
    pub fn new(config: &UserConfig) -> Result<OsmToCsvEtl<'_>> {
        let validator = if config.validate {
            Some(SchemaValidator::new()?)
        } else {
            None
        };
        Ok(OsmToCsvEtl {
            config,
            validator,
        })
    }
}

impl Etl for OsmToCsvEtl<'_> {
    type Input = SourceElement;
    type Output = ShapedElement;
    type Source = ElementStream<Box<dyn BufRead>>;
    type Sink = OsmTables<File>;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<Self::Source> {
        let reader = create_osm_reader(Path::new(&self.config.input_path))?;
        Ok(ElementStream::new(reader, ELEMENTS_OF_INTEREST))
    }

    fn open_sink(&mut self) -> Result<Self::Sink> {
        OsmTables::create(&self.config.outputs)
    }

    fn transform(&mut self, input: SourceElement) -> Result<Option<ShapedElement>> {
        let shaped = shape_element(&input, NODES.columns, WAYS.columns)?;
        if let (Some(validator), Some(element)) = (&self.validator, &shaped) {
            validator.validate(element)?;
        }
        Ok(shaped)
    }

    fn load(&mut self, sink: &mut Self::Sink, output: ShapedElement) -> Result<()> {
        sink.write(&output)
    }

    fn close_sink(&mut self, mut sink: Self::Sink) -> Result<()> {
        sink.flush()?;
        let counts = sink.counts();
        info!(
            etl_name = ETL_NAME,
            nodes = counts.nodes,
            nodes_tags = counts.node_tags,
            ways = counts.ways,
            ways_nodes = counts.way_nodes,
            ways_tags = counts.way_tags;
            "Rows written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;
    use crate::errors::ErrorKind;
    use crate::OutputPaths;

    const LOUISVILLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <bounds minlat="38.0" minlon="-86.0" maxlat="39.0" maxlon="-85.0"/>
  <node id="1" lat="38.25" lon="-85.75" user="alice" uid="9" version="2" changeset="100" timestamp="2020-01-01T00:00:00Z">
    <tag k="highway" v="residential"/>
  </node>
  <node id="7" lat="38.26" lon="-85.76" user="alice" uid="9" version="1" changeset="101" timestamp="2020-01-02T00:00:00Z">
    <tag k="addr:street" v="Main St"/>
    <tag k="note,extra" v="dropped"/>
  </node>
  <way id="5" user="bob" uid="3" version="1" changeset="7" timestamp="2021-05-05T10:00:00Z">
    <nd ref="10"/>
    <nd ref="20"/>
    <nd ref="30"/>
    <tag k="building" v="yes"/>
    <tag k="name:en:old" v="Old Mill"/>
  </way>
  <relation id="8" user="bob" uid="3" version="1" changeset="7" timestamp="2021-05-05T10:00:00Z">
    <member type="way" ref="5" role="outer"/>
    <tag k="type" v="multipolygon"/>
  </relation>
</osm>
"#;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn config(&self, osm: &str, validate: bool) -> UserConfig {
            let input = self.dir.path().join("map.osm");
            fs::write(&input, osm).unwrap();
            let out = |name: &str| self.path(name).to_string_lossy().into_owned();
            UserConfig {
                input_path: input.to_string_lossy().into_owned(),
                outputs: OutputPaths {
                    nodes: out("nodes.csv"),
                    node_tags: out("nodes_tags.csv"),
                    ways: out("ways.csv"),
                    way_nodes: out("ways_nodes.csv"),
                    way_tags: out("ways_tags.csv"),
                },
                validate,
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join("csv").join(name)
        }

        fn read(&self, name: &str) -> String {
            fs::read_to_string(self.path(name)).unwrap()
        }
    }

    #[fixture]
    fn workspace() -> Workspace {
        Workspace { dir: tempfile::tempdir().unwrap() }
    }

    fn run(config: &UserConfig) -> Result<()> {
        OsmToCsvEtl::new(config)?.process()
    }

    #[rstest]
    #[case(false)]
    #[case(true)]
    fn writes_all_five_tables(workspace: Workspace, #[case] validate: bool) {
        run(&workspace.config(LOUISVILLE, validate)).unwrap();

        assert_eq!(workspace.read("nodes.csv"), "\
id,lat,lon,user,uid,version,changeset,timestamp
1,38.25,-85.75,alice,9,2,100,2020-01-01T00:00:00Z
7,38.26,-85.76,alice,9,1,101,2020-01-02T00:00:00Z
");
        assert_eq!(workspace.read("nodes_tags.csv"), "\
id,key,value,type
1,highway,residential,regular
7,street,Main St,addr
");
        assert_eq!(workspace.read("ways.csv"), "\
id,user,uid,version,changeset,timestamp
5,bob,3,1,7,2021-05-05T10:00:00Z
");
        assert_eq!(workspace.read("ways_nodes.csv"), "\
id,node_id,position
5,10,0
5,20,1
5,30,2
");
        assert_eq!(workspace.read("ways_tags.csv"), "\
id,key,value,type
5,building,yes,regular
5,en:old,Old Mill,name
");
    }

    #[rstest]
    fn reruns_are_byte_identical(workspace: Workspace) {
        let config = workspace.config(LOUISVILLE, false);
        let names = ["nodes.csv", "nodes_tags.csv", "ways.csv", "ways_nodes.csv", "ways_tags.csv"];

        run(&config).unwrap();
        let first: Vec<_> = names.iter().map(|name| fs::read(workspace.path(name)).unwrap()).collect();
        run(&config).unwrap();
        let second: Vec<_> = names.iter().map(|name| fs::read(workspace.path(name)).unwrap()).collect();

        assert_eq!(first, second);
    }

    #[rstest]
    fn empty_map_writes_headers_only(workspace: Workspace) {
        run(&workspace.config(r#"<osm version="0.6"></osm>"#, false)).unwrap();
        assert_eq!(workspace.read("ways_nodes.csv"), "id,node_id,position\n");
        assert_eq!(workspace.read("nodes.csv"), "id,lat,lon,user,uid,version,changeset,timestamp\n");
    }

    #[rstest]
    fn missing_attribute_aborts_and_keeps_earlier_rows(workspace: Workspace) {
        let osm = r#"<osm>
  <node id="1" lat="38.25" lon="-85.75" user="alice" uid="9" version="2" changeset="100" timestamp="2020-01-01T00:00:00Z"/>
  <node id="2" lat="38.5" user="alice" uid="9" version="1" changeset="100" timestamp="2020-01-01T00:00:00Z"/>
  <node id="3" lat="38.5" lon="-85.5" user="alice" uid="9" version="1" changeset="100" timestamp="2020-01-01T00:00:00Z"/>
</osm>"#;
        let err = run(&workspace.config(osm, false)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedElement);
        assert!(err.message.contains("lon"));

        let nodes = workspace.read("nodes.csv");
        assert_eq!(nodes.lines().count(), 2);
        assert!(nodes.lines().nth(1).unwrap().starts_with("1,"));
    }

    #[rstest]
    fn validation_failure_aborts_run(workspace: Workspace) {
        let osm = r#"<osm>
  <node id="1" lat="38.25" lon="-85.75" user="alice" uid="nine" version="2" changeset="100" timestamp="2020-01-01T00:00:00Z"/>
  <node id="2" lat="38.5" lon="-85.5" user="alice" uid="9" version="1" changeset="100" timestamp="2020-01-01T00:00:00Z"/>
</osm>"#;
        let err = run(&workspace.config(osm, true)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SchemaViolation);
        assert!(err.message.contains("'node'"));
        assert!(err.message.contains("/node/uid"));
        assert_eq!(workspace.read("nodes.csv").lines().count(), 1);
    }

    #[rstest]
    fn same_input_passes_without_validation(workspace: Workspace) {
        let osm = r#"<osm>
  <node id="1" lat="38.25" lon="-85.75" user="alice" uid="nine" version="2" changeset="100" timestamp="2020-01-01T00:00:00Z"/>
</osm>"#;
        run(&workspace.config(osm, false)).unwrap();
        assert!(workspace.read("nodes.csv").contains(",nine,"));
    }

    #[rstest]
    fn truncated_download_fails_the_run(workspace: Workspace) {
        let cut = LOUISVILLE.find("    <nd ref=\"30\"/>").unwrap();
        let err = run(&workspace.config(&LOUISVILLE[..cut], false)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Xml);
        assert!(err.message.contains("<way>"));

        assert_eq!(workspace.read("nodes.csv").lines().count(), 3);
        assert_eq!(workspace.read("ways_nodes.csv"), "id,node_id,position\n");
    }

    #[rstest]
    fn missing_input_is_an_io_error(workspace: Workspace) {
        let mut config = workspace.config("", false);
        config.input_path = workspace.dir.path().join("absent.osm").to_string_lossy().into_owned();
        assert_eq!(run(&config).unwrap_err().kind, ErrorKind::Io);
    }
}
