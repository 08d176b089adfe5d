use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{ChildElement, SourceElement};
use crate::errors::{Error, ErrorKind, Result};

/// Opens an `.osm` file, or an `.osm.xz` file which is decompressed on the fly.
pub fn create_osm_reader(path: &Path) -> Result<Reader<Box<dyn BufRead>>> {
    let file = fs::File::open(path)?;
    let file_reader = BufReader::new(file);
    let inner: Box<dyn BufRead> = if path.extension() == Some(OsStr::new("xz")) {
        Box::new(BufReader::new(XzDecoder::new(file_reader)))
    } else {
        Box::new(file_reader)
    };
    Ok(osm_reader(inner))
}

pub fn osm_reader<R: BufRead>(inner: R) -> Reader<R> {
    let mut reader = Reader::from_reader(inner);
    reader.trim_text(true);
    reader
}

/// Pulls top-level elements with one of the `wanted` tag names out of an OSM
/// document, one at a time. Children are captured one level deep, which is
/// all nodes and ways have.
pub struct ElementStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    wanted: &'static [&'static str],
    current: Option<SourceElement>,
    // Open child elements below `current`.
    depth: usize,
    // Open elements outside `current`, e.g. the `<osm>` root or a relation.
    open: Vec<String>,
    done: bool,
}

impl<R: BufRead> ElementStream<R> {
    pub fn new(reader: Reader<R>, wanted: &'static [&'static str]) -> ElementStream<R> {
        ElementStream {
            reader,
            buf: Vec::new(),
            wanted,
            current: None,
            depth: 0,
            open: Vec::new(),
            done: false,
        }
    }

    fn parse_attributes(el: &BytesStart) -> Result<HashMap<String, String>> {
        let mut attributes = HashMap::new();
        for attribute_res in el.attributes() {
            let attribute = attribute_res?;
            let key = str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = attribute.unescape_value()?.into_owned();
            attributes.insert(key, value);
        }
        Ok(attributes)
    }

    fn parse_element(el: &BytesStart) -> Result<SourceElement> {
        Ok(SourceElement {
            name: str::from_utf8(el.name().as_ref())?.to_string(),
            attributes: Self::parse_attributes(el)?,
            children: Vec::new(),
        })
    }

    fn parse_child(el: &BytesStart) -> Result<ChildElement> {
        Ok(ChildElement {
            name: str::from_utf8(el.name().as_ref())?.to_string(),
            attributes: Self::parse_attributes(el)?,
        })
    }

    fn is_wanted(wanted: &[&str], el: &BytesStart) -> bool {
        let name = el.name();
        wanted.iter().any(|tag_name| tag_name.as_bytes() == name.as_ref())
    }

    fn next_element(&mut self) -> Result<Option<SourceElement>> {
        loop {
            // Nothing borrowed from the previous event survives this point.
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Eof => {
                    let unclosed = self.current.as_ref()
                        .map(|current| current.name.as_str())
                        .or(self.open.last().map(String::as_str));
                    return match unclosed {
                        Some(name) => Err(Error::new(ErrorKind::Xml, format!(
                            "unexpected end of file inside <{name}> element"
                        ))),
                        None => Ok(None),
                    };
                },
                Event::Start(e) => {
                    if let Some(current) = self.current.as_mut() {
                        if self.depth == 0 {
                            current.children.push(Self::parse_child(&e)?);
                        }
                        self.depth += 1;
                    } else if Self::is_wanted(self.wanted, &e) {
                        self.current = Some(Self::parse_element(&e)?);
                        self.depth = 0;
                    } else {
                        self.open.push(str::from_utf8(e.name().as_ref())?.to_string());
                    }
                },
                Event::Empty(e) => {
                    if let Some(current) = self.current.as_mut() {
                        if self.depth == 0 {
                            current.children.push(Self::parse_child(&e)?);
                        }
                    } else if Self::is_wanted(self.wanted, &e) {
                        return Ok(Some(Self::parse_element(&e)?));
                    }
                },
                Event::End(_e) => {
                    if self.current.is_some() {
                        if self.depth == 0 {
                            return Ok(self.current.take());
                        }
                        self.depth -= 1;
                    } else {
                        self.open.pop();
                    }
                },
                // Declarations, comments and whitespace carry nothing we need.
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementStream<R> {
    type Item = Result<SourceElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            },
            Err(err) => {
                self.done = true;
                Some(Err(err))
            },
        }
    }
}
