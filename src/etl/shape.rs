use crate::data::osm::{Attributes, ElementKind, SourceElement, Tag, WayNode};
use crate::data::ShapedElement;
use crate::errors::Result;

use super::tag_classifier::{classify, has_problem_chars};

/// Turns one OSM element into its table-ready form.
///
/// Returns `Ok(None)` for anything that is neither a node nor a way. Missing
/// required attributes are errors; tags whose key contains problem
/// characters are dropped without a trace.
pub fn shape_element(
    element: &SourceElement,
    node_attr_fields: &[&str],
    way_attr_fields: &[&str],
) -> Result<Option<ShapedElement>> {
    let kind = match ElementKind::from_tag_name(&element.name) {
        Some(kind) => kind,
        None => return Ok(None),
    };

    let shaped = match kind {
        ElementKind::Node => {
            let node = Attributes::extract(element, node_attr_fields)?;
            let node_tags = shape_tags(element)?;
            ShapedElement::Node { node, node_tags }
        },
        ElementKind::Way => {
            let way = Attributes::extract(element, way_attr_fields)?;
            let way_nodes = shape_way_nodes(element)?;
            let way_tags = shape_tags(element)?;
            ShapedElement::Way { way, way_nodes, way_tags }
        },
    };
    Ok(Some(shaped))
}

fn shape_way_nodes(element: &SourceElement) -> Result<Vec<WayNode>> {
    let id = element.attribute("id")?;
    element.children_named("nd")
        .enumerate()
        .map(|(position, nd)| -> Result<WayNode> {
            Ok(WayNode {
                id: id.to_string(),
                node_id: nd.attribute("ref")?.to_string(),
                position,
            })
        })
        .collect()
}

fn shape_tags(element: &SourceElement) -> Result<Vec<Tag>> {
    let id = element.attribute("id")?;
    let mut tags = Vec::new();

    for tag in element.children_named("tag") {
        let raw_key = tag.attribute("k")?;
        let value = tag.attribute("v")?;

        if has_problem_chars(raw_key) {
            continue;
        }

        let class = classify(raw_key);
        tags.push(Tag {
            id: id.to_string(),
            key: class.key.to_string(),
            value: value.to_string(),
            tag_type: class.tag_type.to_string(),
        });
    }
    Ok(tags)
}
