//! Hierarchical KML: every `Folder` (or, failing that, every `Document`) becomes
//! one category, and the Placemarks below it become features of that category.

use super::{is_point, Batch};
use crate::category::{Category, DEFAULT_ICON_COLOR, UNSTYLED_COLOR};
use crate::error::ParseError;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use roxmltree::{Document, Node};

/// Parse a KML document into one batch per container
pub fn parse(content: &str) -> Result<Vec<Batch>, ParseError> {
    let doc = Document::parse(content)?;

    let mut containers: Vec<Node> = elements(doc.root(), "Folder").collect();
    if containers.is_empty() {
        containers = elements(doc.root(), "Document").collect();
    }
    if containers.is_empty() {
        return Err(ParseError::UnrecognizedShape);
    }

    containers
        .into_iter()
        .map(|container| {
            let category = read_category(container, &doc)?;
            convert_container(container, category)
        })
        .collect()
}

/// Derive the category of a container: its own `<name>` and the icon color of
/// the "normal" entry of the style map it references.
pub fn read_category(container: Node, doc: &Document) -> Result<Category, ParseError> {
    let name = child(container, "name")
        .map(text_content)
        .ok_or_else(|| ParseError::MissingName(container.tag_name().name().to_string()))?;

    Ok(Category {
        name,
        color: Some(resolve_color(container, doc)),
        // Icon URLs are not extracted from KML styles.
        icon_url: None,
        ..Default::default()
    })
}

fn resolve_color(container: Node, doc: &Document) -> String {
    let Some(style_url) = elements(container, "styleUrl").next().map(key_text) else {
        return UNSTYLED_COLOR.to_string();
    };
    let pairs: Vec<Node> = match find_by_url(doc, &style_url) {
        Some(style_map) => elements(style_map, "Pair").collect(),
        None => Vec::new(),
    };

    let mut color = UNSTYLED_COLOR.to_string();
    for pair in pairs {
        if child(pair, "key").map(key_text).as_deref() == Some("normal") {
            color = normal_icon_color(pair, doc).unwrap_or_else(|| DEFAULT_ICON_COLOR.to_string());
        }
    }
    color
}

/// Follow a style-map pair to its concrete style and read `IconStyle/color`
fn normal_icon_color(pair: Node, doc: &Document) -> Option<String> {
    let style_url = child(pair, "styleUrl").map(key_text)?;
    let style = find_by_url(doc, &style_url)?;
    let icon_style = elements(style, "IconStyle").next()?;
    let color = elements(icon_style, "color").next().map(key_text)?;
    if color.is_empty() {
        return None;
    }
    Some(format!("#{color}"))
}

fn find_by_url<'a, 'input>(doc: &'a Document<'input>, url: &str) -> Option<Node<'a, 'input>> {
    let id = url.rsplit('#').next()?.trim();
    if id.is_empty() {
        return None;
    }
    doc.descendants()
        .find(|n| n.is_element() && n.attribute("id") == Some(id))
}

fn convert_container(container: Node, category: Category) -> Result<Batch, ParseError> {
    let mut features = Vec::new();
    for placemark in elements(container, "Placemark") {
        if let Some(feature) = placemark_feature(placemark)? {
            features.push(feature);
        }
    }

    if features.len() == 1 && is_point(&features[0]) {
        let feature = features.remove(0);
        return Ok(Batch::Single(feature, category));
    }
    Ok(Batch::Collection(
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
        category,
    ))
}

/// Placemarks without a geometry are dropped
fn placemark_feature(placemark: Node) -> Result<Option<Feature>, ParseError> {
    let Some(geometry) = placemark
        .children()
        .find(|n| is_geometry(n))
        .map(convert_geometry)
        .transpose()?
    else {
        return Ok(None);
    };

    let mut properties = JsonObject::new();
    for tag in ["name", "description", "address", "styleUrl"] {
        if let Some(node) = child(placemark, tag) {
            properties.insert(tag.to_string(), JsonValue::String(text_content(node)));
        }
    }
    for data in elements(placemark, "Data") {
        if let Some(key) = data.attribute("name") {
            let value = child(data, "value").map(text_content).unwrap_or_default();
            properties.insert(key.to_string(), JsonValue::String(value));
        }
    }

    Ok(Some(Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }))
}

fn is_geometry(node: &Node) -> bool {
    ["Point", "LineString", "LinearRing", "Polygon", "MultiGeometry"]
        .iter()
        .any(|tag| node.has_tag_name(*tag))
}

fn convert_geometry(node: Node) -> Result<Geometry, ParseError> {
    let value = match node.tag_name().name() {
        "Point" => {
            let coords = coordinates(node)?;
            let first = coords
                .into_iter()
                .next()
                .ok_or_else(|| ParseError::Coordinates(String::new()))?;
            Value::Point(first)
        }
        "LineString" | "LinearRing" => Value::LineString(coordinates(node)?),
        "Polygon" => {
            let mut rings = Vec::new();
            for boundary in ["outerBoundaryIs", "innerBoundaryIs"] {
                for b in node.children().filter(|n| n.has_tag_name(boundary)) {
                    for ring in elements(b, "LinearRing") {
                        rings.push(coordinates(ring)?);
                    }
                }
            }
            Value::Polygon(rings)
        }
        _ => {
            let mut members = Vec::new();
            flatten_members(node, &mut members)?;
            if members.len() == 1 {
                return Ok(members.remove(0));
            }
            Value::GeometryCollection(members)
        }
    };
    Ok(Geometry::new(value))
}

/// Members of a MultiGeometry, with nested MultiGeometries spliced in
fn flatten_members(node: Node, members: &mut Vec<Geometry>) -> Result<(), ParseError> {
    for member in node.children().filter(is_geometry) {
        if member.has_tag_name("MultiGeometry") {
            flatten_members(member, members)?;
        } else {
            members.push(convert_geometry(member)?);
        }
    }
    Ok(())
}

/// Parse the `<coordinates>` child: whitespace separated `lng,lat[,alt]` tuples
fn coordinates(node: Node) -> Result<Vec<Vec<f64>>, ParseError> {
    let text = child(node, "coordinates").map(text_content).unwrap_or_default();
    text.split_whitespace()
        .map(|tuple| {
            let position: Vec<f64> = tuple
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| ParseError::Coordinates(tuple.to_string()))?;
            if position.len() < 2 {
                return Err(ParseError::Coordinates(tuple.to_string()));
            }
            Ok(position)
        })
        .collect()
}

/// All descendant elements (including `node` itself) with the given local name
fn elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants().filter(move |n| n.has_tag_name(tag))
}

fn child<'a, 'input: 'a>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

/// Concatenated text of all descendants, whitespace kept
fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Text used as a lookup key (style ids, pair keys, colors)
fn key_text(node: Node) -> String {
    text_content(node).trim().to_string()
}
