//! Vector tag icons.
//!
//! Icons are small SVG files authored on a `svg_icon_size` square. Elements
//! with `class="fill"` are filled, elements with `class="stroke"` (or no class)
//! are outlined; every other style detail comes from the active theme.

use crate::tags::catalog::{IconType, TagCatalog};
use anyhow::{anyhow, Context, Result};
use kurbo::{BezPath, Ellipse, Shape};
use roxmltree::Node;
use std::collections::HashMap;
use std::path::Path;

const ELLIPSE_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIcon {
    pub stroke: BezPath,
    pub fill: BezPath,
}

impl VectorIcon {
    pub fn is_empty(&self) -> bool {
        self.stroke.elements().is_empty() && self.fill.elements().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Stroke,
    Fill,
}

pub fn parse_vector_icon(svg: &str) -> Result<VectorIcon> {
    let doc = roxmltree::Document::parse(svg).context("parse icon XML")?;
    let root = doc
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "svg")
        .ok_or_else(|| anyhow!("icon has no <svg> element"))?;

    let mut icon = VectorIcon::default();
    process_element(root, &mut icon, None);
    Ok(icon)
}

// The chosen target carries over to later siblings that have no class.
fn process_element(node: Node<'_, '_>, icon: &mut VectorIcon, mut current: Option<Target>) {
    for child in node.children().filter(Node::is_element) {
        match child.attribute("class") {
            Some("fill") => current = Some(Target::Fill),
            Some("stroke") => current = Some(Target::Stroke),
            _ => {}
        }
        let target = *current.get_or_insert(Target::Stroke);

        let sub_path = match child.tag_name().name() {
            "style" => None,
            "g" => {
                process_element(child, icon, Some(target));
                None
            }
            "path" => {
                let data = child.attribute("d").unwrap_or_default();
                match BezPath::from_svg(data) {
                    Ok(path) => Some(path),
                    Err(err) => {
                        tracing::warn!(error = %err, "skipping icon path with invalid data");
                        None
                    }
                }
            }
            "line" => {
                let mut path = BezPath::new();
                path.move_to((number(child, "x1"), number(child, "y1")));
                path.line_to((number(child, "x2"), number(child, "y2")));
                Some(path)
            }
            "ellipse" => {
                let ellipse = Ellipse::new(
                    (number(child, "cx"), number(child, "cy")),
                    (number(child, "rx"), number(child, "ry")),
                    0.0,
                );
                Some(ellipse.to_path(ELLIPSE_TOLERANCE))
            }
            other => {
                tracing::warn!(element = other, "icon element is not supported");
                None
            }
        };

        if let Some(sub_path) = sub_path {
            let dest = match target {
                Target::Stroke => &mut icon.stroke,
                Target::Fill => &mut icon.fill,
            };
            dest.extend(sub_path.elements().iter().copied());
        }
    }
}

fn number(node: Node<'_, '_>, name: &str) -> f64 {
    node.attribute(name)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parsed vector icons keyed by tag key.
#[derive(Debug, Clone, Default)]
pub struct IconSet {
    icons: HashMap<String, VectorIcon>,
}

impl IconSet {
    /// Loads every `local_svg` icon named by the catalog. `icon_id` is resolved
    /// against `root`. Icons that cannot be read or parsed are logged and left out.
    pub fn load(catalog: &TagCatalog, root: &Path) -> Self {
        let mut set = Self::default();
        for (key, info) in catalog.iter() {
            if info.icon_type != IconType::LocalSvg {
                continue;
            }
            let path = root.join(&info.icon_id);
            let loaded = std::fs::read_to_string(&path)
                .with_context(|| format!("read icon {}", path.display()))
                .and_then(|svg| parse_vector_icon(&svg));
            match loaded {
                Ok(icon) => set.insert(key, icon),
                Err(err) => tracing::warn!(tag = %key, error = %format!("{err:#}"), "icon unavailable"),
            }
        }
        set
    }

    pub fn insert(&mut self, key: &str, icon: VectorIcon) {
        self.icons.insert(key.to_owned(), icon);
    }

    pub fn get(&self, key: &str) -> Option<&VectorIcon> {
        self.icons.get(key)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_vector_icon;
    use kurbo::{PathEl, Point, Shape};

    #[test]
    fn routes_elements_by_class() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">
            <style>.fill { fill: black; }</style>
            <path class="fill" d="M2 2 L22 2 L22 22 Z"/>
            <line class="stroke" x1="0" y1="12" x2="24" y2="12"/>
        </svg>"#;

        let icon = parse_vector_icon(svg).expect("icon");
        assert_eq!(icon.fill.elements().len(), 4);
        assert_eq!(
            icon.stroke.elements(),
            &[
                PathEl::MoveTo(Point::new(0.0, 12.0)),
                PathEl::LineTo(Point::new(24.0, 12.0))
            ]
        );
    }

    #[test]
    fn unclassed_elements_default_to_stroke_and_inherit_previous_class() {
        let svg = r#"<svg>
            <line x1="1" y1="1" x2="2" y2="2"/>
            <ellipse class="fill" cx="12" cy="12" rx="4" ry="2"/>
            <line x1="3" y1="3" x2="4" y2="4"/>
        </svg>"#;

        let icon = parse_vector_icon(svg).expect("icon");
        assert_eq!(icon.stroke.elements().len(), 2);
        let fill_bounds = icon.fill.bounding_box();
        assert!((fill_bounds.x0 - 3.0).abs() < 1e-3);
        assert!((fill_bounds.x1 - 16.0).abs() < 1e-3);
    }

    #[test]
    fn groups_pass_their_target_to_children() {
        let svg = r#"<svg>
            <g class="fill">
                <path d="M0 0 L1 1"/>
                <g><path d="M2 2 L3 3"/></g>
            </g>
        </svg>"#;

        let icon = parse_vector_icon(svg).expect("icon");
        assert_eq!(icon.fill.elements().len(), 4);
        assert!(icon.stroke.elements().is_empty());
    }

    #[test]
    fn unsupported_elements_are_skipped() {
        let svg = r#"<svg><rect x="0" y="0" width="4" height="4"/><path d="M0 0 L5 5"/></svg>"#;
        let icon = parse_vector_icon(svg).expect("icon");
        assert_eq!(icon.stroke.elements().len(), 2);
    }

    #[test]
    fn missing_svg_root_is_an_error() {
        assert!(parse_vector_icon("<html/>").is_err());
        assert!(parse_vector_icon("<svg").is_err());
    }
}
