use crate::tags::catalog::{TagCatalog, TagInfo};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Newest tag is drawn first.
    Top,
    Bottom,
}

/// Catalog of supported tags plus the ordered list of tags shown on the overlay.
#[derive(Debug, Clone, Default)]
pub struct TagManager {
    catalog: TagCatalog,
    selected: Vec<String>,
    unavailable: HashSet<String>,
}

impl TagManager {
    pub fn new(catalog: TagCatalog) -> Self {
        Self {
            catalog,
            selected: Vec::new(),
            unavailable: HashSet::new(),
        }
    }

    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    /// Tags in drawing order, top to bottom.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.iter().any(|k| k == key)
    }

    pub fn info(&self, key: &str) -> Option<&TagInfo> {
        self.catalog.get(key)
    }

    /// Marks a tag as (un)available for the current image. Unavailable tags
    /// cannot be selected. A selected tag keeps its place in the list so it
    /// comes back with the next image that carries it.
    pub fn set_enabled(&mut self, key: &str, enabled: bool) {
        if enabled {
            self.unavailable.remove(key);
        } else {
            self.unavailable.insert(key.to_owned());
        }
    }

    pub fn is_available(&self, key: &str) -> bool {
        self.catalog.contains(key) && !self.unavailable.contains(key)
    }

    /// Whether the selection UI shows the tag as checked.
    pub fn is_checked(&self, key: &str) -> bool {
        self.is_selected(key) && self.is_available(key)
    }

    /// Returns `true` when the selection changed.
    pub fn select(&mut self, key: &str, enable: bool, placement: Placement) -> bool {
        if !self.catalog.contains(key) {
            tracing::warn!(tag = key, "not a supported tag");
            return false;
        }
        if enable && self.unavailable.contains(key) {
            tracing::debug!(tag = key, "tag is unavailable for this image");
            return false;
        }

        let position = self.selected.iter().position(|k| k == key);
        match (enable, position) {
            (false, Some(index)) => {
                self.selected.remove(index);
                true
            }
            (true, None) => {
                match placement {
                    Placement::Top => self.selected.insert(0, key.to_owned()),
                    Placement::Bottom => self.selected.push(key.to_owned()),
                }
                true
            }
            _ => false,
        }
    }

    pub fn toggle(&mut self, key: &str) -> bool {
        let enable = !self.is_selected(key);
        self.select(key, enable, Placement::Top)
    }

    /// Replaces the selection, keeping the order of `keys`.
    pub fn set_selected<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.selected.clear();
        for key in keys {
            self.select(key.as_ref(), true, Placement::Bottom);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Placement, TagManager};
    use crate::tags::catalog::TagCatalog;

    fn manager() -> TagManager {
        let catalog = TagCatalog::from_json(
            r#"{
                "camera": { "iconType": "material_symbol", "iconID": "photo_camera", "tagType": "exif", "tagID": "Model" },
                "lens": { "iconType": "material_symbol", "iconID": "lens", "tagType": "exif", "tagID": "LensModel" },
                "iso": { "iconType": "material_symbol", "iconID": "iso", "tagType": "exif", "tagID": "ISOSpeedRatings" }
            }"#,
        )
        .expect("catalog");
        TagManager::new(catalog)
    }

    #[test]
    fn new_tags_go_on_top_by_default() {
        let mut tags = manager();
        tags.select("camera", true, Placement::Top);
        tags.select("lens", true, Placement::Top);
        tags.select("iso", true, Placement::Bottom);
        assert_eq!(tags.selected(), &["lens", "camera", "iso"]);
    }

    #[test]
    fn select_then_deselect_restores_previous_list() {
        let mut tags = manager();
        tags.set_selected(["camera", "iso"]);
        let before = tags.selected().to_vec();

        assert!(tags.select("lens", true, Placement::Top));
        assert!(tags.select("lens", false, Placement::Top));
        assert_eq!(tags.selected(), before.as_slice());
    }

    #[test]
    fn unknown_and_duplicate_selections_are_ignored() {
        let mut tags = manager();
        assert!(!tags.select("gps", true, Placement::Top));
        assert!(tags.select("iso", true, Placement::Top));
        assert!(!tags.select("iso", true, Placement::Top));
        assert!(!tags.select("camera", false, Placement::Top));
        assert_eq!(tags.selected(), &["iso"]);
    }

    #[test]
    fn unavailable_tags_are_unchecked_and_not_selectable() {
        let mut tags = manager();
        tags.set_selected(["camera"]);
        tags.set_enabled("lens", false);
        tags.set_enabled("camera", false);
        assert!(!tags.is_checked("camera"));
        assert!(tags.is_selected("camera"));
        assert!(!tags.select("lens", true, Placement::Top));

        tags.set_enabled("lens", true);
        tags.set_enabled("camera", true);
        assert!(tags.is_checked("camera"));
        assert!(tags.select("lens", true, Placement::Top));
        assert_eq!(tags.selected(), &["lens", "camera"]);
    }

    #[test]
    fn set_selected_replaces_in_given_order() {
        let mut tags = manager();
        tags.set_selected(["camera"]);
        tags.set_selected(["iso", "camera", "lens"]);
        assert_eq!(tags.selected(), &["iso", "camera", "lens"]);
    }
}
