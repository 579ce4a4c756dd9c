use ab_glyph::{FontArc, FontVec};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A loaded font: outlines through `ab_glyph`, raw bytes for shaping.
#[derive(Clone)]
pub struct FontFace {
    glyphs: FontArc,
    data: Arc<[u8]>,
}

impl FontFace {
    pub fn from_vec(data: Vec<u8>) -> Result<Self> {
        let data: Arc<[u8]> = data.into();
        rustybuzz::Face::from_slice(&data, 0).ok_or_else(|| anyhow!("no usable font face"))?;
        let glyphs = FontVec::try_from_vec(data.to_vec())?;
        Ok(Self {
            glyphs: FontArc::from(glyphs),
            data,
        })
    }

    pub fn glyphs(&self) -> &FontArc {
        &self.glyphs
    }

    /// Shaping face over the font bytes. Parsed on demand; cheap.
    pub fn shaper(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, 0)
    }
}

/// Fonts available to the raster surface, looked up by family name.
///
/// A font file registers under its file stem, so `MPLUS1Code-Regular.ttf`
/// answers to `"M PLUS 1 Code"`. Lookups compare names with case, spaces,
/// dashes and quotes removed.
#[derive(Clone, Default)]
pub struct FontBook {
    fonts: HashMap<String, FontFace>,
    order: Vec<String>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook").field("fonts", &self.order).finish()
    }
}

fn normalize(family: &str) -> String {
    family
        .split(',')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl FontBook {
    /// Loads every `.ttf`/`.otf` file in `dir`. Unreadable files are skipped.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut book = Self::default();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("read font directory {}", dir.display()))?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf"))
            })
            .collect();
        paths.sort();

        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let loaded = std::fs::read(&path)
                .with_context(|| format!("read font {}", path.display()))
                .and_then(|bytes| {
                    FontFace::from_vec(bytes)
                        .with_context(|| format!("parse font {}", path.display()))
                });
            match loaded {
                Ok(face) => book.insert(stem, face),
                Err(err) => tracing::warn!(error = %format!("{err:#}"), "font skipped"),
            }
        }
        tracing::debug!(count = book.len(), dir = %dir.display(), "loaded fonts");
        Ok(book)
    }

    pub fn insert(&mut self, name: &str, face: FontFace) {
        let key = normalize(name);
        if !self.fonts.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.fonts.insert(key, face);
    }

    /// Exact match first, then a registered name that starts with the family
    /// (covers style suffixes such as `-Regular`). No match is `None`.
    pub fn resolve(&self, family: &str) -> Option<&FontFace> {
        let wanted = normalize(family);
        if let Some(face) = self.fonts.get(&wanted) {
            return Some(face);
        }
        if wanted.is_empty() {
            return None;
        }
        self.order
            .iter()
            .find(|key| key.starts_with(&wanted))
            .and_then(|key| self.fonts.get(key))
    }

    /// The first font loaded, used for captions whose family is not loaded.
    pub fn fallback(&self) -> Option<&FontFace> {
        self.order.first().and_then(|key| self.fonts.get(key))
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize, FontBook, FontFace};
    use std::path::Path;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/fonts/DejaVuSans.ttf");

    #[test]
    fn family_names_are_normalized() {
        assert_eq!(normalize("\"M PLUS 1 Code\""), "mplus1code");
        assert_eq!(normalize("Roboto Mono, monospace"), "robotomono");
        assert_eq!(normalize("MPLUS1Code-Regular"), "mplus1coderegular");
    }

    #[test]
    fn empty_book_resolves_nothing() {
        let book = FontBook::default();
        assert!(book.resolve("anything").is_none());
        assert!(book.fallback().is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn unknown_family_is_not_resolved_to_another_font() {
        let book = FontBook::load_dir(Path::new(FIXTURE).parent().expect("dir")).expect("fonts");
        assert_eq!(book.len(), 1);
        assert!(book.resolve("DejaVu Sans").is_some());
        assert!(book.resolve("dejavu").is_some());
        assert!(book.resolve("Material Symbols Outlined").is_none());
        assert!(book.resolve("").is_none());
        assert!(book.fallback().is_some());
    }

    #[test]
    fn non_font_bytes_are_rejected() {
        assert!(FontFace::from_vec(b"not a font".to_vec()).is_err());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(FontBook::load_dir(&dir.path().join("nope")).is_err());
        let book = FontBook::load_dir(dir.path()).expect("empty dir");
        assert!(book.is_empty());
    }
}
