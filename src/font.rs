use crate::{glyph::GlyphList, master::Master, rules::RuleTable, Layer, SpacingError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Font {
    pub upm: u16,
    #[serde(default)]
    pub masters: Vec<Master>,
    #[serde(default)]
    pub glyphs: GlyphList,
    /// Spacing rules shared by all masters
    #[serde(default, skip_serializing_if = "RuleTable::is_empty")]
    pub rules: RuleTable,
    #[serde(skip)]
    pub source: Option<PathBuf>,
}
impl Default for Font {
    fn default() -> Self {
        Self::new()
    }
}

impl Font {
    pub fn new() -> Self {
        Font {
            upm: 1000,
            masters: vec![],
            glyphs: GlyphList(vec![]),
            rules: RuleTable::default(),
            source: None,
        }
    }

    pub fn master(&self, master_id: &str) -> Option<&Master> {
        self.masters.iter().find(|m| m.id == master_id)
    }

    pub fn master_layer_for(&self, glyphname: &str, master_id: &str) -> Option<&Layer> {
        self.glyphs.get(glyphname)?.get_layer(master_id)
    }

    pub fn master_layer_for_mut(&mut self, glyphname: &str, master_id: &str) -> Option<&mut Layer> {
        self.glyphs.get_mut(glyphname)?.get_layer_mut(master_id)
    }

    pub fn save<T: Into<PathBuf>>(&self, path: T) -> Result<(), SpacingError> {
        let path = path.into();
        if path.extension().and_then(|x| x.to_str()) != Some("json") {
            return Err(SpacingError::UnknownFileType { path });
        }
        let file = std::fs::File::create(&path)?;
        let mut buffer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut buffer, &self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{Glyph, Path};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_roundtrip() {
        let mut font = Font::new();
        font.masters.push(Master::new("Regular", "m01", 500.0));
        let mut glyph = Glyph::new("n");
        let mut layer = Layer::new("m01", 500.0);
        layer.push_path(Path::rect(50.0, 0.0, 450.0, 500.0));
        glyph.layers.push(layer);
        font.glyphs.push(glyph);
        font.rules = RuleTable::default_profile();

        let serialized = serde_json::to_string(&font).unwrap();
        let deserialized: Font = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, font);
        assert!(deserialized.master_layer_for("n", "m01").is_some());
        assert!(deserialized.master_layer_for("n", "m02").is_none());
    }

    #[test]
    fn test_save_needs_json() {
        let font = Font::new();
        assert!(matches!(
            font.save("font.ufo"),
            Err(SpacingError::UnknownFileType { .. })
        ));
    }
}
