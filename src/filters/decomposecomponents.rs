use crate::filters::{glyph_list, FontFilter};

/// A filter that replaces components with the paths they refer to
#[derive(Debug, Clone, Default)]
pub struct DecomposeComponents(Option<Vec<String>>);

impl DecomposeComponents {
    /// Decompose the components of the listed glyphs
    pub fn new(glyphs: Vec<String>) -> Self {
        DecomposeComponents(Some(glyphs))
    }

    /// Decompose the components of every glyph
    pub fn all() -> Self {
        DecomposeComponents(None)
    }

    fn wants(&self, glyph: &str) -> bool {
        self.0
            .as_ref()
            .is_none_or(|glyphs| glyphs.iter().any(|g| g == glyph))
    }
}

impl FontFilter for DecomposeComponents {
    fn apply(&self, font: &mut crate::Font) -> Result<(), crate::SpacingError> {
        log::info!("Decomposing components");
        // Decompose against the untouched font, then write back
        let mut decomposed = vec![];
        for (glyph_index, glyph) in font.glyphs.iter().enumerate() {
            if !self.wants(&glyph.name) {
                continue;
            }
            for (layer_index, layer) in glyph.layers.iter().enumerate() {
                if layer.has_components() {
                    decomposed.push((glyph_index, layer_index, layer.decomposed(font)));
                }
            }
        }
        log::info!("Decomposed {} layers", decomposed.len());
        for (glyph_index, layer_index, layer) in decomposed {
            font.glyphs[glyph_index].layers[layer_index] = layer;
        }
        Ok(())
    }

    fn from_str(s: &str) -> Result<Self, crate::SpacingError>
    where
        Self: Sized,
    {
        Ok(DecomposeComponents(glyph_list(s)))
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new("decompose")
            .long("decompose")
            .help("Decompose components (optionally list specific glyphs to decompose)")
            .value_name("GLYPHS")
            .action(clap::ArgAction::Append)
            .num_args(0..=1)
            .default_missing_value("")
            .required(false)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{Component, Font, Glyph, Layer, Path};
    use pretty_assertions::assert_eq;

    fn font() -> Font {
        let mut font = Font::new();
        for (name, shift) in [("acute", None), ("aacute", Some(100.0)), ("eacute", Some(50.0))] {
            let mut glyph = Glyph::new(name);
            let mut layer = Layer::new("m01", 500.0);
            match shift {
                None => layer.push_path(Path::rect(0.0, 500.0, 100.0, 600.0)),
                Some(dx) => layer.push_component(Component::new(
                    "acute",
                    kurbo::Affine::translate((dx, 0.0)),
                )),
            }
            glyph.layers.push(layer);
            font.glyphs.push(glyph);
        }
        font
    }

    #[test]
    fn test_decompose_all() {
        let mut font = font();
        DecomposeComponents::from_str("").unwrap().apply(&mut font).unwrap();
        let layer = font.master_layer_for("aacute", "m01").unwrap();
        assert!(!layer.has_components());
        assert_eq!(layer.lsb().unwrap(), 100.0);
        assert!(!font.master_layer_for("eacute", "m01").unwrap().has_components());
    }

    #[test]
    fn test_decompose_some() {
        let mut font = font();
        DecomposeComponents::from_str("eacute").unwrap().apply(&mut font).unwrap();
        assert!(font.master_layer_for("aacute", "m01").unwrap().has_components());
        let layer = font.master_layer_for("eacute", "m01").unwrap();
        assert_eq!(layer.lsb().unwrap(), 50.0);
    }
}
