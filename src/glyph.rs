use crate::{
    layer::Layer,
    rules::{Case, GlyphCategory, GlyphClass},
};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GlyphList(pub Vec<Glyph>);
impl GlyphList {
    pub fn get(&self, g: &str) -> Option<&Glyph> {
        self.0.iter().find(|&glyph| glyph.name == g)
    }
    pub fn get_mut(&mut self, g: &str) -> Option<&mut Glyph> {
        self.0.iter_mut().find(|glyph| glyph.name == g)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Glyph> {
        self.0.iter()
    }
}

impl Deref for GlyphList {
    type Target = Vec<Glyph>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for GlyphList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Glyph {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<GlyphCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub case: Case,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<Layer>,
    /// Another glyph's metric drives the left sidebearing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_metrics_key: Option<String>,
    /// Another glyph's metric drives the right sidebearing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_metrics_key: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tabular: bool,
}

impl Glyph {
    pub fn new(name: impl Into<String>) -> Self {
        Glyph {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn get_layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }
    pub fn get_layer_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Tabular glyphs keep a fixed advance width
    pub fn is_tabular(&self) -> bool {
        self.tabular || self.name.contains(".tf") || self.name.contains(".tosf")
    }

    pub fn class(&self) -> GlyphClass {
        GlyphClass {
            name: self.name.as_str().into(),
            category: self.category,
            subcategory: self.subcategory.as_deref().map(Into::into),
            case: self.case,
        }
    }
}
