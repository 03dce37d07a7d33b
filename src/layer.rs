use crate::{
    geometry::{Contours, Outline},
    shape::Shape,
    Component, Font, Path, SpacingError,
};
use serde::{Deserialize, Serialize};

/// The outline of a glyph in one master
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    /// The master this layer belongs to
    pub id: String,
    pub width: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,
    /// The width is set by automatic alignment of components
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_aligned: bool,
}

impl Layer {
    pub fn new(id: impl Into<String>, width: f64) -> Layer {
        Layer {
            id: id.into(),
            width,
            ..Default::default()
        }
    }

    pub fn components(&self) -> impl DoubleEndedIterator<Item = &Component> {
        self.shapes.iter().filter_map(|x| {
            if let Shape::Component(c) = x {
                Some(c)
            } else {
                None
            }
        })
    }

    pub fn paths(&self) -> impl DoubleEndedIterator<Item = &Path> {
        self.shapes.iter().filter_map(|x| {
            if let Shape::Path(p) = x {
                Some(p)
            } else {
                None
            }
        })
    }

    pub fn push_component(&mut self, c: Component) {
        self.shapes.push(Shape::Component(c))
    }

    pub fn push_path(&mut self, p: Path) {
        self.shapes.push(Shape::Path(p))
    }

    pub fn has_components(&self) -> bool {
        self.shapes
            .iter()
            .any(|sh| matches!(sh, Shape::Component(_)))
    }

    /// Neither paths nor components
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn decompose(&mut self, font: &Font) {
        let decomposed_shapes = self
            .decomposed_components(font)
            .into_iter()
            .map(Shape::Path);
        self.shapes.retain(|sh| matches!(sh, Shape::Path(_)));
        self.shapes.extend(decomposed_shapes);
    }

    pub fn decomposed(&self, font: &Font) -> Layer {
        let mut layer = self.clone();
        layer.decompose(font);
        layer
    }

    /// The paths of all components, transformed into this layer
    ///
    /// Components are looked up in the same master as this layer; nested
    /// components are followed depth-first. Missing references are skipped,
    /// as are components which refer back to a glyph they are nested in.
    pub fn decomposed_components(&self, font: &Font) -> Vec<Path> {
        let mut contours = Vec::new();

        let mut stack: Vec<(&Component, kurbo::Affine, Vec<&str>)> = Vec::new();
        for component in self.components() {
            stack.push((component, component.transform, vec![]));
            while let Some((component, transform, ancestors)) = stack.pop() {
                let reference = component.reference.as_str();
                if ancestors.contains(&reference) {
                    log::warn!(
                        "Component {} is nested inside itself via {}",
                        reference,
                        ancestors.join(" > ")
                    );
                    continue;
                }
                if ancestors.len() >= MAX_COMPONENT_DEPTH {
                    log::warn!("Components nested too deeply at {}", reference);
                    continue;
                }
                let Some(new_outline) = font.master_layer_for(reference, &self.id) else {
                    log::warn!(
                        "Component {} has no layer for master {}",
                        reference,
                        self.id
                    );
                    continue;
                };

                contours.extend(new_outline.paths().map(|p| p.transformed(transform)));

                // Reversed so that the first nested component is decomposed next
                for new_component in new_outline.components().rev() {
                    let mut chain = ancestors.clone();
                    chain.push(reference);
                    stack.push((new_component, transform * new_component.transform, chain));
                }
            }
        }

        contours
    }

    /// The outline as measurable contours
    pub fn contours(&self) -> Result<Contours, SpacingError> {
        if self.has_components() {
            return Err(SpacingError::NeedsDecomposition);
        }
        let paths: Result<Vec<kurbo::BezPath>, SpacingError> =
            self.paths().map(|p| p.to_kurbo()).collect();
        Ok(Contours::new(paths?))
    }

    /// Bounding box of the outline, or `None` for an empty layer
    pub fn bounds(&self) -> Result<Option<kurbo::Rect>, SpacingError> {
        Ok(self.contours()?.bounds())
    }

    pub fn lsb(&self) -> Result<f64, SpacingError> {
        let bounds = self.bounds()?.unwrap_or_default();
        Ok(bounds.min_x())
    }

    pub fn rsb(&self) -> Result<f64, SpacingError> {
        let bounds = self.bounds()?.unwrap_or_default();
        Ok(self.width - bounds.max_x())
    }

    /// Move the outline so that it has the given sidebearings.
    ///
    /// `bounds` is the bounding box of the decomposed outline, so that layers
    /// made of components can be spaced without decomposing them. The width
    /// becomes `width` if given, or the outline width plus both sidebearings.
    pub fn set_sidebearings(&mut self, bounds: kurbo::Rect, lsb: f64, rsb: f64, width: Option<f64>) {
        let dx = lsb - bounds.min_x();
        if dx != 0.0 {
            for shape in self.shapes.iter_mut() {
                shape.shift_x(dx);
            }
        }
        self.width = width.unwrap_or(lsb + bounds.width() + rsb);
    }
}

pub(crate) const MAX_COMPONENT_DEPTH: usize = 32;
