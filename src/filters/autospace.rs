use std::{collections::HashMap, str::FromStr};

use crate::{
    engine::{average_width, Sides, Spacer, SpacingOutcome},
    filters::{glyph_list, FontFilter},
    layer::MAX_COMPONENT_DEPTH,
    Sidebearings, SpacingError,
};

/// Where tabular glyphs get their fixed width from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TabularWidth {
    /// Each glyph keeps its own width
    #[default]
    Current,
    Fixed(f64),
    /// The rounded mean width of the glyphs being spaced
    Average,
}

impl FromStr for TabularWidth {
    type Err = SpacingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "current" => Ok(TabularWidth::Current),
            "average" => Ok(TabularWidth::Average),
            width => width
                .parse::<f64>()
                .ok()
                .filter(|w| w.is_finite() && *w > 0.0)
                .map(TabularWidth::Fixed)
                .ok_or_else(|| {
                    SpacingError::FilterError(format!(
                        "Tabular width must be a positive number or 'average', not {width}"
                    ))
                }),
        }
    }
}

/// A filter that sets sidebearings from the font's spacing rules
///
/// Every selected glyph is measured first, in parallel when the `rayon`
/// feature is enabled; the new metrics are then written back one glyph at a
/// time. Glyphs which cannot be spaced keep their metrics and the reason is
/// logged.
#[derive(Debug, Clone, Default)]
pub struct AutoSpace {
    glyphs: Option<Vec<String>>,
    master: Option<String>,
    tabular_width: TabularWidth,
    sides: Sides,
}

impl AutoSpace {
    /// Space the listed glyphs
    pub fn new(glyphs: Vec<String>) -> Self {
        AutoSpace {
            glyphs: Some(glyphs),
            ..Default::default()
        }
    }

    /// Space every glyph
    pub fn all() -> Self {
        AutoSpace::default()
    }

    /// Only space this master instead of all of them
    pub fn with_master(mut self, master: impl Into<String>) -> Self {
        self.master = Some(master.into());
        self
    }

    pub fn with_tabular_width(mut self, tabular_width: TabularWidth) -> Self {
        self.tabular_width = tabular_width;
        self
    }

    pub fn with_sides(mut self, sides: Sides) -> Self {
        self.sides = sides;
        self
    }
}

// Longest chain of components below a glyph, cut at cycles
fn component_depth<'a>(
    font: &'a crate::Font,
    glyph: &'a str,
    master_id: &str,
    ancestors: &mut Vec<&'a str>,
    known: &mut HashMap<&'a str, usize>,
) -> usize {
    if let Some(depth) = known.get(glyph) {
        return *depth;
    }
    if ancestors.contains(&glyph) || ancestors.len() >= MAX_COMPONENT_DEPTH {
        return 0;
    }
    let Some(layer) = font.master_layer_for(glyph, master_id) else {
        return 0;
    };
    ancestors.push(glyph);
    let mut depth = 0;
    for component in layer.components() {
        depth = depth.max(
            1 + component_depth(font, component.reference.as_str(), master_id, ancestors, known),
        );
    }
    ancestors.pop();
    known.insert(glyph, depth);
    depth
}

#[cfg(feature = "rayon")]
fn space_all(spacer: &Spacer, names: &[String]) -> Vec<Result<SpacingOutcome, SpacingError>> {
    use rayon::prelude::*;
    names.par_iter().map(|name| spacer.space_glyph(name)).collect()
}

#[cfg(not(feature = "rayon"))]
fn space_all(spacer: &Spacer, names: &[String]) -> Vec<Result<SpacingOutcome, SpacingError>> {
    names.iter().map(|name| spacer.space_glyph(name)).collect()
}

impl FontFilter for AutoSpace {
    fn apply(&self, font: &mut crate::Font) -> Result<(), SpacingError> {
        let masters: Vec<String> = match &self.master {
            Some(id) => {
                if font.master(id).is_none() {
                    return Err(SpacingError::MasterNotFound { master: id.clone() });
                }
                vec![id.clone()]
            }
            None => font.masters.iter().map(|m| m.id.clone()).collect(),
        };
        let names: Vec<String> = match &self.glyphs {
            Some(glyphs) => {
                if let Some(missing) = glyphs.iter().find(|g| font.glyphs.get(g).is_none()) {
                    return Err(SpacingError::GlyphNotFound {
                        glyph: missing.clone(),
                    });
                }
                glyphs.clone()
            }
            None => font.glyphs.iter().map(|g| g.name.clone()).collect(),
        };
        log::info!(
            "Spacing {} glyphs in {} masters",
            names.len(),
            masters.len()
        );

        // Measure every master before touching any of them, so an error
        // leaves the font as it was
        let mut plans = vec![];
        for master_id in masters {
            let tabular_width = match self.tabular_width {
                TabularWidth::Current => None,
                TabularWidth::Fixed(width) => Some(width),
                TabularWidth::Average => average_width(
                    names
                        .iter()
                        .filter_map(|name| font.master_layer_for(name, &master_id))
                        .map(|layer| layer.width),
                ),
            };
            let spacer = Spacer::new(font, &master_id)?
                .with_sides(self.sides)
                .with_tabular_width(tabular_width);
            let outcomes = space_all(&spacer, &names)
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;
            let mut spaced: Vec<(&String, Sidebearings)> = vec![];
            for (name, outcome) in names.iter().zip(outcomes) {
                match outcome {
                    SpacingOutcome::Spaced(sidebearings) => spaced.push((name, sidebearings)),
                    SpacingOutcome::Skipped(reason) => log::info!("{}", reason),
                }
            }
            // Components move with their base glyph, so bases are placed first
            let mut known = HashMap::new();
            spaced.sort_by_cached_key(|(name, _)| {
                component_depth(font, *name, &master_id, &mut vec![], &mut known)
            });
            plans.push((master_id, spaced));
        }

        for (master_id, spaced) in plans {
            let mut written = 0;
            for (name, sidebearings) in spaced {
                let bounds = match font.master_layer_for(name, &master_id) {
                    Some(layer) => layer.decomposed(font).bounds()?,
                    None => None,
                };
                let (Some(bounds), Some(layer)) =
                    (bounds, font.master_layer_for_mut(name, &master_id))
                else {
                    continue;
                };
                layer.set_sidebearings(
                    bounds,
                    sidebearings.left,
                    sidebearings.right,
                    sidebearings.width,
                );
                written += 1;
            }
            log::info!(
                "Spaced {} of {} glyphs in master {}",
                written,
                names.len(),
                master_id
            );
        }
        Ok(())
    }

    fn from_str(s: &str) -> Result<Self, SpacingError>
    where
        Self: Sized,
    {
        Ok(AutoSpace {
            glyphs: glyph_list(s),
            ..Default::default()
        })
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new("autospace")
            .long("autospace")
            .help("Set sidebearings from the spacing rules (optionally list specific glyphs to space)")
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
    use crate::{
        rules::{Case, GlyphCategory, SpacingRule, Subcategory},
        Component, Font, Glyph, Layer, Master, Node, NodeType, Path,
    };
    use pretty_assertions::assert_eq;

    fn font() -> Font {
        let mut font = Font::new();
        font.masters.push(Master::new("Regular", "m01", 500.0));
        font.masters.push(Master::new("Bold", "m02", 500.0));
        let mut add = |name: &str, shape: crate::Shape, width: f64| {
            let mut glyph = Glyph::new(name);
            glyph.category = Some(GlyphCategory::Letter);
            glyph.case = Case::Lower;
            for id in ["m01", "m02"] {
                let mut layer = Layer::new(id, width);
                layer.shapes.push(shape.clone());
                glyph.layers.push(layer);
            }
            font.glyphs.push(glyph);
        };
        add("n", crate::Shape::Path(Path::rect(50.0, 0.0, 450.0, 500.0)), 500.0);
        add(
            "n.alt",
            crate::Shape::Component(Component::new("n", kurbo::Affine::translate((100.0, 0.0)))),
            700.0,
        );
        add("zero.tf", crate::Shape::Path(Path::rect(50.0, 0.0, 450.0, 500.0)), 600.0);
        font.rules.insert(
            GlyphCategory::Letter,
            SpacingRule::new(Subcategory::Any, Case::Lower, 1.0).with_reference("n"),
        );
        font
    }

    fn metrics(font: &Font, glyph: &str, master: &str) -> (f64, f64, f64) {
        let layer = font.master_layer_for(glyph, master).unwrap().decomposed(font);
        (layer.lsb().unwrap(), layer.rsb().unwrap(), layer.width)
    }

    #[test]
    fn test_space_all_masters() {
        let mut font = font();
        AutoSpace::all().apply(&mut font).unwrap();
        for master in ["m01", "m02"] {
            assert_eq!(metrics(&font, "n", master), (80.0, 80.0, 560.0));
            assert_eq!(metrics(&font, "n.alt", master), (80.0, 80.0, 560.0));
            assert_eq!(metrics(&font, "zero.tf", master), (100.0, 100.0, 600.0));
        }
    }

    #[test]
    fn test_space_one_master_one_side() {
        let mut font = font();
        AutoSpace::from_str("n")
            .unwrap()
            .with_master("m02")
            .with_sides(Sides::Right)
            .apply(&mut font)
            .unwrap();
        assert_eq!(metrics(&font, "n", "m01"), (50.0, 50.0, 500.0));
        assert_eq!(metrics(&font, "n", "m02"), (50.0, 80.0, 530.0));
        assert_eq!(metrics(&font, "n.alt", "m02"), (150.0, 150.0, 700.0));
    }

    #[test]
    fn test_fixed_and_average_tabular_width() {
        let mut font = font();
        AutoSpace::new(vec!["zero.tf".to_string()])
            .with_tabular_width(TabularWidth::Fixed(520.0))
            .apply(&mut font)
            .unwrap();
        assert_eq!(metrics(&font, "zero.tf", "m01"), (60.0, 60.0, 520.0));

        let mut font = self::font();
        AutoSpace::all()
            .with_tabular_width(TabularWidth::Average)
            .apply(&mut font)
            .unwrap();
        // (500 + 700 + 600) / 3
        assert_eq!(metrics(&font, "zero.tf", "m01"), (100.0, 100.0, 600.0));
    }

    #[test]
    fn test_error_leaves_font_untouched() {
        let mut font = font();
        let mut bad = Glyph::new("bad");
        bad.category = Some(GlyphCategory::Letter);
        let mut layer = Layer::new("m02", 500.0);
        // A curve with no off-curve points cannot be drawn
        layer.push_path(Path {
            nodes: [(0.0, 0.0, NodeType::Line), (100.0, 100.0, NodeType::Curve), (0.0, 100.0, NodeType::Line)]
                .into_iter()
                .map(|(x, y, nodetype)| Node {
                    x,
                    y,
                    nodetype,
                    smooth: false,
                })
                .collect(),
            closed: true,
        });
        bad.layers.push(layer);
        font.glyphs.push(bad);

        let before = font.clone();
        assert!(matches!(
            AutoSpace::all().apply(&mut font),
            Err(SpacingError::BadPath)
        ));
        // Not even the first master, which has no bad glyph, was changed
        assert_eq!(font, before);
    }

    #[test]
    fn test_self_referencing_component() {
        let mut font = font();
        let mut glyph = Glyph::new("loop");
        glyph.category = Some(GlyphCategory::Letter);
        glyph.case = Case::Lower;
        for id in ["m01", "m02"] {
            let mut layer = Layer::new(id, 500.0);
            layer.push_path(Path::rect(50.0, 0.0, 150.0, 500.0));
            layer.push_component(Component::new("loop", kurbo::Affine::IDENTITY));
            layer.push_component(Component::new("loop", kurbo::Affine::translate((300.0, 0.0))));
            glyph.layers.push(layer);
        }
        font.glyphs.push(glyph);

        assert_eq!(
            component_depth(&font, "loop", "m01", &mut vec![], &mut HashMap::new()),
            1
        );
        AutoSpace::all().apply(&mut font).unwrap();
        assert_eq!(metrics(&font, "n", "m01"), (80.0, 80.0, 560.0));
        assert_eq!(metrics(&font, "n.alt", "m01"), (80.0, 80.0, 560.0));
    }

    #[test]
    fn test_unknown_names() {
        let mut font = font();
        assert!(matches!(
            AutoSpace::from_str("nothere").unwrap().apply(&mut font),
            Err(SpacingError::GlyphNotFound { .. })
        ));
        assert!(matches!(
            AutoSpace::all().with_master("m03").apply(&mut font),
            Err(SpacingError::MasterNotFound { .. })
        ));
    }

    #[test]
    fn test_tabular_width_from_str() {
        assert_eq!(TabularWidth::from_str("average").unwrap(), TabularWidth::Average);
        assert_eq!(TabularWidth::from_str("").unwrap(), TabularWidth::Current);
        assert_eq!(TabularWidth::from_str("600").unwrap(), TabularWidth::Fixed(600.0));
        assert!(TabularWidth::from_str("-3").is_err());
    }
}
