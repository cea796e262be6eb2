//! SVG templates and the per-particle shape clones made from them

use std::sync::Arc;

use glam::Vec2;
use serde::Serialize;
use tracing::{debug, warn};

use crate::color::Rgba;
use crate::error::TemplateError;

/// Where a template's aspect ratio came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectSource {
    ViewBox,
    Intrinsic,
    Measured,
    /// Nothing resolved; the ratio is 1.0
    Fallback,
}

/// A parsed `<svg>` shape, shared read-only by every particle it spawns.
#[derive(Debug, Clone)]
pub struct Template {
    markup: Arc<str>,
    fillable: bool,
    aspect_ratio: f32,
    aspect_source: Option<AspectSource>,
}

impl Template {
    /// Parses `raw` and requires a `<path>` to recolor.
    pub fn load(raw: &str) -> Result<Self, TemplateError> {
        let template = Self::load_unchecked(raw)?;
        if !template.fillable {
            return Err(TemplateError::MissingFillablePart);
        }
        Ok(template)
    }

    /// Parses `raw` without requiring a fillable part. Clones of such a
    /// template fail when recolored instead.
    pub fn load_unchecked(raw: &str) -> Result<Self, TemplateError> {
        let text = raw.trim();
        let document = roxmltree::Document::parse(text)?;
        let svg = document
            .descendants()
            .find(|node| node.is_element() && node.tag_name().name() == "svg")
            .ok_or(TemplateError::MissingSvgRoot)?;

        let fillable = svg
            .descendants()
            .any(|node| node.is_element() && node.tag_name().name() == "path");

        let declared = svg
            .attribute("viewBox")
            .and_then(parse_view_box)
            .map(|ratio| (ratio, AspectSource::ViewBox))
            .or_else(|| {
                let width = svg.attribute("width").and_then(parse_length)?;
                let height = svg.attribute("height").and_then(parse_length)?;
                Some((width / height, AspectSource::Intrinsic))
            });

        let markup: Arc<str> = Arc::from(&text[svg.range()]);
        debug!(
            "template loaded: {} bytes, fillable={fillable}, aspect={:?}",
            markup.len(),
            declared
        );

        Ok(Self {
            markup,
            fillable,
            aspect_ratio: declared.map_or(1.0, |(ratio, _)| ratio),
            aspect_source: declared.map(|(_, source)| source),
        })
    }

    /// Width over height. `1.0` until resolved.
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn aspect_source(&self) -> Option<AspectSource> {
        self.aspect_source
    }

    /// True when neither a viewBox nor intrinsic size was declared
    pub fn needs_measurement(&self) -> bool {
        self.aspect_source.is_none()
    }

    /// Last-resort aspect ratio from a laid-out bounding box.
    /// Ignored once the ratio is already known.
    pub fn resolve_measured(&mut self, measured: Option<Vec2>) {
        if !self.needs_measurement() {
            return;
        }
        match measured {
            Some(size) if size.x > 0.0 && size.y > 0.0 => {
                self.aspect_ratio = size.x / size.y;
                self.aspect_source = Some(AspectSource::Measured);
            }
            _ => {
                warn!(
                    "template has no viewBox, intrinsic size or measurable box; using aspect ratio 1.0"
                );
                self.aspect_ratio = 1.0;
                self.aspect_source = Some(AspectSource::Fallback);
            }
        }
    }

    pub fn has_fillable_part(&self) -> bool {
        self.fillable
    }

    /// The `<svg>` element's source text
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Independent copy with its own style; the markup is shared.
    pub fn clone_shape(&self) -> ShapeHandle {
        ShapeHandle {
            markup: Arc::clone(&self.markup),
            fillable: self.fillable,
            style: ShapeStyle::default(),
        }
    }
}

/// Presentation of one shape clone inside its container
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShapeStyle {
    /// Pixels
    pub width: f32,
    pub height: f32,
    /// Percent of the container bounds
    pub left: f32,
    pub top: f32,
    /// Fill of the `<path>`
    pub fill: Option<Rgba>,
}

impl ShapeStyle {
    /// Inline CSS for the `<svg>` element (the fill goes on the path)
    pub fn to_css(&self) -> String {
        format!(
            "position: absolute; left: {}%; top: {}%; width: {}px; height: {}px;",
            self.left, self.top, self.width, self.height
        )
    }
}

/// A mutable clone of a [`Template`]
#[derive(Debug, Clone)]
pub struct ShapeHandle {
    markup: Arc<str>,
    fillable: bool,
    style: ShapeStyle,
}

impl ShapeHandle {
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.style.width = size.x;
        self.style.height = size.y;
    }

    /// `position` is in percent of the container
    pub fn set_position(&mut self, position: Vec2) {
        self.style.left = position.x;
        self.style.top = position.y;
    }

    pub fn set_fill(&mut self, color: Rgba) -> Result<(), TemplateError> {
        if !self.fillable {
            return Err(TemplateError::MissingFillablePart);
        }
        self.style.fill = Some(color);
        Ok(())
    }
}

fn parse_view_box(value: &str) -> Option<f32> {
    let parts: Vec<f32> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, width, height] if *width > 0.0 && *height > 0.0 => Some(width / height),
        _ => None,
    }
}

fn parse_length(value: &str) -> Option<f32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().filter(|v| *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CIRCLE: &str = r#"
    <svg height="800px" width="400px" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 451.827 225.9135" xml:space="preserve">
        <g><path style="fill: #010002" d="M225.922,0C101.351,0,0.004,101.347,0.004,225.917z"/></g>
    </svg>"#;

    #[test]
    fn view_box_wins_over_intrinsic_size() {
        let template = Template::load(CIRCLE).unwrap();
        assert_eq!(template.aspect_source(), Some(AspectSource::ViewBox));
        assert!((template.aspect_ratio() - 2.0).abs() < 1e-4);
        assert!(template.has_fillable_part());
    }

    #[test]
    fn intrinsic_size_when_no_view_box() {
        let template =
            Template::load(r#"<svg width="300px" height="100"><path d="M0 0"/></svg>"#).unwrap();
        assert_eq!(template.aspect_source(), Some(AspectSource::Intrinsic));
        assert!((template.aspect_ratio() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn measurement_is_last_resort() {
        let mut template = Template::load(r#"<svg width="100%"><path d="M0 0"/></svg>"#).unwrap();
        assert!(template.needs_measurement());
        template.resolve_measured(Some(Vec2::new(40.0, 20.0)));
        assert_eq!(template.aspect_source(), Some(AspectSource::Measured));
        assert!((template.aspect_ratio() - 2.0).abs() < 1e-6);

        // Already resolved, later measurements are ignored
        template.resolve_measured(Some(Vec2::new(10.0, 10.0)));
        assert!((template.aspect_ratio() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn unmeasurable_template_falls_back_to_square() {
        let mut template = Template::load(r#"<svg><path d="M0 0"/></svg>"#).unwrap();
        template.resolve_measured(None);
        assert_eq!(template.aspect_source(), Some(AspectSource::Fallback));
        assert_eq!(template.aspect_ratio(), 1.0);
    }

    #[test]
    fn invalid_view_box_falls_through() {
        let template =
            Template::load(r#"<svg viewBox="0 0 0 10" width="20" height="10"><path d=""/></svg>"#)
                .unwrap();
        assert_eq!(template.aspect_source(), Some(AspectSource::Intrinsic));
    }

    #[test]
    fn svg_is_found_inside_a_wrapper() {
        let template =
            Template::load(r#"<div><svg viewBox="0,0,10,5"><path d="M0 0"/></svg></div>"#)
                .unwrap();
        assert!(template.markup().starts_with("<svg"));
        assert!(template.markup().ends_with("</svg>"));
        assert!((template.aspect_ratio() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn missing_path_is_rejected() {
        let raw = r#"<svg viewBox="0 0 10 10"><circle r="5"/></svg>"#;
        assert_eq!(
            Template::load(raw).unwrap_err(),
            TemplateError::MissingFillablePart
        );
        let unchecked = Template::load_unchecked(raw).unwrap();
        let mut shape = unchecked.clone_shape();
        assert_eq!(
            shape.set_fill(Rgba::new(0.0, 0.0, 0.0, 1.0)),
            Err(TemplateError::MissingFillablePart)
        );
    }

    #[test]
    fn missing_svg_and_malformed_markup() {
        assert_eq!(
            Template::load("<div><path d=\"\"/></div>").unwrap_err(),
            TemplateError::MissingSvgRoot
        );
        assert!(matches!(
            Template::load("<svg><path></svg>").unwrap_err(),
            TemplateError::Malformed(_)
        ));
    }

    #[test]
    fn clones_are_independent() {
        let template = Template::load(CIRCLE).unwrap();
        let mut a = template.clone_shape();
        let b = template.clone_shape();
        a.set_size(Vec2::new(10.0, 20.0));
        a.set_position(Vec2::new(50.0, 25.0));
        a.set_fill(Rgba::new(255.0, 0.0, 0.0, 0.5)).unwrap();
        assert_eq!(b.style(), &ShapeStyle::default());
        assert_eq!(a.markup(), b.markup());
        assert_eq!(
            a.style().to_css(),
            "position: absolute; left: 50%; top: 25%; width: 10px; height: 20px;"
        );
    }
}
