//! JSON-described surfaces.
//!
//! A [`SurfaceDoc`] is a static content tree (fills, URL-backed images, blurs) that
//! [`DocSurface`] exposes to the scheduler as a regular [`SurfaceAdapter`]. The CLI renders these.

use std::collections::BTreeMap;
use std::path::Path;

use url::Url;

use crate::foundation::core::{Bitmap, MAX_SURFACE_EXTENT, Rect, Rgba8};
use crate::foundation::error::{SlideError, SlideResult};
use crate::render::nodes::{BlurNode, FillNode, ImageNode};
use crate::render::surface::{Presentation, RenderNode, RenderTarget, SurfaceAdapter};
use crate::resource::map::{DisplayerId, ImageSize, ResourceMap};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfaceDoc {
    /// Content identity; documents with the same id share a cached snapshot.
    pub id: String,
    #[serde(default = "default_variant")]
    pub variant: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub background: Option<Rgba8>,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default)]
    pub blends_with_background: bool,
    #[serde(default)]
    pub nodes: Vec<NodeDoc>,
}

fn default_variant() -> String {
    "default".to_owned()
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameDoc {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FrameDoc {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeDoc {
    Fill {
        frame: FrameDoc,
        color: Rgba8,
        #[serde(default)]
        children: Vec<NodeDoc>,
    },
    Image {
        frame: FrameDoc,
        url: Url,
        #[serde(default)]
        size: Option<ImageSize>,
    },
    Blur {
        frame: FrameDoc,
        sigma: f32,
        #[serde(default)]
        tint: Option<Rgba8>,
    },
}

impl NodeDoc {
    fn frame(&self) -> FrameDoc {
        match self {
            NodeDoc::Fill { frame, .. }
            | NodeDoc::Image { frame, .. }
            | NodeDoc::Blur { frame, .. } => *frame,
        }
    }
}

impl SurfaceDoc {
    pub fn from_json_str(s: &str) -> SlideResult<Self> {
        let doc: SurfaceDoc =
            serde_json::from_str(s).map_err(|e| SlideError::serde(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SlideResult<Self> {
        let s = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&s)
    }

    pub fn validate(&self) -> SlideResult<()> {
        if self.id.trim().is_empty() {
            return Err(SlideError::validation("surface id must be non-empty"));
        }
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(SlideError::validation("surface width/height must be > 0"));
        }
        let max = f64::from(MAX_SURFACE_EXTENT);
        if self.width > max || self.height > max {
            return Err(SlideError::validation(format!(
                "surface width/height must be <= {MAX_SURFACE_EXTENT}"
            )));
        }
        if !self.corner_radius.is_finite() || self.corner_radius < 0.0 {
            return Err(SlideError::validation("corner_radius must be finite and >= 0"));
        }
        let mut stack: Vec<&NodeDoc> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            let f = node.frame();
            if ![f.x, f.y, f.width, f.height].iter().all(|v| v.is_finite())
                || f.width < 0.0
                || f.height < 0.0
            {
                return Err(SlideError::validation("node frame must be finite with size >= 0"));
            }
            if f.width > max || f.height > max {
                return Err(SlideError::validation(format!(
                    "node width/height must be <= {MAX_SURFACE_EXTENT}"
                )));
            }
            match node {
                NodeDoc::Fill { children, .. } => stack.extend(children.iter()),
                NodeDoc::Blur { sigma, .. } if !sigma.is_finite() || *sigma < 0.0 => {
                    return Err(SlideError::validation("blur sigma must be finite and >= 0"));
                }
                NodeDoc::Image { size: Some(s), .. } if s.width == 0 || s.height == 0 => {
                    return Err(SlideError::validation("image size must be non-zero"));
                }
                NodeDoc::Image { size: Some(s), .. }
                    if s.width > MAX_SURFACE_EXTENT || s.height > MAX_SURFACE_EXTENT =>
                {
                    return Err(SlideError::validation(format!(
                        "image size must be <= {MAX_SURFACE_EXTENT} per side"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Image nodes in pre-order, each paired with the displayer id it is addressed by.
    fn images(&self) -> Vec<(DisplayerId, &Url, Option<ImageSize>)> {
        fn walk<'a>(
            nodes: &'a [NodeDoc],
            out: &mut Vec<(DisplayerId, &'a Url, Option<ImageSize>)>,
        ) {
            for node in nodes {
                match node {
                    NodeDoc::Fill { children, .. } => walk(children, out),
                    NodeDoc::Image { url, size, .. } => {
                        out.push((DisplayerId(out.len() as u32), url, *size));
                    }
                    NodeDoc::Blur { .. } => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    pub fn resources(&self) -> ResourceMap {
        let mut map = ResourceMap::new();
        for (displayer, url, size) in self.images() {
            map.set_image_url(displayer, Some(url.clone()), size);
        }
        map
    }
}

/// [`SurfaceAdapter`] over a [`SurfaceDoc`]. Keeps the last presented snapshot.
#[derive(Debug)]
pub struct DocSurface {
    doc: SurfaceDoc,
    images: BTreeMap<DisplayerId, Bitmap>,
    target: Option<RenderTarget>,
    snapshot: Option<Bitmap>,
}

impl DocSurface {
    pub fn new(doc: SurfaceDoc) -> Self {
        Self {
            doc,
            images: BTreeMap::new(),
            target: None,
            snapshot: None,
        }
    }

    pub fn doc(&self) -> &SurfaceDoc {
        &self.doc
    }

    pub fn render_target(&self) -> Option<&RenderTarget> {
        self.target.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Bitmap> {
        self.snapshot.as_ref()
    }

    fn build(&self, nodes: &[NodeDoc], next_displayer: &mut u32) -> Vec<Box<dyn RenderNode>> {
        let mut out: Vec<Box<dyn RenderNode>> = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                NodeDoc::Fill {
                    frame,
                    color,
                    children,
                } => {
                    let mut fill = FillNode::new(frame.to_rect(), *color);
                    fill.children = self.build(children, next_displayer);
                    out.push(Box::new(fill));
                }
                NodeDoc::Image { frame, .. } => {
                    let id = DisplayerId(*next_displayer);
                    *next_displayer += 1;
                    let image = self.images.get(&id).cloned();
                    out.push(Box::new(ImageNode::new(frame.to_rect(), image)));
                }
                NodeDoc::Blur { frame, sigma, tint } => {
                    let mut blur = BlurNode::new(frame.to_rect(), *sigma);
                    if let Some(tint) = tint {
                        blur = blur.with_tint(*tint);
                    }
                    out.push(Box::new(blur));
                }
            }
        }
        out
    }
}

impl SurfaceAdapter for DocSurface {
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.doc.width, self.doc.height)
    }

    fn template_color(&self) -> Option<Rgba8> {
        self.doc.background
    }

    fn corner_radius(&self) -> f64 {
        self.doc.corner_radius
    }

    fn blends_with_background(&self) -> bool {
        self.doc.blends_with_background
    }

    fn content_nodes(&self) -> Vec<Box<dyn RenderNode>> {
        let mut next = 0;
        self.build(&self.doc.nodes, &mut next)
    }

    fn attach_render_target(&mut self, target: RenderTarget) {
        self.target = Some(target);
    }

    fn displayer_image(&self, displayer: DisplayerId) -> Option<&Bitmap> {
        self.images.get(&displayer)
    }

    fn set_displayer_image(&mut self, displayer: DisplayerId, image: Option<Bitmap>) {
        match image {
            Some(image) => {
                self.images.insert(displayer, image);
            }
            None => {
                self.images.remove(&displayer);
            }
        }
    }

    fn present(&mut self, presentation: Presentation) {
        self.snapshot = match presentation {
            Presentation::Immediate(image) => image,
            Presentation::CrossFade { to, .. } => Some(to),
        };
    }
}

#[cfg(test)]
#[path = "../tests/unit/doc.rs"]
mod tests;
