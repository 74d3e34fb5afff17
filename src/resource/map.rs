use url::Url;

/// Handle of an image-displaying element inside a surface.
///
/// The surface adapter owns the displayers; the engine only addresses them by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DisplayerId(pub u32);

/// Pixel size an image resource is requested at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An externally fetched image a rendering depends on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageResource {
    pub url: Url,
    /// Requested size variant. `None` keeps the source dimensions.
    pub size: Option<ImageSize>,
}

impl ImageResource {
    pub fn new(url: Url, size: Option<ImageSize>) -> Self {
        Self { url, size }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceEntry {
    pub displayer: DisplayerId,
    pub resource: ImageResource,
}

/// Resources one rendering depends on, one entry per displayer, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceMap {
    entries: Vec<ResourceEntry>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register that `displayer` shows the image at `url`. A missing URL registers nothing, so
    /// callers can pass optional fields straight through.
    pub fn set_image_url(
        &mut self,
        displayer: DisplayerId,
        url: Option<Url>,
        size: Option<ImageSize>,
    ) -> &mut Self {
        if let Some(url) = url {
            self.entries.push(ResourceEntry {
                displayer,
                resource: ImageResource::new(url, size),
            });
        }
        self
    }

    pub fn with(mut self, displayer: DisplayerId, url: Url, size: Option<ImageSize>) -> Self {
        self.set_image_url(displayer, Some(url), size);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceEntry> {
        self.entries.iter()
    }

    pub fn displayers(&self) -> impl Iterator<Item = DisplayerId> + '_ {
        self.entries.iter().map(|e| e.displayer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResourceMap {
    type Item = &'a ResourceEntry;
    type IntoIter = std::slice::Iter<'a, ResourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
