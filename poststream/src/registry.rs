use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::Post;

/// Renders the body of one kind of post.
pub trait PostRenderer<O> {
    fn render(&self, post: &Post) -> O;
}

impl<O, F: Fn(&Post) -> O> PostRenderer<O> for F {
    fn render(&self, post: &Post) -> O {
        self(post)
    }
}

/// Content-type keyed lookup of post renderers.
///
/// Posts whose content type has no registered renderer render as `O::default()`.
pub struct ContentRegistry<O> {
    renderers: BTreeMap<String, Box<dyn PostRenderer<O>>>,
}

impl<O: Default> ContentRegistry<O> {
    pub fn new() -> Self {
        Self {
            renderers: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        content_type: impl Into<String>,
        renderer: impl PostRenderer<O> + 'static,
    ) -> &mut Self {
        self.renderers.insert(content_type.into(), Box::new(renderer));
        self
    }

    pub fn with(
        mut self,
        content_type: impl Into<String>,
        renderer: impl PostRenderer<O> + 'static,
    ) -> Self {
        self.register(content_type, renderer);
        self
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.renderers.contains_key(content_type)
    }

    pub fn render(&self, post: &Post) -> O {
        match self.renderers.get(post.content_type.as_str()) {
            Some(renderer) => renderer.render(post),
            None => {
                ptrace!(content_type = %post.content_type, "no renderer registered");
                O::default()
            }
        }
    }
}

impl<O: Default> Default for ContentRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> core::fmt::Debug for ContentRegistry<O> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ContentRegistry")
            .field("content_types", &self.renderers.keys().collect::<alloc::vec::Vec<_>>())
            .finish()
    }
}
