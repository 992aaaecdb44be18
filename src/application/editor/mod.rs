//! Rich-text editor adapter for the post form.
//!
//! One [`EditorSession`] is bound to one editor container. The browser side
//! (`static/editor.js`) mirrors these transitions.

mod drag;
mod image;

use thiserror::Error;

use crate::domain::posts::PostRecord;

pub use drag::{DragState, Point, PointerId, PointerKind, ToolbarDrag};
pub use image::image_data_url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("editor is not mounted")]
    NotMounted,
    #[error("image file is empty")]
    EmptyImage,
    #[error("`{mime}` is not an image type")]
    NotAnImage { mime: String },
}

#[derive(Debug, Default)]
struct EditorInstance {
    document: String,
}

#[derive(Debug, Default)]
pub struct EditorSession {
    instance: Option<EditorInstance>,
    initial: Option<String>,
    injected: bool,
    toolbar: ToolbarDrag,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the editor instance. Returns `false` if one already exists.
    pub fn mount(&mut self) -> bool {
        if self.instance.is_some() {
            return false;
        }
        self.instance = Some(EditorInstance::default());
        self.inject_initial();
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.instance.is_some()
    }

    /// Remember the record being edited; its content is injected once mounted.
    pub fn record_loaded(&mut self, post: &PostRecord) {
        if self.initial.is_none() {
            self.initial = Some(post.content.clone());
        }
        self.inject_initial();
    }

    fn inject_initial(&mut self) {
        if self.injected {
            return;
        }
        if let (Some(instance), Some(initial)) = (self.instance.as_mut(), self.initial.as_ref()) {
            instance.document.clone_from(initial);
            self.injected = true;
        }
    }

    /// Editor change notification. Ignored before mount.
    pub fn apply_change(&mut self, html: impl Into<String>) -> bool {
        match self.instance.as_mut() {
            Some(instance) => {
                instance.document = html.into();
                true
            }
            None => false,
        }
    }

    pub fn content(&self) -> &str {
        self.instance
            .as_ref()
            .map_or("", |instance| instance.document.as_str())
    }

    /// Embed an image as a data URL at `selection` (a byte offset into the
    /// document), or at the end when there is no selection.
    ///
    /// Returns the offset just after the inserted embed.
    pub fn insert_image(
        &mut self,
        file_name: &str,
        bytes: &[u8],
        selection: Option<usize>,
    ) -> Result<usize, EditorError> {
        let instance = self.instance.as_mut().ok_or(EditorError::NotMounted)?;
        let data_url = image_data_url(file_name, bytes)?;
        let embed = format!(r#"<img src="{data_url}">"#);

        let at = match selection {
            Some(offset) => insertion_point(&instance.document, offset),
            None => instance.document.len(),
        };
        instance.document.insert_str(at, &embed);
        Ok(at + embed.len())
    }

    pub fn toolbar(&self) -> &ToolbarDrag {
        &self.toolbar
    }

    pub fn toolbar_mut(&mut self) -> &mut ToolbarDrag {
        &mut self.toolbar
    }

    /// Drop the instance and any drag in progress.
    pub fn unmount(&mut self) {
        self.toolbar.teardown();
        self.instance = None;
        self.injected = false;
    }
}

/// Clamp `offset` into `html`, onto a char boundary and outside any tag or entity.
fn insertion_point(html: &str, offset: usize) -> usize {
    let mut at = offset.min(html.len());
    while !html.is_char_boundary(at) {
        at -= 1;
    }

    let before = &html[..at];
    let inside_tag = match (before.rfind('<'), before.rfind('>')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    };
    if inside_tag {
        at = html[at..]
            .find('>')
            .map_or(html.len(), |close| at + close + 1);
    } else if let Some(end) = entity_end(html, at) {
        at = end;
    }
    at
}

/// End of the character reference `at` falls inside, if any.
fn entity_end(html: &str, at: usize) -> Option<usize> {
    let is_name = |c: char| c.is_ascii_alphanumeric() || c == '#';

    let amp = html[..at].rfind('&')?;
    if !html[amp + 1..at].chars().all(is_name) {
        return None;
    }
    let tail = &html[at..];
    let semi = tail.find(|c: char| !is_name(c))?;
    (tail[semi..].starts_with(';') && (amp + 1 < at || semi > 0)).then_some(at + semi + 1)
}
