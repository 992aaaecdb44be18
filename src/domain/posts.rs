//! Blog post records and the write payload built from the edit form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::{domain::error::DomainError, util::html::strip_tags};

/// Store-assigned post identifier.
///
/// Rows may carry numeric or textual keys; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Accept a raw identifier from a path or query string.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PostId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Integer(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Integer(value) => Self(value.to_string()),
            RawId::Text(value) => Self(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    #[serde(default, deserialize_with = "nullable_text")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub author: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable_text")]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(with = "crate::util::timestamps")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "crate::util::timestamps::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl PostRecord {
    /// True only when the record was updated strictly after it was created.
    pub fn has_been_edited(&self) -> bool {
        self.updated_at
            .is_some_and(|updated_at| updated_at > self.created_at)
    }
}

fn nullable_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw field values as submitted from the edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub author: String,
    pub description: String,
    pub content: String,
}

impl PostForm {
    /// Validate the form into a write payload.
    ///
    /// `image_url` is only set when a new cover image was stored; leaving it
    /// out keeps any existing URL on update.
    pub fn into_payload(self, image_url: Option<String>) -> Result<PostPayload, DomainError> {
        let title = required_line(self.title, "Title")?;
        let author = required_line(self.author, "Author")?;
        let description = required_line(self.description, "Description")?;
        if is_blank_html(&self.content) {
            return Err(DomainError::missing("Content"));
        }

        Ok(PostPayload {
            title,
            content: self.content,
            author,
            description,
            image_url,
        })
    }
}

fn required_line(value: String, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::missing(field));
    }
    Ok(trimmed.to_string())
}

/// An editor document with no text and no embeds, such as `<p><br></p>`.
pub fn is_blank_html(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    if ["<img", "<iframe", "<video"]
        .iter()
        .any(|embed| lower.contains(embed))
    {
        return false;
    }

    strip_tags(html).replace("&nbsp;", " ").trim().is_empty()
}

/// Validated record body sent to the store on insert or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub author: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
