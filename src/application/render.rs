//! Sanitization of stored post HTML before it reaches a template.

use std::{borrow::Cow, collections::HashSet};

use ammonia::Builder as AmmoniaBuilder;
use once_cell::sync::Lazy;

use crate::util::html::{strip_tags, truncate_chars};

/// Excerpt length on the public home listing.
pub const PUBLIC_EXCERPT_CHARS: usize = 100;
/// Excerpt length on the admin listing.
pub const ADMIN_EXCERPT_CHARS: usize = 50;

static POST_SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(build_post_sanitizer);

fn build_post_sanitizer() -> AmmoniaBuilder<'static> {
    let mut builder = AmmoniaBuilder::default();

    let tags: HashSet<&'static str> = HashSet::from([
        "a",
        "blockquote",
        "br",
        "code",
        "div",
        "em",
        "h1",
        "h2",
        "h3",
        "h4",
        "h5",
        "h6",
        "hr",
        "i",
        "img",
        "li",
        "ol",
        "p",
        "pre",
        "s",
        "span",
        "strong",
        "sub",
        "sup",
        "u",
        "ul",
    ]);
    builder.tags(tags);

    // Editor output carries alignment, indent and size classes.
    builder.generic_attributes(HashSet::from(["class", "title", "lang", "dir"]));
    builder.add_tag_attributes("a", &["target"]);
    builder.add_tag_attributes("img", &["alt", "title", "width", "height"]);
    builder.add_tag_attributes("pre", &["spellcheck"]);
    builder.add_tag_attributes("li", &["data-list"]);

    builder.url_schemes(HashSet::from(["http", "https", "mailto", "data"]));
    builder.attribute_filter(|element, attribute, value| {
        if is_data_url(value) && !(element == "img" && attribute == "src") {
            return None;
        }
        if attribute == "src" && is_data_url(value) && !is_inline_image(value) {
            return None;
        }
        Some(Cow::Borrowed(value))
    });

    builder
}

fn is_data_url(value: &str) -> bool {
    value
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

fn is_inline_image(value: &str) -> bool {
    value
        .get(..11)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:image/"))
}

/// Remove active content from stored HTML.
pub fn sanitize_html(html: &str) -> String {
    POST_SANITIZER.clean(html).to_string()
}

/// Plain-text excerpt of a description, cut to `max_chars`.
pub fn excerpt(description: &str, max_chars: usize) -> String {
    let text = strip_tags(description);
    let truncated = truncate_chars(text.trim(), max_chars);
    sanitize_html(&truncated)
}
