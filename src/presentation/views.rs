use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{
        error::{ErrorReport, HttpError},
        preferences::ThemePreference,
        render::{excerpt, sanitize_html},
        site::{Project, SiteProfile, SocialLink},
    },
    domain::{pagination::PageCursor, posts::PostRecord},
    util::dates::format_date,
};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let view = LayoutContext::new(chrome, ErrorPageView::not_found());
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: String,
    pub title: String,
    pub navigation: Vec<NavigationLinkView>,
    pub theme: &'static str,
    pub next_theme: &'static str,
    pub is_authenticated: bool,
    pub footer: String,
}

impl LayoutChrome {
    pub fn new(site: &SiteProfile, theme: ThemePreference, is_authenticated: bool) -> Self {
        let mut navigation = vec![
            link("Home", "/#home"),
            link("Portfolio", "/#portfolio"),
            link("Blog", "/#blog"),
            link("Contact", "/#contact"),
        ];
        if is_authenticated {
            navigation.push(link("Dashboard", "/blog-home"));
        }

        Self {
            brand: site.owner_name.clone(),
            title: site.owner_name.clone(),
            navigation,
            theme: theme.as_str(),
            next_theme: theme.toggled().as_str(),
            is_authenticated,
            footer: format!("© {}", site.owner_name),
        }
    }

    pub fn with_title(self, title: impl AsRef<str>) -> Self {
        Self {
            title: format!("{} · {}", title.as_ref(), self.brand),
            ..self
        }
    }
}

fn link(label: &str, href: &str) -> NavigationLinkView {
    NavigationLinkView {
        label: label.to_string(),
        href: href.to_string(),
    }
}

pub struct LayoutContext<T> {
    pub chrome: LayoutChrome,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self { chrome, content }
    }
}

#[derive(Clone)]
pub struct PostCard {
    pub id: String,
    pub title: String,
    pub author: String,
    pub excerpt: String,
    pub date: String,
    pub image_url: Option<String>,
}

impl PostCard {
    pub fn from_record(post: &PostRecord, excerpt_chars: usize) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            author: post.author.clone(),
            excerpt: excerpt(&post.description, excerpt_chars),
            date: format_date(post.created_at),
            image_url: post.image_url.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PageLinkView {
    pub number: u32,
    pub href: String,
    pub is_current: bool,
}

#[derive(Clone)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub pages: Vec<PageLinkView>,
}

impl PaginationView {
    /// Links for `cursor`; `anchor` is appended to every href (e.g. `#blog`).
    pub fn new(cursor: PageCursor, base_path: &str, anchor: &str) -> Self {
        let href = |page: u32| format!("{base_path}?page={page}{anchor}");
        Self {
            current: cursor.current(),
            total_pages: cursor.total_pages(),
            previous_href: cursor.previous().map(href),
            next_href: cursor.next().map(href),
            pages: (1..=cursor.total_pages())
                .map(|number| PageLinkView {
                    number,
                    href: href(number),
                    is_current: number == cursor.current(),
                })
                .collect(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.total_pages > 1
    }
}

pub struct ProfileView {
    pub owner_name: String,
    pub handle: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub initials: String,
    pub mailto: Option<String>,
    pub contact_email: Option<String>,
    pub links: Vec<SocialLink>,
    pub projects: Vec<Project>,
}

impl From<&SiteProfile> for ProfileView {
    fn from(site: &SiteProfile) -> Self {
        Self {
            owner_name: site.owner_name.clone(),
            handle: site.handle.clone(),
            bio: site.bio.clone(),
            avatar_url: site.avatar_url.clone(),
            initials: site.initials(),
            mailto: site.mailto(),
            contact_email: site.contact_email.clone(),
            links: site.links.clone(),
            projects: site.projects.clone(),
        }
    }
}

pub struct HomeContext {
    pub profile: ProfileView,
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeContext>,
}

pub struct LoginContext {
    pub username: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginContext>,
}

pub struct AdminListContext {
    pub posts: Vec<PostCard>,
    pub pagination: PaginationView,
    pub total_count: u64,
    pub notice: Option<String>,
    pub flash: Option<String>,
}

#[derive(Template)]
#[template(path = "blog_home.html")]
pub struct AdminListTemplate {
    pub view: LayoutContext<AdminListContext>,
}

pub struct DeleteConfirmContext {
    pub id: String,
    pub title: String,
    pub page: u32,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "delete_confirm.html")]
pub struct DeleteConfirmTemplate {
    pub view: LayoutContext<DeleteConfirmContext>,
}

pub struct PostFormContext {
    pub id: Option<String>,
    pub token: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Raw editor HTML for the hidden form field.
    pub content: String,
    /// Sanitized copy shown in the editing surface.
    pub content_html: String,
    pub current_image_url: Option<String>,
    pub error: Option<String>,
}

impl PostFormContext {
    pub fn heading(&self) -> &'static str {
        if self.id.is_some() {
            "Edit post"
        } else {
            "New post"
        }
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content_html = sanitize_html(&content);
        self.content = content;
        self
    }
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

pub struct PostSavedContext {
    pub message: &'static str,
    pub redirect_seconds: u64,
    pub redirect_to: &'static str,
}

#[derive(Template)]
#[template(path = "post_saved.html")]
pub struct PostSavedTemplate {
    pub view: LayoutContext<PostSavedContext>,
}

pub struct PostDetailContext {
    pub id: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub edited_on: Option<String>,
    pub image_url: Option<String>,
    pub content_html: String,
}

impl From<&PostRecord> for PostDetailContext {
    fn from(post: &PostRecord) -> Self {
        let edited_on = post
            .has_been_edited()
            .then_some(post.updated_at)
            .flatten()
            .map(format_date);

        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            author: post.author.clone(),
            date: format_date(post.created_at),
            edited_on,
            image_url: post.image_url.clone(),
            content_html: sanitize_html(&post.content),
        }
    }
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
}

impl ErrorPageView {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
