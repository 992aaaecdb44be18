//! Admin post screens: listing, delete confirmation, the post form and editor image inserts.

use axum::{
    Form, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Multipart, cookie::CookieJar};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    application::{
        editor::{EditorSession, image_data_url},
        error::{ErrorReport, HttpError},
        posts::{FormToken, PostError, PostListing, SubmitPostCommand},
        render::ADMIN_EXCERPT_CHARS,
    },
    domain::{
        pagination::PageCursor,
        posts::{PostId, PostRecord},
    },
    presentation::views::{
        AdminListContext, AdminListTemplate, DeleteConfirmContext, DeleteConfirmTemplate,
        ErrorPageView, ErrorTemplate, LayoutChrome, LayoutContext, PaginationView, PostCard,
        PostFormContext, PostFormTemplate, PostSavedContext, PostSavedTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::{
    ADMIN_HOME_PATH, HttpState,
    cookies::CookieStorage,
    multipart::{read_editor_image, read_post_submission},
    public::PageQuery,
};

const SAVED_MESSAGE: &str = "Post saved successfully!";

#[derive(Debug, Default, Deserialize)]
pub(super) struct FormQuery {
    id: Option<String>,
}

pub(super) async fn blog_home(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = state.chrome(&CookieStorage::new(jar)).with_title("Blog");

    match PostListing::open(state.posts.clone(), query.page()).await {
        Ok(listing) => admin_list_response(chrome, &listing, None),
        Err(err) => {
            warn!(
                target = "folio::http::posts",
                error = %err,
                "admin listing could not load posts"
            );
            let content = AdminListContext {
                posts: Vec::new(),
                pagination: PaginationView::new(PageCursor::new(0), ADMIN_HOME_PATH, ""),
                total_count: 0,
                notice: Some(err.user_message()),
                flash: None,
            };
            let view = LayoutContext::new(chrome, content);
            render_template_response(AdminListTemplate { view }, StatusCode::OK)
        }
    }
}

pub(super) async fn delete_confirm(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let chrome = state.chrome(&CookieStorage::new(jar));
    let Some(id) = PostId::parse(&id) else {
        return render_not_found_response(chrome);
    };

    match state.posts.load_one(&id).await {
        Ok(post) => delete_confirm_response(chrome, &post, query.page(), None, StatusCode::OK),
        Err(PostError::NotFound) => render_not_found_response(chrome),
        Err(err) => load_failure_response(chrome, &err),
    }
}

pub(super) async fn delete_post(
    State(state): State<HttpState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<PageQuery>,
) -> Response {
    let chrome = state.chrome(&CookieStorage::new(jar));
    let Some(id) = PostId::parse(&id) else {
        return render_not_found_response(chrome);
    };
    let page = form.page();

    let mut listing = match PostListing::open(state.posts.clone(), page).await {
        Ok(listing) => listing,
        Err(err) => return load_failure_response(chrome, &err),
    };
    let shown = listing.posts().iter().any(|post| post.id == id);

    let outcome = if shown {
        listing.delete(&id).await.map(|removed| (removed, listing))
    } else {
        // The page moved underneath the confirmation; delete directly and reload.
        delete_off_page(&state, &id, page).await
    };

    match outcome {
        Ok((removed, listing)) => {
            info!(
                target = "folio::http::posts",
                post_id = %removed.id,
                "post deleted"
            );
            let flash = format!("Deleted \u{201c}{}\u{201d}.", removed.title);
            admin_list_response(chrome.with_title("Blog"), &listing, Some(flash))
        }
        Err(PostError::NotFound) => render_not_found_response(chrome),
        Err(err) => {
            let Ok(post) = state.posts.load_one(&id).await else {
                return load_failure_response(chrome, &err);
            };
            let mut response = delete_confirm_response(
                chrome,
                &post,
                page,
                Some(err.user_message()),
                StatusCode::BAD_GATEWAY,
            );
            ErrorReport::from_error(
                "infra::http::posts::delete_post",
                StatusCode::BAD_GATEWAY,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn delete_off_page(
    state: &HttpState,
    id: &PostId,
    page: u32,
) -> Result<(PostRecord, PostListing), PostError> {
    let post = state.posts.load_one(id).await?;
    state.posts.delete(&post).await?;
    let listing = PostListing::open(state.posts.clone(), page).await?;
    Ok((post, listing))
}

pub(super) async fn post_form(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<FormQuery>,
) -> Response {
    let chrome = state.chrome(&CookieStorage::new(jar));
    let token = FormToken::new().to_string();

    let Some(raw_id) = query.id.filter(|raw| !raw.trim().is_empty()) else {
        let content = PostFormContext {
            id: None,
            token,
            title: String::new(),
            author: String::new(),
            description: String::new(),
            content: String::new(),
            content_html: String::new(),
            current_image_url: None,
            error: None,
        };
        return post_form_response(chrome, content, StatusCode::OK);
    };

    let Some(id) = PostId::parse(&raw_id) else {
        return render_not_found_response(chrome);
    };

    match state.posts.load_one(&id).await {
        Ok(post) => {
            let mut editor = EditorSession::new();
            editor.mount();
            editor.record_loaded(&post);

            let content = PostFormContext {
                id: Some(post.id.to_string()),
                token,
                title: post.title,
                author: post.author,
                description: post.description,
                content: String::new(),
                content_html: String::new(),
                current_image_url: post.image_url,
                error: None,
            }
            .with_content(editor.content().to_string());
            post_form_response(chrome, content, StatusCode::OK)
        }
        Err(PostError::NotFound) => render_not_found_response(chrome),
        Err(err) => load_failure_response(chrome, &err),
    }
}

pub(super) async fn submit_post(
    State(state): State<HttpState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    const SOURCE: &str = "infra::http::posts::submit_post";

    let chrome = state.chrome(&CookieStorage::new(jar));
    let submission = match read_post_submission(&mut multipart).await {
        Ok(submission) => submission,
        Err(err) => return err.into_http(SOURCE).into_response(),
    };

    let token = submission.token.unwrap_or_default();
    let command = SubmitPostCommand {
        form: submission.form.clone(),
        image: submission.image,
        existing_id: submission.id.clone(),
        token,
    };

    match state.posts.submit(command).await {
        Ok(post) => {
            info!(
                target = "folio::http::posts",
                post_id = %post.id,
                edited = submission.id.is_some(),
                "post saved"
            );
            let content = PostSavedContext {
                message: SAVED_MESSAGE,
                redirect_seconds: state.redirect_delay.as_secs(),
                redirect_to: ADMIN_HOME_PATH,
            };
            let view = LayoutContext::new(chrome.with_title("Post saved"), content);
            render_template_response(PostSavedTemplate { view }, StatusCode::OK)
        }
        Err(err) => {
            let status = submit_error_status(&err);
            let form = submission.form;
            let content = PostFormContext {
                id: submission.id.map(|id| id.to_string()),
                token: token.to_string(),
                title: form.title,
                author: form.author,
                description: form.description,
                content: String::new(),
                content_html: String::new(),
                current_image_url: None,
                error: Some(err.user_message()),
            }
            .with_content(form.content);

            let mut response = post_form_response(chrome, content, status);
            ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
            response
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct EditorImageResponse {
    data_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<usize>,
}

/// Turn an uploaded file into an inline data URL, optionally splicing it into
/// submitted editor content at `selection`.
pub(super) async fn editor_image(
    mut multipart: Multipart,
) -> Result<Json<EditorImageResponse>, HttpError> {
    const SOURCE: &str = "infra::http::posts::editor_image";

    let part = read_editor_image(&mut multipart)
        .await
        .map_err(|err| err.into_http(SOURCE))?;

    let rejected = |err: &dyn std::error::Error| {
        HttpError::from_error(
            SOURCE,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Only image files can be inserted",
            err,
        )
    };

    let data_url = image_data_url(&part.file_name, &part.data).map_err(|err| rejected(&err))?;

    let Some(content) = part.content else {
        return Ok(Json(EditorImageResponse {
            data_url,
            content: None,
            cursor: None,
        }));
    };

    let mut editor = EditorSession::new();
    editor.mount();
    editor.apply_change(content);
    let cursor = editor
        .insert_image(&part.file_name, &part.data, part.selection)
        .map_err(|err| rejected(&err))?;

    Ok(Json(EditorImageResponse {
        data_url,
        content: Some(editor.content().to_string()),
        cursor: Some(cursor),
    }))
}

fn submit_error_status(err: &PostError) -> StatusCode {
    match err {
        PostError::Invalid(_) | PostError::UnsupportedImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PostError::SubmissionInFlight => StatusCode::CONFLICT,
        PostError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn admin_list_response(
    chrome: LayoutChrome,
    listing: &PostListing,
    flash: Option<String>,
) -> Response {
    let content = AdminListContext {
        posts: listing
            .posts()
            .iter()
            .map(|post| PostCard::from_record(post, ADMIN_EXCERPT_CHARS))
            .collect(),
        pagination: PaginationView::new(listing.cursor(), ADMIN_HOME_PATH, ""),
        total_count: listing.total_count(),
        notice: None,
        flash,
    };
    let view = LayoutContext::new(chrome, content);
    render_template_response(AdminListTemplate { view }, StatusCode::OK)
}

fn delete_confirm_response(
    chrome: LayoutChrome,
    post: &PostRecord,
    page: u32,
    error: Option<String>,
    status: StatusCode,
) -> Response {
    let content = DeleteConfirmContext {
        id: post.id.to_string(),
        title: post.title.clone(),
        page,
        error,
    };
    let view = LayoutContext::new(chrome.with_title("Delete post"), content);
    render_template_response(DeleteConfirmTemplate { view }, status)
}

fn post_form_response(chrome: LayoutChrome, content: PostFormContext, status: StatusCode) -> Response {
    let chrome = chrome.with_title(content.heading());
    let view = LayoutContext::new(chrome, content);
    render_template_response(PostFormTemplate { view }, status)
}

fn load_failure_response(chrome: LayoutChrome, err: &PostError) -> Response {
    let view = LayoutContext::new(
        chrome.with_title("Unavailable"),
        ErrorPageView::new("Something went wrong", err.user_message()),
    );
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::BAD_GATEWAY);
    ErrorReport::from_error(
        "infra::http::posts::load_failure",
        StatusCode::BAD_GATEWAY,
        err,
    )
    .attach(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use crate::{application::repos::RepoError, domain::error::DomainError};

    use super::*;

    #[test]
    fn submit_errors_map_to_statuses() {
        assert_eq!(
            submit_error_status(&PostError::Invalid(DomainError::missing("title"))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            submit_error_status(&PostError::SubmissionInFlight),
            StatusCode::CONFLICT
        );
        assert_eq!(
            submit_error_status(&PostError::Save(RepoError::Timeout)),
            StatusCode::BAD_GATEWAY
        );
    }
}
