//! Multipart readers for the post form and the editor image endpoint.

use axum::http::StatusCode;
use axum_extra::extract::{Multipart, multipart::MultipartError};
use bytes::Bytes;
use thiserror::Error;

use crate::{
    application::{
        error::HttpError,
        posts::{FormToken, ImageUpload},
    },
    domain::posts::{PostForm, PostId},
};

#[derive(Debug, Error)]
pub(super) enum MultipartReadError {
    #[error("request body exceeds the upload limit")]
    TooLarge,
    #[error("malformed multipart body: {0}")]
    Malformed(String),
    #[error("missing `{0}` field")]
    Missing(&'static str),
}

impl MultipartReadError {
    pub(super) fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Malformed(_) | Self::Missing(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub(super) fn into_http(self, source: &'static str) -> HttpError {
        let public_message = match &self {
            Self::TooLarge => "Upload is too large",
            Self::Malformed(_) => "Invalid form submission",
            Self::Missing(_) => "Required field missing",
        };
        HttpError::from_error(source, self.status(), public_message, &self)
    }
}

impl From<MultipartError> for MultipartReadError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::TooLarge
        } else {
            Self::Malformed(err.body_text())
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct PostSubmission {
    pub form: PostForm,
    pub id: Option<PostId>,
    pub token: Option<FormToken>,
    pub image: Option<ImageUpload>,
}

pub(super) async fn read_post_submission(
    multipart: &mut Multipart,
) -> Result<PostSubmission, MultipartReadError> {
    let mut submission = PostSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let declared = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                let content_type = declared.unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
                submission.image = Some(ImageUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            "title" => submission.form.title = field.text().await?,
            "author" => submission.form.author = field.text().await?,
            "description" => submission.form.description = field.text().await?,
            "content" => submission.form.content = field.text().await?,
            "token" => submission.token = FormToken::parse(field.text().await?.trim()),
            "id" => submission.id = PostId::parse(&field.text().await?),
            _ => {
                field.bytes().await?;
            }
        }
    }

    Ok(submission)
}

#[derive(Debug)]
pub(super) struct EditorImagePart {
    pub file_name: String,
    pub data: Bytes,
    pub content: Option<String>,
    pub selection: Option<usize>,
}

pub(super) async fn read_editor_image(
    multipart: &mut Multipart,
) -> Result<EditorImagePart, MultipartReadError> {
    let mut file = None;
    let mut content = None;
    let mut selection = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                file = Some((file_name, data));
            }
            "content" => content = Some(field.text().await?),
            "selection" => selection = field.text().await?.trim().parse().ok(),
            _ => {
                field.bytes().await?;
            }
        }
    }

    let (file_name, data) = file.ok_or(MultipartReadError::Missing("file"))?;
    Ok(EditorImagePart {
        file_name,
        data,
        content,
        selection,
    })
}
