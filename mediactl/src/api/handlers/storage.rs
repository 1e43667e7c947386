use axum::{
    extract::{Form, Multipart, State},
    response::{Html, Redirect},
};
use minijinja::context;
use tracing::instrument;

use super::{check_form_token, form_token};
use crate::{
    AppState,
    api::models::forms::{DeleteImageForm, UploadForm},
    auth::CurrentUser,
    errors::{Error, Result},
    images::ValidationError,
    views::Banner,
};

const UPLOAD_SUCCESS: &str = "Image was successfully uploaded!";

fn render_upload(state: &AppState, user: &CurrentUser, banner: Banner) -> Result<Html<String>> {
    state.views.render(
        "storage/upload.html",
        context! {
            user => &user.email,
            csrf_token => form_token(state, user)?,
            formats => state.images.formats(),
            banner => banner,
        },
    )
}

/// `GET /storage`
#[instrument(skip_all, err)]
pub async fn list_images(State(state): State<AppState>, user: CurrentUser) -> Result<Html<String>> {
    let entries = state.images.list_storage_entries().await?;

    state.views.render(
        "storage/index.html",
        context! {
            user => &user.email,
            csrf_token => form_token(&state, &user)?,
            entries => entries,
        },
    )
}

/// `GET /storage/upload`
pub async fn upload_form(State(state): State<AppState>, user: CurrentUser) -> Result<Html<String>> {
    render_upload(&state, &user, Banner::default())
}

/// `POST /storage/upload`
#[instrument(skip_all, fields(user = %user.email), err)]
pub async fn upload_image(State(state): State<AppState>, user: CurrentUser, multipart: Multipart) -> Result<Html<String>> {
    let form = UploadForm::from_multipart(multipart).await?;
    check_form_token(&state, &user, form.csrf_token())?;

    let Some(file) = form.file else {
        return render_upload(&state, &user, Banner::failure(ValidationError::MissingFile.to_string()));
    };

    match state.images.upload_storage_image(file).await {
        Ok(_) => render_upload(&state, &user, Banner::success(UPLOAD_SUCCESS)),
        Err(Error::Validation(e)) => render_upload(&state, &user, Banner::failure(e.to_string())),
        Err(e) => Err(e),
    }
}

/// `POST /storage/delete`
#[instrument(skip_all, fields(user = %user.email), err)]
pub async fn delete_image(State(state): State<AppState>, user: CurrentUser, Form(form): Form<DeleteImageForm>) -> Result<Redirect> {
    check_form_token(&state, &user, form.csrf_token.as_deref())?;

    let image_name = form
        .image_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| Error::BadRequest {
            message: "ImageName cant be null.".to_string(),
        })?;

    state.images.delete_storage_image(image_name).await?;
    Ok(Redirect::to("/storage"))
}
