use axum::{
    extract::{Form, Multipart, Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use minijinja::context;
use tracing::instrument;

use super::{check_form_token, form_token};
use crate::{
    AppState,
    api::models::forms::{CsrfForm, UploadForm},
    auth::CurrentUser,
    db::models::team_members::{TeamMember, TeamMemberProfile},
    errors::{Error, Result},
    types::TeamMemberId,
    views::Banner,
};

const CREATE_SUCCESS: &str = "Team member was successfully created!";

fn render_create(state: &AppState, user: &CurrentUser, profile: &TeamMemberProfile, banner: Banner) -> Result<Html<String>> {
    state.views.render(
        "team/create.html",
        context! {
            user => &user.email,
            csrf_token => form_token(state, user)?,
            formats => state.images.formats(),
            profile => profile,
            banner => banner,
        },
    )
}

fn render_edit(
    state: &AppState,
    user: &CurrentUser,
    member: &TeamMember,
    profile: &TeamMemberProfile,
    banner: Banner,
) -> Result<Html<String>> {
    state.views.render(
        "team/edit.html",
        context! {
            user => &user.email,
            csrf_token => form_token(state, user)?,
            formats => state.images.formats(),
            member => member,
            profile => profile,
            banner => banner,
        },
    )
}

/// `GET /team`
#[instrument(skip_all, err)]
pub async fn list_members(State(state): State<AppState>, user: CurrentUser) -> Result<Html<String>> {
    let members = state.images.list_team_members().await?;

    state.views.render(
        "team/index.html",
        context! {
            user => &user.email,
            csrf_token => form_token(&state, &user)?,
            members => members,
        },
    )
}

/// `GET /team/{id}`
#[instrument(skip(state, user), err)]
pub async fn member_details(State(state): State<AppState>, user: CurrentUser, Path(id): Path<TeamMemberId>) -> Result<Html<String>> {
    let member = state.images.get_team_member(id).await?;

    state.views.render(
        "team/details.html",
        context! {
            user => &user.email,
            member => member,
        },
    )
}

/// `GET /team/create`
pub async fn create_form(State(state): State<AppState>, user: CurrentUser) -> Result<Html<String>> {
    render_create(&state, &user, &TeamMemberProfile::default(), Banner::default())
}

/// `POST /team/create`
#[instrument(skip_all, fields(user = %user.email), err)]
pub async fn create_member(State(state): State<AppState>, user: CurrentUser, multipart: Multipart) -> Result<Html<String>> {
    let form = UploadForm::from_multipart(multipart).await?;
    check_form_token(&state, &user, form.csrf_token())?;
    let profile = form.profile();

    match state.images.create_team_member(profile.clone(), form.file).await {
        Ok(_) => render_create(&state, &user, &TeamMemberProfile::default(), Banner::success(CREATE_SUCCESS)),
        Err(Error::Validation(e)) => render_create(&state, &user, &profile, Banner::failure(e.to_string())),
        Err(e) => Err(e),
    }
}

/// `GET /team/edit/{id}`
#[instrument(skip(state, user), err)]
pub async fn edit_form(State(state): State<AppState>, user: CurrentUser, Path(id): Path<TeamMemberId>) -> Result<Html<String>> {
    let member = state.images.get_team_member(id).await?;
    render_edit(&state, &user, &member, &member.profile(), Banner::default())
}

/// `POST /team/edit/{id}`
#[instrument(skip(state, user, multipart), err)]
pub async fn edit_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<TeamMemberId>,
    multipart: Multipart,
) -> Result<Response> {
    let form = UploadForm::from_multipart(multipart).await?;
    check_form_token(&state, &user, form.csrf_token())?;
    let profile = form.profile();

    match state.images.edit_team_member(id, profile.clone(), form.file).await {
        Ok(_) => Ok(Redirect::to("/team").into_response()),
        Err(Error::Validation(e)) => {
            let member = state.images.get_team_member(id).await?;
            Ok(render_edit(&state, &user, &member, &profile, Banner::failure(e.to_string()))?.into_response())
        }
        Err(e) => Err(e),
    }
}

/// `POST /team/delete/{id}`
#[instrument(skip(state, user, form), err)]
pub async fn delete_member(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<TeamMemberId>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect> {
    check_form_token(&state, &user, form.csrf_token.as_deref())?;

    state.images.delete_team_member(id).await?;
    Ok(Redirect::to("/team"))
}
