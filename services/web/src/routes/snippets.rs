//! Snippet pages: listings, detail, create, edit and delete

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::warn;

use super::{FormPayload, parse_form, parse_id, render, rerender};
use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{ModelError, Snippet, SnippetListing, snippet::EXPIRY_OPTIONS},
    session::FLASH,
    state::AppState,
    templates::TemplateData,
    validation::{Form, Rule},
};

const SNIPPET_RULES: &[Rule] = &[
    Rule::Required(&["title", "content", "expires"]),
    Rule::MaxLength("title", 100),
    Rule::PermittedValues("expires", EXPIRY_OPTIONS),
];

/// Owner's display name, or `None` when the lookup fails
async fn author_of(state: &AppState, user_id: i64) -> Option<String> {
    match state.snippets.get_author(user_id).await {
        Ok(name) => Some(name),
        Err(e) => {
            warn!("Could not resolve author {}: {}", user_id, e);
            None
        }
    }
}

async fn with_authors(state: &AppState, snippets: Vec<Snippet>) -> Vec<SnippetListing> {
    let mut listings = Vec::with_capacity(snippets.len());
    for snippet in snippets {
        let author = author_of(state, snippet.user_id).await;
        listings.push(SnippetListing { snippet, author });
    }
    listings
}

/// A live snippet belonging to `user`; anyone else's is reported missing
async fn owned_snippet(state: &AppState, id: i64, user: CurrentUser) -> AppResult<Snippet> {
    let snippet = state.snippets.get(id).await?;
    if snippet.user_id != user.id {
        return Err(AppError::NotFound);
    }
    Ok(snippet)
}

fn expiry_days(form: &Form) -> AppResult<i32> {
    form.get("expires")
        .parse()
        .map_err(|_| AppError::BadRequest)
}

/// Latest live snippets with their authors
pub async fn home(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    let snippets = state.snippets.latest().await?;
    let listings = with_authors(&state, snippets).await;

    let data = TemplateData {
        listings,
        ..TemplateData::default()
    };
    render(&state, &session, "home.html", data).await
}

/// A single live snippet
pub async fn show_snippet(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let snippet = state.snippets.get(id).await?;
    let author = author_of(&state, snippet.user_id).await;

    let data = TemplateData {
        snippet: Some(snippet),
        author,
        ..TemplateData::default()
    };
    render(&state, &session, "show.html", data).await
}

/// Show the create form
pub async fn create_snippet_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    render(
        &state,
        &session,
        "create.html",
        TemplateData::with_form(Form::default()),
    )
    .await
}

/// Store a new snippet owned by the current user
pub async fn create_snippet(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    payload: FormPayload,
) -> AppResult<Response> {
    let mut form = parse_form(payload)?;
    form.validate(SNIPPET_RULES);

    if !form.is_valid() {
        return rerender(&state, &session, "create.html", TemplateData::with_form(form)).await;
    }

    let id = state
        .snippets
        .insert(
            form.get("title"),
            form.get("content"),
            expiry_days(&form)?,
            user.id,
        )
        .await?;

    session.insert(FLASH, "Quote successfully created!").await?;
    Ok(Redirect::to(&format!("/snippet/{id}")).into_response())
}

/// Show the edit form prefilled from the stored snippet
pub async fn edit_snippet_form(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let snippet = owned_snippet(&state, id, user).await?;

    let mut form = Form::default();
    form.set("title", snippet.title.as_str());
    form.set("content", snippet.content.as_str());

    let data = TemplateData {
        form: Some(form),
        snippet: Some(snippet),
        ..TemplateData::default()
    };
    render(&state, &session, "edit.html", data).await
}

/// Overwrite a snippet and restart its expiry window
pub async fn edit_snippet(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    payload: FormPayload,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    let snippet = owned_snippet(&state, id, user).await?;

    let mut form = parse_form(payload)?;
    form.validate(SNIPPET_RULES);

    if form.is_valid() {
        let result = state
            .snippets
            .update(
                form.get("title"),
                form.get("content"),
                expiry_days(&form)?,
                id,
            )
            .await;

        match result {
            Ok(()) => {
                session.insert(FLASH, "Quote successfully edited!").await?;
                return Ok(Redirect::to(&format!("/snippet/{id}")).into_response());
            }
            Err(ModelError::RowCountMismatch(n)) => {
                warn!("Update of snippet {} affected {} rows", id, n);
                form.errors.add("generic", "Quote no longer exists");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = TemplateData {
        form: Some(form),
        snippet: Some(snippet),
        ..TemplateData::default()
    };
    rerender(&state, &session, "edit.html", data).await
}

/// Remove one of the current user's snippets
pub async fn delete_snippet(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = parse_id(&id)?;
    owned_snippet(&state, id, user).await?;

    if state.snippets.delete(id).await? == 0 {
        return Err(AppError::NotFound);
    }

    session.insert(FLASH, "Quote successfully deleted!").await?;
    Ok(Redirect::to("/snippets/mine").into_response())
}

/// The current user's live snippets
pub async fn my_snippets(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Response> {
    let snippets = state
        .snippets
        .latest()
        .await?
        .into_iter()
        .filter(|snippet| snippet.user_id == user.id)
        .collect();

    let data = TemplateData {
        snippets,
        ..TemplateData::default()
    };
    render(&state, &session, "mysnippets.html", data).await
}
