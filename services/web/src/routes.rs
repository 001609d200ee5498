//! Snippetbox routes

use axum::{
    Router,
    extract::{State, rejection::FormRejection},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::Session;
use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    middleware::require_authentication,
    session::{AUTHENTICATED_USER_ID, FLASH, pop_string},
    state::AppState,
    templates::TemplateData,
    validation::Form,
};

pub mod snippets;
pub mod users;


/// Raw urlencoded body as decoded by axum, rejection included
pub type FormPayload = Result<axum::Form<Vec<(String, String)>>, FormRejection>;

/// Create the router for the web service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/snippet/create",
            get(snippets::create_snippet_form).post(snippets::create_snippet),
        )
        .route(
            "/snippet/:id/edit",
            get(snippets::edit_snippet_form).post(snippets::edit_snippet),
        )
        .route("/snippet/:id/delete", post(snippets::delete_snippet))
        .route("/snippets/mine", get(snippets::my_snippets))
        .route("/user/logout", post(users::logout_user))
        .route("/user/profile", get(users::user_profile))
        .route(
            "/user/profile/password",
            get(users::change_password_form).post(users::change_password),
        )
        .route_layer(middleware::from_fn(require_authentication));

    Router::new()
        .route("/", get(snippets::home))
        .route("/about", get(about))
        .route("/ping", get(ping))
        .route("/snippet/:id", get(snippets::show_snippet))
        .route(
            "/user/signup",
            get(users::signup_user_form).post(users::signup_user),
        )
        .route(
            "/user/login",
            get(users::login_user_form).post(users::login_user),
        )
        .merge(protected_routes)
        .layer(state.sessions.clone())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness check
pub async fn ping() -> &'static str {
    "OK"
}

/// Static about page
pub async fn about(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    render(&state, &session, "about.html", TemplateData::default()).await
}

/// Render a page, consuming the pending flash message
pub(crate) async fn render(
    state: &AppState,
    session: &Session,
    view: &str,
    mut data: TemplateData,
) -> AppResult<Response> {
    data.flash = pop_string(session, FLASH).await?;
    render_page(state, session, view, data).await
}

/// Re-render a submitted form; any pending flash is left for the next page
pub(crate) async fn rerender(
    state: &AppState,
    session: &Session,
    view: &str,
    data: TemplateData,
) -> AppResult<Response> {
    render_page(state, session, view, data).await
}

async fn render_page(
    state: &AppState,
    session: &Session,
    view: &str,
    mut data: TemplateData,
) -> AppResult<Response> {
    data.current_user_id = session.get::<i64>(AUTHENTICATED_USER_ID).await?;
    data.is_authenticated = data.current_user_id.is_some();

    let body = state.templates.render(view, data)?;
    Ok(Html(body).into_response())
}

/// Positive integer id from a path segment; anything else is a 404
pub(crate) fn parse_id(raw: &str) -> AppResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound),
    }
}

/// Turn a decoded body into a [`Form`], rejecting undecodable bodies with 400
pub(crate) fn parse_form(payload: FormPayload) -> AppResult<Form> {
    match payload {
        Ok(axum::Form(pairs)) => Ok(Form::new(pairs)),
        Err(rejection) => {
            debug!("Rejected form body: {}", rejection);
            Err(AppError::BadRequest)
        }
    }
}
