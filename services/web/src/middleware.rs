//! Authentication guard for routes that need a logged-in user

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::debug;

use crate::{
    error::AppResult,
    session::{AUTHENTICATED_USER_ID, REDIRECT_PATH_AFTER_LOGIN},
};

/// Authenticated user information
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
}

/// Let the request through only when the session names a user
///
/// Anonymous callers are sent to the login page. For GET requests the path
/// is remembered so login can return them there.
pub async fn require_authentication(
    session: Session,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let Some(id) = session.get::<i64>(AUTHENTICATED_USER_ID).await? else {
        let path = req
            .uri()
            .path_and_query()
            .map_or("/", |pq| pq.as_str())
            .to_string();
        debug!("Anonymous request for {}, redirecting to login", path);
        if req.method() == Method::GET {
            session.insert(REDIRECT_PATH_AFTER_LOGIN, path).await?;
        }
        return Ok(Redirect::to("/user/login").into_response());
    };

    req.extensions_mut().insert(CurrentUser { id });
    Ok(next.run(req).await)
}
