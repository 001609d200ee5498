//! Account pages: signup, login, logout, profile and password change

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::info;

use super::{FormPayload, parse_form, render, rerender};
use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::ModelError,
    session::{AUTHENTICATED_USER_ID, FLASH, REDIRECT_PATH_AFTER_LOGIN, pop_string},
    state::AppState,
    templates::TemplateData,
    validation::{Form, Rule, email_regex},
};

const DEFAULT_LANDING: &str = "/snippet/create";

fn signup_rules() -> [Rule; 5] {
    [
        Rule::Required(&["name", "email", "password"]),
        Rule::MaxLength("name", 255),
        Rule::MaxLength("email", 255),
        Rule::MatchesPattern("email", email_regex()),
        Rule::MinLength("password", 10),
    ]
}

const PASSWORD_RULES: &[Rule] = &[
    Rule::Required(&["currentPassword", "newPassword", "newPasswordConfirmation"]),
    Rule::MinLength("newPassword", 10),
];

/// Only same-site absolute paths may be used as a post-login target
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}

/// Show the signup form
pub async fn signup_user_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    render(
        &state,
        &session,
        "signup.html",
        TemplateData::with_form(Form::default()),
    )
    .await
}

/// Register a new account
pub async fn signup_user(
    State(state): State<AppState>,
    session: Session,
    payload: FormPayload,
) -> AppResult<Response> {
    let mut form = parse_form(payload)?;
    form.validate(&signup_rules());

    if !form.is_valid() {
        return rerender(&state, &session, "signup.html", TemplateData::with_form(form)).await;
    }

    let result = state
        .users
        .insert(form.get("name"), form.get("email"), form.get("password"))
        .await;

    match result {
        Ok(id) => {
            info!("Registered user {}", id);
            session
                .insert(FLASH, "Your signup was successful. Please log in.")
                .await?;
            Ok(Redirect::to("/user/login").into_response())
        }
        Err(ModelError::DuplicateEmail) => {
            form.errors.add("email", "Address is already in use");
            rerender(&state, &session, "signup.html", TemplateData::with_form(form)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Show the login form
pub async fn login_user_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    render(
        &state,
        &session,
        "login.html",
        TemplateData::with_form(Form::default()),
    )
    .await
}

/// Check credentials and start an authenticated session under a fresh id
pub async fn login_user(
    State(state): State<AppState>,
    session: Session,
    payload: FormPayload,
) -> AppResult<Response> {
    let mut form = parse_form(payload)?;

    let result = state
        .users
        .authenticate(form.get("email"), form.get("password"))
        .await;

    let id = match result {
        Ok(id) => id,
        Err(ModelError::InvalidCredentials) => {
            form.errors.add("generic", "Email or Password is incorrect");
            return rerender(&state, &session, "login.html", TemplateData::with_form(form)).await;
        }
        Err(e) => return Err(e.into()),
    };

    session.cycle_id().await?;
    session.insert(AUTHENTICATED_USER_ID, id).await?;

    let target = pop_string(&session, REDIRECT_PATH_AFTER_LOGIN)
        .await?
        .filter(|path| is_local_path(path))
        .unwrap_or_else(|| DEFAULT_LANDING.to_string());
    Ok(Redirect::to(&target).into_response())
}

/// End the authenticated session; the old id is discarded from the store
pub async fn logout_user(session: Session) -> AppResult<Response> {
    session.remove::<i64>(AUTHENTICATED_USER_ID).await?;
    session.cycle_id().await?;
    session
        .insert(FLASH, "You have been logged out successfully!")
        .await?;
    Ok(Redirect::to("/").into_response())
}

/// Show the logged-in user's account details
pub async fn user_profile(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<Response> {
    match state.users.get(user.id).await {
        Ok(profile) => {
            let data = TemplateData {
                user: Some(profile),
                ..TemplateData::default()
            };
            render(&state, &session, "profile.html", data).await
        }
        Err(ModelError::NotFound) => {
            info!("Session refers to missing user {}, logging out", user.id);
            session.flush().await?;
            Ok(Redirect::to("/user/login").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Show the change-password form
pub async fn change_password_form(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Response> {
    render(
        &state,
        &session,
        "password.html",
        TemplateData::with_form(Form::default()),
    )
    .await
}

/// Replace the password after checking the current one
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    Extension(user): Extension<CurrentUser>,
    payload: FormPayload,
) -> AppResult<Response> {
    let mut form = parse_form(payload)?;
    form.validate(PASSWORD_RULES);
    let confirmed = form.get("newPassword") == form.get("newPasswordConfirmation");
    form.check(confirmed, "newPasswordConfirmation", "Passwords do not match");

    if !form.is_valid() {
        return rerender(&state, &session, "password.html", TemplateData::with_form(form)).await;
    }

    let result = state
        .users
        .change_password(user.id, form.get("currentPassword"), form.get("newPassword"))
        .await;

    match result {
        Ok(()) => {
            session
                .insert(FLASH, "Your password has been updated!")
                .await?;
            Ok(Redirect::to("/user/profile").into_response())
        }
        Err(ModelError::InvalidCredentials) => {
            form.errors.add("currentPassword", "Current password is incorrect");
            rerender(&state, &session, "password.html", TemplateData::with_form(form)).await
        }
        Err(e) => Err(e.into()),
    }
}
