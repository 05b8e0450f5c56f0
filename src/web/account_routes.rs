// Registration, login and dashboards.
//
// Sessions are server-side: the cookie only carries an opaque token that
// the SessionStore maps back to the signed-in account.

use super::error::ApiError;
use super::state::AppState;
use crate::core::accounts::{
    AccountError, AccountKind, LoginForm, NewDoctor, NewUser, SessionIdentity,
};
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use serde_json::{json, Value};

pub const SESSION_COOKIE: &str = "medassist_session";

const USER_DASHBOARD: &str = "/dashboard-user";
const DOCTOR_DASHBOARD: &str = "/dashboard-doctor";
const LOGIN_PAGE: &str = "/login";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register-user", get(user_form).post(register_user))
        .route("/register-doctor", get(doctor_form).post(register_doctor))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .route(USER_DASHBOARD, get(user_dashboard))
        .route(DOCTOR_DASHBOARD, get(doctor_dashboard))
}

// ============================================================================
// SESSION COOKIE HELPERS
// ============================================================================

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Finds the session token among the request's cookies.
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

fn dashboard_for(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::User => USER_DASHBOARD,
        AccountKind::Doctor => DOCTOR_DASHBOARD,
    }
}

/// Opens a session and redirects (303) to the account's dashboard.
fn sign_in(state: &AppState, identity: SessionIdentity) -> Response {
    let target = dashboard_for(identity.kind);
    tracing::info!(
        account_id = identity.account_id,
        kind = identity.kind.as_str(),
        "Session started"
    );
    let token = state.sessions.create(identity);

    ([(SET_COOKIE, session_cookie(&token))], Redirect::to(target)).into_response()
}

/// The session's identity, if it belongs to an account of `kind`.
fn current_identity(
    state: &AppState,
    headers: &HeaderMap,
    kind: AccountKind,
) -> Option<SessionIdentity> {
    let identity = state.sessions.get(&session_token(headers)?)?;
    (identity.kind == kind).then_some(identity)
}

fn form_rejected(rejection: FormRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

// ============================================================================
// FORMS
// ============================================================================

fn form_description(action: &str, fields: &[&str], required: &[&str]) -> Json<Value> {
    Json(json!({
        "action": action,
        "method": "POST",
        "encoding": "application/x-www-form-urlencoded",
        "fields": fields,
        "required": required,
    }))
}

async fn user_form() -> Json<Value> {
    form_description("/register-user", &NewUser::FIELDS, &NewUser::REQUIRED)
}

async fn doctor_form() -> Json<Value> {
    form_description("/register-doctor", &NewDoctor::FIELDS, &NewDoctor::REQUIRED)
}

async fn login_form() -> Json<Value> {
    form_description(LOGIN_PAGE, &LoginForm::FIELDS, &LoginForm::FIELDS)
}

// ============================================================================
// ACTIONS
// ============================================================================

async fn register_user(
    State(state): State<AppState>,
    form: Result<Form<NewUser>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form.map_err(form_rejected)?;
    let user = state.accounts.register_user(form).await?;
    Ok(sign_in(&state, SessionIdentity::from(&user)))
}

async fn register_doctor(
    State(state): State<AppState>,
    form: Result<Form<NewDoctor>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form.map_err(form_rejected)?;
    let doctor = state.accounts.register_doctor(form).await?;
    Ok(sign_in(&state, SessionIdentity::from(&doctor)))
}

async fn login(
    State(state): State<AppState>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(form) = form.map_err(form_rejected)?;
    let identity = state.accounts.login(&form.email, &form.password).await?;
    Ok(sign_in(&state, identity))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.remove(&token);
        tracing::info!("Session ended");
    }

    ([(SET_COOKIE, expired_cookie())], Redirect::to("/")).into_response()
}

// ============================================================================
// DASHBOARDS
// ============================================================================

async fn user_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(identity) = current_identity(&state, &headers, AccountKind::User) else {
        return Ok(Redirect::to(LOGIN_PAGE).into_response());
    };

    match state.accounts.user(identity.account_id).await {
        Ok(user) => Ok(Json(json!({ "data": user })).into_response()),
        Err(AccountError::NotFound(id)) => {
            tracing::warn!(account_id = id, "Session points at a missing user");
            Ok(Redirect::to(LOGIN_PAGE).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn doctor_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(identity) = current_identity(&state, &headers, AccountKind::Doctor) else {
        return Ok(Redirect::to(LOGIN_PAGE).into_response());
    };

    match state.accounts.doctor(identity.account_id).await {
        Ok(doctor) => Ok(Json(json!({ "data": doctor })).into_response()),
        Err(AccountError::NotFound(id)) => {
            tracing::warn!(account_id = id, "Session points at a missing doctor");
            Ok(Redirect::to(LOGIN_PAGE).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
