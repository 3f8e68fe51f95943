//! Login, provider callback and logout handlers.

use axum::extract::{Form, Query};
use axum::response::{IntoResponse, Response};
use minijinja::context;
use serde::Deserialize;

use api::auth::{self, AuthResult, CallbackParams, HOME_PATH, LOGIN_PATH};
use api::models::FieldError;

use crate::context::RequestContext;
use crate::error::Result;
use crate::views::found;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: Option<String>,
}

impl LoginForm {
    fn remember(&self) -> bool {
        self.remember
            .as_deref()
            .is_some_and(|value| !value.is_empty() && value != "false")
    }

    fn errors(&self) -> Vec<FieldError> {
        [("username", &self.username), ("password", &self.password)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| FieldError {
                field,
                message: "This field is required.".to_string(),
            })
            .collect()
    }
}

/// Login page URL keeping a usable `next`.
fn login_target(next: Option<&str>) -> String {
    match auth::safe_next(next) {
        Some(next) => auth::login_url(next),
        None => LOGIN_PATH.to_string(),
    }
}

async fn render_login(ctx: &RequestContext, query: &LoginQuery, username: &str, errors: Vec<FieldError>) -> Result<Response> {
    let (auth_url, _) = auth::begin_external_login(&ctx.state.oauth, &ctx.session).await?;

    let page = ctx
        .render(
            "login.html",
            context! {
                title => "Sign In",
                form_action => login_target(query.next.as_deref()),
                username => username,
                errors => errors,
                auth_url => auth_url.to_string(),
            },
        )
        .await?;
    Ok(page.into_response())
}

/// `GET /login`
pub async fn login_page(ctx: RequestContext, Query(query): Query<LoginQuery>) -> Result<Response> {
    if ctx.user.is_some() {
        return Ok(found(HOME_PATH));
    }
    render_login(&ctx, &query, "", Vec::new()).await
}

/// `POST /login`
pub async fn login_submit(
    ctx: RequestContext,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if ctx.user.is_some() {
        return Ok(found(HOME_PATH));
    }

    let errors = form.errors();
    if !errors.is_empty() {
        return render_login(&ctx, &query, &form.username, errors).await;
    }

    match auth::authenticate(ctx.state.users.as_ref(), &form.username, &form.password).await? {
        AuthResult::Success(user) => {
            let remember_days = form.remember().then_some(ctx.state.settings.session_lifetime_days);
            ctx.session.login(&user, remember_days).await?;

            let next = auth::safe_next(query.next.as_deref()).unwrap_or(HOME_PATH);
            Ok(found(next))
        }
        _ => {
            ctx.session.push_flash("error", INVALID_CREDENTIALS_MESSAGE).await?;
            Ok(found(&login_target(query.next.as_deref())))
        }
    }
}

/// `GET <REDIRECT_PATH>`, the identity provider's redirect back.
pub async fn authorized(ctx: RequestContext, Query(params): Query<CallbackParams>) -> Result<Response> {
    let result = auth::handle_callback(&ctx.state.oauth, ctx.state.users.as_ref(), &ctx.session, params).await?;

    match result {
        AuthResult::Success(admin) => {
            ctx.session.login(&admin, None).await?;
            Ok(found(HOME_PATH))
        }
        AuthResult::ProviderError(message) => {
            let page = ctx
                .render("auth_error.html", context! { message => message })
                .await?;
            Ok(page.into_response())
        }
        AuthResult::StateMismatch | AuthResult::InvalidCredentials => Ok(found(HOME_PATH)),
    }
}

/// `GET /logout`
pub async fn logout(ctx: RequestContext) -> Result<Response> {
    if let Some(user) = &ctx.user {
        tracing::info!(username = %user.username, "logging out");
    }

    let post_logout_redirect = ctx.state.settings.external_url(LOGIN_PATH);
    let target = auth::logout(&ctx.state.oauth, &ctx.session, &post_logout_redirect).await?;
    Ok(found(&target))
}
