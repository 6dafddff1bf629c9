use std::sync::Arc;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::page::{HOME, PageContext, redirect, render, safe_next};
use crate::{
    auth::{MaybeUser, identity::login_url},
    error::AppError,
    forms::{FormErrors, LoginForm, RegisterForm},
    services::FormOutcome,
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Template)]
#[template(path = "user_login.html")]
struct LoginTemplate {
    page: PageContext,
    form_action: String,
    email: String,
    errors: FormErrors,
}

#[derive(Template)]
#[template(path = "user_register.html")]
struct RegisterTemplate {
    page: PageContext,
    form: RegisterForm,
    errors: FormErrors,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user_login", get(login_page).post(login))
        .route("/user_logout", get(logout))
        .route("/user_register", get(register_page).post(register))
}

fn login_action(next: Option<&str>) -> String {
    match next {
        Some(next) => login_url(next),
        None => "/user_login".to_string(),
    }
}

async fn login_page(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to(HOME).into_response());
    }

    let (jar, page) = PageContext::load(jar, &state, None, Vec::new());
    render(
        jar,
        &LoginTemplate {
            page,
            form_action: login_action(query.next.as_deref()),
            email: String::new(),
            errors: FormErrors::new(),
        },
    )
}

async fn login(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to(HOME).into_response());
    }

    match state.accounts.login(&form).await? {
        FormOutcome::Accepted { value, flashes } => {
            let jar = jar.add(state.session.login_cookie(&value.id)?);
            redirect(jar, &state, flashes, safe_next(query.next.as_deref()))
        }
        FormOutcome::Rejected(errors) => {
            let (jar, page) = PageContext::load(jar, &state, None, Vec::new());
            render(
                jar,
                &LoginTemplate {
                    page,
                    form_action: login_action(query.next.as_deref()),
                    email: form.email,
                    errors,
                },
            )
        }
    }
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    (jar.remove(state.session.logout_cookie()), Redirect::to(HOME)).into_response()
}

async fn register_page(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, page) = PageContext::load(jar, &state, user, Vec::new());
    render(
        jar,
        &RegisterTemplate {
            page,
            form: RegisterForm::default(),
            errors: FormErrors::new(),
        },
    )
}

async fn register(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match state.accounts.register(&form).await? {
        FormOutcome::Accepted { flashes, .. } => redirect(jar, &state, flashes, "/user_login"),
        FormOutcome::Rejected(errors) => {
            let (jar, page) = PageContext::load(jar, &state, user, Vec::new());
            let form = RegisterForm {
                password: String::new(),
                confirm_password: String::new(),
                ..form
            };
            render(jar, &RegisterTemplate { page, form, errors })
        }
    }
}
