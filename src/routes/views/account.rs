use std::sync::Arc;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use super::page::{HOME, PageContext, redirect, render};
use crate::{
    auth::CurrentUser,
    db::entities::user,
    error::AppError,
    flash::Flash,
    forms::{EditProfileForm, FormErrors, PasswordForm},
    services::{DeleteOutcome, FormOutcome, LoanRecord},
    state::AppState,
};

#[derive(Template)]
#[template(path = "user.html")]
struct ProfileTemplate {
    page: PageContext,
    profile: ProfileView,
    loans: Vec<LoanRecord>,
}

#[derive(Template)]
#[template(path = "user_edit.html")]
struct EditTemplate {
    page: PageContext,
    form: EditProfileForm,
    errors: FormErrors,
}

#[derive(Template)]
#[template(path = "user_password.html")]
struct PasswordTemplate {
    page: PageContext,
    errors: FormErrors,
}

#[derive(Template)]
#[template(path = "user_delete.html")]
struct DeleteTemplate {
    page: PageContext,
    profile: ProfileView,
}

#[derive(Template)]
#[template(path = "user_loan.html")]
struct LoanTemplate {
    page: PageContext,
    loans: Vec<LoanRecord>,
    loaned: bool,
}

/// Display-ready copy of the profile fields.
struct ProfileView {
    full_name: String,
    email: String,
    phone_number: String,
    status: &'static str,
    created_on: String,
    last_login: String,
}

impl ProfileView {
    fn new(user: &user::Model) -> Self {
        Self {
            full_name: user.full_name(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone(),
            status: user.user_status().label(),
            created_on: user.created_on.format("%Y-%m-%d %H:%M").to_string(),
            last_login: user
                .last_login
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoanQuery {
    pub loaned: Option<String>,
}

impl LoanQuery {
    /// Only the literal `True` switches the filter on.
    fn only_open(&self) -> bool {
        self.loaned.as_deref() == Some("True")
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user", get(profile))
        .route("/user_edit", get(edit_page).post(edit))
        .route("/user_password", get(password_page).post(change_password))
        .route("/user_delete", get(delete_page).post(delete))
        .route("/user_loan", get(loans))
}

async fn profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let loans = state.accounts.profile_loans(&user).await?;
    let profile = ProfileView::new(&user);
    let (jar, page) = PageContext::load(jar, &state, Some(user), Vec::new());
    render(
        jar,
        &ProfileTemplate {
            page,
            profile,
            loans,
        },
    )
}

async fn edit_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let form = EditProfileForm::from_user(&user);
    let (jar, page) = PageContext::load(jar, &state, Some(user), Vec::new());
    render(
        jar,
        &EditTemplate {
            page,
            form,
            errors: FormErrors::new(),
        },
    )
}

async fn edit(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form): Form<EditProfileForm>,
) -> Result<Response, AppError> {
    match state.accounts.edit_profile(&user, &form).await? {
        FormOutcome::Accepted { flashes, .. } => redirect(jar, &state, flashes, "/user"),
        FormOutcome::Rejected(errors) => {
            let (jar, page) = PageContext::load(jar, &state, Some(user), Vec::new());
            render(jar, &EditTemplate { page, form, errors })
        }
    }
}

async fn password_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let (jar, page) = PageContext::load(jar, &state, Some(user), Vec::new());
    render(
        jar,
        &PasswordTemplate {
            page,
            errors: FormErrors::new(),
        },
    )
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    match state.accounts.change_password(&user, &form).await? {
        FormOutcome::Accepted { flashes, .. } => {
            let jar = jar.remove(state.session.logout_cookie());
            redirect(jar, &state, flashes, "/user_login")
        }
        FormOutcome::Rejected(errors) => {
            let (jar, page) = PageContext::load(jar, &state, Some(user), Vec::new());
            render(jar, &PasswordTemplate { page, errors })
        }
    }
}

async fn delete_page(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let warning = state.accounts.delete_warning();
    render_delete(jar, &state, user, warning)
}

async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    match state.accounts.delete_account(&user).await? {
        DeleteOutcome::Deleted(flash) => {
            let jar = jar.remove(state.session.logout_cookie());
            redirect(jar, &state, vec![flash], HOME)
        }
        DeleteOutcome::Refused(flash) => render_delete(jar, &state, user, flash),
    }
}

fn render_delete(
    jar: CookieJar,
    state: &AppState,
    user: user::Model,
    notice: Flash,
) -> Result<Response, AppError> {
    let profile = ProfileView::new(&user);
    let (jar, page) = PageContext::load(jar, state, Some(user), vec![notice]);
    render(jar, &DeleteTemplate { page, profile })
}

async fn loans(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<LoanQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let loaned = query.only_open();
    let loans = state.accounts.loan_history(&user, loaned).await?;
    let (jar, page) = PageContext::load(jar, &state, Some(user), Vec::new());
    render(
        jar,
        &LoanTemplate {
            page,
            loans,
            loaned,
        },
    )
}
