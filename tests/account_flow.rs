use std::{collections::BTreeMap, sync::Arc};

use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::NaiveDate;
use tower::ServiceExt; // for `oneshot`

use library_accounts::{
    auth::{UserStatus, session::SESSION_COOKIE},
    test_helpers::{InMemoryAccountRepository, test_router},
};

const PASSWORD: &str = "stacks-and-shelves";

/// Drives the router like a browser: keeps cookies between requests.
struct Browser {
    app: Router,
    cookies: BTreeMap<String, String>,
}

struct Page {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

impl Browser {
    fn new(repo: &Arc<InMemoryAccountRepository>) -> Self {
        Self {
            app: test_router(repo.clone()),
            cookies: BTreeMap::new(),
        }
    }

    fn has_session(&self) -> bool {
        self.cookies.contains_key(SESSION_COOKIE)
    }

    async fn get(&mut self, uri: &str) -> Page {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> Page {
        let body = serde_urlencoded::to_string(fields).unwrap();
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn login(&mut self, email: &str, password: &str) -> Page {
        self.post("/user_login", &[("email", email), ("password", password)])
            .await
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self.app.clone().oneshot(request).await.unwrap();
        self.absorb(&response);

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        Page {
            status,
            location,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    fn absorb(&mut self, response: &Response) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), value.to_string());
            }
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn home_page_renders_for_anonymous_visitors() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let mut browser = Browser::new(&repo);

    let page = browser.get("/").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("/user_register"));
}

#[tokio::test]
async fn anonymous_visit_redirects_to_login_with_next() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let mut browser = Browser::new(&repo);

    let page = browser.get("/user_loan").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(
        page.location.as_deref(),
        Some("/user_login?next=%2Fuser_loan")
    );

    let login = browser.get("/user_login?next=%2Fuser_loan").await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.body.contains("You must be logged in to open this page."));

    // the notice is shown once
    let again = browser.get("/user_login").await;
    assert!(!again.body.contains("You must be logged in"));
}

#[tokio::test]
async fn login_follows_next_and_opens_protected_pages() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let user = repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    let mut browser = Browser::new(&repo);

    let page = browser
        .post(
            "/user_login?next=%2Fuser_loan",
            &[("email", "reader@library.test"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/user_loan"));
    assert!(browser.has_session());
    assert!(repo.user(&user.id).unwrap().last_login.is_some());

    let profile = browser.get("/user").await;
    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.body.contains("reader@library.test"));

    // already signed in: the login page sends us home
    let login = browser.get("/user_login").await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
    assert_eq!(login.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn login_ignores_external_next_targets() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    let mut browser = Browser::new(&repo);

    let page = browser
        .post(
            "/user_login?next=https%3A%2F%2Fevil.example",
            &[("email", "reader@library.test"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(page.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn failed_logins_show_field_errors_without_session() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    let mut browser = Browser::new(&repo);

    let wrong_password = browser.login("reader@library.test", "not-my-password").await;
    assert_eq!(wrong_password.status, StatusCode::OK);
    assert!(wrong_password.body.contains("the password is incorrect"));
    assert!(!browser.has_session());

    let unknown = browser.login("stranger@library.test", PASSWORD).await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert!(unknown.body.contains("there is no user with this email address"));
    assert!(!browser.has_session());
}

#[tokio::test]
async fn logout_clears_the_session() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;
    assert!(browser.has_session());

    let page = browser.get("/user_logout").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/"));
    assert!(!browser.has_session());

    let profile = browser.get("/user").await;
    assert_eq!(profile.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn registration_creates_one_account_per_email() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let mut browser = Browser::new(&repo);
    let fields = [
        ("first_name", "Ada"),
        ("last_name", "Lovelace"),
        ("email", "ada@library.test"),
        ("phone_number", "555-0101"),
        ("password", PASSWORD),
        ("confirm_password", PASSWORD),
    ];

    let page = browser.post("/user_register", &fields).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/user_login"));

    let login = browser.get("/user_login").await;
    assert!(login.body.contains("Your profile has been registered"));

    let duplicate = browser.post("/user_register", &fields).await;
    assert_eq!(duplicate.status, StatusCode::OK);
    assert!(duplicate.body.contains("This email address is already registered."));

    let accounts = repo
        .users()
        .into_iter()
        .filter(|user| user.email == "ada@library.test")
        .count();
    assert_eq!(accounts, 1);
}

#[tokio::test]
async fn invalid_registration_is_rerendered_with_errors() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let mut browser = Browser::new(&repo);

    let page = browser
        .post(
            "/user_register",
            &[
                ("first_name", "Ada"),
                ("email", "not-an-email"),
                ("password", PASSWORD),
                ("confirm_password", "something-else"),
            ],
        )
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Enter a valid email address."));
    assert!(page.body.contains("Passwords must match."));
    assert!(page.body.contains("value=\"Ada\""));
    assert!(repo.users().is_empty());
}

#[tokio::test]
async fn profile_edit_respects_email_ownership() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    repo.insert_user("taken@library.test", PASSWORD, UserStatus::Client);
    let user = repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;

    let form = browser.get("/user_edit").await;
    assert!(form.body.contains("value=\"reader@library.test\""));

    let conflict = browser
        .post(
            "/user_edit",
            &[
                ("first_name", "Rita"),
                ("last_name", "Reader"),
                ("email", "taken@library.test"),
                ("phone_number", "555-0102"),
            ],
        )
        .await;
    assert_eq!(conflict.status, StatusCode::OK);
    assert!(conflict.body.contains("This email address is already registered."));
    assert_eq!(repo.user(&user.id).unwrap().first_name, "reader");

    let saved = browser
        .post(
            "/user_edit",
            &[
                ("first_name", "Rita"),
                ("last_name", "Reader"),
                ("email", "reader@library.test"),
                ("phone_number", "555-0102"),
            ],
        )
        .await;
    assert_eq!(saved.status, StatusCode::SEE_OTHER);
    assert_eq!(saved.location.as_deref(), Some("/user"));

    let stored = repo.user(&user.id).unwrap();
    assert_eq!(stored.first_name, "Rita");
    assert_eq!(stored.phone_number, "555-0102");
}

#[tokio::test]
async fn password_change_forces_a_new_login() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;

    let wrong = browser
        .post(
            "/user_password",
            &[
                ("password", "not-my-password"),
                ("new_password", "fresh-password"),
                ("confirm_password", "fresh-password"),
            ],
        )
        .await;
    assert_eq!(wrong.status, StatusCode::OK);
    assert!(wrong.body.contains("Enter your current password."));
    assert!(browser.has_session());

    let changed = browser
        .post(
            "/user_password",
            &[
                ("password", PASSWORD),
                ("new_password", "fresh-password"),
                ("confirm_password", "fresh-password"),
            ],
        )
        .await;
    assert_eq!(changed.status, StatusCode::SEE_OTHER);
    assert_eq!(changed.location.as_deref(), Some("/user_login"));
    assert!(!browser.has_session());

    let old = browser.login("reader@library.test", PASSWORD).await;
    assert_eq!(old.status, StatusCode::OK);

    let new = browser.login("reader@library.test", "fresh-password").await;
    assert_eq!(new.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn delete_page_warns_about_loan_history() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;

    let page = browser.get("/user_delete").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("alert-warning"));
    assert!(page.body.contains("deletes your loan history"));
}

#[tokio::test]
async fn sole_admin_cannot_delete_their_profile() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let admin = repo.insert_user("admin@library.test", PASSWORD, UserStatus::Admin);
    let mut browser = Browser::new(&repo);
    browser.login("admin@library.test", PASSWORD).await;

    let page = browser.post("/user_delete", &[]).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("You are the only administrator"));
    assert!(repo.user(&admin.id).is_some());
    assert!(browser.has_session());
}

#[tokio::test]
async fn open_loans_block_profile_deletion() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let user = repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    repo.add_loan(&user.id, "Solaris", date(2024, 3, 1), None);
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;

    let page = browser.post("/user_delete", &[]).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("You still have books on loan."));
    assert!(repo.user(&user.id).is_some());
}

#[tokio::test]
async fn deleting_a_profile_signs_out_and_removes_history() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let user = repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    repo.add_loan(&user.id, "Solaris", date(2024, 1, 1), Some(date(2024, 1, 21)));
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;

    let page = browser.post("/user_delete", &[]).await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/"));
    assert!(!browser.has_session());
    assert!(repo.user(&user.id).is_none());
    assert!(repo.loans_of(&user.id).is_empty());

    let home = browser.get("/").await;
    assert!(home.body.contains("Your profile has been deleted."));
}

#[tokio::test]
async fn loan_history_lists_open_loans_first() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let user = repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    repo.add_loan(&user.id, "Book L1", date(2024, 1, 1), None);
    repo.add_loan(&user.id, "Book L2", date(2024, 1, 15), Some(date(2024, 2, 1)));
    repo.add_loan(&user.id, "Book L3", date(2024, 1, 10), None);
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;

    let all = browser.get("/user_loan").await;
    assert_eq!(all.status, StatusCode::OK);
    let l1 = all.body.find("Book L1").unwrap();
    let l2 = all.body.find("Book L2").unwrap();
    let l3 = all.body.find("Book L3").unwrap();
    assert!(l3 < l1 && l1 < l2);

    let open = browser.get("/user_loan?loaned=True").await;
    assert!(!open.body.contains("Book L2"));
    let l1 = open.body.find("Book L1").unwrap();
    let l3 = open.body.find("Book L3").unwrap();
    assert!(l3 < l1);

    let other_flag = browser.get("/user_loan?loaned=yes").await;
    assert!(other_flag.body.contains("Book L2"));
}

#[tokio::test]
async fn profile_shows_open_loans_only() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let user = repo.insert_user("reader@library.test", PASSWORD, UserStatus::Client);
    repo.add_loan(&user.id, "Still Reading", date(2024, 5, 1), None);
    repo.add_loan(&user.id, "Already Returned", date(2024, 4, 1), Some(date(2024, 4, 9)));
    let mut browser = Browser::new(&repo);
    browser.login("reader@library.test", PASSWORD).await;

    let page = browser.get("/user").await;
    assert!(page.body.contains("Still Reading"));
    assert!(!page.body.contains("Already Returned"));
}

#[tokio::test]
async fn forged_session_cookie_is_treated_as_anonymous() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let mut browser = Browser::new(&repo);
    browser
        .cookies
        .insert(SESSION_COOKIE.to_string(), "forged.token.value".to_string());

    let page = browser.get("/user").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/user_login?next=%2Fuser"));
}

#[tokio::test]
async fn unknown_paths_render_the_html_404_page() {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let mut browser = Browser::new(&repo);

    let page = browser.get("/no-such-shelf").await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
    assert!(page.body.contains("The page you requested does not exist."));
}
