use std::sync::Arc;

use super::*;
use crate::net::api::AuthApi;
use crate::state::test_helpers::{MockApi, user};

fn store(api: &Arc<MockApi>) -> AuthStore {
    AuthStore::new(Arc::clone(api) as Arc<dyn AuthApi>)
}

#[test]
fn validate_trims_email() {
    let form = LoginForm::new("  a@b.com  ", "secret123");
    assert_eq!(
        form.validate(),
        Ok(LoginRequest { email: "a@b.com".to_owned(), password: "secret123".to_owned() })
    );
}

#[test]
fn validate_requires_both_fields() {
    assert_eq!(LoginForm::new("   ", "secret123").validate(), Err(FormError::Required("Email")));
    assert_eq!(LoginForm::new("a@b.com", "").validate(), Err(FormError::Required("Password")));
}

#[test]
fn validate_keeps_whitespace_password_as_typed() {
    let form = LoginForm::new("a@b.com", "   ");
    assert_eq!(form.validate(), Ok(LoginRequest { email: "a@b.com".to_owned(), password: "   ".to_owned() }));
}

#[tokio::test]
async fn submit_success_redirects_to_dashboard() {
    let api = Arc::new(MockApi::new().with_account("secret123", user("u1", "a@b.com", "A")));
    let store = store(&api);
    store.initialize().await;

    let mut form = LoginForm::new("a@b.com", "secret123");
    assert_eq!(form.submit(&store).await, Submission::Redirect(Route::Dashboard));
    assert_eq!(form.error, None);
    assert_eq!(store.state().user.map(|u| u.id), Some("u1".to_owned()));
}

#[tokio::test]
async fn submit_failure_shows_server_message_verbatim() {
    let api = Arc::new(MockApi::new().with_account("secret123", user("u1", "a@b.com", "A")));
    let store = store(&api);
    store.initialize().await;

    let mut form = LoginForm::new("a@b.com", "nope-nope");
    let outcome = form.submit(&store).await;

    assert_eq!(outcome, Submission::Rejected("Invalid email or password".to_owned()));
    assert_eq!(form.error.as_deref(), Some("Invalid email or password"));
}

#[tokio::test]
async fn submit_with_empty_field_skips_network() {
    let api = Arc::new(MockApi::new());
    let store = store(&api);

    let mut form = LoginForm::new("", "secret123");
    assert_eq!(form.submit(&store).await, Submission::Rejected("Email is required".to_owned()));
    assert_eq!(api.call_count("login"), 0);
}

#[test]
fn display_masks_password() {
    let mut form = LoginForm::new("a@b.com", "secret123");
    form.error = Some("Invalid email or password".to_owned());
    let rendered = form.to_string();
    assert!(rendered.contains("*********"));
    assert!(!rendered.contains("secret123"));
    assert!(rendered.contains("! Invalid email or password"));
}
