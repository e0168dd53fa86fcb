//! Login to the trace query UI.
//!
//! # Flow
//! ```text
//! navigate(query url)
//!     → submit .btn-primary          (leave the landing page for the login form)
//!     → type #inputUsername, #inputPassword
//!     → submit .btn-primary          (log in)
//!     → [name="approve"] present?    submit it : continue
//! ```

use crate::browser::{Browser, BrowserError, Lookup, Selector};
use crate::config::BrowserConfig;

/// Element selectors and credentials for the login form.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub submit: Selector,
    pub username_field: Selector,
    pub password_field: Selector,
    pub consent: Selector,
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            submit: Selector::class_name("btn-primary"),
            username_field: Selector::id("inputUsername"),
            password_field: Selector::id("inputPassword"),
            consent: Selector::name("approve"),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

/// Whether the optional consent screen was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentOutcome {
    Approved,
    NotShown,
}

/// Log in through the form in front of `url`.
pub async fn authenticate(
    browser: &mut dyn Browser,
    url: &str,
    form: &LoginForm,
) -> Result<ConsentOutcome, BrowserError> {
    tracing::info!(url = %url, user = %form.username, "Logging in to trace query UI");
    browser.navigate(url).await?;

    let trigger = browser.find_element(&form.submit).await?.required(&form.submit)?;
    browser.submit(&trigger).await?;

    let username = browser
        .find_element(&form.username_field)
        .await?
        .required(&form.username_field)?;
    browser.send_keys(&username, &form.username).await?;

    let password = browser
        .find_element(&form.password_field)
        .await?
        .required(&form.password_field)?;
    browser.send_keys(&password, &form.password).await?;

    let login = browser.find_element(&form.submit).await?.required(&form.submit)?;
    browser.submit(&login).await?;

    let outcome = match browser.find_element(&form.consent).await? {
        Lookup::Found(approve) => {
            browser.submit(&approve).await?;
            ConsentOutcome::Approved
        }
        Lookup::NotFound => ConsentOutcome::NotShown,
    };

    tracing::info!(consent = ?outcome, "Logged in");
    Ok(outcome)
}
