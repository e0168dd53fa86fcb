//! Browser automation capability.
//!
//! # Data Flow
//! ```text
//! auth.rs (login form, optional consent)
//!     → Browser trait (navigate, find, submit, type, read source)
//!     → webdriver.rs (W3C WebDriver over HTTP)
//! ```
//!
//! # Design Decisions
//! - Procedure code only sees the `Browser` trait, so tests use a fake
//! - Element lookups return `Lookup::NotFound` instead of an error; callers
//!   decide whether absence is fatal
//! - One session per run, closed explicitly on every exit path

pub mod auth;
pub mod webdriver;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

pub use auth::{authenticate, ConsentOutcome, LoginForm};
pub use webdriver::WebDriverBrowser;

/// How an element is addressed on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    ClassName(String),
    Id(String),
    Name(String),
}

impl Selector {
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::ClassName(value.into())
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::Name(value.into())
    }

    /// Equivalent CSS selector.
    pub fn to_css(&self) -> String {
        match self {
            Selector::ClassName(class) => format!(".{}", class),
            Selector::Id(id) => format!("#{}", id),
            Selector::Name(name) => format!("[name=\"{}\"]", name.replace('"', "\\\"")),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::ClassName(class) => write!(f, "class={}", class),
            Selector::Id(id) => write!(f, "id={}", id),
            Selector::Name(name) => write!(f, "name={}", name),
        }
    }
}

/// Opaque handle to an element found in the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(pub String);

/// Outcome of an element search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Turn absence into an error naming the selector.
    pub fn required(self, selector: &Selector) -> Result<T, BrowserError> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(BrowserError::ElementNotFound(selector.clone())),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Errors raised by a browser backend.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Transport to the automation endpoint failed.
    #[error("browser transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The automation endpoint answered with an error.
    #[error("webdriver error '{error}': {message}")]
    Protocol { error: String, message: String },

    /// Response did not have the expected shape.
    #[error("unexpected webdriver response: {0}")]
    UnexpectedResponse(String),

    /// A required element is not on the page.
    #[error("element not found: {0}")]
    ElementNotFound(Selector),

    /// The session was already closed.
    #[error("browser session is closed")]
    Closed,
}

/// Capabilities the verification procedure needs from a browser.
#[async_trait]
pub trait Browser: Send {
    /// Load `url` in the current window.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Find the first element matching `selector`.
    async fn find_element(&mut self, selector: &Selector) -> Result<Lookup<ElementRef>, BrowserError>;

    /// Submit the form the element belongs to.
    async fn submit(&mut self, element: &ElementRef) -> Result<(), BrowserError>;

    /// Type `text` into the element.
    async fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<(), BrowserError>;

    /// Source of the current page.
    async fn page_source(&mut self) -> Result<String, BrowserError>;

    /// End the session. Further calls fail with [`BrowserError::Closed`].
    async fn close(&mut self) -> Result<(), BrowserError>;
}
