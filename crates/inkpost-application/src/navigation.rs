//! Screen routes and the authentication guard.

use inkpost_core::blog::BlogId;
use inkpost_core::session::SessionState;
use std::fmt;

/// A screen of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Blog list, `/`.
    Home,
    /// Single blog with its comments, `/blog/:id`.
    Blog(BlogId),
    /// Sign-in / sign-up, `/auth`.
    Auth,
    /// Signs out and goes back to `/auth`, `/logout`.
    Logout,
}

impl Route {
    /// Parses a path. Unknown paths yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Self::Home),
            "/auth" => Some(Self::Auth),
            "/logout" => Some(Self::Logout),
            _ => trimmed
                .strip_prefix("/blog/")
                .and_then(|id| id.parse::<BlogId>().ok())
                .map(Self::Blog),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Blog(id) => format!("/blog/{id}"),
            Self::Auth => "/auth".to_string(),
            Self::Logout => "/logout".to_string(),
        }
    }

    /// Where the user actually lands when asking for this route.
    ///
    /// Signed-out users are sent to `Auth` from every other screen;
    /// signed-in users asking for `Auth` are sent `Home`.
    pub fn guard(self, session: &SessionState) -> Self {
        match (self, session.is_authenticated()) {
            (Self::Auth, true) => Self::Home,
            (Self::Auth, false) => Self::Auth,
            (_, false) => Self::Auth,
            (route, true) => route,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
