//! View controllers. Each owns its visible state and talks to the service
//! only through the injected [`SessionContext`](crate::session::SessionContext);
//! rendering lives in [`crate::render`].

pub mod auth;
pub mod dashboard;
pub mod events;
pub mod setup;

use crate::error::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// User-visible message attached to a view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn from_error(context: &str, err: &ServiceError) -> Self {
        Self::error(format!("{}: {}", context, err))
    }
}
