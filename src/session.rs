use crate::model::UserId;

/// Read-only access to the signed-in viewer.
pub trait SessionProvider: Send + Sync {
    fn viewer_id(&self) -> Option<UserId>;
}

/// A session fixed at construction, e.g. from a CLI flag or a request header
/// resolved by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticSession {
    viewer: Option<UserId>,
}

impl StaticSession {
    pub fn anonymous() -> Self {
        Self { viewer: None }
    }

    pub fn signed_in(user_id: UserId) -> Self {
        Self {
            viewer: Some(user_id),
        }
    }
}

impl From<Option<UserId>> for StaticSession {
    fn from(viewer: Option<UserId>) -> Self {
        Self { viewer }
    }
}

impl SessionProvider for StaticSession {
    fn viewer_id(&self) -> Option<UserId> {
        self.viewer
    }
}
