use crate::object::{Object, object_id};
use std::collections::HashMap;

/// Caller identity for a single request.
///
/// Built once by the boundary layer and never mutated afterwards. A read-only
/// context is always a master context as well; the constructors are the only
/// way to obtain either flag, so `is_read_only() ⇒ is_master()` holds for every
/// value of this type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Auth {
    is_master: bool,
    is_read_only: bool,
    user: Option<Object>,
    installation_id: Option<String>,
    session_token: Option<String>,
    headers: HashMap<String, String>,
}

impl Auth {
    /// Anonymous caller.
    pub fn nobody() -> Self {
        Self::default()
    }

    pub fn master() -> Self {
        Self {
            is_master: true,
            ..Default::default()
        }
    }

    pub fn read_only_master() -> Self {
        Self {
            is_master: true,
            is_read_only: true,
            ..Default::default()
        }
    }

    /// Caller authenticated through a session belonging to `user`.
    pub fn for_user(user: Object) -> Self {
        Self {
            user: Some(user),
            ..Default::default()
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_installation_id(mut self, id: impl Into<String>) -> Self {
        self.installation_id = Some(id.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    #[inline]
    pub fn is_master(&self) -> bool {
        self.is_master
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    pub fn user(&self) -> Option<&Object> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().and_then(object_id)
    }

    pub fn installation_id(&self) -> Option<&str> {
        self.installation_id.as_deref()
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Whether the caller may mutate the `_User` record with `user_id`.
    pub fn could_update_user_id(&self, user_id: &str) -> bool {
        if self.is_master {
            return true;
        }
        matches!(self.user_id(), Some(id) if id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::where_object_id;

    #[test]
    fn test_read_only_implies_master() {
        let auth = Auth::read_only_master();
        assert!(auth.is_read_only());
        assert!(auth.is_master());
        assert!(!Auth::master().is_read_only());
    }

    #[test]
    fn test_could_update_user_id() {
        let auth = Auth::for_user(where_object_id("u1"));
        assert!(auth.could_update_user_id("u1"));
        assert!(!auth.could_update_user_id("u2"));
        assert!(!Auth::nobody().could_update_user_id("u1"));
        assert!(Auth::master().could_update_user_id("anyone"));
    }
}
