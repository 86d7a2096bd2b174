use std::fmt;

use baas_models::Auth;

use crate::error::{BaasError, BaasResult};

pub const INSTALLATION_CLASS: &str = "_Installation";
pub const SESSION_CLASS: &str = "_Session";
pub const USER_CLASS: &str = "_User";

/// Classes only the full master key may touch.
pub const MASTER_ONLY_CLASSES: [&str; 5] = [
    "_JobStatus",
    "_PushStatus",
    "_Hooks",
    "_GlobalConfig",
    "_JobSchedule",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Find,
    Get,
    Create,
    Update,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Find => "find",
            Method::Get => "get",
            Method::Create => "create",
            Method::Update => "update",
            Method::Delete => "delete",
        }
    }

    fn is_write(&self) -> bool {
        matches!(self, Method::Create | Method::Update | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class-level role check run before any storage access or hook.
pub fn enforce_role_security(
    method: Method,
    class_name: &str,
    auth: &Auth,
) -> BaasResult<()> {
    if class_name == INSTALLATION_CLASS
        && !auth.is_master()
        && matches!(method, Method::Delete | Method::Find)
    {
        return Err(BaasError::OperationForbidden(format!(
            "Clients aren't allowed to perform the {} operation on the installation collection.",
            method
        )));
    }

    if MASTER_ONLY_CLASSES.contains(&class_name) && !auth.is_master() {
        return Err(BaasError::OperationForbidden(format!(
            "Clients aren't allowed to perform the {} operation on the {} collection.",
            method, class_name
        )));
    }

    if auth.is_read_only() && method.is_write() {
        return Err(BaasError::OperationForbidden(format!(
            "read-only masterKey isn't allowed to perform the {} operation.",
            method
        )));
    }
    Ok(())
}
