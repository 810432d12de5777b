use serde::{Deserialize, Serialize};

/// Verified caller identity for one request.
///
/// Built by the auth middleware from a successfully verified access token and
/// inserted into the request extensions. Downstream handlers read it with
/// `Extension<SecurityContext>`; nothing else constructs one in production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    user_id: i32,
    company_id: i32,
    role_id: i32,
}

impl SecurityContext {
    #[must_use]
    pub fn new(user_id: i32, company_id: i32, role_id: i32) -> Self {
        Self {
            user_id,
            company_id,
            role_id,
        }
    }

    #[inline]
    #[must_use]
    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    #[inline]
    #[must_use]
    pub fn company_id(&self) -> i32 {
        self.company_id
    }

    #[inline]
    #[must_use]
    pub fn role_id(&self) -> i32 {
        self.role_id
    }
}
