use serde::{Deserialize, Serialize};

// =========================================================
// Session check route
// =========================================================

/// Whether the caller holds a valid admin session.
///
/// The admin console branches on this before showing any survey page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
}

pub const GET_ADMIN_AUTHENTICATED: &str = "/api/admin/authenticated";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_status_wire_shape() {
        let value = serde_json::to_value(SessionStatus { authenticated: false }).unwrap();
        assert_eq!(value, json!({ "authenticated": false }));
    }
}
