//! Role names that select a built-in default layout.
//!
//! Values match the role names carried in the user's session.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CREATOR: &str = "creator";
pub const ROLE_REVIEWER: &str = "reviewer";

/// Role whose default layout is used for unrecognized roles.
pub const FALLBACK_ROLE: &str = ROLE_CREATOR;

/// All roles with a built-in default layout.
pub const KNOWN_ROLES: &[&str] = &[ROLE_ADMIN, ROLE_CREATOR, ROLE_REVIEWER];

/// Returns `true` if `role` has a built-in default layout.
pub fn is_known_role(role: &str) -> bool {
    KNOWN_ROLES.contains(&role)
}
