//! Well-known role name constants.
//!
//! These must match the `role` claim issued by the identity provider.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MEMBER: &str = "member";

/// Whether the given role may act on reservations owned by other users.
pub fn is_admin(role: &str) -> bool {
    role == ROLE_ADMIN
}
