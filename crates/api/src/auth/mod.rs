//! Identity-provider token handling.
//!
//! Tokens are issued elsewhere; this service only verifies them and trusts
//! the `(user id, role)` pair they carry.

pub mod jwt;
