//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` request DTOs where the entity is written through the API
//! - Plain insert/update structs for writes performed by the engine

pub mod promo_code;
pub mod promo_code_usage;
pub mod reservation;
pub mod space;
