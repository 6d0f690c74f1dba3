//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods.
//! Plain reads accept `&PgPool`. Methods that take row locks accept
//! `&mut PgConnection` and must be called on an open transaction; the locks
//! are released when that transaction commits or rolls back.

pub mod promo_code_repo;
pub mod promo_code_usage_repo;
pub mod reservation_repo;
pub mod space_repo;

pub use promo_code_repo::PromoCodeRepo;
pub use promo_code_usage_repo::PromoCodeUsageRepo;
pub use reservation_repo::ReservationRepo;
pub use space_repo::SpaceRepo;
