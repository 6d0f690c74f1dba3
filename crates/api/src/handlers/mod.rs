pub mod admin;
pub mod promo_code;
pub mod reservation;
pub mod space;
