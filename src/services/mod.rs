//! Business logic services

pub mod lockout;
pub mod protection;
pub mod rate_limiter;
pub mod sweeper;
