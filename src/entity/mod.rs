pub mod campaign;
pub mod claim;
pub mod redemption;
pub mod staff;
pub mod user;

pub use staff::StaffRole;
