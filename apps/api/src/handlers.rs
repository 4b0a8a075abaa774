pub mod authorizations;
pub mod health;
pub mod permissions;
