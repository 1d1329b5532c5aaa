pub mod cleanup;
pub mod convert;
pub mod download;
pub mod health;
