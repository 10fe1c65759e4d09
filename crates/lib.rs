pub mod domain;
pub mod infra;
pub mod mail;
pub mod observability;
pub mod providers;
