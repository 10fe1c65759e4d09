pub mod plans;
pub mod tickets;
pub mod users;
