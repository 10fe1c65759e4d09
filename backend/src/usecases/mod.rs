pub mod auto_reply;
pub mod payments;
pub mod plans;
pub mod tickets;
