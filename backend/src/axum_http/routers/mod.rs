pub mod admin_plans;
pub mod admin_tickets;
pub mod payments;
pub mod regions;
pub mod tickets;
