pub mod ticket_statuses;
pub mod user_statuses;
