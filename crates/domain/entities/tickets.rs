use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infra::db::postgres::schema::{ticket_messages, tickets};

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = tickets)]
pub struct TicketEntity {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tickets)]
pub struct InsertTicketEntity {
    pub user_id: i32,
    pub name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Identifiable, Selectable, Queryable)]
#[diesel(table_name = ticket_messages)]
pub struct TicketMessageEntity {
    pub id: i32,
    pub ticket_id: i32,
    pub staff: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ticket_messages)]
pub struct InsertTicketMessageEntity {
    pub ticket_id: i32,
    pub staff: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
