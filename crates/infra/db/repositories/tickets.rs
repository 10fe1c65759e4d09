use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};

use crate::domain;
use crate::infra::db::postgres::{
    postgres_connection::PgPoolSquad,
    schema::{ticket_messages, tickets},
};
use domain::{
    entities::tickets::{
        InsertTicketEntity, InsertTicketMessageEntity, TicketEntity, TicketMessageEntity,
    },
    repositories::tickets::TicketRepository,
    value_objects::enums::ticket_statuses::TicketStatus,
};

pub struct TicketPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TicketPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TicketRepository for TicketPostgres {
    async fn list_by_user(&self, user_id: i32) -> Result<Vec<TicketEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = tickets::table
            .filter(tickets::user_id.eq(user_id))
            .order(tickets::modified_at.desc())
            .select(TicketEntity::as_select())
            .load::<TicketEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn list_active_by_user(&self, user_id: i32) -> Result<Vec<TicketEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = tickets::table
            .filter(tickets::user_id.eq(user_id))
            .filter(tickets::status.eq_any(vec![
                TicketStatus::Open.to_string(),
                TicketStatus::Answered.to_string(),
            ]))
            .order(tickets::modified_at.desc())
            .select(TicketEntity::as_select())
            .load::<TicketEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn list_all(&self) -> Result<Vec<TicketEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = tickets::table
            .order(tickets::modified_at.desc())
            .select(TicketEntity::as_select())
            .load::<TicketEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn find_ticket(
        &self,
        ticket_id: i32,
        owner_id: Option<i32>,
    ) -> Result<Option<TicketEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let mut query = tickets::table
            .filter(tickets::id.eq(ticket_id))
            .select(TicketEntity::as_select())
            .into_boxed();

        if let Some(owner_id) = owner_id {
            query = query.filter(tickets::user_id.eq(owner_id));
        }

        let ticket = query.first::<TicketEntity>(&mut conn).optional()?;

        Ok(ticket)
    }

    async fn list_messages(&self, ticket_id: i32) -> Result<Vec<TicketMessageEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = ticket_messages::table
            .filter(ticket_messages::ticket_id.eq(ticket_id))
            .order(ticket_messages::id.asc())
            .select(TicketMessageEntity::as_select())
            .load::<TicketMessageEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn open_ticket(
        &self,
        ticket: InsertTicketEntity,
        message: String,
        staff: bool,
    ) -> Result<i32> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let ticket_id = conn.transaction::<i32, anyhow::Error, _>(|conn| {
            let ticket_id = insert_into(tickets::table)
                .values(&ticket)
                .returning(tickets::id)
                .get_result::<i32>(conn)?;

            insert_into(ticket_messages::table)
                .values(&InsertTicketMessageEntity {
                    ticket_id,
                    staff,
                    message,
                    created_at: ticket.created_at,
                })
                .execute(conn)?;

            Ok(ticket_id)
        })?;

        Ok(ticket_id)
    }

    async fn append_message(
        &self,
        ticket_id: i32,
        staff: bool,
        message: String,
        status: TicketStatus,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let now = Utc::now();

        conn.transaction::<(), anyhow::Error, _>(|conn| {
            insert_into(ticket_messages::table)
                .values(&InsertTicketMessageEntity {
                    ticket_id,
                    staff,
                    message,
                    created_at: now,
                })
                .execute(conn)?;

            update(tickets::table)
                .filter(tickets::id.eq(ticket_id))
                .set((
                    tickets::status.eq(status.to_string()),
                    tickets::modified_at.eq(now),
                ))
                .execute(conn)?;

            Ok(())
        })?;

        Ok(())
    }

    async fn close_ticket(&self, ticket_id: i32, user_id: i32) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let affected = update(tickets::table)
            .filter(tickets::id.eq(ticket_id))
            .filter(tickets::user_id.eq(user_id))
            .set((
                tickets::status.eq(TicketStatus::Closed.to_string()),
                tickets::modified_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(affected > 0)
    }
}
