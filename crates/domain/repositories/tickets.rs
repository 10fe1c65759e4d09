use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::tickets::{InsertTicketEntity, TicketEntity, TicketMessageEntity};
use crate::domain::value_objects::enums::ticket_statuses::TicketStatus;

#[automock]
#[async_trait]
pub trait TicketRepository {
    /// All tickets of a user, most recently modified first.
    async fn list_by_user(&self, user_id: i32) -> Result<Vec<TicketEntity>>;

    /// Open and answered tickets of a user, most recently modified first.
    async fn list_active_by_user(&self, user_id: i32) -> Result<Vec<TicketEntity>>;

    /// Every ticket, most recently modified first.
    async fn list_all(&self) -> Result<Vec<TicketEntity>>;

    /// Looks a ticket up, restricted to `owner_id` when given.
    async fn find_ticket(&self, ticket_id: i32, owner_id: Option<i32>)
    -> Result<Option<TicketEntity>>;

    /// Messages of a ticket ordered by id.
    async fn list_messages(&self, ticket_id: i32) -> Result<Vec<TicketMessageEntity>>;

    /// Inserts the ticket and its first message in one transaction, returning the ticket id.
    async fn open_ticket(
        &self,
        ticket: InsertTicketEntity,
        message: String,
        staff: bool,
    ) -> Result<i32>;

    /// Appends a message and moves the ticket to `status`, bumping its modify time.
    async fn append_message(
        &self,
        ticket_id: i32,
        staff: bool,
        message: String,
        status: TicketStatus,
    ) -> Result<()>;

    /// Closes a ticket owned by `user_id`. Returns false when no such ticket exists.
    async fn close_ticket(&self, ticket_id: i32, user_id: i32) -> Result<bool>;
}
