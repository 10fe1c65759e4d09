use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::tickets::{TicketEntity, TicketMessageEntity};
use crate::domain::value_objects::enums::ticket_statuses::TicketStatus;

/// Longest message body accepted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 16_384;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TicketMessageModel {
    pub id: i32,
    pub staff: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<TicketMessageEntity> for TicketMessageModel {
    fn from(value: TicketMessageEntity) -> Self {
        Self {
            id: value.id,
            staff: value.staff,
            message: value.message,
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TicketModel {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<TicketMessageModel>,
}

impl TryFrom<TicketEntity> for TicketModel {
    type Error = anyhow::Error;

    fn try_from(value: TicketEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            status: TicketStatus::try_from(value.status.as_str())?,
            id: value.id,
            user_id: value.user_id,
            name: value.name,
            created_at: value.created_at,
            modified_at: value.modified_at,
            messages: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenTicketModel {
    pub name: String,
    pub message: String,
}

/// Staff variant of `OpenTicketModel`: staff open tickets on behalf of a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffOpenTicketModel {
    pub user_id: i32,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyTicketModel {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ListTicketsFilter {
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenedTicketDto {
    pub id: i32,
}

/// Payload handed to the mail templates `ticket_open` and `ticket_reply`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TicketUpdateMail {
    pub id: i32,
    pub subject: String,
    pub message: String,
}
