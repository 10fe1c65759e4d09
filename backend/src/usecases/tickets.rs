use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use panel::domain::{
    entities::tickets::{InsertTicketEntity, TicketEntity},
    repositories::{tickets::TicketRepository, users::UserRepository},
    value_objects::{
        enums::{ticket_statuses::TicketStatus, user_statuses::UserStatus},
        tickets::{MAX_MESSAGE_CHARS, TicketMessageModel, TicketModel, TicketUpdateMail},
    },
};
use panel::mail::{MailDispatcher, MailRecipient};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::axum_http::error_responses::LocalizedError;
use crate::config::config_model::Support;
use crate::usecases::auto_reply::AutoReplyScheduler;

pub const TEMPLATE_TICKET_OPEN: &str = "ticket_open";
pub const TEMPLATE_TICKET_REPLY: &str = "ticket_reply";

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("empty input: {0}")]
    EmptyInput(&'static str),
    #[error("message is too long")]
    MessageTooLong,
    #[error("account is not provisioned")]
    AccountNotProvisioned { support_email: String },
    #[error("ticket not found")]
    TicketNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LocalizedError for TicketError {
    fn status_code(&self) -> StatusCode {
        match self {
            TicketError::EmptyInput(_) | TicketError::MessageTooLong => StatusCode::BAD_REQUEST,
            TicketError::AccountNotProvisioned { .. } => StatusCode::FORBIDDEN,
            TicketError::TicketNotFound => StatusCode::NOT_FOUND,
            TicketError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            TicketError::EmptyInput(key) => *key,
            TicketError::MessageTooLong => "message_too_long",
            TicketError::AccountNotProvisioned { .. } => "ticket_for_support",
            TicketError::TicketNotFound => "invalid_ticket",
            TicketError::Internal(_) => "internal_error",
        }
    }

    fn message_args(&self) -> Vec<String> {
        match self {
            TicketError::MessageTooLong => vec![MAX_MESSAGE_CHARS.to_string()],
            TicketError::AccountNotProvisioned { support_email } => vec![support_email.clone()],
            _ => Vec::new(),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, TicketError>;

fn to_model(ticket: TicketEntity) -> UseCaseResult<TicketModel> {
    let ticket_id = ticket.id;
    TicketModel::try_from(ticket).map_err(|err| {
        error!(ticket_id, error = ?err, "tickets: stored ticket is malformed");
        TicketError::Internal(err)
    })
}

fn to_models(tickets: Vec<TicketEntity>) -> UseCaseResult<Vec<TicketModel>> {
    tickets.into_iter().map(to_model).collect()
}

fn check_length(message: &str) -> UseCaseResult<()> {
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(TicketError::MessageTooLong);
    }
    Ok(())
}

/// Ticket threads between customers and staff. Customer messages arm a
/// delayed staff auto-reply; staff replies and closing disarm it.
pub struct TicketUseCase<T, U>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    ticket_repository: Arc<T>,
    user_repository: Arc<U>,
    mailer: Arc<dyn MailDispatcher>,
    scheduler: Arc<AutoReplyScheduler>,
    support: Support,
}

impl<T, U> TicketUseCase<T, U>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(
        ticket_repository: Arc<T>,
        user_repository: Arc<U>,
        mailer: Arc<dyn MailDispatcher>,
        scheduler: Arc<AutoReplyScheduler>,
        support: Support,
    ) -> Self {
        Self {
            ticket_repository,
            user_repository,
            mailer,
            scheduler,
            support,
        }
    }

    pub async fn list(&self, user_id: i32) -> UseCaseResult<Vec<TicketModel>> {
        let tickets = self
            .ticket_repository
            .list_by_user(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "tickets: failed to list tickets");
                TicketError::Internal(err)
            })?;
        to_models(tickets)
    }

    pub async fn list_active(&self, user_id: i32) -> UseCaseResult<Vec<TicketModel>> {
        let tickets = self
            .ticket_repository
            .list_active_by_user(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "tickets: failed to list active tickets");
                TicketError::Internal(err)
            })?;
        to_models(tickets)
    }

    /// Staff queue: open, then answered, then closed. The repository order
    /// (most recently modified first) is kept within each status.
    pub async fn list_all(&self) -> UseCaseResult<Vec<TicketModel>> {
        let tickets = self.ticket_repository.list_all().await.map_err(|err| {
            error!(db_error = ?err, "tickets: failed to list all tickets");
            TicketError::Internal(err)
        })?;

        let mut models = to_models(tickets)?;
        models.sort_by_key(|ticket| ticket.status.priority());
        Ok(models)
    }

    /// The ticket with its thread. Customers only see their own tickets.
    pub async fn details(
        &self,
        user_id: i32,
        ticket_id: i32,
        staff: bool,
    ) -> UseCaseResult<TicketModel> {
        let ticket = self.find_accessible(user_id, ticket_id, staff).await?;

        let messages = self
            .ticket_repository
            .list_messages(ticket_id)
            .await
            .map_err(|err| {
                error!(ticket_id, db_error = ?err, "tickets: failed to load messages");
                TicketError::Internal(err)
            })?;

        let mut model = to_model(ticket)?;
        model.messages = messages.into_iter().map(TicketMessageModel::from).collect();
        Ok(model)
    }

    /// Opens a ticket. For staff, `user_id` is the customer the ticket is opened for.
    pub async fn open(
        self: &Arc<Self>,
        user_id: i32,
        name: String,
        message: String,
        staff: bool,
    ) -> UseCaseResult<i32> {
        let name = name.trim().to_string();
        if name.is_empty() || message.trim().is_empty() {
            return Err(TicketError::EmptyInput("subject_message_empty"));
        }
        check_length(&message)?;

        if !staff {
            self.ensure_provisioned(user_id).await?;
        }

        let now = Utc::now();
        let ticket = InsertTicketEntity {
            user_id,
            name: name.clone(),
            status: TicketStatus::Open.to_string(),
            created_at: now,
            modified_at: now,
        };
        let ticket_id = self
            .ticket_repository
            .open_ticket(ticket, message.clone(), staff)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "tickets: failed to open ticket");
                TicketError::Internal(err)
            })?;

        let recipient = if staff {
            MailRecipient::User(user_id)
        } else {
            MailRecipient::Staff
        };
        self.notify(
            recipient,
            TEMPLATE_TICKET_OPEN,
            TicketUpdateMail {
                id: ticket_id,
                subject: name.clone(),
                message,
            },
        );

        if !staff {
            self.arm_auto_reply(ticket_id);
        }

        info!(user_id, ticket_id, staff, subject = %name, "tickets: ticket opened");
        Ok(ticket_id)
    }

    pub async fn reply(
        self: &Arc<Self>,
        user_id: i32,
        ticket_id: i32,
        message: String,
        staff: bool,
    ) -> UseCaseResult<()> {
        if message.trim().is_empty() {
            return Err(TicketError::EmptyInput("message_empty"));
        }
        check_length(&message)?;

        let ticket = self.find_accessible(user_id, ticket_id, staff).await?;
        self.post_reply(&ticket, message, staff).await?;

        if staff {
            self.scheduler.cancel(ticket_id);
        } else {
            self.arm_auto_reply(ticket_id);
        }

        info!(user_id, ticket_id, staff, "tickets: reply posted");
        Ok(())
    }

    pub async fn close(&self, user_id: i32, ticket_id: i32) -> UseCaseResult<()> {
        let closed = self
            .ticket_repository
            .close_ticket(ticket_id, user_id)
            .await
            .map_err(|err| {
                error!(user_id, ticket_id, db_error = ?err, "tickets: failed to close ticket");
                TicketError::Internal(err)
            })?;

        if !closed {
            warn!(user_id, ticket_id, "tickets: close on missing or foreign ticket");
            return Err(TicketError::TicketNotFound);
        }

        self.scheduler.cancel(ticket_id);
        info!(user_id, ticket_id, "tickets: ticket closed");
        Ok(())
    }

    async fn post_reply(
        &self,
        ticket: &TicketEntity,
        message: String,
        staff: bool,
    ) -> UseCaseResult<()> {
        let status = TicketStatus::after_reply(staff);
        self.ticket_repository
            .append_message(ticket.id, staff, message.clone(), status)
            .await
            .map_err(|err| {
                error!(ticket_id = ticket.id, db_error = ?err, "tickets: failed to append message");
                TicketError::Internal(err)
            })?;

        let recipient = if staff {
            MailRecipient::User(ticket.user_id)
        } else {
            MailRecipient::Staff
        };
        self.notify(
            recipient,
            TEMPLATE_TICKET_REPLY,
            TicketUpdateMail {
                id: ticket.id,
                subject: ticket.name.clone(),
                message,
            },
        );
        Ok(())
    }

    fn arm_auto_reply(self: &Arc<Self>, ticket_id: i32) {
        let Some(auto_reply) = self.support.auto_reply.clone() else {
            return;
        };

        let usecase = Arc::clone(self);
        self.scheduler
            .schedule(ticket_id, auto_reply.delay, move || async move {
                usecase.send_auto_reply(ticket_id, auto_reply.message).await;
            });
    }

    async fn send_auto_reply(&self, ticket_id: i32, message: String) {
        let ticket = match self.ticket_repository.find_ticket(ticket_id, None).await {
            Ok(Some(ticket)) => ticket,
            Ok(None) => {
                warn!(ticket_id, "tickets: auto-reply target vanished");
                return;
            }
            Err(err) => {
                error!(ticket_id, db_error = ?err, "tickets: auto-reply lookup failed");
                return;
            }
        };

        if ticket.status == TicketStatus::Closed.as_str() {
            info!(ticket_id, "tickets: auto-reply skipped, ticket already closed");
            return;
        }

        if self.post_reply(&ticket, message, true).await.is_ok() {
            info!(ticket_id, "tickets: auto-reply posted");
        }
    }

    async fn find_accessible(
        &self,
        user_id: i32,
        ticket_id: i32,
        staff: bool,
    ) -> UseCaseResult<TicketEntity> {
        let owner = if staff { None } else { Some(user_id) };
        self.ticket_repository
            .find_ticket(ticket_id, owner)
            .await
            .map_err(|err| {
                error!(user_id, ticket_id, db_error = ?err, "tickets: failed to load ticket");
                TicketError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(user_id, ticket_id, staff, "tickets: ticket not accessible");
                TicketError::TicketNotFound
            })
    }

    async fn ensure_provisioned(&self, user_id: i32) -> UseCaseResult<()> {
        let user = self
            .user_repository
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(user_id, db_error = ?err, "tickets: failed to load user");
                TicketError::Internal(err)
            })?;

        let provisioned = match user {
            Some(user) => match UserStatus::try_from(user.status.as_str()) {
                Ok(status) => status.is_provisioned(),
                Err(err) => {
                    warn!(user_id, error = %err, "tickets: unexpected account status");
                    false
                }
            },
            None => false,
        };
        if !provisioned {
            warn!(user_id, "tickets: ticket from unprovisioned account");
            return Err(TicketError::AccountNotProvisioned {
                support_email: self.support.admin_email.clone(),
            });
        }
        Ok(())
    }

    fn notify(&self, recipient: MailRecipient, template: &str, mail: TicketUpdateMail) {
        match serde_json::to_value(&mail) {
            Ok(payload) => self.mailer.send(recipient, template, payload),
            Err(err) => error!(ticket_id = mail.id, error = %err, "tickets: failed to encode mail"),
        }
    }
}
