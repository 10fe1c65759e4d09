use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use panel::domain::{
    repositories::{tickets::TicketRepository, users::UserRepository},
    value_objects::tickets::{ListTicketsFilter, OpenTicketModel, OpenedTicketDto, ReplyTicketModel},
};

use crate::auth::AuthUser;
use crate::usecases::tickets::{TicketError, TicketUseCase};

pub fn routes<T, U>(ticket_usecase: Arc<TicketUseCase<T, U>>) -> Router
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list).post(open))
        .route("/:ticket_id", get(details))
        .route("/:ticket_id/reply", post(reply))
        .route("/:ticket_id/close", post(close))
        .with_state(ticket_usecase)
}

pub async fn list<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    auth: AuthUser,
    Query(filter): Query<ListTicketsFilter>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let tickets = if filter.active {
        ticket_usecase.list_active(auth.user_id).await?
    } else {
        ticket_usecase.list(auth.user_id).await?
    };
    Ok(Json(tickets))
}

pub async fn open<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    auth: AuthUser,
    Json(model): Json<OpenTicketModel>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let id = ticket_usecase
        .open(auth.user_id, model.name, model.message, false)
        .await?;
    Ok((StatusCode::CREATED, Json(OpenedTicketDto { id })))
}

pub async fn details<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    auth: AuthUser,
    Path(ticket_id): Path<i32>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Ok(Json(
        ticket_usecase.details(auth.user_id, ticket_id, false).await?,
    ))
}

pub async fn reply<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    auth: AuthUser,
    Path(ticket_id): Path<i32>,
    Json(model): Json<ReplyTicketModel>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    ticket_usecase
        .reply(auth.user_id, ticket_id, model.message, false)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn close<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    auth: AuthUser,
    Path(ticket_id): Path<i32>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    ticket_usecase.close(auth.user_id, ticket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
