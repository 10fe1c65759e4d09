use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use panel::domain::{
    repositories::{tickets::TicketRepository, users::UserRepository},
    value_objects::tickets::{OpenedTicketDto, ReplyTicketModel, StaffOpenTicketModel},
};

use crate::auth::StaffUser;
use crate::usecases::tickets::{TicketError, TicketUseCase};

pub fn routes<T, U>(ticket_usecase: Arc<TicketUseCase<T, U>>) -> Router
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/tickets", get(list_all).post(open_for_user))
        .route("/tickets/:ticket_id", get(details))
        .route("/tickets/:ticket_id/reply", post(reply))
        .with_state(ticket_usecase)
}

pub async fn list_all<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    _staff: StaffUser,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Ok(Json(ticket_usecase.list_all().await?))
}

pub async fn open_for_user<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    _staff: StaffUser,
    Json(model): Json<StaffOpenTicketModel>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let id = ticket_usecase
        .open(model.user_id, model.name, model.message, true)
        .await?;
    Ok((StatusCode::CREATED, Json(OpenedTicketDto { id })))
}

pub async fn details<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    StaffUser(staff): StaffUser,
    Path(ticket_id): Path<i32>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    Ok(Json(
        ticket_usecase.details(staff.user_id, ticket_id, true).await?,
    ))
}

pub async fn reply<T, U>(
    State(ticket_usecase): State<Arc<TicketUseCase<T, U>>>,
    StaffUser(staff): StaffUser,
    Path(ticket_id): Path<i32>,
    Json(model): Json<ReplyTicketModel>,
) -> Result<impl IntoResponse, TicketError>
where
    T: TicketRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    ticket_usecase
        .reply(staff.user_id, ticket_id, model.message, true)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
