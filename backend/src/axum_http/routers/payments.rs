use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
};

use crate::auth::AuthUser;
use crate::usecases::payments::{CheckoutModel, PaymentError, PaymentUseCase};

pub fn routes(payment_usecase: Arc<PaymentUseCase>) -> Router {
    Router::new()
        .route("/methods", get(list_methods))
        .route("/:method", post(checkout))
        .with_state(payment_usecase)
}

pub async fn list_methods(
    State(payment_usecase): State<Arc<PaymentUseCase>>,
    _auth: AuthUser,
) -> impl IntoResponse {
    Json(payment_usecase.methods())
}

pub async fn checkout(
    State(payment_usecase): State<Arc<PaymentUseCase>>,
    auth: AuthUser,
    Path(method): Path<String>,
    Json(model): Json<CheckoutModel>,
) -> Result<impl IntoResponse, PaymentError> {
    let checkout = payment_usecase
        .checkout(auth.user_id, auth.email, &method, model)
        .await?;
    Ok(Json(checkout))
}
