use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use panel::domain::repositories::plans::PlanRepository;

use crate::auth::AuthUser;
use crate::usecases::plans::{PlanError, PlanUseCase};

pub fn routes<P>(plan_usecase: Arc<PlanUseCase<P>>) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_regions))
        .route("/:region/plans", get(list_region_plans))
        .route("/:region/plans/:plan_id", get(get_region_plan))
        .with_state(plan_usecase)
}

pub async fn list_regions<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _auth: AuthUser,
) -> impl IntoResponse
where
    P: PlanRepository + Send + Sync + 'static,
{
    Json(plan_usecase.regions())
}

pub async fn list_region_plans<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _auth: AuthUser,
    Path(region): Path<String>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    let plans = plan_usecase.list_for_region(&region).await?;
    Ok(Json(plans))
}

pub async fn get_region_plan<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _auth: AuthUser,
    Path((region, plan_id)): Path<(String, i32)>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    let plan = plan_usecase.get_for_region(&region, plan_id).await?;
    Ok(Json(plan))
}
