use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use panel::domain::{
    repositories::plans::PlanRepository,
    value_objects::plans::{AssociateRegionModel, CreatePlanModel, SetMetadataModel},
};
use serde_json::json;

use crate::auth::StaffUser;
use crate::usecases::plans::{PlanError, PlanUseCase};

pub fn routes<P>(plan_usecase: Arc<PlanUseCase<P>>) -> Router
where
    P: PlanRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/:plan_id", get(get_plan).delete(delete_plan))
        .route("/plans/:plan_id/enable", post(enable_plan))
        .route("/plans/:plan_id/disable", post(disable_plan))
        .route(
            "/plans/:plan_id/regions/:region",
            put(associate_region).delete(deassociate_region),
        )
        .route(
            "/plans/:plan_id/metadata/:key",
            put(set_metadata).delete(unset_metadata),
        )
        .route("/regions/:region/autopopulate", post(autopopulate))
        .with_state(plan_usecase)
}

pub async fn list_plans<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    Ok(Json(plan_usecase.list().await?))
}

pub async fn create_plan<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Json(model): Json<CreatePlanModel>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    let plan_id = plan_usecase.create(model).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": plan_id }))))
}

pub async fn get_plan<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path(plan_id): Path<i32>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    Ok(Json(plan_usecase.get(plan_id).await?))
}

pub async fn delete_plan<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path(plan_id): Path<i32>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_usecase.delete(plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn enable_plan<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path(plan_id): Path<i32>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_usecase.enable(plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn disable_plan<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path(plan_id): Path<i32>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_usecase.disable(plan_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn associate_region<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path((plan_id, region)): Path<(i32, String)>,
    Json(model): Json<AssociateRegionModel>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_usecase
        .associate_region(plan_id, &region, &model.identification)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deassociate_region<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path((plan_id, region)): Path<(i32, String)>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_usecase.deassociate_region(plan_id, &region).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_metadata<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path((plan_id, key)): Path<(i32, String)>,
    Json(model): Json<SetMetadataModel>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_usecase.set_metadata(plan_id, &key, &model.value).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unset_metadata<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path((plan_id, key)): Path<(i32, String)>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_usecase.unset_metadata(plan_id, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn autopopulate<P>(
    State(plan_usecase): State<Arc<PlanUseCase<P>>>,
    _staff: StaffUser,
    Path(region): Path<String>,
) -> Result<impl IntoResponse, PlanError>
where
    P: PlanRepository + Send + Sync + 'static,
{
    Ok(Json(plan_usecase.autopopulate(&region).await?))
}
