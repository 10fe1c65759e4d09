use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use panel::domain::{
    entities::plans::{InsertPlanEntity, PlanEntity},
    repositories::plans::PlanRepository,
    value_objects::plans::{AutopopulateResultDto, CreatePlanModel},
};
use panel::providers::ProviderRegistry;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::axum_http::error_responses::LocalizedError;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("unknown region {0}")]
    UnknownRegion(String),
    #[error("region {0} cannot enumerate plans")]
    UnsupportedCapability(String),
    #[error("invalid plan attribute: {0}")]
    InvalidPlan(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LocalizedError for PlanError {
    fn status_code(&self) -> StatusCode {
        match self {
            PlanError::PlanNotFound | PlanError::UnknownRegion(_) => StatusCode::NOT_FOUND,
            PlanError::UnsupportedCapability(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PlanError::InvalidPlan(_) => StatusCode::BAD_REQUEST,
            PlanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            PlanError::PlanNotFound => "plan_not_found",
            PlanError::UnknownRegion(_) => "region_not_found",
            PlanError::UnsupportedCapability(_) => "region_plans_unsupported",
            PlanError::InvalidPlan(_) => "invalid_plan",
            PlanError::Internal(_) => "internal_error",
        }
    }

    fn message_args(&self) -> Vec<String> {
        match self {
            PlanError::UnknownRegion(region) | PlanError::UnsupportedCapability(region) => {
                vec![region.clone()]
            }
            PlanError::InvalidPlan(field) => vec![field.to_string()],
            _ => Vec::new(),
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PlanError>;

pub struct PlanUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    plan_repository: Arc<P>,
    providers: Arc<ProviderRegistry>,
}

impl<P> PlanUseCase<P>
where
    P: PlanRepository + Send + Sync + 'static,
{
    pub fn new(plan_repository: Arc<P>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            plan_repository,
            providers,
        }
    }

    pub fn regions(&self) -> Vec<String> {
        self.providers.regions()
    }

    pub async fn list(&self) -> UseCaseResult<Vec<PlanEntity>> {
        self.plan_repository.list_plans().await.map_err(|err| {
            error!(db_error = ?err, "plans: failed to list plans");
            PlanError::Internal(err)
        })
    }

    pub async fn list_for_region(&self, region: &str) -> UseCaseResult<Vec<PlanEntity>> {
        self.ensure_region(region)?;

        self.plan_repository
            .list_plans_for_region(region)
            .await
            .map_err(|err| {
                error!(%region, db_error = ?err, "plans: failed to list region plans");
                PlanError::Internal(err)
            })
    }

    /// The plan with its region bindings and metadata loaded.
    pub async fn get(&self, plan_id: i32) -> UseCaseResult<PlanEntity> {
        let mut plan = self.find_plan(plan_id).await?;

        let region_plans = if plan.global {
            BTreeMap::new()
        } else {
            self.plan_repository
                .list_region_plans(plan_id)
                .await
                .map_err(|err| {
                    error!(plan_id, db_error = ?err, "plans: failed to load region bindings");
                    PlanError::Internal(err)
                })?
        };
        let metadata = self
            .plan_repository
            .list_metadata(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to load metadata");
                PlanError::Internal(err)
            })?;

        plan.region_plans = Some(region_plans);
        plan.metadata = Some(metadata);
        Ok(plan)
    }

    pub async fn get_for_region(&self, region: &str, plan_id: i32) -> UseCaseResult<PlanEntity> {
        self.ensure_region(region)?;

        self.plan_repository
            .find_for_region(region, plan_id)
            .await
            .map_err(|err| {
                error!(%region, plan_id, db_error = ?err, "plans: failed to load region plan");
                PlanError::Internal(err)
            })?
            .ok_or(PlanError::PlanNotFound)
    }

    pub async fn create(&self, model: CreatePlanModel) -> UseCaseResult<i32> {
        let plan = model.into_insert_entity().map_err(|field| {
            warn!(field, "plans: invalid plan attributes");
            PlanError::InvalidPlan(field)
        })?;

        let plan_name = plan.name.clone();
        let plan_id = self.plan_repository.create_plan(plan).await.map_err(|err| {
            error!(%plan_name, db_error = ?err, "plans: failed to create plan");
            PlanError::Internal(err)
        })?;

        info!(plan_id, %plan_name, "plans: plan created");
        Ok(plan_id)
    }

    pub async fn delete(&self, plan_id: i32) -> UseCaseResult<()> {
        self.plan_repository.delete_plan(plan_id).await.map_err(|err| {
            error!(plan_id, db_error = ?err, "plans: failed to delete plan");
            PlanError::Internal(err)
        })?;

        info!(plan_id, "plans: plan deleted");
        Ok(())
    }

    pub async fn enable(&self, plan_id: i32) -> UseCaseResult<()> {
        self.set_enabled(plan_id, true).await
    }

    pub async fn disable(&self, plan_id: i32) -> UseCaseResult<()> {
        self.set_enabled(plan_id, false).await
    }

    pub async fn associate_region(
        &self,
        plan_id: i32,
        region: &str,
        identification: &str,
    ) -> UseCaseResult<()> {
        self.ensure_region(region)?;
        let identification = identification.trim();
        if identification.is_empty() {
            return Err(PlanError::InvalidPlan("identification"));
        }
        self.find_plan(plan_id).await?;

        self.plan_repository
            .upsert_region_plan(plan_id, region, identification)
            .await
            .map_err(|err| {
                error!(plan_id, %region, db_error = ?err, "plans: failed to bind region");
                PlanError::Internal(err)
            })?;

        info!(plan_id, %region, %identification, "plans: region bound");
        Ok(())
    }

    pub async fn deassociate_region(&self, plan_id: i32, region: &str) -> UseCaseResult<()> {
        self.plan_repository
            .delete_region_plan(plan_id, region)
            .await
            .map_err(|err| {
                error!(plan_id, %region, db_error = ?err, "plans: failed to unbind region");
                PlanError::Internal(err)
            })?;

        info!(plan_id, %region, "plans: region unbound");
        Ok(())
    }

    /// Creates a region-bound plan for every provider plan not yet bound in `region`.
    pub async fn autopopulate(&self, region: &str) -> UseCaseResult<AutopopulateResultDto> {
        let vm = self.ensure_region(region)?;
        let lister = vm.as_plan_lister().ok_or_else(|| {
            warn!(%region, kind = vm.kind(), "plans: region cannot list plans");
            PlanError::UnsupportedCapability(region.to_string())
        })?;

        let provider_plans = lister.plan_list().await.map_err(|err| {
            error!(%region, provider_error = ?err, "plans: failed to fetch provider plans");
            PlanError::Internal(err)
        })?;

        let mut created_plan_ids = Vec::new();
        for provider_plan in provider_plans {
            let identification = provider_plan.identification;
            let plan = InsertPlanEntity {
                name: provider_plan.name,
                price: provider_plan.price,
                ram: provider_plan.ram,
                cpu: provider_plan.cpu,
                storage: provider_plan.storage,
                bandwidth: provider_plan.bandwidth,
                global: false,
                enabled: true,
            };
            let created = self
                .plan_repository
                .create_plan_in_region(plan, region, &identification)
                .await
                .map_err(|err| {
                    error!(
                        %region,
                        %identification,
                        db_error = ?err,
                        "plans: failed to create provider plan"
                    );
                    PlanError::Internal(err)
                })?;
            match created {
                Some(plan_id) => created_plan_ids.push(plan_id),
                None => debug!(%region, %identification, "plans: provider plan already bound"),
            }
        }

        info!(%region, created = created_plan_ids.len(), "plans: autopopulate finished");
        Ok(AutopopulateResultDto {
            region: region.to_string(),
            created_plan_ids,
        })
    }

    pub async fn set_metadata(&self, plan_id: i32, key: &str, value: &str) -> UseCaseResult<()> {
        if key.trim().is_empty() {
            return Err(PlanError::InvalidPlan("key"));
        }
        self.find_plan(plan_id).await?;

        self.plan_repository
            .upsert_metadata(plan_id, key, value)
            .await
            .map_err(|err| {
                error!(plan_id, %key, db_error = ?err, "plans: failed to set metadata");
                PlanError::Internal(err)
            })
    }

    pub async fn unset_metadata(&self, plan_id: i32, key: &str) -> UseCaseResult<()> {
        if key.trim().is_empty() {
            return Err(PlanError::InvalidPlan("key"));
        }

        self.plan_repository
            .delete_metadata(plan_id, key)
            .await
            .map_err(|err| {
                error!(plan_id, %key, db_error = ?err, "plans: failed to unset metadata");
                PlanError::Internal(err)
            })
    }

    async fn set_enabled(&self, plan_id: i32, enabled: bool) -> UseCaseResult<()> {
        self.plan_repository
            .set_enabled(plan_id, enabled)
            .await
            .map_err(|err| {
                error!(plan_id, enabled, db_error = ?err, "plans: failed to toggle plan");
                PlanError::Internal(err)
            })?;

        info!(plan_id, enabled, "plans: plan toggled");
        Ok(())
    }

    async fn find_plan(&self, plan_id: i32) -> UseCaseResult<PlanEntity> {
        self.plan_repository
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(plan_id, db_error = ?err, "plans: failed to load plan");
                PlanError::Internal(err)
            })?
            .ok_or(PlanError::PlanNotFound)
    }

    fn ensure_region(
        &self,
        region: &str,
    ) -> UseCaseResult<Arc<dyn panel::providers::VmInterface>> {
        self.providers.region(region).ok_or_else(|| {
            warn!(%region, "plans: unknown region");
            PlanError::UnknownRegion(region.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI32, Ordering};

    use super::*;
    use mockall::predicate::{always, eq, function};
    use panel::domain::repositories::plans::MockPlanRepository;
    use panel::providers::config::SolusVmConfig;
    use panel::providers::vm::{ProviderPlan, fake::FakeVm, solusvm::SolusVm};

    fn registry() -> Arc<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        registry
            .register_vm_interface(
                "us-east",
                Arc::new(FakeVm::with_plans(vec![
                    provider_plan("Tiny", "t1"),
                    provider_plan("Small", "s1"),
                ])),
            )
            .unwrap();
        registry
            .register_vm_interface("eu-west", Arc::new(FakeVm::default()))
            .unwrap();
        registry
            .register_vm_interface(
                "legacy",
                Arc::new(
                    SolusVm::new(&SolusVmConfig {
                        url: "https://solus.example.com".to_string(),
                        api_id: "id".to_string(),
                        api_key: "key".to_string(),
                        virt_type: "kvm".to_string(),
                        node_group: "1".to_string(),
                        insecure: false,
                    })
                    .unwrap(),
                ),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn provider_plan(name: &str, identification: &str) -> ProviderPlan {
        ProviderPlan {
            name: name.to_string(),
            identification: identification.to_string(),
            price: 300,
            ram: 512,
            cpu: 1,
            storage: 10,
            bandwidth: 100,
        }
    }

    fn starter(identification: &str) -> PlanEntity {
        PlanEntity {
            id: 1,
            name: "Starter".to_string(),
            price: 500,
            ram: 512,
            cpu: 1,
            storage: 10,
            bandwidth: 100,
            global: false,
            enabled: true,
            identification: identification.to_string(),
            region_plans: None,
            metadata: None,
        }
    }

    fn starter_model() -> CreatePlanModel {
        CreatePlanModel {
            name: "Starter".to_string(),
            price: 500,
            ram: 512,
            cpu: 1,
            storage: 10,
            bandwidth: 100,
            global: false,
        }
    }

    #[tokio::test]
    async fn create_validates_and_inserts_enabled_plan() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_create_plan()
            .withf(|plan| plan.name == "Starter" && plan.enabled && !plan.global)
            .times(1)
            .returning(|_| Ok(1));

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        assert_eq!(usecase.create(starter_model()).await.unwrap(), 1);

        let mut invalid = starter_model();
        invalid.price = -1;
        assert!(matches!(
            usecase.create(invalid).await,
            Err(PlanError::InvalidPlan("price"))
        ));
    }

    #[tokio::test]
    async fn associate_region_checks_the_plan_then_upserts_the_binding() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(starter(""))));
        plan_repo.expect_find_by_id().with(eq(2)).returning(|_| Ok(None));
        plan_repo
            .expect_upsert_region_plan()
            .with(eq(1), eq("us-east"), eq("ext-123"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        usecase
            .associate_region(1, "us-east", " ext-123 ")
            .await
            .unwrap();

        assert!(matches!(
            usecase.associate_region(2, "us-east", "ext-123").await,
            Err(PlanError::PlanNotFound)
        ));
        assert!(matches!(
            usecase.associate_region(1, "us-east", "  ").await,
            Err(PlanError::InvalidPlan("identification"))
        ));
    }

    #[tokio::test]
    async fn associate_rejects_unknown_region_before_touching_storage() {
        let plan_repo = MockPlanRepository::new();
        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());

        let err = usecase
            .associate_region(1, "mars", "ext-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::UnknownRegion(ref region) if region == "mars"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn get_loads_bindings_and_metadata() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(starter(""))));
        plan_repo.expect_list_region_plans().returning(|_| {
            Ok(BTreeMap::from([("us-east".to_string(), "ext-123".to_string())]))
        });
        plan_repo
            .expect_list_metadata()
            .returning(|_| Ok(BTreeMap::from([("os".to_string(), "linux".to_string())])));
        plan_repo.expect_find_by_id().with(eq(9)).returning(|_| Ok(None));

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        let plan = usecase.get(1).await.unwrap();
        assert_eq!(plan.region_plans.unwrap()["us-east"], "ext-123");
        assert_eq!(plan.metadata.unwrap()["os"], "linux");

        assert!(matches!(usecase.get(9).await, Err(PlanError::PlanNotFound)));
    }

    #[tokio::test]
    async fn get_for_region_hides_invisible_plans() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_for_region()
            .with(eq("eu-west"), eq(1))
            .returning(|_, _| Ok(None));

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        assert!(matches!(
            usecase.get_for_region("eu-west", 1).await,
            Err(PlanError::PlanNotFound)
        ));
    }

    #[tokio::test]
    async fn autopopulate_skips_identifications_already_bound() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_create_plan_in_region()
            .with(always(), eq("us-east"), eq("t1"))
            .times(1)
            .returning(|_, _, _| Ok(None));
        plan_repo
            .expect_create_plan_in_region()
            .with(
                function(|plan: &InsertPlanEntity| plan.name == "Small" && !plan.global),
                eq("us-east"),
                eq("s1"),
            )
            .times(1)
            .returning(|_, _, _| Ok(Some(5)));

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        let result = usecase.autopopulate("us-east").await.unwrap();
        assert_eq!(result.created_plan_ids, vec![5]);
        assert_eq!(result.region, "us-east");
    }

    #[tokio::test]
    async fn concurrent_autopopulate_binds_each_identification_once() {
        let bound: Arc<Mutex<BTreeSet<(String, String)>>> = Arc::default();
        let next_id = Arc::new(AtomicI32::new(1));

        let mut plan_repo = MockPlanRepository::new();
        {
            let bound = Arc::clone(&bound);
            plan_repo
                .expect_create_plan_in_region()
                .returning(move |_, region, identification| {
                    let key = (region.to_string(), identification.to_string());
                    if !bound.lock().unwrap().insert(key) {
                        return Ok(None);
                    }
                    Ok(Some(next_id.fetch_add(1, Ordering::SeqCst)))
                });
        }

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        let (first, second) = tokio::join!(
            usecase.autopopulate("us-east"),
            usecase.autopopulate("us-east")
        );

        let created = first.unwrap().created_plan_ids.len() + second.unwrap().created_plan_ids.len();
        assert_eq!(created, 2);
        assert_eq!(
            bound.lock().unwrap().iter().cloned().collect::<Vec<_>>(),
            vec![
                ("us-east".to_string(), "s1".to_string()),
                ("us-east".to_string(), "t1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn autopopulate_requires_a_listing_backend() {
        let usecase = PlanUseCase::new(Arc::new(MockPlanRepository::new()), registry());

        assert!(matches!(
            usecase.autopopulate("legacy").await,
            Err(PlanError::UnsupportedCapability(_))
        ));
        assert!(matches!(
            usecase.autopopulate("nowhere").await,
            Err(PlanError::UnknownRegion(_))
        ));
    }

    #[tokio::test]
    async fn metadata_keys_must_not_be_empty() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(starter(""))));
        plan_repo
            .expect_upsert_metadata()
            .with(eq(1), eq("os"), eq("linux"))
            .times(1)
            .returning(|_, _, _| Ok(()));

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        usecase.set_metadata(1, "os", "linux").await.unwrap();
        assert!(matches!(
            usecase.set_metadata(1, " ", "x").await,
            Err(PlanError::InvalidPlan("key"))
        ));
    }

    #[tokio::test]
    async fn storage_failures_surface_as_internal_errors() {
        let mut plan_repo = MockPlanRepository::new();
        plan_repo
            .expect_list_plans()
            .returning(|| Err(anyhow::anyhow!("pool timed out")));

        let usecase = PlanUseCase::new(Arc::new(plan_repo), registry());
        let err = usecase.list().await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message_key(), "internal_error");
    }
}
