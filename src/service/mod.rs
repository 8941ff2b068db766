pub mod aggregation;
pub mod reconciliation;
pub mod submission_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::domain::PointConfig;
use crate::invalidation::InvalidationManager;
use crate::repository::*;
use crate::storage::ObjectStorage;
use reconciliation::ReconciliationService;
use submission_service::SubmissionService;

pub struct ServiceContext {
    pub member_repo: Arc<dyn MemberRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub submission_repo: Arc<dyn SubmissionRepository>,
    pub reconciliation_service: Arc<ReconciliationService>,
    pub submission_service: Arc<SubmissionService>,
    pub invalidation_manager: Arc<InvalidationManager>,
    pub storage: Arc<dyn ObjectStorage>,
    pub point_config: PointConfig,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        point_config: PointConfig,
        max_boost: i64,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let member_repo: Arc<dyn MemberRepository> =
            Arc::new(SqliteMemberRepository::new(db_pool.clone()));
        let event_repo: Arc<dyn EventRepository> =
            Arc::new(SqliteEventRepository::new(db_pool.clone()));
        let submission_repo: Arc<dyn SubmissionRepository> =
            Arc::new(SqliteSubmissionRepository::new(db_pool.clone()));

        let invalidation_manager = Arc::new(InvalidationManager::new());

        let reconciliation_service = Arc::new(ReconciliationService::new(
            db_pool.clone(),
            member_repo.clone(),
            submission_repo.clone(),
            point_config.clone(),
            max_boost,
            storage.clone(),
            invalidation_manager.clone(),
        ));

        let submission_service = Arc::new(SubmissionService::new(
            event_repo.clone(),
            submission_repo.clone(),
            point_config.clone(),
            storage.clone(),
            invalidation_manager.clone(),
        ));

        Self {
            member_repo,
            event_repo,
            submission_repo,
            reconciliation_service,
            submission_service,
            invalidation_manager,
            storage,
            point_config,
            db_pool,
        }
    }
}
