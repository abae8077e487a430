use std::sync::Arc;

use crate::config::AuthConfig;
use crate::store::MemoryStore;
use crate::workflows::applications::ApplicationService;
use crate::workflows::assessments::AssessmentService;
use crate::workflows::identity::{IdentityService, TokenCodec, TokenError};
use crate::workflows::jobs::JobService;
use crate::workflows::notifications::NotificationFeed;
use crate::workflows::ranking::RankingService;

/// Shared handles injected into every placement handler.
#[derive(Clone)]
pub struct PlacementState {
    pub identity: Arc<IdentityService>,
    pub jobs: Arc<JobService>,
    pub applications: Arc<ApplicationService>,
    pub notifications: Arc<NotificationFeed>,
    pub ranking: Arc<RankingService>,
    pub assessments: Arc<AssessmentService>,
}

impl PlacementState {
    /// Wire every service against one store.
    pub fn from_store(store: Arc<MemoryStore>, auth: &AuthConfig) -> Result<Self, TokenError> {
        let tokens = Arc::new(TokenCodec::new(&auth.token_secret, auth.token_ttl_hours)?);
        let notifications = Arc::new(NotificationFeed::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        let ranking = Arc::new(RankingService::new(store.clone(), store.clone()));

        Ok(Self {
            identity: Arc::new(IdentityService::new(store.clone(), store.clone(), tokens)),
            jobs: Arc::new(JobService::new(store.clone(), store.clone(), store.clone())),
            applications: Arc::new(ApplicationService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                notifications.clone(),
            )),
            assessments: Arc::new(AssessmentService::new(
                store.clone(),
                store,
                ranking.clone(),
            )),
            notifications,
            ranking,
        })
    }
}
