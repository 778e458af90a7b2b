mod handlers;
mod middleware;
mod ws;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::Settings;
use crate::cron::CronReader;
use crate::health::HealthSampler;
use crate::hub::BroadcastHub;
use crate::knowcore::KnowcoreClient;
use crate::memory::MemoryReader;
use crate::skills::SkillRegistry;
use crate::tasks::TaskStore;

pub use middleware::{require_api_key, API_KEY_HEADER};

/// Everything a request handler, the watchers or the ticker may touch.
/// Cheap to clone; the hub and the task store's write lock are shared.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub hub: BroadcastHub,
    pub tasks: TaskStore,
    pub memory: MemoryReader,
    pub skills: SkillRegistry,
    pub cron: CronReader,
    pub health: HealthSampler,
    pub knowcore: KnowcoreClient,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            hub: BroadcastHub::new(),
            tasks: TaskStore::new(settings.task_file()),
            memory: MemoryReader::new(settings.memory_dir()),
            skills: SkillRegistry::new(settings.skills_dir()),
            cron: CronReader::default(),
            health: HealthSampler::default(),
            knowcore: KnowcoreClient::new(
                settings.knowcore_url.clone(),
                settings.knowcore_key.clone(),
            ),
            settings: Arc::new(settings),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/memory", get(handlers::list_memory))
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/{id}/status", post(handlers::update_task_status))
        .route("/skills", get(handlers::list_skills))
        .route("/cron", get(handlers::list_cron))
        .route("/knowcore", get(handlers::knowcore_status))
        .route("/actions/{action}", post(handlers::run_action))
        .layer(from_fn_with_state(state.settings.clone(), require_api_key));

    // Unknown paths get the dashboard shell so client-side routing works.
    let dist = &state.settings.dist_dir;
    let dashboard = ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(ws::live_updates))
        .fallback_service(dashboard)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
