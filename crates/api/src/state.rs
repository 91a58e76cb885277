use immolink_config::Settings;
use immolink_services::{
    AuthService, ContractService,
    dao::{collaboration::CollaborationDao, post::PostDao, user::UserDao},
};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub posts: Arc<PostDao>,
    pub collaborations: Arc<CollaborationDao>,
    pub contracts: Arc<ContractService>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let posts = Arc::new(PostDao::new(&db));
        let collaborations = Arc::new(CollaborationDao::new(&db));
        let contracts = Arc::new(ContractService::new(&db));

        Self {
            db,
            settings,
            auth,
            users,
            posts,
            collaborations,
            contracts,
        }
    }
}
