use std::sync::Arc;

use crate::config::Config;
use crate::db::{AccountStore, ProductStore};
use crate::services::{
    AdminService, Clock, FsSideFileService, SideFileService, StatsService, SystemClock,
};

/// Shared application state: the two stores plus the services composed
/// over them. Stores are stateless path handles, so cloning state never
/// duplicates collection data.
pub struct SharedState {
    pub config: Config,

    pub accounts: AccountStore,

    pub products: ProductStore,

    pub stats: StatsService,

    pub admin: AdminService,
}

impl SharedState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let side_files: Arc<dyn SideFileService> = Arc::new(FsSideFileService::new(
            &config.general.qr_path,
            &config.general.media_path,
        ));
        Self::with_collaborators(config, side_files, Arc::new(SystemClock))
    }

    /// Wires state with explicit collaborator implementations; tests
    /// substitute recording mocks and fixed clocks here.
    #[must_use]
    pub fn with_collaborators(
        config: Config,
        side_files: Arc<dyn SideFileService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accounts = AccountStore::new(&config.general.accounts_path);
        let products = ProductStore::new(&config.general.products_path);

        let stats = StatsService::new(accounts.clone(), products.clone());
        let admin = AdminService::new(accounts.clone(), products.clone(), side_files, clock);

        Self {
            config,
            accounts,
            products,
            stats,
            admin,
        }
    }
}
