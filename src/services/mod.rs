pub mod admin;
pub use admin::{AdminError, AdminService, RESERVED_ADMIN};

pub mod clock;
pub use clock::{Clock, SystemClock};

pub mod side_files;
pub use side_files::{FsSideFileService, SideFileService};

pub mod stats;
pub use stats::{CatalogEntry, DashboardStats, FarmerDetail, FarmerSummary, StatsService};
