mod audit;
mod cache;
mod clock;
mod stores;

pub use audit::{AuditLog, AuditLogQuery};
pub use cache::DistributedCache;
pub use clock::{Clock, SystemClock};
pub use stores::{ConfigStore, MaintenanceStore, RoleStore};
