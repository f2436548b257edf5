pub mod activity;
pub mod announcements;
pub mod metrics;
pub mod repository;
pub mod snapshot;
pub mod tickets;
pub mod verification;

pub use activity::ActivityLogger;
pub use announcements::AnnouncementService;
pub use metrics::{get_metrics, init_metrics};
pub use repository::{DueRepository, Scope};
pub use snapshot::SnapshotService;
pub use tickets::TicketService;
