pub mod activity;
pub mod announcement;
pub mod due;
pub mod submission;
pub mod ticket;

pub use activity::ActivityRecord;
pub use announcement::{AnnouncementRecord, ANNOUNCEMENT_MAX_LEN};
pub use due::{DueRecord, DueState, PaymentMethod, VerificationBlock, VerificationRules};
pub use submission::SubmissionRecord;
pub use ticket::{TicketRecord, TICKET_ID_ALPHABET, TICKET_ID_LEN};

/// Persisted collection names. These are part of the schema surface shared
/// with existing deployments and must not be renamed.
pub mod collections {
    pub const PAYMENTS: &str = "Payments";
    pub const SUBMISSIONS: &str = "submissions";
    pub const TICKETS: &str = "tickets";
    pub const ANNOUNCEMENTS: &str = "announcements";
    pub const ACTIVITY: &str = "Activity";
}
