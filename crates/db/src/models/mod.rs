pub mod collaboration;
pub mod notification;
pub mod property;
pub mod search_ad;
pub mod user;

pub use collaboration::{
    step_title, Activity, ActivityType, Collaboration, CollaborationStatus, CompensationType,
    CompletionReason, ParticipantRole, PostRef, PostType, ProgressStep, StepDef,
    DEAL_CONCLUDED_STEP, PROGRESS_STEPS,
};
pub use notification::{Notification, NotificationType};
pub use property::{Property, PropertyStatus, TransactionType};
pub use search_ad::{SearchAd, SearchAdStatus};
pub use user::{AccountType, User};
