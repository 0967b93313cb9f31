pub mod profile;
pub mod question;
pub mod range;
pub mod session;
pub mod task;

pub use profile::{Profile, ProfileInput, DEFAULT_DISPLAY_NAME};
pub use question::{Question, QuestionType};
pub use range::DateRange;
pub use session::{NewSession, Session};
pub use task::DailyTask;
