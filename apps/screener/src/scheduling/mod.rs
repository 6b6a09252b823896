// Interview scheduling: slot generation, greedy allocation, calendar events
// and invitations for shortlisted candidates.

pub mod allocator;
pub mod calendar;
pub mod handlers;
pub mod invitation;
pub mod notifier;
pub mod prompts;
pub mod service;
pub mod slots;

pub use notifier::LogNotifier;
pub use service::InterviewScheduler;
