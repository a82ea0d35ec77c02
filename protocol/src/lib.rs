//! Records shared between the visit tracker and the surfaces that read them
//! (popup, command palette, search helpers).
//!
//! Everything here is part of the persisted / broadcast format, so field names
//! follow the camelCase layout the front-end already stores.

pub mod export;
mod message;
mod retention;
mod visit;

pub use message::HistoryMessage;
pub use retention::RETENTION_CONFIG_KEY;
pub use retention::RetentionConfig;
pub use retention::RetentionPeriod;
pub use visit::HISTORY_KEY;
pub use visit::VisitRecord;
