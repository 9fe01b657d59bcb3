//! Natural-language financial commands against a live grid.
//!
//! Pipeline: [`Recognizer`] turns text into an [`Intent`], [`build_preview`]
//! projects it onto the current selection without touching the document,
//! [`apply`] executes the resolved [`ApplyPayload`] (snapshot, mutate, audit,
//! one flush) and [`UndoJournal`] reverses the most recent mutation.
//! [`Session`] wires the steps together for a single user.

pub mod apply;
pub mod audit;
pub mod dates;
pub mod error;
pub mod holidays;
pub mod intent;
pub mod journal;
pub mod numbers;
pub mod payload;
pub mod preview;
pub mod rates;
pub mod reports;
pub mod selection;
pub mod session;
pub mod telemetry;
pub mod text;

pub use apply::{apply, ApplyContext, ApplyOutcome};
pub use audit::{AuditEntry, AuditLog};
pub use error::{AssistError, RemoteError};
pub use holidays::{business_due_date, CzechCalendar, Holiday, HolidayCalendar};
pub use intent::{Intent, IntentKind, IntentType, Recognition, Recognizer};
pub use journal::{CaptureReceipt, Snapshot, UndoJournal, UndoOutcome};
pub use payload::{ApplyPayload, TargetRange};
pub use preview::{build_preview, Preview, PreviewContext, PreviewFailure, SampleTable};
pub use rates::{CnbClient, RateProvider, RateSource};
pub use selection::{inspect, SelectionInfo};
pub use session::{ChatMessage, ChatRole, Conversation, ConversationReply, NoConversation, RequestOutcome, Session};
pub use telemetry::TelemetryEvent;
