//! Session controller: one user's recognize → preview → apply → undo flow.
//!
//! Apply is only reachable through the last preview, so a plan is always
//! shown before the document changes. Calls take `&mut self`, which keeps
//! two applies from ever overlapping.

use chrono::NaiveDateTime;

use gridwise_config::Settings;
use gridwise_core::Grid;

use crate::apply::{apply, ApplyContext, ApplyOutcome};
use crate::error::{AssistError, RemoteError};
use crate::holidays::HolidayCalendar;
use crate::intent::Recognizer;
use crate::journal::{UndoJournal, UndoOutcome};
use crate::preview::{build_preview, Preview, PreviewContext, PreviewFailure};
use crate::rates::RateProvider;

/// Oldest messages are dropped beyond this many.
pub const HISTORY_LIMIT: usize = 50;

const EMPTY_REQUEST: &str = "Zadej prosím požadavek, abych mohl pokračovat.";
const NO_PLAN: &str = "Nejprve je potřeba připravit plán.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    System,
    /// A plan was prepared or applied
    Action,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: NaiveDateTime,
}

/// Answer from the conversational collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationReply {
    pub reply: String,
    /// Request text to run through the recognizer on the user's behalf
    pub follow_up: Option<String>,
}

/// Free-form replies for text no detector recognizes.
pub trait Conversation {
    fn reply(&self, history: &[ChatMessage], text: &str) -> Result<ConversationReply, RemoteError>;
}

/// Fallback when no conversational backend is configured.
pub struct NoConversation;

impl Conversation for NoConversation {
    fn reply(&self, _history: &[ChatMessage], _text: &str) -> Result<ConversationReply, RemoteError> {
        Ok(ConversationReply {
            reply: "Zatím nemám přístup k LLM. Zkus formulovat požadavek pomocí podporovaných intentů \
                    (DPH, formát CZK, kurz ČNB, deduplikace, svátky, SLA)."
                .to_string(),
            follow_up: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// A plan awaiting confirmation; [`Session::apply`] executes it
    Preview(Preview),
    Failed(PreviewFailure),
    Reply(String),
}

pub struct Session {
    recognizer: Recognizer,
    journal: UndoJournal,
    settings: Settings,
    rates: Box<dyn RateProvider>,
    calendar: Box<dyn HolidayCalendar>,
    conversation: Box<dyn Conversation>,
    history: Vec<ChatMessage>,
    pending: Option<Preview>,
    clock: Box<dyn Fn() -> NaiveDateTime>,
}

impl Session {
    pub fn new(
        settings: Settings,
        rates: Box<dyn RateProvider>,
        calendar: Box<dyn HolidayCalendar>,
    ) -> Result<Self, AssistError> {
        Ok(Self {
            recognizer: Recognizer::new()?,
            journal: UndoJournal::new(settings.undo_persist_cell_cap),
            settings,
            rates,
            calendar,
            conversation: Box::new(NoConversation),
            history: Vec::new(),
            pending: None,
            clock: Box::new(|| chrono::Local::now().naive_local()),
        })
    }

    pub fn with_conversation(mut self, conversation: Box<dyn Conversation>) -> Self {
        self.conversation = conversation;
        self
    }

    /// Fix "now" for relative dates, snapshots and audit timestamps.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDateTime + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn journal(&self) -> &UndoJournal {
        &self.journal
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn pending_preview(&self) -> Option<&Preview> {
        self.pending.as_ref()
    }

    /// Recognize `text` and prepare its plan. Unrecognized text goes to the
    /// conversation collaborator; its follow-up request is tried once.
    ///
    /// Any earlier plan is discarded, whatever the outcome.
    pub fn handle_request(&mut self, grid: &dyn Grid, text: &str) -> RequestOutcome {
        self.pending = None;
        let trimmed = text.trim();
        self.push(ChatRole::User, trimmed);
        if trimmed.is_empty() {
            self.push(ChatRole::System, EMPTY_REQUEST);
            return RequestOutcome::Reply(EMPTY_REQUEST.to_string());
        }
        self.route(grid, trimmed, true)
    }

    fn route(&mut self, grid: &dyn Grid, text: &str, follow_up_allowed: bool) -> RequestOutcome {
        let now = (self.clock)();
        let Some(recognition) = self.recognizer.recognize(text, now.date()) else {
            return self.converse(grid, text, follow_up_allowed);
        };

        let ctx = PreviewContext {
            grid,
            settings: &self.settings,
            calendar: self.calendar.as_ref(),
        };
        match build_preview(&recognition, &ctx) {
            Ok(preview) => {
                let note = if preview.issues.is_empty() { "." } else { " (pozor na doporučení níže)." };
                let summary = format!("Připravil jsem plán pro {}{}", preview.intent.intent_type().as_str(), note);
                self.push(ChatRole::Action, summary);
                self.pending = Some(preview.clone());
                RequestOutcome::Preview(preview)
            }
            Err(failure) => {
                if let AssistError::Internal(detail) = &failure.error {
                    log::error!("preview failed: {}", detail);
                }
                self.push(ChatRole::Error, format!("Nepodařilo se připravit plán: {}", failure.error.user_message()));
                RequestOutcome::Failed(failure)
            }
        }
    }

    fn converse(&mut self, grid: &dyn Grid, text: &str, follow_up_allowed: bool) -> RequestOutcome {
        match self.conversation.reply(&self.history, text) {
            Ok(answer) => {
                self.push(ChatRole::Assistant, answer.reply.clone());
                match answer.follow_up {
                    Some(next) if follow_up_allowed && !next.trim().is_empty() => {
                        log::debug!("following up with {:?}", next);
                        self.route(grid, next.trim(), false)
                    }
                    _ => RequestOutcome::Reply(answer.reply),
                }
            }
            Err(e) => {
                let message = AssistError::from(e).user_message();
                self.push(ChatRole::Error, message.clone());
                RequestOutcome::Reply(message)
            }
        }
    }

    /// Execute the pending plan. The plan is consumed whether or not it succeeds.
    pub fn apply(&mut self, grid: &mut dyn Grid) -> Result<ApplyOutcome, AssistError> {
        let Some(preview) = self.pending.take() else {
            self.push(ChatRole::Error, NO_PLAN);
            return Err(AssistError::input(NO_PLAN));
        };
        let mut ctx = ApplyContext {
            grid,
            journal: &mut self.journal,
            rates: self.rates.as_ref(),
            calendar: self.calendar.as_ref(),
            settings: &self.settings,
            now: (self.clock)(),
        };
        match apply(&preview.payload, &mut ctx) {
            Ok(outcome) => {
                self.push(ChatRole::Action, outcome.message.clone());
                for warning in &outcome.warnings {
                    log::warn!("{}", warning);
                    self.push(ChatRole::System, warning.clone());
                }
                Ok(outcome)
            }
            Err(e) => {
                if let AssistError::Internal(detail) = &e {
                    log::error!("apply {} failed: {}", preview.intent.intent_type().as_str(), detail);
                }
                self.push(ChatRole::Error, e.user_message());
                Err(e)
            }
        }
    }

    /// Reverse the most recent applied change.
    pub fn undo(&mut self, grid: &mut dyn Grid) -> Result<UndoOutcome, AssistError> {
        match self.journal.undo(grid) {
            Ok(outcome) => {
                log::info!("undo: {}", outcome.message());
                self.push(ChatRole::System, outcome.message());
                Ok(outcome)
            }
            Err(e) => {
                if let AssistError::Internal(detail) = &e {
                    log::error!("undo failed: {}", detail);
                }
                self.push(ChatRole::Error, e.user_message());
                Err(e)
            }
        }
    }

    fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.history.push(ChatMessage { role, content: content.into(), timestamp: (self.clock)() });
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}
