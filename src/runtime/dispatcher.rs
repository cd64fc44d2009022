//! Update dispatch
//!
//! One decoded action in, one session write out. The dispatcher is the only
//! writer of the session table: every update resolves to at most one `put`
//! or `remove`, so concurrent chatter from the same user cannot interleave
//! partial mutations.

use crate::notion::Person;
use crate::report::{assemble, ReportRecord};
use crate::runtime::traits::{Directory, Gateway, MediaResolver, RecordStore};
use crate::session::SessionStore;
use crate::state_machine::action::token;
use crate::state_machine::state::MAX_PICKER_ENTRIES;
use crate::state_machine::transition::{
    cancelled_prompt, help_prompt, menu_prompt, person_picker_text, TransitionError,
};
use crate::state_machine::{start_flow, transition, Action, Choice, Effect, ReportKind, Session};
use crate::telegram::types::{Message, Update};
use chrono::NaiveDateTime;
use std::sync::Arc;

const NO_EMPLOYEES_TEXT: &str = "No employees found. Contact support.";
const UNKNOWN_COMMAND_TEXT: &str = "Unknown command. Type /comm_help to see available commands.";
const IDLE_TEXT: &str =
    "Type /comm_help to see available commands or /report to start a new report:";
const PHOTO_WITHOUT_SESSION_TEXT: &str = "Start a report first before adding photos.";
const SUBMIT_FAILED_TEXT: &str = "❌ Failed to submit. Please try again.";

pub struct Dispatcher<G, M, R, D> {
    gateway: G,
    resolver: M,
    records: R,
    directory: D,
    sessions: Arc<SessionStore>,
    /// Chat that receives shout-out broadcasts; `None` disables them
    shoutout_chat: Option<i64>,
}

impl<G, M, R, D> Dispatcher<G, M, R, D>
where
    G: Gateway,
    M: MediaResolver,
    R: RecordStore,
    D: Directory,
{
    pub fn new(
        gateway: G,
        resolver: M,
        records: R,
        directory: D,
        sessions: Arc<SessionStore>,
        shoutout_chat: Option<i64>,
    ) -> Self {
        Self {
            gateway,
            resolver,
            records,
            directory,
            sessions,
            shoutout_chat,
        }
    }

    pub async fn handle_update(&self, update: Update, now: NaiveDateTime) {
        if let Some(message) = update.message {
            self.handle_message(message, now).await;
        } else if let Some(callback) = update.callback_query {
            if let Err(e) = self.gateway.answer_callback(&callback.id).await {
                tracing::warn!(error = %e, "Failed to acknowledge callback");
            }

            let chat_id = match callback.message.as_ref() {
                Some(message) => message.chat.id,
                None => return,
            };
            let data = match callback.data.as_deref() {
                Some(data) => data,
                None => return,
            };
            match Action::from_callback(data) {
                Some(action) => self.apply_action(callback.from.id, chat_id, action, now).await,
                None => tracing::debug!(data, "Ignoring unrecognized callback token"),
            }
        }
    }

    async fn handle_message(&self, message: Message, now: NaiveDateTime) {
        let user_id = match message.from.as_ref() {
            Some(user) => user.id,
            None => return,
        };
        let chat_id = message.chat.id;

        if let Some(text) = message.text.as_deref() {
            if text.starts_with('/') {
                // Group chats suffix commands with the bot name: /report@opsdesk_bot
                let command = text
                    .split_whitespace()
                    .next()
                    .and_then(|word| word.split('@').next())
                    .unwrap_or(text);
                match Action::from_command(command) {
                    Some(action) => self.apply_action(user_id, chat_id, action, now).await,
                    None => {
                        self.send(chat_id, UNKNOWN_COMMAND_TEXT, None).await;
                        self.run_effects(chat_id, vec![menu_prompt()], now).await;
                    }
                }
                return;
            }
            self.apply_action(user_id, chat_id, Action::from_text(text), now)
                .await;
        } else if let Some(photo) = message.largest_photo() {
            let action = Action::Photo {
                file_id: photo.file_id.clone(),
            };
            self.apply_action(user_id, chat_id, action, now).await;
        }
    }

    async fn apply_action(&self, user_id: i64, chat_id: i64, action: Action, now: NaiveDateTime) {
        match action {
            Action::OpenMenu => self.run_effects(chat_id, vec![menu_prompt()], now).await,
            Action::Help => self.run_effects(chat_id, vec![help_prompt()], now).await,
            Action::Status => self.send_status(chat_id).await,
            Action::Start(kind) => self.start_report(user_id, chat_id, kind, now).await,
            Action::Cancel => {
                // Confirmed even with nothing in progress; the user asked
                // for a known state either way
                self.sessions.remove(user_id);
                self.run_effects(chat_id, vec![cancelled_prompt(), menu_prompt()], now)
                    .await;
            }
            action => match self.sessions.get(user_id, now) {
                Some(session) => match transition(&session, action, now) {
                    Ok(result) => {
                        match result.session {
                            Some(next) => self.sessions.put(next),
                            None => self.sessions.remove(user_id),
                        }
                        self.run_effects(chat_id, result.effects, now).await;
                    }
                    Err(TransitionError::NotApplicable { step, action }) => {
                        tracing::debug!(?step, ?action, user_id, "Dropping inapplicable action");
                    }
                },
                None => match action {
                    Action::Text(_) => {
                        self.send(chat_id, IDLE_TEXT, None).await;
                        self.run_effects(chat_id, vec![menu_prompt()], now).await;
                    }
                    Action::Photo { .. } => {
                        self.send(chat_id, PHOTO_WITHOUT_SESSION_TEXT, None).await;
                    }
                    // Stale button press from a dead conversation
                    _ => tracing::debug!(user_id, ?action, "Ignoring action with no session"),
                },
            },
        }
    }

    async fn start_report(&self, user_id: i64, chat_id: i64, kind: ReportKind, now: NaiveDateTime) {
        // Pre-flight the directory for person kinds so an empty or dead
        // roster never leaves a half-started session behind
        if kind.uses_person() {
            match self.directory.list_active().await {
                Ok(people) if !people.is_empty() => {}
                Ok(_) => {
                    self.send(chat_id, NO_EMPLOYEES_TEXT, None).await;
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Directory lookup failed; not starting report");
                    self.send(chat_id, NO_EMPLOYEES_TEXT, None).await;
                    return;
                }
            }
        }
        let result = start_flow(user_id, chat_id, kind, now);
        if let Some(session) = result.session {
            self.sessions.put(session);
        }
        self.run_effects(chat_id, result.effects, now).await;
    }

    async fn run_effects(&self, chat_id: i64, effects: Vec<Effect>, now: NaiveDateTime) {
        for effect in effects {
            match effect {
                Effect::SendPrompt { text, keyboard } => {
                    self.send(chat_id, &text, keyboard.as_ref()).await;
                }
                Effect::SendPersonPicker { kind } => {
                    match self.directory.list_active().await {
                        Ok(people) if !people.is_empty() => {
                            self.send_person_picker(chat_id, kind, &people).await;
                        }
                        Ok(_) => self.send(chat_id, NO_EMPLOYEES_TEXT, None).await,
                        Err(e) => {
                            tracing::warn!(error = %e, "Directory lookup failed");
                            self.send(chat_id, NO_EMPLOYEES_TEXT, None).await;
                        }
                    }
                }
                Effect::Submit { session } => self.run_submit(chat_id, session, now).await,
            }
        }
    }

    async fn send_person_picker(&self, chat_id: i64, kind: ReportKind, people: &[Person]) {
        let mut keyboard: Vec<Vec<Choice>> = people
            .iter()
            .take(MAX_PICKER_ENTRIES)
            .map(|person| {
                vec![Choice::new(
                    person.name.clone(),
                    format!("{}{}", token::PERSON_PREFIX, person.id),
                )]
            })
            .collect();
        keyboard.push(vec![Choice::new("❌ Cancel", token::CANCEL)]);

        self.send(chat_id, person_picker_text(kind), Some(&keyboard))
            .await;
    }

    async fn send_status(&self, chat_id: i64) {
        let directory_line = match self.directory.list_active().await {
            Ok(people) => format!("Notion: ✅ connected\nActive employees: {}", people.len()),
            Err(e) => format!("Notion: ❌ unreachable ({e})"),
        };
        let text = format!(
            "<b>📊 System Status</b>\n\n\
             Version: {}\n\
             {}\n\
             Active sessions: {}",
            env!("CARGO_PKG_VERSION"),
            directory_line,
            self.sessions.len(),
        );
        self.send(chat_id, &text, None).await;
    }

    /// Execute the submission hand-off: resolve attachments, assemble the
    /// record, persist it, and confirm or apologize. The session is already
    /// gone from the table by the time this runs.
    async fn run_submit(&self, chat_id: i64, session: Session, now: NaiveDateTime) {
        let mut photo_urls = Vec::with_capacity(session.photos.len());
        for file_id in &session.photos {
            match self.resolver.resolve(file_id).await {
                Ok(url) => photo_urls.push(url),
                Err(e) => {
                    tracing::warn!(error = %e, file_id, "Skipping unresolvable photo");
                }
            }
        }

        let person_name = match session.fields.person_id.as_deref() {
            Some(person_id) => Some(self.lookup_person_name(person_id).await),
            None => None,
        };

        let record = assemble(&session, person_name, photo_urls, now);
        match self.records.create_report(&record).await {
            Ok(page_id) => {
                let short_id: String = page_id.chars().take(8).collect();
                let text = format!(
                    "✅ <b>Report Submitted!</b>\n\n\
                     Your {} has been recorded.\n\
                     Report ID: {}\n\n\
                     Thank you for your feedback!",
                    record.kind.label(),
                    short_id,
                );
                self.send(chat_id, &text, None).await;

                if record.kind == ReportKind::ShoutOut {
                    self.broadcast_shoutout(&record).await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Report submission failed");
                self.send(chat_id, SUBMIT_FAILED_TEXT, None).await;
            }
        }
    }

    async fn lookup_person_name(&self, person_id: &str) -> String {
        match self.directory.list_active().await {
            Ok(people) => people
                .into_iter()
                .find(|person| person.id == person_id)
                .map(|person| person.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Directory lookup failed during submit");
                "Unknown".to_string()
            }
        }
    }

    /// Celebrate a submitted shout-out in the team channel
    async fn broadcast_shoutout(&self, record: &ReportRecord) {
        let chat_id = match self.shoutout_chat {
            Some(chat_id) => chat_id,
            None => return,
        };

        let mut text = format!(
            "⭐ <b>SHOUT-OUT</b> ⭐\n\n\
             <b>{}</b>\n\n\
             {}\n\n\
             📅 {}",
            record.person_name.as_deref().unwrap_or("A team member"),
            record.narrative,
            record.occurred_at.format("%B %d, %Y"),
        );
        if let Some(reporter) = &record.reporter_name {
            text.push_str(&format!("\n\nRecognized by {reporter}"));
        }
        text.push_str("\n\n🎉 Keep up the amazing work!");

        let mut urls = record.photo_urls.iter();
        let first = match urls.next() {
            Some(first) => first,
            None => {
                if let Err(e) = self.gateway.send_text(chat_id, &text, None).await {
                    tracing::warn!(error = %e, "Shout-out broadcast failed");
                }
                return;
            }
        };

        // The first photo carries the announcement text. If it fails, fall
        // back to a plain text send and skip the follow-ups; captions like
        // "Photo 2" are meaningless without the announcement.
        if let Err(e) = self.gateway.send_photo(chat_id, first, Some(&text)).await {
            tracing::warn!(error = %e, "Shout-out photo broadcast failed; sending text only");
            if let Err(e) = self.gateway.send_text(chat_id, &text, None).await {
                tracing::warn!(error = %e, "Shout-out broadcast failed");
            }
            return;
        }

        for (i, url) in urls.enumerate() {
            let caption = format!("📸 Photo {} from the shout-out", i + 2);
            if let Err(e) = self.gateway.send_photo(chat_id, url, Some(&caption)).await {
                tracing::warn!(error = %e, "Shout-out photo broadcast failed");
            }
        }
    }

    async fn send(&self, chat_id: i64, text: &str, keyboard: Option<&Vec<Vec<Choice>>>) {
        if let Err(e) = self.gateway.send_text(chat_id, text, keyboard).await {
            tracing::warn!(error = %e, chat_id, "Failed to send message");
        }
    }
}
