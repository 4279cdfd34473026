use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use snafu::ensure;
use tnai_replies::{
    CONTINUE_ADVENTURE_PROMPT, Faq, NEW_ADVENTURE_PROMPT, ReplyEvent, ReplyPayload, ReplyPrompt,
    ReplyProvider, create_reply_provider, default_faqs, find_faq,
};
use tnai_storage::KeyValueStore;

use crate::attachments::{AttachmentRef, AttachmentSet, Catalog, UploadReport, validate_batch};
use crate::auth::validation::MessageTooLongSnafu;
use crate::auth::{
    AuthPhase, AuthTransition, CredentialService, LoginForm, RegistrationForm,
    SimulatedCredentialService, ValidationError,
};
use crate::chat::{
    Author, ChatSurface, Composer, ConversationId, ConversationRegistry, ConversationSummary,
    Message, MessageId, ReplyScheduler, TranscriptBook,
};
use crate::ids::{AttachmentId, NoteId};
use crate::notes::{Note, NotesBook};
use crate::notice::{Notice, NoticeBoard};
use crate::panels::{Panel, PanelVisibility};
use crate::session::{SessionStore, UserSession};
use crate::settings::AppSettings;
use crate::usage::TokenUsage;

pub const APP_NAME: &str = "Trạng Nhí AI";

/// Top-level destinations inside the authenticated shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Chat,
    Files,
    Discover,
}

/// What the rendering layer should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    Welcome,
    Login,
    Main { tab: Tab, chat: ChatSurface },
}

/// Attachments are kept per conversation; `None` is the context before any
/// conversation is selected.
type AttachmentScope = Option<ConversationId>;

/// The whole client session: every state machine plus the notice queue.
///
/// Errors never escape this type. User-facing failures become notices and
/// storage failures become log lines.
pub struct TutorApp {
    settings: Arc<AppSettings>,
    session_store: SessionStore,
    credentials: Arc<dyn CredentialService>,
    phase: AuthPhase,
    tab: Tab,
    registry: ConversationRegistry,
    transcripts: TranscriptBook,
    scheduler: ReplyScheduler,
    composer: Composer,
    panels: PanelVisibility,
    catalog: Catalog,
    attachments: HashMap<AttachmentScope, AttachmentSet>,
    notes: NotesBook,
    usage: TokenUsage,
    faqs: Vec<Faq>,
    notices: NoticeBoard,
}

impl TutorApp {
    pub fn new(settings: Arc<AppSettings>, storage: Arc<dyn KeyValueStore>) -> Self {
        let now = Utc::now();
        let credentials = Arc::new(SimulatedCredentialService::new(
            settings.sign_in_latency(),
            settings.registration_latency(),
        ));

        Self {
            session_store: SessionStore::new(storage, settings.session_validity_days),
            credentials,
            phase: AuthPhase::Initial,
            tab: Tab::default(),
            registry: ConversationRegistry::with_demo_conversations(now),
            transcripts: TranscriptBook::new(),
            scheduler: ReplyScheduler::new(create_reply_provider()),
            composer: Composer::new(settings.max_message_chars),
            panels: PanelVisibility::default(),
            catalog: Catalog::with_demo_items(),
            attachments: HashMap::new(),
            notes: NotesBook::with_demo_notes(now),
            usage: TokenUsage::new(0, settings.daily_token_limit),
            faqs: default_faqs(),
            notices: NoticeBoard::new(),
            settings,
        }
    }

    pub fn with_credential_service(mut self, credentials: Arc<dyn CredentialService>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_reply_provider(mut self, provider: Arc<dyn ReplyProvider>) -> Self {
        self.scheduler = ReplyScheduler::new(provider);
        self
    }

    /// Process start: enters `Authenticated` directly when a stored session is valid.
    pub fn boot(&mut self) {
        self.boot_at(Utc::now());
    }

    pub fn boot_at(&mut self, now: DateTime<Utc>) {
        if let Some(session) = self.session_store.restore_at(now) {
            self.transition(AuthTransition::Restored(session));
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn phase(&self) -> &AuthPhase {
        &self.phase
    }

    pub fn session(&self) -> Option<&UserSession> {
        self.phase.session()
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.session_store
    }

    pub fn surface(&self) -> Surface {
        match &self.phase {
            AuthPhase::Initial => Surface::Welcome,
            AuthPhase::LoggingIn => Surface::Login,
            AuthPhase::Authenticated(_) => Surface::Main {
                tab: self.tab,
                chat: self.transcripts.surface(self.registry.active()),
            },
        }
    }

    // Auth

    pub fn show_login(&mut self) {
        self.transition(AuthTransition::ShowLogin);
    }

    pub fn back(&mut self) {
        self.transition(AuthTransition::Back);
    }

    /// Login form prefilled from the remember marker.
    pub fn login_prefill(&self) -> LoginForm {
        match self.session_store.remembered_email() {
            Some(email) => LoginForm::new(email, "", true),
            None => LoginForm::default(),
        }
    }

    /// Returns true when the app ends up authenticated.
    pub async fn submit_login(&mut self, form: LoginForm) -> bool {
        if !self.ready_for_credentials("submit-login") {
            return false;
        }
        if let Err(error) = form.validate() {
            self.reject_input(error);
            return false;
        }

        let credentials = Arc::clone(&self.credentials);
        let result = credentials.sign_in(&form).await;

        match result {
            Ok(session) => {
                self.accept_session(session);
                self.notices.push(Notice::success(
                    "Signed in",
                    format!("Welcome to {APP_NAME} 🎉"),
                ));
                true
            }
            Err(error) => {
                tracing::warn!(error = %error, "sign-in failed");
                self.transition(AuthTransition::CredentialsRejected);
                self.notices.push(Notice::error(
                    "Sign-in failed",
                    "Please check your details and try again.",
                ));
                false
            }
        }
    }

    pub async fn submit_registration(&mut self, form: RegistrationForm) -> bool {
        if !self.ready_for_credentials("submit-registration") {
            return false;
        }
        if let Err(error) = form.validate(self.settings.min_password_len) {
            self.reject_input(error);
            return false;
        }

        let credentials = Arc::clone(&self.credentials);
        let result = credentials.register(&form).await;

        match result {
            Ok(session) => {
                self.accept_session(session);
                self.notices.push(Notice::success(
                    "Account created",
                    format!("Welcome to {APP_NAME} 🎉"),
                ));
                true
            }
            Err(error) => {
                tracing::warn!(error = %error, "registration failed");
                self.transition(AuthTransition::CredentialsRejected);
                self.notices.push(Notice::error(
                    "Registration failed",
                    "Please try again.",
                ));
                false
            }
        }
    }

    /// Clears the stored session and every piece of per-user view state.
    pub fn logout(&mut self) {
        if !self.transition(AuthTransition::Logout) {
            return;
        }

        if let Err(error) = self.session_store.clear() {
            tracing::warn!(error = %error, "failed to clear stored session");
        }

        let cancelled = self.scheduler.cancel_all();
        self.tab = Tab::Chat;
        self.registry.clear_selection();
        self.transcripts.clear();
        self.attachments.clear();
        self.composer.clear();
        tracing::info!(cancelled_replies = cancelled, "signed out");
        self.notices.push(Notice::info("Signed out", "See you next time!"));
    }

    fn ready_for_credentials(&self, stage: &'static str) -> bool {
        if self.phase != AuthPhase::LoggingIn {
            tracing::debug!(stage, phase = self.phase.name(), "credential submission ignored");
            return false;
        }
        true
    }

    fn accept_session(&mut self, session: UserSession) {
        if let Err(error) = self.session_store.persist(&session) {
            tracing::warn!(user_id = %session.id, error = %error, "failed to persist session");
        }
        self.transition(AuthTransition::CredentialsAccepted(session));
    }

    fn transition(&mut self, transition: AuthTransition) -> bool {
        match self.phase.apply(transition) {
            Ok(next) => {
                tracing::debug!(from = self.phase.name(), to = next.name(), "auth transition");
                self.phase = next;
                true
            }
            Err(rejection) => {
                tracing::debug!(rejection = ?rejection, "auth transition rejected");
                false
            }
        }
    }

    // Navigation

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn navigate_to_files(&mut self) {
        self.tab = Tab::Files;
    }

    pub fn close_files(&mut self) {
        if self.tab == Tab::Files {
            self.tab = Tab::Chat;
        }
    }

    // Conversations

    pub fn conversations(&self, filter: &str) -> Vec<&ConversationSummary> {
        self.registry.list(filter)
    }

    pub fn registry(&self) -> &ConversationRegistry {
        &self.registry
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.registry.active()
    }

    pub fn new_conversation(&mut self) -> ConversationId {
        self.composer.clear();
        self.registry.create()
    }

    pub fn select_conversation(&mut self, id: ConversationId) {
        self.registry.select(id);
    }

    pub fn delete_conversation(&mut self, id: &ConversationId) {
        let removed = self.registry.delete(id);
        self.transcripts.remove(id);
        self.attachments.remove(&Some(id.clone()));
        let cancelled = self.scheduler.cancel_conversation(id);
        tracing::debug!(conversation_id = %id, removed, cancelled, "conversation deleted");
        if removed {
            self.notices
                .push(Notice::info("Conversation deleted", id.to_string()));
        }
    }

    // Chat

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.composer.set_text(text);
    }

    pub fn toggle_composer_expanded(&mut self) -> bool {
        self.composer.toggle_expanded()
    }

    pub fn messages(&self, id: &ConversationId) -> &[Message] {
        self.transcripts.messages(id)
    }

    pub fn active_messages(&self) -> &[Message] {
        self.registry
            .active()
            .map(|id| self.transcripts.messages(id))
            .unwrap_or_default()
    }

    pub fn is_typing(&self) -> bool {
        self.registry
            .active()
            .is_some_and(|id| self.transcripts.is_typing(id))
    }

    pub fn transcripts(&self) -> &TranscriptBook {
        &self.transcripts
    }

    /// Sends the composer text. Blank input is ignored; over-long input is
    /// rejected with a notice and left in the composer.
    pub fn send(&mut self) -> Option<MessageId> {
        let text = self.composer.text().trim().to_string();
        if text.is_empty() {
            return None;
        }
        if let Err(error) = self.check_length(&text) {
            self.reject_input(error);
            return None;
        }

        let conversation_id = self.ensure_active_conversation();
        self.composer.clear();
        let message_id = self.append(&conversation_id, Author::User, &text);
        self.transcripts.mark_started(&conversation_id);

        let delay = self.settings.free_text_reply_delay();
        self.schedule_reply(&conversation_id, message_id, ReplyPrompt::FreeText(text), delay);
        Some(message_id)
    }

    pub fn send_text(&mut self, text: impl Into<String>) -> Option<MessageId> {
        self.set_input(text);
        self.send()
    }

    pub fn start_new_adventure(&mut self) -> Option<MessageId> {
        let delay = self.settings.adventure_reply_delay();
        Some(self.start_canned(NEW_ADVENTURE_PROMPT.to_string(), ReplyPrompt::NewAdventure, delay))
    }

    pub fn continue_adventure(&mut self) -> Option<MessageId> {
        let delay = self.settings.adventure_reply_delay();
        Some(self.start_canned(
            CONTINUE_ADVENTURE_PROMPT.to_string(),
            ReplyPrompt::ContinueAdventure,
            delay,
        ))
    }

    pub fn faqs(&self) -> &[Faq] {
        &self.faqs
    }

    pub fn select_faq(&mut self, faq_id: &str) -> Option<MessageId> {
        let Some(question) = find_faq(&self.faqs, faq_id).map(|faq| faq.question.clone()) else {
            self.notices.push(Notice::warning(
                "Question not found",
                format!("No FAQ with id {faq_id}"),
            ));
            return None;
        };

        let delay = self.settings.faq_reply_delay();
        Some(self.start_canned(question, ReplyPrompt::Faq(faq_id.to_string()), delay))
    }

    pub fn has_pending_replies(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Waits for the next reply completion. `None` when nothing is in flight.
    pub async fn next_reply_event(&mut self) -> Option<ReplyEvent> {
        self.scheduler.next_event().await
    }

    /// Applies a completion to the conversation captured at schedule time.
    /// Returns true when a message was appended.
    pub fn apply_reply_event(&mut self, event: ReplyEvent) -> bool {
        let conversation_id = ConversationId::from(event.target.conversation_id.as_str());
        let token = event.target.token;

        match event.payload {
            ReplyPayload::Completed(text) => {
                let now = Utc::now();
                if self
                    .transcripts
                    .complete_reply(&conversation_id, token, &text, now)
                    .is_none()
                {
                    tracing::debug!(conversation_id = %conversation_id, token = ?token, "stale reply dropped");
                    return false;
                }
                self.registry.record_message(&conversation_id, &text, now);
                self.usage.record(estimate_tokens(&text));
                true
            }
            ReplyPayload::Failed(reason) => {
                self.transcripts.abandon_reply(&conversation_id, token);
                tracing::warn!(conversation_id = %conversation_id, reason = %reason, "reply failed");
                self.notices
                    .push(Notice::error("The assistant could not reply", reason));
                false
            }
        }
    }

    /// Applies completions until nothing is in flight. Returns how many landed.
    pub async fn settle_replies(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.next_reply_event().await {
            if self.apply_reply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    fn start_canned(&mut self, prompt_text: String, prompt: ReplyPrompt, delay: Duration) -> MessageId {
        let conversation_id = self.ensure_active_conversation();
        let stale = self.transcripts.reset(&conversation_id);
        self.scheduler.cancel_tokens(&stale);
        self.registry.reset_activity(&conversation_id, Utc::now());

        let message_id = self.append(&conversation_id, Author::User, &prompt_text);
        self.transcripts.mark_started(&conversation_id);
        self.schedule_reply(&conversation_id, message_id, prompt, delay);
        message_id
    }

    fn ensure_active_conversation(&mut self) -> ConversationId {
        match self.registry.active() {
            Some(id) => id.clone(),
            None => self.registry.create(),
        }
    }

    fn append(&mut self, conversation_id: &ConversationId, author: Author, text: &str) -> MessageId {
        let now = Utc::now();
        let message_id = self.transcripts.append(conversation_id, author, text, now);
        self.registry.record_message(conversation_id, text, now);
        message_id
    }

    fn schedule_reply(
        &mut self,
        conversation_id: &ConversationId,
        message_id: MessageId,
        prompt: ReplyPrompt,
        delay: Duration,
    ) {
        match self.scheduler.schedule(conversation_id, prompt, delay) {
            Ok(target) => {
                self.transcripts
                    .begin_reply(conversation_id, target.token, message_id);
            }
            Err(error) => {
                tracing::warn!(conversation_id = %conversation_id, error = %error, "reply not scheduled");
                self.notices
                    .push(Notice::error("The assistant could not reply", error.to_string()));
            }
        }
    }

    fn check_length(&self, text: &str) -> Result<(), ValidationError> {
        let len = text.chars().count();
        let max = self.settings.max_message_chars;
        ensure!(
            len <= max,
            MessageTooLongSnafu {
                stage: "send-check-length",
                len,
                max,
            }
        );
        Ok(())
    }

    fn reject_input(&mut self, error: ValidationError) {
        tracing::debug!(error = ?error, "input rejected");
        self.notices
            .push(Notice::error("Please check your input", error.to_string()));
    }

    // Panels

    pub fn panels(&self) -> PanelVisibility {
        self.panels
    }

    pub fn toggle_panel(&mut self, panel: Panel) -> bool {
        self.panels.toggle(panel)
    }

    pub fn open_panel(&mut self, panel: Panel) {
        self.panels.open(panel);
    }

    pub fn close_panel(&mut self, panel: Panel) {
        self.panels.close(panel);
    }

    // Attachments

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn search_catalog(&self, query: &str) -> Vec<&AttachmentRef> {
        self.catalog.search(query)
    }

    /// Items attached to the active conversation context.
    pub fn attachments(&self) -> &[AttachmentRef] {
        self.attachments
            .get(&self.attachment_scope())
            .map(AttachmentSet::items)
            .unwrap_or_default()
    }

    pub fn attach(&mut self, id: &AttachmentId) -> bool {
        let Some(item) = self.catalog.get(id).cloned() else {
            self.notices.push(Notice::warning(
                "Item not found",
                format!("Nothing in the catalog has id {id}"),
            ));
            return false;
        };

        let name = item.display_name.clone();
        let scope = self.attachment_scope();
        match self.attachments.entry(scope).or_default().add(item) {
            Ok(()) => {
                self.notices
                    .push(Notice::success("Added to this conversation", name));
                true
            }
            Err(error) => {
                self.notices
                    .push(Notice::warning("Already added", error.to_string()));
                false
            }
        }
    }

    pub fn detach(&mut self, id: &AttachmentId) -> bool {
        let scope = self.attachment_scope();
        let Some(removed) = self
            .attachments
            .get_mut(&scope)
            .and_then(|set| set.remove(id))
        else {
            return false;
        };

        self.notices.push(Notice::success(
            "Removed from this conversation",
            removed.display_name,
        ));
        true
    }

    pub fn create_knowledge_base(&mut self, name: &str, description: &str) -> Option<AttachmentId> {
        match self.catalog.create_knowledge_base(name, description) {
            Ok(knowledge_base) => {
                self.notices.push(Notice::success(
                    "Knowledge base created",
                    knowledge_base.display_name.clone(),
                ));
                Some(knowledge_base.id)
            }
            Err(error) => {
                self.reject_input(error);
                None
            }
        }
    }

    /// Validates a batch of selected file names and reports it with one notice per outcome.
    pub fn upload_files<I, S>(&mut self, file_names: I) -> UploadReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let report = validate_batch(file_names);
        for notice in report.notices() {
            self.notices.push(notice);
        }
        report
    }

    fn attachment_scope(&self) -> AttachmentScope {
        self.registry.active().cloned()
    }

    // Notes

    pub fn notes(&self) -> &NotesBook {
        &self.notes
    }

    pub fn create_note(&mut self, title: &str, content: &str) -> Option<NoteId> {
        self.notes.create(title, content, Utc::now())
    }

    pub fn update_note(&mut self, id: &NoteId, title: Option<&str>, content: Option<&str>) -> bool {
        self.notes.update(id, title, content, Utc::now())
    }

    pub fn delete_note(&mut self, id: &NoteId) -> bool {
        self.notes.delete(id)
    }

    pub fn select_note(&mut self, id: Option<NoteId>) {
        self.notes.select(id);
    }

    pub fn active_note(&self) -> Option<&Note> {
        self.notes.active()
    }

    // Usage and notices

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}
