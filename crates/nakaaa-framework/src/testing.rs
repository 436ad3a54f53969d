//! In-memory message and interaction doubles for unit tests.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::context::{BotContext, BotIdentity, Catalog};
use nakaaa_core::{
    ChannelId, CommandInteraction, InteractionContext, MessageId, Permissions, ReplyPayload,
    RequestingUser, SentReply, TextMessage, TransportError, TransportResult,
};

pub(crate) fn test_context() -> Arc<BotContext> {
    BotContext::new(BotIdentity::default(), Catalog::new())
}

pub(crate) fn test_user() -> RequestingUser {
    RequestingUser::new(42, "tester").with_avatar("https://cdn.example/avatars/42.png")
}

/// Collects formatted log output of the current thread.
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Routes this thread's events here until the guard is dropped.
    pub(crate) fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A recorded platform call with the payload text, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    SendToChannel(Option<String>),
    Reply(Option<String>),
    DeferReply { ephemeral: bool },
    EditReply(Option<String>),
}

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<Call>>,
    payloads: Mutex<Vec<ReplyPayload>>,
    failures_left: AtomicUsize,
}

impl Recorder {
    fn record(&self, call: Call, payload: Option<&ReplyPayload>) -> TransportResult<SentReply> {
        self.calls.lock().push(call);
        if let Some(payload) = payload {
            self.payloads.lock().push(payload.clone());
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            Err(TransportError::send_failed("mock failure"))
        } else {
            Ok(SentReply::fetched(MessageId(900), ChannelId(100)))
        }
    }
}

// =============================================================================
// Mock Message
// =============================================================================

struct MessageState {
    author: RequestingUser,
    content: String,
    member_permissions: Permissions,
    bot_permissions: Permissions,
    recorder: Recorder,
}

#[async_trait]
impl TextMessage for MessageState {
    fn id(&self) -> MessageId {
        MessageId(1)
    }

    fn channel_id(&self) -> ChannelId {
        ChannelId(100)
    }

    fn author(&self) -> &RequestingUser {
        &self.author
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn member_permissions(&self) -> Permissions {
        self.member_permissions
    }

    fn bot_permissions(&self) -> Permissions {
        self.bot_permissions
    }

    async fn send_to_channel(&self, payload: &ReplyPayload) -> TransportResult<SentReply> {
        self.recorder
            .record(Call::SendToChannel(payload.content.clone()), Some(payload))
    }

    async fn reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply> {
        self.recorder
            .record(Call::Reply(payload.content.clone()), Some(payload))
    }
}

/// A text message whose platform calls are recorded.
#[derive(Clone)]
pub(crate) struct MockMessage(Arc<MessageState>);

impl MockMessage {
    pub(crate) fn new(content: &str) -> Self {
        Self(Arc::new(MessageState {
            author: test_user(),
            content: content.to_string(),
            member_permissions: Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL,
            bot_permissions: Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL,
            recorder: Recorder::default(),
        }))
    }

    fn state_mut(&mut self) -> &mut MessageState {
        Arc::get_mut(&mut self.0).expect("mock configured after it was shared")
    }

    pub(crate) fn with_author(mut self, author: RequestingUser) -> Self {
        self.state_mut().author = author;
        self
    }

    pub(crate) fn with_member_permissions(mut self, permissions: Permissions) -> Self {
        self.state_mut().member_permissions = permissions;
        self
    }

    pub(crate) fn with_bot_permissions(mut self, permissions: Permissions) -> Self {
        self.state_mut().bot_permissions = permissions;
        self
    }

    pub(crate) fn failing_first(self, count: usize) -> Self {
        self.0.recorder.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn context(&self) -> InteractionContext {
        InteractionContext::Message(self.0.clone())
    }

    pub(crate) fn as_text_message(&self) -> Arc<dyn TextMessage> {
        self.0.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.recorder.calls.lock().clone()
    }

    pub(crate) fn payloads(&self) -> Vec<ReplyPayload> {
        self.0.recorder.payloads.lock().clone()
    }
}

// =============================================================================
// Mock Interaction
// =============================================================================

struct InteractionState {
    command: String,
    options: Vec<String>,
    user: RequestingUser,
    member_permissions: Permissions,
    bot_permissions: Permissions,
    deferred: AtomicBool,
    replied: AtomicBool,
    last_ephemeral: Mutex<Option<bool>>,
    recorder: Recorder,
}

#[async_trait]
impl CommandInteraction for InteractionState {
    fn id(&self) -> &str {
        "interaction-1"
    }

    fn command_name(&self) -> &str {
        &self.command
    }

    fn options(&self) -> Vec<String> {
        self.options.clone()
    }

    fn channel_id(&self) -> Option<ChannelId> {
        Some(ChannelId(100))
    }

    fn user(&self) -> &RequestingUser {
        &self.user
    }

    fn member_permissions(&self) -> Permissions {
        self.member_permissions
    }

    fn bot_permissions(&self) -> Permissions {
        self.bot_permissions
    }

    fn is_deferred(&self) -> bool {
        self.deferred.load(Ordering::SeqCst)
    }

    fn is_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    async fn reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply> {
        *self.last_ephemeral.lock() = Some(payload.ephemeral);
        let sent = self
            .recorder
            .record(Call::Reply(payload.content.clone()), Some(payload))?;
        self.replied.store(true, Ordering::SeqCst);
        Ok(sent)
    }

    async fn defer_reply(&self, ephemeral: bool) -> TransportResult<SentReply> {
        *self.last_ephemeral.lock() = Some(ephemeral);
        let sent = self.recorder.record(Call::DeferReply { ephemeral }, None)?;
        self.deferred.store(true, Ordering::SeqCst);
        Ok(sent)
    }

    async fn edit_reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply> {
        self.recorder
            .record(Call::EditReply(payload.content.clone()), Some(payload))
    }
}

/// A slash interaction whose platform calls are recorded.
#[derive(Clone)]
pub(crate) struct MockInteraction(Arc<InteractionState>);

impl MockInteraction {
    pub(crate) fn new(command: &str) -> Self {
        Self(Arc::new(InteractionState {
            command: command.to_string(),
            options: Vec::new(),
            user: test_user(),
            member_permissions: Permissions::SEND_MESSAGES,
            bot_permissions: Permissions::SEND_MESSAGES,
            deferred: AtomicBool::new(false),
            replied: AtomicBool::new(false),
            last_ephemeral: Mutex::new(None),
            recorder: Recorder::default(),
        }))
    }

    pub(crate) fn deferred(self) -> Self {
        self.0.deferred.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn replied(self) -> Self {
        self.0.replied.store(true, Ordering::SeqCst);
        self
    }

    fn state_mut(&mut self) -> &mut InteractionState {
        Arc::get_mut(&mut self.0).expect("mock configured after it was shared")
    }

    pub(crate) fn with_options(mut self, options: &[&str]) -> Self {
        self.state_mut().options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub(crate) fn with_bot_permissions(mut self, permissions: Permissions) -> Self {
        self.state_mut().bot_permissions = permissions;
        self
    }

    pub(crate) fn failing_first(self, count: usize) -> Self {
        self.0.recorder.failures_left.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn context(&self) -> InteractionContext {
        InteractionContext::Interaction(self.0.clone())
    }

    pub(crate) fn as_command_interaction(&self) -> Arc<dyn CommandInteraction> {
        self.0.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.recorder.calls.lock().clone()
    }

    pub(crate) fn payloads(&self) -> Vec<ReplyPayload> {
        self.0.recorder.payloads.lock().clone()
    }

    pub(crate) fn is_replied_now(&self) -> bool {
        self.0.replied.load(Ordering::SeqCst)
    }

    pub(crate) fn last_ephemeral(&self) -> Option<bool> {
        *self.0.last_ephemeral.lock()
    }
}
