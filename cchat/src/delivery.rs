//! Paced delivery of turn events to a client transport.
//!
//! The coordinator pushes [`DeliveryEvent`]s onto a [`DeliveryHandle`]; a
//! dedicated pacing task drains them in order and forwards them to the
//! [`DeliverySink`], splitting token text into single characters separated by
//! the configured typing delay. A sink disconnect cancels the turn's
//! [`CancellationToken`], which also interrupts any pending pacing wait.
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::time::Duration;
//!
//! use cchat::{ChannelSink, CloseReason, DeliveryEvent, DeliveryOptions, StreamingDelivery};
//! use futures_util::StreamExt;
//!
//! let delivery = StreamingDelivery::new(DeliveryOptions::default().with_typing_delay(Duration::ZERO));
//! let (sink, events) = ChannelSink::new(16);
//!
//! let handle = delivery.open(sink);
//! handle.push(DeliveryEvent::TokenChunk("hi".into()));
//! handle.push(DeliveryEvent::Completed("hi".into()));
//! let report = handle.close(CloseReason::Completed).await;
//!
//! let received = events.collect::<Vec<_>>().await;
//! assert_eq!(received[0], DeliveryEvent::TokenChunk("h".into()));
//! assert_eq!(received[2], DeliveryEvent::Completed("hi".into()));
//! assert_eq!(report.delivered, 3);
//! # }
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::pin::Pin;
use std::time::Duration;

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{ChatFuture, DeliveryEvent};

/// Client-controlled delivery toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryOptions {
    pub show_thinking: bool,
    #[serde(rename = "typing_speed_ms", with = "duration_ms")]
    pub typing_delay: Duration,
    pub emit_completed: bool,
    pub show_function_calls: bool,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            show_thinking: true,
            typing_delay: Duration::from_millis(30),
            emit_completed: true,
            show_function_calls: true,
        }
    }
}

impl DeliveryOptions {
    pub fn with_show_thinking(mut self, show_thinking: bool) -> Self {
        self.show_thinking = show_thinking;
        self
    }

    pub fn with_typing_delay(mut self, typing_delay: Duration) -> Self {
        self.typing_delay = typing_delay;
        self
    }

    pub fn with_emit_completed(mut self, emit_completed: bool) -> Self {
        self.emit_completed = emit_completed;
        self
    }

    pub fn with_show_function_calls(mut self, show_function_calls: bool) -> Self {
        self.show_function_calls = show_function_calls;
        self
    }

    /// Whether `event` reaches the sink under these toggles. Errors always do.
    pub fn allows(&self, event: &DeliveryEvent) -> bool {
        match event {
            DeliveryEvent::Thinking => self.show_thinking,
            DeliveryEvent::Completed(_) => self.emit_completed,
            DeliveryEvent::FunctionCallRequested { .. }
            | DeliveryEvent::FunctionCallCompleted { .. } => self.show_function_calls,
            DeliveryEvent::TokenChunk(_) | DeliveryEvent::Error(_) => true,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    Disconnected,
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub message: String,
}

impl DeliveryError {
    pub fn disconnected(message: impl Into<String>) -> Self {
        Self {
            kind: DeliveryErrorKind::Disconnected,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: DeliveryErrorKind::Transport,
            message: message.into(),
        }
    }
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for DeliveryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Completed,
    Failed,
    Cancelled,
    Disconnected,
    /// The handle was dropped without an explicit close.
    Abandoned,
}

impl Display for CloseReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Disconnected => "disconnected",
            Self::Abandoned => "abandoned",
        };
        f.write_str(label)
    }
}

/// Client transport for one turn. Owned by the pacing task.
pub trait DeliverySink: Send {
    fn deliver<'a>(&'a mut self, event: DeliveryEvent) -> ChatFuture<'a, Result<(), DeliveryError>>;

    fn close<'a>(&'a mut self, reason: CloseReason) -> ChatFuture<'a, ()>;
}

impl<S> DeliverySink for Box<S>
where
    S: DeliverySink + ?Sized,
{
    fn deliver<'a>(&'a mut self, event: DeliveryEvent) -> ChatFuture<'a, Result<(), DeliveryError>> {
        (**self).deliver(event)
    }

    fn close<'a>(&'a mut self, reason: CloseReason) -> ChatFuture<'a, ()> {
        (**self).close(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Sink deliveries, counting each paced character separately.
    pub delivered: usize,
    /// Events dropped by the client toggles.
    pub suppressed: usize,
    pub close_reason: CloseReason,
}

impl DeliveryReport {
    fn new() -> Self {
        Self {
            delivered: 0,
            suppressed: 0,
            close_reason: CloseReason::Abandoned,
        }
    }

    pub fn disconnected(&self) -> bool {
        self.close_reason == CloseReason::Disconnected
    }
}

impl Default for DeliveryReport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingDelivery {
    options: DeliveryOptions,
}

impl StreamingDelivery {
    pub fn new(options: DeliveryOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> DeliveryOptions {
        self.options
    }

    pub fn open<S>(&self, sink: S) -> DeliveryHandle
    where
        S: DeliverySink + 'static,
    {
        self.open_with_cancellation(sink, CancellationToken::new())
    }

    /// Binds `sink` to a new pacing task. Cancelling `cancellation` stops the
    /// task and is also how a sink disconnect is reported back.
    pub fn open_with_cancellation<S>(&self, sink: S, cancellation: CancellationToken) -> DeliveryHandle
    where
        S: DeliverySink + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(pace(
            Box::new(sink),
            receiver,
            self.options,
            cancellation.clone(),
        ));

        DeliveryHandle {
            sender,
            cancellation,
            task: Some(task),
        }
    }
}

enum DeliveryCommand {
    Event(DeliveryEvent),
    Close(CloseReason),
}

/// Producer side of one turn's delivery. Dropping it closes the sink with
/// [`CloseReason::Abandoned`].
#[derive(Debug)]
pub struct DeliveryHandle {
    sender: mpsc::UnboundedSender<DeliveryCommand>,
    cancellation: CancellationToken,
    task: Option<JoinHandle<DeliveryReport>>,
}

impl DeliveryHandle {
    /// Queues `event`. Returns `false` once the turn is cancelled or the sink is gone.
    pub fn push(&self, event: DeliveryEvent) -> bool {
        if self.cancellation.is_cancelled() {
            return false;
        }

        self.sender.send(DeliveryCommand::Event(event)).is_ok()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Flushes queued events, closes the sink and reports what was delivered.
    pub async fn close(mut self, reason: CloseReason) -> DeliveryReport {
        let _ = self.sender.send(DeliveryCommand::Close(reason));

        match self.task.take() {
            Some(task) => match task.await {
                Ok(report) => report,
                Err(error) => {
                    tracing::error!(error = %error, "delivery pacing task failed");
                    DeliveryReport {
                        close_reason: CloseReason::Failed,
                        ..DeliveryReport::new()
                    }
                }
            },
            None => DeliveryReport::new(),
        }
    }
}

impl std::fmt::Debug for DeliveryCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Event(event) => f.debug_tuple("Event").field(&event.kind()).finish(),
            Self::Close(reason) => f.debug_tuple("Close").field(reason).finish(),
        }
    }
}

enum Interrupted {
    Cancelled,
    Disconnected,
}

async fn pace(
    mut sink: Box<dyn DeliverySink>,
    mut receiver: mpsc::UnboundedReceiver<DeliveryCommand>,
    options: DeliveryOptions,
    cancellation: CancellationToken,
) -> DeliveryReport {
    let mut report = DeliveryReport::new();

    let reason = loop {
        let command = tokio::select! {
            biased;
            _ = cancellation.cancelled() => break CloseReason::Cancelled,
            command = receiver.recv() => command,
        };

        let event = match command {
            Some(DeliveryCommand::Event(event)) => event,
            Some(DeliveryCommand::Close(reason)) => break reason,
            None => break CloseReason::Abandoned,
        };

        if !options.allows(&event) {
            report.suppressed += 1;
            continue;
        }

        let outcome = match event {
            DeliveryEvent::TokenChunk(text) => {
                type_out(sink.as_mut(), &text, options.typing_delay, &cancellation, &mut report).await
            }
            event => forward(sink.as_mut(), event, &cancellation, &mut report).await,
        };

        match outcome {
            Ok(()) => {}
            Err(Interrupted::Cancelled) => break CloseReason::Cancelled,
            Err(Interrupted::Disconnected) => {
                cancellation.cancel();
                break CloseReason::Disconnected;
            }
        }
    };

    receiver.close();
    sink.close(reason).await;
    report.close_reason = reason;
    tracing::debug!(
        delivered = report.delivered,
        suppressed = report.suppressed,
        reason = %reason,
        "delivery closed"
    );
    report
}

async fn type_out(
    sink: &mut dyn DeliverySink,
    text: &str,
    delay: Duration,
    cancellation: &CancellationToken,
    report: &mut DeliveryReport,
) -> Result<(), Interrupted> {
    for character in text.chars() {
        forward(
            sink,
            DeliveryEvent::TokenChunk(character.to_string()),
            cancellation,
            report,
        )
        .await?;

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(Interrupted::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Ok(())
}

async fn forward(
    sink: &mut dyn DeliverySink,
    event: DeliveryEvent,
    cancellation: &CancellationToken,
    report: &mut DeliveryReport,
) -> Result<(), Interrupted> {
    let result = tokio::select! {
        biased;
        _ = cancellation.cancelled() => return Err(Interrupted::Cancelled),
        result = sink.deliver(event) => result,
    };

    match result {
        Ok(()) => {
            report.delivered += 1;
            Ok(())
        }
        Err(error) => {
            tracing::warn!(error = %error, "delivery sink failed; cancelling turn");
            Err(Interrupted::Disconnected)
        }
    }
}

pub type DeliveryEventStream = Pin<Box<dyn Stream<Item = DeliveryEvent> + Send>>;

/// Sink backed by a bounded channel; the paired stream is handed to the
/// transport (for example an SSE response body). Dropping the stream reads as
/// a client disconnect.
#[derive(Debug)]
pub struct ChannelSink {
    sender: Option<mpsc::Sender<DeliveryEvent>>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, DeliveryEventStream) {
        let (sender, mut receiver) = mpsc::channel(capacity.max(1));
        let stream = async_stream::stream! {
            while let Some(event) = receiver.recv().await {
                yield event;
            }
        };

        (
            Self {
                sender: Some(sender),
            },
            Box::pin(stream),
        )
    }
}

impl DeliverySink for ChannelSink {
    fn deliver<'a>(&'a mut self, event: DeliveryEvent) -> ChatFuture<'a, Result<(), DeliveryError>> {
        Box::pin(async move {
            let sender = self
                .sender
                .as_ref()
                .ok_or_else(|| DeliveryError::transport("sink already closed"))?;

            sender
                .send(event)
                .await
                .map_err(|_| DeliveryError::disconnected("client stream dropped"))
        })
    }

    fn close<'a>(&'a mut self, _reason: CloseReason) -> ChatFuture<'a, ()> {
        Box::pin(async move {
            self.sender = None;
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use futures_util::StreamExt;
    use tokio::time::Instant;

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<DeliveryEvent>>>,
        closes: Arc<Mutex<Vec<CloseReason>>>,
        fail_after: Option<usize>,
    }

    impl DeliverySink for RecordingSink {
        fn deliver<'a>(
            &'a mut self,
            event: DeliveryEvent,
        ) -> ChatFuture<'a, Result<(), DeliveryError>> {
            Box::pin(async move {
                let mut events = self.events.lock().expect("events lock");
                if self.fail_after.is_some_and(|limit| events.len() >= limit) {
                    return Err(DeliveryError::disconnected("client went away"));
                }
                events.push(event);
                Ok(())
            })
        }

        fn close<'a>(&'a mut self, reason: CloseReason) -> ChatFuture<'a, ()> {
            Box::pin(async move {
                self.closes.lock().expect("closes lock").push(reason);
            })
        }
    }

    fn instant() -> DeliveryOptions {
        DeliveryOptions::default().with_typing_delay(Duration::ZERO)
    }

    #[test]
    fn options_deserialize_with_defaults_and_wire_names() {
        let options: DeliveryOptions =
            serde_json::from_str(r#"{"typing_speed_ms": 100, "show_thinking": false}"#)
                .expect("options should parse");

        assert_eq!(options.typing_delay, Duration::from_millis(100));
        assert!(!options.show_thinking);
        assert!(options.emit_completed);
        assert!(options.show_function_calls);

        let defaults: DeliveryOptions = serde_json::from_str("{}").expect("empty object parses");
        assert_eq!(defaults, DeliveryOptions::default());
    }

    #[tokio::test]
    async fn tokens_are_split_into_characters_in_order() {
        let sink = RecordingSink::default();
        let handle = StreamingDelivery::new(instant()).open(sink.clone());

        assert!(handle.push(DeliveryEvent::Thinking));
        assert!(handle.push(DeliveryEvent::TokenChunk("ab ".to_string())));
        assert!(handle.push(DeliveryEvent::TokenChunk("c".to_string())));
        assert!(handle.push(DeliveryEvent::Completed("ab c".to_string())));
        let report = handle.close(CloseReason::Completed).await;

        let events = sink.events.lock().expect("events lock").clone();
        assert_eq!(
            events,
            vec![
                DeliveryEvent::Thinking,
                DeliveryEvent::TokenChunk("a".to_string()),
                DeliveryEvent::TokenChunk("b".to_string()),
                DeliveryEvent::TokenChunk(" ".to_string()),
                DeliveryEvent::TokenChunk("c".to_string()),
                DeliveryEvent::Completed("ab c".to_string()),
            ]
        );
        assert_eq!(report.delivered, 6);
        assert_eq!(report.close_reason, CloseReason::Completed);
        assert_eq!(
            *sink.closes.lock().expect("closes lock"),
            vec![CloseReason::Completed]
        );
    }

    #[tokio::test]
    async fn toggles_suppress_thinking_completed_and_function_events() {
        let sink = RecordingSink::default();
        let options = instant()
            .with_show_thinking(false)
            .with_emit_completed(false)
            .with_show_function_calls(false);
        let handle = StreamingDelivery::new(options).open(sink.clone());

        handle.push(DeliveryEvent::Thinking);
        handle.push(DeliveryEvent::FunctionCallRequested {
            name: "echo".to_string(),
            arguments: Default::default(),
        });
        handle.push(DeliveryEvent::TokenChunk("x".to_string()));
        handle.push(DeliveryEvent::Completed("x".to_string()));
        handle.push(DeliveryEvent::Error("late failure".to_string()));
        let report = handle.close(CloseReason::Failed).await;

        let events = sink.events.lock().expect("events lock").clone();
        assert_eq!(
            events,
            vec![
                DeliveryEvent::TokenChunk("x".to_string()),
                DeliveryEvent::Error("late failure".to_string()),
            ]
        );
        assert_eq!(report.suppressed, 3);
    }

    #[tokio::test]
    async fn disconnect_cancels_turn_and_closes_once() {
        let sink = RecordingSink {
            fail_after: Some(2),
            ..RecordingSink::default()
        };
        let handle = StreamingDelivery::new(instant()).open(sink.clone());
        let cancellation = handle.cancellation();

        handle.push(DeliveryEvent::TokenChunk("abcdef".to_string()));
        cancellation.cancelled().await;

        assert!(!handle.push(DeliveryEvent::Completed("abcdef".to_string())));
        let report = handle.close(CloseReason::Completed).await;

        assert!(report.disconnected());
        assert_eq!(report.delivered, 2);
        assert_eq!(
            *sink.closes.lock().expect("closes lock"),
            vec![CloseReason::Disconnected]
        );
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_typing_delay() {
        let sink = RecordingSink::default();
        let options = DeliveryOptions::default().with_typing_delay(Duration::from_secs(10));
        let handle = StreamingDelivery::new(options).open(sink.clone());

        handle.push(DeliveryEvent::TokenChunk("slow".to_string()));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let started = Instant::now();
        handle.cancel();
        let report = handle.close(CloseReason::Completed).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(report.close_reason, CloseReason::Cancelled);
        assert_eq!(report.delivered, 1);
        assert_eq!(sink.closes.lock().expect("closes lock").len(), 1);
    }

    #[tokio::test]
    async fn dropping_handle_still_closes_sink() {
        let sink = RecordingSink::default();
        let handle = StreamingDelivery::new(instant()).open(sink.clone());
        handle.push(DeliveryEvent::TokenChunk("z".to_string()));
        drop(handle);

        for _ in 0..50 {
            if !sink.closes.lock().expect("closes lock").is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(
            *sink.closes.lock().expect("closes lock"),
            vec![CloseReason::Abandoned]
        );
    }

    #[tokio::test]
    async fn typing_delay_scales_wall_clock_time() {
        async fn deliver_ten(delay: Duration) -> Duration {
            let sink = RecordingSink::default();
            let handle =
                StreamingDelivery::new(DeliveryOptions::default().with_typing_delay(delay))
                    .open(sink);
            let started = Instant::now();
            handle.push(DeliveryEvent::TokenChunk("0123456789".to_string()));
            handle.close(CloseReason::Completed).await;
            started.elapsed()
        }

        let fast = deliver_ten(Duration::ZERO).await;
        let slow = deliver_ten(Duration::from_millis(40)).await;

        assert!(slow >= Duration::from_millis(400), "slow run took {slow:?}");
        assert!(slow - fast >= Duration::from_millis(350));
        assert!(fast < Duration::from_millis(200), "fast run took {fast:?}");
    }

    #[tokio::test]
    async fn channel_sink_streams_events_and_detects_drop() {
        let (sink, mut stream) = ChannelSink::new(4);
        let handle = StreamingDelivery::new(instant()).open(sink);

        handle.push(DeliveryEvent::Thinking);
        assert_eq!(stream.next().await, Some(DeliveryEvent::Thinking));

        drop(stream);
        handle.push(DeliveryEvent::TokenChunk("gone".to_string()));
        handle.cancellation().cancelled().await;

        let report = handle.close(CloseReason::Completed).await;
        assert_eq!(report.close_reason, CloseReason::Disconnected);
    }
}
