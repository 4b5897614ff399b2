//! Conversational orchestration over model providers and business functions.
//!
//! A turn flows through three layers: [`ChatOrchestrator`] gates and persists,
//! [`ConversationCoordinator`] runs the function-call rounds against the
//! provider, and [`StreamingDelivery`] paces the resulting events out to the
//! client's [`DeliverySink`].

mod coordinator;
mod delivery;
mod error;
mod hooks;
mod service;
mod session;
mod store;
mod types;

pub mod prelude {
    pub use crate::{
        ChannelSink, ChatError, ChatErrorKind, ChatFuture, ChatMessage, ChatOrchestrator,
        ChatOrchestratorBuilder, ChatPolicy, ChatSession, ChatTurnHooks, ChatTurnOptions,
        ChatTurnRequest, ChatTurnResult, CloseReason, DeliveryError, DeliveryEvent,
        DeliveryEventStream, DeliveryOptions, DeliveryReport, DeliverySink, InMemorySessionStore,
        NoopChatTurnHooks, SessionStatus, SessionStore, StreamingDelivery,
    };
    pub use ccommon::{MessageId, MetadataMap, SessionId, TraceId};
    pub use ctooling::{
        BusinessFunction, FunctionCallResult, FunctionError, FunctionErrorKind,
        FunctionExecutionContext, FunctionRegistry,
    };
}

pub use coordinator::{ConversationCoordinator, TurnInput, TurnOutcome, tokenize};
pub use delivery::{
    ChannelSink, CloseReason, DeliveryError, DeliveryErrorKind, DeliveryEventStream,
    DeliveryHandle, DeliveryOptions, DeliveryReport, DeliverySink, StreamingDelivery,
};
pub use error::{ChatError, ChatErrorKind};
pub use hooks::{ChatTurnHooks, NoopChatTurnHooks};
pub use service::{ChatOrchestrator, ChatOrchestratorBuilder, ChatPolicy};
pub use session::{ChatSession, SessionStatus};
pub use store::{ChatFuture, InMemorySessionStore, SessionStore};
pub use types::{ChatMessage, ChatTurnOptions, ChatTurnRequest, ChatTurnResult, DeliveryEvent};
pub use ccommon::{MessageId, MetadataMap, SessionId, TraceId};
