//! Relay of a streamed tutor reply to a single client.
//!
//! Deltas are forwarded as they arrive and accumulated; when the upstream
//! ends the full reply is persisted and a final `Done` event carries the
//! stored message. An upstream failure ends the relay with an `Error`
//! event and nothing is persisted for the reply.

use futures_util::{stream, Stream, StreamExt};
use tracing::{info, warn};

use super::ChatService;
use crate::llm::TextStream;
use crate::models::chat::Message;

/// One event of a relayed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A text fragment.
    Delta(String),
    /// The reply was stored.
    Done(Message),
    /// The reply failed; the message is safe to show the client.
    Error(String),
}

struct RelayState {
    upstream: Option<TextStream>,
    buffer: String,
    service: ChatService,
    chat_id: String,
}

/// Forward `upstream` while accumulating it, then persist the reply.
pub fn relay(
    service: ChatService,
    chat_id: String,
    upstream: TextStream,
) -> impl Stream<Item = RelayEvent> + Send {
    let state = RelayState {
        upstream: Some(upstream),
        buffer: String::new(),
        service,
        chat_id,
    };

    stream::unfold(state, |mut state| async move {
        let next = state.upstream.as_mut()?.next().await;
        match next {
            Some(Ok(delta)) => {
                state.buffer.push_str(&delta);
                Some((RelayEvent::Delta(delta), state))
            }
            Some(Err(err)) => {
                warn!(chat_id = %state.chat_id, %err, "reply stream failed");
                state.upstream = None;
                Some((RelayEvent::Error(err.to_string()), state))
            }
            None => {
                state.upstream = None;
                let reply = std::mem::take(&mut state.buffer);
                let event = match state
                    .service
                    .store_assistant_message(&state.chat_id, reply)
                    .await
                {
                    Ok(message) => {
                        info!(
                            chat_id = %state.chat_id,
                            message_id = %message.id,
                            "streamed reply stored"
                        );
                        RelayEvent::Done(message)
                    }
                    Err(err) => {
                        warn!(chat_id = %state.chat_id, %err, "streamed reply not stored");
                        RelayEvent::Error(err.to_string())
                    }
                };
                Some((event, state))
            }
        }
    })
}
