//! One question/answer cycle against the chat service
//!
//! `Idle -> AwaitingResponse -> Completed | Failed -> Idle`. The user turn is
//! appended before the request goes out. The assistant turn is only committed
//! once the whole answer has arrived; on failure the user turn is popped
//! again so the transcript looks as if nothing had been sent.

use crate::client::ChatBackend;
use crate::session::{ConversationTurn, RequestPhase, SessionState};
use crate::streaming::StreamAccumulator;
use crate::{IrisError, Result};

/// Message shown when the service fails its health check
pub const UNAVAILABLE_MESSAGE: &str = "Unable to connect to the chat service. Please try again later.";

/// Progress reported to the presenter during an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeUpdate<'a> {
    /// Request sent, nothing received yet
    Thinking,
    /// Answer text received so far
    Partial(&'a str),
}

/// Fail unless the chat service passes its health check
pub async fn ensure_available<B>(backend: &B) -> Result<()>
where
    B: ChatBackend + ?Sized,
{
    if backend.health_check().await {
        Ok(())
    } else {
        tracing::error!(target: "app", "{}", UNAVAILABLE_MESSAGE);
        Err(IrisError::unavailable(UNAVAILABLE_MESSAGE))
    }
}

/// Ask `question` as the session's current role and stream the answer
///
/// `on_update` receives [`ExchangeUpdate::Thinking`] once and then the
/// accumulated answer after every received delta. Returns the final answer,
/// which is also stored as the assistant turn.
pub async fn run_exchange<B, F>(
    backend: &B,
    session: &mut SessionState,
    question: &str,
    mut on_update: F,
) -> Result<String>
where
    B: ChatBackend + ?Sized,
    F: FnMut(ExchangeUpdate<'_>),
{
    if question.trim().is_empty() {
        return Err(IrisError::validation("Question cannot be empty"));
    }

    tracing::info!(target: "app", "Received user input: {}", question);
    session.append_turn(ConversationTurn::user(question));
    session.set_phase(RequestPhase::AwaitingResponse);
    on_update(ExchangeUpdate::Thinking);

    let outcome = stream_answer(backend, session.role(), question, &mut on_update).await;
    match outcome {
        Ok(answer) => {
            session.append_turn(ConversationTurn::assistant(answer.clone()));
            session.set_phase(RequestPhase::Completed);
            tracing::info!(target: "app", "Successfully processed user request");
            session.set_phase(RequestPhase::Idle);
            Ok(answer)
        }
        Err(e) => {
            tracing::error!(target: "app", "Error: {}", e);
            session.pop_last_turn();
            session.set_phase(RequestPhase::Failed);
            tracing::info!(target: "app", "Removed failed message from chat history");
            session.set_phase(RequestPhase::Idle);
            Err(e)
        }
    }
}

async fn stream_answer<B, F>(
    backend: &B,
    role: &str,
    question: &str,
    on_update: &mut F,
) -> Result<String>
where
    B: ChatBackend + ?Sized,
    F: FnMut(ExchangeUpdate<'_>),
{
    let stream = backend.send_message(question, role).await?;
    let mut accumulator = StreamAccumulator::new(stream);
    while let Some(step) = accumulator.next().await {
        let text = step?;
        on_update(ExchangeUpdate::Partial(&text));
    }
    Ok(accumulator.into_text())
}
