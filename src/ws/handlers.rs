//! WebSocket message dispatch
//!
//! Every message maps onto one round-controller operation. State changes reach the sender
//! through the broadcast like everyone else; only direct results are returned here.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, NoActiveRound};
use std::sync::Arc;
use tokio::sync::mpsc;

fn no_active_round(_: NoActiveRound) -> ServerMessage {
    ServerMessage::error("NO_ACTIVE_ROUND", "No active round")
}

/// Handle client messages and return optional response.
///
/// Guesses are judged in the background so the socket keeps reading (a `new_round` must be
/// able to cut in while the judge runs). Their result is delivered through `replies`.
pub async fn handle_message(
    msg: ClientMessage,
    state: &Arc<AppState>,
    replies: &mpsc::UnboundedSender<ServerMessage>,
) -> Option<ServerMessage> {
    let result = match msg {
        ClientMessage::NewRound => {
            tracing::info!("New round requested");
            state.spawn_round();
            Ok(None)
        }

        ClientMessage::Select { word } => state.select(&word).await.map(|_| None),
        ClientMessage::Deselect { word } => state.deselect(&word).await.map(|_| None),
        ClientMessage::Toggle { word } => state.toggle(&word).await.map(|_| None),
        ClientMessage::DeselectAll => state.deselect_all().await.map(|_| None),
        ClientMessage::Shuffle => state.shuffle().await.map(|_| None),

        ClientMessage::Submit => state
            .submit()
            .await
            .map(|verdict| verdict.map(|verdict| ServerMessage::SubmitResult { verdict })),

        ClientMessage::Guess { text } => {
            let state = state.clone();
            let replies = replies.clone();
            tokio::spawn(async move {
                let response = match state.guess(&text).await {
                    Ok(verdict) => verdict.map(|verdict| ServerMessage::GuessJudged { verdict }),
                    Err(e) => Some(no_active_round(e)),
                };
                if let Some(response) = response {
                    // The socket may have closed while judging
                    let _ = replies.send(response);
                }
            });
            Ok(None)
        }
    };

    result.unwrap_or_else(|e| Some(no_active_round(e)))
}
