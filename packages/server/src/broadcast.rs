//! Broadcast fan-out: deliver a clock-stamped copy of one message to every
//! active connection.

use futures_util::future::join_all;

use chitty_chat_shared::wire::ChatMessage;

use super::state::AppState;

/// Fan a message out to every active connection and wait for all deliveries.
///
/// The server clock advances exactly once per broadcast call (the send is one
/// causal event) and every copy carries that stamp. For a system notice the
/// stamp is also appended to the text, so the rendered announcement and the
/// carried timestamp agree.
///
/// Deliveries run as one spawned task per recipient and are joined before
/// returning; no task outlives the call. A failed delivery marks that one
/// connection inactive and never aborts the siblings or the broadcast itself,
/// which is why this function is infallible.
pub async fn broadcast(state: &AppState, message: &ChatMessage) {
    let stamp = state.clock.tick();

    let mut stamped = message.clone();
    stamped.lamport = stamp;
    if stamped.is_system_notice() {
        stamped.text = format!("{}{}", stamped.text, stamp);
    }

    let frame = match serde_json::to_string(&stamped) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Failed to encode broadcast frame: {}", e);
            return;
        }
    };

    let targets: Vec<_> = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .filter(|delivery| delivery.active)
        .collect();

    tracing::info!(
        "[server: {}] Broadcasting to {} active user(s)",
        stamp,
        targets.len()
    );

    // Scatter: one delivery task per recipient, all outside the registry lock.
    let deliveries = targets.into_iter().map(|delivery| {
        let frame = frame.clone();
        tokio::spawn(async move {
            match delivery.sender.send(frame) {
                Ok(()) => {
                    tracing::debug!("Delivered stamped copy to '{}'", delivery.user_id);
                    None
                }
                Err(_) => Some((delivery.user_id, delivery.session)),
            }
        })
    });

    // Gather: join every delivery before returning, then absorb failures by
    // deactivating the recipients they belong to. The session token keeps a
    // failure on a stale channel from deactivating an entry the user has
    // since re-joined.
    for joined in join_all(deliveries).await {
        match joined {
            Ok(Some((user_id, session))) => {
                tracing::warn!("Delivery to '{}' failed, marking inactive", user_id);
                state.registry.mark_inactive_if_current(&user_id, session).await;
            }
            Ok(None) => {}
            Err(e) => tracing::error!("Delivery task failed to join: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn chat(sender_id: &str, text: &str, lamport: u64) -> ChatMessage {
        ChatMessage {
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            lamport,
        }
    }

    async fn recv_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> ChatMessage {
        let frame = rx.recv().await.expect("expected a delivered frame");
        serde_json::from_str(&frame).expect("delivered frame should be valid JSON")
    }

    #[tokio::test]
    async fn test_broadcast_stamps_copies_past_merged_timestamp() {
        // given: clock at 0, two active recipients, a publish carrying
        // timestamp 1 already merged into the server clock (0 -> 2)
        let state = AppState::new();
        let (mut rx_bob, _) = state.registry.add("bob", "Bob").await;
        let (mut rx_carol, _) = state.registry.add("carol", "Carol").await;
        state.clock.merge(1);
        assert_eq!(state.clock.current(), 2);

        // when:
        broadcast(&state, &chat("alice", "hi", 1)).await;

        // then: every copy is stamped strictly past the merged value
        for rx in [&mut rx_bob, &mut rx_carol] {
            let copy = recv_frame(rx).await;
            assert!(copy.lamport > 2);
            assert_eq!(copy.sender_id, "alice");
            assert_eq!(copy.text, "hi");
        }
        assert!(state.clock.current() >= 3);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_isolated_and_deactivates_recipient() {
        // given: three recipients, one of which dropped its receiver
        let state = AppState::new();
        let (mut rx_alice, _) = state.registry.add("alice", "Alice").await;
        let (rx_bob, _) = state.registry.add("bob", "Bob").await;
        let (mut rx_carol, _) = state.registry.add("carol", "Carol").await;
        drop(rx_bob);

        // when:
        broadcast(&state, &chat("alice", "hello", 1)).await;

        // then: the two live recipients got the message
        assert_eq!(recv_frame(&mut rx_alice).await.text, "hello");
        assert_eq!(recv_frame(&mut rx_carol).await.text, "hello");

        // then: only the broken connection went inactive
        let users = state.registry.users().await;
        let bob = users.iter().find(|u| u.user_id == "bob").unwrap();
        assert!(!bob.active);
        assert!(users.iter().filter(|u| u.active).count() == 2);
    }

    #[tokio::test]
    async fn test_inactive_connections_are_skipped() {
        // given:
        let state = AppState::new();
        let (mut rx_alice, _) = state.registry.add("alice", "Alice").await;
        let (mut rx_bob, _) = state.registry.add("bob", "Bob").await;
        state.registry.mark_inactive("bob").await;

        // when:
        broadcast(&state, &chat("alice", "anyone there?", 1)).await;

        // then: alice receives, bob's channel stays empty
        assert_eq!(recv_frame(&mut rx_alice).await.text, "anyone there?");
        assert!(rx_bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_system_notice_text_carries_the_delivery_stamp() {
        // given: server clock already at 6 (e.g. merged a leave at 5)
        let state = AppState::new();
        let (mut rx, _) = state.registry.add("alice", "Alice").await;
        state.clock.merge(5);
        assert_eq!(state.clock.current(), 6);

        // when: broadcasting the departure notice
        broadcast(
            &state,
            &chat("", "bob left Chitty-Chat at Lamport time ", 0),
        )
        .await;

        // then: the broadcast tick lands at 7 and the text agrees with it
        let copy = recv_frame(&mut rx).await;
        assert_eq!(copy.lamport, 7);
        assert_eq!(copy.text, "bob left Chitty-Chat at Lamport time 7");
        assert!(copy.is_system_notice());
    }

    #[tokio::test]
    async fn test_broadcast_with_no_recipients_still_advances_clock() {
        // given:
        let state = AppState::new();

        // when:
        broadcast(&state, &chat("alice", "echo", 1)).await;

        // then:
        assert_eq!(state.clock.current(), 1);
    }
}
