//! Connection registry: user id → active outbound stream handle.

use std::collections::HashMap;

use tokio::sync::{Mutex, mpsc};

use chitty_chat_shared::{time, wire::UserInfo};

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub active: bool,
    /// Unix timestamp (milliseconds) of the most recent join. Metadata only.
    pub connected_at: i64,
}

/// A user paired with the sending half of its delivery channel.
///
/// The receiving half is the subscription handle returned by
/// [`ConnectionRegistry::add`]; the socket task drains it until it closes,
/// which is how a join call stays open for the lifetime of the session.
/// `session` counts reactivations: anything holding a stale session token
/// must not deactivate the entry.
struct Connection {
    user: User,
    sender: mpsc::UnboundedSender<String>,
    session: u64,
}

/// A delivery target captured by [`ConnectionRegistry::snapshot`].
///
/// Holds a clone of the sender so broadcast can run outside the registry
/// lock, plus the session token the sender belongs to. Iteration order of
/// snapshots is unspecified.
#[derive(Clone)]
pub struct Delivery {
    pub user_id: String,
    pub active: bool,
    pub session: u64,
    pub sender: mpsc::UnboundedSender<String>,
}

/// Server-side mapping from user id to an active connection.
///
/// Entries are never removed: a user that leaves (or whose delivery fails)
/// is marked inactive and skipped by broadcast. Memory growth is bounded by
/// the number of distinct user ids ever seen.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<String, Connection>>,
}

impl ConnectionRegistry {
    /// Register a user and hand back the receiving half of its delivery
    /// channel plus the session token identifying this registration.
    ///
    /// A repeat join for an id that is already registered reactivates the
    /// entry and swaps in a fresh channel instead of erroring; the previous
    /// channel closes when its old sender is dropped here, which ends the
    /// previous socket task. That task then holds a stale token and its
    /// teardown via [`Self::mark_inactive_if_current`] becomes a no-op.
    pub async fn add(&self, user_id: &str, name: &str) -> (mpsc::UnboundedReceiver<String>, u64) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut connections = self.connections.lock().await;

        let session = match connections.get_mut(user_id) {
            Some(conn) => {
                tracing::debug!("Reactivating registry entry for '{}'", user_id);
                conn.user.active = true;
                conn.user.connected_at = time::unix_timestamp_millis();
                conn.sender = tx;
                conn.session += 1;
                conn.session
            }
            None => {
                connections.insert(
                    user_id.to_string(),
                    Connection {
                        user: User {
                            id: user_id.to_string(),
                            name: name.to_string(),
                            active: true,
                            connected_at: time::unix_timestamp_millis(),
                        },
                        sender: tx,
                        session: 0,
                    },
                );
                0
            }
        };

        (rx, session)
    }

    /// Mark a user inactive. Idempotent; an unknown id is a no-op.
    ///
    /// Used by explicit leave, which deactivates regardless of which session
    /// currently owns the entry.
    pub async fn mark_inactive(&self, user_id: &str) {
        let mut connections = self.connections.lock().await;
        if let Some(conn) = connections.get_mut(user_id) {
            conn.user.active = false;
        }
    }

    /// Mark a user inactive only if `session` still owns the entry.
    ///
    /// Session teardown and delivery-failure handling go through here: if
    /// the user re-joined in the meantime, the entry belongs to the new
    /// session and a stale token must leave it untouched.
    pub async fn mark_inactive_if_current(&self, user_id: &str, session: u64) {
        let mut connections = self.connections.lock().await;
        if let Some(conn) = connections.get_mut(user_id)
            && conn.session == session
        {
            conn.user.active = false;
        }
    }

    /// Capture every registered connection, inactive ones included.
    ///
    /// The broadcast engine filters on the active flag itself; taking the
    /// full set here keeps the lock hold time to a map walk.
    pub async fn snapshot(&self) -> Vec<Delivery> {
        let connections = self.connections.lock().await;
        connections
            .values()
            .map(|conn| Delivery {
                user_id: conn.user.id.clone(),
                active: conn.user.active,
                session: conn.session,
                sender: conn.sender.clone(),
            })
            .collect()
    }

    /// Registered users for the inspection API, sorted by id.
    pub async fn users(&self) -> Vec<UserInfo> {
        let connections = self.connections.lock().await;
        let mut users: Vec<UserInfo> = connections
            .values()
            .map(|conn| UserInfo {
                user_id: conn.user.id.clone(),
                name: conn.user.name.clone(),
                active: conn.user.active,
                connected_at: time::timestamp_to_rfc3339(conn.user.connected_at),
            })
            .collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_registers_active_connection() {
        // given:
        let registry = ConnectionRegistry::default();

        // when:
        let (_rx, _session) = registry.add("alice", "Alice").await;

        // then:
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].active);
        assert_eq!(snapshot[0].user_id, "alice");
    }

    #[tokio::test]
    async fn test_mark_inactive_is_idempotent_and_tolerates_unknown_ids() {
        // given:
        let registry = ConnectionRegistry::default();
        let (_rx, _session) = registry.add("alice", "Alice").await;

        // when: marking twice, plus an id that was never registered
        registry.mark_inactive("alice").await;
        registry.mark_inactive("alice").await;
        registry.mark_inactive("ghost").await;

        // then:
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot[0].active);
    }

    #[tokio::test]
    async fn test_repeat_join_reactivates_without_duplicating_entry() {
        // given: alice joins, leaves, joins again
        let registry = ConnectionRegistry::default();
        let (_rx1, _) = registry.add("alice", "Alice").await;
        registry.mark_inactive("alice").await;

        // when:
        let (_rx2, _) = registry.add("alice", "Alice").await;

        // then: registry size is stable and the entry is active again
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].active);
    }

    #[tokio::test]
    async fn test_reactivation_swaps_in_fresh_channel() {
        // given:
        let registry = ConnectionRegistry::default();
        let (rx1, _) = registry.add("alice", "Alice").await;
        drop(rx1);

        // when: the repeat join hands out a new channel
        let (mut rx2, _) = registry.add("alice", "Alice").await;
        let snapshot = registry.snapshot().await;
        snapshot[0].sender.send("hello".to_string()).unwrap();

        // then: the new receiver gets the message
        assert_eq!(rx2.recv().await, Some("hello".to_string()));
    }

    #[tokio::test]
    async fn test_stale_session_cannot_deactivate_a_reactivated_entry() {
        // given: alice rejoins while her first registration is still around
        let registry = ConnectionRegistry::default();
        let (_rx1, old_session) = registry.add("alice", "Alice").await;
        let (_rx2, new_session) = registry.add("alice", "Alice").await;
        assert_ne!(old_session, new_session);

        // when: the first session's teardown fires after the reactivation
        registry.mark_inactive_if_current("alice", old_session).await;

        // then: the entry still belongs to the new session and stays active
        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot[0].active);

        // when: the owning session tears down
        registry.mark_inactive_if_current("alice", new_session).await;

        // then:
        assert!(!registry.snapshot().await[0].active);
    }

    #[tokio::test]
    async fn test_snapshot_includes_inactive_connections() {
        // given:
        let registry = ConnectionRegistry::default();
        let (_rx_a, _) = registry.add("alice", "Alice").await;
        let (_rx_b, _) = registry.add("bob", "Bob").await;
        registry.mark_inactive("bob").await;

        // when:
        let snapshot = registry.snapshot().await;

        // then: inactive entries stay visible; the broadcaster filters
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.iter().filter(|d| d.active).count(), 1);
    }

    #[tokio::test]
    async fn test_users_listing_is_sorted_and_reports_flags() {
        // given:
        let registry = ConnectionRegistry::default();
        let (_rx_b, _) = registry.add("bob", "Bob").await;
        let (_rx_a, _) = registry.add("alice", "Alice").await;
        registry.mark_inactive("bob").await;

        // when:
        let users = registry.users().await;

        // then:
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_id, "alice");
        assert!(users[0].active);
        assert_eq!(users[1].user_id, "bob");
        assert!(!users[1].active);
    }
}
