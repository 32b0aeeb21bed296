//! ConversationStore trait definition.

use sera_types::conversation::{ConversationHistory, Turn, UserId};

/// Storage for per-user conversation histories.
///
/// None of the operations fail: an unseen user simply has an empty history.
/// Uses native async fn in traits (RPITIT, Rust 2024 edition) so
/// network-backed stores fit the same contract.
pub trait ConversationStore: Send + Sync {
    /// The stored history for `user`, or an empty one.
    fn get(
        &self,
        user: &UserId,
    ) -> impl std::future::Future<Output = ConversationHistory> + Send;

    /// Replace the stored history for `user` in full.
    fn put(
        &self,
        user: &UserId,
        history: ConversationHistory,
    ) -> impl std::future::Future<Output = ()> + Send;

    /// Atomically append one user/model turn pair to `user`'s history.
    ///
    /// Concurrent exchanges for the same user each land their pair; none is
    /// lost the way a read-modify-`put` sequence could lose one. Returns the
    /// history as stored after the append (after any cap was applied).
    fn append_exchange(
        &self,
        user: &UserId,
        user_turn: Turn,
        model_turn: Turn,
    ) -> impl std::future::Future<Output = ConversationHistory> + Send;

    /// Number of users with a stored history.
    fn user_count(&self) -> impl std::future::Future<Output = usize> + Send;
}
