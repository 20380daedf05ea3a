//! Core reply producer trait.
//!
//! Every reply strategy implements [`ReplyProducer`], giving the chat flow a
//! uniform way to turn user input into the text of the next system reply
//! without knowing whether it was templated locally or fetched remotely.

use async_trait::async_trait;

/// Computes the text of the next system reply.
///
/// Implementations must not fail: any internal error is mapped to a
/// user-facing fallback string before returning.
#[async_trait]
pub trait ReplyProducer: Send + Sync {
    /// Short identifier used in logs and the status bar.
    fn name(&self) -> &str;

    /// Produce reply text for the (already trimmed) user input.
    async fn produce(&self, input: &str) -> String;
}
