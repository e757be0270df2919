/// External eligibility check: does the user belong to the required group?
///
/// Implementations must be fail-closed: a timeout or an API error means the
/// membership is NOT confirmed, never a crash of the caller.
#[async_trait::async_trait]
pub trait MembershipGate: Send + Sync {
  async fn is_member(&self, user_id: i64) -> bool;
}
