//! Caller resolution helpers used by HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! session-to-caller derivation here: the session cookie stores only the user
//! id, and every request re-resolves it against the directory so role changes
//! and deletions take effect immediately.

use crate::domain::Caller;
use crate::domain::ports::Accounts;

use super::ApiResult;
use super::session::SessionContext;

/// Resolve the authenticated caller for a request.
pub async fn require_caller(
    accounts: &dyn Accounts,
    session: &SessionContext,
) -> ApiResult<Caller> {
    let user_id = session.require_user_id()?;
    accounts.resolve_caller(&user_id).await
}
