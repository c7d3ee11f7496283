//! State carried through the stages of one request.
//!
//! Stages write to a [`MiddlewareContext`]; the handler gets a read-only
//! [`RequestContext`](roster_core::RequestContext) built from it.

use std::fmt;

use http::Extensions;
use roster_core::{Identity, Phase, RequestContext, RequestId, TransitionError};

/// A second identity was offered for a request that already has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAlreadyAttached {
    /// The identity that was kept.
    pub existing: Identity,
}

impl fmt::Display for IdentityAlreadyAttached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request already authenticated as {}", self.existing.log_id())
    }
}

impl std::error::Error for IdentityAlreadyAttached {}

/// Request id, caller identity, lifecycle [`Phase`] and whatever typed
/// values stages leave for each other.
///
/// ```
/// use roster_core::{Identity, Phase};
/// use roster_middleware::MiddlewareContext;
///
/// let mut ctx = MiddlewareContext::new();
/// assert_eq!(ctx.phase(), Phase::Unauthenticated);
///
/// ctx.attach_identity(Identity::new("u-1", "a@example.com")).unwrap();
/// assert_eq!(ctx.phase(), Phase::Authenticated);
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    identity: Option<Identity>,
    operation_id: Option<&'static str>,
    phase: Phase,
    extensions: Extensions,
}

impl MiddlewareContext {
    /// Fresh id, anonymous, `Unauthenticated`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            identity: None,
            operation_id: None,
            phase: Phase::Unauthenticated,
            extensions: Extensions::new(),
        }
    }

    /// The request id; replaced by the request id stage.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Used by the request id stage.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// The caller, once authentication has passed.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Records the caller and enters [`Phase::Authenticated`].
    ///
    /// Only the first identity sticks; later ones are refused.
    pub fn attach_identity(&mut self, identity: Identity) -> Result<(), IdentityAlreadyAttached> {
        match &self.identity {
            Some(existing) => Err(IdentityAlreadyAttached {
                existing: existing.clone(),
            }),
            None => {
                self.identity = Some(identity);
                // Unauthenticated is the only phase that can get here.
                let _ = self.phase.transition(Phase::Authenticated);
                Ok(())
            }
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves to `next` if the lifecycle allows it.
    pub fn advance(&mut self, next: Phase) -> Result<(), TransitionError> {
        self.phase.transition(next)
    }

    /// Enters [`Phase::Failed`] unless the request already finished.
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = Phase::Failed;
        }
    }

    /// Route name resolved by the router.
    #[must_use]
    pub fn operation_id(&self) -> Option<&'static str> {
        self.operation_id
    }

    /// Set after routing.
    pub fn set_operation_id(&mut self, operation_id: &'static str) {
        self.operation_id = Some(operation_id);
    }

    /// Leaves a value for later stages, replacing one of the same type.
    pub fn set_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(value);
    }

    /// A value left by an earlier stage.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get()
    }

    /// The handler's view of this context.
    #[must_use]
    pub fn to_request_context(&self) -> RequestContext {
        let ctx = RequestContext::with_request_id(self.request_id);
        let ctx = match &self.identity {
            Some(identity) => ctx.with_identity(identity.clone()),
            None => ctx,
        };
        match self.operation_id {
            Some(operation_id) => ctx.with_operation_id(operation_id),
            None => ctx,
        }
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Identity {
        Identity::new("u-1", "ada@example.com")
    }

    #[test]
    fn test_only_first_identity_sticks() {
        let mut ctx = MiddlewareContext::new();
        ctx.attach_identity(ada()).unwrap();

        let err = ctx
            .attach_identity(Identity::new("u-2", "bob@example.com"))
            .unwrap_err();
        assert_eq!(err.existing, ada());
        assert_eq!(ctx.identity(), Some(&ada()));
        assert_eq!(ctx.phase(), Phase::Authenticated);
    }

    #[test]
    fn test_mutation_needs_authentication() {
        let mut ctx = MiddlewareContext::new();
        assert!(ctx.advance(Phase::Mutated).is_err());
        assert_eq!(ctx.phase(), Phase::Unauthenticated);
    }

    #[test]
    fn test_failure_does_not_rewrite_finished_requests() {
        let mut ctx = MiddlewareContext::new();
        ctx.attach_identity(ada()).unwrap();
        ctx.advance(Phase::Mutated).unwrap();
        ctx.advance(Phase::Responded).unwrap();
        ctx.fail();
        assert_eq!(ctx.phase(), Phase::Responded);

        let mut anonymous = MiddlewareContext::new();
        anonymous.fail();
        assert_eq!(anonymous.phase(), Phase::Failed);
    }

    #[test]
    fn test_extensions_are_keyed_by_type() {
        #[derive(Debug, Clone, PartialEq)]
        struct Attempt(u8);

        let mut ctx = MiddlewareContext::new();
        assert!(ctx.get_extension::<Attempt>().is_none());
        ctx.set_extension(Attempt(1));
        ctx.set_extension(Attempt(2));
        assert_eq!(ctx.get_extension::<Attempt>(), Some(&Attempt(2)));
        assert!(ctx.get_extension::<u8>().is_none());
    }

    #[test]
    fn test_handler_view() {
        let mut ctx = MiddlewareContext::new();
        ctx.attach_identity(ada()).unwrap();
        ctx.set_operation_id("createEmployee");

        let view = ctx.to_request_context();
        assert_eq!(view.request_id(), ctx.request_id());
        assert_eq!(view.user_id(), Some("u-1"));
        assert_eq!(view.operation_id(), Some("createEmployee"));
    }
}
