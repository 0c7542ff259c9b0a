use crate::{
    context::Ctx,
    error::Violation,
    policy::PolicyReq,
    request::RequestMeta,
    route::{is_allowed, Operation},
};

/// The route-guard gate.
///
/// `PolicyGate` is the only way to construct a [`Ctx`]. It checks the
/// request's actor against every accumulated requirement before any record
/// is touched.
///
/// # Examples
///
/// ```
/// use patient_access::{Actor, Authenticated, Authorized, Operation, PolicyGate, RequestMeta, Role};
///
/// let meta = RequestMeta::authenticated("req-123", Actor::new(1, "admin", Role::Admin));
///
/// let ctx = PolicyGate::new(meta)
///     .require(Authenticated)
///     .require(Authorized::for_operation(Operation::CreatePatient))
///     .build()
///     .expect("admin may create patients");
///
/// assert!(ctx.is_granted(Operation::CreatePatient));
/// ```
pub struct PolicyGate {
    meta: RequestMeta,
    requirements: Vec<PolicyReq>,
}

impl PolicyGate {
    /// Creates a new gate for the given request.
    pub fn new(meta: RequestMeta) -> Self {
        Self {
            meta,
            requirements: Vec::new(),
        }
    }

    /// Adds a requirement, ignoring exact duplicates.
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();
        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }
        self
    }

    /// Validates every requirement and builds the context.
    ///
    /// A context always carries an actor, so an anonymous request fails
    /// even when no requirement was added.
    ///
    /// # Errors
    ///
    /// Returns the first failing requirement as a [`Violation`]:
    /// `Unauthenticated` when there is no actor, `Forbidden` when the
    /// actor's roles do not permit an operation.
    pub fn build(self) -> Result<Ctx, Violation> {
        let actor = match self.meta.actor {
            Some(actor) => actor,
            None => {
                tracing::debug!(request_id = %self.meta.request_id, "rejected anonymous request");
                return Err(Violation::unauthenticated());
            }
        };

        let mut granted = Vec::new();
        for req in &self.requirements {
            match *req {
                PolicyReq::Authenticated => {}
                PolicyReq::Authorized { operation } => {
                    if !is_allowed(actor.roles, operation) {
                        tracing::warn!(
                            request_id = %self.meta.request_id,
                            actor_id = actor.id,
                            roles = %actor.roles,
                            operation = %operation,
                            "operation denied by route guard"
                        );
                        return Err(Violation::forbidden(operation));
                    }
                    granted.push(operation);
                }
            }
        }

        Ok(Ctx::new(self.meta.request_id, actor, granted))
    }

    /// The operations this gate will check, in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.requirements.iter().filter_map(|r| match r {
            PolicyReq::Authorized { operation } => Some(*operation),
            PolicyReq::Authenticated => None,
        })
    }
}
