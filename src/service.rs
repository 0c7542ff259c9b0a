//! The surface exposed to the presentation layer.
//!
//! Every call takes a [`Ctx`] built by [`AccessService::context`], checks
//! the route guard, talks to the store at most once for a mutation, projects
//! the result for the actor's role and appends the audit event before
//! returning.

use crate::access::decide;
use crate::audit::{AuditAction, AuditEvent, AuditOutcome, AuditTrail};
use crate::config::AccessConfig;
use crate::context::Ctx;
use crate::error::{Error, FieldErrors, Violation, ViolationKind};
use crate::gate::PolicyGate;
use crate::policy::Authenticated;
use crate::record::{DoctorSummary, PatientFields, PatientRecord, StaffAccount, StaffRequest};
use crate::redaction::{project, ProjectedRecord};
use crate::request::{Actor, RequestMeta};
use crate::role::Role;
use crate::route::Operation;
use crate::store::RecordStore;
use crate::validate::{validate, MutationKind};

/// Access layer over a [`RecordStore`].
///
/// # Examples
///
/// ```
/// use patient_access::{AccessService, MemoryStore, Operation, PatientFields, Role};
///
/// let store = MemoryStore::new();
/// let admin = store.add_staff("admin", "Ada", "Min", Role::Admin);
/// store.set_session(Some(admin));
///
/// let service = AccessService::new(store);
/// let ctx = service.context("req-1", &[Operation::CreatePatient]).unwrap();
///
/// let created = service
///     .mutate(
///         &ctx,
///         None,
///         PatientFields::default()
///             .with_name("Jane Doe")
///             .with_age(52)
///             .with_contact("555-1234")
///             .with_diagnosis("Type 2 Diabetes"),
///     )
///     .unwrap();
/// assert_eq!(created.name(), Some("Jane Doe"));
/// assert_eq!(service.trail().len(), 1);
/// ```
#[derive(Debug)]
pub struct AccessService<S> {
    store: S,
    trail: AuditTrail,
    config: AccessConfig,
}

impl<S: RecordStore> AccessService<S> {
    /// Creates a service with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, AccessConfig::default())
    }

    /// Creates a service with `config`.
    pub fn with_config(store: S, config: AccessConfig) -> Self {
        let trail = AuditTrail::new().with_traces(config.emit_audit_traces);
        Self::with_trail(store, trail, config)
    }

    /// Creates a service appending to an existing trail.
    pub fn with_trail(store: S, trail: AuditTrail, config: AccessConfig) -> Self {
        Self {
            store,
            trail,
            config,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The audit trail.
    pub fn trail(&self) -> &AuditTrail {
        &self.trail
    }

    /// Builds a context for the current session, checking `operations`.
    ///
    /// A forbidden operation is recorded as an `ACCESS_DENIED` attempt.
    ///
    /// # Errors
    ///
    /// Returns the gate's violation. Use [`Error::navigation`] to map it to
    /// a redirect.
    pub fn context(&self, request_id: &str, operations: &[Operation]) -> Result<Ctx, Error> {
        let actor = self.store.current_actor();
        let meta = RequestMeta {
            request_id: request_id.to_string(),
            actor: actor.clone(),
        };
        let gate = operations
            .iter()
            .fold(PolicyGate::new(meta).require(Authenticated), |gate, op| {
                gate.require(*op)
            });

        match gate.build() {
            Ok(ctx) => Ok(ctx),
            Err(violation) => {
                if let (Some(actor), ViolationKind::Forbidden { operation }) =
                    (actor.as_ref(), violation.kind)
                {
                    self.record_denial(actor, operation);
                }
                Err(violation.into())
            }
        }
    }

    /// Projects one canonical record for the actor and records the view.
    ///
    /// # Errors
    ///
    /// `NotFound` if the record is outside the actor's scope.
    pub fn present(&self, ctx: &Ctx, record: &PatientRecord) -> Result<ProjectedRecord, Error> {
        self.guard(ctx, Operation::ViewPatient)?;
        let role = match ctx.role() {
            Some(role) if self.in_scope(ctx, role, record) => role,
            Some(_) => {
                self.trail.record_attempt(
                    Some(ctx.actor()),
                    AuditAction::ViewPatient,
                    Some(record.id),
                    format!("Patient {} is outside actor scope", record.id),
                    AuditOutcome::Denied,
                );
                return Err(Error::NotFound(record.id));
            }
            None => return Err(Error::NotFound(record.id)),
        };

        let projection = project(record, role);
        self.trail.record(
            Some(ctx.actor()),
            AuditAction::ViewPatient,
            Some(record.id),
            format!("Viewed patient {}", record.id),
        );
        Ok(projection)
    }

    /// Projects every in-scope record for the actor and records one list view.
    ///
    /// Records outside the actor's scope are dropped. An actor holding no
    /// role sees nothing.
    pub fn present_all(
        &self,
        ctx: &Ctx,
        records: &[PatientRecord],
    ) -> Result<Vec<ProjectedRecord>, Error> {
        self.guard(ctx, Operation::ListPatients)?;
        let projections: Vec<ProjectedRecord> = match ctx.role() {
            Some(role) => records
                .iter()
                .filter(|r| self.in_scope(ctx, role, r))
                .map(|r| project(r, role))
                .collect(),
            None => Vec::new(),
        };

        self.trail.record(
            Some(ctx.actor()),
            AuditAction::ViewPatientList,
            None,
            format!("Listed {} patients", projections.len()),
        );
        Ok(projections)
    }

    /// Fetches and presents one record.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown or out-of-scope ids; store failures verbatim.
    pub fn view_patient(&self, ctx: &Ctx, id: u64) -> Result<ProjectedRecord, Error> {
        self.guard(ctx, Operation::ViewPatient)?;
        tracing::debug!(request_id = %ctx.request_id(), actor_id = ctx.actor().id, patient_id = id, "view patient");
        let record = self.store.get_patient(id)?;
        self.present(ctx, &record)
    }

    /// Fetches and presents every record visible to the actor.
    ///
    /// # Errors
    ///
    /// Store failures are returned verbatim.
    pub fn list_patients(&self, ctx: &Ctx) -> Result<Vec<ProjectedRecord>, Error> {
        self.guard(ctx, Operation::ListPatients)?;
        tracing::debug!(request_id = %ctx.request_id(), actor_id = ctx.actor().id, "list patients");
        let records = self.store.list_patients()?;
        self.present_all(ctx, &records)
    }

    /// Creates (`id == None`) or updates a record.
    ///
    /// Each submitted field is checked against the role's edit policy, then
    /// values are validated, then the store is called once. Every outcome,
    /// including rejection, appends exactly one audit event.
    ///
    /// # Errors
    ///
    /// - `Violation(Forbidden)` if the role may not create or edit at all
    /// - `FieldImmutable` if a submitted field is not editable by the role
    /// - `ValidationFailed` for bad values
    /// - `NotFound`, `Conflict`, `UpstreamUnavailable` from the store
    pub fn mutate(
        &self,
        ctx: &Ctx,
        id: Option<u64>,
        fields: PatientFields,
    ) -> Result<ProjectedRecord, Error> {
        let (operation, kind) = match id {
            Some(_) => (Operation::EditPatient, MutationKind::Update),
            None => (Operation::CreatePatient, MutationKind::Create),
        };
        self.guard(ctx, operation)?;
        let role = ctx
            .role()
            .ok_or_else(|| Error::from(Violation::forbidden(operation)))?;
        let action = mutation_action(kind, role);
        let actor = ctx.actor();

        let fail = |err: Error, outcome: AuditOutcome| -> Error {
            tracing::warn!(
                request_id = %ctx.request_id(),
                actor_id = actor.id,
                action = %action,
                error = %err,
                "patient mutation rejected"
            );
            self.trail
                .record_attempt(Some(actor), action.clone(), id, format!("{}", err), outcome);
            err
        };

        if kind == MutationKind::Update && fields.is_empty() {
            let mut errors = FieldErrors::new();
            errors.add("non_field_errors", "No fields submitted.");
            return Err(fail(Error::ValidationFailed(errors), AuditOutcome::Failed));
        }

        if let Some(field) = fields
            .present()
            .into_iter()
            .find(|f| !decide(role, *f, true).is_editable())
        {
            return Err(fail(
                Error::FieldImmutable { field, role },
                AuditOutcome::Denied,
            ));
        }

        if let Err(err) = validate(&fields, role, kind) {
            return Err(fail(err, AuditOutcome::Failed));
        }

        let stored = match id {
            Some(id) => self.store.update_patient(id, &fields),
            None => self.store.create_patient(&fields),
        };
        let record = stored.map_err(|e| fail(Error::from(e), AuditOutcome::Failed))?;

        let details = match (kind, role) {
            (MutationKind::Create, _) => "Created patient record".to_string(),
            (MutationKind::Update, Role::Receptionist) => format!(
                "Receptionist updated assigned doctor for patient {}",
                record.id
            ),
            (MutationKind::Update, Role::Admin) => {
                format!("Admin updated patient {} details", record.id)
            }
            (MutationKind::Update, Role::Doctor) => format!("Updated patient {}", record.id),
        };
        self.trail
            .record(Some(actor), action, Some(record.id), details);
        tracing::info!(
            request_id = %ctx.request_id(),
            actor_id = actor.id,
            patient_id = record.id,
            changed = ?fields.present(),
            "patient record written"
        );

        Ok(project(&record, role))
    }

    /// Lists doctors for assignment pickers.
    ///
    /// # Errors
    ///
    /// Store failures are returned verbatim.
    pub fn list_doctors(&self, ctx: &Ctx) -> Result<Vec<DoctorSummary>, Error> {
        self.guard(ctx, Operation::ListDoctors)?;
        Ok(self.store.list_doctors()?)
    }

    /// Creates a staff account.
    ///
    /// # Errors
    ///
    /// `Violation(Forbidden)` for non-admins; `Conflict` for a taken
    /// username; `ValidationFailed` for blank credentials.
    pub fn create_staff(&self, ctx: &Ctx, request: StaffRequest) -> Result<StaffAccount, Error> {
        self.guard(ctx, Operation::CreateStaff)?;
        let actor = ctx.actor();

        match self.store.create_staff(&request) {
            Ok(account) => {
                self.trail.record(
                    Some(actor),
                    AuditAction::CreateStaff,
                    Some(account.id),
                    format!("Created {} account {}", request.role, account.username),
                );
                Ok(account)
            }
            Err(err) => {
                let err = Error::from(err);
                self.trail.record_attempt(
                    Some(actor),
                    AuditAction::CreateStaff,
                    None,
                    format!("{}", err),
                    AuditOutcome::Failed,
                );
                Err(err)
            }
        }
    }

    /// Records a successful login.
    pub fn record_login(&self, actor: &Actor) -> AuditEvent {
        self.trail.record(
            Some(actor),
            AuditAction::UserLogin,
            None,
            format!("User {} logged in successfully", actor.username),
        )
    }

    /// Records a logout.
    pub fn record_logout(&self, actor: &Actor) -> AuditEvent {
        self.trail.record(
            Some(actor),
            AuditAction::UserLogout,
            None,
            format!("User {} logged out", actor.username),
        )
    }

    /// Every audit event, most recent first.
    ///
    /// # Errors
    ///
    /// `Violation(Forbidden)` for non-admins.
    pub fn audit_feed(&self, ctx: &Ctx) -> Result<Vec<AuditEvent>, Error> {
        self.guard(ctx, Operation::ViewAuditLog)?;
        Ok(self.trail.list())
    }

    /// The audit log as delimited text, most recent first.
    ///
    /// # Errors
    ///
    /// `Violation(Forbidden)` for non-admins; `Export` if writing fails.
    pub fn audit_export(&self, ctx: &Ctx) -> Result<Vec<u8>, Error> {
        self.guard(ctx, Operation::ViewAuditLog)?;
        self.trail.export(&self.config.export)
    }

    fn guard(&self, ctx: &Ctx, operation: Operation) -> Result<(), Error> {
        ctx.authorize(operation).map_err(|violation| {
            self.record_denial(ctx.actor(), operation);
            Error::from(violation)
        })
    }

    fn record_denial(&self, actor: &Actor, operation: Operation) {
        tracing::warn!(actor_id = actor.id, roles = %actor.roles, operation = %operation, "access denied");
        self.trail.record_attempt(
            Some(actor),
            AuditAction::AccessDenied,
            None,
            format!("Operation '{}' refused for roles {}", operation, actor.roles),
            AuditOutcome::Denied,
        );
    }

    fn in_scope(&self, ctx: &Ctx, role: Role, record: &PatientRecord) -> bool {
        match role {
            Role::Doctor if self.config.doctor_scope_assigned_only => {
                record.assigned_doctor_id == Some(ctx.actor().id)
            }
            _ => true,
        }
    }
}

fn mutation_action(kind: MutationKind, role: Role) -> AuditAction {
    match (kind, role) {
        (MutationKind::Create, _) => AuditAction::CreatePatient,
        (MutationKind::Update, Role::Receptionist) => AuditAction::UpdatePatientDoctor,
        (MutationKind::Update, Role::Admin) => AuditAction::UpdatePatientFull,
        (MutationKind::Update, Role::Doctor) => AuditAction::UpdatePatient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::RoleSet;
    use crate::store::MemoryStore;

    fn service_with(role: Role) -> (AccessService<MemoryStore>, Actor) {
        let store = MemoryStore::new();
        let actor = store.add_staff("actor", "A", "Ctor", role);
        store.set_session(Some(actor.clone()));
        (
            AccessService::with_config(store, AccessConfig::default().with_audit_traces(false)),
            actor,
        )
    }

    #[test]
    fn mutation_actions_follow_role() {
        assert_eq!(
            mutation_action(MutationKind::Create, Role::Admin),
            AuditAction::CreatePatient
        );
        assert_eq!(
            mutation_action(MutationKind::Update, Role::Receptionist),
            AuditAction::UpdatePatientDoctor
        );
        assert_eq!(
            mutation_action(MutationKind::Update, Role::Admin),
            AuditAction::UpdatePatientFull
        );
    }

    #[test]
    fn context_denial_is_audited() {
        let (service, actor) = service_with(Role::Doctor);
        let err = service
            .context("req-1", &[Operation::CreatePatient])
            .unwrap_err();
        assert!(err.is_soft_deny());

        let events = service.trail().list();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action(), &AuditAction::AccessDenied);
        assert_eq!(events[0].outcome(), AuditOutcome::Denied);
        assert_eq!(events[0].actor_id(), Some(actor.id));
    }

    #[test]
    fn anonymous_context_is_not_audited() {
        let service = AccessService::new(MemoryStore::new());
        let err = service.context("req-1", &[]).unwrap_err();
        assert_eq!(err.navigation(), Some(crate::route::Navigation::RedirectToLogin));
        assert!(service.trail().is_empty());
    }

    #[test]
    fn empty_update_is_rejected_and_audited() {
        let (service, _) = service_with(Role::Admin);
        let patient = service.store().seed_patient(PatientFields::default().with_name("X"));
        let ctx = service.context("req-1", &[Operation::EditPatient]).unwrap();

        let err = service
            .mutate(&ctx, Some(patient.id), PatientFields::default())
            .unwrap_err();
        assert!(matches!(err, Error::ValidationFailed(_)));
        assert_eq!(service.trail().list()[0].outcome(), AuditOutcome::Failed);
        assert_eq!(service.store().writes(), 0);
    }

    #[test]
    fn roleless_actor_sees_empty_list() {
        let store = MemoryStore::new();
        store.seed_patient(PatientFields::default().with_name("X"));
        let actor = store.add_staff("nobody", "No", "Body", RoleSet::empty());
        store.set_session(Some(actor));
        let service = AccessService::new(store);

        let ctx = service.context("req-1", &[Operation::ListPatients]).unwrap();
        assert!(service.list_patients(&ctx).unwrap().is_empty());
        assert!(matches!(service.view_patient(&ctx, 1), Err(Error::NotFound(1))));
    }

    #[test]
    fn staff_creation_is_audited() {
        let (service, _) = service_with(Role::Admin);
        let ctx = service.context("req-1", &[Operation::CreateStaff]).unwrap();
        let account = service
            .create_staff(&ctx, StaffRequest::new("dr_house", "vicodin", Role::Doctor))
            .unwrap();

        let event = &service.trail().list()[0];
        assert_eq!(event.action(), &AuditAction::CreateStaff);
        assert_eq!(event.target_id(), Some(account.id));
        assert!(!event.details().contains("vicodin"));

        let err = service
            .create_staff(&ctx, StaffRequest::new("dr_house", "x", Role::Doctor))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(service.trail().list()[0].outcome(), AuditOutcome::Failed);
    }

    #[test]
    fn login_and_logout_events() {
        let (service, actor) = service_with(Role::Receptionist);
        service.record_login(&actor);
        service.record_logout(&actor);
        let events = service.trail().list();
        assert_eq!(events[0].action(), &AuditAction::UserLogout);
        assert_eq!(events[1].action(), &AuditAction::UserLogin);
        assert_eq!(events[1].details(), "User actor logged in successfully");
    }
}
