//! Employee operations behind the authentication gate.
//!
//! Each request walks the [`Phase`] lifecycle explicitly:
//!
//! ```text
//! Authenticated -> [AttachmentProcessed] -> Mutated -> Responded
//! ```
//!
//! The payload is parsed completely before anything is written, so a
//! rejected body leaves no trace. An attachment is written before the store
//! mutation that references it; when that mutation fails the file is
//! removed again.

use std::sync::Arc;

use http::StatusCode;
use roster_core::{
    ErrorCategory, Fields, Filter, Phase, RequestContext, RosterError, TransitionError,
};
use roster_extract::{
    ExtractionContext, ExtractionError, FromRequest, MutationPayload, PayloadConfig, Query,
    UploadedFile,
};
use roster_middleware::{Response, ResponseExt};
use roster_store::{AttachmentStore, EmployeeRepository, StoreError, StoredAttachment};
use serde::Serialize;

use crate::router::Operation;

/// Why an employee request stopped early.
#[derive(Debug)]
enum Rejection {
    Roster(RosterError),
    TooLarge(ExtractionError),
}

impl From<RosterError> for Rejection {
    fn from(error: RosterError) -> Self {
        Self::Roster(error)
    }
}

impl From<StoreError> for Rejection {
    fn from(error: StoreError) -> Self {
        Self::Roster(error.into())
    }
}

impl From<ExtractionError> for Rejection {
    fn from(error: ExtractionError) -> Self {
        if error.is_payload_too_large() {
            Self::TooLarge(error)
        } else {
            Self::Roster(error.into())
        }
    }
}

type Outcome = Result<Response, Rejection>;

/// Shared collaborators of the employee handlers.
#[derive(Clone)]
pub(crate) struct EmployeeService {
    pub(crate) repository: EmployeeRepository,
    pub(crate) attachments: Arc<dyn AttachmentStore>,
    pub(crate) payload: PayloadConfig,
}

impl std::fmt::Debug for EmployeeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmployeeService")
            .field("repository", &self.repository)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl EmployeeService {
    /// Runs one employee operation to a response.
    pub(crate) async fn handle(
        &self,
        operation: Operation,
        id: Option<&str>,
        ctx: RequestContext,
        phase: Phase,
        request: ExtractionContext,
    ) -> Response {
        let mut flow = Flow {
            service: self,
            ctx,
            phase,
            operation,
        };

        let outcome = match (operation, id) {
            (Operation::ListEmployees, _) => flow.list(&request).await,
            (Operation::CreateEmployee, _) => flow.create(&request).await,
            (Operation::GetEmployee, Some(id)) => flow.get(id).await,
            (Operation::UpdateEmployee, Some(id)) => flow.update(id, &request).await,
            (Operation::DeleteEmployee, Some(id)) => flow.delete(id).await,
            _ => Err(RosterError::store(format!("{operation} routed without an employee id")).into()),
        };

        outcome.unwrap_or_else(|rejection| flow.fail(rejection))
    }
}

/// One request's trip through the lifecycle.
struct Flow<'a> {
    service: &'a EmployeeService,
    ctx: RequestContext,
    phase: Phase,
    operation: Operation,
}

impl Flow<'_> {
    async fn list(&mut self, request: &ExtractionContext) -> Outcome {
        let Query(filter) = Query::<Filter>::from_request(request)?;
        self.ensure(Phase::Mutated)?;
        let records = self.service.repository.list(&filter).await?;
        self.advance(Phase::Mutated)?;
        self.respond(StatusCode::OK, &records)
    }

    async fn get(&mut self, id: &str) -> Outcome {
        self.ensure(Phase::Mutated)?;
        let record = self.service.repository.get(id).await?;
        self.advance(Phase::Mutated)?;
        self.respond(StatusCode::OK, &record)
    }

    async fn create(&mut self, request: &ExtractionContext) -> Outcome {
        let MutationPayload { mut fields, attachment } = self.payload(request).await?;
        let stored = self.store_attachment(attachment, &mut fields).await?;

        let created = match self.ensure(Phase::Mutated) {
            Ok(()) => self.service.repository.create(fields).await,
            Err(error) => Err(error),
        };
        let record = self.committed(created, stored).await?;

        tracing::info!(
            request_id = %self.ctx.request_id(),
            user_id = self.user_id(),
            employee_id = %record.id,
            "employee created"
        );
        self.advance(Phase::Mutated)?;
        self.respond(StatusCode::CREATED, &record)
    }

    async fn update(&mut self, id: &str, request: &ExtractionContext) -> Outcome {
        let MutationPayload { mut fields, attachment } = self.payload(request).await?;
        let stored = self.store_attachment(attachment, &mut fields).await?;

        let updated = match self.ensure(Phase::Mutated) {
            Ok(()) => self.service.repository.update(id, fields).await,
            Err(error) => Err(error),
        };
        let record = self.committed(updated, stored).await?;

        tracing::info!(
            request_id = %self.ctx.request_id(),
            user_id = self.user_id(),
            employee_id = %record.id,
            "employee updated"
        );
        self.advance(Phase::Mutated)?;
        self.respond(StatusCode::OK, &record)
    }

    async fn delete(&mut self, id: &str) -> Outcome {
        self.ensure(Phase::Mutated)?;
        let deleted = self.service.repository.delete(id).await?;

        tracing::info!(
            request_id = %self.ctx.request_id(),
            user_id = self.user_id(),
            employee_id = %deleted.id(),
            "employee deleted"
        );
        self.advance(Phase::Mutated)?;
        self.respond(StatusCode::OK, &deleted)
    }

    async fn payload(&self, request: &ExtractionContext) -> Result<MutationPayload, Rejection> {
        Ok(MutationPayload::extract(request, &self.service.payload).await?)
    }

    /// Writes the attachment, if any, and binds its name into `fields`.
    async fn store_attachment(
        &mut self,
        attachment: Option<UploadedFile>,
        fields: &mut Fields,
    ) -> Result<Option<StoredAttachment>, Rejection> {
        let Some(file) = attachment else {
            return Ok(None);
        };

        self.ensure(Phase::AttachmentProcessed)?;
        let original = file.file_name().unwrap_or_default().to_string();
        let stored = self.service.attachments.put(&original, file.data).await?;
        fields.set_profile_image(stored.file_name.clone());

        tracing::debug!(
            request_id = %self.ctx.request_id(),
            file_name = %stored.file_name,
            size = stored.size,
            "attachment stored"
        );
        self.advance(Phase::AttachmentProcessed)?;
        Ok(Some(stored))
    }

    /// Passes a store result through, removing the attachment it would have
    /// referenced when the mutation failed.
    async fn committed<T>(
        &self,
        result: Result<T, RosterError>,
        stored: Option<StoredAttachment>,
    ) -> Result<T, Rejection> {
        match (result, stored) {
            (Ok(value), _) => Ok(value),
            (Err(error), None) => Err(error.into()),
            (Err(error), Some(stored)) => {
                if let Err(cleanup) = self.service.attachments.remove(&stored.file_name).await {
                    tracing::warn!(
                        request_id = %self.ctx.request_id(),
                        file_name = %stored.file_name,
                        error = %cleanup,
                        "failed to remove orphaned attachment"
                    );
                }
                Err(error.into())
            }
        }
    }

    /// Checks that `next` is reachable before a side effect that leads there.
    fn ensure(&self, next: Phase) -> Result<(), RosterError> {
        let mut probe = self.phase;
        probe.transition(next).map_err(|e| self.illegal(e))
    }

    fn advance(&mut self, next: Phase) -> Result<(), Rejection> {
        let result = self.phase.transition(next);
        result.map_err(|e| Rejection::Roster(self.illegal(e)))
    }

    fn illegal(&self, error: TransitionError) -> RosterError {
        RosterError::store_with_source(format!("{} rejected", self.operation), error)
    }

    fn respond<T: Serialize + ?Sized>(&mut self, status: StatusCode, body: &T) -> Outcome {
        self.advance(Phase::Responded)?;
        Ok(Response::json(status, body))
    }

    fn fail(&mut self, rejection: Rejection) -> Response {
        let previous = self.phase;
        // Failed is reachable from every non-terminal phase.
        let _ = self.phase.transition(Phase::Failed);

        match rejection {
            Rejection::TooLarge(error) => {
                tracing::debug!(
                    request_id = %self.ctx.request_id(),
                    error = %error,
                    "payload too large"
                );
                Response::message(StatusCode::PAYLOAD_TOO_LARGE, &error.to_string())
            }
            Rejection::Roster(error) => {
                if error.category() == ErrorCategory::Store {
                    tracing::error!(
                        request_id = %self.ctx.request_id(),
                        operation_id = %self.operation,
                        phase = %previous,
                        error = %ErrorChain(&error),
                        "employee operation failed"
                    );
                } else {
                    tracing::debug!(
                        request_id = %self.ctx.request_id(),
                        operation_id = %self.operation,
                        error = %error,
                        "employee request rejected"
                    );
                }
                Response::from_error(&error)
            }
        }
    }

    fn user_id(&self) -> Option<&str> {
        self.ctx.user_id()
    }
}

/// Renders an error with its sources, `outer: inner: root`.
struct ErrorChain<'a>(&'a (dyn std::error::Error + 'static));

impl std::fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, ": {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}
