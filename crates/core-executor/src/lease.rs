use crate::engine::{Engine, Session};
use crate::error::{ExecutionError, ExecutionResult};
use uuid::Uuid;

/// Exclusive ownership of one engine session for the duration of a request.
///
/// The session is closed exactly once: by an explicit [`ConnectionLease::release`]
/// or, failing that, when the lease is dropped. Released leases hand out no session.
pub struct ConnectionLease {
    id: Uuid,
    session: Option<Box<dyn Session>>,
}

impl ConnectionLease {
    #[tracing::instrument(name = "ConnectionLease::acquire", level = "debug", skip(engine), err)]
    pub fn acquire(engine: &dyn Engine) -> ExecutionResult<Self> {
        let session = engine.connect()?;
        let id = Uuid::now_v7();
        tracing::debug!(lease_id = %id, "connection acquired");
        Ok(Self {
            id,
            session: Some(session),
        })
    }

    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.session.is_none()
    }

    pub fn session(&mut self) -> ExecutionResult<&mut dyn Session> {
        match self.session.as_mut() {
            Some(session) => Ok(session.as_mut()),
            None => Err(ExecutionError::unavailable(format!(
                "connection {} already released",
                self.id
            ))),
        }
    }

    /// Closes the session. Calling it again is a no-op.
    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
            tracing::debug!(lease_id = %self.id, "connection released");
        }
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ConnectionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionLease")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .finish()
    }
}
