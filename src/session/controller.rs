//! Session operations: configure, connect, converse, reset.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agent::{AgentFactory, AgentHandle, ConversationalAgent};
use crate::error::AgentError;
use crate::util::with_timeout;

use super::config::{ConfigDraft, SessionConfig};
use super::conversation::Turn;
use super::store::{SessionId, SessionRef, SessionStore};
use super::{ConnectionPhase, SessionView, TurnOutcome};

/// Result of a successful configuration commit.
#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    /// True when the commit moved the session into the ready-to-connect state.
    pub entered_ready: bool,
    pub session: SessionView,
}

/// Entry point for every session operation.
pub struct SessionController {
    store: SessionStore,
    factory: Arc<dyn AgentFactory>,
    connect_timeout: Duration,
    turn_timeout: Duration,
}

impl SessionController {
    pub fn new(
        factory: Arc<dyn AgentFactory>,
        connect_timeout: Duration,
        turn_timeout: Duration,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            factory,
            connect_timeout,
            turn_timeout,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn create(&self) -> SessionView {
        let session = self.store.create();
        let session = session.lock().await;
        info!(session_id = %session.id(), "session created");
        session.view()
    }

    pub async fn view(&self, id: SessionId) -> Result<SessionView, AgentError> {
        let session = self.session(id)?;
        let session = session.lock().await;
        Ok(session.view())
    }

    /// Destroy the session and close its tool-server connection.
    pub async fn end(&self, id: SessionId) -> Result<(), AgentError> {
        let session = self
            .store
            .end(&id)
            .ok_or_else(|| AgentError::SessionNotFound(id.to_string()))?;
        let handle = session.lock().await.reset();
        shutdown(handle).await;
        info!(session_id = %id, "session ended");
        Ok(())
    }

    /// Validate and store the configuration.
    ///
    /// Invalid input mutates nothing. A configuration that differs from the committed one
    /// discards the agent and its tools but keeps the conversation log.
    pub async fn commit_config(
        &self,
        id: SessionId,
        draft: ConfigDraft,
    ) -> Result<CommitOutcome, AgentError> {
        let session = self.session(id)?;
        let (outcome, discarded) = {
            let mut session = session.lock().await;
            session.touch();
            if session.is_occupied() {
                return Err(AgentError::Busy);
            }

            let config = draft.validate()?;
            let changed = session.config.as_ref() != Some(&config);
            let discarded = if changed {
                debug!(session_id = %id, ?config, "configuration committed");
                session.config = Some(config);
                session.phase.replace(ConnectionPhase::Ready)
            } else {
                None
            };

            let outcome = CommitOutcome {
                entered_ready: changed,
                session: session.view(),
            };
            (outcome, discarded)
        };

        shutdown(discarded).await;
        Ok(outcome)
    }

    /// Build a fresh agent for the committed configuration. Also the retry action.
    ///
    /// The build runs on its own task, so the session leaves `Connecting` even when the
    /// caller stops waiting.
    pub async fn connect(&self, id: SessionId) -> Result<SessionView, AgentError> {
        let session = self.session(id)?;
        let (config, epoch, previous) = {
            let mut session = session.lock().await;
            session.touch();
            if session.is_occupied() {
                return Err(AgentError::Busy);
            }
            let config = session.config.clone().ok_or_else(|| {
                AgentError::InvalidState("configuration must be committed before connecting".into())
            })?;
            let previous = session.phase.replace(ConnectionPhase::Connecting);
            (config, session.epoch, previous)
        };

        let task = InFlight { id, session, epoch };
        detach(task.connect(
            Arc::clone(&self.factory),
            config,
            previous,
            self.connect_timeout,
        ))
        .await
    }

    /// Run one turn: append the user text, replay the log through the agent and append
    /// exactly one assistant turn with the reply or the error.
    ///
    /// The agent call runs on its own task, so the turn is recorded and the session
    /// released even when the caller stops waiting.
    pub async fn submit_turn(
        &self,
        id: SessionId,
        text: &str,
    ) -> Result<TurnOutcome, AgentError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::InvalidArgument("message must not be empty".into()));
        }

        let session = self.session(id)?;
        let (agent, history, epoch) = {
            let mut session = session.lock().await;
            session.touch();
            if session.is_occupied() {
                return Err(AgentError::Busy);
            }
            let ConnectionPhase::Connected(handle) = &session.phase else {
                return Err(AgentError::InvalidState(
                    "connect to a tool server before sending messages".into(),
                ));
            };
            let agent = handle.agent();
            session.log.append(Turn::user(text));
            session.busy = true;
            (agent, session.log.turns().to_vec(), session.epoch)
        };

        let task = InFlight { id, session, epoch };
        detach(task.turn(agent, history, self.turn_timeout)).await
    }

    /// Clear configuration, agent, tools and log in one step.
    pub async fn reset(&self, id: SessionId) -> Result<SessionView, AgentError> {
        let session = self.session(id)?;
        let (view, handle) = {
            let mut session = session.lock().await;
            let handle = session.reset();
            (session.view(), handle)
        };
        shutdown(handle).await;
        info!(session_id = %id, "session reset");
        Ok(view)
    }

    /// Empty the transcript, keeping configuration and agent.
    pub async fn clear_transcript(&self, id: SessionId) -> Result<SessionView, AgentError> {
        let session = self.session(id)?;
        let mut session = session.lock().await;
        session.touch();
        if session.busy {
            return Err(AgentError::Busy);
        }
        session.log.clear();
        Ok(session.view())
    }

    /// End sessions idle for longer than `ttl`. Returns how many were removed.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let expired = self.store.sweep_idle(ttl);
        let count = expired.len();
        for session in expired {
            let handle = session.lock().await.reset();
            shutdown(handle).await;
        }
        if count > 0 {
            info!(count, "idle sessions ended");
        }
        count
    }

    fn session(&self, id: SessionId) -> Result<SessionRef, AgentError> {
        self.store
            .get(&id)
            .ok_or_else(|| AgentError::SessionNotFound(id.to_string()))
    }
}

/// A connect or turn that owns its session until the result is recorded.
struct InFlight {
    id: SessionId,
    session: SessionRef,
    epoch: u64,
}

impl InFlight {
    async fn connect(
        self,
        factory: Arc<dyn AgentFactory>,
        config: SessionConfig,
        previous: Option<AgentHandle>,
        timeout: Duration,
    ) -> Result<SessionView, AgentError> {
        let id = self.id;
        shutdown(previous).await;

        info!(
            session_id = %id,
            transport = %config.transport,
            url = %config.tool_server_url,
            "connecting to tool server"
        );
        let built = match tokio::time::timeout(timeout, factory.build(&config)).await {
            Ok(built) => built,
            Err(_) => Err(AgentError::connection(
                config.transport.to_string(),
                format!("timed out after {}s", timeout.as_secs()),
            )),
        };

        let mut session = self.session.lock().await;
        if session.epoch != self.epoch {
            drop(session);
            if let Ok(handle) = built {
                handle.shutdown().await;
            }
            return Err(AgentError::InvalidState(
                "session was reset while connecting".into(),
            ));
        }
        session.touch();

        match built {
            Ok(handle) => {
                info!(session_id = %id, tools = handle.tools().len(), "session connected");
                session.phase = ConnectionPhase::Connected(handle);
                Ok(session.view())
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "connection failed");
                session.phase = ConnectionPhase::Failed {
                    message: e.to_string(),
                    suggestion: e.recovery_suggestion(),
                };
                Err(e)
            }
        }
    }

    async fn turn(
        self,
        agent: Arc<dyn ConversationalAgent>,
        history: Vec<Turn>,
        timeout: Duration,
    ) -> Result<TurnOutcome, AgentError> {
        let id = self.id;
        debug!(session_id = %id, turns = history.len(), "turn started");
        let outcome = TurnOutcome::from_result(with_timeout(timeout, agent.submit(&history)).await);

        let mut session = self.session.lock().await;
        if session.epoch != self.epoch {
            debug!(session_id = %id, "dropping result of a turn that outlived a reset");
            return Err(AgentError::InvalidState(
                "session was reset while the turn was in flight".into(),
            ));
        }
        if let TurnOutcome::Failed { kind, message } = &outcome {
            warn!(session_id = %id, %kind, error = %message, "turn failed");
        }
        session.log.append(outcome.to_turn());
        session.busy = false;
        session.touch();
        Ok(outcome)
    }
}

/// Run `task` to completion on the runtime, independent of the caller.
async fn detach<T: Send + 'static>(
    task: impl Future<Output = Result<T, AgentError>> + Send + 'static,
) -> Result<T, AgentError> {
    tokio::spawn(task)
        .await
        .map_err(|e| AgentError::InvalidState(format!("session task did not finish: {e}")))?
}

async fn shutdown(handle: Option<AgentHandle>) {
    if let Some(handle) = handle {
        handle.shutdown().await;
    }
}
