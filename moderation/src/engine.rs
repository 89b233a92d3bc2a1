//! Moderation engine — session registry, locking, and event dispatch
//!
//! The engine is the single inbound surface for transports: reporter inputs,
//! moderator inputs, cancellations, and classifier submissions all land here.
//! Each session lives behind its own `tokio::sync::Mutex`; an inbound event
//! holds that lock for the whole transition, outbound calls included, so two
//! moderator inputs for the same session can never interleave between the
//! exclusivity check and the state write. Distinct sessions proceed fully
//! independently.
//!
//! Workflow state is in-memory only. Terminal sessions linger until the next
//! expiry sweep evicts them, so a late click still gets a precise
//! stale/lost-race answer rather than "unknown report".

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::classifier::ClassifierResult;
use crate::config::ModerationConfig;
use crate::error::{FlowError, FlowResult};
use crate::events::{EventBus, ModerationEvent, SharedEventBus};
use crate::flow::{ModeratorFlow, ModeratorInput, ReporterFlow, ReporterInput};
use crate::gateway::EscalationGateway;
use crate::notify::{MessageRef, NotificationSink, SurfaceId, UserRef};
use crate::session::{Lifecycle, ReportSession, SessionId, SessionSummary};
use crate::taxonomy::Taxonomy;

type SharedSession = Arc<Mutex<ReportSession>>;

/// Facade over both workflows, the gateway, and the session registry
pub struct ModerationEngine {
    taxonomy: Arc<Taxonomy>,
    config: Arc<ModerationConfig>,
    bus: SharedEventBus,
    gateway: Arc<EscalationGateway>,
    reporter: ReporterFlow,
    moderator: ModeratorFlow,
    sessions: RwLock<HashMap<SessionId, SharedSession>>,
}

impl ModerationEngine {
    pub fn new(
        taxonomy: Taxonomy,
        config: ModerationConfig,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let taxonomy = Arc::new(taxonomy);
        let config = Arc::new(config);
        let bus = EventBus::new().shared();
        let gateway = Arc::new(EscalationGateway::new(
            taxonomy.clone(),
            config.clone(),
            sink.clone(),
            bus.clone(),
        ));
        let reporter = ReporterFlow::new(
            taxonomy.clone(),
            config.clone(),
            sink.clone(),
            gateway.clone(),
            bus.clone(),
        );
        let moderator = ModeratorFlow::new(config.clone(), sink, bus.clone());

        Self {
            taxonomy,
            config,
            bus,
            gateway,
            reporter,
            moderator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The event bus, for operator dashboards and audit subscribers
    pub fn events(&self) -> &SharedEventBus {
        &self.bus
    }

    /// The taxonomy the engine was built with
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Open a manual report: create the session and render the first
    /// classification prompt on the reporter's surface.
    pub async fn open_report(
        &self,
        target: MessageRef,
        reporter: UserRef,
        reporter_surface: SurfaceId,
    ) -> FlowResult<SessionId> {
        let mut session = ReportSession::new_manual(target, reporter, reporter_surface);
        let id = session.id.clone();
        let community = session.community.clone();
        let origin = session.origin;

        self.reporter.open(&mut session).await?;

        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));

        self.bus.publish(ModerationEvent::SessionOpened {
            session_id: id.clone(),
            community: community.clone(),
            origin,
            timestamp: Utc::now(),
        });
        info!(session = %id, %community, "report session opened");
        Ok(id)
    }

    /// One reporter input, processed to completion
    pub async fn reporter_input(&self, id: &str, input: ReporterInput) -> FlowResult<()> {
        let handle = self.session_handle(id).await?;
        let mut session = handle.lock().await;
        self.reporter.handle(&mut session, input).await
    }

    /// One moderator input, processed to completion under the session lock
    pub async fn moderator_input(
        &self,
        id: &str,
        actor: &UserRef,
        input: ModeratorInput,
    ) -> FlowResult<()> {
        let handle = self.session_handle(id).await?;
        let mut session = handle.lock().await;
        self.moderator.handle(&mut session, actor, input).await
    }

    /// Explicit reporter-side cancellation
    pub async fn cancel(&self, id: &str) -> FlowResult<()> {
        let handle = self.session_handle(id).await?;
        let mut session = handle.lock().await;
        self.reporter.cancel(&mut session).await
    }

    /// Accept a classifier verdict. Returns the new session id, or `None`
    /// when the verdict was below threshold or had nowhere to go.
    pub async fn submit_automatic(
        &self,
        target: MessageRef,
        result: ClassifierResult,
    ) -> FlowResult<Option<SessionId>> {
        let Some(session) = self.gateway.submit_automatic(target, result).await? else {
            return Ok(None);
        };
        let id = session.id.clone();
        let community = session.community.clone();
        let origin = session.origin;

        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));

        self.bus.publish(ModerationEvent::SessionOpened {
            session_id: id.clone(),
            community,
            origin,
            timestamp: Utc::now(),
        });
        Ok(Some(id))
    }

    /// Read-only snapshot of all non-terminal sessions in one community
    pub async fn list_active(&self, community: &str) -> Vec<SessionSummary> {
        let handles: Vec<SharedSession> = self.sessions.read().await.values().cloned().collect();
        let mut summaries = Vec::new();
        for handle in handles {
            let session = handle.lock().await;
            if !session.is_terminal() && session.community == community {
                summaries.push(session.summary());
            }
        }
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        summaries
    }

    /// Clone of a session's current state, mainly for operator tooling
    pub async fn snapshot(&self, id: &str) -> Option<ReportSession> {
        let handle = self.sessions.read().await.get(id).cloned()?;
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Advisory-timeout sweep. Cancels collecting sessions idle past the
    /// reporter prompt timeout, releases claimed moderator flows idle past
    /// the optional moderator timeout, and evicts terminal sessions from the
    /// registry. Returns the number of sessions touched.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let entries: Vec<(SessionId, SharedSession)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, h)| (id.clone(), h.clone()))
            .collect();

        let reporter_timeout = self.config.reporter_prompt_timeout();
        let moderator_timeout = self.config.moderator_prompt_timeout();

        let mut touched = 0;
        let mut evict = Vec::new();
        for (id, handle) in entries {
            let mut session = handle.lock().await;
            if session.is_terminal() {
                evict.push((id, session.lifecycle, session.community.clone()));
                continue;
            }

            let idle = now.signed_duration_since(session.last_activity);
            if session.is_collecting() && idle > reporter_timeout {
                if self.reporter.expire(&mut session).await.is_ok() {
                    touched += 1;
                }
                continue;
            }
            if session.is_escalated() && session.handler.is_some() {
                if let Some(timeout) = moderator_timeout {
                    if idle > timeout && self.moderator.release(&mut session).await.is_ok() {
                        touched += 1;
                    }
                }
            }
        }

        if !evict.is_empty() {
            let mut sessions = self.sessions.write().await;
            for (id, lifecycle, community) in evict {
                sessions.remove(&id);
                if let Lifecycle::Closed { outcome } = lifecycle {
                    self.bus.publish(ModerationEvent::SessionClosed {
                        session_id: id.clone(),
                        community,
                        outcome,
                        timestamp: now,
                    });
                }
                debug!(session = %id, "terminal session evicted");
            }
        }
        touched
    }

    async fn session_handle(&self, id: &str) -> FlowResult<SharedSession> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| FlowError::unknown(id))
    }
}
