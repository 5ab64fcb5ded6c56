use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use autorpa_protocols::{
    CapabilityProvider, ContextOptions, EngineKind, LaunchOptions, PageClosedCallback, PageHandle,
    ProviderError, SessionError,
};

use super::{Session, SessionInfo, SessionRequest};
use crate::events::{CloseReason, SessionEvent};
use crate::registry::BaseRegistry;

const EVENT_CAPACITY: usize = 64;

/// Tracks live sessions by id and owns their provider resources.
///
/// Ids are `S1`, `S2`, ... in creation order, never reused by one registry.
pub struct SessionRegistry {
    provider: Arc<dyn CapabilityProvider>,
    sessions: BaseRegistry<Session>,
    next_id: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionRegistry {
    pub fn new(provider: Arc<dyn CapabilityProvider>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            provider,
            sessions: BaseRegistry::new(),
            next_id: AtomicU64::new(1),
            events,
        })
    }

    pub fn provider(&self) -> &Arc<dyn CapabilityProvider> {
        &self.provider
    }

    /// Receive `session-closed` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Launch a browser, open a context and a first page, and register the
    /// result. Nothing is registered if any provider call fails.
    pub async fn create_session(
        self: &Arc<Self>,
        request: &SessionRequest,
    ) -> Result<Arc<Session>, SessionError> {
        let mut args = request.launch_args.clone();
        args.extend(request.window.launch_args());
        let launch = LaunchOptions {
            headless: request.headless,
            args,
        };

        debug!(
            "Launching {} (headless={}, private={})",
            request.engine, request.headless, request.private
        );
        let browser = self.provider.launch(request.engine, &launch).await?;

        let opened = async {
            let context = self
                .provider
                .new_context(
                    &browser,
                    &ContextOptions {
                        viewport: request.window.viewport(request.default_viewport),
                        isolated: request.private,
                    },
                )
                .await?;
            let page = self.provider.new_page(&context).await?;
            Ok::<_, ProviderError>((context, page))
        }
        .await;

        let (context, page) = match opened {
            Ok(handles) => handles,
            Err(e) => {
                if let Err(close_err) = self.provider.close(&browser).await {
                    warn!("Failed to close half-opened browser {}: {}", browser, close_err);
                }
                return Err(e.into());
            }
        };

        let id = format!("S{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let session = Arc::new(Session::new(
            id.clone(),
            request.engine,
            request.private,
            browser,
            context,
            page.clone(),
        ));
        self.register(session.clone())?;

        if let Err(e) = self
            .provider
            .on_page_closed(&page, self.page_closed_callback(&id))
            .await
        {
            warn!("Session {} will not auto-close: {}", id, e);
        }

        info!("Session {} opened ({})", id, request.engine);
        Ok(session)
    }

    fn page_closed_callback(self: &Arc<Self>, session_id: &str) -> PageClosedCallback {
        let registry = Arc::downgrade(self);
        let session_id = session_id.to_string();
        Arc::new(move |page: PageHandle| {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let session_id = session_id.clone();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    debug!("Page {} of session {} closed", page, session_id);
                    handle.spawn(async move {
                        registry.on_all_pages_closed(&session_id).await;
                    });
                }
                Err(_) => warn!(
                    "Page {} of session {} closed outside a runtime; ignoring",
                    page, session_id
                ),
            }
        })
    }

    /// First idle non-private session of `engine`, earliest-created wins.
    /// Sessions another step currently holds are skipped. A private
    /// request never reuses anything.
    pub fn find_reusable(&self, engine: EngineKind, private: bool) -> Option<String> {
        if private {
            return None;
        }
        self.sessions
            .find(|s| s.engine() == engine && !s.is_private() && !s.is_busy())
            .map(|s| s.id().to_string())
    }

    pub fn register(&self, session: Arc<Session>) -> Result<(), SessionError> {
        let id = session.id().to_string();
        self.sessions
            .register(session)
            .map_err(|_| SessionError::DuplicateSession(id))
    }

    /// Drop a session from the map without touching its browser or
    /// notifying anyone.
    pub fn unregister(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(session_id)
    }

    pub fn get(&self, session_id: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains(session_id)
    }

    /// Ids in creation order.
    pub fn list_ids(&self) -> Vec<String> {
        self.sessions.list_ids()
    }

    pub fn list(&self) -> Vec<SessionInfo> {
        self.sessions.values().iter().map(|s| s.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Close a session on request.
    ///
    /// Unknown ids fail with [`SessionError::UnknownSession`] and change nothing.
    pub async fn close_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.close_with_reason(session_id, CloseReason::Requested)
            .await
    }

    pub async fn close_with_reason(
        &self,
        session_id: &str,
        reason: CloseReason,
    ) -> Result<(), SessionError> {
        match self.retire(session_id, reason).await {
            Some(result) => result.map_err(SessionError::from),
            None => Err(SessionError::UnknownSession(session_id.to_string())),
        }
    }

    /// Page-close notification handler. Closes the session once it has no
    /// pages left. Returns whether this call closed it.
    ///
    /// Calling it for a session that is already gone does nothing.
    pub async fn on_all_pages_closed(&self, session_id: &str) -> bool {
        let Some(session) = self.sessions.get(session_id) else {
            debug!("Page-close notice for unknown session {}", session_id);
            return false;
        };

        let remaining = match self.provider.list_pages(session.context()).await {
            Ok(pages) => pages,
            Err(e) => {
                debug!("Listing pages of {} failed, treating as empty: {}", session_id, e);
                Vec::new()
            }
        };

        if let Some(last) = remaining.last() {
            if !remaining.contains(&session.current_page()) {
                session.set_current_page(last.clone());
            }
            return false;
        }

        self.retire(session_id, CloseReason::AllPagesClosed)
            .await
            .is_some()
    }

    /// Close every session.
    pub async fn close_all(&self) {
        for id in self.sessions.list_ids() {
            if let Some(Err(e)) = self.retire(&id, CloseReason::Shutdown).await {
                warn!("Closing session {} failed: {}", id, e);
            }
        }
    }

    /// The single mutation entry point for closing. Whoever removes the
    /// session from the map closes its browser and broadcasts; later callers
    /// get `None`.
    async fn retire(
        &self,
        session_id: &str,
        reason: CloseReason,
    ) -> Option<Result<(), ProviderError>> {
        let session = self.sessions.remove(session_id)?;

        let closed = self.provider.close(session.browser()).await;
        if let Err(e) = &closed {
            warn!("Browser of session {} did not close cleanly: {}", session_id, e);
        }

        // No subscribers is fine.
        let _ = self.events.send(SessionEvent::SessionClosed {
            session_id: session_id.to_string(),
            reason,
        });
        info!("Session {} closed ({:?})", session_id, reason);
        Some(closed)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
