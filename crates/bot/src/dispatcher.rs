//! Request dispatch.
//!
//! For every inbound message: count it, check the caller, parse it, advance
//! the chat's session, then do the I/O the session asked for in a task of
//! its own. Admission runs on the receive loop so a chat's session sees its
//! messages in arrival order; only resolution and replies run concurrently.
//! Short links are the exception: their transition is applied once the link
//! is expanded.

use crate::access::{Access, AccessPolicy, Role};
use crate::orders::{NotFound, OrderStatusLookup};
use crate::parse::{extract, extract_coordinates, Extracted};
use crate::ports::{InboundMessage, InboundPort, OutboundMessage, OutboundPort, Payload};
use crate::report;
use crate::service::FeasibilityService;
use crate::session::{Action, Session, SessionEvent, SessionState};
use lastmile_core::config::Config;
use lastmile_core::{Error, ErrorCode, Result};
use lastmile_geo::Coordinate;
use lastmile_routing::{HttpLinkResolver, LinkResolver, ShortLinkExpander};
use lastmile_telemetry::{names, request_id};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{debug, info_span, warn, Instrument};

/// Expander over any resolver
pub type LinkExpander = ShortLinkExpander<Box<dyn LinkResolver>>;

/// Work left after a message was admitted.
#[derive(Debug)]
enum Job {
    /// Reply to a rejected caller
    Reject(OutboundMessage),
    /// Carry out a session action
    Act { chat_id: String, role: Role, action: Action },
    /// Expand a short link, then treat the result as a location
    Expand { chat_id: String, role: Role, url: String },
}

struct Inner {
    service: FeasibilityService,
    access: AccessPolicy,
    links: Option<LinkExpander>,
    orders: Arc<dyn OrderStatusLookup>,
    outbound: Arc<dyn OutboundPort>,
    sessions: Mutex<HashMap<String, Session>>,
    interactive: bool,
    acknowledge: bool,
}

/// Routes inbound messages to the feasibility service and replies.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Start building a dispatcher.
    pub fn builder(service: FeasibilityService, outbound: Arc<dyn OutboundPort>) -> DispatcherBuilder {
        DispatcherBuilder {
            service,
            outbound,
            access: AccessPolicy::open(),
            links: None,
            orders: Arc::new(NotFound),
            interactive: false,
            acknowledge: false,
        }
    }

    /// Dispatcher with access, session and acknowledgement settings from
    /// configuration and HTTP short-link expansion.
    pub fn from_config(config: &Config, service: FeasibilityService, outbound: Arc<dyn OutboundPort>) -> Result<Self> {
        let resolver = HttpLinkResolver::new(config.routing_timeout())
            .map_err(|e| Error::config("cannot build short-link resolver").with_source(e))?;
        let resolver: Box<dyn LinkResolver> = Box::new(resolver);

        Ok(Self::builder(service, outbound)
            .access(AccessPolicy::from_config(&config.schema.access))
            .links(ShortLinkExpander::new(resolver))
            .interactive(config.schema.session.interactive)
            .acknowledge(config.schema.general.acknowledge)
            .build())
    }

    /// The feasibility service
    pub fn service(&self) -> &FeasibilityService {
        &self.inner.service
    }

    /// Current session state of a chat
    pub fn session_state(&self, chat_id: &str) -> SessionState {
        self.sessions()
            .get(chat_id)
            .map(|s| s.state().clone())
            .unwrap_or_default()
    }

    /// Receive until the inbound port closes, handling each message in its
    /// own task. Returns the number of messages received.
    pub async fn run<I: InboundPort>(&self, mut inbound: I) -> usize {
        let mut tasks = JoinSet::new();
        let mut received = 0;

        loop {
            tokio::select! {
                message = inbound.recv() => {
                    let Some(message) = message else { break };
                    received += 1;
                    if let Some((job, span)) = self.admit(message) {
                        let this = self.clone();
                        tasks.spawn(async move { this.execute(job).await }.instrument(span));
                    }
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!(error = %e, "Request task failed");
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Request task failed");
            }
        }
        debug!(received, "Inbound closed");
        received
    }

    /// Handle one message to completion.
    pub async fn handle(&self, message: InboundMessage) {
        if let Some((job, span)) = self.admit(message) {
            self.execute(job).instrument(span).await;
        }
    }

    fn admit(&self, message: InboundMessage) -> Option<(Job, tracing::Span)> {
        let metrics = self.inner.service.metrics();
        metrics.increment(names::REQUESTS_TOTAL);
        let span = info_span!("request", request_id = %request_id(), chat_id = %message.chat_id);
        let guard = span.enter();

        let role = match self.inner.access.check(&message.chat_id) {
            Access::Granted(role) => role,
            Access::Denied(reply) => {
                metrics.increment(names::REQUESTS_REJECTED);
                debug!(code = %ErrorCode::UnauthorizedCaller, "Caller not on the allow-list");
                let reply = reply.map(|text| Job::Reject(OutboundMessage::new(message.chat_id, text)));
                drop(guard);
                return reply.map(|job| (job, span));
            }
        };

        let event = match message.payload {
            Payload::Location { latitude, longitude } => {
                let point = Coordinate::new(latitude, longitude);
                if !point.is_valid() {
                    metrics.increment(names::REQUESTS_IGNORED);
                    debug!(%latitude, %longitude, "Shared location out of range");
                    return None;
                }
                SessionEvent::Location(point)
            }
            Payload::Text { text } => match extract(&text) {
                Some(Extracted::Point(point)) => SessionEvent::Location(point),
                Some(Extracted::ShortLink(url)) if self.inner.links.is_some() => {
                    drop(guard);
                    let job = Job::Expand {
                        chat_id: message.chat_id,
                        role,
                        url,
                    };
                    return Some((job, span));
                }
                _ => SessionEvent::Text(text),
            },
        };

        let action = self.advance(&message.chat_id, event);
        if action == Action::Ignore {
            metrics.increment(names::REQUESTS_IGNORED);
            debug!("Nothing to do for message");
            return None;
        }

        drop(guard);
        let job = Job::Act {
            chat_id: message.chat_id,
            role,
            action,
        };
        Some((job, span))
    }

    fn advance(&self, chat_id: &str, event: SessionEvent) -> Action {
        let mut sessions = self.sessions();
        let session = sessions.entry(chat_id.to_string()).or_default();
        let action = session.advance(event, self.inner.interactive);
        if *session.state() == SessionState::AwaitingLocation {
            sessions.remove(chat_id);
        }
        action
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.inner.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn execute(&self, job: Job) {
        match job {
            Job::Reject(reply) => self.send(reply).await,
            Job::Act { chat_id, role, action } => self.act(chat_id, role, action).await,
            Job::Expand { chat_id, role, url } => {
                let Some(point) = self.expand(&url).await else {
                    self.inner.service.metrics().increment(names::REQUESTS_IGNORED);
                    return;
                };
                let action = self.advance(&chat_id, SessionEvent::Location(point));
                self.act(chat_id, role, action).await;
            }
        }
    }

    async fn expand(&self, url: &str) -> Option<Coordinate> {
        let links = self.inner.links.as_ref()?;
        match links.expand(url).await {
            Ok(expanded) => {
                let point = extract_coordinates(&expanded);
                if point.is_none() {
                    debug!(url, expanded = %expanded, "Expanded link has no coordinates");
                }
                point
            }
            Err(e) => {
                warn!(url, error = %e, "Short link expansion failed");
                None
            }
        }
    }

    async fn act(&self, chat_id: String, role: Role, action: Action) {
        let text = match action {
            Action::Ignore => return,
            Action::OfferChoice(_) => report::CHOICE_PROMPT.to_string(),
            Action::AskForCode => report::CODE_PROMPT.to_string(),
            Action::LookupOrder(code) => {
                let status = self.inner.orders.status(&code).await;
                report::order_status(&code, status.as_deref())
            }
            Action::Check(point) => {
                if self.inner.acknowledge {
                    self.send(OutboundMessage::new(chat_id.clone(), report::acknowledgement(&point)))
                        .await;
                }
                let result = self.inner.service.check(point).await;
                report::render(&result, role)
            }
        };
        self.send(OutboundMessage::new(chat_id, text)).await;
    }

    async fn send(&self, message: OutboundMessage) {
        if let Err(e) = self.inner.outbound.send(message).await {
            warn!(code = %e.code, error = %e, "Reply not delivered");
        }
    }
}

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    service: FeasibilityService,
    outbound: Arc<dyn OutboundPort>,
    access: AccessPolicy,
    links: Option<LinkExpander>,
    orders: Arc<dyn OrderStatusLookup>,
    interactive: bool,
    acknowledge: bool,
}

impl DispatcherBuilder {
    /// Caller policy; open by default
    #[must_use]
    pub fn access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    /// Short-link expansion; without it short links are ignored
    #[must_use]
    pub fn links(mut self, links: LinkExpander) -> Self {
        self.links = Some(links);
        self
    }

    /// Order status lookup for the interactive flow
    #[must_use]
    pub fn orders(mut self, orders: Arc<dyn OrderStatusLookup>) -> Self {
        self.orders = orders;
        self
    }

    /// Offer the menu before answering a location
    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Send a processing acknowledgement before each result
    #[must_use]
    pub fn acknowledge(mut self, acknowledge: bool) -> Self {
        self.acknowledge = acknowledge;
        self
    }

    /// Finish
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            inner: Arc::new(Inner {
                service: self.service,
                access: self.access,
                links: self.links,
                orders: self.orders,
                outbound: self.outbound,
                sessions: Mutex::new(HashMap::new()),
                interactive: self.interactive,
                acknowledge: self.acknowledge,
            }),
        }
    }
}
