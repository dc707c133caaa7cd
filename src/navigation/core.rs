use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::FutureExt;
use http::Method;
use tracing::{debug, error, info, warn};
use url::Url;

use super::history::{History, ListenerId};
use super::links::{classify_click, ClickEvent, LinkTarget};
use crate::dispatcher::{DispatchRequest, DispatchResponse, HandlerOutput};
use crate::middleware::core::panic_message;
use crate::middleware::{Middleware, Next};
use crate::pattern::Params;
use crate::router::{RouteError, RouteOptions, RouteTable};

/// Redirect hops a single navigation follows before giving up
pub const MAX_REDIRECTS: usize = 8;

/// A client route handler. May suspend.
pub trait NavHandler {
    fn call(&self, req: DispatchRequest, params: Params)
        -> LocalBoxFuture<'static, anyhow::Result<HandlerOutput>>;
}

impl<F, Fut, R> NavHandler for F
where
    F: Fn(DispatchRequest, Params) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<R>> + 'static,
    R: Into<HandlerOutput> + 'static,
{
    fn call(
        &self,
        req: DispatchRequest,
        params: Params,
    ) -> LocalBoxFuture<'static, anyhow::Result<HandlerOutput>> {
        (self)(req, params).map(|r| r.map(Into::into)).boxed_local()
    }
}

/// A client navigation guard. May suspend.
///
/// Every server [`Middleware`] is a guard as well, so the same session or CSRF step
/// can protect both sides.
pub trait NavGuard {
    fn name(&self) -> &str;

    fn check(&self, req: DispatchRequest) -> LocalBoxFuture<'static, anyhow::Result<Next>>;
}

impl<M: Middleware + ?Sized> NavGuard for M {
    fn name(&self) -> &str {
        Middleware::name(self)
    }

    fn check(&self, req: DispatchRequest) -> LocalBoxFuture<'static, anyhow::Result<Next>> {
        future::ready(self.before(req)).boxed_local()
    }
}

/// Guard built from an async closure; see [`guard_fn`]
pub struct GuardFn<F> {
    name: String,
    f: F,
}

impl<F, Fut> NavGuard for GuardFn<F>
where
    F: Fn(DispatchRequest) -> Fut,
    Fut: Future<Output = anyhow::Result<Next>> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, req: DispatchRequest) -> LocalBoxFuture<'static, anyhow::Result<Next>> {
        (self.f)(req).boxed_local()
    }
}

pub fn guard_fn<F, Fut>(name: &str, f: F) -> GuardFn<F>
where
    F: Fn(DispatchRequest) -> Fut,
    Fut: Future<Output = anyhow::Result<Next>> + 'static,
{
    GuardFn {
        name: name.to_string(),
        f,
    }
}

/// Which result becomes current when navigations overlap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Whichever navigation resolves last overwrites the current route, even if it
    /// was started first
    #[default]
    LastResolvedWins,
    /// Results of navigations superseded by a later `navigate` are discarded
    LatestStartedWins,
}

/// A successfully dispatched route
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    /// Path that was dispatched, query string included
    pub path: String,
    pub name: Option<String>,
    pub template: String,
    pub params: Params,
    pub response: DispatchResponse,
}

/// What the navigator currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Route(Rc<ActiveRoute>),
    NotFound {
        path: String,
        response: DispatchResponse,
    },
    Error {
        path: String,
        response: DispatchResponse,
    },
}

impl View {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            View::Route(r) => &r.path,
            View::NotFound { path, .. } | View::Error { path, .. } => path,
        }
    }

    #[must_use]
    pub fn response(&self) -> &DispatchResponse {
        match self {
            View::Route(r) => &r.response,
            View::NotFound { response, .. } | View::Error { response, .. } => response,
        }
    }
}

/// How a navigation ended
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// The result became the current view
    Committed(View),
    /// A guard stopped the navigation; the current view is unchanged
    Halted {
        step: String,
        response: DispatchResponse,
    },
    /// A later navigation started first and this result was discarded
    Superseded,
    /// The navigator was torn down or its executor is gone
    Ignored,
}

/// Completion handle for a spawned navigation.
///
/// Dropping it does not cancel the navigation.
#[must_use = "a navigation runs whether or not its handle is awaited"]
pub struct Navigation {
    rx: Option<oneshot::Receiver<NavigationOutcome>>,
}

impl Navigation {
    fn ignored() -> Self {
        Self { rx: None }
    }
}

impl Future for Navigation {
    type Output = NavigationOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(NavigationOutcome::Ignored);
        };
        match rx.poll_unpin(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(NavigationOutcome::Ignored),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Options for [`Navigator::navigate`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigateOptions {
    /// Replace the current history entry instead of pushing a new one
    pub replace: bool,
}

type ClientNotFound = dyn Fn(&DispatchRequest) -> DispatchResponse;
type ClientErrorHook = dyn Fn(&DispatchRequest, &anyhow::Error) -> DispatchResponse;

/// Collects client routes and guards before the navigator starts listening.
#[derive(Default)]
pub struct NavigatorBuilder {
    table: RouteTable<Rc<dyn NavHandler>>,
    guards: Vec<Rc<dyn NavGuard>>,
    not_found: Option<Rc<ClientNotFound>>,
    on_error: Option<Rc<ClientErrorHook>>,
    policy: OverlapPolicy,
}

impl NavigatorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client route.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for malformed templates.
    pub fn route(self, template: &str, handler: impl NavHandler + 'static) -> Result<Self, RouteError> {
        self.route_with(template, RouteOptions::default(), handler)
    }

    /// Register a client route with a name and guard exemptions.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for malformed templates.
    pub fn route_with(
        mut self,
        template: &str,
        options: RouteOptions,
        handler: impl NavHandler + 'static,
    ) -> Result<Self, RouteError> {
        let handler: Rc<dyn NavHandler> = Rc::new(handler);
        self.table
            .register_with(Method::GET, template, options, handler)?;
        Ok(self)
    }

    /// Append a guard; guards run in the order they are added
    #[must_use]
    pub fn guard(mut self, guard: impl NavGuard + 'static) -> Self {
        self.guards.push(Rc::new(guard));
        self
    }

    #[must_use]
    pub fn not_found<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DispatchRequest) -> DispatchResponse + 'static,
    {
        self.not_found = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DispatchRequest, &anyhow::Error) -> DispatchResponse + 'static,
    {
        self.on_error = Some(Rc::new(hook));
        self
    }

    #[must_use]
    pub fn overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start listening to `history` and spawn navigations on `spawner`.
    ///
    /// `origin` decides which clicked links stay in the app.
    pub fn build(
        self,
        history: Rc<dyn History>,
        spawner: impl LocalSpawn + 'static,
        origin: Url,
    ) -> Navigator {
        let inner = Rc::new(Inner {
            table: self.table,
            guards: self.guards,
            not_found: self.not_found,
            on_error: self.on_error,
            policy: self.policy,
            history,
            spawner: Box::new(spawner),
            origin,
            started: Cell::new(0),
            view: RefCell::new(None),
            listener: Cell::new(None),
            torn_down: Cell::new(false),
        });

        let weak: Weak<Inner> = Rc::downgrade(&inner);
        let id = inner.history.subscribe(Rc::new(move |path: &str| {
            if let Some(inner) = weak.upgrade() {
                // N1: History traversal
                debug!(path = %path, "History traversal");
                drop(Inner::spawn(&inner, path.to_string()));
            }
        }));
        inner.listener.set(Some(id));

        Navigator { inner }
    }
}

struct Inner {
    table: RouteTable<Rc<dyn NavHandler>>,
    guards: Vec<Rc<dyn NavGuard>>,
    not_found: Option<Rc<ClientNotFound>>,
    on_error: Option<Rc<ClientErrorHook>>,
    policy: OverlapPolicy,
    history: Rc<dyn History>,
    spawner: Box<dyn LocalSpawn>,
    origin: Url,
    /// Generation of the most recently started navigation
    started: Cell<u64>,
    view: RefCell<Option<View>>,
    listener: Cell<Option<ListenerId>>,
    torn_down: Cell<bool>,
}

enum Step {
    Done(NavigationOutcome),
    Redirect(String),
}

impl Inner {
    fn spawn(inner: &Rc<Self>, path: String) -> Navigation {
        if inner.torn_down.get() {
            return Navigation::ignored();
        }
        let generation = inner.started.get() + 1;
        inner.started.set(generation);

        let (tx, rx) = oneshot::channel();
        let task_inner = Rc::clone(inner);
        let task = async move {
            let outcome = Inner::run(&task_inner, path, generation).await;
            // The handle may have been dropped; the navigation still completed
            let _ = tx.send(outcome);
        };
        match inner.spawner.spawn_local(task) {
            Ok(()) => Navigation { rx: Some(rx) },
            Err(e) => {
                error!(error = %e, "Executor refused navigation");
                Navigation::ignored()
            }
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.policy == OverlapPolicy::LatestStartedWins && generation != self.started.get()
    }

    async fn run(inner: &Rc<Self>, path: String, generation: u64) -> NavigationOutcome {
        let mut target = path;
        let mut hops = 0;
        loop {
            match Inner::dispatch_once(inner, &target, generation).await {
                Step::Done(outcome) => return outcome,
                Step::Redirect(location) if hops < MAX_REDIRECTS => {
                    hops += 1;
                    if inner.torn_down.get() {
                        return NavigationOutcome::Ignored;
                    }
                    if inner.is_stale(generation) {
                        debug!(generation, from = %target, to = %location, "Stale redirect discarded");
                        return NavigationOutcome::Superseded;
                    }
                    // N2: Guard redirect
                    info!(from = %target, to = %location, hops, "Navigation redirected");
                    inner.history.replace(location.clone());
                    target = location;
                }
                Step::Redirect(location) => {
                    warn!(
                        from = %target,
                        to = %location,
                        max = MAX_REDIRECTS,
                        "Redirect limit reached; navigation stopped"
                    );
                    return NavigationOutcome::Halted {
                        step: "redirect".to_string(),
                        response: DispatchResponse::redirect(&location),
                    };
                }
            }
        }
    }

    async fn dispatch_once(inner: &Rc<Self>, target: &str, generation: u64) -> Step {
        let req = DispatchRequest::from_target(Method::GET, target);
        let request_id = req.request_id();

        // N3: Navigation start
        debug!(request_id = %request_id, path = %target, generation, "Navigation started");

        let Some(matched) = inner.table.route(&Method::GET, req.path()) else {
            let response = match &inner.not_found {
                Some(hook) => hook(&req),
                None => DispatchResponse::not_found("GET", req.path()),
            };
            return Step::Done(inner.commit(
                generation,
                View::NotFound {
                    path: target.to_string(),
                    response,
                },
            ));
        };
        let route = matched.route;
        let params = matched.params;

        let mut current = req.clone();
        for guard in inner.guards.iter().filter(|g| !route.skips(g.name())) {
            let checked = AssertUnwindSafe(guard.check(current)).catch_unwind().await;
            current = match checked {
                Ok(Ok(Next::Continue(next))) => next,
                Ok(Ok(Next::Halt(response))) => {
                    if let Some(location) = response.location().filter(|_| response.is_redirect()) {
                        return Step::Redirect(location.to_string());
                    }
                    debug!(request_id = %request_id, guard = %guard.name(), "Navigation halted");
                    return Step::Done(NavigationOutcome::Halted {
                        step: guard.name().to_string(),
                        response,
                    });
                }
                Ok(Err(e)) => return Step::Done(inner.fault(generation, target, &req, &e)),
                Err(panic) => {
                    let e = anyhow::anyhow!(
                        "guard '{}' panicked: {}",
                        guard.name(),
                        panic_message(panic.as_ref())
                    );
                    return Step::Done(inner.fault(generation, target, &req, &e));
                }
            };
        }

        let handler = Rc::clone(route.handler());
        let handled = AssertUnwindSafe(handler.call(current, params.clone()))
            .catch_unwind()
            .await;
        let response = match handled {
            Ok(Ok(output)) => output.into_response(),
            Ok(Err(e)) => return Step::Done(inner.fault(generation, target, &req, &e)),
            Err(panic) => {
                let e = anyhow::anyhow!("handler panicked: {}", panic_message(panic.as_ref()));
                return Step::Done(inner.fault(generation, target, &req, &e));
            }
        };

        let active = ActiveRoute {
            path: target.to_string(),
            name: route.name().map(str::to_string),
            template: route.template().to_string(),
            params,
            response,
        };
        Step::Done(inner.commit(generation, View::Route(Rc::new(active))))
    }

    fn fault(
        &self,
        generation: u64,
        target: &str,
        req: &DispatchRequest,
        e: &anyhow::Error,
    ) -> NavigationOutcome {
        error!(request_id = %req.request_id(), path = %target, error = %e, "Navigation failed");
        let response = match &self.on_error {
            Some(hook) => hook(req, e),
            None => DispatchResponse::internal_error(),
        };
        self.commit(
            generation,
            View::Error {
                path: target.to_string(),
                response,
            },
        )
    }

    fn commit(&self, generation: u64, view: View) -> NavigationOutcome {
        if self.torn_down.get() {
            return NavigationOutcome::Ignored;
        }
        if self.is_stale(generation) {
            // N4: Result discarded
            debug!(
                generation,
                latest = self.started.get(),
                path = %view.path(),
                "Navigation result discarded"
            );
            return NavigationOutcome::Superseded;
        }
        // N5: Navigation complete
        info!(
            generation,
            path = %view.path(),
            status = view.response().status,
            "Navigation complete"
        );
        *self.view.borrow_mut() = Some(view.clone());
        NavigationOutcome::Committed(view)
    }
}

/// Client-side driver of the routing engine.
///
/// Translates history traversals and link clicks into dispatches against its own
/// route table and keeps exactly one current view. Single-threaded: handlers and
/// guards run as local futures on the supplied spawner and may suspend. Overlapping
/// navigations are never queued or cancelled; [`OverlapPolicy`] decides which result
/// becomes current.
#[derive(Clone)]
pub struct Navigator {
    inner: Rc<Inner>,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("routes", &self.inner.table.len())
            .field("guards", &self.inner.guards.len())
            .field("policy", &self.inner.policy)
            .field("origin", &self.inner.origin.as_str())
            .field("torn_down", &self.inner.torn_down.get())
            .finish()
    }
}

impl Navigator {
    #[must_use]
    pub fn builder() -> NavigatorBuilder {
        NavigatorBuilder::new()
    }

    /// Dispatch the current history entry without touching history
    pub fn start(&self) -> Navigation {
        Inner::spawn(&self.inner, self.inner.history.current_path())
    }

    /// Push (or replace) `path` in history, then dispatch it.
    ///
    /// History changes immediately; the returned handle resolves once the dispatch
    /// completes.
    pub fn navigate(&self, path: &str, options: NavigateOptions) -> Navigation {
        if self.inner.torn_down.get() {
            return Navigation::ignored();
        }
        if options.replace {
            self.inner.history.replace(path.to_string());
        } else {
            self.inner.history.push(path.to_string());
        }
        Inner::spawn(&self.inner, path.to_string())
    }

    /// Document click listener.
    ///
    /// Intercepts same-origin links whose path matches a route, marking the event as
    /// handled and navigating. Everything else is left to the browser and `None` is
    /// returned.
    pub fn handle_click(&self, event: &mut ClickEvent) -> Option<Navigation> {
        if self.inner.torn_down.get() {
            return None;
        }
        let current = self.inner.history.current_path();
        match classify_click(event, &self.inner.origin, &current) {
            LinkTarget::InApp(path) => {
                let bare = DispatchRequest::from_target(Method::GET, &path);
                if self.inner.table.route(&Method::GET, bare.path()).is_none() {
                    debug!(path = %path, "Link has no client route; leaving it to the browser");
                    return None;
                }
                event.prevent_default();
                Some(self.navigate(&path, NavigateOptions::default()))
            }
            LinkTarget::Browser(reason) => {
                debug!(href = ?event.href, reason = %reason, "Link left to the browser");
                None
            }
        }
    }

    /// Current view, if any navigation has completed
    #[must_use]
    pub fn current(&self) -> Option<View> {
        self.inner.view.borrow().clone()
    }

    /// Current route; `None` before the first dispatch and while a not-found or error
    /// view is shown
    #[must_use]
    pub fn current_route(&self) -> Option<Rc<ActiveRoute>> {
        match self.inner.view.borrow().as_ref() {
            Some(View::Route(route)) => Some(Rc::clone(route)),
            _ => None,
        }
    }

    #[must_use]
    pub fn history(&self) -> &Rc<dyn History> {
        &self.inner.history
    }

    /// Stop listening and clear state; later navigations resolve as ignored.
    pub fn teardown(&self) {
        if self.inner.torn_down.replace(true) {
            return;
        }
        if let Some(id) = self.inner.listener.take() {
            self.inner.history.unsubscribe(id);
        }
        self.inner.view.borrow_mut().take();
        info!("Navigator torn down");
    }
}
