//! # Navigation Module
//!
//! Client-side single-page-app routing on top of the same pattern compiler and route
//! table the server uses.
//!
//! A [`Navigator`] owns a table of client routes, an ordered list of guards and a
//! [`History`]. It dispatches:
//!
//! - on [`Navigator::navigate`]: history is pushed (or replaced) first, then the path
//!   is dispatched
//! - on back/forward traversals reported by the history: the new current path is
//!   dispatched without touching history
//! - on document clicks passed to [`Navigator::handle_click`]: same-origin links with
//!   a matching route are intercepted (the default browser navigation is prevented);
//!   external, `mailto:`/`tel:`, fragment-only, download and new-tab links are left
//!   to the browser
//!
//! Handlers and guards are local futures and may suspend. Navigations are never
//! queued and never cancelled; exactly one current view is kept, and the
//! [`OverlapPolicy`] decides whose result wins when two navigations overlap.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use futures::executor::LocalPool;
//! use routewise::dispatcher::DispatchRequest;
//! use routewise::navigation::{MemoryHistory, NavigateOptions, Navigator};
//! use routewise::pattern::Params;
//! use url::Url;
//!
//! let mut pool = LocalPool::new();
//! let navigator = Navigator::builder()
//!     .route("/orders/:id", |_req: DispatchRequest, params: Params| async move {
//!         anyhow::Ok(format!("order {}", params.get("id").unwrap_or_default()))
//!     })
//!     .unwrap()
//!     .build(
//!         Rc::new(MemoryHistory::default()),
//!         pool.spawner(),
//!         Url::parse("https://shop.example").unwrap(),
//!     );
//!
//! let nav = navigator.navigate("/orders/7", NavigateOptions::default());
//! pool.run_until(nav);
//!
//! let route = navigator.current_route().unwrap();
//! assert_eq!(route.template, "/orders/:id");
//! assert_eq!(route.params.get("id"), Some("7"));
//! ```

mod core;
mod history;
mod links;

pub use core::{
    guard_fn, ActiveRoute, GuardFn, NavGuard, NavHandler, NavigateOptions, Navigation,
    NavigationOutcome, Navigator, NavigatorBuilder, OverlapPolicy, View, MAX_REDIRECTS,
};
pub use history::{History, HistoryListener, ListenerId, MemoryHistory};
pub use links::{classify_click, BrowserReason, ClickEvent, LinkTarget};
