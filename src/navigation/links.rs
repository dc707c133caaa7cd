use std::fmt;

use url::Url;

/// A click on an anchor element, as seen by a document-level listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickEvent {
    /// Raw `href` attribute, if any
    pub href: Option<String>,
    /// `target` attribute (`_blank`, `_self`, a frame name, ...)
    pub target: Option<String>,
    /// `download` attribute present
    pub download: bool,
    /// `rel` attribute
    pub rel: Option<String>,
    /// Mouse button; 0 is the primary button
    pub button: i16,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub alt_key: bool,
    /// Set once a listener has taken over the click
    pub default_prevented: bool,
}

impl ClickEvent {
    /// Plain primary-button click on a link to `href`
    #[must_use]
    pub fn link(href: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    #[must_use]
    pub fn with_rel(mut self, rel: &str) -> Self {
        self.rel = Some(rel.to_string());
        self
    }

    #[must_use]
    pub fn with_download(mut self) -> Self {
        self.download = true;
        self
    }

    #[must_use]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl_key = true;
        self
    }

    #[must_use]
    pub fn with_button(mut self, button: i16) -> Self {
        self.button = button;
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }
}

/// Why a click is left to the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserReason {
    AlreadyHandled,
    NotPrimaryButton,
    ModifierKey,
    NewContext,
    Download,
    RelExternal,
    MissingHref,
    FragmentOnly,
    SpecialScheme,
    CrossOrigin,
    Unparsable,
}

impl fmt::Display for BrowserReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BrowserReason::AlreadyHandled => "already handled",
            BrowserReason::NotPrimaryButton => "not the primary button",
            BrowserReason::ModifierKey => "modifier key held",
            BrowserReason::NewContext => "opens a new browsing context",
            BrowserReason::Download => "download link",
            BrowserReason::RelExternal => "rel=external",
            BrowserReason::MissingHref => "no href",
            BrowserReason::FragmentOnly => "in-page fragment",
            BrowserReason::SpecialScheme => "non-http scheme",
            BrowserReason::CrossOrigin => "different origin",
            BrowserReason::Unparsable => "href does not resolve",
        };
        f.write_str(s)
    }
}

/// Where a clicked link should be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Same-origin link; carries the resolved path with its query string
    InApp(String),
    /// Leave the default browser behavior alone
    Browser(BrowserReason),
}

/// Classify a click against the app `origin` and the current in-app path.
///
/// Relative hrefs resolve against the current path the way a browser would:
///
/// ```
/// use routewise::navigation::{classify_click, ClickEvent, LinkTarget};
/// use url::Url;
///
/// let origin = Url::parse("https://shop.example").unwrap();
/// let target = classify_click(&ClickEvent::link("42?tab=lines"), &origin, "/orders/7");
/// assert_eq!(target, LinkTarget::InApp("/orders/42?tab=lines".into()));
/// ```
#[must_use]
pub fn classify_click(event: &ClickEvent, origin: &Url, current_path: &str) -> LinkTarget {
    use BrowserReason::*;

    if event.default_prevented {
        return LinkTarget::Browser(AlreadyHandled);
    }
    if event.button != 0 {
        return LinkTarget::Browser(NotPrimaryButton);
    }
    if event.ctrl_key || event.meta_key || event.shift_key || event.alt_key {
        return LinkTarget::Browser(ModifierKey);
    }
    if let Some(target) = event.target.as_deref() {
        if !target.is_empty() && !target.eq_ignore_ascii_case("_self") {
            return LinkTarget::Browser(NewContext);
        }
    }
    if event.download {
        return LinkTarget::Browser(Download);
    }
    if let Some(rel) = event.rel.as_deref() {
        if rel.split_ascii_whitespace().any(|r| r.eq_ignore_ascii_case("external")) {
            return LinkTarget::Browser(RelExternal);
        }
    }
    let Some(href) = event.href.as_deref().map(str::trim).filter(|h| !h.is_empty()) else {
        return LinkTarget::Browser(MissingHref);
    };
    if href.starts_with('#') {
        return LinkTarget::Browser(FragmentOnly);
    }

    let Ok(base) = origin.join(current_path) else {
        return LinkTarget::Browser(Unparsable);
    };
    let Ok(resolved) = base.join(href) else {
        return LinkTarget::Browser(Unparsable);
    };
    if !matches!(resolved.scheme(), "http" | "https") {
        return LinkTarget::Browser(SpecialScheme);
    }
    if resolved.origin() != origin.origin() {
        return LinkTarget::Browser(CrossOrigin);
    }
    if resolved.fragment().is_some()
        && resolved.path() == base.path()
        && resolved.query() == base.query()
    {
        return LinkTarget::Browser(FragmentOnly);
    }

    let path = match resolved.query() {
        Some(query) => format!("{}?{}", resolved.path(), query),
        None => resolved.path().to_string(),
    };
    LinkTarget::InApp(path)
}
