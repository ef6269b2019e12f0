//! Blocked-address matching and the blocking stylesheet.
//!
//! The only state is the stylesheet itself: its element id doubles as the
//! "blocking applied" flag, so applying or removing twice is harmless.

use tracing::debug;
use url::Url;

use crate::error::ValidationError;
use crate::page::Page;
use crate::storage::Config;

/// Base used to resolve relative addresses handed to [`resolve_url`].
const RELATIVE_BASE: &str = "https://www.youtube.com/";

/// Parse an absolute address, or a relative one against the site root.
pub fn resolve_url(href: &str) -> Result<Url, ValidationError> {
    Url::parse(href)
        .or_else(|_| Url::parse(RELATIVE_BASE).and_then(|base| base.join(href)))
        .map_err(|e| ValidationError::InvalidUrl {
            url: href.into(),
            message: e.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockController {
    path_prefix: String,
    css_id: String,
    overlay_id: String,
}

impl BlockController {
    pub fn new(
        path_prefix: impl Into<String>,
        css_id: impl Into<String>,
        overlay_id: impl Into<String>,
    ) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            css_id: css_id.into(),
            overlay_id: overlay_id.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.blocking.path_prefix,
            &config.markers.blocking_css_id,
            &config.markers.warning_overlay_id,
        )
    }

    pub fn css_id(&self) -> &str {
        &self.css_id
    }

    /// Whether the address's path starts with the blocked prefix. Query
    /// and fragment are ignored; unparseable input is never blocked.
    pub fn is_blocked_url(&self, href: &str) -> bool {
        match resolve_url(href) {
            Ok(url) => url.path().starts_with(&self.path_prefix),
            Err(_) => false,
        }
    }

    /// [`is_blocked_url`](Self::is_blocked_url) for the active document.
    pub fn is_blocked(&self, page: &impl Page) -> bool {
        self.is_blocked_url(&page.href())
    }

    /// Hide everything in body except the warning overlay. Returns false
    /// when the stylesheet was already present.
    pub fn apply_block(&self, page: &mut impl Page) -> bool {
        if page.contains(&self.css_id) {
            debug!("blocking CSS already injected");
            return false;
        }
        page.inject_style(&self.css_id, &self.blocking_css());
        debug!("blocking CSS injected");
        true
    }

    /// Returns false when no stylesheet was present.
    pub fn remove_block(&self, page: &mut impl Page) -> bool {
        let removed = page.remove(&self.css_id);
        if removed {
            debug!("blocking CSS removed");
        }
        removed
    }

    pub fn blocking_css(&self) -> String {
        format!(
            "html, body {{ overflow: hidden !important; }}\n\
             body > *:not(#{}) {{ display: none !important; }}",
            self.overlay_id
        )
    }
}

impl Default for BlockController {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
