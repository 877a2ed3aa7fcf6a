//! Page automation capability shared by the odds and ranking scrapers.
//!
//! The scrapers never talk to Chrome directly. They drive a [`PageSession`],
//! which addresses every embedded sub-document through a [`FrameHandle`]
//! and answers element queries, text reads and clicks inside that frame.
//! [`chrome::ChromeSession`] is the real implementation; the `fake` feature
//! exposes an in-memory page for tests.

pub mod chrome;
pub mod env;
pub mod poll;
mod cdp;
mod script;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use chrome::{ChromeLauncher, ChromeSession, LaunchConfig};
pub use poll::{poll_until, PollPolicy};

/// Address of one document inside the page: the chain of child indices from
/// the top window (`window.frames[i].frames[j]...`). The empty path is the
/// top document. `id` is the browser's own frame id when the frame tree came
/// from the devtools protocol; it reaches the frame whatever its origin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle {
    pub path: Vec<usize>,
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl FrameHandle {
    pub fn main() -> Self {
        Self { path: Vec::new(), name: String::new(), id: None }
    }

    pub fn is_main(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_main() {
            return write!(f, "main");
        }
        let path = self.path.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(".");
        if self.name.is_empty() {
            write!(f, "frame[{path}]")
        } else {
            write!(f, "{}[{path}]", self.name)
        }
    }
}

/// One automated browser page. Every call is a suspension point; none of them
/// block the async runtime.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigates the top document and waits until it has loaded.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// All documents of the page in the page's own order, top document first.
    async fn frames(&self) -> Result<Vec<FrameHandle>>;

    /// `true` when the handle no longer resolves to a live document.
    async fn is_detached(&self, frame: &FrameHandle) -> bool;

    async fn is_closed(&self) -> bool;

    /// Human readiness signal (`window._scraperReady === true` on the top document).
    async fn ready_flag(&self) -> Result<bool>;

    /// Number of elements matching `selector` inside the frame.
    async fn count(&self, frame: &FrameHandle, selector: &str) -> Result<usize>;

    /// Visible text of the first element matching `selector`.
    async fn text_of(&self, frame: &FrameHandle, selector: &str) -> Result<Option<String>>;

    /// Visible texts of every element matching each selector, concatenated in
    /// selector order.
    async fn texts_of(&self, frame: &FrameHandle, selectors: &[&str]) -> Result<Vec<String>>;

    /// Clicks the first element matching `selector`. `false` when none matched.
    async fn click(&self, frame: &FrameHandle, selector: &str) -> Result<bool>;

    /// Clicks the first element matching `selector` whose text contains any of
    /// `tokens` (case-insensitive). Empty `tokens` accepts the first element.
    async fn click_containing(&self, frame: &FrameHandle, selector: &str, tokens: &[String]) -> Result<bool>;

    /// Clicks the `index`-th element matching `selector`.
    async fn click_nth(&self, frame: &FrameHandle, selector: &str, index: usize) -> Result<bool>;

    /// Flattened visible text of the frame's body.
    async fn body_text(&self, frame: &FrameHandle) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// Runs a raw script against the top document and returns its JSON value.
    async fn run_script(&self, script: &str) -> Result<serde_json::Value>;

    /// Releases the page. Safe to call more than once.
    async fn close(&self) -> Result<()>;
}

/// Acquires a fresh session for one invocation.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageSession>>;
}

/// First frame (in page order) exposing `selector`. Frames that fail the query
/// are skipped.
pub async fn find_frame_with(session: &dyn PageSession, selector: &str) -> Option<FrameHandle> {
    let frames = session.frames().await.ok()?;
    for frame in frames {
        if matches!(session.count(&frame, selector).await, Ok(n) if n > 0) {
            return Some(frame);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_handle_display() {
        assert_eq!(FrameHandle::main().to_string(), "main");
        let child = FrameHandle { path: vec![1, 0], name: "mainIframe".into(), id: Some("7F3A".into()) };
        assert_eq!(child.to_string(), "mainIframe[1.0]");
        let anon = FrameHandle { path: vec![2], name: String::new(), id: None };
        assert_eq!(anon.to_string(), "frame[2]");
    }
}
