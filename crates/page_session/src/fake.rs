//! In-memory [`PageSession`] for tests.
//!
//! Frame 0 is the top document (`FrameHandle::main()`), frame `i` is
//! addressed as `path = [i - 1]`. Selectors are matched by exact string, so a
//! test registers elements under the same selector string the engine queries.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{FrameHandle, PageSession, SessionLauncher};

#[derive(Debug, Clone, Default)]
pub struct FakeFrame {
    pub name: String,
    pub body: String,
    pub elements: Vec<(String, String)>,
    /// Every query against this frame errors (crashed renderer, torn-down document).
    pub failing: bool,
    pub detached: bool,
    /// Left out of `frames()` but still reachable through an existing handle.
    pub hidden: bool,
}

impl FakeFrame {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    pub fn with(mut self, selector: &str, text: &str) -> Self {
        self.elements.push((selector.to_string(), text.to_string()));
        self
    }

    pub fn with_many(mut self, selector: &str, texts: &[&str]) -> Self {
        for t in texts {
            self.elements.push((selector.to_string(), t.to_string()));
        }
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    fn texts(&self, selector: &str) -> Vec<String> {
        self.elements
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

/// Page mutation applied when an element matching `selector` is clicked.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Replace the text of every `selector` element in `frame`.
    SetText { frame: usize, selector: String, text: String },
    SetBody { frame: usize, body: String },
    Remove { frame: usize, selector: String },
    /// Marks `frame` detached; later calls through the old handle fail.
    Detach { frame: usize },
    /// Appends a fresh frame (the reloaded document).
    AddFrame(FakeFrame),
    SetReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Click {
    pub frame: String,
    pub selector: String,
    pub text: String,
}

#[derive(Debug, Default)]
struct FakeState {
    frames: Vec<FakeFrame>,
    ready: bool,
    ready_after: Option<u32>,
    ready_checks: u32,
    closed: bool,
    close_calls: usize,
    title: String,
    navigations: Vec<String>,
    pages: HashMap<String, String>,
    fail_navigation: Option<String>,
    failing_urls: Vec<String>,
    effects: Vec<(String, Effect)>,
    clicks: Vec<Click>,
    scripts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new(frames: Vec<FakeFrame>) -> Self {
        let page = Self::default();
        page.lock().frames = frames;
        page
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_ready(&self, ready: bool) {
        self.lock().ready = ready;
    }

    /// The ready flag flips on at the `n`-th check.
    pub fn ready_after(&self, n: u32) {
        self.lock().ready_after = Some(n);
    }

    pub fn set_title(&self, title: &str) {
        self.lock().title = title.to_string();
    }

    /// Navigating to `url` replaces the top document's body with `body`.
    pub fn add_page(&self, url: &str, body: &str) {
        self.lock().pages.insert(url.to_string(), body.to_string());
    }

    /// Every navigation fails with `message`.
    pub fn fail_navigation(&self, message: &str) {
        self.lock().fail_navigation = Some(message.to_string());
    }

    pub fn fail_url(&self, url: &str) {
        self.lock().failing_urls.push(url.to_string());
    }

    /// Drops frame `index` from the frame listing; queries through a handle
    /// taken earlier keep working.
    pub fn hide_frame(&self, index: usize) {
        if let Some(f) = self.lock().frames.get_mut(index) {
            f.hidden = true;
        }
    }

    pub fn on_click(&self, selector: &str, effect: Effect) {
        self.lock().effects.push((selector.to_string(), effect));
    }

    pub fn clicks(&self) -> Vec<Click> {
        self.lock().clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    pub fn text(&self, frame: usize, selector: &str) -> Option<String> {
        self.lock().frames.get(frame)?.texts(selector).into_iter().next()
    }

    fn index_of(handle: &FrameHandle) -> usize {
        handle.path.first().map(|i| i + 1).unwrap_or(0)
    }

    fn handle_of(index: usize, frame: &FakeFrame) -> FrameHandle {
        FrameHandle {
            path: if index == 0 { Vec::new() } else { vec![index - 1] },
            name: frame.name.clone(),
            id: Some(format!("FRAME-{index}")),
        }
    }

    fn with_frame<T>(&self, handle: &FrameHandle, f: impl FnOnce(&FakeFrame) -> T) -> Result<T> {
        let state = self.lock();
        let frame = state
            .frames
            .get(Self::index_of(handle))
            .ok_or_else(|| anyhow!("frame detached"))?;
        if frame.detached {
            bail!("frame detached");
        }
        if frame.failing {
            bail!("Execution context was destroyed");
        }
        Ok(f(frame))
    }

    fn record_click(&self, handle: &FrameHandle, selector: &str, text: String) {
        let mut state = self.lock();
        state.clicks.push(Click {
            frame: handle.to_string(),
            selector: selector.to_string(),
            text,
        });
        let effects: Vec<Effect> = state
            .effects
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, e)| e.clone())
            .collect();
        for effect in effects {
            apply(&mut state, effect);
        }
    }
}

fn apply(state: &mut FakeState, effect: Effect) {
    match effect {
        Effect::SetText { frame, selector, text } => {
            if let Some(f) = state.frames.get_mut(frame) {
                for (s, t) in f.elements.iter_mut() {
                    if *s == selector {
                        *t = text.clone();
                    }
                }
            }
        }
        Effect::SetBody { frame, body } => {
            if let Some(f) = state.frames.get_mut(frame) {
                f.body = body;
            }
        }
        Effect::Remove { frame, selector } => {
            if let Some(f) = state.frames.get_mut(frame) {
                f.elements.retain(|(s, _)| *s != selector);
            }
        }
        Effect::Detach { frame } => {
            if let Some(f) = state.frames.get_mut(frame) {
                f.detached = true;
            }
        }
        Effect::AddFrame(frame) => state.frames.push(frame),
        Effect::SetReady => state.ready = true,
    }
}

#[async_trait]
impl PageSession for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        if let Some(msg) = state.fail_navigation.clone() {
            bail!("{msg}");
        }
        if state.failing_urls.iter().any(|u| u == url) {
            bail!("net::ERR_CONNECTION_RESET at {url}");
        }
        state.navigations.push(url.to_string());
        if let Some(body) = state.pages.get(url).cloned() {
            if state.frames.is_empty() {
                state.frames.push(FakeFrame::default());
            }
            state.frames[0].body = body;
        }
        Ok(())
    }

    async fn frames(&self) -> Result<Vec<FrameHandle>> {
        let state = self.lock();
        Ok(state
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.detached && !f.hidden)
            .map(|(i, f)| Self::handle_of(i, f))
            .collect())
    }

    async fn is_detached(&self, frame: &FrameHandle) -> bool {
        let state = self.lock();
        state
            .frames
            .get(Self::index_of(frame))
            .map_or(true, |f| f.detached)
    }

    async fn is_closed(&self) -> bool {
        self.lock().closed
    }

    async fn ready_flag(&self) -> Result<bool> {
        let mut state = self.lock();
        state.ready_checks += 1;
        if let Some(n) = state.ready_after {
            if state.ready_checks >= n {
                state.ready = true;
            }
        }
        Ok(state.ready)
    }

    async fn count(&self, frame: &FrameHandle, selector: &str) -> Result<usize> {
        self.with_frame(frame, |f| f.texts(selector).len())
    }

    async fn text_of(&self, frame: &FrameHandle, selector: &str) -> Result<Option<String>> {
        self.with_frame(frame, |f| f.texts(selector).into_iter().next())
    }

    async fn texts_of(&self, frame: &FrameHandle, selectors: &[&str]) -> Result<Vec<String>> {
        self.with_frame(frame, |f| selectors.iter().flat_map(|s| f.texts(s)).collect())
    }

    async fn click(&self, frame: &FrameHandle, selector: &str) -> Result<bool> {
        let Some(text) = self.with_frame(frame, |f| f.texts(selector).into_iter().next())? else {
            return Ok(false);
        };
        self.record_click(frame, selector, text);
        Ok(true)
    }

    async fn click_containing(&self, frame: &FrameHandle, selector: &str, tokens: &[String]) -> Result<bool> {
        let found = self.with_frame(frame, |f| {
            f.texts(selector).into_iter().find(|t| {
                let lower = t.to_lowercase();
                tokens.is_empty() || tokens.iter().any(|tok| lower.contains(&tok.to_lowercase()))
            })
        })?;
        match found {
            Some(text) => {
                self.record_click(frame, selector, text);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn click_nth(&self, frame: &FrameHandle, selector: &str, index: usize) -> Result<bool> {
        let Some(text) = self.with_frame(frame, |f| f.texts(selector).into_iter().nth(index))? else {
            return Ok(false);
        };
        self.record_click(frame, selector, text);
        Ok(true)
    }

    async fn body_text(&self, frame: &FrameHandle) -> Result<String> {
        self.with_frame(frame, |f| f.body.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.lock().title.clone())
    }

    async fn run_script(&self, script: &str) -> Result<Value> {
        self.lock().scripts.push(script.to_string());
        Ok(Value::Null)
    }

    async fn close(&self) -> Result<()> {
        let mut state = self.lock();
        state.close_calls += 1;
        state.closed = true;
        Ok(())
    }
}

/// Hands out clones of one shared [`FakePage`], or fails to launch.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    pub page: FakePage,
    pub fail_launch: bool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self { page, fail_launch: false }
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        if self.fail_launch {
            bail!("Failed to launch Chrome");
        }
        Ok(Box::new(self.page.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn click_effects_mutate_the_page() {
        let page = FakePage::new(vec![
            FakeFrame::named("top"),
            FakeFrame::named("main").with("#li_ddlCountry a", "USD"),
        ]);
        page.on_click(
            "#li_ddlCountry a",
            Effect::SetText { frame: 1, selector: "#li_ddlCountry a".into(), text: "MMK".into() },
        );

        let frames = page.frames().await.unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].is_main());
        assert!(page.click(&frames[1], "#li_ddlCountry a").await.unwrap());
        assert_eq!(page.text(1, "#li_ddlCountry a").as_deref(), Some("MMK"));
        assert_eq!(page.clicks().len(), 1);
    }

    #[tokio::test]
    async fn start_button_raises_the_ready_flag() {
        let page = FakePage::new(vec![FakeFrame::named("top").with("#scraper-start-btn", "Start")]);
        page.on_click("#scraper-start-btn", Effect::SetReady);
        page.on_click("#scraper-start-btn", Effect::SetBody { frame: 0, body: "Started".into() });
        let main = FrameHandle::main();

        assert!(!page.ready_flag().await.unwrap());
        assert!(page.click(&main, "#scraper-start-btn").await.unwrap());
        assert!(page.ready_flag().await.unwrap());
        assert_eq!(page.body_text(&main).await.unwrap(), "Started");
    }

    #[tokio::test]
    async fn hidden_frames_are_unlisted_but_still_answer() {
        let page = FakePage::new(vec![FakeFrame::named("top"), FakeFrame::named("main").with("tr", "row")]);
        let frames = page.frames().await.unwrap();
        page.hide_frame(1);

        assert_eq!(page.frames().await.unwrap().len(), 1);
        assert!(!page.is_detached(&frames[1]).await);
        assert_eq!(page.count(&frames[1], "tr").await.unwrap(), 1);
        assert_eq!(frames[1].id.as_deref(), Some("FRAME-1"));
    }

    #[tokio::test]
    async fn failing_frames_error_on_every_query() {
        let page = FakePage::new(vec![FakeFrame::named("top").failing()]);
        let main = FrameHandle::main();
        assert!(page.count(&main, "tr").await.is_err());
        assert!(page.body_text(&main).await.is_err());
    }
}
