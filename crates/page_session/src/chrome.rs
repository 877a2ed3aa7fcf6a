//! Chrome-backed [`PageSession`] on top of `headless_chrome`.
//!
//! headless_chrome is a blocking client, so every call hops onto
//! `spawn_blocking` and the async caller just awaits it.
//!
//! Frames are listed from the devtools frame tree and child frames are
//! evaluated in an isolated world created for their frame id, so a
//! cross-origin iframe is as reachable as a same-origin one. If the protocol
//! calls fail, the session falls back to walking `window.frames` from the top
//! document, which only reaches same-origin frames.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task;
use tracing::{debug, info};

use crate::env::{env_bool, env_parse, env_string};
use crate::cdp;
use crate::script;
use crate::{FrameHandle, PageSession, SessionLauncher};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub headless: bool,
    pub window: (u32, u32),
    pub nav_timeout: Duration,
    /// Must outlast the longest gap between two browser calls (the readiness gate).
    pub idle_timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window: (1280, 800),
            nav_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(900),
            user_agent: None,
        }
    }
}

impl LaunchConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let window = env_string("BROWSER_WINDOW", "")
            .split_once('x')
            .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)))
            .unwrap_or(d.window);

        Self {
            headless: env_bool("BROWSER_HEADLESS", d.headless),
            window,
            nav_timeout: Duration::from_secs(env_parse("BROWSER_NAV_TIMEOUT_SECS", 60)),
            idle_timeout: d.idle_timeout,
            user_agent: d.user_agent,
        }
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: LaunchConfig,
}

impl ChromeLauncher {
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn launch(&self) -> Result<Box<dyn PageSession>> {
        let session = ChromeSession::launch(self.config.clone()).await?;
        Ok(Box::new(session))
    }
}

pub struct ChromeSession {
    // Dropping the browser kills the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
    closed: AtomicBool,
    /// Isolated world execution context per child frame id.
    worlds: Mutex<HashMap<String, i64>>,
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

impl ChromeSession {
    pub async fn launch(config: LaunchConfig) -> Result<Self> {
        let (browser, tab) = task::spawn_blocking(move || -> Result<(Browser, Arc<Tab>)> {
            let window_arg = format!("--window-size={},{}", config.window.0, config.window.1);
            let options = LaunchOptions::default_builder()
                .headless(config.headless)
                .sandbox(false)
                .window_size(Some(config.window))
                .idle_browser_timeout(config.idle_timeout)
                .args(vec![
                    OsStr::new(window_arg.as_str()),
                    // Keep cross-origin iframes in the page's renderer so their
                    // frame ids resolve on this tab.
                    OsStr::new("--disable-site-isolation-trials"),
                    OsStr::new("--disable-features=IsolateOrigins,site-per-process"),
                ])
                .build()
                .context("Failed to build Chrome launch options")?;

            let browser = Browser::new(options).context("Failed to launch Chrome")?;
            let tab = browser.new_tab().context("Failed to create browser tab")?;
            tab.set_default_timeout(config.nav_timeout);
            if let Some(ua) = config.user_agent.as_deref() {
                tab.set_user_agent(ua, None, None).context("Failed to set user agent")?;
            }
            Ok((browser, tab))
        })
        .await
        .context("Chrome launch task panicked")??;

        info!("Chrome session started");
        Ok(Self {
            _browser: browser,
            tab,
            closed: AtomicBool::new(false),
            worlds: Mutex::new(HashMap::new()),
        })
    }

    async fn eval_raw(&self, expression: String) -> Result<Value> {
        let tab = Arc::clone(&self.tab);
        let remote = task::spawn_blocking(move || tab.evaluate(&expression, false))
            .await
            .context("Chrome evaluate task panicked")??;
        Ok(remote.value.unwrap_or(Value::Null))
    }

    async fn eval_in(&self, path: &[usize], body: &str) -> Result<Value> {
        let raw = self.eval_raw(script::in_frame(path, body)).await?;
        open_envelope(raw)
    }

    /// Main document (and frames listed without a browser id) run in the page's
    /// own world; child frames run in their isolated world.
    async fn eval_frame(&self, frame: &FrameHandle, body: &str) -> Result<Value> {
        match frame.id.as_deref() {
            Some(id) if !frame.is_main() => self.eval_isolated(id, body).await,
            _ => self.eval_in(&frame.path, body).await,
        }
    }

    async fn eval_isolated(&self, frame_id: &str, body: &str) -> Result<Value> {
        let expression = script::in_frame(&[], body);
        let context = self.world_for(frame_id, false).await?;
        let raw = match self.eval_in_context(context, expression.clone()).await {
            Ok(raw) => raw,
            Err(e) => {
                // A navigation inside the frame invalidates its world.
                debug!(frame_id, "isolated world stale, recreating: {}", e);
                let context = self.world_for(frame_id, true).await?;
                self.eval_in_context(context, expression).await?
            }
        };
        open_envelope(raw)
    }

    async fn world_for(&self, frame_id: &str, fresh: bool) -> Result<i64> {
        let cached = self.worlds.lock().unwrap_or_else(|e| e.into_inner()).get(frame_id).copied();
        if let Some(context) = cached.filter(|_| !fresh) {
            return Ok(context);
        }

        let tab = Arc::clone(&self.tab);
        let method = cdp::CreateIsolatedWorld {
            frame_id: frame_id.to_string(),
            world_name: cdp::WORLD_NAME.to_string(),
            grant_universal_access: true,
        };
        let created = task::spawn_blocking(move || tab.call_method(method))
            .await
            .context("Chrome isolated world task panicked")?
            .with_context(|| format!("Failed to create isolated world in frame {frame_id}"))?;

        let context = created.execution_context_id;
        self.worlds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(frame_id.to_string(), context);
        Ok(context)
    }

    async fn eval_in_context(&self, context_id: i64, expression: String) -> Result<Value> {
        let tab = Arc::clone(&self.tab);
        let method = cdp::EvaluateInContext { expression, context_id, return_by_value: true };
        let reply = task::spawn_blocking(move || tab.call_method(method))
            .await
            .context("Chrome evaluate task panicked")??;
        if let Some(details) = reply.exception_details {
            return Err(anyhow!("evaluate threw: {details}"));
        }
        Ok(reply.result.value.unwrap_or(Value::Null))
    }

    async fn frame_tree(&self) -> Result<Vec<FrameHandle>> {
        let tab = Arc::clone(&self.tab);
        let reply = task::spawn_blocking(move || tab.call_method(cdp::GetFrameTree {}))
            .await
            .context("Chrome frame tree task panicked")?
            .context("Page.getFrameTree failed")?;
        Ok(cdp::flatten(&reply.frame_tree))
    }

    async fn eval_bool(&self, frame: &FrameHandle, body: &str) -> Result<bool> {
        let v = self.eval_frame(frame, body).await?;
        Ok(v.as_bool().unwrap_or(false))
    }
}

fn open_envelope(raw: Value) -> Result<Value> {
    let text = raw
        .as_str()
        .ok_or_else(|| anyhow!("unexpected evaluate result: {raw}"))?;
    let envelope: Envelope = serde_json::from_str(text).context("invalid script envelope")?;
    if envelope.ok {
        Ok(envelope.value)
    } else {
        Err(anyhow!(envelope.error.unwrap_or_else(|| "script failed".to_string())))
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        task::spawn_blocking(move || -> Result<()> {
            tab.navigate_to(&target)
                .with_context(|| format!("Chrome navigate failed for {target}"))?
                .wait_until_navigated()
                .with_context(|| format!("Navigation to {target} did not complete"))?;
            Ok(())
        })
        .await
        .context("Chrome navigate task panicked")??;
        debug!("navigated to {}", url);
        Ok(())
    }

    async fn frames(&self) -> Result<Vec<FrameHandle>> {
        match self.frame_tree().await {
            Ok(frames) => Ok(frames),
            Err(e) => {
                debug!("frame tree unavailable, walking window.frames: {:#}", e);
                let v = self.eval_in(&[], script::LIST_FRAMES).await?;
                serde_json::from_value(v).context("invalid frame list")
            }
        }
    }

    async fn is_detached(&self, frame: &FrameHandle) -> bool {
        self.eval_frame(frame, "return true;").await.is_err()
    }

    async fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn ready_flag(&self) -> Result<bool> {
        self.eval_bool(&FrameHandle::main(), script::READY_FLAG).await
    }

    async fn count(&self, frame: &FrameHandle, selector: &str) -> Result<usize> {
        let v = self.eval_frame(frame, &script::count(selector)).await?;
        Ok(v.as_u64().unwrap_or(0) as usize)
    }

    async fn text_of(&self, frame: &FrameHandle, selector: &str) -> Result<Option<String>> {
        let v = self.eval_frame(frame, &script::text_of(selector)).await?;
        Ok(v.as_str().map(str::to_string))
    }

    async fn texts_of(&self, frame: &FrameHandle, selectors: &[&str]) -> Result<Vec<String>> {
        let v = self.eval_frame(frame, &script::texts_of(selectors)).await?;
        serde_json::from_value(v).context("invalid text list")
    }

    async fn click(&self, frame: &FrameHandle, selector: &str) -> Result<bool> {
        self.eval_bool(frame, &script::click(selector)).await
    }

    async fn click_containing(&self, frame: &FrameHandle, selector: &str, tokens: &[String]) -> Result<bool> {
        self.eval_bool(frame, &script::click_containing(selector, tokens)).await
    }

    async fn click_nth(&self, frame: &FrameHandle, selector: &str, index: usize) -> Result<bool> {
        self.eval_bool(frame, &script::click_nth(selector, index)).await
    }

    async fn body_text(&self, frame: &FrameHandle) -> Result<String> {
        let v = self.eval_frame(frame, script::BODY_TEXT).await?;
        Ok(v.as_str().unwrap_or_default().to_string())
    }

    async fn title(&self) -> Result<String> {
        let tab = Arc::clone(&self.tab);
        task::spawn_blocking(move || tab.get_title())
            .await
            .context("Chrome title task panicked")?
    }

    async fn run_script(&self, body: &str) -> Result<Value> {
        self.eval_in(&[], body).await
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let tab = Arc::clone(&self.tab);
        task::spawn_blocking(move || tab.close(true))
            .await
            .context("Chrome close task panicked")?
            .context("Failed to close tab")?;
        info!("Chrome session closed");
        Ok(())
    }
}
