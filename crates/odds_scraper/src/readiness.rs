use page_session::{find_frame_with, poll_until, FrameHandle, PageSession, PollPolicy};
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Someone pressed the start button on the page.
    Signalled,
    /// The control marker showed up in this frame.
    MarkerFound(FrameHandle),
    /// Ceiling reached; the run continues on a best-effort basis.
    TimedOut,
}

impl Readiness {
    pub fn frame(&self) -> Option<&FrameHandle> {
        match self {
            Readiness::MarkerFound(f) => Some(f),
            _ => None,
        }
    }
}

/// Polls for the human ready flag or the control marker in any frame.
/// Never fails: a timeout is reported as [`Readiness::TimedOut`].
pub async fn wait_until_ready(session: &dyn PageSession, marker: &str, policy: PollPolicy) -> Readiness {
    let found: Mutex<Option<Readiness>> = Mutex::new(None);
    let slot = &found;

    let ready = poll_until(policy, move || async move {
        if matches!(session.ready_flag().await, Ok(true)) {
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(Readiness::Signalled);
            return true;
        }
        if let Some(frame) = find_frame_with(session, marker).await {
            *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(Readiness::MarkerFound(frame));
            return true;
        }
        false
    })
    .await;

    let outcome = found.into_inner().unwrap_or_else(|e| e.into_inner());
    match outcome {
        Some(r) if ready => {
            info!("Page ready: {:?}", r);
            r
        }
        _ => {
            warn!("Page not ready after {:?}, continuing anyway", policy.ceiling());
            Readiness::TimedOut
        }
    }
}
