//! Display settings (currency, odds format). Each one is idempotent: when the
//! page already shows the desired value nothing is clicked.

use anyhow::Result;
use page_session::{find_frame_with, poll_until, FrameHandle, PageSession};
use tracing::{debug, info, warn};

use crate::config::{DisplaySetting, Timings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingOutcome {
    AlreadySet,
    Changed,
    /// Dropdown opened but no option carried the desired token.
    OptionMissing,
    ControlMissing,
}

/// Applies every setting in order. Failures are logged and swallowed; the page
/// stays in whatever state the failing step left it.
pub async fn configure_settings(
    session: &dyn PageSession,
    settings: &[DisplaySetting],
    fallback: Option<&FrameHandle>,
    timings: &Timings,
) -> Vec<SettingOutcome> {
    let mut outcomes = Vec::with_capacity(settings.len());
    for setting in settings {
        let outcome = match apply_setting(session, setting, fallback, timings).await {
            Ok(o) => o,
            Err(e) => {
                warn!(setting = setting.name, "Setting adjustment failed: {}", e);
                SettingOutcome::ControlMissing
            }
        };
        debug!(setting = setting.name, ?outcome, "setting done");
        outcomes.push(outcome);
    }
    outcomes
}

async fn apply_setting(
    session: &dyn PageSession,
    setting: &DisplaySetting,
    fallback: Option<&FrameHandle>,
    timings: &Timings,
) -> Result<SettingOutcome> {
    // Never trust a cached handle: an earlier change may have reloaded the frame.
    let frame = match find_frame_with(session, setting.marker).await {
        Some(f) => f,
        None => match fallback {
            Some(f) if !session.is_detached(f).await => f.clone(),
            _ => return Ok(SettingOutcome::ControlMissing),
        },
    };

    let current = session.text_of(&frame, setting.marker).await.unwrap_or(None).unwrap_or_default();
    if setting.is_applied(&current) {
        debug!(setting = setting.name, current = %current.trim(), "already set");
        return Ok(SettingOutcome::AlreadySet);
    }

    if !session.click(&frame, setting.marker).await? {
        return Ok(SettingOutcome::ControlMissing);
    }
    let f = &frame;
    poll_until(timings.settle(setting.open_wait), move || async move {
        matches!(session.count(f, setting.options).await, Ok(n) if n > 0)
    })
    .await;

    if !session.click_containing(&frame, setting.options, &setting.option_tokens).await? {
        info!(setting = setting.name, "No option matched {:?}", setting.option_tokens);
        return Ok(SettingOutcome::OptionMissing);
    }

    // Wait for the reloaded frame to show the new value, wherever it now lives.
    let applied = poll_until(timings.settle(setting.apply_wait), move || async move {
        match find_frame_with(session, setting.marker).await {
            Some(fresh) => {
                let text = session.text_of(&fresh, setting.marker).await.unwrap_or(None).unwrap_or_default();
                setting.is_applied(&text)
            }
            None => false,
        }
    })
    .await;

    if applied {
        info!(setting = setting.name, "Setting changed");
    } else {
        info!(setting = setting.name, "Setting change not confirmed within {:?}", setting.apply_wait);
    }
    Ok(SettingOutcome::Changed)
}
