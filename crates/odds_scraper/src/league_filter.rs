//! League multi-select: tick every on-page label that names a target league,
//! then commit.

use page_session::{find_frame_with, poll_until, PageSession};
use tracing::{debug, info, warn};

use crate::config::{Timings, LEAGUE_CONFIRMS, LEAGUE_FILTER, LEAGUE_LABELS};

/// Uppercase and keep only `[A-Z0-9]`.
pub fn normalize_league(name: &str) -> String {
    name.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Bidirectional containment on normalized names, so both "EPL PREMIER
/// LEAGUE" style abbreviations and suffixed labels ("... - CORNERS") hit.
pub fn label_matches(label: &str, targets: &[String]) -> bool {
    let label = normalize_league(label);
    // An empty label would be contained in every target.
    if label.is_empty() {
        return false;
    }
    targets.iter().any(|t| {
        let target = normalize_league(t);
        label.contains(&target) || target.contains(&label)
    })
}

/// Indices of the labels to toggle, in page order.
pub fn matching_labels(labels: &[String], targets: &[String]) -> Vec<usize> {
    labels
        .iter()
        .enumerate()
        .filter(|(_, l)| label_matches(l, targets))
        .map(|(i, _)| i)
        .collect()
}

/// Returns how many labels were toggled. Zero means nothing was committed.
pub async fn apply_league_filter(
    session: &dyn PageSession,
    targets: &[String],
    timings: &Timings,
) -> anyhow::Result<usize> {
    let Some(frame) = find_frame_with(session, LEAGUE_FILTER).await else {
        info!("League filter control not found, leaving leagues as they are");
        return Ok(0);
    };

    session.click(&frame, LEAGUE_FILTER).await?;
    let f = &frame;
    poll_until(timings.settle(timings.filter_open_wait), move || async move {
        matches!(session.count(f, LEAGUE_LABELS).await, Ok(n) if n > 0)
    })
    .await;

    let labels = session.texts_of(&frame, &[LEAGUE_LABELS]).await?;
    let hits = matching_labels(&labels, targets);
    let mut toggled = 0;
    for idx in hits {
        match session.click_nth(&frame, LEAGUE_LABELS, idx).await {
            Ok(true) => {
                debug!(label = %labels[idx].trim(), "league selected");
                toggled += 1;
            }
            Ok(false) => debug!(idx, "league label vanished before click"),
            Err(e) => warn!("League label click failed: {}", e),
        }
    }

    if toggled == 0 {
        info!("No league labels matched {} targets", targets.len());
        return Ok(0);
    }

    poll_until(timings.settle(timings.toggle_settle), move || async move {
        for selector in LEAGUE_CONFIRMS {
            if matches!(session.count(f, selector).await, Ok(n) if n > 0) {
                return true;
            }
        }
        false
    })
    .await;

    let mut confirmed = None;
    for selector in LEAGUE_CONFIRMS {
        if session.click(&frame, selector).await? {
            confirmed = Some(*selector);
            break;
        }
    }
    let Some(confirm) = confirmed else {
        warn!("No league confirm control found, {} labels left uncommitted", toggled);
        return Ok(0);
    };
    debug!(confirm, "league selection committed");

    // The control disappears once the filtered page reloads.
    poll_until(timings.settle(timings.filter_confirm_wait), move || async move {
        session.is_detached(f).await || matches!(session.count(f, LEAGUE_FILTER).await, Ok(0))
    })
    .await;

    info!("Selected {} leagues", toggled);
    Ok(toggled)
}
