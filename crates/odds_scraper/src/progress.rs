//! Progress observers. The engine publishes phase transitions; nothing in
//! the engine depends on what a reporter does with them.

use async_trait::async_trait;
use page_session::PageSession;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    AwaitingReadiness,
    ConfiguringSettings,
    FilteringLeagues,
    Scanning,
    Completed(usize),
    Failed(String),
}

impl Phase {
    pub fn message(&self) -> String {
        match self {
            Phase::AwaitingReadiness => "Waiting for Dashboard...".to_string(),
            Phase::ConfiguringSettings => "Configuring Settings...".to_string(),
            Phase::FilteringLeagues => "Filtering Leagues...".to_string(),
            Phase::Scanning => "Scanning matches...".to_string(),
            Phase::Completed(n) => format!("Success! {n} matches found."),
            Phase::Failed(e) => format!("Error: {e}"),
        }
    }

    fn color(&self) -> &'static str {
        match self {
            Phase::AwaitingReadiness => "#f59e0b",
            Phase::ConfiguringSettings => "#8b5cf6",
            Phase::FilteringLeagues => "#ec4899",
            Phase::Scanning | Phase::Completed(_) => "#10b981",
            Phase::Failed(_) => "#ef4444",
        }
    }
}

#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, page: &dyn PageSession, phase: &Phase);
}

pub struct TracingReporter;

#[async_trait]
impl ProgressReporter for TracingReporter {
    async fn report(&self, _page: &dyn PageSession, phase: &Phase) {
        info!("▶ {}", phase.message());
    }
}

/// Forwards every phase to each reporter in turn.
pub struct FanOut(pub Vec<Arc<dyn ProgressReporter>>);

#[async_trait]
impl ProgressReporter for FanOut {
    async fn report(&self, page: &dyn PageSession, phase: &Phase) {
        for r in &self.0 {
            r.report(page, phase).await;
        }
    }
}

/// Status box pinned to the top-right of the page. While waiting for
/// readiness it also offers the start button that sets the ready flag.
pub struct OverlayReporter;

impl OverlayReporter {
    pub fn script(phase: &Phase) -> String {
        let msg = serde_json::to_string(&phase.message()).unwrap_or_else(|_| "\"\"".to_string());
        let color = phase.color();
        let show_button = matches!(phase, Phase::AwaitingReadiness);
        format!(
            r#"
  let div = document.getElementById('scraper-overlay');
  if (!div) {{
    div = document.createElement('div');
    div.id = 'scraper-overlay';
    Object.assign(div.style, {{
      position: 'fixed', top: '10px', right: '10px', padding: '15px',
      background: 'rgba(0,0,0,0.9)', color: '#fff', zIndex: '2147483647',
      borderRadius: '8px', fontFamily: 'sans-serif', display: 'flex',
      flexDirection: 'column', gap: '10px', minWidth: '300px',
      boxShadow: '0 4px 12px rgba(0,0,0,0.3)'
    }});
    document.body.appendChild(div);
  }}
  let msgEl = document.getElementById('scraper-msg');
  if (!msgEl) {{
    msgEl = document.createElement('div');
    msgEl.id = 'scraper-msg';
    div.appendChild(msgEl);
  }}
  msgEl.textContent = '🤖 ' + {msg};
  div.style.borderLeft = '5px solid {color}';
  let btn = document.getElementById('scraper-start-btn');
  if ({show_button} && !btn) {{
    btn = document.createElement('button');
    btn.id = 'scraper-start-btn';
    btn.textContent = 'Start Extraction Now ➤';
    Object.assign(btn.style, {{
      padding: '10px 15px', background: '#10b981', color: 'white', border: 'none',
      borderRadius: '4px', cursor: 'pointer', fontWeight: 'bold'
    }});
    btn.onclick = () => {{ window._scraperReady = true; btn.textContent = 'Starting...'; btn.disabled = true; }};
    div.appendChild(btn);
  }} else if (!{show_button} && btn) {{
    btn.remove();
  }}
  return true;"#
        )
    }
}

#[async_trait]
impl ProgressReporter for OverlayReporter {
    async fn report(&self, page: &dyn PageSession, phase: &Phase) {
        if page.is_closed().await {
            return;
        }
        let _ = page.run_script(&Self::script(phase)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_only_offers_the_button_while_waiting() {
        let waiting = OverlayReporter::script(&Phase::AwaitingReadiness);
        assert!(waiting.contains("if (true && !btn)"));
        assert!(waiting.contains("Waiting for Dashboard..."));

        let done = OverlayReporter::script(&Phase::Completed(3));
        assert!(done.contains("if (false && !btn)"));
        assert!(done.contains("Success! 3 matches found."));
        assert!(done.contains("#10b981"));
    }

    #[tokio::test]
    async fn fan_out_reaches_every_reporter_until_the_page_closes() {
        use page_session::fake::{FakeFrame, FakePage};

        let page = FakePage::new(vec![FakeFrame::named("top")]);
        let both = FanOut(vec![Arc::new(TracingReporter), Arc::new(OverlayReporter)]);

        both.report(&page, &Phase::Scanning).await;
        assert_eq!(page.scripts().len(), 1);

        page.close().await.unwrap();
        both.report(&page, &Phase::Completed(0)).await;
        assert_eq!(page.scripts().len(), 1);
    }

    #[test]
    fn failure_message_is_escaped() {
        let s = OverlayReporter::script(&Phase::Failed("bad 'quote' \"x\"".into()));
        assert!(s.contains(r#""Error: bad 'quote' \"x\"""#));
    }
}
