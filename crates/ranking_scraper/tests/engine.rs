use std::sync::Arc;
use std::time::Duration;

use logger::EventLogger;
use page_session::fake::{Effect, FakeFrame, FakeLauncher, FakePage};
use ranking_scraper::{RankingConfig, RankingEngine, RankingLeague, RankingTimings};
use tokio::time::Instant;

const EPL: &str = "https://tables.test/epl";
const LIGA: &str = "https://tables.test/liga";
const SERIE: &str = "https://tables.test/serie-a";

fn config() -> RankingConfig {
    RankingConfig {
        leagues: vec![
            RankingLeague::new("Premier League", EPL),
            RankingLeague::new("La Liga", LIGA),
            RankingLeague::new("Serie A", SERIE),
        ],
        timings: RankingTimings::default(),
    }
}

fn tables() -> FakePage {
    let page = FakePage::new(vec![FakeFrame::named("top").with("button", "Accept All Cookies")]);
    page.add_page(EPL, "Table\n#\nTeam\nPL\n1\nArsenal\n20\n2\nChelsea\n19\n1\nArsenal");
    page.add_page(LIGA, "1\nReal Madrid\n2\nBarcelona\n3\nGirona");
    page.add_page(SERIE, "1\nInter\nPTS\n2\nNapoli");
    page
}

fn summary(entries: &[ranking_scraper::RankingEntry]) -> Vec<(&str, u8, &str)> {
    entries
        .iter()
        .map(|e| (e.league.as_str(), e.rank, e.team_name.as_str()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn collects_every_league_in_order() {
    let page = tables();
    let engine = RankingEngine::new(Arc::new(FakeLauncher::new(page.clone())), config());

    let start = Instant::now();
    let entries = engine.fetch().await;

    assert_eq!(
        summary(&entries),
        vec![
            ("Premier League", 1, "Arsenal"),
            ("Premier League", 2, "Chelsea"),
            ("La Liga", 1, "Real Madrid"),
            ("La Liga", 2, "Barcelona"),
            ("La Liga", 3, "Girona"),
            ("Serie A", 1, "Inter"),
            ("Serie A", 2, "Napoli"),
        ]
    );
    assert_eq!(page.navigations(), vec![EPL, LIGA, SERIE]);
    // One pause between each league, no waiting once rows parse.
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(page.close_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cookie_banner_is_dismissed_once() {
    let page = tables();
    let engine = RankingEngine::new(Arc::new(FakeLauncher::new(page.clone())), config());

    engine.fetch().await;

    let consent: Vec<_> = page.clicks().into_iter().filter(|c| c.selector == "button").collect();
    assert_eq!(consent.len(), 1);
    assert_eq!(consent[0].text, "Accept All Cookies");
}

#[tokio::test(start_paused = true)]
async fn table_behind_the_consent_wall_is_read_after_accepting() {
    let page = tables();
    page.add_page(EPL, "We value your privacy\nAccept All Cookies");
    page.on_click(
        "button",
        Effect::SetBody { frame: 0, body: "1\nLiverpool\n2\nArsenal".into() },
    );
    let engine = RankingEngine::new(Arc::new(FakeLauncher::new(page.clone())), config());

    let entries = engine.fetch().await;

    assert_eq!(&summary(&entries)[..2], &[("Premier League", 1, "Liverpool"), ("Premier League", 2, "Arsenal")]);
}

#[tokio::test(start_paused = true)]
async fn empty_league_is_logged_and_skipped() {
    let page = tables();
    let filler = "x".repeat(300);
    page.add_page(LIGA, &format!("Please enable JavaScript {filler}"));
    let dir = tempfile::tempdir().unwrap();
    let events = Arc::new(EventLogger::new(dir.path()));
    let engine = RankingEngine::new(Arc::new(FakeLauncher::new(page.clone())), config())
        .with_events(events);

    let entries = engine.fetch().await;

    let leagues: Vec<&str> = entries.iter().map(|e| e.league.as_str()).collect();
    assert_eq!(leagues, vec!["Premier League", "Premier League", "Serie A", "Serie A"]);
    assert_eq!(page.navigations().len(), 3);

    let log = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap().path();
    let line = std::fs::read_to_string(log).unwrap();
    let event: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(event["event"], "RANKING_MISS");
    assert_eq!(event["league"], "La Liga");
    let excerpt = event["excerpt"].as_str().unwrap();
    assert_eq!(excerpt.chars().count(), 200);
    assert!(excerpt.starts_with("Please enable JavaScript"));
}

#[tokio::test(start_paused = true)]
async fn navigation_failure_keeps_partial_results() {
    let page = tables();
    page.fail_url(LIGA);
    let engine = RankingEngine::new(Arc::new(FakeLauncher::new(page.clone())), config());

    let entries = engine.fetch().await;

    assert_eq!(
        summary(&entries),
        vec![("Premier League", 1, "Arsenal"), ("Premier League", 2, "Chelsea")]
    );
    assert_eq!(page.navigations(), vec![EPL]);
    assert_eq!(page.close_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unreadable_page_logs_title_and_moves_on() {
    let page = FakePage::new(vec![FakeFrame::named("top").failing()]);
    page.set_title("Just a moment...");
    let engine = RankingEngine::new(Arc::new(FakeLauncher::new(page.clone())), config());

    let entries = engine.fetch().await;

    assert!(entries.is_empty());
    assert_eq!(page.navigations().len(), 3);
    assert_eq!(page.close_calls(), 1);
}

#[tokio::test]
async fn launch_failure_yields_nothing() {
    let launcher = FakeLauncher { page: tables(), fail_launch: true };
    let engine = RankingEngine::new(Arc::new(launcher.clone()), config());

    assert!(engine.fetch().await.is_empty());
    assert!(launcher.page.navigations().is_empty());
}
