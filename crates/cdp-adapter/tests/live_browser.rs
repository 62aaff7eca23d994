//! Drives a real Chromium. Skipped unless `OUTREACH_LIVE_BROWSER=1`.
//!
//! ```bash
//! OUTREACH_LIVE_BROWSER=1 OUTREACH_CHROME=/usr/bin/chromium cargo test -p cdp-adapter --test live_browser
//! ```

use std::env;

use action_primitives::{ScopeFlags, Surface, SurfaceProvider};
use cdp_adapter::{BrowserSettings, ChromiumSurfaceProvider};
use url::Url;

const PAGE: &str = r#"data:text/html,<main><section class="pv-top-card"><h1 class="text-heading-xlarge">Ada Lovelace</h1><button aria-label="More actions">More</button></section><textarea id="custom-message"></textarea></main>"#;

fn live() -> bool {
    env::var("OUTREACH_LIVE_BROWSER")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[tokio::test]
async fn snapshot_fill_and_close() {
    if !live() {
        println!("skipping live browser test (OUTREACH_LIVE_BROWSER not set)");
        return;
    }

    let profile = tempfile::tempdir().unwrap();
    let settings = BrowserSettings {
        headless: true,
        user_data_dir: Some(profile.path().to_path_buf()),
        render_settle_ms: 100,
        ..BrowserSettings::default()
    };
    let provider = ChromiumSurfaceProvider::launch(settings).await.unwrap();
    let handle = provider.open(&Url::parse(PAGE).unwrap()).await.unwrap();
    provider.wait_loaded(&handle).await.unwrap();

    let surface = provider.surface(&handle).unwrap();
    let snapshot = surface.snapshot().await.unwrap();
    assert!(snapshot.has_main);
    let more = snapshot
        .elements
        .iter()
        .find(|el| el.aria_label.as_deref() == Some("More actions"))
        .unwrap();
    assert!(more.is_in(ScopeFlags::PRIMARY));

    let field = snapshot
        .elements
        .iter()
        .find(|el| el.dom_id.as_deref() == Some("custom-message"))
        .unwrap();
    surface.fill(&field.node, "Hi Ada").await.unwrap();
    assert_eq!(
        surface.read_value(&field.node).await.unwrap().as_deref(),
        Some("Hi Ada")
    );

    provider.close(&handle).await.unwrap();
    assert!(provider.surface(&handle).is_none());
    provider.shutdown().await.unwrap();
}
