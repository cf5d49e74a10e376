//! Public pool dashboard.
//!
//! Usage: pooldash [--once]
//!
//! Prints a fresh frame to stdout after every refresh; `--once` renders a
//! single frame and exits. Logs go to stderr.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;

use pooldash::api::HttpPoolApi;
use pooldash::config::DashboardConfig;
use pooldash::cycle::{shutdown_signal, CycleReport, Dashboard, Surface};
use pooldash::logging::{self, obj, v_str, Domain};
use pooldash::view::{BufferedView, PUBLIC_LAYOUT};

fn present(view: &BufferedView, _report: &CycleReport) {
    print!("\x1b[2J\x1b[H{}", view.render_text());
}

#[tokio::main]
async fn main() -> Result<()> {
    let once = std::env::args().skip(1).any(|a| a == "--once");
    let cfg = DashboardConfig::from_env();
    let api = Arc::new(HttpPoolApi::new(&cfg)?);

    logging::info(
        Domain::System,
        "startup",
        obj(&[
            ("surface", v_str("public")),
            ("pool_id", v_str(&cfg.pool_id)),
            ("api_base", v_str(&cfg.api_base)),
        ]),
    );

    let mut view = BufferedView::new(PUBLIC_LAYOUT);
    let mut dashboard = Dashboard::new(cfg, Surface::Public);

    if once {
        dashboard.tick(api.as_ref(), &mut view, Utc::now()).await;
        print!("{}", view.render_text());
        return Ok(());
    }

    dashboard.run(api, &mut view, shutdown_signal(), present).await
}
