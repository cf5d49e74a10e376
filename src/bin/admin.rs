//! Admin pool dashboard.
//!
//! Usage: pooldash-admin [--once] | pooldash-admin logout
//!
//! Asks for the admin password unless a recent session is on file (or no
//! password is configured), then polls like the public dashboard with the
//! system panels added.

use anyhow::{anyhow, Result};
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io::{BufRead, Write};
use std::sync::Arc;

use pooldash::api::HttpPoolApi;
use pooldash::config::DashboardConfig;
use pooldash::cycle::{shutdown_signal, CycleReport, Dashboard, Surface};
use pooldash::logging::{self, obj, v_bool, v_str, Domain};
use pooldash::session::{AuthOutcome, GateState, SessionGate, SessionStore, SqliteSessionStore};
use pooldash::view::{BufferedView, ADMIN_LAYOUT};

fn present(view: &BufferedView, _report: &CycleReport) {
    print!("\x1b[2J\x1b[H{}", view.render_text());
}

/// Leaves raw mode however the prompt ends.
struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Reads one line without echoing it. `None` means input ended.
fn read_hidden_line() -> Result<Option<String>> {
    if terminal::enable_raw_mode().is_err() {
        // Not a terminal: input is piped, nothing to hide.
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        return Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()));
    }
    let _raw = RawModeGuard;

    let mut input = String::new();
    loop {
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => break,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                print!("\r\n");
                std::io::stdout().flush()?;
                return Ok(None);
            }
            KeyCode::Char(c) => input.push(c),
            _ => {}
        }
    }
    print!("\r\n");
    std::io::stdout().flush()?;
    Ok(Some(input))
}

async fn authenticate<S: SessionStore>(gate: &mut SessionGate<S>) -> Result<()> {
    if gate.check(Utc::now().timestamp_millis())? == GateState::Unlocked {
        return Ok(());
    }

    while gate.state() == GateState::Locked {
        print!("Admin password (empty to skip): ");
        std::io::stdout().flush()?;
        let Some(line) = tokio::task::spawn_blocking(read_hidden_line).await?? else {
            return Err(anyhow!("input closed before authentication"));
        };
        let input = line.as_str();
        let outcome = if input.is_empty() {
            gate.skip()
        } else {
            gate.submit(input, Utc::now().timestamp_millis())?
        };
        match outcome {
            AuthOutcome::Granted => {}
            AuthOutcome::Rejected { warning } | AuthOutcome::PasswordRequired { warning } => {
                println!("{}", warning);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let once = args.iter().any(|a| a == "--once");
    let cfg = DashboardConfig::from_env();

    let store = SqliteSessionStore::open(&cfg.session_db)?;
    let mut gate = SessionGate::new(
        store,
        cfg.required_password().map(str::to_string),
        cfg.session_timeout_ms,
    );

    if args.iter().any(|a| a == "logout") {
        gate.logout()?;
        println!("Logged out");
        return Ok(());
    }

    authenticate(&mut gate).await?;

    let api = Arc::new(HttpPoolApi::new(&cfg)?);
    logging::info(
        Domain::System,
        "startup",
        obj(&[
            ("surface", v_str("admin")),
            ("pool_id", v_str(&cfg.pool_id)),
            ("api_base", v_str(&cfg.api_base)),
            ("password_required", v_bool(gate.requires_password())),
        ]),
    );

    let mut view = BufferedView::new(ADMIN_LAYOUT);
    let mut dashboard = Dashboard::new(cfg, Surface::Admin);

    if once {
        dashboard.tick(api.as_ref(), &mut view, Utc::now()).await;
        print!("{}", view.render_text());
        return Ok(());
    }

    dashboard.run(api, &mut view, shutdown_signal(), present).await
}
