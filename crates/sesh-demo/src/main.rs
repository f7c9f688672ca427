//! sesh-demo - a scripted browser visit through the session lifecycle.
//!
//! Each step is one request: the session is loaded from the cookie jar, the
//! step's handler runs, and the session is committed. Outbound cookies are
//! fed back as the next request's inbound cookies.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use sesh::{MemoryCookieJar, Outcome, Session, SessionManager};
use sesh_config::{load_config_explicit, load_config_with_options};
use tracing::{info, warn};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Walk a scripted browser visit through the sesh session lifecycle
#[derive(Parser)]
#[command(name = "sesh-demo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long)]
    pub json: bool,

    /// Load this config file instead of discovering one
    #[arg(long, env = "SESH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to look for a project-local sesh.toml in
    #[arg(long)]
    pub project_dir: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Script
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Step {
    FirstVisit,
    Revisit,
    Browse,
    Login,
    Logout,
}

impl Step {
    const SCRIPT: [Step; 5] = [
        Step::FirstVisit,
        Step::Revisit,
        Step::Browse,
        Step::Login,
        Step::Logout,
    ];

    fn name(self) -> &'static str {
        match self {
            Step::FirstVisit => "first-visit",
            Step::Revisit => "revisit",
            Step::Browse => "browse",
            Step::Login => "login",
            Step::Logout => "logout",
        }
    }

    fn apply(self, session: &mut Session) {
        match self {
            Step::FirstVisit | Step::Revisit => {
                let views = session.get_as::<u64>("views").unwrap_or(0) + 1;
                session.insert("views", views);
            }
            Step::Browse => {}
            Step::Login => {
                session.insert("user", "ada");
                session.regenerate_id();
            }
            Step::Logout => session.clear(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "sesh=trace,sesh_store=trace,sesh_demo=debug,info"
    } else {
        "sesh=info,sesh_store=info,sesh_demo=info,warn"
    };
    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let loaded = match cli.config {
        Some(ref path) => load_config_explicit(path)?,
        None => load_config_with_options(cli.project_dir.as_deref(), None)?,
    };
    for warning in &loaded.warnings {
        warn!("{}", warning);
    }
    let session_config = loaded.config.session_or_default();
    info!(
        key = %session_config.key(),
        default_ttl = ?session_config.default_ttl(),
        "Session config"
    );

    let manager = SessionManager::<MemoryCookieJar>::from_config(&session_config).build();
    let mut jar = MemoryCookieJar::new();

    for step in Step::SCRIPT {
        let mut session = manager.load(&jar).await?;
        let inbound = session.original_id().map(str::to_string);
        step.apply(&mut session);
        let outbound = session.id().to_string();
        let outcome = manager.commit(session, &mut jar).await?;

        report(&cli, step, outcome, inbound.as_deref(), &outbound, &jar);
        jar.next_request();
    }

    Ok(())
}

fn report(
    cli: &Cli,
    step: Step,
    outcome: Outcome,
    inbound: Option<&str>,
    outbound: &str,
    jar: &MemoryCookieJar,
) {
    let cookies = jar.writes().len();
    if cli.json {
        let line = serde_json::json!({
            "step": step.name(),
            "outcome": outcome.to_string(),
            "inbound_sid": inbound,
            "sid": outbound,
            "cookie_writes": cookies,
        });
        println!("{}", line);
    } else {
        let rotated = inbound.is_some_and(|sid| sid != outbound);
        println!(
            "{:<12} {:<14} cookie_writes={} rotated={}",
            step.name(),
            outcome,
            cookies,
            rotated
        );
    }

    if cli.verbose {
        for write in jar.writes() {
            info!(
                name = %write.name,
                removal = write.is_removal(),
                "Cookie written"
            );
        }
    }
}
