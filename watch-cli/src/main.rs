mod render;
mod session;

use std::io;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use watch_core::source::source_for;
use watch_core::{RngDice, Skill, Variant, WatchApp};

#[derive(Subcommand)]
enum Cmd {
    /// Interactive session (the default)
    Session,
    /// Generate one watch with the given rolls and selections, then exit
    Watch {
        #[arg(long)]
        piloting: Option<u32>,
        #[arg(long)]
        navigating: Option<u32>,
        #[arg(long)]
        foraging: Option<u32>,
        #[arg(long)]
        watching: Option<u32>,
        /// Terrain to put in play; repeat for several, in click order
        #[arg(long = "select")]
        select: Vec<String>,
        /// Roll every skill before generating
        #[arg(long)]
        roll_all: bool,
    },
}

#[derive(Parser)]
#[command(name = "watch-cli")]
#[command(about = "Terrain watch checks and oppressive conditions")]
struct Cli {
    /// Config document: a file path or an http:// URL
    #[arg(long, env = "WATCH_CONFIG", default_value = "config.json")]
    config: String,
    /// Reduced variant: no watching skill, no terrain selection
    #[arg(long)]
    reduced: bool,
    /// Print view models as JSON instead of text
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watch_cli=info,watch_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting watch-cli with config {}", cli.config);
    let variant = if cli.reduced {
        Variant::REDUCED
    } else {
        Variant::FULL
    };
    let source = source_for(&cli.config).context("unusable config location")?;
    let mut app = WatchApp::new(variant, source, Box::new(RngDice::thread()));

    // A failed load is reported in the status line and retried on demand.
    let _ = app.start();

    match cli.cmd.unwrap_or(Cmd::Session) {
        Cmd::Session => {
            let stdin = io::stdin();
            session::run(&mut app, stdin.lock(), io::stdout(), cli.json)
                .context("session i/o failed")?;
        }
        Cmd::Watch {
            piloting,
            navigating,
            foraging,
            watching,
            select,
            roll_all,
        } => {
            if roll_all {
                app.roll_all();
            }
            let entries = [
                (Skill::Piloting, piloting),
                (Skill::Navigating, navigating),
                (Skill::Foraging, foraging),
                (Skill::Watching, watching),
            ];
            for (skill, value) in entries {
                if let Some(value) = value {
                    app.enter_roll(skill, &value.to_string())
                        .with_context(|| format!("--{} {}", skill, value))?;
                }
            }
            if variant.include_selection {
                for key in &select {
                    app.select_terrain(key)
                        .with_context(|| format!("--select {}", key))?;
                }
            }
            app.generate_watch()
                .with_context(|| format!("could not generate a watch from {}", cli.config))?;

            let now = Instant::now();
            if cli.json {
                println!("{}", render::json(&app, now)?);
            } else {
                print!("{}", render::text(&app, now));
            }
        }
    }
    Ok(())
}
