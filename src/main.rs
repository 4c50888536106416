//! # RpsHand: rock-paper-scissors against a robot hand
//!
//! Usage:
//!   rpshand                          # Default config (~/.rpshand/config.toml)
//!   rpshand --config ./hand.toml     # Custom config
//!   rpshand --no-capture             # Start with the capture source marked off
//!
//! Commands on stdin: `start`, `pause`, `stop`, `capture on|off`, `score`,
//! `quit`. Any JSON line is taken as a perception event, e.g.
//! `{"label":"rock","confidence":0.93}`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;
use tracing_subscriber::EnvFilter;

use rpshand_core::RpsConfig;
use rpshand_devices::{load_devices, GestureDispatcher, HttpCanChannel, PresetRegistry};
use rpshand_game::{
    forward, parse_event_line, FileScoreStore, GameEvent, GameSession, RoundMachine, ScoreBoard, SessionHandle,
};

#[derive(Parser)]
#[command(name = "rpshand", version, about = "✊ RpsHand — rock-paper-scissors against a robot hand")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<String>,

    /// Do not mark the capture source active at startup
    #[arg(long)]
    no_capture: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "rpshand=debug,rpshand_core=debug,rpshand_devices=debug,rpshand_game=debug"
    } else {
        "rpshand=info,rpshand_core=info,rpshand_devices=info,rpshand_game=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => RpsConfig::load_from(Path::new(&expand_path(path)))?,
        None => RpsConfig::load()?,
    };

    tracing::info!("✊ RpsHand v{}", env!("CARGO_PKG_VERSION"));

    let client = reqwest::Client::new();
    let devices = load_devices(&client, &config.hands).await;
    let registry = Arc::new(PresetRegistry::from_overrides(&config.presets)?);
    tracing::info!("📋 {} gesture presets loaded", registry.count());
    let channel = Arc::new(HttpCanChannel::with_client(
        client.clone(),
        &config.hands.can_url,
        config.hands.request_timeout(),
    ));
    let dispatcher = GestureDispatcher::from_config(&config.hands, devices, registry, channel);

    let store = FileScoreStore::new(&config.scores.resolved_path());
    tracing::info!("💾 Scores at {}", store.path().display());
    let machine = RoundMachine::new(config.game.clone(), ScoreBoard::load(Box::new(store)), Arc::new(dispatcher));

    let (session, handle) = GameSession::new(machine);
    let printer = tokio::spawn(print_events(handle.subscribe()));
    let session_task = session.spawn();

    if !cli.no_capture {
        handle.set_capture_active(true).await?;
    }

    let (perception_tx, perception_rx) = mpsc::channel(64);
    tokio::spawn(forward(ReceiverStream::new(perception_rx), handle.clone()));

    println!("Commands: start | pause | stop | capture on|off | score | quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "quit" | "exit" => break,
            "start" => {
                if let Err(e) = handle.start().await {
                    tracing::debug!("start refused: {e}");
                }
            }
            "pause" => handle.pause().await?,
            "stop" => handle.stop().await?,
            "capture on" => handle.set_capture_active(true).await?,
            "capture off" => handle.set_capture_active(false).await?,
            "score" => print_score(&handle).await?,
            other => match parse_event_line(other) {
                Some(event) => {
                    if perception_tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => println!("Unknown command: {other}"),
            },
        }
    }

    drop(perception_tx);
    handle.shutdown().await?;
    session_task.await?;
    printer.abort();
    Ok(())
}

async fn print_score(handle: &SessionHandle) -> Result<()> {
    let snap = handle.snapshot().await?;
    println!(
        "🏆 {} | {:?} | rounds played: {}",
        snap.ledger, snap.state.phase, snap.rounds_played
    );
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<GameEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => render(&event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("⚠️ Renderer lagged, {n} events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn render(event: &GameEvent) {
    match event {
        GameEvent::PhaseChanged(phase) => tracing::debug!("phase: {phase:?}"),
        GameEvent::Countdown(n) => println!("   {n}..."),
        GameEvent::Reveal => println!("   ✊✋✌️  SHOOT!"),
        GameEvent::RobotCommitted(g) => tracing::debug!("robot committed {g}"),
        GameEvent::PlayerCommitted(_) => {}
        GameEvent::RoundResult(r) => {
            let player = match r.player {
                rpshand_core::PlayerMove::Shown(g) => format!("{} {}", g.icon(), g),
                rpshand_core::PlayerMove::Timeout => "⌛ nothing".to_string(),
            };
            println!(
                "   You: {player}  Robot: {} {}  →  {}   [{}]",
                r.robot.icon(),
                r.robot,
                r.verdict,
                r.ledger
            );
        }
        GameEvent::ScoreChanged(ledger) => tracing::debug!("score: {ledger}"),
        GameEvent::StartRejected(reason) => println!("   ⚠️  {reason}"),
    }
}
