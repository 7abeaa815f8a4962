mod bot;
mod client;
mod clock;
mod config;
mod events;
mod present;
mod relay;
mod tui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::{mpsc, watch};

use duel::{
    CombatantProfile, FrameLog, LinkConditions, MatchContext, MatchResult, PlayerId, SyncConfig,
};

use bot::Bot;
use client::{Client, ClientIo};
use clock::Epoch;
use config::SimConfig;
use present::{Headless, Presenter};
use relay::Relay;
use tui::Tui;

const RED: &str = "red";
const BLUE: &str = "blue";

#[derive(Parser)]
#[command(name = "duel-sim")]
#[command(about = "Runs a two-bot duel through a simulated frame relay")]
struct Args {
    #[arg(short, long, default_value_t = duel::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value_t = 60)]
    render_fps: u32,

    #[arg(long, default_value_t = duel::DEFAULT_JITTER_THRESHOLD)]
    jitter_threshold: usize,

    #[arg(long, default_value_t = 0, help = "Minimum latency in ms")]
    min_latency: u32,

    #[arg(long, default_value_t = 0, help = "Maximum latency in ms")]
    max_latency: u32,

    #[arg(long, default_value_t = 0, help = "Jitter in ms")]
    jitter: u32,

    #[arg(long, help = "Frame id at which the link goes down")]
    drop_at: Option<u32>,

    #[arg(long, default_value_t = 2000, help = "Outage length in ms")]
    drop_ms: u64,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, default_value_t = 120)]
    max_secs: u64,

    #[arg(long)]
    headless: bool,

    #[arg(long, help = "Write the received frame stream to this file")]
    record: Option<PathBuf>,

    #[arg(long, help = "Replay a recorded frame stream instead of running bots")]
    replay: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let sync = SyncConfig {
        tick_rate: args.tick_rate,
        jitter_threshold: args.jitter_threshold,
        ..Default::default()
    }
    .with_local_player(RED);

    let config = SimConfig {
        sync,
        render_fps: args.render_fps,
        link: LinkConditions {
            enabled: args.max_latency > 0 || args.jitter > 0,
            min_latency_ms: args.min_latency,
            max_latency_ms: args.max_latency,
            jitter_ms: args.jitter,
        },
        drop_at: args.drop_at,
        drop_ms: args.drop_ms,
        seed: args.seed,
        max_secs: args.max_secs,
        record: args.record,
        ..Default::default()
    };

    if args.headless || args.replay.is_some() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    if let Some(path) = &args.replay {
        let results = replay_file(path, config)?;
        print_results(&results);
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let results = if args.headless {
        log::info!("duel starting at {} fps", config.sync.tick_rate);
        runtime.block_on(run_match(config, &mut Headless::new()))?
    } else {
        let mut tui = Tui::new()?;
        let results = runtime.block_on(run_match(config, &mut tui));
        tui.restore_terminal()?;
        results?
    };

    print_results(&results);
    Ok(())
}

fn new_match(config: &SimConfig) -> Result<MatchContext> {
    let ctx = MatchContext::two_player(
        (PlayerId::from(RED), CombatantProfile::named("Red")),
        (PlayerId::from(BLUE), CombatantProfile::named("Blue")),
        config.sync.arena.clone(),
    )?;
    Ok(ctx)
}

async fn run_match(config: SimConfig, presenter: &mut impl Presenter) -> Result<Vec<MatchResult>> {
    let epoch = Epoch::start();
    let ctx = new_match(&config)?;

    let (uplink_tx, uplink_rx) = mpsc::channel(256);
    let (downlink_tx, downlink_rx) = mpsc::channel(1024);
    let (view_tx, view_rx) = watch::channel(ctx.snapshot());

    let relay = tokio::spawn(Relay::new(&config).run(epoch, uplink_rx, downlink_tx));
    let bots = [(RED, BLUE), (BLUE, RED)]
        .into_iter()
        .enumerate()
        .map(|(i, (me, them))| {
            let bot = Bot::new(me, them, config.seed.wrapping_add(i as u64 + 1));
            tokio::spawn(bot.run(epoch, view_rx.clone(), uplink_tx.clone()))
        })
        .collect::<Vec<_>>();

    let mut client = Client::new(config.clone(), ctx);
    let io = ClientIo {
        downlink: downlink_rx,
        uplink: uplink_tx,
        view: view_tx,
    };
    let outcome = client::run(&mut client, io, epoch, presenter).await;

    relay.abort();
    for bot in bots {
        bot.abort();
    }
    outcome?;

    let results = client.finish();
    if let Some(path) = &config.record {
        if let Some(log) = client.take_recording() {
            let frames = log.frames.len();
            std::fs::write(path, log.encode()?)
                .with_context(|| format!("writing frame log to {}", path.display()))?;
            log::info!("recorded {} frames to {}", frames, path.display());
        }
    }
    Ok(results)
}

fn replay_file(path: &Path, config: SimConfig) -> Result<Vec<MatchResult>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading frame log {}", path.display()))?;
    let log = FrameLog::decode(&bytes)
        .with_context(|| format!("decoding frame log {}", path.display()))?;
    if log.frames.is_empty() {
        bail!("frame log {} holds no frames", path.display());
    }
    log::info!("replaying {} frames from {}", log.frames.len(), path.display());

    let ctx = new_match(&config)?;
    let mut client = Client::new(config, ctx);
    let (report, events) = client.replay(log, 0);
    for event in events.iter().filter(|e| !e.is_noise()) {
        log::info!("{}", event.describe());
    }
    log::info!(
        "executed {} frames, resume complete: {}",
        report.frames_executed,
        report.reconnect_completed
    );
    Ok(client.finish())
}

fn print_results(results: &[MatchResult]) {
    for result in results {
        println!(
            "{:<6} {:>2} hp  {}",
            result.name,
            result.hit_points,
            if result.win { "WIN" } else { "" }
        );
    }
}
