//! Ping-Pong Rally
//!
//! Spawns pairs of actors that bounce a ball back and forth on a local
//! runtime, waits until every actor has retired itself, then reports the
//! runtime counters. Exercises spawn-from-handler, dispatch and finish.

use actor_kernel::{
    init_tracing, ActorConfig, ActorPid, HandlerBase, LocalRuntime, LogFormat, NoTransport, Runtime,
    RuntimeSettings, TokioScheduler,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "ping_pong", about = "Run actor rallies on the local actor runtime")]
struct Args {
    /// TOML settings file (ACTOR_KERNEL_* environment variables still apply)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of independent rallies
    #[arg(long, default_value_t = 4)]
    pairs: u64,

    /// Hits per rally
    #[arg(long, default_value_t = 1000)]
    rounds: u64,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

struct Player;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PlayerState {
    rounds: u64,
    returned: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Volley {
    Serve,
    Ball { hits: u64, reply_to: ActorPid },
    Over,
}

impl ActorConfig for Player {
    type State = PlayerState;
    type Message = Volley;
    const TYPE_NAME: &'static str = "PingPongPlayer";

    fn handle<R: Runtime>(mut handler: HandlerBase<'_, R, PlayerState>, message: Volley) -> PlayerState {
        match message {
            Volley::Serve => {
                let partner = PlayerState {
                    rounds: handler.state.rounds,
                    returned: 0,
                };
                let ball = Volley::Ball {
                    hits: 0,
                    reply_to: handler.pid().clone(),
                };
                handler.spawn::<Player>(partner, ball);
            }
            Volley::Ball { hits, reply_to } => {
                handler.state.returned += 1;
                if hits >= handler.state.rounds {
                    handler.dispatch(reply_to, Volley::Over);
                    handler.finish();
                } else {
                    let ball = Volley::Ball {
                        hits: hits + 1,
                        reply_to: handler.pid().clone(),
                    };
                    handler.dispatch(reply_to, ball);
                }
            }
            Volley::Over => handler.finish(),
        }
        handler.into_state()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = RuntimeSettings::load(args.config.as_deref()).context("Failed to load runtime settings")?;

    let format = if args.json_logs { LogFormat::Json } else { LogFormat::Pretty };
    init_tracing(&settings.log_filter, format).context("Failed to initialise logging")?;

    let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(settings.worker_threads)
        .thread_name("actor-worker")
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    info!(
        server = %settings.server,
        pairs = args.pairs,
        rounds = args.rounds,
        worker_threads = settings.worker_threads,
        "Starting rallies"
    );

    let scheduler = Arc::new(TokioScheduler::new(tokio_runtime.handle().clone()));
    let runtime = LocalRuntime::new(settings, scheduler, Arc::new(NoTransport));

    let started = Instant::now();
    for _ in 0..args.pairs {
        let state = PlayerState {
            rounds: args.rounds,
            returned: 0,
        };
        runtime.spawn::<Player>("_system", state, Volley::Serve);
    }

    let deadline = Duration::from_secs(args.timeout_secs);
    let finished = tokio_runtime.block_on(async {
        while runtime.actor_count() > 0 {
            if started.elapsed() > deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    });

    let stats = runtime.stats();
    let elapsed = started.elapsed();
    runtime.shutdown();

    if !finished {
        warn!(remaining = stats.live_actors(), "Rallies did not finish in time");
        bail!("rallies did not finish within {} seconds", args.timeout_secs);
    }

    let messages = stats.local_dispatches;
    info!(
        elapsed_ms = elapsed.as_millis() as u64,
        actors_spawned = stats.actors_spawned,
        actors_finished = stats.actors_finished,
        local_dispatches = stats.local_dispatches,
        actors_not_found = stats.actors_not_found,
        messages_per_sec = messages as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        "All rallies finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
