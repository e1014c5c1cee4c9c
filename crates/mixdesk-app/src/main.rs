//! Mixdesk - headless mixing console
//!
//! Usage: `mixdesk <project> <command> [args]`
//!
//! Commands:
//! - `show`: channels, group rollups and splits
//! - `add <type>`: add a channel
//! - `snapshot <name>`: capture a snapshot
//! - `snapshots`: list snapshots
//! - `recall <name>`: recall the latest snapshot with that name
//! - `meters <ticks>`: print simulated meters for a number of ticks

use anyhow::{bail, Context, Result};
use mixdesk_core::{MixdeskConfig, Notice, ProjectId, Severity};
use mixdesk_meter::{MeterTicker, SimulatedMeterSource};
use mixdesk_session::{
    Applied, ChannelKind, MixerAction, MixerState, Persona, Session, StaticDirectory,
};
use mixdesk_store::{open_session, JsonFileStore, PersistEvent, Persister, ProjectStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PERSONAS_FILE: &str = "personas.json";

enum Command {
    Show,
    Add(ChannelKind),
    Snapshot(String),
    Snapshots,
    Recall(String),
    Meters(u64),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let arg = |i: usize, what: &str| {
            args.get(i)
                .cloned()
                .with_context(|| format!("missing {what}"))
        };
        let command = match args.first().map(String::as_str) {
            None | Some("show") => Self::Show,
            Some("add") => Self::Add(
                arg(1, "channel type")?
                    .parse()
                    .map_err(anyhow::Error::msg)?,
            ),
            Some("snapshot") => Self::Snapshot(arg(1, "snapshot name")?),
            Some("snapshots") => Self::Snapshots,
            Some("recall") => Self::Recall(arg(1, "snapshot name")?),
            Some("meters") => Self::Meters(
                arg(1, "tick count")?
                    .parse()
                    .context("tick count must be a number")?,
            ),
            Some(other) => bail!("unknown command: {other}"),
        };
        Ok(command)
    }

    fn mutates(&self) -> bool {
        matches!(self, Self::Add(_) | Self::Snapshot(_) | Self::Recall(_))
    }

    /// A session opened on fallback data must not be saved back over the
    /// stored project.
    fn check_writable(&self, recovered: bool) -> Result<()> {
        if recovered && self.mutates() {
            bail!("stored project could not be read cleanly; refusing to overwrite it");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((project, rest)) = args.split_first() else {
        bail!(
            "usage: mixdesk <project> \
             [show|add <type>|snapshot <name>|snapshots|recall <name>|meters <ticks>]"
        );
    };
    let project = ProjectId::from(project.as_str());
    let command = Command::parse(rest)?;

    let config = MixdeskConfig::load()?;
    info!(store = %config.store_dir.display(), project = %project, "Mixdesk starting");

    let store = Arc::new(JsonFileStore::new(&config.store_dir));
    let directory = load_personas(&store.project_dir(&project).join(PERSONAS_FILE))?;
    let opened = open_session(store.as_ref(), &project, &directory, &config);
    let mut session = opened.session;
    print_notices(&mut session);
    command.check_writable(opened.recovered)?;

    match &command {
        Command::Show => show(session.state()),
        Command::Add(kind) => {
            let action = MixerAction::AddChannel { kind: *kind };
            if let Ok(Applied::Channel(id)) = session.dispatch(action) {
                println!("added {kind} channel {id}");
            }
        }
        Command::Snapshot(name) => {
            let id = session.capture_snapshot(name.clone());
            println!("captured snapshot {name} ({id})");
        }
        Command::Snapshots => {
            for snapshot in session.snapshots().iter() {
                println!(
                    "{}  {:<20} {} channels",
                    snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    snapshot.name,
                    snapshot.channel_states.len()
                );
            }
        }
        Command::Recall(name) => {
            if let Ok(report) = session.recall_snapshot_named(name) {
                println!(
                    "recalled {name}: {} channels restored, {} skipped",
                    report.applied,
                    report.missing.len()
                );
            }
        }
        Command::Meters(ticks) => meters(&session, &config, *ticks).await,
    }
    print_notices(&mut session);

    if command.mutates() {
        let store: Arc<dyn ProjectStore> = store;
        let (persister, mut events) = Persister::spawn(store, project.clone());
        persister.save_session(&session);
        persister.shutdown().await?;
        while let Ok(event) = events.try_recv() {
            if let PersistEvent::Failed { error, .. } = event {
                session.report(&error);
            }
        }
        print_notices(&mut session);
    }
    Ok(())
}

/// Personas for this project, if a directory file is present.
fn load_personas(path: &Path) -> Result<StaticDirectory> {
    if !path.exists() {
        return Ok(StaticDirectory::default());
    }
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let personas: Vec<Persona> =
        serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(StaticDirectory::new(personas))
}

fn print_notices(session: &mut Session) {
    for Notice { severity, message, .. } in session.drain_notices() {
        let label = match severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!("{label}: {message}");
    }
}

fn show(state: &MixerState) {
    println!("{:<4} {:<12} {:<18} {:>6} {:>5}  flags", "#", "type", "name", "vol", "pan");
    for (i, channel) in state.channels.iter().enumerate() {
        let mut flags = String::new();
        if channel.muted {
            flags.push('M');
        }
        if channel.solo {
            flags.push('S');
        }
        if channel.solo_safe {
            flags.push('s');
        }
        if !state.channels.is_audible(channel) {
            flags.push_str(" (silent)");
        }
        println!(
            "{:<4} {:<12} {:<18} {:>6.1} {:>5.0}  {}",
            i,
            channel.kind(),
            channel.name,
            channel.volume,
            channel.pan,
            flags
        );
        for send in channel.sends() {
            println!(
                "       -> {:<16} {:>5.1}{}",
                send.target,
                send.level,
                if send.pre_fader { " pre" } else { "" }
            );
        }
    }

    for (id, rollup) in state.group_rollups() {
        if let Some(group) = state.groups.get(id) {
            println!(
                "group {:<16} {} members, mean vol {:.1}{}{}",
                group.name,
                rollup.member_count,
                rollup.mean_volume,
                if rollup.all_muted { ", muted" } else { "" },
                if rollup.any_solo { ", solo" } else { "" }
            );
        }
    }

    let splits = &state.splits;
    if !splits.is_empty() {
        println!("splits ({}):", if splits.auto_split() { "auto" } else { "manual" });
        for entry in splits.entries() {
            println!(
                "  {:<16} {:<16} {:>6.2}%",
                entry.persona_id, entry.owner_id, entry.percentage
            );
        }
        if !splits.is_balanced() {
            warn!(total = splits.total(), "Splits do not add up to 100");
        }
    }
}

async fn meters(session: &Session, config: &MixdeskConfig, ticks: u64) {
    let ticker = MeterTicker::spawn(
        session.subscribe(),
        SimulatedMeterSource::from_config(config),
        config.meter_interval(),
    );
    let mut frames = ticker.frames();
    let mut seen = 0;
    while seen < ticks && frames.changed().await.is_ok() {
        let frame = Arc::clone(&frames.borrow_and_update());
        seen += 1;
        println!("tick {}", frame.tick);
        for reading in &frame.readings {
            let name = session
                .state()
                .channels
                .get(reading.channel_id)
                .map(|c| c.name.as_str())
                .unwrap_or("?");
            println!(
                "  {:<18} L {:<20} R {:<20} peak {:.2}",
                name,
                bar(reading.left),
                bar(reading.right),
                reading.peak
            );
        }
    }
    ticker.stop();
}

fn bar(level: f32) -> String {
    "#".repeat((level.clamp(0.0, 1.0) * 20.0).round() as usize)
}
