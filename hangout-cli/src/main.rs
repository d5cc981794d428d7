use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use colored::*;
use dialoguer::Input;
use hangout_client::{
    ClientConfig, LocalTrack, MediaDevices, RoomChange, RtcTransportFactory, SampleDevices,
    Session, SessionEvent, SessionHandle,
};
use hangout_core::{Animation, JoinRequest, MediaKind, Position};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hangout")]
#[command(about = "Join a hangout room from the terminal")]
struct Cli {
    /// Signaling endpoint.
    #[arg(long, env = "HANGOUT_ENDPOINT", default_value = "ws://localhost:3001/stream")]
    endpoint: String,

    /// Display name.
    #[arg(short, long, env = "HANGOUT_NAME", default_value = "terminal")]
    name: String,

    /// What you are up to; picks the themed room.
    #[arg(short, long, env = "HANGOUT_ACTIVITY", default_value = "hanging out")]
    activity: String,

    #[arg(long, env = "HANGOUT_COLOR", default_value = "#f4a261")]
    color: String,

    /// Publish an audio track after joining. There is no capture backend;
    /// the track carries Opus silence so peers see a live microphone.
    #[arg(long)]
    mic: bool,
}

/// Opus frame that decodes to 20ms of silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];
const OPUS_FRAME: Duration = Duration::from_millis(20);

/// Keeps a sample track fed until it is stopped.
async fn feed_silence(track: LocalTrack) {
    let mut interval = tokio::time::interval(OPUS_FRAME);
    loop {
        interval.tick().await;
        if track.is_ended() {
            break;
        }
        track
            .write_sample(Bytes::from_static(&OPUS_SILENCE), OPUS_FRAME)
            .await;
    }
}

async fn publish_mic(handle: SessionHandle, devices: Arc<SampleDevices>) -> Result<()> {
    let track = devices.open(MediaKind::Audio).await?;
    tokio::spawn(feed_silence(track.clone()));
    let published = handle.publish(track.clone()).await;
    if published.is_err() {
        track.stop();
    }
    let published = published?;
    info!("Microphone live as {}", published.publisher_id);
    Ok(())
}

enum Line {
    Chat(String),
    Move(Position),
    Animate(Animation),
    Quit,
    Ignored,
}

fn parse_line(line: &str) -> Line {
    let line = line.trim();
    let mut words = line.split_whitespace();
    match words.next() {
        None => Line::Ignored,
        Some("/quit") => Line::Quit,
        Some("/wave") => Line::Animate(Animation::Wave),
        Some("/jump") => Line::Animate(Animation::Jump),
        Some("/dance") => Line::Animate(Animation::Dance),
        Some("/move") => {
            let coords: Vec<f32> = words.filter_map(|w| w.parse().ok()).collect();
            match coords.as_slice() {
                [x, z] => Line::Move(Position::new(*x, 0.0, *z)),
                _ => {
                    println!("{}", "usage: /move <x> <z>".yellow());
                    Line::Ignored
                }
            }
        }
        Some(cmd) if cmd.starts_with('/') => {
            println!("{} {}", "unknown command".yellow(), cmd);
            Line::Ignored
        }
        Some(_) => Line::Chat(line.to_owned()),
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::RoomJoined {
            local_player_id,
            room_theme,
        } => println!(
            "{} {} as {}",
            "joined".green().bold(),
            room_theme.cyan(),
            local_player_id.short()
        ),
        SessionEvent::Room(RoomChange::Added(id)) => {
            println!("{} {}", "+".green(), id.short())
        }
        SessionEvent::Room(RoomChange::Removed(id)) => {
            println!("{} {}", "-".red(), id.short())
        }
        SessionEvent::Room(_) => {}
        SessionEvent::Chat { sender, message } => {
            println!("{} {}", format!("[{sender}]").bold(), message)
        }
        SessionEvent::TrackBound(binding) => println!(
            "{} {} from {}",
            "hearing".blue(),
            binding.media_kind,
            binding.owner_player_id.short()
        ),
        SessionEvent::TrackReleased(released) => {
            println!("{} {}", "dropped track".dimmed(), released.publisher_id)
        }
        SessionEvent::PublicationLive(handle) => {
            println!("{} {}", "live".green(), handle.kind)
        }
        SessionEvent::PublicationFailed {
            publisher_id,
            reason,
        } => println!("{} {}: {}", "publish failed".red(), publisher_id, reason),
        SessionEvent::SubscribeFailed {
            publisher_id,
            reason,
        } => println!("{} {}: {}", "subscribe failed".red(), publisher_id, reason),
        SessionEvent::TransportReset { role, reason } => {
            println!("{} {} ({})", "reset".yellow(), role, reason)
        }
        SessionEvent::Disconnected(reason) => {
            println!("{} {}", "disconnected".red().bold(), reason)
        }
    }
}

/// Blocking prompt loop; lines are handed to the async side.
fn read_lines(tx: mpsc::UnboundedSender<String>) {
    loop {
        let line: String = match Input::new().allow_empty(true).interact_text() {
            Ok(line) => line,
            Err(_) => break,
        };
        if tx.send(line).is_err() {
            break;
        }
    }
}

async fn drive(handle: SessionHandle, mut lines: mpsc::UnboundedReceiver<String>) -> Result<()> {
    let mut position = Position::ORIGIN;
    while let Some(line) = lines.recv().await {
        let sent = match parse_line(&line) {
            Line::Chat(text) => handle.chat(text).await,
            Line::Move(target) => {
                let facing = (target.x - position.x).atan2(target.z - position.z);
                position = target;
                handle.move_to(target, facing, false).await
            }
            Line::Animate(animation) => handle.play_animation(animation).await,
            Line::Quit => break,
            Line::Ignored => Ok(()),
        };
        if sent.is_err() {
            break;
        }
    }
    handle.leave().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hangout=info,hangout_client=info")),
        )
        .init();

    let cli = Cli::parse();
    let join = JoinRequest::new(&cli.name, &cli.activity).with_color(&cli.color);
    let config = ClientConfig::new(&cli.endpoint, join);

    println!("{}", format!("Connecting to {}...", cli.endpoint).cyan());
    let devices = Arc::new(SampleDevices::all());
    let (handle, _view, mut events) = Session::connect(
        config,
        Arc::new(RtcTransportFactory),
        devices.clone(),
    )
    .await
    .context("Failed to reach the signaling server")?;
    info!("Connected");

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
            if matches!(event, SessionEvent::Disconnected(_)) {
                break;
            }
        }
    });

    if cli.mic {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = publish_mic(handle, devices).await {
                warn!("Microphone not published: {:#}", e);
            }
        });
    }

    println!(
        "{}",
        "Type to chat. /move <x> <z>, /wave, /jump, /dance, /quit".dimmed()
    );
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || read_lines(line_tx));

    drive(handle, line_rx).await?;
    let _ = printer.await;
    Ok(())
}
