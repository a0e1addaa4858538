//! Soundscape CLI - play, render, and list ambient noise profiles

use clap::{Parser, Subcommand};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use soundscape::{
    format_time, render_to_wav, CpalOutput, DurationPreset, EngineConfig, RenderRequest,
    SessionTimer, SoundProfileId, TimerState, MIN_SAMPLE_RATE,
};

#[derive(Parser)]
#[command(name = "soundscape")]
#[command(about = "Procedural ambient soundscapes for timed sessions", long_about = None)]
struct Cli {
    /// TOML config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a timed session on the default audio device
    Play {
        /// Sound profile: rain, wind or white
        #[arg(short, long)]
        sound: Option<SoundProfileId>,

        /// Session length in minutes: 3, 5 or 10
        #[arg(short, long)]
        minutes: Option<u32>,

        /// Start muted
        #[arg(long)]
        muted: bool,
    },

    /// Render a profile to a WAV file
    Render {
        /// Output WAV file path
        output: PathBuf,

        /// Sound profile: rain, wind or white
        #[arg(short, long, default_value = "rain")]
        sound: SoundProfileId,

        /// Duration in seconds (default: 10.0)
        #[arg(short = 'd', long, default_value = "10.0")]
        seconds: f32,

        /// Sample rate in Hz (default: 44100)
        #[arg(
            short = 'r',
            long,
            default_value = "44100",
            value_parser = clap::value_parser!(u32).range(MIN_SAMPLE_RATE as i64..)
        )]
        sample_rate: u32,

        /// Render with the master gain at zero
        #[arg(long)]
        muted: bool,

        /// Fixed noise seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the available profiles
    Profiles,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Play {
            sound,
            minutes,
            muted,
        } => play(&config, sound, minutes, muted),
        Commands::Render {
            output,
            sound,
            seconds,
            sample_rate,
            muted,
            seed,
        } => render(&config, &output, sound, seconds, sample_rate, muted, seed),
        Commands::Profiles => {
            list_profiles();
            Ok(())
        }
    }
}

fn list_profiles() {
    for id in SoundProfileId::ALL {
        let profile = id.resolve();
        print!(
            "{:<6} lowpass {:>6.0} Hz, Q {} dB",
            id, profile.filter_cutoff_hz, profile.filter_q_db
        );
        if let Some(m) = profile.modulation {
            print!(
                ", {:?} LFO {} Hz x {} -> {:?}",
                m.waveform, m.rate_hz, m.depth, m.target
            );
        }
        if let Some(base) = profile.secondary_gain_base {
            print!(", secondary gain {}", base);
        }
        println!();
    }
}

fn render(
    config: &EngineConfig,
    output: &Path,
    sound: SoundProfileId,
    seconds: f32,
    sample_rate: u32,
    muted: bool,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = RenderRequest {
        profile: sound,
        seconds,
        sample_rate,
        muted,
        seed,
    };
    let stats = render_to_wav(&request, config, output)?;
    stats.print_summary();
    Ok(())
}

/// Line commands accepted on stdin during `play`
#[derive(Debug, PartialEq)]
enum Command {
    Toggle,
    Mute,
    Sound(SoundProfileId),
    Minutes(DurationPreset),
    Reset,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let command = match words.next() {
        Some("toggle") | Some("t") => Command::Toggle,
        Some("mute") | Some("m") => Command::Mute,
        Some("reset") | Some("r") => Command::Reset,
        Some("quit") | Some("q") => Command::Quit,
        Some("sound") | Some("s") => {
            let name = words.next().ok_or("usage: sound <rain|wind|white>")?;
            Command::Sound(name.parse().map_err(|e| format!("{}", e))?)
        }
        Some("minutes") => {
            let minutes: u32 = words
                .next()
                .and_then(|w| w.parse().ok())
                .ok_or("usage: minutes <3|5|10>")?;
            Command::Minutes(
                DurationPreset::from_minutes(minutes).ok_or("minutes must be 3, 5 or 10")?,
            )
        }
        Some(other) => return Err(format!("unknown command '{}'", other)),
        None => return Err("empty command".to_string()),
    };
    Ok(command)
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn play(
    config: &EngineConfig,
    sound: Option<SoundProfileId>,
    minutes: Option<u32>,
    muted: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut timer = SessionTimer::new(CpalOutput::new(config.fallback_sample_rate), config);

    if let Some(sound) = sound {
        timer.change_profile(sound);
    }
    if let Some(minutes) = minutes {
        let preset = DurationPreset::from_minutes(minutes)
            .ok_or_else(|| format!("--minutes must be 3, 5 or 10, got {}", minutes))?;
        timer.change_preset(preset);
    }
    timer.set_muted(muted);

    println!("Commands: toggle, mute, sound <rain|wind|white>, minutes <3|5|10>, reset, quit");
    let lines = spawn_stdin_reader();

    timer.toggle();
    print_status(&timer);

    let tick = Duration::from_secs(1);
    let mut next_tick = Instant::now() + tick;

    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match lines.recv_timeout(wait) {
            Ok(line) => match parse_command(line.trim()) {
                Ok(Command::Toggle) => timer.toggle(),
                Ok(Command::Mute) => timer.toggle_mute(),
                Ok(Command::Sound(id)) => timer.change_profile(id),
                Ok(Command::Minutes(preset)) => {
                    if !timer.change_preset(preset) {
                        println!("Pause the session to change its length");
                    }
                }
                Ok(Command::Reset) => timer.reset(),
                Ok(Command::Quit) => break,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            },
            Err(RecvTimeoutError::Timeout) => {
                next_tick += tick;
                let was_running = timer.state() == TimerState::Running;
                timer.tick();
                if was_running && timer.state() == TimerState::Expired {
                    println!("Session complete. 'reset' to go again, 'quit' to leave.");
                }
                if timer.state() != TimerState::Running {
                    continue;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("stdin closed, ending session");
                break;
            }
        }
        print_status(&timer);
    }

    timer.session_mut().close();
    info!("Session ended");
    Ok(())
}

fn print_status(timer: &SessionTimer<CpalOutput>) {
    let state = match timer.state() {
        TimerState::Idle => "paused",
        TimerState::Running => "playing",
        TimerState::Expired => "done",
    };
    let mute = if timer.session().is_muted() { " (muted)" } else { "" };
    println!(
        "{} {} {}{}",
        format_time(timer.time_left()),
        state,
        timer.profile(),
        mute
    );
}
