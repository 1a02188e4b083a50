//! Line-oriented command surface
//!
//! Reads one command per line, forwards it to the player task and prints
//! replies. Single keys (`n`, `p`, `l`, `s`, `m`, `space`, `shift+up`, ...)
//! go through the same shortcut table as the graphical player bar.

use std::fmt::Write as _;
use std::io::Write;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tunez_core::{format_duration, ImageQuality, StreamQuality, Track};
use tunez_playback::{KeyInput, PlaybackEvent, PlayerCommand, PlayerHandle, PlayerStatus};

use crate::error::Result;

pub const HELP: &str = "\
commands:
  play | pause          toggle playback
  next | prev           skip
  seek <secs>           jump within the track
  vol <0..1>            set volume (0 mutes)
  mute                  toggle mute
  shuffle               toggle shuffle
  loop                  cycle loop mode
  jump <n>              play queue entry n
  remove <n>            drop queue entry n
  move <from> <to>      reorder the queue
  clear                 empty the queue
  quality <tier>        stream quality (poor, low, medium, high, excellent)
  download <tier>       download quality
  images <tier>         artwork quality (low, medium, high)
  open | close          show or hide the now-playing overlay
  status | queue        show the player or the queue
  quit
keys: space, n, p, l, s, m, shift+left/right/up/down";

/// A parsed input line
#[derive(Debug)]
pub enum ShellCommand {
    Player(PlayerCommand),
    Status,
    Queue,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid {argument}: '{value}'")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },
}

/// Parse one input line; blank lines yield `None`
///
/// Queue positions are 1-based, as printed by `queue`.
pub fn parse_line(line: &str) -> std::result::Result<Option<ShellCommand>, ShellError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let head = head.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let command = match head.as_str() {
        "play" | "pause" => ShellCommand::Player(PlayerCommand::PlayPause),
        "next" => ShellCommand::Player(PlayerCommand::Next),
        "prev" | "previous" => ShellCommand::Player(PlayerCommand::Previous),
        "seek" => ShellCommand::Player(PlayerCommand::Seek(number(&args, "seek", "seconds")?)),
        "vol" | "volume" => {
            ShellCommand::Player(PlayerCommand::SetVolume(number(&args, "vol", "a level")?))
        }
        "mute" => ShellCommand::Player(PlayerCommand::ToggleMute),
        "shuffle" => ShellCommand::Player(PlayerCommand::ToggleShuffle),
        "loop" => ShellCommand::Player(PlayerCommand::CycleLoop),
        "jump" => ShellCommand::Player(PlayerCommand::PlayIndex(position(&args, 0, "jump")?)),
        "remove" => {
            ShellCommand::Player(PlayerCommand::RemoveFromQueue(position(&args, 0, "remove")?))
        }
        "move" => ShellCommand::Player(PlayerCommand::MoveInQueue {
            from: position(&args, 0, "move")?,
            to: position(&args, 1, "move")?,
        }),
        "clear" => ShellCommand::Player(PlayerCommand::ClearQueue),
        "quality" => ShellCommand::Player(PlayerCommand::SetStreamQuality(stream_tier(
            &args, "quality",
        )?)),
        "download" => ShellCommand::Player(PlayerCommand::SetDownloadQuality(stream_tier(
            &args, "download",
        )?)),
        "images" => {
            let tier = argument(&args, 0, "images", "a tier")?;
            let quality = tier
                .parse::<ImageQuality>()
                .map_err(|_| ShellError::InvalidArgument {
                    argument: "image quality",
                    value: tier.to_string(),
                })?;
            ShellCommand::Player(PlayerCommand::SetImageQuality(quality))
        }
        "open" => ShellCommand::Player(PlayerCommand::SetNowPlayingOpen(true)),
        "close" => ShellCommand::Player(PlayerCommand::SetNowPlayingOpen(false)),
        "status" => ShellCommand::Status,
        "queue" => ShellCommand::Queue,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        _ => match KeyInput::parse(line) {
            Some(input) if args.is_empty() => ShellCommand::Player(PlayerCommand::Key(input)),
            _ => return Err(ShellError::Unknown(head)),
        },
    };

    Ok(Some(command))
}

fn argument<'a>(
    args: &[&'a str],
    index: usize,
    command: &'static str,
    argument: &'static str,
) -> std::result::Result<&'a str, ShellError> {
    args.get(index)
        .copied()
        .ok_or(ShellError::MissingArgument { command, argument })
}

fn number<T: std::str::FromStr>(
    args: &[&str],
    command: &'static str,
    name: &'static str,
) -> std::result::Result<T, ShellError> {
    let value = argument(args, 0, command, name)?;
    value.parse().map_err(|_| ShellError::InvalidArgument {
        argument: name,
        value: value.to_string(),
    })
}

/// 1-based queue position to a 0-based index
fn position(
    args: &[&str],
    index: usize,
    command: &'static str,
) -> std::result::Result<usize, ShellError> {
    let value = argument(args, index, command, "a queue position")?;
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(ShellError::InvalidArgument {
            argument: "queue position",
            value: value.to_string(),
        }),
    }
}

fn stream_tier(args: &[&str], command: &'static str) -> std::result::Result<StreamQuality, ShellError> {
    let tier = argument(args, 0, command, "a tier")?;
    tier.parse().map_err(|_| ShellError::InvalidArgument {
        argument: "stream quality",
        value: tier.to_string(),
    })
}

/// One-line summary of the player
pub fn render_status(status: &PlayerStatus) -> String {
    let mut out = String::new();

    match &status.track {
        Some(track) => {
            let _ = write!(
                out,
                "[{}] {}/{} {}",
                status.state,
                status.index + 1,
                status.queue_len,
                track_label(track)
            );
        }
        None => {
            let _ = write!(out, "[{}] queue empty", status.state);
        }
    }

    let _ = write!(
        out,
        " | {} / {}",
        format_duration(status.engine.position_secs),
        format_duration(status.engine.duration_secs)
    );

    if status.volume.muted {
        out.push_str(" | muted");
    } else {
        let _ = write!(out, " | vol {:.0}%", status.displayed_volume * 100.0);
    }

    let mode = status.mode;
    let _ = write!(out, " | loop {}", mode.loop_mode().as_str());
    if mode.shuffle {
        out.push_str(" | shuffle");
    }
    let _ = write!(out, " | {}", status.stream_quality);

    if let Some(error) = &status.last_error {
        let _ = write!(out, " | error: {error}");
    }

    out
}

/// Numbered queue listing with the current entry marked
pub fn render_queue(queue: &[Track], current: usize) -> String {
    if queue.is_empty() {
        return "queue is empty".to_string();
    }

    queue
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if i == current { '>' } else { ' ' };
            let length = track
                .duration
                .map(|secs| format!(" ({})", format_duration(secs)))
                .unwrap_or_default();
            format!("{marker} {:>3}. {}{length}", i + 1, track_label(track))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn track_label(track: &Track) -> String {
    let artists = track.artist_names();
    if artists.is_empty() {
        track.name.clone()
    } else {
        format!("{} - {}", track.name, artists)
    }
}

/// Line to print for an event, if it is worth showing
pub fn render_event(event: &PlaybackEvent) -> Option<String> {
    match event {
        PlaybackEvent::TrackChanged {
            index, track_id, ..
        } => Some(format!("now loading #{} ({track_id})", index + 1)),
        PlaybackEvent::StateChanged { state } => Some(format!("{state}")),
        PlaybackEvent::VolumeChanged { level, muted } => Some(if *muted {
            "muted".to_string()
        } else {
            format!("volume {:.0}%", level * 100.0)
        }),
        PlaybackEvent::ModeChanged { mode } => Some(format!(
            "shuffle {} | loop {}",
            if mode.shuffle { "on" } else { "off" },
            mode.loop_mode().as_str()
        )),
        PlaybackEvent::Notice { message } => Some(message.clone()),
        PlaybackEvent::Error { message } => Some(format!("error: {message}")),
        PlaybackEvent::QueueChanged { .. } | PlaybackEvent::PositionUpdate { .. } => None,
    }
}

/// Read commands from `input` until EOF or `quit`
pub async fn run<R, W>(player: &PlayerHandle, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Status => writeln!(out, "{}", render_status(&player.status().await?))?,
            ShellCommand::Queue => {
                let status = player.status().await?;
                let queue = player.queue().await?;
                writeln!(out, "{}", render_queue(&queue, status.index))?;
            }
            ShellCommand::Player(command) => player.send(command)?,
        }
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunez_playback::{Key, PlaybackState};

    fn player(line: &str) -> PlayerCommand {
        match parse_line(line) {
            Ok(Some(ShellCommand::Player(command))) => command,
            other => panic!("'{line}' parsed to {other:?}"),
        }
    }

    #[test]
    fn parses_transport_commands() {
        assert!(matches!(player("play"), PlayerCommand::PlayPause));
        assert!(matches!(player("  NEXT "), PlayerCommand::Next));
        assert!(matches!(player("prev"), PlayerCommand::Previous));
        assert!(matches!(player("seek 42.5"), PlayerCommand::Seek(s) if s == 42.5));
        assert!(matches!(player("vol 0.4"), PlayerCommand::SetVolume(v) if v == 0.4));
        assert!(matches!(player("loop"), PlayerCommand::CycleLoop));
    }

    #[test]
    fn queue_positions_are_one_based() {
        assert!(matches!(player("jump 3"), PlayerCommand::PlayIndex(2)));
        assert!(matches!(player("remove 1"), PlayerCommand::RemoveFromQueue(0)));
        assert!(matches!(
            player("move 2 5"),
            PlayerCommand::MoveInQueue { from: 1, to: 4 }
        ));
        assert!(matches!(
            parse_line("jump 0"),
            Err(ShellError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn parses_qualities() {
        assert!(matches!(
            player("quality low"),
            PlayerCommand::SetStreamQuality(StreamQuality::Low)
        ));
        assert!(matches!(
            player("images medium"),
            PlayerCommand::SetImageQuality(ImageQuality::Medium)
        ));
        assert_eq!(
            parse_line("quality lossless").unwrap_err(),
            ShellError::InvalidArgument {
                argument: "stream quality",
                value: "lossless".to_string()
            }
        );
    }

    #[test]
    fn single_keys_become_shortcuts() {
        assert!(matches!(
            player("n"),
            PlayerCommand::Key(KeyInput { key: Key::Char('n'), shift: false })
        ));
        assert!(matches!(
            player("shift+up"),
            PlayerCommand::Key(KeyInput { key: Key::ArrowUp, shift: true })
        ));
        assert!(matches!(player("space"), PlayerCommand::Key(_)));
    }

    #[test]
    fn reports_bad_input() {
        assert!(parse_line("   ").unwrap().is_none());
        assert_eq!(
            parse_line("rewind").unwrap_err(),
            ShellError::Unknown("rewind".to_string())
        );
        assert_eq!(
            parse_line("seek").unwrap_err(),
            ShellError::MissingArgument {
                command: "seek",
                argument: "seconds"
            }
        );
        assert!(matches!(parse_line("q"), Ok(Some(ShellCommand::Quit))));
    }

    #[test]
    fn renders_queue_with_marker() {
        let mut first = Track::new("a", "Intro");
        first.duration = Some(65.0);
        let second = Track::new("b", "Outro");

        let text = render_queue(&[first, second], 1);
        assert_eq!(text, "    1. Intro (1:05)\n>   2. Outro");
        assert_eq!(render_queue(&[], 0), "queue is empty");
    }

    #[test]
    fn quiet_events_are_skipped() {
        assert!(render_event(&PlaybackEvent::PositionUpdate {
            position_secs: 1.0,
            duration_secs: 2.0
        })
        .is_none());
        assert_eq!(
            render_event(&PlaybackEvent::StateChanged {
                state: PlaybackState::Paused
            })
            .as_deref(),
            Some("paused")
        );
        assert_eq!(
            render_event(&PlaybackEvent::Notice {
                message: "Looping playlist".to_string()
            })
            .as_deref(),
            Some("Looping playlist")
        );
    }
}
