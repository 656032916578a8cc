//! Interactive command parsing

use encore_playback::{RepeatMode, SeekTarget, SessionCommand};
use std::time::Duration;

/// One line of user input
#[derive(Debug)]
pub enum Input {
    /// Forward to the session
    Session(SessionCommand),

    /// Like or unlike whatever is playing
    LikeCurrent,

    /// Print the session snapshot
    Status,

    /// Let playback run before reading the next line (scripted input)
    Wait(Duration),

    /// Print the command list
    Help,

    /// Stop the session and exit
    Quit,
}

/// Help text for the interactive prompt
pub const HELP: &str = "\
Commands:
  p, play, pause        toggle play/pause
  n, next               skip to the next track
  b, prev               skip back
  j, jump <index>       jump to a queue position
  s, seek <secs|pct%>   seek within the track
  v, vol <0-100>        set volume
  m, mute [on|off]      toggle or set mute
  shuffle               toggle shuffle
  r, repeat [mode]      cycle repeat or set off/all/one
  l, like               toggle like on the current track
  st, status            show playback state
  w, wait <secs>        let playback run
  x, stop               dismiss the player
  q, quit               exit";

/// Parse one input line
///
/// Empty lines are not commands; callers skip them before parsing.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let command = words
        .next()
        .ok_or_else(|| "Empty command".to_string())?
        .to_ascii_lowercase();
    let argument = words.next();

    let input = match command.as_str() {
        "p" | "play" | "pause" | "toggle" => Input::Session(SessionCommand::TogglePlayPause),
        "n" | "next" => Input::Session(SessionCommand::SkipNext),
        "b" | "prev" | "previous" => Input::Session(SessionCommand::SkipPrevious),
        "j" | "jump" => {
            let index = required(argument, "jump <index>")?
                .parse::<usize>()
                .map_err(|_| "Queue index must be a non-negative integer".to_string())?;
            Input::Session(SessionCommand::JumpTo(index))
        }
        "s" | "seek" => Input::Session(SessionCommand::Seek(parse_seek(required(
            argument,
            "seek <secs|pct%>",
        )?)?)),
        "v" | "vol" | "volume" => {
            let level = required(argument, "vol <0-100>")?
                .parse::<u8>()
                .map_err(|_| "Volume must be between 0 and 100".to_string())?;
            Input::Session(SessionCommand::SetVolume(level))
        }
        "m" | "mute" => match argument {
            Some("on") => Input::Session(SessionCommand::SetMuted(true)),
            Some("off") => Input::Session(SessionCommand::SetMuted(false)),
            Some(other) => return Err(format!("Usage: mute [on|off], got '{other}'")),
            None => Input::Session(SessionCommand::ToggleMute),
        },
        "shuffle" => Input::Session(SessionCommand::ToggleShuffle),
        "r" | "repeat" => match argument {
            Some(mode) => Input::Session(SessionCommand::SetRepeatMode(
                mode.parse::<RepeatMode>()?,
            )),
            None => Input::Session(SessionCommand::CycleRepeatMode),
        },
        "l" | "like" => Input::LikeCurrent,
        "st" | "status" => Input::Status,
        "w" | "wait" => {
            let secs = required(argument, "wait <secs>")?
                .parse::<f64>()
                .ok()
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .ok_or_else(|| "Wait time must be a non-negative number".to_string())?;
            Input::Wait(Duration::from_secs_f64(secs))
        }
        "x" | "stop" => Input::Session(SessionCommand::Dismiss),
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => return Err(format!("Unknown command '{other}' (try 'help')")),
    };

    Ok(input)
}

fn required<'a>(argument: Option<&'a str>, usage: &str) -> Result<&'a str, String> {
    argument.ok_or_else(|| format!("Usage: {usage}"))
}

/// `90` seeks to 90 s, `1:30` too, `25%` to a quarter of the track
fn parse_seek(raw: &str) -> Result<SeekTarget, String> {
    if let Some(percent) = raw.strip_suffix('%') {
        return percent
            .parse::<f64>()
            .map(SeekTarget::from_percent)
            .map_err(|_| format!("Invalid seek percentage '{raw}'"));
    }

    if let Some((minutes, seconds)) = raw.split_once(':') {
        let minutes: u32 = minutes
            .parse()
            .map_err(|_| format!("Invalid seek time '{raw}'"))?;
        let seconds: f64 = seconds
            .parse()
            .map_err(|_| format!("Invalid seek time '{raw}'"))?;
        return Ok(SeekTarget::Seconds(f64::from(minutes) * 60.0 + seconds));
    }

    raw.parse::<f64>()
        .map(SeekTarget::Seconds)
        .map_err(|_| format!("Invalid seek time '{raw}'"))
}
