use anyhow::{anyhow, bail, Context, Result};
use std::str::FromStr;

/// One line typed on stdin while the player runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Toggle,
    Next,
    Previous,
    Seek(f64),
    Drag { x: f64, width: f64 },
    Move { x: f64, width: f64 },
    Release,
    Volume(f64),
    Mute,
    Status,
    List,
    Quit,
}

fn number(arg: Option<&str>, what: &str) -> Result<f64> {
    let raw = arg.ok_or_else(|| anyhow!("missing {what}"))?;
    raw.parse::<f64>()
        .with_context(|| format!("invalid {what}: {raw}"))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| anyhow!("empty command"))?;
        let cmd = match verb {
            "play" | "pause" | "toggle" => Command::Toggle,
            "next" => Command::Next,
            "prev" | "previous" => Command::Previous,
            "seek" => Command::Seek(number(parts.next(), "position")?),
            "drag" | "move" => {
                let x = number(parts.next(), "pointer x")?;
                let width = number(parts.next(), "track width")?;
                if verb == "drag" {
                    Command::Drag { x, width }
                } else {
                    Command::Move { x, width }
                }
            }
            "release" => Command::Release,
            "volume" | "vol" => Command::Volume(number(parts.next(), "volume")?),
            "mute" => Command::Mute,
            "status" => Command::Status,
            "list" | "ls" => Command::List,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{other}`"),
        };
        Ok(cmd)
    }
}
