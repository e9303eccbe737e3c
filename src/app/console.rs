//! Line-based console input standing in for a keyboard and menu

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::game::catalog::UnknownCharacter;
use crate::game::{CharacterType, PlayerId};

/// Console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the held action codes (`keys` alone releases everything)
    Keys(Vec<String>),
    /// Pick an archetype for a slot
    Select { slot: PlayerId, character: CharacterType },
    Start,
    Menu,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Character(#[from] UnknownCharacter),
}

pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(CommandError::Empty);
    };

    match verb.to_ascii_lowercase().as_str() {
        "keys" => Ok(Command::Keys(words.map(str::to_string).collect())),
        "select" => {
            const USAGE: &str = "select <1|2> <ARCHETYPE>";
            let slot = match words.next() {
                Some("1") => 1,
                Some("2") => 2,
                _ => return Err(CommandError::Usage(USAGE)),
            };
            let character = words.next().ok_or(CommandError::Usage(USAGE))?.parse()?;
            Ok(Command::Select { slot, character })
        }
        "start" => Ok(Command::Start),
        "menu" => Ok(Command::Menu),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

/// Forward parsed commands until input ends or the receiver goes away
pub async fn read_commands<R>(reader: R, tx: mpsc::Sender<Command>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse(&line) {
                Ok(cmd) => {
                    if tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                Err(CommandError::Empty) => {}
                Err(e) => warn!(error = %e, "Bad console command"),
            },
            Ok(None) => {
                debug!("Console input closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Console read failed");
                break;
            }
        }
    }
}

/// Read commands from stdin in the background
pub fn spawn_stdin(tx: mpsc::Sender<Command>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(read_commands(tokio::io::BufReader::new(tokio::io::stdin()), tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        assert_eq!(
            parse("keys KeyA Space").unwrap(),
            Command::Keys(vec!["KeyA".into(), "Space".into()])
        );
        assert_eq!(parse("keys").unwrap(), Command::Keys(vec![]));
        assert_eq!(
            parse("select 2 flat_stanley").unwrap(),
            Command::Select {
                slot: 2,
                character: CharacterType::FlatStanley
            }
        );
        assert_eq!(parse("  START ").unwrap(), Command::Start);
        assert_eq!(parse("menu").unwrap(), Command::Menu);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(parse(""), Err(CommandError::Empty)));
        assert!(matches!(parse("jump"), Err(CommandError::Unknown(_))));
        assert!(matches!(parse("select 3 TINY_TIM"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("select 1"), Err(CommandError::Usage(_))));
        assert!(matches!(parse("select 1 NINJA"), Err(CommandError::Character(_))));
    }

    #[tokio::test]
    async fn reader_skips_bad_lines() {
        let input = tokio_test::io::Builder::new()
            .read(b"select 1 TINY_TIM\n\nwobble\n")
            .read(b"start\n")
            .build();
        let (tx, mut rx) = mpsc::channel(8);
        read_commands(tokio::io::BufReader::new(input), tx).await;

        assert_eq!(
            rx.recv().await,
            Some(Command::Select {
                slot: 1,
                character: CharacterType::TinyTim
            })
        );
        assert_eq!(rx.recv().await, Some(Command::Start));
        assert_eq!(rx.recv().await, None);
    }
}
