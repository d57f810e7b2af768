//! Interactive session: one typed command per user action.

use std::io::{BufRead, Write};
use std::time::Instant;

use watch_core::grid::DisclosureKind;
use watch_core::{Skill, WatchApp};

use crate::render;

pub const HELP: &str = "\
Commands:
  roll all                      roll every skill
  roll <skill>                  roll one skill
  set <skill> <1-20|->          enter a roll by hand (- clears it)
  watch                         generate a watch (climate roll + grid)
  update                        redraw the grid with the current rolls
  click <terrain>               move a terrain between selected and available
  expand <terrain> velocity|oppressive
                                open or close a description
  reload                        fetch the config again if it failed
  status                        show the current screen
  help                          show this list
  quit                          leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RollAll,
    Roll(Skill),
    Set(Skill, String),
    Watch,
    Update,
    Click(String),
    Expand(String, DisclosureKind),
    Reload,
    Status,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let skill = |word: &str| word.parse::<Skill>().map_err(|e| e.to_string());
    match words.as_slice() {
        ["roll", "all"] => Ok(Command::RollAll),
        ["roll", name] => Ok(Command::Roll(skill(*name)?)),
        ["set", name, "-"] => Ok(Command::Set(skill(*name)?, String::new())),
        ["set", name, value] => Ok(Command::Set(skill(*name)?, value.to_string())),
        ["watch"] | ["generate"] => Ok(Command::Watch),
        ["update"] => Ok(Command::Update),
        ["click", terrain] => Ok(Command::Click(terrain.to_string())),
        ["expand", terrain, kind] => {
            let kind = match *kind {
                "velocity" => DisclosureKind::Velocity,
                "oppressive" => DisclosureKind::Oppressive,
                other => return Err(format!("unknown disclosure '{}'", other)),
            };
            Ok(Command::Expand(terrain.to_string(), kind))
        }
        ["reload"] => Ok(Command::Reload),
        ["status"] => Ok(Command::Status),
        ["help"] | ["?"] => Ok(Command::Help),
        ["quit"] | ["exit"] => Ok(Command::Quit),
        [] => Err("empty command".to_string()),
        _ => Err(format!("unrecognized command '{}' (try 'help')", line.trim())),
    }
}

/// Apply one command. Errors are already reflected in the status line, so the
/// result only says whether to keep going.
pub fn apply(app: &mut WatchApp, command: &Command) -> bool {
    let outcome = match command {
        Command::RollAll => {
            app.roll_all();
            Ok(())
        }
        Command::Roll(skill) => app.roll_one(*skill).map(|_| ()),
        Command::Set(skill, value) => app.enter_roll(*skill, value).map(|_| ()),
        Command::Watch => app.generate_watch().map(|_| ()),
        Command::Update => app.update_grid().map(|_| ()),
        Command::Click(terrain) => app.click_terrain(terrain).map(|_| ()),
        Command::Expand(terrain, kind) => app.toggle_disclosure(terrain, *kind).map(|_| ()),
        Command::Reload => app.load_config(),
        Command::Status | Command::Help => Ok(()),
        Command::Quit => return false,
    };
    if let Err(err) = outcome {
        tracing::debug!("{:?} failed: {}", command, err);
    }
    true
}

pub fn run<R: BufRead, W: Write>(
    app: &mut WatchApp,
    input: R,
    mut output: W,
    as_json: bool,
) -> std::io::Result<()> {
    let draw = |app: &WatchApp, output: &mut W| -> std::io::Result<()> {
        let now = Instant::now();
        if as_json {
            let text = render::json(app, now).map_err(std::io::Error::other)?;
            writeln!(output, "{}", text)
        } else {
            write!(output, "{}", render::text(app, now))
        }
    };

    draw(&*app, &mut output)?;
    write!(output, "> ")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            write!(output, "> ")?;
            output.flush()?;
            continue;
        }
        match parse(&line) {
            Ok(Command::Help) => writeln!(output, "{}", HELP)?,
            Ok(command) => {
                if !apply(app, &command) {
                    break;
                }
                draw(&*app, &mut output)?;
            }
            Err(message) => writeln!(output, "{}", message)?,
        }
        write!(output, "> ")?;
        output.flush()?;
    }
    Ok(())
}
