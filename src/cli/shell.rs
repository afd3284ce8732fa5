use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    select,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::{controller::Controller, state::EntryId};

use super::view::{render, ViewOptions};

const HELP: &str = "\
Commands:
  topic <text>   set study topic
  hours <text>   set study time in hours
  submit         register the entered topic and hours
  delete <id>    delete the record shown under [id]
  list           show current state
  help           show this message
  quit           wait for pending operations and exit (Ctrl-C exits right away)";

/// Single line of user input in the interactive shell.
#[derive(Debug, PartialEq)]
pub enum ShellCommand {
    Topic(String),
    Hours(String),
    Submit,
    Delete(EntryId),
    List,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_end_matches(['\r', '\n']).trim_start();
        let (command, rest) = match s.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim_start()),
            None => (s, ""),
        };
        match command {
            "topic" => Ok(ShellCommand::Topic(rest.to_string())),
            "hours" => Ok(ShellCommand::Hours(rest.to_string())),
            "submit" => Ok(ShellCommand::Submit),
            "delete" => Ok(ShellCommand::Delete(rest.parse()?)),
            "list" => Ok(ShellCommand::List),
            "help" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(anyhow!("Unknown command {other:?}, type help for a list of commands")),
        }
    }
}

impl Display for ShellCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellCommand::Topic(v) => write!(f, "topic {v}"),
            ShellCommand::Hours(v) => write!(f, "hours {v}"),
            ShellCommand::Submit => write!(f, "submit"),
            ShellCommand::Delete(id) => write!(f, "delete {id}"),
            ShellCommand::List => write!(f, "list"),
            ShellCommand::Help => write!(f, "help"),
            ShellCommand::Quit => write!(f, "quit"),
        }
    }
}

/// Cancels `cancelation` once the process receives Ctrl-C.
async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}

/// Runs the interactive shell until `quit`, end of input or Ctrl-C. Records are loaded on start,
/// results of operations are printed as soon as they arrive, even while new commands are typed.
pub async fn run_shell(mut controller: Controller, view: ViewOptions) -> Result<()> {
    let shutdown = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    controller.start();
    println!("{HELP}");

    loop {
        select! {
            _ = shutdown.cancelled() => {
                info!("Interrupted, cancelling {} pending operations", controller.pending());
                controller.cancel_all();
                controller.settle().await;
                return Ok(());
            }
            task = controller.next_completion(), if controller.pending() > 0 => {
                if let Some(task) = task {
                    debug!("Task {task} finished");
                    print!("{}", render(controller.state(), &view));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => {
                        debug!("Executing {command}");
                        execute(&mut controller, command, &view);
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    finish(&mut controller, &shutdown).await;
    shutdown.cancel();
    print!("{}", render(controller.state(), &view));
    Ok(())
}

/// Waits for pending operations. Ctrl-C still works here and drops whatever hasn't finished.
async fn finish(controller: &mut Controller, shutdown: &CancellationToken) {
    select! {
        _ = controller.settle() => {}
        _ = shutdown.cancelled() => {
            info!("Interrupted, cancelling {} pending operations", controller.pending());
            controller.cancel_all();
            controller.settle().await;
        }
    }
}

fn execute(controller: &mut Controller, command: ShellCommand, view: &ViewOptions) {
    match command {
        ShellCommand::Topic(v) => controller.form_mut().study = v,
        ShellCommand::Hours(v) => controller.form_mut().study_time = v,
        ShellCommand::Submit => {
            if controller.submit().is_none() {
                print!("{}", render(controller.state(), view));
            }
        }
        ShellCommand::Delete(id) => {
            if controller.delete(id).is_none() {
                println!("No record with id {id}");
            }
        }
        ShellCommand::List => print!("{}", render(controller.state(), view)),
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
    }
}
