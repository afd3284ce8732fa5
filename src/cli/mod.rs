pub mod shell;
pub mod view;

use std::{io::IsTerminal, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use shell::run_shell;
use tracing::{info, level_filters::LevelFilter};
use view::{render, ViewOptions};

use crate::{
    app::{
        controller::Controller,
        operations::parse_hours,
        state::{AppState, FormState},
    },
    config::{load_settings, process_env},
    store::{entities::StudyRecord, rest::RestStore},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, SHELL_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "studylog", version, long_about = None)]
#[command(about = "Keep track of study sessions in a remote table", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Print logs to stderr")]
    log: bool,
    #[arg(
        long,
        help = "Settings file. By default config.toml inside the application directory is used"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        help = "Application directory. By default $XDG_CONFIG_HOME/studylog or $HOME/.config/studylog"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show all records and the total study time")]
    List {},
    #[command(about = "Register a study session")]
    Add {
        #[arg(help = "What was studied")]
        topic: String,
        #[arg(help = "Study time in hours")]
        hours: String,
    },
    #[command(about = "Delete every record with exactly this topic and time")]
    Delete {
        #[arg(help = "Topic of the records to delete")]
        topic: String,
        #[arg(help = "Study time in hours of the records to delete", value_parser = parse_hours)]
        hours: f64,
    },
    #[command(about = "Interactive mode. Lets you fill in the form, register and delete records")]
    Shell {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = match args.commands {
        Commands::Shell {} => SHELL_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir, logging_level, args.log)?;

    let settings = load_settings(args.config.as_deref(), &app_dir, process_env)?;
    info!("Using table {} at {}", settings.store.table, settings.store.url);

    let store = Arc::new(RestStore::new(&settings.store));
    let controller = Controller::new(store, AppState::new(settings.total_on_delete));
    let view = ViewOptions {
        target_hours: settings.target_hours,
        colored: std::io::stdout().is_terminal(),
    };

    match args.commands {
        Commands::List {} => run_once(controller, Action::List, &view).await,
        Commands::Add { topic, hours } => {
            run_once(
                controller,
                Action::Register(FormState {
                    study: topic,
                    study_time: hours,
                }),
                &view,
            )
            .await
        }
        Commands::Delete { topic, hours } => {
            run_once(
                controller,
                Action::Delete(StudyRecord::new(topic, hours)),
                &view,
            )
            .await
        }
        Commands::Shell {} => run_shell(controller, view).await,
    }
}

enum Action {
    List,
    Register(FormState),
    Delete(StudyRecord),
}

/// Loads records, performs a single action and prints the resulting state. Fails when the
/// state ends up with an error so that scripts can notice.
async fn run_once(mut controller: Controller, action: Action, view: &ViewOptions) -> Result<()> {
    controller.start();
    controller.settle().await;

    match action {
        Action::List => {}
        Action::Register(form) => {
            *controller.form_mut() = form;
            controller.submit();
        }
        Action::Delete(target) => {
            controller.delete_matching(target);
        }
    }
    controller.settle().await;

    print!("{}", render(controller.state(), view));
    match controller.state().error() {
        Some(error) => Err(anyhow!("{error}")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use clap::Parser;

    use crate::{
        app::{
            controller::Controller,
            state::{AppState, FormState, TotalOnDelete},
        },
        store::{entities::StudyRecord, memory::MemoryStore},
    };

    use super::{run_once, Action, Args, Commands, ViewOptions};

    const VIEW: ViewOptions = ViewOptions {
        target_hours: 1000.,
        colored: false,
    };

    #[test]
    fn test_parse_arguments() {
        let args = Args::parse_from(["studylog", "--log", "add", "Math", "3"]);
        assert!(args.log);
        assert!(matches!(
            args.commands,
            Commands::Add { topic, hours } if topic == "Math" && hours == "3"
        ));

        let args = Args::parse_from(["studylog", "delete", "Math", "1.5"]);
        assert!(matches!(
            args.commands,
            Commands::Delete { topic, hours } if topic == "Math" && hours == 1.5
        ));

        for hours in ["abc", "NaN", "inf", "-1"] {
            assert!(
                Args::try_parse_from(["studylog", "delete", "Math", hours]).is_err(),
                "{hours} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_run_once_register_and_delete() -> Result<()> {
        let store = Arc::new(MemoryStore::with_records([StudyRecord::new("Art", 1.)]));

        let controller = Controller::new(store.clone(), AppState::new(TotalOnDelete::Keep));
        run_once(
            controller,
            Action::Register(FormState {
                study: "Math".into(),
                study_time: "3".into(),
            }),
            &VIEW,
        )
        .await?;
        assert_eq!(store.records()?.len(), 2);

        let controller = Controller::new(store.clone(), AppState::new(TotalOnDelete::Keep));
        run_once(controller, Action::Delete(StudyRecord::new("Art", 1.)), &VIEW).await?;
        assert_eq!(store.records()?, vec![StudyRecord::new("Math", 3.)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_once_reports_validation_error() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        let controller = Controller::new(store.clone(), AppState::new(TotalOnDelete::Keep));

        let error = run_once(
            controller,
            Action::Register(FormState {
                study: "Math".into(),
                study_time: "abc".into(),
            }),
            &VIEW,
        )
        .await
        .unwrap_err();

        assert_eq!(error.to_string(), "Study time must be entered as a number.");
        assert!(store.records()?.is_empty());
        Ok(())
    }
}
