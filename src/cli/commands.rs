//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::Session;
use crate::cli::args::{Cli, Commands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::Settings;
use crate::domain::{Member, SelectionTarget};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let settings = load_settings(cli.config.as_deref())?;
    debug!(?settings, "effective settings");

    match &cli.command {
        Some(Commands::Compile { session, members }) => compile(&settings, session, *members),
        Some(Commands::Tree { session }) => tree(&settings, session),
        Some(Commands::Selections { session }) => selections(&settings, session),
        Some(Commands::Positions { session }) => positions(&settings, session),
        Some(Commands::Config) => show_config(&settings),
        Some(Commands::Completion { shell }) => completion(*shell),
        None => Err(CliError::Usage(
            "no command given, see 'seldrill --help'".to_string(),
        )),
    }
}

fn load_settings(explicit: Option<&Path>) -> CliResult<Settings> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(CliError::InvalidArgs(format!(
                "config file not found: {}",
                path.display()
            )));
        }
    }
    Ok(Settings::load(explicit)?)
}

fn load_session(settings: &Settings, path: &Path) -> CliResult<Session> {
    Ok(Session::load(path, settings.default_mode)?)
}

fn format_tuple(tuple: &[Member]) -> String {
    match tuple {
        [member] => member.to_string(),
        _ => format!("({})", tuple.iter().join(", ")),
    }
}

#[instrument(skip(settings))]
fn compile(settings: &Settings, path: &Path, members: bool) -> CliResult<()> {
    let session = load_session(settings, path)?;
    output::info(&session.compile());
    if members {
        for tuple in session.evaluate()? {
            output::detail(&format_tuple(&tuple));
        }
    }
    if settings.show_tree {
        print_trees(&session);
    }
    Ok(())
}

#[instrument(skip(settings))]
fn tree(settings: &Settings, path: &Path) -> CliResult<()> {
    let session = load_session(settings, path)?;
    print_trees(&session);
    Ok(())
}

fn print_trees(session: &Session) {
    for (hierarchy, dimension) in session.hierarchies().iter().zip(session.dimensions()) {
        output::header(&format!("{} ({})", hierarchy.unique_name(), dimension.resolution));
        print!("{}", dimension.selection.to_tree_string());
        for o in dimension.selection.level_overrides() {
            output::detail(&format!("level {}: {}", o.level, o.sign));
        }
    }
}

#[instrument(skip(settings))]
fn selections(settings: &Settings, path: &Path) -> CliResult<()> {
    let session = load_session(settings, path)?;
    for (hierarchy, actions) in session.selections() {
        output::header(&hierarchy.unique_name());
        if actions.is_empty() {
            output::detail(&"(nothing selected)");
        }
        for action in actions {
            let target = match &action.target {
                SelectionTarget::Member(m) => format!("{} {}", action.operator, m),
                SelectionTarget::Level(l) => format!("level {}", l),
            };
            output::selection(action.sign.is_include(), &target);
        }
    }
    Ok(())
}

#[instrument(skip(settings))]
fn positions(settings: &Settings, path: &Path) -> CliResult<()> {
    let session = load_session(settings, path)?;
    let recorded = session.drills().positions();
    let visible = session.visible_positions();
    for position in &recorded {
        if !visible.contains(position) {
            output::warning(&format!("hidden position {}", format_tuple(position)));
        }
    }
    for position in visible {
        output::info(&format_tuple(&position));
    }
    Ok(())
}

fn show_config(settings: &Settings) -> CliResult<()> {
    output::info(&settings.to_toml()?);
    Ok(())
}

fn completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
