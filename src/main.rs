#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

use anyhow::{Context, Result};
use clap::Parser;
use mapty::cli::{self, Cmd};
use mapty::controller::AppController;
use mapty::gateway::FormFields;
use mapty::persistence::FileStorage;
use mapty::terminal::{self, PresetForm, TerminalList, TerminalMap};
use mapty::utils;

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let storage = FileStorage::open(&cli.store)
        .with_context(|| format!("opening store: {}", cli.store.display()))?;
    dlog!("store={}", storage.dir().display());

    let cmd = cli.cmd.unwrap_or(Cmd::List);
    let rows = cmd.lists_workouts();

    let form = match &cmd {
        Cmd::Add(args) => PresetForm::new(FormFields::from_text(
            args.kind,
            &args.distance,
            &args.duration,
            args.extra_field(),
        )),
        _ => PresetForm::empty(),
    };

    let mut app = AppController::new(
        TerminalMap::default(),
        form,
        TerminalList::stdout_if(rows, rows),
        storage,
    );
    let restored = app.on_startup();
    dlog!("restored={restored} markers={}", app.map().marker_count());

    if let Some(line) = terminal::run_command(&mut app, &cmd, restored)? {
        println!("{line}");
    }

    Ok(())
}
