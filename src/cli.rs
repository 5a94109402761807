//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_import;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store::JsonStoreAdapter;
use crate::domain::catalog;
use crate::domain::command_parser;
use crate::domain::engine::Engine;
use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::sref::SRef;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(name = "folioledger", about = "Command-driven investment portfolio ledger")]
pub struct Cli {
    /// INI file providing defaults ([store] path, [audit] log_path)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run command lines against the ledger store
    Exec {
        #[arg(long)]
        store: Option<PathBuf>,
        /// Script file, one command per line
        #[arg(long, conflicts_with = "command")]
        script: Option<PathBuf>,
        /// Single command line
        #[arg(short, long)]
        command: Option<String>,
        /// Parse only, touch nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Render broker CSV rows as command lines
    Import {
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        csv: PathBuf,
        #[arg(short, long)]
        portfolio: String,
        /// Execute the rendered commands and save
        #[arg(long)]
        apply: bool,
    },
    /// Print the ledger document
    Export {
        #[arg(long)]
        store: Option<PathBuf>,
        /// Comma-separated stock references, e.g. NASDAQ$X,ASX$BHP
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Print the command grammar
    Grammar,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match cli.config.as_ref().map(load_config).transpose() {
        Ok(c) => c,
        Err(code) => return code,
    };
    match cli.command {
        Command::Exec {
            store,
            script,
            command,
            dry_run,
        } => run_exec(
            store.as_deref(),
            script.as_deref(),
            command.as_deref(),
            dry_run,
            config.as_ref(),
        ),
        Command::Import {
            store,
            csv,
            portfolio,
            apply,
        } => run_import(store.as_deref(), &csv, &portfolio, apply, config.as_ref()),
        Command::Export { store, symbols } => {
            run_export(store.as_deref(), symbols.as_deref(), config.as_ref())
        }
        Command::Grammar => {
            println!("{}", catalog::help());
            ExitCode::SUCCESS
        }
    }
}

fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = LedgerError::Storage {
            reason: format!("config {}: {e}", path.display()),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn resolve_store(
    store: Option<&Path>,
    config: Option<&FileConfigAdapter>,
) -> Result<JsonStoreAdapter, ExitCode> {
    if let Some(path) = store {
        return Ok(JsonStoreAdapter::new(path));
    }
    if let Some(path) = config.and_then(|c| c.get_string("store", "path")) {
        return Ok(JsonStoreAdapter::new(path));
    }
    let err = LedgerError::Validation {
        param: "store".to_string(),
        reason: "pass --store or set [store] path in the config".to_string(),
    };
    eprintln!("error: {err}");
    Err(ExitCode::from(&err))
}

/// Load the persisted ledger; a missing store file starts empty.
fn load_ledger(store: &JsonStoreAdapter) -> Result<Ledger, ExitCode> {
    match store.load() {
        Ok(ledger) => Ok(ledger),
        Err(LedgerError::NotFound { .. }) => Ok(Ledger::new()),
        Err(e) => {
            eprintln!("error: {e}");
            Err(ExitCode::from(&e))
        }
    }
}

fn read_lines(
    script: Option<&Path>,
    command: Option<&str>,
) -> Result<Vec<String>, ExitCode> {
    if let Some(line) = command {
        return Ok(vec![line.to_string()]);
    }
    let Some(path) = script else {
        let err = LedgerError::Validation {
            param: "command".to_string(),
            reason: "pass --script or --command".to_string(),
        };
        eprintln!("error: {err}");
        return Err(ExitCode::from(&err));
    };
    match fs::read_to_string(path) {
        Ok(body) => Ok(body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect()),
        Err(e) => {
            let err = LedgerError::Io(e);
            eprintln!("error: {err}");
            Err(ExitCode::from(&err))
        }
    }
}

fn report(line: &str, err: &LedgerError) {
    match err {
        LedgerError::Parse(parse) => eprintln!("error: {}", parse.display_with_context(line)),
        other => eprintln!("error: {other}"),
    }
}

fn run_exec(
    store: Option<&Path>,
    script: Option<&Path>,
    command: Option<&str>,
    dry_run: bool,
    config: Option<&FileConfigAdapter>,
) -> ExitCode {
    let lines = match read_lines(script, command) {
        Ok(l) => l,
        Err(code) => return code,
    };

    if dry_run {
        for line in &lines {
            if let Err(e) = command_parser::parse(line) {
                report(line, &e);
                return ExitCode::from(&e);
            }
        }
        eprintln!("{} line(s) parsed", lines.len());
        return ExitCode::SUCCESS;
    }

    let store = match resolve_store(store, config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let ledger = match load_ledger(&store) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let mut engine = Engine::with_ledger(ledger);
    for line in &lines {
        if let Err(e) = engine.run(line) {
            report(line, &e);
            return ExitCode::from(&e);
        }
    }

    if let Err(e) = append_audit(config, engine.journal()) {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }
    let applied = engine.journal().len();
    if let Err(e) = store.save(engine.ledger()) {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }
    eprintln!("{applied} command(s) applied to {}", store.path().display());
    ExitCode::SUCCESS
}

fn append_audit(
    config: Option<&FileConfigAdapter>,
    journal: &[String],
) -> Result<(), LedgerError> {
    let Some(path) = config.and_then(|c| c.get_string("audit", "log_path")) else {
        return Ok(());
    };
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    for line in journal {
        writeln!(file, "{line}")?;
    }
    Ok(())
}

fn run_import(
    store: Option<&Path>,
    csv: &Path,
    portfolio: &str,
    apply: bool,
    config: Option<&FileConfigAdapter>,
) -> ExitCode {
    let store = match resolve_store(store, config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let ledger = match load_ledger(&store) {
        Ok(l) => l,
        Err(code) => return code,
    };

    let rows = match csv_import::read_transactions(csv) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let mut engine = Engine::with_ledger(ledger);
    let mut skipped = 0usize;
    for tx in &rows {
        let line = match csv_import::to_command(tx, portfolio, engine.ledger()) {
            Ok(line) => line,
            Err(e @ LedgerError::Duplicate { .. }) => {
                eprintln!("skipping {}: {e}", tx.uid);
                skipped += 1;
                continue;
            }
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::from(&e);
            }
        };
        println!("{line}");
        if apply {
            if let Err(e) = engine.run(&line) {
                report(&line, &e);
                return ExitCode::from(&e);
            }
        }
    }

    if apply {
        if let Err(e) = store.save(engine.ledger()) {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
        eprintln!(
            "{} command(s) applied, {skipped} skipped",
            engine.journal().len()
        );
    } else {
        eprintln!("{} command(s) rendered, {skipped} skipped", rows.len() - skipped);
    }
    ExitCode::SUCCESS
}

fn run_export(
    store: Option<&Path>,
    symbols: Option<&str>,
    config: Option<&FileConfigAdapter>,
) -> ExitCode {
    let store = match resolve_store(store, config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let ledger = match store.load() {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let symbols: Option<Vec<SRef>> = match symbols {
        None => None,
        Some(list) => {
            let mut parsed = Vec::new();
            for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                match part.parse() {
                    Ok(sref) => parsed.push(sref),
                    Err(reason) => {
                        let err = LedgerError::Validation {
                            param: "symbols".to_string(),
                            reason,
                        };
                        eprintln!("error: {err}");
                        return ExitCode::from(&err);
                    }
                }
            }
            Some(parsed)
        }
    };

    match store.export(&ledger, symbols.as_deref()) {
        Ok(document) => {
            println!("{document}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}
