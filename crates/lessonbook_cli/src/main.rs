//! `lessonbook` executable.
//!
//! # Responsibility
//! - Load configuration, start logging and dispatch one subcommand.
//! - Print API envelopes as JSON; exit non-zero on `error` status.

mod cli;
mod http;

use clap::Parser;
use cli::{Cli, Commands};
use lessonbook_api::{ApiResponse, ApiStatus, LessonbookApi, ManualLessonRequest};
use lessonbook_core::ingest::{import_folder, ImportOptions};
use lessonbook_core::{default_log_level, init_logging, open_db, AppConfig};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(message) => {
            eprintln!("lessonbook error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, String> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).map_err(|err| err.to_string())?;

    let level = config
        .log
        .level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    if let Err(err) = init_logging(&level, &config.log.dir) {
        eprintln!("lessonbook warning: logging disabled: {err}");
    }

    match cli.command {
        Commands::Import(args) => run_import(&config, &args.dir),
        Commands::Serve(args) => {
            let addr = args.addr.unwrap_or_else(|| config.server.addr.clone());
            let max_body_bytes = config.server.max_body_bytes;
            let api = build_api(config)?;
            http::serve(&api, &addr, max_body_bytes)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ask(args) => {
            Ok(report(&build_api(config)?.process_schedule(&args.text.join(" "))))
        }
        Commands::Day(args) => Ok(report(&build_api(config)?.daily_schedule(args.day_idx))),
        Commands::Add(args) => {
            let request = ManualLessonRequest {
                teacher: args.teacher,
                student: args.student,
                subject: args.subject,
                room: args.room,
                day_idx: args.day,
                start_time: args.start,
                duration: Some(args.duration),
            };
            Ok(report(&build_api(config)?.add_lesson_manual(&request)))
        }
        Commands::Delete(args) => Ok(report(&build_api(config)?.delete_lesson(&args.id))),
    }
}

fn build_api(config: AppConfig) -> Result<LessonbookApi, String> {
    LessonbookApi::new(config).map_err(|err| err.to_string())
}

fn run_import(config: &AppConfig, dir: &Path) -> Result<ExitCode, String> {
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let options = ImportOptions::current_week(config.default_room.as_str());
    let summary = import_folder(&conn, dir, &options).map_err(|err| err.to_string())?;
    print_json(&summary);
    Ok(if summary.failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report(response: &ApiResponse) -> ExitCode {
    print_json(response);
    match response.status {
        ApiStatus::Error => ExitCode::FAILURE,
        ApiStatus::Success | ApiStatus::Conflict => ExitCode::SUCCESS,
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("lessonbook error: cannot render output: {err}"),
    }
}
