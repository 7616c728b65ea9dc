//! Purpose: The interactive numbered menu over the record store.
//! Exports: `run`.
//! Role: Thin I/O glue; every store error is printed and the loop regains control.
//! Invariants: Malformed selectors are ignored and the loop re-prompts.
//! Invariants: The loop ends only via the explicit exit command or end of input.
use std::io::{self, BufRead, Write};
use std::path::Path;

use orderlite::core::error::{Error, ErrorKind};
use orderlite::core::store::RecordStore;

use super::{ColorMode, RunOutcome, emit_error, emit_notice, emit_skip_notices, make_notice};

const INSTRUCTIONS: &str = r#"
   ****************************
    1.) Enter 1 to show entries
    2.) Enter 2 to add entry
    3.) Enter 3 to modify entry
    4.) Enter 4 to delete entry
    0.) Enter 0 to exit
   ****************************"#;

pub(super) fn run(store_path: &Path, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let mut store = RecordStore::open(store_path)?;
    if store.created() {
        emit_notice(
            &make_notice(
                "store-created",
                "menu",
                store_path,
                "created new store file".to_string(),
            ),
            color_mode,
        );
    }
    let stdin = io::stdin();
    run_loop(&mut stdin.lock(), &mut store, color_mode);
    Ok(RunOutcome::ok())
}

fn run_loop(input: &mut impl BufRead, store: &mut RecordStore, color_mode: ColorMode) {
    loop {
        println!("{INSTRUCTIONS}");
        let Some(line) = prompt(input, ">>> ") else {
            break;
        };
        let Ok(command) = line.trim().parse::<i32>() else {
            continue;
        };
        match command {
            0 => {
                println!("Exiting...");
                break;
            }
            1 => print!("{}", super::render::render_table(store.table())),
            2 => add_entry(input, store, color_mode),
            3 => modify_entry(input, store, color_mode),
            4 => delete_entry(input, store, color_mode),
            _ => {}
        }
    }
}

fn prompt(input: &mut impl BufRead, label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        Err(_) => None,
    }
}

fn prompt_id(input: &mut impl BufRead, color_mode: ColorMode) -> Option<i64> {
    let raw = prompt(input, "Enter entry id: ")?;
    match raw.trim().parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            emit_error(
                &Error::new(ErrorKind::Usage).with_message("entry id must be an integer"),
                color_mode,
            );
            None
        }
    }
}

fn add_entry(input: &mut impl BufRead, store: &mut RecordStore, color_mode: ColorMode) {
    let column_names: Vec<String> = store
        .table()
        .schema()
        .data_columns()
        .map(|column| column.name().to_string())
        .collect();

    let mut values = Vec::with_capacity(column_names.len());
    for name in &column_names {
        let label = format!("enter {}: ", name.replace('_', " "));
        let Some(value) = prompt(input, &label) else {
            return;
        };
        values.push(value);
    }

    match store.add_entry(&values) {
        Ok(id) => println!("Added entry {id}."),
        Err(err) => emit_error(&err, color_mode),
    }
}

fn modify_entry(input: &mut impl BufRead, store: &mut RecordStore, color_mode: ColorMode) {
    let Some(id) = prompt_id(input, color_mode) else {
        return;
    };

    let mut updates = Vec::new();
    loop {
        let Some(line) = prompt(input, "column=value (blank to finish): ") else {
            break;
        };
        if line.trim().is_empty() {
            break;
        }
        match super::parse_assignment(&line) {
            Ok(update) => updates.push(update),
            Err(err) => emit_error(&err, color_mode),
        }
    }

    match store.modify_entry(id, &updates) {
        Ok(outcome) => {
            emit_skip_notices("modify", store.path(), &outcome.skipped, color_mode);
            println!("Modified entry {id}.");
        }
        Err(err) => emit_error(&err, color_mode),
    }
}

fn delete_entry(input: &mut impl BufRead, store: &mut RecordStore, color_mode: ColorMode) {
    let Some(id) = prompt_id(input, color_mode) else {
        return;
    };
    match store.delete_entry(id) {
        Ok(_) => println!("Deleted entry {id}."),
        Err(err) => emit_error(&err, color_mode),
    }
}
