//! Purpose: Hold top-level CLI command dispatch for `orderlite`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Command behavior, output envelopes, and exit code semantics stay unchanged.

use std::path::Path;

use super::*;

pub(super) fn dispatch_command(
    command: Command,
    store_path: PathBuf,
    color_mode: ColorMode,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "orderlite", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Menu => menu::run(&store_path, color_mode),
        Command::Show { json: as_json } => {
            let store = open_store(&store_path, "show", color_mode)?;
            if as_json {
                emit_json(
                    json!({
                        "rows": rows_json(store.table()),
                        "count": store.table().len(),
                    }),
                    color_mode,
                );
            } else {
                print!("{}", render::render_table(store.table()));
            }
            Ok(RunOutcome::ok())
        }
        Command::Add { values } => {
            let mut store = open_store(&store_path, "add", color_mode)?;
            let id = store.add_entry(&values)?;
            emit_json(
                json!({
                    "added": { "id": id, "rows": store.table().len() },
                }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Modify { id, set } => {
            let updates = parse_assignments(&set)?;
            let mut store = open_store(&store_path, "modify", color_mode)?;
            let outcome = store.modify_entry(id, &updates)?;
            emit_skip_notices("modify", &store_path, &outcome.skipped, color_mode);
            emit_json(
                json!({
                    "modified": { "id": id, "outcome": outcome_json(&outcome)? },
                }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Delete { id, criteria } => match (id, criteria.as_slice()) {
            (Some(_), [_, ..]) => Err(Error::new(ErrorKind::Usage)
                .with_message("an id cannot be combined with --where criteria")
                .with_hint("Delete by id, or by --where column=value, not both.")),
            (Some(id), []) => {
                let mut store = open_store(&store_path, "delete", color_mode)?;
                let removed = store.delete_entry(id)?;
                emit_json(
                    json!({
                        "deleted": { "id": id, "removed": removed, "rows": store.table().len() },
                    }),
                    color_mode,
                );
                Ok(RunOutcome::ok())
            }
            (None, []) => Err(Error::new(ErrorKind::Usage)
                .with_message("delete requires an id or at least one --where criterion")
                .with_hint("Use `orderlite delete <id>` or `orderlite delete --where column=value`.")),
            (None, raw) => {
                let criteria = parse_assignments(raw)?;
                let mut store = open_store(&store_path, "delete", color_mode)?;
                let outcome = store.delete_where(&criteria)?;
                emit_skip_notices("delete", &store_path, &outcome.skipped, color_mode);
                emit_json(
                    json!({
                        "deleted": { "removed": outcome.removed, "rows": store.table().len() },
                    }),
                    color_mode,
                );
                Ok(RunOutcome::ok())
            }
        },
    }
}

fn open_store(path: &Path, cmd: &str, color_mode: ColorMode) -> Result<RecordStore, Error> {
    let store = RecordStore::open(path)?;
    if store.created() {
        emit_notice(
            &make_notice(
                "store-created",
                cmd,
                path,
                "created new store file".to_string(),
            ),
            color_mode,
        );
    }
    Ok(store)
}

fn rows_json(table: &orderlite::core::table::RecordTable) -> Vec<Value> {
    let names = table.schema().names();
    table
        .rows()
        .iter()
        .map(|row| {
            let mut object = Map::new();
            for (name, cell) in names.iter().zip(row.cells()) {
                object.insert(name.to_string(), cell.to_json());
            }
            Value::Object(object)
        })
        .collect()
}

fn outcome_json(outcome: &impl serde::Serialize) -> Result<Value, Error> {
    serde_json::to_value(outcome).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("outcome encode failed")
            .with_source(err)
    })
}
