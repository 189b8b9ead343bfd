// Interactive command loop.  Commands are whole lines: a handful of
// database commands, and anything else is handed to the SQL layer.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use slotdb::formatting;
use slotdb::storage::Storage;
use slotdb::{run_statement, StatementOutcome};

fn main() -> Result<()> {
    println!("hello, type commands:");
    println!("'quit' or 'exit' to stop");
    println!("'dump_db <filename>' to dump current db to <filename>");
    println!("'load_db <filename>' to load <filename> to db");
    println!("'schema' - to print tables and schema");
    println!("'load_sql <filename>' - execute sql file, statements separated by newlines");
    println!("or type <sql statement> to execute");

    let mut storage = Storage::new();
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(()); // EOF
        }
        let line = line.trim();

        if line == "quit" || line == "exit" {
            println!("bye!");
            return Ok(());
        } else if let Some(path) = line.strip_prefix("dump_db ") {
            match dump_db(&storage, path.trim()) {
                Ok(()) => println!("db written to {:?}", path.trim()),
                Err(e) => println!("error: {e:#}"),
            }
        } else if let Some(path) = line.strip_prefix("load_db ") {
            // The current image is replaced only when the whole load
            // succeeds.
            match load_db(path.trim()) {
                Ok(loaded) => {
                    storage = loaded;
                    println!("db refreshed from {:?}", path.trim());
                }
                Err(e) => println!("failed to load {:?}, current db unchanged: {e:#}", path.trim()),
            }
        } else if line == "schema" {
            match print_schema(&storage) {
                Ok(()) => {}
                Err(e) => println!("error: {e:#}"),
            }
        } else if let Some(path) = line.strip_prefix("load_sql ") {
            match run_sql_file(&mut storage, path.trim()) {
                Ok(()) => println!("file processed"),
                Err(e) => println!("error while processing file: {e:#}"),
            }
        } else if !line.is_empty() {
            match run_statement(&mut storage, line) {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => println!("error: {e}"),
            }
        }
    }
}

fn print_outcome(outcome: &StatementOutcome) {
    match outcome {
        StatementOutcome::Created(table) => println!("created table {table}"),
        StatementOutcome::Inserted(table) => println!("inserted into table {table}"),
        StatementOutcome::Rows(result) => println!("{}", formatting::format_query_result(result)),
    }
}

fn print_schema(storage: &Storage) -> Result<()> {
    let tables = storage.schema()?;
    if tables.is_empty() {
        println!("empty schema");
        return Ok(());
    }
    for table in tables {
        println!("{}", formatting::format_table_schema(&table));
    }
    Ok(())
}

fn dump_db(storage: &Storage, path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("please provide a file name for 'dump_db'");
    }
    std::fs::write(path, storage.to_bytes())
        .with_context(|| format!("error writing to {path:?}"))?;
    Ok(())
}

fn load_db(path: &str) -> Result<Storage> {
    let bytes = std::fs::read(path).with_context(|| format!("error reading {path:?}"))?;
    let storage =
        Storage::from_bytes(&bytes).with_context(|| format!("error deserializing {path:?}"))?;
    Ok(storage)
}

/// Runs each newline-separated statement in order; the first error stops the
/// file.
fn run_sql_file(storage: &mut Storage, path: &str) -> Result<()> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("error reading {path:?}"))?;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let outcome = run_statement(storage, line)
            .with_context(|| format!("while executing {line:?}"))?;
        print_outcome(&outcome);
    }
    Ok(())
}
