//! Spreadsheet commands: create, tabs, read, push, upsert, filter, grant.

use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use smartspread::{
    DataFormat, Spreadsheet, SpreadsheetOptions, Tab, TabOptions, TypedTable, UpsertOutcome,
    Value, WriteMode, WriteOptions,
};
use smartspread_backend::{
    load_auth, BackendError, ClientOptions, GoogleSheets, Principal, Role, SheetBackend,
    SheetsClient,
};
use smartspread_config::Settings;
use smartspread_engine::column::{decode, infer};
use smartspread_engine::{normalize, to_grid, EngineError, Grid};

use crate::exit_codes::EXIT_INPUT;
use crate::{CliError, OutputFormat, WriteArgs};

pub(crate) fn client_options(settings: &Settings) -> ClientOptions {
    ClientOptions {
        timeout: Duration::from_secs(settings.timeout_secs),
        max_retries: settings.max_retries,
        ..ClientOptions::default()
    }
}

/// Build a client from saved credentials. Endpoint precedence:
/// `--api-base` > settings > saved credentials.
fn connect(api_base: Option<&str>, settings: &Settings) -> Result<SheetsClient, CliError> {
    let mut creds = load_auth().ok_or(BackendError::NotAuthenticated)?;
    if let Some(base) = &settings.sheets_base {
        creds.sheets_base = base.trim_end_matches('/').to_string();
    }
    if let Some(base) = &settings.drive_base {
        creds.drive_base = base.trim_end_matches('/').to_string();
    }
    if let Some(base) = api_base {
        creds = creds.with_base(base);
    }
    Ok(SheetsClient::new(&creds, client_options(settings))?)
}

fn open(
    sheet: &str,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<Spreadsheet<GoogleSheets>, CliError> {
    let backend = connect(api_base, settings)?.open(sheet)?;
    debug!("opened '{}' ({})", backend.title(), backend.id());
    Ok(Spreadsheet::with_options(
        backend,
        SpreadsheetOptions {
            new_tab_rows: settings.new_tab_rows,
            new_tab_cols: settings.new_tab_cols,
        },
    ))
}

fn write_options(args: WriteArgs, settings: &Settings) -> WriteOptions {
    WriteOptions {
        mode: if args.overwrite || settings.overwrite {
            WriteMode::Overwrite
        } else {
            WriteMode::Range
        },
        as_table: args.as_table || settings.as_table,
        force: args.force,
    }
}

fn write_tab<B: SheetBackend>(tab: &Tab<'_, B>, options: WriteOptions) -> Result<(), CliError> {
    let outcome = tab.write_data(options)?;
    if outcome.written {
        eprintln!("Wrote {} row(s) to '{}'", tab.data().row_count(), tab.name());
    } else {
        eprintln!("'{}' unchanged, nothing written", tab.name());
    }
    Ok(())
}

// ── Output ──────────────────────────────────────────────────────────

fn print_table(table: &TypedTable, output: OutputFormat) -> Result<(), CliError> {
    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(table)
                .map_err(|e| CliError::io(format!("failed to serialize table: {}", e)))?;
            println!("{}", json);
        }
        OutputFormat::Csv => {
            let grid = match to_grid(table) {
                Ok(grid) => grid,
                // Nothing to print for a table without columns
                Err(EngineError::EmptyData) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            let mut out = csv::Writer::from_writer(io::stdout().lock());
            for row in &grid {
                out.write_record(row)
                    .map_err(|e| CliError::io(format!("failed to write CSV: {}", e)))?;
            }
            out.flush().map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    Ok(())
}

// ── Input ───────────────────────────────────────────────────────────

fn read_csv(input: Option<PathBuf>) -> Result<Grid, CliError> {
    let mut text = String::new();
    match &input {
        Some(path) => {
            text = std::fs::read_to_string(path).map_err(|e| CliError {
                code: EXIT_INPUT,
                message: format!("cannot read {}: {}", path.display(), e),
                hint: None,
            })?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    parse_csv(&text)
}

pub(crate) fn parse_csv(text: &str) -> Result<Grid, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut grid = Grid::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| CliError {
            code: EXIT_INPUT,
            message: format!("invalid CSV at record {}: {}", i + 1, e),
            hint: None,
        })?;
        grid.push(record.iter().map(String::from).collect());
    }
    Ok(grid)
}

/// Command-line text to a typed value: "" is null, numbers are numbers.
pub(crate) fn parse_value(text: &str) -> Value {
    decode(text, infer([text]))
}

/// `COL=VALUE` to a typed assignment.
pub(crate) fn parse_assignment(arg: &str) -> Result<(String, Value), CliError> {
    match arg.split_once('=') {
        Some((col, value)) if !col.trim().is_empty() => {
            Ok((col.trim().to_string(), parse_value(value)))
        }
        _ => Err(CliError::args(format!("invalid assignment '{}'", arg))
            .with_hint("use --set COLUMN=VALUE")),
    }
}

// ── Commands ────────────────────────────────────────────────────────

pub fn cmd_create(
    title: &str,
    share_with: Option<String>,
    public: bool,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<(), CliError> {
    if title.trim().is_empty() {
        return Err(CliError::args("title cannot be empty"));
    }
    let backend = connect(api_base, settings)?.create(title)?;
    if let Some(email) = share_with {
        backend.grant_access(&Principal::User(email), Role::Writer)?;
    }
    if public {
        backend.grant_access(&Principal::Anyone, Role::Writer)?;
    }
    eprintln!("Created '{}'", backend.title());
    println!("{}", backend.id());
    println!("{}", backend.url());
    Ok(())
}

pub fn cmd_tabs(sheet: &str, api_base: Option<&str>, settings: &Settings) -> Result<(), CliError> {
    let spreadsheet = open(sheet, api_base, settings)?;
    for name in spreadsheet.tab_names()? {
        println!("{}", name);
    }
    Ok(())
}

pub fn cmd_read(
    sheet: &str,
    tab: &str,
    format: Option<DataFormat>,
    output: OutputFormat,
    keep_number_formatting: bool,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<(), CliError> {
    let spreadsheet = open(sheet, api_base, settings)?;
    let options = TabOptions::new(format.unwrap_or(settings.default_format))
        .keep_number_formatting(keep_number_formatting || settings.keep_number_formatting);
    let tab = spreadsheet.tab(tab, options)?;
    print_table(tab.data(), output)
}

pub fn cmd_push(
    sheet: &str,
    tab: &str,
    input: Option<PathBuf>,
    write: WriteArgs,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<(), CliError> {
    // Parse before touching the network so bad input fails fast
    let grid = read_csv(input)?;
    let table = normalize(&grid, settings.default_format).map_err(|e| match e {
        EngineError::EmptyTab => CliError {
            code: EXIT_INPUT,
            message: "input has no rows".into(),
            hint: Some("the first CSV record is the header row".into()),
        },
        other => other.into(),
    })?;

    let spreadsheet = open(sheet, api_base, settings)?;
    let mut tab = spreadsheet.tab(tab, TabOptions::new(settings.default_format))?;
    tab.set_data(table);
    write_tab(&tab, write_options(write, settings))
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_upsert(
    sheet: &str,
    tab: &str,
    key: &str,
    value: &str,
    set: &[String],
    write: WriteArgs,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<(), CliError> {
    let updates = set
        .iter()
        .map(|arg| parse_assignment(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let spreadsheet = open(sheet, api_base, settings)?;
    let mut tab = spreadsheet.tab(tab, TabOptions::new(settings.default_format))?;
    match tab.update_row_by_column(key, parse_value(value), updates)? {
        UpsertOutcome::Updated(row) => eprintln!("Updated row {}", row + 1),
        UpsertOutcome::Inserted(row) => eprintln!("Inserted row {}", row + 1),
    }
    write_tab(&tab, write_options(write, settings))
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_filter(
    sheet: &str,
    tab: &str,
    column: &str,
    equals: Option<String>,
    contains: Option<String>,
    format: Option<DataFormat>,
    output: OutputFormat,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<(), CliError> {
    let spreadsheet = open(sheet, api_base, settings)?;
    let tab = spreadsheet.tab(tab, TabOptions::new(format.unwrap_or(settings.default_format)))?;
    let hits = match (equals, contains) {
        (_, Some(needle)) => tab.filter_rows_containing(column, &needle)?,
        (Some(pattern), None) => tab.filter_rows_by_column(column, &parse_value(&pattern))?,
        (None, None) => return Err(CliError::args("pass --equals or --contains")),
    };
    debug!("{} of {} row(s) matched", hits.row_count(), tab.data().row_count());
    print_table(&hits, output)
}

pub fn cmd_grant(
    sheet: &str,
    email: Option<String>,
    role: Role,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<(), CliError> {
    let spreadsheet = open(sheet, api_base, settings)?;
    let principal = Principal::from_email(email.as_deref());
    spreadsheet.grant_access(&principal, role)?;
    eprintln!("Granted {} to {} on '{}'", role, principal, spreadsheet.title());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_USAGE;

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value(""), Value::Null);
        assert_eq!(parse_value("42"), Value::Int(42));
        assert_eq!(parse_value("2.5"), Value::Float(2.5));
        assert_eq!(parse_value("done"), Value::text("done"));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Status=done").unwrap(),
            ("Status".to_string(), Value::text("done"))
        );
        // Only the first '=' splits
        assert_eq!(
            parse_assignment("Expr=a=b").unwrap(),
            ("Expr".to_string(), Value::text("a=b"))
        );
        assert_eq!(parse_assignment("Owner=").unwrap().1, Value::Null);
        assert_eq!(parse_assignment("Status").unwrap_err().code, EXIT_USAGE);
        assert_eq!(parse_assignment("=x").unwrap_err().code, EXIT_USAGE);
    }

    #[test]
    fn test_parse_csv_ragged_rows() {
        let grid = parse_csv("ID,Name,Team\n1,Ann\n2,Bob,red\n").unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[1], vec!["1", "Ann"]);
        assert_eq!(grid[2], vec!["2", "Bob", "red"]);
    }

    #[test]
    fn test_write_options_merge_settings() {
        let args = WriteArgs { overwrite: false, as_table: false, force: true };
        let settings = Settings { overwrite: true, ..Settings::default() };
        let opts = write_options(args, &settings);
        assert_eq!(opts.mode, WriteMode::Overwrite);
        assert!(!opts.as_table);
        assert!(opts.force);
    }
}
