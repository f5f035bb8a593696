// SmartSpread CLI - typed reads and change-gated writes for spreadsheet tabs

mod auth;
mod exit_codes;
mod sheet_ops;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use smartspread_backend::{BackendError, Role};
use smartspread_config::Settings;
use smartspread_engine::{DataFormat, EngineError};

use exit_codes::{backend_exit_code, engine_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("SSPREAD_COMMIT"),
    ", ",
    env!("SSPREAD_TARGET"),
    ")"
);

#[derive(Parser)]
#[command(name = "sspread")]
#[command(about = "Typed, change-gated access to spreadsheet tabs")]
#[command(version)]
#[command(long_version = LONG_VERSION)]
#[command(subcommand_required = false)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Send all API calls to this base URL (proxies, test servers)
    #[arg(long, env = "SMARTSPREAD_API_BASE", global = true, hide = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save an OAuth bearer token for the Sheets and Drive APIs
    #[command(after_help = "\
Examples:
  sspread login --token ya29.a0Af...
  gcloud auth print-access-token | sspread login --token -")]
    Login {
        /// Token (`-` reads it from stdin; default: SMARTSPREAD_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Save without checking the token against the API
        #[arg(long)]
        no_verify: bool,
    },

    /// Remove saved credentials
    Logout,

    /// Create a new spreadsheet
    Create {
        /// Spreadsheet title
        title: String,

        /// Give this address writer access
        #[arg(long, value_name = "EMAIL")]
        share_with: Option<String>,

        /// Give anyone with the link writer access
        #[arg(long)]
        public: bool,
    },

    /// List the tabs of a spreadsheet
    Tabs {
        /// Spreadsheet ID or title
        sheet: String,
    },

    /// Print a tab's contents
    #[command(after_help = "\
Examples:
  sspread read 1s1diMjy... Genres
  sspread read Budget Q1 --output json --format rows
  sspread read Budget Q1 --keep-number-formatting")]
    Read {
        /// Spreadsheet ID or title
        sheet: String,

        /// Tab name (created if missing)
        tab: String,

        /// Table shape for JSON output: frame, records, rows
        #[arg(long)]
        format: Option<DataFormat>,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Csv)]
        output: OutputFormat,

        /// Read displayed text ("1,234.50") instead of raw values
        #[arg(long)]
        keep_number_formatting: bool,
    },

    /// Write a CSV file to a tab, skipping the write if nothing changed
    #[command(after_help = "\
Examples:
  sspread push Budget Q1 q1.csv
  cat q1.csv | sspread push Budget Q1 --overwrite --as-table")]
    Push {
        /// Spreadsheet ID or title
        sheet: String,

        /// Tab name (created if missing)
        tab: String,

        /// CSV file with a header row (omit to read from stdin)
        input: Option<PathBuf>,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Update the first row matching a key, or append a new row
    #[command(after_help = "\
Examples:
  sspread upsert Tracker Tickets --key ID --value 42 --set Status=done
  sspread upsert Tracker Tickets --key Email --value ann@example.com --set Name=Ann --set Team=red")]
    Upsert {
        /// Spreadsheet ID or title
        sheet: String,

        /// Tab name (created if missing)
        tab: String,

        /// Column to match on
        #[arg(long)]
        key: String,

        /// Value to match (typed: 42 matches 42.0)
        #[arg(long)]
        value: String,

        /// Column assignment COL=VALUE. Repeatable.
        #[arg(long = "set", value_name = "COL=VALUE", required = true)]
        set: Vec<String>,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Print the rows whose column matches a value
    Filter {
        /// Spreadsheet ID or title
        sheet: String,

        /// Tab name
        tab: String,

        /// Column to test
        #[arg(long)]
        column: String,

        /// Exact (typed) match
        #[arg(long, conflicts_with = "contains", required_unless_present = "contains")]
        equals: Option<String>,

        /// Substring match against the cell text
        #[arg(long)]
        contains: Option<String>,

        /// Table shape for JSON output: frame, records, rows
        #[arg(long)]
        format: Option<DataFormat>,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Csv)]
        output: OutputFormat,
    },

    /// Share a spreadsheet
    Grant {
        /// Spreadsheet ID or title
        sheet: String,

        /// Address to share with (omit for anyone with the link)
        #[arg(long)]
        email: Option<String>,

        /// owner, writer, or reader
        #[arg(long, default_value = "owner")]
        role: Role,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub(crate) struct WriteArgs {
    /// Clear the tab before writing (default: write only the data range)
    #[arg(long)]
    overwrite: bool,

    /// Add a filter and a frozen bold header row after writing
    #[arg(long)]
    as_table: bool,

    /// Write even if the content is unchanged
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Csv,
    Json,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load();
    let api_base = cli.api_base.as_deref();

    let result = match cli.command {
        None => {
            // No subcommand = show help
            eprintln!("Usage: sspread <command> [options]");
            eprintln!("       sspread --help for more information");
            Ok(())
        }
        Some(Commands::Login { token, no_verify }) => {
            auth::cmd_login(token, no_verify, api_base, &settings)
        }
        Some(Commands::Logout) => auth::cmd_logout(),
        Some(Commands::Create { title, share_with, public }) => {
            sheet_ops::cmd_create(&title, share_with, public, api_base, &settings)
        }
        Some(Commands::Tabs { sheet }) => sheet_ops::cmd_tabs(&sheet, api_base, &settings),
        Some(Commands::Read { sheet, tab, format, output, keep_number_formatting }) => {
            sheet_ops::cmd_read(
                &sheet,
                &tab,
                format,
                output,
                keep_number_formatting,
                api_base,
                &settings,
            )
        }
        Some(Commands::Push { sheet, tab, input, write }) => {
            sheet_ops::cmd_push(&sheet, &tab, input, write, api_base, &settings)
        }
        Some(Commands::Upsert { sheet, tab, key, value, set, write }) => {
            sheet_ops::cmd_upsert(&sheet, &tab, &key, &value, &set, write, api_base, &settings)
        }
        Some(Commands::Filter { sheet, tab, column, equals, contains, format, output }) => {
            sheet_ops::cmd_filter(
                &sheet,
                &tab,
                &column,
                equals,
                contains,
                format,
                output,
                api_base,
                &settings,
            )
        }
        Some(Commands::Grant { sheet, email, role }) => {
            sheet_ops::cmd_grant(&sheet, email, role, api_base, &settings)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<BackendError> for CliError {
    fn from(err: BackendError) -> Self {
        let hint = match &err {
            BackendError::NotAuthenticated => {
                Some("run `sspread login` or set SMARTSPREAD_TOKEN".to_string())
            }
            BackendError::NotFound(what) if what.starts_with("spreadsheet") => {
                Some("check the ID or title, or create it with `sspread create`".to_string())
            }
            BackendError::Http(403, _) => {
                Some("the spreadsheet is not shared with this account".to_string())
            }
            _ => None,
        };
        Self { code: backend_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        Self { code: engine_exit_code(&err), message: err.to_string(), hint: None }
    }
}

impl From<smartspread::Error> for CliError {
    fn from(err: smartspread::Error) -> Self {
        match err {
            smartspread::Error::Engine(e) => e.into(),
            smartspread::Error::Backend(e) => e.into(),
        }
    }
}
