//! `sspread login` / `sspread logout`.

use std::io::{self, BufRead, IsTerminal, Write};

use log::info;
use smartspread_backend::{
    delete_auth, load_auth, save_auth, AuthCredentials, BackendError, SheetsClient, TOKEN_ENV,
};
use smartspread_config::Settings;

use crate::exit_codes::{EXIT_ERROR, EXIT_NETWORK, EXIT_NOT_AUTH, EXIT_USAGE};
use crate::sheet_ops::client_options;
use crate::CliError;

fn no_token(message: &str) -> CliError {
    CliError {
        code: EXIT_USAGE,
        message: message.into(),
        hint: Some(format!("pass --token or set {}", TOKEN_ENV)),
    }
}

fn read_stdin_token() -> Result<String, CliError> {
    let mut buf = String::new();
    io::stdin()
        .lock()
        .read_line(&mut buf)
        .map_err(|e| CliError::io(e.to_string()))?;
    Ok(buf.trim().to_string())
}

pub fn cmd_login(
    token: Option<String>,
    no_verify: bool,
    api_base: Option<&str>,
    settings: &Settings,
) -> Result<(), CliError> {
    // Resolve token: --token flag > SMARTSPREAD_TOKEN env > interactive prompt
    let token = match token.as_deref() {
        Some("-") => read_stdin_token()?,
        Some(t) => t.trim().to_string(),
        None => match std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            Some(t) => t,
            None if io::stdin().is_terminal() => {
                eprint!("Access token: ");
                io::stderr().flush().ok();
                read_stdin_token()?
            }
            None => return Err(no_token("No token provided and stdin is not a TTY")),
        },
    };
    if token.is_empty() {
        return Err(no_token("No token provided"));
    }

    let mut creds = AuthCredentials::new(token);
    if let Some(base) = &settings.sheets_base {
        creds.sheets_base = base.trim_end_matches('/').to_string();
    }
    if let Some(base) = &settings.drive_base {
        creds.drive_base = base.trim_end_matches('/').to_string();
    }
    if let Some(base) = api_base {
        creds = creds.with_base(base);
    }

    if !no_verify {
        let client = SheetsClient::new(&creds, client_options(settings))?;
        let email = client.whoami().map_err(|e| match e {
            BackendError::NotAuthenticated | BackendError::Http(403, _) => CliError {
                code: EXIT_NOT_AUTH,
                message: "Invalid access token".into(),
                hint: Some("the token needs the spreadsheets and drive scopes".into()),
            },
            BackendError::Network(msg) => CliError {
                code: EXIT_NETWORK,
                message: format!("Cannot reach the API: {}", msg),
                hint: None,
            },
            other => other.into(),
        })?;
        creds.email = Some(email);
    }

    let path = save_auth(&creds).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: e.to_string(),
        hint: None,
    })?;
    info!("credentials saved to {}", path.display());

    match &creds.email {
        Some(email) => eprintln!("Authenticated as {}", email),
        None => eprintln!("Token saved (not verified)"),
    }
    Ok(())
}

pub fn cmd_logout() -> Result<(), CliError> {
    let who = load_auth().and_then(|c| c.email);
    if delete_auth()? {
        match who {
            Some(email) => eprintln!("Logged out {}", email),
            None => eprintln!("Logged out"),
        }
    } else {
        eprintln!("Not logged in");
    }
    Ok(())
}
