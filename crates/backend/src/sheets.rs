//! Google Sheets backend.
//!
//! Sheets API v4 for values and tab metadata, Drive API v3 for lookup by
//! name and sharing. Blocking reqwest client (no Tokio runtime required).

use std::cell::RefCell;

use log::{debug, info};
use serde_json::json;
use smartspread_engine::{occupied_range, Grid};
use url::Url;

use crate::auth::AuthCredentials;
use crate::backend::{Principal, Role, SheetBackend, TabInfo, ValueRender, WriteMode};
use crate::error::BackendError;
use crate::http::{ClientOptions, HttpClient};

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const METADATA_FIELDS: &str = "spreadsheetId,spreadsheetUrl,properties.title,sheets.properties(sheetId,title)";

/// Entry point: opens and creates spreadsheets for one set of credentials.
#[derive(Clone)]
pub struct SheetsClient {
    http: HttpClient,
    sheets_base: String,
    drive_base: String,
}

impl SheetsClient {
    pub fn new(creds: &AuthCredentials, opts: ClientOptions) -> Result<Self, BackendError> {
        if creds.token.is_empty() {
            return Err(BackendError::NotAuthenticated);
        }
        Ok(Self {
            http: HttpClient::new(&creds.token, opts)?,
            sheets_base: creds.sheets_base.trim_end_matches('/').to_string(),
            drive_base: creds.drive_base.trim_end_matches('/').to_string(),
        })
    }

    /// Verify the token and return the account's email address.
    pub fn whoami(&self) -> Result<String, BackendError> {
        let url = self.drive_url(&["drive", "v3", "about"])?;
        let json = self.http.send_json("drive about", |http| {
            http.get(url.clone()).query(&[("fields", "user(emailAddress)")])
        })?;
        json["user"]["emailAddress"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| BackendError::Parse("Missing user.emailAddress in response".into()))
    }

    /// Open by spreadsheet ID.
    pub fn open_by_key(&self, key: &str) -> Result<GoogleSheets, BackendError> {
        if key.is_empty() {
            return Err(BackendError::Validation("spreadsheet key cannot be empty".into()));
        }
        let url = self.sheets_url(&["v4", "spreadsheets", key])?;
        let what = format!("spreadsheet '{}'", key);
        let json = self.http.send_json(&what, |http| {
            http.get(url.clone()).query(&[("fields", METADATA_FIELDS)])
        })?;
        let sheet = GoogleSheets::from_metadata(self.clone(), &json)?;
        info!("Spreadsheet '{}' opened by ID", sheet.title);
        Ok(sheet)
    }

    /// Open the first spreadsheet visible to these credentials with this exact title.
    pub fn open_by_name(&self, name: &str) -> Result<GoogleSheets, BackendError> {
        if name.is_empty() {
            return Err(BackendError::Validation("spreadsheet name cannot be empty".into()));
        }
        let url = self.drive_url(&["drive", "v3", "files"])?;
        let q = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query(name),
            SPREADSHEET_MIME
        );
        let json = self.http.send_json("drive files", |http| {
            http.get(url.clone()).query(&[
                ("q", q.as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "1"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
        })?;

        let id = json["files"]
            .as_array()
            .and_then(|files| files.first())
            .and_then(|f| f["id"].as_str())
            .ok_or_else(|| BackendError::NotFound(format!("spreadsheet '{}'", name)))?;
        debug!("Spreadsheet name '{}' resolved to {}", name, id);
        self.open_by_key(id)
    }

    /// Open by ID, falling back to title.
    pub fn open(&self, identifier: &str) -> Result<GoogleSheets, BackendError> {
        match self.open_by_key(identifier) {
            Err(BackendError::NotFound(_)) => {}
            other => return other,
        }
        match self.open_by_name(identifier) {
            Err(BackendError::NotFound(_)) => Err(BackendError::NotFound(format!(
                "spreadsheet '{}' (create it first)",
                identifier
            ))),
            other => other,
        }
    }

    /// Create a new spreadsheet with one default tab.
    pub fn create(&self, title: &str) -> Result<GoogleSheets, BackendError> {
        if title.is_empty() {
            return Err(BackendError::Validation("spreadsheet title cannot be empty".into()));
        }
        let url = self.sheets_url(&["v4", "spreadsheets"])?;
        let body = json!({ "properties": { "title": title } });
        let json = self
            .http
            .send_json("spreadsheets", |http| http.post(url.clone()).json(&body))?;
        let sheet = GoogleSheets::from_metadata(self.clone(), &json)?;
        info!("Spreadsheet '{}' created ({})", sheet.title, sheet.id);
        Ok(sheet)
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn sheets_url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        endpoint(&self.sheets_base, segments)
    }

    fn drive_url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        endpoint(&self.drive_base, segments)
    }
}

/// One open Google spreadsheet.
pub struct GoogleSheets {
    client: SheetsClient,
    id: String,
    title: String,
    url: String,
    tabs: RefCell<Vec<TabInfo>>,
}

impl GoogleSheets {
    fn from_metadata(client: SheetsClient, json: &serde_json::Value) -> Result<Self, BackendError> {
        let id = json["spreadsheetId"]
            .as_str()
            .ok_or_else(|| BackendError::Parse("Missing spreadsheetId in response".into()))?
            .to_string();
        let title = json["properties"]["title"].as_str().unwrap_or_default().to_string();
        let url = json["spreadsheetUrl"]
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| format!("https://docs.google.com/spreadsheets/d/{}", id));
        Ok(Self {
            client,
            id,
            title,
            url,
            tabs: RefCell::new(parse_tabs(json)),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn tab_id(&self, tab: &str) -> Result<i64, BackendError> {
        if let Some(id) = self.cached_tab_id(tab) {
            return Ok(id);
        }
        self.list_tabs()?;
        self.cached_tab_id(tab)
            .ok_or_else(|| BackendError::NotFound(format!("tab '{}'", tab)))
    }

    fn cached_tab_id(&self, tab: &str) -> Option<i64> {
        self.tabs.borrow().iter().find(|t| t.title == tab).map(|t| t.id)
    }

    fn values_url(&self, range: &str) -> Result<Url, BackendError> {
        self.client
            .sheets_url(&["v4", "spreadsheets", &self.id, "values", range])
    }

    fn batch_update(&self, requests: serde_json::Value) -> Result<serde_json::Value, BackendError> {
        let url = self
            .client
            .sheets_url(&["v4", "spreadsheets", &format!("{}:batchUpdate", self.id)])?;
        let body = json!({ "requests": requests });
        let what = format!("spreadsheet '{}'", self.id);
        self.client
            .http
            .send_json(&what, |http| http.post(url.clone()).json(&body))
    }
}

impl SheetBackend for GoogleSheets {
    fn read_grid(&self, tab: &str, render: ValueRender) -> Result<Grid, BackendError> {
        self.tab_id(tab)?;
        let url = self.values_url(&quote_tab(tab))?;
        let render = match render {
            ValueRender::Unformatted => "UNFORMATTED_VALUE",
            ValueRender::Formatted => "FORMATTED_VALUE",
        };
        let what = format!("tab '{}'", tab);
        let json = self.client.http.send_json(&what, |http| {
            http.get(url.clone())
                .query(&[("valueRenderOption", render), ("majorDimension", "ROWS")])
        })?;
        let grid = grid_from_json(&json["values"])?;
        debug!("Read {} rows from '{}'", grid.len(), tab);
        Ok(grid)
    }

    fn write_grid(&self, tab: &str, grid: &Grid, mode: WriteMode) -> Result<(), BackendError> {
        let cells = occupied_range(grid)
            .ok_or_else(|| BackendError::Validation("cannot write an empty grid".into()))?;
        self.tab_id(tab)?;
        let what = format!("tab '{}'", tab);

        if mode == WriteMode::Overwrite {
            let url = self.values_url(&format!("{}:clear", quote_tab(tab)))?;
            self.client
                .http
                .send_json(&what, |http| http.post(url.clone()).json(&json!({})))?;
            debug!("Cleared '{}'", tab);
        }

        let range = format!("{}!{}", quote_tab(tab), cells);
        let url = self.values_url(&range)?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": grid });
        self.client.http.send_json(&what, |http| {
            http.put(url.clone())
                .query(&[("valueInputOption", "USER_ENTERED")])
                .json(&body)
        })?;
        Ok(())
    }

    fn list_tabs(&self) -> Result<Vec<String>, BackendError> {
        let url = self.client.sheets_url(&["v4", "spreadsheets", &self.id])?;
        let what = format!("spreadsheet '{}'", self.id);
        let json = self.client.http.send_json(&what, |http| {
            http.get(url.clone())
                .query(&[("fields", "sheets.properties(sheetId,title)")])
        })?;
        let tabs = parse_tabs(&json);
        let titles = tabs.iter().map(|t| t.title.clone()).collect();
        *self.tabs.borrow_mut() = tabs;
        Ok(titles)
    }

    fn create_tab(&self, name: &str, rows: usize, cols: usize) -> Result<TabInfo, BackendError> {
        let json = self.batch_update(json!([{
            "addSheet": {
                "properties": {
                    "title": name,
                    "gridProperties": { "rowCount": rows, "columnCount": cols }
                }
            }
        }]))?;
        let props = &json["replies"][0]["addSheet"]["properties"];
        let info = TabInfo {
            id: props["sheetId"]
                .as_i64()
                .ok_or_else(|| BackendError::Parse("Missing sheetId in addSheet reply".into()))?,
            title: props["title"].as_str().unwrap_or(name).to_string(),
        };
        self.tabs.borrow_mut().push(info.clone());
        info!("Tab '{}' created ({}x{})", info.title, rows, cols);
        Ok(info)
    }

    fn grant_access(&self, principal: &Principal, role: Role) -> Result<(), BackendError> {
        let body = match principal {
            Principal::User(email) => {
                json!({ "type": "user", "role": role.as_str(), "emailAddress": email })
            }
            Principal::Anyone if role == Role::Owner => {
                return Err(BackendError::Validation(
                    "owner role can only be granted to a user".into(),
                ));
            }
            Principal::Anyone => json!({ "type": "anyone", "role": role.as_str() }),
        };
        let url = self
            .client
            .drive_url(&["drive", "v3", "files", &self.id, "permissions"])?;
        let transfer = if role == Role::Owner { "true" } else { "false" };
        let what = format!("spreadsheet '{}'", self.id);
        self.client.http.send_json(&what, |http| {
            http.post(url.clone())
                .query(&[("transferOwnership", transfer), ("supportsAllDrives", "true")])
                .json(&body)
        })?;
        info!("Access granted to {} with role '{}' on '{}'", principal, role, self.title);
        Ok(())
    }

    fn format_as_table(&self, tab: &str, cols: usize) -> Result<(), BackendError> {
        let sheet_id = self.tab_id(tab)?;
        self.batch_update(json!([
            {
                "setBasicFilter": {
                    "filter": {
                        "range": { "sheetId": sheet_id, "startRowIndex": 0, "startColumnIndex": 0, "endColumnIndex": cols }
                    }
                }
            },
            {
                "updateSheetProperties": {
                    "properties": { "sheetId": sheet_id, "gridProperties": { "frozenRowCount": 1 } },
                    "fields": "gridProperties.frozenRowCount"
                }
            },
            {
                "repeatCell": {
                    "range": { "sheetId": sheet_id, "startRowIndex": 0, "endRowIndex": 1, "startColumnIndex": 0, "endColumnIndex": cols },
                    "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                    "fields": "userEnteredFormat.textFormat.bold"
                }
            }
        ]))?;
        debug!("Formatted '{}' as table", tab);
        Ok(())
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn url(&self) -> &str {
        &self.url
    }
}

// ── Free functions ──────────────────────────────────────────────────

/// Quote a tab name for A1 notation: `My Tab` → `'My Tab'`, inner quotes doubled.
pub fn quote_tab(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

fn escape_query(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

/// `base` + percent-encoded path segments.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, BackendError> {
    let mut url = Url::parse(base)
        .map_err(|e| BackendError::Validation(format!("invalid API base '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| BackendError::Validation(format!("invalid API base '{}'", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse_tabs(json: &serde_json::Value) -> Vec<TabInfo> {
    json["sheets"]
        .as_array()
        .map(|sheets| {
            sheets
                .iter()
                .filter_map(|s| {
                    let props = &s["properties"];
                    Some(TabInfo {
                        id: props["sheetId"].as_i64()?,
                        title: props["title"].as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn grid_from_json(values: &serde_json::Value) -> Result<Grid, BackendError> {
    let Some(rows) = values.as_array() else {
        // An empty tab has no "values" key at all
        return if values.is_null() {
            Ok(Grid::new())
        } else {
            Err(BackendError::Parse("values is not an array".into()))
        };
    };
    rows.iter()
        .map(|row| {
            row.as_array()
                .map(|cells| cells.iter().map(cell_text).collect())
                .ok_or_else(|| BackendError::Parse("row is not an array".into()))
        })
        .collect()
}

/// Text form of one unformatted cell value.
fn cell_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(true) => "TRUE".to_string(),
        serde_json::Value::Bool(false) => "FALSE".to_string(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => format!("{}", f),
            (None, None) => n.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_tab() {
        assert_eq!(quote_tab("Sheet1"), "'Sheet1'");
        assert_eq!(quote_tab("Bob's Tab"), "'Bob''s Tab'");
    }

    #[test]
    fn test_endpoint_encodes_range_segment() {
        let url = endpoint(
            "https://sheets.googleapis.com/",
            &["v4", "spreadsheets", "abc", "values", "'My Tab'!A1:B2"],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/'My%20Tab'!A1:B2"
        );

        let url = endpoint("http://localhost:1234", &["v4", "spreadsheets", "a/b"]).unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/a%2Fb");
    }

    #[test]
    fn test_invalid_base_is_validation_error() {
        assert!(matches!(
            endpoint("not a url", &["v4"]),
            Err(BackendError::Validation(_))
        ));
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("Q1 'draft'"), "Q1 \\'draft\\'");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!(42)), "42");
        assert_eq!(cell_text(&json!(3.0)), "3");
        assert_eq!(cell_text(&json!(0.25)), "0.25");
        assert_eq!(cell_text(&json!(true)), "TRUE");
        assert_eq!(cell_text(&json!("x")), "x");
    }

    #[test]
    fn test_grid_from_json() {
        let grid = grid_from_json(&json!([["ID", "Score"], [1, 9.5], [2]])).unwrap();
        assert_eq!(grid, vec![vec!["ID", "Score"], vec!["1", "9.5"], vec!["2"]]);
        assert!(grid_from_json(&serde_json::Value::Null).unwrap().is_empty());
        assert!(matches!(grid_from_json(&json!("x")), Err(BackendError::Parse(_))));
    }

    #[test]
    fn test_parse_tabs_skips_incomplete_entries() {
        let tabs = parse_tabs(&json!({
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Sheet1" } },
                { "properties": { "title": "broken" } },
                { "properties": { "sheetId": 7, "title": "Data" } }
            ]
        }));
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1], TabInfo { id: 7, title: "Data".into() });
    }
}
