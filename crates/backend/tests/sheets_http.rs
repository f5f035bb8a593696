//! Google Sheets backend against a mock HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use httpmock::prelude::*;
use serde_json::json;
use smartspread_backend::{
    AuthCredentials, BackendError, ClientOptions, Principal, Role, SheetBackend, SheetsClient,
    ValueRender, WriteMode,
};

fn client(server: &MockServer) -> SheetsClient {
    let creds = AuthCredentials::new("test-token".into()).with_base(&server.base_url());
    let opts = ClientOptions {
        timeout: Duration::from_secs(5),
        max_retries: 2,
        backoff: Duration::ZERO,
    };
    SheetsClient::new(&creds, opts).unwrap()
}

fn mock_metadata(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path("/v4/spreadsheets/abc")
            .header("authorization", "Bearer test-token");
        then.status(200).json_body(json!({
            "spreadsheetId": "abc",
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/abc/edit",
            "properties": { "title": "Budget" },
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Sheet1" } },
                { "properties": { "sheetId": 42, "title": "Data" } }
            ]
        }));
    })
}

// ── Opening ─────────────────────────────────────────────────────────

#[test]
fn test_whoami() {
    let server = MockServer::start();
    let about = server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/about")
            .query_param("fields", "user(emailAddress)");
        then.status(200).json_body(json!({ "user": { "emailAddress": "bot@example.com" } }));
    });

    assert_eq!(client(&server).whoami().unwrap(), "bot@example.com");
    about.assert();
}

#[test]
fn test_open_by_key_reads_metadata() {
    let server = MockServer::start();
    mock_metadata(&server);

    let sheet = client(&server).open_by_key("abc").unwrap();
    assert_eq!(sheet.id(), "abc");
    assert_eq!(sheet.title(), "Budget");
    assert_eq!(sheet.url(), "https://docs.google.com/spreadsheets/d/abc/edit");
    assert_eq!(sheet.list_tabs().unwrap(), vec!["Sheet1", "Data"]);
}

#[test]
fn test_open_falls_back_to_name() {
    let server = MockServer::start();
    let by_key = server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/Budget");
        then.status(404).json_body(json!({
            "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" }
        }));
    });
    let by_name = server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param_exists("q");
        then.status(200).json_body(json!({ "files": [ { "id": "abc", "name": "Budget" } ] }));
    });
    mock_metadata(&server);

    let sheet = client(&server).open("Budget").unwrap();
    assert_eq!(sheet.id(), "abc");
    by_key.assert();
    by_name.assert();
}

#[test]
fn test_open_unknown_is_not_found() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/Missing");
        then.status(404).body("");
    });
    server.mock(|when, then| {
        when.method(GET).path("/drive/v3/files");
        then.status(200).json_body(json!({ "files": [] }));
    });

    match client(&server).open("Missing") {
        Err(BackendError::NotFound(msg)) => assert!(msg.contains("Missing")),
        other => panic!("expected NotFound, got {:?}", other.map(|s| s.id().to_string())),
    }
}

#[test]
fn test_create_spreadsheet() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST).path("/v4/spreadsheets");
        then.status(200).json_body(json!({
            "spreadsheetId": "new1",
            "spreadsheetUrl": "https://docs.google.com/spreadsheets/d/new1/edit",
            "properties": { "title": "Fresh" },
            "sheets": [ { "properties": { "sheetId": 0, "title": "Sheet1" } } ]
        }));
    });

    let sheet = client(&server).create("Fresh").unwrap();
    assert_eq!(sheet.id(), "new1");
    assert_eq!(sheet.title(), "Fresh");
    create.assert();
}

// ── Values ──────────────────────────────────────────────────────────

#[test]
fn test_read_grid_unformatted() {
    let server = MockServer::start();
    mock_metadata(&server);
    let values = server.mock(|when, then| {
        when.method(GET)
            .path_includes("/v4/spreadsheets/abc/values/")
            .query_param("valueRenderOption", "UNFORMATTED_VALUE");
        then.status(200).json_body(json!({
            "range": "Data!A1:C3",
            "majorDimension": "ROWS",
            "values": [["ID", "Price", "Active"], [1, 2.5, true], [2]]
        }));
    });

    let sheet = client(&server).open_by_key("abc").unwrap();
    let grid = sheet.read_grid("Data", ValueRender::Unformatted).unwrap();
    assert_eq!(
        grid,
        vec![vec!["ID", "Price", "Active"], vec!["1", "2.5", "TRUE"], vec!["2"]]
    );
    values.assert();
}

#[test]
fn test_read_empty_tab_has_no_values_key() {
    let server = MockServer::start();
    mock_metadata(&server);
    server.mock(|when, then| {
        when.method(GET)
            .path_includes("/values/")
            .query_param("valueRenderOption", "FORMATTED_VALUE");
        then.status(200).json_body(json!({ "range": "Data!A1:Z1000", "majorDimension": "ROWS" }));
    });

    let sheet = client(&server).open_by_key("abc").unwrap();
    assert!(sheet.read_grid("Data", ValueRender::Formatted).unwrap().is_empty());
}

#[test]
fn test_read_unknown_tab_is_not_found() {
    let server = MockServer::start();
    mock_metadata(&server);

    let sheet = client(&server).open_by_key("abc").unwrap();
    assert_eq!(
        sheet.read_grid("Nope", ValueRender::Unformatted),
        Err(BackendError::NotFound("tab 'Nope'".into()))
    );
}

#[test]
fn test_range_write_targets_occupied_rectangle() {
    let server = MockServer::start();
    mock_metadata(&server);
    let clear = server.mock(|when, then| {
        when.method(POST).path_includes(":clear");
        then.status(200).json_body(json!({}));
    });
    let update = server.mock(|when, then| {
        when.method(PUT)
            .path_includes("/values/")
            .path_includes("A1:B3")
            .query_param("valueInputOption", "USER_ENTERED");
        then.status(200).json_body(json!({ "updatedCells": 6 }));
    });

    let sheet = client(&server).open_by_key("abc").unwrap();
    let grid = vec![
        vec!["ID".to_string(), "Status".to_string()],
        vec!["1".to_string(), "open".to_string()],
        vec!["2".to_string(), "done".to_string()],
    ];
    sheet.write_grid("Data", &grid, WriteMode::Range).unwrap();
    update.assert();
    clear.assert_calls(0);

    sheet.write_grid("Data", &grid, WriteMode::Overwrite).unwrap();
    clear.assert_calls(1);
    update.assert_calls(2);
}

// ── Tabs and sharing ────────────────────────────────────────────────

#[test]
fn test_create_tab_and_format_as_table() {
    let server = MockServer::start();
    mock_metadata(&server);
    let batch = server.mock(|when, then| {
        when.method(POST).path("/v4/spreadsheets/abc:batchUpdate");
        then.status(200).json_body(json!({
            "spreadsheetId": "abc",
            "replies": [ { "addSheet": { "properties": { "sheetId": 77, "title": "Log" } } } ]
        }));
    });

    let sheet = client(&server).open_by_key("abc").unwrap();
    let info = sheet.create_tab("Log", 1000, 26).unwrap();
    assert_eq!(info.id, 77);
    assert_eq!(info.title, "Log");

    sheet.format_as_table("Log", 3).unwrap();
    batch.assert_calls(2);
}

#[test]
fn test_grant_access() {
    let server = MockServer::start();
    mock_metadata(&server);
    let writer = server.mock(|when, then| {
        when.method(POST)
            .path("/drive/v3/files/abc/permissions")
            .query_param("transferOwnership", "false");
        then.status(200).json_body(json!({ "id": "perm1" }));
    });

    let sheet = client(&server).open_by_key("abc").unwrap();
    sheet
        .grant_access(&Principal::User("ann@example.com".into()), Role::Writer)
        .unwrap();
    writer.assert();

    assert!(matches!(
        sheet.grant_access(&Principal::Anyone, Role::Owner),
        Err(BackendError::Validation(_))
    ));
}

// ── Status classification ───────────────────────────────────────────

#[test]
fn test_bad_request_is_validation_error() {
    let server = MockServer::start();
    mock_metadata(&server);
    server.mock(|when, then| {
        when.method(GET).path_includes("/values/");
        then.status(400).json_body(json!({
            "error": { "code": 400, "message": "Unable to parse range: Data", "status": "INVALID_ARGUMENT" }
        }));
    });

    let sheet = client(&server).open_by_key("abc").unwrap();
    assert_eq!(
        sheet.read_grid("Data", ValueRender::Unformatted),
        Err(BackendError::Validation("Unable to parse range: Data".into()))
    );
}

#[test]
fn test_unauthorized_is_not_authenticated() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/abc");
        then.status(401).json_body(json!({
            "error": { "code": 401, "message": "Request had invalid authentication credentials." }
        }));
    });

    assert!(matches!(
        client(&server).open_by_key("abc"),
        Err(BackendError::NotAuthenticated)
    ));
}

#[test]
fn test_retry_on_429_exhausted() {
    let server = MockServer::start();
    let rate_limited = server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/abc");
        then.status(429)
            .header("retry-after", "0")
            .json_body(json!({ "error": { "code": 429, "message": "Quota exceeded" } }));
    });

    match client(&server).open_by_key("abc") {
        Err(BackendError::Http(429, msg)) => assert!(msg.contains("Quota exceeded")),
        Err(other) => panic!("expected HTTP 429, got {:?}", other),
        Ok(_) => panic!("expected HTTP 429, got a spreadsheet"),
    }
    // First attempt + max_retries
    rate_limited.assert_calls(3);
}

#[test]
fn test_retry_on_5xx_exhausted() {
    let server = MockServer::start();
    let unavailable = server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/abc");
        then.status(503).body("Service Unavailable");
    });

    match client(&server).open_by_key("abc") {
        Err(BackendError::Http(503, _)) => {}
        Err(other) => panic!("expected HTTP 503, got {:?}", other),
        Ok(_) => panic!("expected HTTP 503, got a spreadsheet"),
    }
    unavailable.assert_calls(3);
}

/// Matches only the first `n` requests it sees.
fn first_requests(n: usize) -> impl Fn(&httpmock::HttpMockRequest) -> bool + Send + Sync + 'static {
    let seen = Arc::new(AtomicUsize::new(0));
    move |_| seen.fetch_add(1, Ordering::SeqCst) < n
}

#[test]
fn test_429_then_success_honours_retry_after() {
    let server = MockServer::start();
    let rate_limited = server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/abc").is_true(first_requests(1));
        then.status(429)
            .header("retry-after", "1")
            .json_body(json!({ "error": { "code": 429, "message": "Quota exceeded" } }));
    });
    let metadata = mock_metadata(&server);

    // Backoff is zero, so any wait comes from Retry-After
    let started = Instant::now();
    let sheet = client(&server).open_by_key("abc").unwrap();
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(sheet.title(), "Budget");
    rate_limited.assert_calls(1);
    metadata.assert_calls(1);
}

#[test]
fn test_5xx_then_success_uses_backoff_not_retry_after() {
    let server = MockServer::start();
    let unavailable = server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/abc").is_true(first_requests(2));
        then.status(503).header("retry-after", "30").body("Service Unavailable");
    });
    let metadata = mock_metadata(&server);

    let started = Instant::now();
    let sheet = client(&server).open_by_key("abc").unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(sheet.id(), "abc");
    unavailable.assert_calls(2);
    metadata.assert_calls(1);
}

#[test]
fn test_forbidden_is_not_retried() {
    let server = MockServer::start();
    let forbidden = server.mock(|when, then| {
        when.method(GET).path("/v4/spreadsheets/abc");
        then.status(403).json_body(json!({
            "error": { "code": 403, "message": "The caller does not have permission" }
        }));
    });

    match client(&server).open_by_key("abc") {
        Err(BackendError::Http(403, msg)) => assert_eq!(msg, "The caller does not have permission"),
        Err(other) => panic!("expected HTTP 403, got {:?}", other),
        Ok(_) => panic!("expected HTTP 403, got a spreadsheet"),
    }
    forbidden.assert_calls(1);
}
