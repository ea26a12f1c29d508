//! Google Sheets v4 `values` client implementing the record store traits.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SheetLayout;
use crate::error::TransportError;
use crate::fetch::{HttpClient, execute_json};
use crate::record::RawRecord;
use crate::services::{RecordSink, RecordSource, WriteSummary};

pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<serde_json::Value>>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a, T> {
    range: &'a str,
    major_dimension: &'static str,
    values: Vec<[&'a T; 1]>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    updated_cells: u64,
}

/// Reads the student table and writes the status and threshold columns of
/// one spreadsheet through an already-authorized [`HttpClient`].
pub struct SheetsClient<C> {
    http: C,
    layout: SheetLayout,
    base_url: String,
}

impl<C: HttpClient> SheetsClient<C> {
    pub fn new(http: C, layout: SheetLayout) -> Self {
        Self {
            http,
            layout,
            base_url: SHEETS_BASE_URL.to_string(),
        }
    }

    /// Points the client at another host, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    /// `{base}/v4/spreadsheets/{id}/values/{range}` with each segment escaped.
    fn values_url(&self, range: &str) -> Result<Url, TransportError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TransportError::InvalidRequest(format!("base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidRequest("base URL cannot have a path".into()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.layout.spreadsheet_id.as_str(), "values", range]);
        Ok(url)
    }

    async fn update_column<T: Serialize + Sync>(
        &self,
        column: &str,
        values: &[T],
    ) -> Result<WriteSummary, TransportError> {
        if values.is_empty() {
            return Ok(WriteSummary::default());
        }

        let range = self.layout.column_range(column, values.len());
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = UpdateBody {
            range: &range,
            major_dimension: "ROWS",
            values: values.iter().map(|v| [v]).collect(),
        };

        let mut req = Request::new(Method::PUT, url);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(serde_json::to_vec(&body)?.into());

        debug!(range = %range, rows = values.len(), "Updating column");
        let resp: UpdateResponse = execute_json(&self.http, req).await?;

        Ok(WriteSummary {
            updated_cells: resp.updated_cells,
        })
    }
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl<C: HttpClient> RecordSource for SheetsClient<C> {
    async fn fetch(&self) -> Result<Vec<RawRecord>, TransportError> {
        let range = self.layout.read_range();
        let url = self.values_url(&range)?;

        debug!(range = %range, "Reading student rows");
        let resp: ValueRange = execute_json(&self.http, Request::new(Method::GET, url)).await?;

        // Blank rows inside the range come back as `[]` and must stay so that
        // results line up with sheet rows on write-back.
        let records = resp
            .values
            .unwrap_or_default()
            .into_iter()
            .map(|row| {
                let cells: Vec<String> = row.into_iter().map(cell_text).collect();
                self.layout.record_from_row(&cells)
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl<C: HttpClient> RecordSink for SheetsClient<C> {
    async fn write_statuses(&self, statuses: &[String]) -> Result<WriteSummary, TransportError> {
        self.update_column(&self.layout.status_column, statuses).await
    }

    async fn write_thresholds(&self, thresholds: &[u32]) -> Result<WriteSummary, TransportError> {
        self.update_column(&self.layout.threshold_column, thresholds)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::Canned;

    fn layout() -> SheetLayout {
        SheetLayout {
            spreadsheet_id: "abc123".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_maps_rows_in_order() {
        let http = Canned::respond(&[(
            200,
            r#"{"range":"x","majorDimension":"ROWS","values":[
                ["1","Ana","2","7","8","9"],
                [],
                ["3","Caio","0","5.5"]
            ]}"#,
        )]);
        let client = SheetsClient::new(http, layout());

        let records = client.fetch().await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], RawRecord::new(Some("Ana"), "2", ["7", "8", "9"]));
        assert_eq!(records[1], RawRecord::new(None, "", ["", "", ""]));
        assert_eq!(records[2], RawRecord::new(Some("Caio"), "0", ["5.5", "", ""]));

        let seen = client.http.requests();
        assert_eq!(seen[0].method, Method::GET);
        assert_eq!(
            seen[0].url,
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'engenharia_de_software'!A4:H"
        );
    }

    #[tokio::test]
    async fn test_fetch_without_values_is_empty() {
        let http = Canned::respond(&[(200, r#"{"range":"x","majorDimension":"ROWS"}"#)]);
        let client = SheetsClient::new(http, layout());
        assert!(client.fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_reports_api_errors() {
        let http = Canned::respond(&[(403, "permission denied")]);
        let client = SheetsClient::new(http, layout());

        match client.fetch().await {
            Err(TransportError::Api { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "permission denied");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_statuses_sends_one_value_per_row() {
        let http = Canned::respond(&[(200, r#"{"updatedCells":2}"#)]);
        let client = SheetsClient::new(http, layout());

        let summary = client
            .write_statuses(&["Passed".to_string(), "FinalExam".to_string()])
            .await
            .unwrap();
        assert_eq!(summary.updated_cells, 2);

        let seen = client.http.requests();
        assert_eq!(seen[0].method, Method::PUT);
        assert!(seen[0].url.ends_with("/values/'engenharia_de_software'!G4:G5?valueInputOption=RAW"));
        assert_eq!(
            seen[0].json()["values"],
            serde_json::json!([["Passed"], ["FinalExam"]])
        );
    }

    #[tokio::test]
    async fn test_write_thresholds_targets_threshold_column() {
        let http = Canned::respond(&[(200, r#"{"updatedCells":3}"#)]);
        let client = SheetsClient::new(http, layout());

        client.write_thresholds(&[0, 4, 0]).await.unwrap();

        let seen = client.http.requests();
        assert!(seen[0].url.contains("!H4:H6"));
        assert_eq!(
            seen[0].json()["values"],
            serde_json::json!([[0], [4], [0]])
        );
    }

    #[tokio::test]
    async fn test_empty_write_skips_request() {
        let client = SheetsClient::new(Canned::default(), layout());
        let summary = client.write_thresholds(&[]).await.unwrap();
        assert_eq!(summary.updated_cells, 0);
        assert!(client.http.requests().is_empty());
    }

    #[test]
    fn test_values_url_escapes_spaces() {
        let client = SheetsClient::new(
            Canned::default(),
            SheetLayout {
                sheet_name: "Turma A".to_string(),
                ..layout()
            },
        )
        .with_base_url("http://localhost:8080");
        let url = client.values_url(&client.layout().read_range()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v4/spreadsheets/abc123/values/'Turma%20A'!A4:H"
        );
    }
}
