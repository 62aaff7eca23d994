//! Work-list sources: the Google Sheets values API and local files.

use std::path::Path;

use async_trait::async_trait;
use outreach_core_types::{RunScope, SourceRowRef, WorkItem};
use outreach_scheduler::{ListRequest, SourceError, WorkListSource};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

/// Marker a column-0 value must contain to be queued.
pub const PROFILE_MARKER: &str = "linkedin.com/in/";

/// Rows start at 2: row 1 is the header and sheet rows are 1-based.
const FIRST_DATA_ROW: u32 = 2;

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Turn raw rows into work items, keeping only profile links.
pub fn parse_rows(rows: &[Vec<String>], scope: &RunScope, sheet_name: &str) -> Vec<WorkItem> {
    let mut items = Vec::new();
    for (position, row) in rows.iter().enumerate() {
        let Some(raw) = row.first().map(|cell| cell.trim()) else {
            continue;
        };
        if !raw.contains(PROFILE_MARKER) {
            continue;
        }
        let row_index = FIRST_DATA_ROW + position as u32;
        let target = match Url::parse(raw) {
            Ok(url) => url,
            Err(err) => {
                warn!(row = row_index, value = raw, %err, "unparseable profile link skipped");
                continue;
            }
        };
        let source_row = SourceRowRef {
            scope: scope.clone(),
            row_index,
            sheet_name: sheet_name.to_string(),
        };
        items.push(WorkItem::new(target, items.len(), source_row));
    }
    items
}

/// Sheet name part of an A1 range such as `Sheet1!A2:A`.
pub fn sheet_name_of(range: &str) -> &str {
    range.split('!').next().unwrap_or(range)
}

/// Reads column A of a sheet through the public values API.
#[derive(Clone)]
pub struct SheetsSource {
    client: reqwest::Client,
    base: Url,
}

impl SheetsSource {
    pub fn new() -> Result<Self, SourceError> {
        let base = Url::parse(SHEETS_API_BASE).map_err(|err| SourceError::Parse(err.to_string()))?;
        Ok(Self::with_base(base))
    }

    /// Point at a different API root.
    pub fn with_base(base: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    pub fn values_url(&self, request: &ListRequest) -> Result<Url, SourceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Parse(format!("cannot extend {}", self.base)))?
            .pop_if_empty()
            .push(&request.sheet_id)
            .push("values")
            .push(&request.range);
        url.query_pairs_mut().append_pair("key", &request.api_key);
        Ok(url)
    }
}

#[async_trait]
impl WorkListSource for SheetsSource {
    async fn fetch(&self, request: &ListRequest) -> Result<Vec<WorkItem>, SourceError> {
        let url = self.values_url(request)?;
        debug!(sheet = %request.sheet_id, range = %request.range, "fetching sheet values");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| SourceError::Http(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| "Failed to fetch sheet data".to_string());
            warn!(status = status.as_u16(), %message, "sheet request rejected");
            return Err(SourceError::Remote(message));
        }

        let body: ValueRange = response
            .json()
            .await
            .map_err(|err| SourceError::Parse(err.to_string()))?;
        let scope = RunScope(request.sheet_id.clone());
        Ok(parse_rows(&body.values, &scope, sheet_name_of(&request.range)))
    }
}

/// Fixed list, typically read from a local CSV or text file.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    items: Vec<WorkItem>,
}

impl StaticSource {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items }
    }

    /// Read a file whose first line is a header and whose first column holds
    /// profile links. The file stem becomes the audit scope.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let scope = RunScope(
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string()),
        );
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|err| SourceError::Io(err.to_string()))?;
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| SourceError::Parse(err.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }
        let items = parse_rows(&rows, &scope, &scope.0);
        Ok(Self::new(items))
    }

    pub fn scope(&self) -> Option<&RunScope> {
        self.items.first().map(|item| &item.source_row.scope)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl WorkListSource for StaticSource {
    async fn fetch(&self, _request: &ListRequest) -> Result<Vec<WorkItem>, SourceError> {
        Ok(self.items.clone())
    }
}
