use async_trait::async_trait;
use csv::ReaderBuilder;
use tracing::info;

use crate::error::SheetError;
use crate::fetch::{BasicClient, fetch_bytes};
use crate::services::sheet_api::SheetSource;

/// A sheet read from a local CSV file or a published CSV export URL.
#[derive(Debug, Clone)]
pub struct CsvSheet {
    source: String,
}

impl CsvSheet {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Local file, or an HTTP download when the source looks like a URL.
    async fn read_source(&self) -> Result<Vec<u8>, SheetError> {
        if self.source.starts_with("http") {
            fetch_bytes(&BasicClient::new(), &self.source)
                .await
                .map_err(SheetError::Download)
        } else {
            Ok(std::fs::read(&self.source)?)
        }
    }
}

#[async_trait]
impl SheetSource for CsvSheet {
    #[tracing::instrument(skip(self), fields(source = %self.source))]
    async fn fetch_all_rows(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let bytes = self.read_source().await?;
        let rows = parse_rows(&bytes)?;
        info!(rows = rows.len(), "Sheet rows fetched");
        Ok(rows)
    }
}

/// Parses CSV bytes into rows of cells. Rows may have differing widths.
pub fn parse_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, SheetError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    if rows.is_empty() {
        return Err(SheetError::MissingHeader);
    }
    Ok(rows)
}
