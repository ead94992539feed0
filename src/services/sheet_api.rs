//! Trait for the registration spreadsheet.

use async_trait::async_trait;

use crate::error::SheetError;

/// A source of tabular rows. The first row holds the column headers.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch_all_rows(&self) -> Result<Vec<Vec<String>>, SheetError>;
}
