//! Data source adapters.
//!
//! Two interchangeable backends, selected by deployment configuration:
//! local CSV directories ([`files::FileStore`]) and a remote tabular store
//! ([`table::TableStore`]). Both return normalized tables scoped to a
//! machine and an optional resolved date window; failure to connect is a
//! single `DataUnavailable` condition that callers convert to an empty
//! result, never an exception to the user.

pub mod files;
pub mod table;

use crate::dates::ResolvedWindow;
use crate::error::InsightError;
use crate::models::FetchedData;
use async_trait::async_trait;

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch normalized rows for one machine, restricted to the window's
    /// calendar month when a window is given. Absence of matching rows is
    /// not an error: the result is simply empty.
    async fn fetch(
        &self,
        machine: &str,
        window: Option<&ResolvedWindow>,
    ) -> Result<FetchedData, InsightError>;

    /// List the machine identifiers this source knows about.
    async fn list_machines(&self) -> Result<Vec<String>, InsightError>;
}
