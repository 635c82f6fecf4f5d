use std::time::Duration;

use sift_storage::{models::CandidateRow, queries};

use crate::{Error, Result, SiftService};

impl SiftService {
	pub(crate) async fn fetch_candidates(&self) -> Result<Vec<CandidateRow>> {
		let timeout_ms = self.cfg.storage.postgres.query_timeout_ms;

		tokio::time::timeout(Duration::from_millis(timeout_ms), queries::list_candidates(&self.db))
			.await
			.map_err(|_| Error::StoreUnavailable {
				message: format!("Candidate fetch timed out after {timeout_ms} ms."),
			})?
			.map_err(|err| Error::StoreUnavailable { message: err.to_string() })
	}
}
