//! Best-effort removal of objects staged by a failed upload.

use tracing::{info, warn};

use crate::staging::StagingStore;

/// Delete every location staged by the current run.
///
/// Never fails: delete errors are logged per object and swallowed, so the
/// error that triggered compensation is the one the caller sees. Rows already
/// committed to the warehouse are not touched.
pub async fn compensate(staging: &StagingStore, locations: &[String]) {
    if locations.is_empty() {
        return;
    }

    info!(count = locations.len(), ?locations, "upload failed, deleting staged objects");
    let failures = staging.delete_many(locations).await;

    if failures > 0 {
        warn!(
            failures,
            count = locations.len(),
            "some staged objects could not be deleted"
        );
    }
}
