use serde::{Deserialize, Serialize};

use super::{CollectionName, Record};

/// Summary counts shown on the site's landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub photo_count: usize,
    pub member_count: usize,
    /// Latest photo `updatedAt`/`createdAt` or member `joinDate`, 0 when both are empty.
    pub last_updated: i64,
}

impl Stats {
    pub fn compute(photos: &[Record], members: &[Record]) -> Self {
        let latest = |name: CollectionName, records: &[Record]| {
            records
                .iter()
                .filter_map(|r| name.activity_timestamp(r))
                .max()
                .unwrap_or(0)
        };

        Self {
            photo_count: photos.len(),
            member_count: members.len(),
            last_updated: latest(CollectionName::Photos, photos)
                .max(latest(CollectionName::Members, members)),
        }
    }
}
