//! Creator join for video hits.

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use video_search_repository::DocumentStoreError;
use video_search_shared::{CreatorDocument, EnrichedVideo, VideoDocument};

use crate::indexes::CreatorsIndex;

/// Attach the creator of every video, fetching all creators of the page in one query.
///
/// Videos whose creator is not indexed get no creator, which serializes as `{}`.
pub async fn enrich_videos(
    creators: &CreatorsIndex,
    videos: Vec<VideoDocument>,
) -> Result<Vec<EnrichedVideo>, DocumentStoreError> {
    let creator_ids: BTreeSet<String> = videos
        .iter()
        .map(|video| video.creator_id.clone())
        .collect();

    let found: HashMap<String, CreatorDocument> = creators
        .find_by_ids(&creator_ids)
        .await?
        .into_iter()
        .map(|creator| (creator.id.clone(), creator))
        .collect();

    debug!(
        video_count = videos.len(),
        creator_count = creator_ids.len(),
        found_count = found.len(),
        "Enriched page with creators"
    );

    Ok(videos
        .into_iter()
        .map(|video| {
            let creator = found.get(&video.creator_id).cloned();
            EnrichedVideo { video, creator }
        })
        .collect())
}
