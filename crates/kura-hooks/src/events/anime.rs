//! Events around building library entries and fetching metadata.

use serde_json::Value;

use crate::hook_event;

hook_event! {
    /// Fired before a library entry is assembled. Preventing the default
    /// makes the host return `entry` as-is.
    pub struct AnimeEntryRequestedEvent => "AnimeEntryRequestedEvent", prevent_default = true {
        media_id: i64 => ("mediaId", Int, ReadOnly),
        local_files: Vec<Value> => ("localFiles", Array, ReadWrite),
        anime_collection: Value => ("animeCollection", Object, ReadWrite),
        entry: Value => ("entry", Object, ReadWrite),
    }
}

hook_event! {
    /// Fired once a library entry has been assembled.
    pub struct AnimeEntryEvent => "AnimeEntryEvent", prevent_default = false {
        entry: Value => ("entry", Object, ReadWrite),
    }
}

hook_event! {
    /// Fired before episode metadata is fetched from the metadata provider.
    pub struct AnimeMetadataRequestedEvent => "AnimeMetadataRequestedEvent", prevent_default = true {
        media_id: i64 => ("mediaId", Int, ReadOnly),
        anime_metadata: Value => ("animeMetadata", Object, ReadWrite),
    }
}

hook_event! {
    pub struct AnimeMetadataEvent => "AnimeMetadataEvent", prevent_default = false {
        media_id: i64 => ("mediaId", Int, ReadOnly),
        anime_metadata: Value => ("animeMetadata", Object, ReadWrite),
    }
}
