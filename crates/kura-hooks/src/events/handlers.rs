//! Events wrapped around request handlers.
//!
//! `*Requested` events fire before the handler runs; preventing the default
//! returns `data` to the caller instead. The plain events fire with the
//! handler's response.

use serde_json::Value;

use crate::hook_event;

hook_event! {
    pub struct HandleGetAnimeCollectionRequestedEvent => "HandleGetAnimeCollectionRequestedEvent", prevent_default = true {
        data: Value => ("data", Object, ReadWrite),
    }
}

hook_event! {
    pub struct HandleGetAnimeCollectionEvent => "HandleGetAnimeCollectionEvent", prevent_default = false {
        data: Value => ("data", Object, ReadWrite),
    }
}

hook_event! {
    pub struct HandleEditListEntryRequestedEvent => "HandleEditListEntryRequestedEvent", prevent_default = true {
        media_id: i64 => ("mediaId", Int, ReadOnly),
        status: String => ("status", String, ReadWrite),
        score: i64 => ("score", Int, ReadWrite),
        progress: i64 => ("progress", Int, ReadWrite),
        started_at: Value => ("startedAt", Object, ReadWrite),
        completed_at: Value => ("completedAt", Object, ReadWrite),
        media_type: String => ("type", String, ReadOnly),
    }
}
