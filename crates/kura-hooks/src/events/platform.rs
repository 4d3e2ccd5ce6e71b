//! Events fired by the tracking platform integration.

use serde_json::Value;

use crate::hook_event;

hook_event! {
    /// Fired after an anime is fetched from the platform. Listeners may
    /// replace or patch it before it is cached.
    pub struct GetAnimeEvent => "GetAnimeEvent", prevent_default = false {
        anime: Value => ("anime", Object, ReadWrite),
    }
}

hook_event! {
    /// Fired after the user's anime collection is fetched.
    pub struct GetAnimeCollectionEvent => "GetAnimeCollectionEvent", prevent_default = false {
        anime_collection: Value => ("animeCollection", Object, ReadWrite),
    }
}

hook_event! {
    /// Fired after the user's manga collection is fetched.
    pub struct GetMangaCollectionEvent => "GetMangaCollectionEvent", prevent_default = false {
        manga_collection: Value => ("mangaCollection", Object, ReadWrite),
    }
}

hook_event! {
    /// Fired before a list entry is created or updated.
    pub struct PreUpdateEntryEvent => "PreUpdateEntryEvent", prevent_default = true {
        media_id: i64 => ("mediaId", Int, ReadOnly),
        status: String => ("status", String, ReadWrite),
        score_raw: i64 => ("scoreRaw", Int, ReadWrite),
        progress: i64 => ("progress", Int, ReadWrite),
        started_at: Value => ("startedAt", Object, ReadWrite),
        completed_at: Value => ("completedAt", Object, ReadWrite),
    }
}

hook_event! {
    pub struct PostUpdateEntryEvent => "PostUpdateEntryEvent", prevent_default = false {
        media_id: i64 => ("mediaId", Int, ReadOnly),
    }
}

hook_event! {
    /// Fired before a list entry's progress is written.
    pub struct PreUpdateEntryProgressEvent => "PreUpdateEntryProgressEvent", prevent_default = true {
        media_id: i64 => ("mediaId", Int, ReadOnly),
        progress: i64 => ("progress", Int, ReadWrite),
        total_count: i64 => ("totalCount", Int, ReadWrite),
        status: String => ("status", String, ReadWrite),
    }
}

hook_event! {
    pub struct PostUpdateEntryProgressEvent => "PostUpdateEntryProgressEvent", prevent_default = false {
        media_id: i64 => ("mediaId", Int, ReadOnly),
    }
}

hook_event! {
    /// Fired before a list entry's rewatch count is written.
    pub struct PreUpdateEntryRepeatEvent => "PreUpdateEntryRepeatEvent", prevent_default = true {
        media_id: i64 => ("mediaId", Int, ReadOnly),
        repeat: i64 => ("repeat", Int, ReadWrite),
    }
}

hook_event! {
    pub struct PostUpdateEntryRepeatEvent => "PostUpdateEntryRepeatEvent", prevent_default = false {
        media_id: i64 => ("mediaId", Int, ReadOnly),
    }
}
