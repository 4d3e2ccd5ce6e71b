//! Playback events.

use serde_json::Value;

use crate::hook_event;

hook_event! {
    /// Fired before a local file is handed to the media player.
    pub struct LocalFilePlaybackRequestedEvent => "LocalFilePlaybackRequestedEvent", prevent_default = true {
        path: String => ("path", String, ReadWrite),
    }
}

hook_event! {
    /// Fired before a stream is handed to the media player. The requesting
    /// client is never exposed to extensions.
    pub struct StreamPlaybackRequestedEvent => "StreamPlaybackRequestedEvent", prevent_default = true {
        window_title: String => ("windowTitle", String, ReadWrite),
        payload: String => ("payload", String, ReadWrite),
        media: Value => ("media", Object, ReadOnly),
        ani_db_episode: String => ("aniDbEpisode", String, ReadWrite),
        client_id: String => ("clientId", String, Hidden),
    }
}

hook_event! {
    /// Fired before progress tracking starts for a playback.
    pub struct PrePlaybackTrackingEvent => "PrePlaybackTrackingEvent", prevent_default = true {
        is_stream: bool => ("isStream", Bool, ReadOnly),
    }
}
