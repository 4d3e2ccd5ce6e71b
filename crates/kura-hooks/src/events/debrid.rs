//! Debrid service events.

use serde_json::Value;

use crate::hook_event;

hook_event! {
    pub struct DebridLocalDownloadRequestedEvent => "DebridLocalDownloadRequestedEvent", prevent_default = true {
        torrent_name: String => ("torrentName", String, ReadOnly),
        destination: String => ("destination", String, ReadWrite),
        download_url: String => ("downloadUrl", String, ReadWrite),
    }
}

hook_event! {
    pub struct DebridSendStreamToMediaPlayerEvent => "DebridSendStreamToMediaPlayerEvent", prevent_default = true {
        window_title: String => ("windowTitle", String, ReadWrite),
        stream_url: String => ("streamURL", String, ReadWrite),
        media: Value => ("media", Object, ReadOnly),
        ani_db_episode: String => ("aniDbEpisode", String, ReadWrite),
        playback_type: String => ("playbackType", String, ReadOnly),
    }
}
