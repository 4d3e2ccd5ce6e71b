//! Auto downloader events.

use serde_json::Value;

use crate::hook_event;

hook_event! {
    /// Fired before a run. Preventing the default cancels it.
    pub struct AutoDownloaderRunStartedEvent => "AutoDownloaderRunStartedEvent", prevent_default = true {
        rules: Vec<Value> => ("rules", Array, ReadWrite),
    }
}

hook_event! {
    pub struct AutoDownloaderTorrentsFetchedEvent => "AutoDownloaderTorrentsFetchedEvent", prevent_default = false {
        torrents: Vec<Value> => ("torrents", Array, ReadWrite),
    }
}

hook_event! {
    /// Fired after a torrent was checked against a rule. `ok` decides
    /// whether it is queued.
    pub struct AutoDownloaderMatchVerifiedEvent => "AutoDownloaderMatchVerifiedEvent", prevent_default = false {
        torrent: Value => ("torrent", Object, ReadOnly),
        rule: Value => ("rule", Object, ReadOnly),
        list_entry: Value => ("listEntry", Object, ReadOnly),
        local_entry: Value => ("localEntry", Object, ReadOnly),
        episode: i64 => ("episode", Int, ReadWrite),
        ok: bool => ("ok", Bool, ReadWrite),
    }
}

hook_event! {
    pub struct AutoDownloaderSettingsUpdatedEvent => "AutoDownloaderSettingsUpdatedEvent", prevent_default = false {
        settings: Value => ("settings", Object, ReadOnly),
    }
}

hook_event! {
    /// Fired before a matched torrent is sent to the torrent client.
    pub struct AutoDownloaderBeforeDownloadTorrentEvent => "AutoDownloaderBeforeDownloadTorrentEvent", prevent_default = true {
        torrent: Value => ("torrent", Object, ReadWrite),
        rule: Value => ("rule", Object, ReadOnly),
        items: Vec<Value> => ("items", Array, ReadOnly),
    }
}
