//! Built-in host events, grouped by the subsystem that fires them.

pub mod anime;
pub mod autodownloader;
pub mod debrid;
pub mod handlers;
pub mod platform;
pub mod playback;
pub mod scanner;

use crate::hooks::definitions::EventDefinition;
use crate::hooks::typed::HookEventType;

pub use anime::*;
pub use autodownloader::*;
pub use debrid::*;
pub use handlers::*;
pub use platform::*;
pub use playback::*;
pub use scanner::*;

/// Definitions for every built-in event.
pub fn builtin_definitions() -> Vec<EventDefinition> {
    vec![
        // platform
        GetAnimeEvent::definition(),
        GetAnimeCollectionEvent::definition(),
        GetMangaCollectionEvent::definition(),
        PreUpdateEntryEvent::definition(),
        PostUpdateEntryEvent::definition(),
        PreUpdateEntryProgressEvent::definition(),
        PostUpdateEntryProgressEvent::definition(),
        PreUpdateEntryRepeatEvent::definition(),
        PostUpdateEntryRepeatEvent::definition(),
        // anime
        AnimeEntryRequestedEvent::definition(),
        AnimeEntryEvent::definition(),
        AnimeMetadataRequestedEvent::definition(),
        AnimeMetadataEvent::definition(),
        // scanner
        ScanStartedEvent::definition(),
        ScanCompletedEvent::definition(),
        ScanMatchingStartedEvent::definition(),
        ScanLocalFileMatchedEvent::definition(),
        ScanLocalFileHydratedEvent::definition(),
        // playback
        LocalFilePlaybackRequestedEvent::definition(),
        StreamPlaybackRequestedEvent::definition(),
        PrePlaybackTrackingEvent::definition(),
        // autodownloader
        AutoDownloaderRunStartedEvent::definition(),
        AutoDownloaderTorrentsFetchedEvent::definition(),
        AutoDownloaderMatchVerifiedEvent::definition(),
        AutoDownloaderSettingsUpdatedEvent::definition(),
        AutoDownloaderBeforeDownloadTorrentEvent::definition(),
        // debrid
        DebridLocalDownloadRequestedEvent::definition(),
        DebridSendStreamToMediaPlayerEvent::definition(),
        // handlers
        HandleGetAnimeCollectionRequestedEvent::definition(),
        HandleGetAnimeCollectionEvent::definition(),
        HandleEditListEntryRequestedEvent::definition(),
    ]
}
