//! Library scanner events.

use serde_json::Value;

use crate::hook_event;

hook_event! {
    /// Fired before a scan starts. Preventing the default skips the scan and
    /// uses `localFiles` as the result.
    pub struct ScanStartedEvent => "ScanStartedEvent", prevent_default = true {
        library_path: String => ("libraryPath", String, ReadWrite),
        other_library_paths: Vec<String> => ("otherLibraryPaths", StringArray, ReadWrite),
        enhanced: bool => ("enhanced", Bool, ReadWrite),
        skip_locked: bool => ("skipLocked", Bool, ReadWrite),
        skip_ignored: bool => ("skipIgnored", Bool, ReadWrite),
        local_files: Vec<Value> => ("localFiles", Array, ReadWrite),
    }
}

hook_event! {
    pub struct ScanCompletedEvent => "ScanCompletedEvent", prevent_default = false {
        local_files: Vec<Value> => ("localFiles", Array, ReadWrite),
        /// Scan duration in milliseconds.
        duration: i64 => ("duration", Int, ReadOnly),
    }
}

hook_event! {
    /// Fired before local files are matched against known media.
    pub struct ScanMatchingStartedEvent => "ScanMatchingStartedEvent", prevent_default = true {
        local_files: Vec<Value> => ("localFiles", Array, ReadWrite),
        normalized_media: Vec<Value> => ("normalizedMedia", Array, ReadWrite),
        algorithm: String => ("algorithm", String, ReadWrite),
        threshold: f64 => ("threshold", Float, ReadWrite),
    }
}

hook_event! {
    /// Fired after a single file was compared against the media list.
    pub struct ScanLocalFileMatchedEvent => "ScanLocalFileMatchedEvent", prevent_default = true {
        matched: Value => ("match", Object, ReadWrite),
        found: bool => ("found", Bool, ReadWrite),
        local_file: Value => ("localFile", Object, ReadWrite),
        score: f64 => ("score", Float, ReadWrite),
    }
}

hook_event! {
    pub struct ScanLocalFileHydratedEvent => "ScanLocalFileHydratedEvent", prevent_default = false {
        local_file: Value => ("localFile", Object, ReadWrite),
        media_id: i64 => ("mediaId", Int, ReadOnly),
        episode: i64 => ("episode", Int, ReadWrite),
    }
}
