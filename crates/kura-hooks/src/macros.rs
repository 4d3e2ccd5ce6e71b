//! Convenience macros for declaring and building hook events.

/// Declares a typed hook event.
///
/// Every field is optional and serialized under its external camelCase name.
/// The generated struct implements
/// [`HookEventType`](crate::hooks::typed::HookEventType).
///
/// # Example
/// ```rust,ignore
/// hook_event! {
///     /// Fired before a list entry's progress is updated.
///     pub struct PreUpdateEntryProgressEvent => "PreUpdateEntryProgressEvent", prevent_default = true {
///         media_id: i64 => ("mediaId", Int, ReadOnly),
///         progress: i64 => ("progress", Int, ReadWrite),
///     }
/// }
/// ```
#[macro_export]
macro_rules! hook_event {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $event:literal, prevent_default = $prevent:literal {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty => ($key:literal, $kind:ident, $access:ident)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                #[serde(rename = $key, default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )*
        }

        impl $crate::hooks::typed::HookEventType for $name {
            const NAME: &'static str = $event;

            fn definition() -> $crate::hooks::definitions::EventDefinition {
                $crate::hooks::definitions::EventDefinition::builder($event)
                    $(
                        .field(
                            $key,
                            $crate::hooks::definitions::FieldKind::$kind,
                            $crate::hooks::definitions::FieldAccess::$access,
                        )
                    )*
                    .prevent_default($prevent)
                    .build()
            }
        }
    };
}

/// Builds an untyped [`HookEvent`](crate::hooks::event::HookEvent).
///
/// # Example
/// ```rust,ignore
/// let event = hook_payload!("ScanStartedEvent", {
///     "libraryPath" => "/anime",
///     "enhanced" => true,
/// });
/// ```
#[macro_export]
macro_rules! hook_payload {
    ($event:expr) => {
        $crate::hooks::event::HookEvent::new($event)
    };
    ($event:expr, { $($key:expr => $value:expr),* $(,)? }) => {{
        let event = $crate::hooks::event::HookEvent::new($event);
        $(
            let event = event.with_field($key, ::serde_json::json!($value));
        )*
        event
    }};
}
