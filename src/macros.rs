//! Macros to reduce boilerplate in the codebase

/// Macro to generate Display and FromStr implementations for enums
///
/// Parsing is case-insensitive; unknown strings become
/// `AdminError::InvalidInput` naming the accepted values.
///
/// # Usage
///
/// ```rust,ignore
/// enum_display_fromstr!(
///     Medium,
///     "medium",
///     {
///         Sms => "sms",
///         Whatsapp => "whatsapp",
///     }
/// );
/// ```
#[macro_export]
macro_rules! enum_display_fromstr {
    (
        $enum_name:ident,
        $what:literal,
        { $($variant:ident => $str:literal),+ $(,)? }
    ) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $($enum_name::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::error::AdminError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok($enum_name::$variant),)+
                    _ => Err($crate::error::AdminError::InvalidInput(format!(
                        "unknown {} '{}', expected one of: {}",
                        $what,
                        s,
                        [$($str),+].join(", ")
                    ))),
                }
            }
        }
    };
}

/// Run a block with `$entity` bound to the record type named by an
/// [`EntityKind`](crate::entity::EntityKind).
///
/// ```rust,ignore
/// with_entity!(kind, E => cmd_list_typed::<E>(&opts).await)
/// ```
#[macro_export]
macro_rules! with_entity {
    ($kind:expr, $entity:ident => $body:expr) => {
        match $kind {
            $crate::entity::EntityKind::Users => {
                type $entity = $crate::entity::User;
                $body
            }
            $crate::entity::EntityKind::Roles => {
                type $entity = $crate::entity::Role;
                $body
            }
            $crate::entity::EntityKind::Permissions => {
                type $entity = $crate::entity::Permission;
                $body
            }
            $crate::entity::EntityKind::Subscriptions => {
                type $entity = $crate::entity::Subscription;
                $body
            }
            $crate::entity::EntityKind::Transactions => {
                type $entity = $crate::entity::Transaction;
                $body
            }
            $crate::entity::EntityKind::MessageLogs => {
                type $entity = $crate::entity::MessageLog;
                $body
            }
            $crate::entity::EntityKind::MediaPosts => {
                type $entity = $crate::entity::MediaPost;
                $body
            }
        }
    };
}
