//! Lifecycle status enums for asset packs and pipeline jobs.
//!
//! Both entities share the same four states and the same transition table:
//!
//! ```text
//! pending ──► processing ──► completed
//!    │             │
//!    └─────────────┴───────► failed
//! ```
//!
//! Writing the current state again is allowed while the state is not
//! terminal. `completed` and `failed` accept no further transitions.

use crate::error::CoreError;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            Pending,
            Processing,
            Completed,
            Failed,
        }

        impl $name {
            /// String representation stored in the `status` column.
            pub fn as_str(self) -> &'static str {
                match self {
                    $name::Pending => "pending",
                    $name::Processing => "processing",
                    $name::Completed => "completed",
                    $name::Failed => "failed",
                }
            }

            /// Parse a stored status string.
            pub fn parse(s: &str) -> Result<Self, CoreError> {
                match s {
                    "pending" => Ok($name::Pending),
                    "processing" => Ok($name::Processing),
                    "completed" => Ok($name::Completed),
                    "failed" => Ok($name::Failed),
                    other => Err(CoreError::Validation(format!(
                        "Unknown {} '{other}'",
                        stringify!($name)
                    ))),
                }
            }

            /// Whether no further transitions are accepted.
            pub fn is_terminal(self) -> bool {
                matches!(self, $name::Completed | $name::Failed)
            }

            /// Whether moving from `self` to `next` is a legal transition.
            pub fn can_transition_to(self, next: Self) -> bool {
                use $name::*;
                match (self, next) {
                    (Pending, Pending | Processing | Failed) => true,
                    (Processing, Processing | Completed | Failed) => true,
                    _ => false,
                }
            }

            /// Validate a transition, returning `Conflict` when it is illegal.
            pub fn ensure_transition(self, next: Self) -> Result<(), CoreError> {
                if self.can_transition_to(next) {
                    Ok(())
                } else {
                    Err(CoreError::Conflict(format!(
                        "Illegal {} transition: {} -> {}",
                        stringify!($name),
                        self.as_str(),
                        next.as_str()
                    )))
                }
            }

            /// All states that may legally move to `next`.
            pub fn sources_of(next: Self) -> Vec<Self> {
                [$name::Pending, $name::Processing, $name::Completed, $name::Failed]
                    .into_iter()
                    .filter(|s| s.can_transition_to(next))
                    .collect()
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Asset pack lifecycle status.
    AssetPackStatus
}

define_status_enum! {
    /// Pipeline job execution status.
    JobStatus
}
