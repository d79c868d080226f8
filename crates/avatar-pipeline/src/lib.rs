//! Multimodal response pipeline for the avatar.
//!
//! Converts one chat message into an ordered list of [`ResponsePacket`]s,
//! each carrying spoken text, a base64 audio clip, a viseme track, a facial
//! expression and an animation. The stages run as
//!
//! ```text
//! completion -> for each draft { synthesis -> transcode -> alignment } -> assembly
//! ```
//!
//! and the caller receives either every packet or a single [`PipelineError`].
//! Intermediate files live in a per-request workspace (see [`artifacts`]),
//! so concurrent requests never share artifact paths.
//!
//! [`ResponsePacket`]: avatar_types::ResponsePacket

pub mod artifacts;
pub mod assembly;
pub mod config;
pub mod error;
pub mod fallback;
pub mod pipeline;

pub use artifacts::{ArtifactStore, RequestWorkspace};
pub use config::PipelineConfig;
pub use error::{PipelineError, Stage};
pub use fallback::{FallbackKind, FallbackProvider};
pub use pipeline::{Pipeline, Stages, UpstreamCredentials};
