#![doc = include_str!("../README.md")]

pub mod change;
pub mod error;
pub mod extract;
pub mod navigate;
pub mod ports;
pub mod resolve;
pub mod session;
pub mod types;

pub use change::{ChangeKind, ViewSnapshot};
pub use error::{GitorialError, Result};
pub use extract::{ExtractConfig, ReadmeMode, extract_steps};
pub use navigate::{Refusal, Transition};
pub use ports::{
    FileChange, FileChangeKind, MemoryStateStore, SavedPosition, StateStore, VersionControl,
};
pub use resolve::{Resolution, ResolutionMiss, ResolvedFrom, resolve};
pub use session::{LoadOptions, TutorialSession, Update};
pub use types::{Cursor, PairingIssue, RawCommit, Step, StepType, Tutorial, TutorialView};
