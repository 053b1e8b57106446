//! Core of the codepencil live playground
//!
//! Everything here is independent of the terminal:
//! - `store`: namespaced JSON entries over an injected storage capability
//! - `layout`: divider percentages and the drag engine that moves them
//! - `debounce`: resettable delayed tasks driven by the host's clock
//! - `preview`: composing the three buffers into one sandboxed document
//! - `playground`: the root state that ties the pieces together
//!
//! The TUI front end lives in the `codepencil` crate.

pub mod buffers;
pub mod config;
pub mod debounce;
pub mod layout;
pub mod playground;
pub mod preview;
pub mod store;

pub use buffers::{Buffers, Language};
pub use config::{ConfigError, PlaygroundConfig};
pub use debounce::Debouncer;
pub use layout::{Divider, Extent, LayoutEngine, LayoutState, PointerCapture, PointerPosition};
pub use playground::{Playground, TickOutcome};
pub use preview::{Compositor, MemorySurface, RenderSurface, SandboxedFile, SurfaceError};
pub use store::{FileStorage, MemoryStorage, PersistentStore, Storage, StoreError};
