//! UI components for the playground
//!
//! These modules handle rendering of the editor panels, the preview pane
//! and the dividers between them.

pub mod editor_pane;
pub mod highlight;
pub mod layout;
pub mod preview_pane;
