//! Document model types for paginated flowing content.
//!
//! A [`Document`] is an ordered list of flow units. A [`Layout`] assigns
//! contiguous ranges of that flow to pages sized by a [`PageGeometry`].

mod document;
mod geometry;
mod layout;

pub use document::{Document, Edit, FlowUnit};
pub use geometry::PageGeometry;
pub use layout::{FlowPos, Layout, Page};
