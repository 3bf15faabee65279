pub mod error;
pub mod format;
pub mod gallery;
pub mod id;
pub mod model;
pub mod render;
pub mod serialize;
pub mod surface;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use format::{load_document, save_document};
pub use gallery::{GalleryItem, Template, TemplateBlock};
pub use id::{ElementId, PageId};
pub use model::*;
pub use render::render_page;
pub use serialize::serialize_page;
pub use surface::{HandleDir, HeaderCapture, LiveSurface, SurfaceView};
pub use units::{Dim, Rotation, Scale};

// Re-export geometry types so downstream crates share one kurbo version
pub use kurbo::{Point, Rect, Vec2};
