pub mod api;
pub mod character;
pub mod image;
pub mod story;
pub mod text;

pub use api::*;
pub use character::*;
pub use image::*;
pub use story::*;
pub use text::*;
