mod compose_driver;
mod lifecycle;

pub use compose_driver::ComposeDriver;
pub use lifecycle::{ImageRemoval, LifecycleManager, classify_image_removal, command_catalog};
