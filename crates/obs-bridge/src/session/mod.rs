//! Session lifecycle supervision

mod loader;
mod supervisor;

pub use loader::{fetch_scene_list, load_scenes};
pub use supervisor::SessionSupervisor;
