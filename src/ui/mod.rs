pub mod app;
pub mod input;
pub mod markdown;
pub mod render;
pub mod scroll;

pub use app::{restore_terminal, setup_terminal, App};
pub use input::{InputAction, InputController};
pub use scroll::ScrollController;
