pub mod audio;
pub mod celebration;
pub mod phrases;
pub mod scene;
pub mod session;
