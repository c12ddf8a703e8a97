mod mpv;
mod viewer;

pub use mpv::MpvPlayer;
pub use viewer::ImageViewer;
