pub mod popups;
pub mod surface;

pub use popups::{ActivePopupList, PopupRecord};
pub use surface::{OverlayController, OverlaySurfaceState};
