pub mod config;
pub mod error;
pub mod history;
pub mod mutator;
pub mod ops;
pub mod replace;
pub mod services;

pub use config::LayoutDefaults;
pub use error::{EditError, HistoryError, ServiceError};
pub use history::{
    DirSnapshotStore, History, HistoryStatus, MemorySnapshotStore, Restored, SnapshotStore,
};
pub use mutator::{Derived, GridMove, LayoutMutator, MutationResult};
pub use ops::{Operation, WIRE_NAMES};
pub use replace::{
    GeneratedImage, ImageRequest, Placement, fit_inside, is_image_like, place_generated_image,
    plan_image,
};
pub use services::{BackgroundRemover, ImageGenerator, ImagePipeline};
