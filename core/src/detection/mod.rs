pub mod frame;
pub mod record;
pub mod reducer;

pub use frame::{FrameError, ImageFrame};
pub use record::{
    capture_timestamp, DetectionRecord, RecordStatus, UploadContext, UNCLASSIFIED_MODEL,
    UNKNOWN_LABEL,
};
pub use reducer::{reduce, BestDetection};
