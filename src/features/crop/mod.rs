pub mod handler;
mod service;
mod types;

pub use handler::create_crop_router;
pub use service::{CroppedImage, crop_to_jpeg};
pub use types::{
    CROP_RESULT_HEADER, CROP_SUCCESS_MESSAGE, CROPPED_FILE_NAME, CropMessage, CropQuery,
    CropRegion, CropUploadForm, IMAGE_FIELD,
};
