pub mod form;
pub mod media;

pub use form::{read_form, FormData};
pub use media::{MediaError, MediaStore, Upload};
