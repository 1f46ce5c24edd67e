mod capture;
mod status;
mod url;

pub use capture::run_capture;
pub use status::run_status;
pub use url::run_url;
