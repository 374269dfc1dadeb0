//! Value types shared by the logging pipeline

mod permission;
mod record;
mod result_code;

pub use permission::FilePermission;
pub use record::LogRecord;
pub use result_code::ResultCode;
