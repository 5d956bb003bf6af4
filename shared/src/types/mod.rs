pub mod booth;
pub mod client_config;
pub mod display;
pub mod json_error;
pub mod login;
pub mod report;
pub mod upload;
pub mod users;
pub mod voter;

pub use self::booth::{BoothLocation, BoothSummary};
pub use self::client_config::{ApiConfig, ClientConfig, ConfigError, StorageConfig};
pub use self::display::{DisplayField, FieldVisibility, RemoteConfig};
pub use self::json_error::ErrorResponse;
pub use self::login::{LoginData, LoginError, LoginResponse, ProfileUpdate, RefreshToken, Session};
pub use self::report::{LoginDetail, LoginStatus, PrintDetail, UserPrintRow, VoterReportRow};
pub use self::upload::{UploadError, UploadReceipt, VoterRollUpload};
pub use self::users::{SubUser, UserDirectory};
pub use self::voter::{Gender, VoterPage, VoterRecord};
