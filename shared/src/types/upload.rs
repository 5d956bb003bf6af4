use serde::{Deserialize, Serialize};

/// Spreadsheet formats the backend importer accepts.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// A voter-roll spreadsheet plus the campaign metadata submitted with it.
#[derive(Debug, Clone)]
pub struct VoterRollUpload {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub party_name: String,
    pub candidate_name: String,
    pub area_name: String,
    pub state_name: String,
    pub activation_code: String,
}

impl VoterRollUpload {
    /// Metadata form fields, in submission order.
    pub fn form_fields(&self) -> [(&'static str, &str); 5] {
        [
            ("partyName", self.party_name.as_str()),
            ("candidateName", self.candidate_name.as_str()),
            ("areaName", self.area_name.as_str()),
            ("stateName", self.state_name.as_str()),
            ("activationCode", self.activation_code.as_str()),
        ]
    }

    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }

    /// MIME type for the file part.
    pub fn content_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("csv") => "text/csv",
            Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Some("xls") => "application/vnd.ms-excel",
            _ => "application/octet-stream",
        }
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        for (field, value) in self.form_fields() {
            if value.trim().is_empty() {
                return Err(UploadError::MissingField(field));
            }
        }
        match self.extension() {
            Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => {}
            _ => return Err(UploadError::UnsupportedFileType(self.file_name.clone())),
        }
        if self.contents.is_empty() {
            return Err(UploadError::EmptyFile);
        }
        Ok(())
    }
}

/// Whatever the importer reports back. Both fields are optional because the
/// endpoint may answer with an empty body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub records_imported: Option<u64>,
}

// ---------------------------------------------------------------------------
// Upload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    MissingField(&'static str),
    UnsupportedFileType(String),
    EmptyFile,
}

impl UploadError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => field,
            Self::UnsupportedFileType(_) | Self::EmptyFile => "file",
        }
    }

    pub fn to_message(&self) -> String {
        match self {
            Self::MissingField(field) => format!("Missing required field: {}", field),
            Self::UnsupportedFileType(name) => {
                format!("{} is not a .csv, .xlsx or .xls file", name)
            }
            Self::EmptyFile => "The selected file is empty".to_string(),
        }
    }
}
