pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String, field: Option<String> },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Index error: {message}")]
	Index { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into(), field: None }
	}

	/// An invalid request pinned to a JSON path such as `$[2]`.
	pub(crate) fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into(), field: Some(field.into()) }
	}
}

impl From<shoplens_storage::Error> for Error {
	fn from(err: shoplens_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
