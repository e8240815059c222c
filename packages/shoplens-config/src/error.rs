use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read config file at {path:?}.")]
	Read { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse config file at {path:?}: {source}")]
	Parse { path: PathBuf, source: toml::de::Error },
	#[error("Invalid {field}: {message}")]
	Invalid { field: &'static str, message: String },
}
impl Error {
	pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
		Self::Invalid { field, message: message.into() }
	}

	pub fn field(&self) -> Option<&'static str> {
		match self {
			Self::Invalid { field, .. } => Some(field),
			_ => None,
		}
	}
}
