pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
	#[error("Serialization error: {message}")]
	Serialization { message: String },
}
impl From<inq_providers::Error> for Error {
	fn from(err: inq_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<inq_storage::Error> for Error {
	fn from(err: inq_storage::Error) -> Self {
		match err {
			inq_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			inq_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			inq_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Serialization { message: err.to_string() }
	}
}
