use serde::Serialize;
use derive_more::From;
use serde_with::{serde_as, DisplayFromStr};

use crate::plugins::socials::error::SocialError;

pub type Result<T> = core::result::Result<T, Error>;
pub type RsResult<T> = core::result::Result<T, Error>;
pub type RsError = Error;

#[serde_as]
#[derive(Debug, Serialize, From, strum_macros::AsRefStr)]
#[serde(tag = "type", content = "data")]
pub enum Error {
	Error { message: String},

	// -- Recognition errors.

	ModelNotFound(String),
	RecognitionDisabled,

	// -- Externals

	#[from]
	Io(#[serde_as(as = "DisplayFromStr")] std::io::Error),

	#[from]
	Social(#[serde_as(as = "DisplayFromStr")] SocialError),

	#[from]
	Serde(#[serde_as(as = "DisplayFromStr")] serde_json::Error),

	#[from]
	ORT(#[serde_as(as = "DisplayFromStr")] ort::Error),

	#[from]
	Shape(#[serde_as(as = "DisplayFromStr")] ndarray::ShapeError),

	#[from]
	Image(#[serde_as(as = "DisplayFromStr")] image::ImageError),
}

// region:    --- Error Boilerplate
impl core::fmt::Display for Error {
	fn fmt(
		&self,
		fmt: &mut core::fmt::Formatter,
	) -> core::result::Result<(), core::fmt::Error> {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for Error {}
// endregion: --- Error Boilerplate
