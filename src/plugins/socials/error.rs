use derive_more::From;
use serde::Serialize;
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};

pub type SocialResult<T> = core::result::Result<T, SocialError>;

#[serde_as]
#[derive(Debug, Serialize, From, strum_macros::AsRefStr)]
pub enum SocialError {

	Error,
	Other(String),

	/// Error envelope returned by the social API itself (bad token, rate
	/// limit, malformed request). Carries the raw payload for debugging.
	Api { code: i64, message: String, raw: Value },

	DownloadFailed { url: String, status: u16 },

	#[from]
	Reqwest(#[serde_as(as = "DisplayFromStr")] reqwest::Error),

	#[from]
	Serde(#[serde_as(as = "DisplayFromStr")] serde_json::Error),

	#[from]
	Io(#[serde_as(as = "DisplayFromStr")] std::io::Error),

}

// region:    --- Error Boilerplate

impl core::fmt::Display for SocialError {
	fn fmt(
		&self,
		fmt: &mut core::fmt::Formatter,
	) -> core::result::Result<(), core::fmt::Error> {
		write!(fmt, "{self:?}")
	}
}

impl std::error::Error for SocialError {}

// endregion: --- Error Boilerplate
