use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::notification::domain::notifier::{NotifyError, Notifier};
use crate::shared::constants::{PHOTO_TIMEOUT, TELEGRAM_API_BASE, TEXT_TIMEOUT};

const SEND_MESSAGE: &str = "sendMessage";
const SEND_PHOTO: &str = "sendPhoto";

/// Sends alerts through the Telegram Bot API.
///
/// Text goes to `sendMessage` as a form post; photos go to `sendPhoto` as a
/// multipart upload. Errors never carry the request URL, which embeds the
/// bot token.
pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    api_base: String,
    token: String,
    chat_id: String,
    text_timeout: Duration,
    photo_timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| NotifyError::Transport {
                operation: "build HTTP client",
                source: e,
            })?;
        Ok(Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            text_timeout: TEXT_TIMEOUT,
            photo_timeout: PHOTO_TIMEOUT,
        })
    }

    /// Overrides the API root, e.g. for a local Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeouts(mut self, text: Duration, photo: Duration) -> Self {
        self.text_timeout = text;
        self.photo_timeout = photo;
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }
}

impl Notifier for TelegramNotifier {
    fn send_text(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint(SEND_MESSAGE))
            .timeout(self.text_timeout)
            .form(&[("chat_id", self.chat_id.as_str()), ("text", message)])
            .send()
            .map_err(|e| classify(SEND_MESSAGE, self.text_timeout, e))?;
        check_status(SEND_MESSAGE, response)
    }

    fn send_photo(&self, path: &Path, caption: &str) -> Result<(), NotifyError> {
        let bytes = fs::read(path).map_err(|e| NotifyError::Attachment {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.jpg".to_string());

        let photo = reqwest::blocking::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .map_err(|e| classify(SEND_PHOTO, self.photo_timeout, e))?;
        let form = reqwest::blocking::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", photo);

        let response = self
            .client
            .post(self.endpoint(SEND_PHOTO))
            .timeout(self.photo_timeout)
            .multipart(form)
            .send()
            .map_err(|e| classify(SEND_PHOTO, self.photo_timeout, e))?;
        check_status(SEND_PHOTO, response)
    }
}

fn classify(operation: &'static str, timeout: Duration, error: reqwest::Error) -> NotifyError {
    if error.is_timeout() {
        NotifyError::Timeout { operation, timeout }
    } else {
        NotifyError::Transport {
            operation,
            source: error.without_url(),
        }
    }
}

fn check_status(
    operation: &'static str,
    response: reqwest::blocking::Response,
) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().unwrap_or_default();
    Err(NotifyError::Rejected {
        operation,
        status: status.as_u16(),
        body,
    })
}
