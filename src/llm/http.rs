use reqwest::blocking::{Client, RequestBuilder};

use crate::error::AttemptError;

pub fn client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("cibot/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Send a prepared request and return the body of a 2xx response.
pub fn send(request: RequestBuilder) -> Result<String, AttemptError> {
    let resp = request.send().map_err(AttemptError::Transport)?;

    let status = resp.status();
    let body = resp.text().map_err(AttemptError::Transport)?;

    if !status.is_success() {
        return Err(AttemptError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

pub fn parse_error(reason: impl ToString, body: &str) -> AttemptError {
    AttemptError::Parse {
        reason: reason.to_string(),
        body: body.to_string(),
    }
}
