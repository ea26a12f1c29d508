use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Request, Response};
use std::sync::Mutex;

use super::HttpClient;

/// One request as the server side saw it.
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub method: Method,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl SeenRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.body.as_deref().unwrap()).unwrap()
    }

    pub fn form(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.body.as_deref().unwrap().as_bytes())
            .into_owned()
            .collect()
    }
}

/// Returns queued responses in order and records every request.
#[derive(Default)]
pub(crate) struct Canned {
    responses: Mutex<Vec<(u16, String)>>,
    pub seen: Mutex<Vec<SeenRequest>>,
}

impl Canned {
    pub fn respond(responses: &[(u16, &str)]) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .iter()
                    .rev()
                    .map(|(s, b)| (*s, b.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for Canned {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        self.seen.lock().unwrap().push(SeenRequest {
            method: req.method().clone(),
            url: req.url().to_string(),
            content_type: req
                .headers()
                .get(CONTENT_TYPE)
                .map(|v| v.to_str().unwrap().to_string()),
            body: req
                .body()
                .and_then(|b| b.as_bytes())
                .map(|b| String::from_utf8(b.to_vec()).unwrap()),
        });

        let (status, body) = self.responses.lock().unwrap().pop().unwrap();
        let resp = http::Response::builder().status(status).body(body).unwrap();
        Ok(resp.into())
    }
}
