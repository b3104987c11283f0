use std::convert::Infallible;

use axum::{
    Form, Json,
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

#[derive(Debug, Default, Deserialize)]
pub struct NewBookForm {
    #[serde(default, deserialize_with = "scalar_text")]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default, deserialize_with = "scalar_text")]
    pub comment: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

/// Reads a text field, rendering JSON numbers and booleans as their text.
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Integer(n) => n.to_string(),
        Scalar::Float(n) => n.to_string(),
        Scalar::Flag(b) => b.to_string(),
    }))
}

/// Request body decoded from JSON or a urlencoded form.
///
/// Never rejects: a missing, foreign or undecodable body yields `T::default()`
/// so the handler reports the missing field itself.
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        let decoded = if is_json {
            Json::<T>::from_request(req, state).await.map(|Json(v)| v).ok()
        } else {
            Form::<T>::from_request(req, state).await.map(|Form(v)| v).ok()
        };

        if decoded.is_none() {
            tracing::debug!("request body could not be decoded, treating it as empty");
        }

        Ok(Payload(decoded.unwrap_or_default()))
    }
}

/// Returns the value unless it is absent or empty.
pub fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
