use std::time::{SystemTime, UNIX_EPOCH};

use axum::response::Response;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use signer::jwt::CallerClaims;

/// Secret used by authenticated test setups
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Read the raw response body
pub async fn response_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Mint a caller token for `user_id`, valid for five minutes
pub fn create_test_token(user_id: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 300;

    encode(
        &Header::default(),
        &CallerClaims {
            sub: user_id.to_string(),
            exp,
        },
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}
