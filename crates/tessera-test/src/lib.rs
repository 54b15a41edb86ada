//! # Tessera Test
//!
//! In-memory request testing for Tessera applications. Requests go through
//! the complete middleware pipeline and dispatcher without binding a port.
//!
//! ```rust,ignore
//! use tessera_test::TestClient;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn creates_user() {
//!     let client = TestClient::new(app().kernel());
//!
//!     let response = client
//!         .post("/users")
//!         .json(&json!({"name": "Alice"}))
//!         .send()
//!         .await;
//!
//!     response.assert_status(http::StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
