//! # Roster Test
//!
//! In-memory testing for the Roster service. Requests go through the same
//! routing and middleware as networked ones, without binding a port.
//!
//! ## Example
//!
//! ```rust
//! use roster_test::{MultipartForm, TestApp};
//!
//! # tokio_test::block_on(async {
//! let app = TestApp::new().unwrap();
//! let token = app.token("u-1").unwrap();
//!
//! let form = MultipartForm::new()
//!     .text("firstName", "Ada")
//!     .file("profileImage", "ada.png", "image/png", &b"PNG"[..]);
//!
//! let response = app
//!     .client()
//!     .post("/api/employees")
//!     .bearer_token(&token)
//!     .multipart(form)
//!     .send()
//!     .await;
//!
//! assert_eq!(response.status_code(), 201);
//! assert_eq!(app.uploaded_files().unwrap().len(), 1);
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/roster-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod harness;
mod request;
mod response;
mod token;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use harness::{TestApp, TestAppBuilder, TEST_SECRET};
pub use request::{MultipartForm, TestRequestBuilder};
pub use response::TestResponse;
pub use token::TokenFactory;
