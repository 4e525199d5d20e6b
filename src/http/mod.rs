//! Incremental request and upload parsing.
//!
//! Bytes arrive from the socket in chunks of any size. Everything here works on what is
//! already buffered and either makes progress or asks for one more read, so a request
//! line or upload can span any number of reads.
//!
//! # Modules
//!
//! - **`buffer`**: bounded line buffer with CRLF scanning and shift-on-consume
//! - **`parser`**: request line (method, path, query) parsing
//! - **`query`**: bounded `name=value&...` splitting
//! - **`multipart`**: boundary declaration and filename scanning
//! - **`upload`**: streaming the file body to a sink
//! - **`connection`**: the per-connection state machine tying the above together
//! - **`response`** / **`writer`**: minimal responses
//! - **`error`**: `ParseError` and its classification
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← refill until a request line is buffered
//!        └──────┬──────┘
//!               │ request line parsed
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← route on method and path
//!        └──────┬───────────┘
//!               ├─ POST /image-upload ─► Uploading ─┐
//!               ▼                                   │
//!        ┌──────────────────┐                       │
//!        │    Writing       │ ◄─────────────────────┘
//!        └──────┬───────────┘
//!               ▼
//!            Closed  (also reached directly when the peer abandons the request)
//! ```

pub mod buffer;
pub mod connection;
pub mod error;
pub mod multipart;
pub mod parser;
pub mod query;
pub mod request;
pub mod response;
pub mod upload;
pub mod writer;
