//! PrintSync relay - MakerWorld print history to the PrintSync ingestion API
//!
//! A scheduler calls one protected endpoint; each call performs a single
//! relay pass:
//!
//! 1. **Authorize** the trigger against `Authorization: Bearer <CRON_SECRET>`
//! 2. **Fetch** the 100 most recent print tasks from MakerWorld
//! 3. **Normalize** every task into a flat [`NormalizedPrintRecord`]
//! 4. **Forward** the batch to the ingestion API
//! 5. **Respond** with `{"success": true, "synced": <count>}`
//!
//! Any failure after authorization aborts the pass and answers
//! `500 {"error": "<message>"}`. Nothing is retried or persisted.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use relay::RelayConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = RelayConfig::load()?;
//!     relay::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! - `GET /api/cron/scrape` - run one relay pass (bearer secret required)
//! - `GET /health` - liveness probe
//! - `GET /metrics` - Prometheus metrics

pub mod config;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod pipeline;
pub mod record;
pub mod routes;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use pipeline::{SyncSummary, run_sync};
pub use record::{NormalizedPrintRecord, RawTaskEntry, normalize_all, normalize_entry};
pub use server::{build_router, start_server};
pub use state::ServerState;
