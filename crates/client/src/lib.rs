//! # TSM Client
//!
//! Async client for the TSM campus-card gateway, built on the envelope
//! protocol in `tsm-protocol`.
//!
//! ## Overview
//!
//! - **Transport**: `reqwest` POST of the form-encoded envelope
//! - **Client**: one exchange per [`TsmClient::send`], with `errcode` mapping
//! - **Business calls**: access token, account opening, barcodes, unfreezing
//! - **Configuration**: TOML file with environment overrides
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tsm_client::{BarcodeRequest, Config, TsmClient};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut config = Config::load_default()?;
//! config.apply_env_overrides();
//!
//! let client = TsmClient::from_config(&config)?;
//! let token = client.get_access_token().await?;
//! let barcode = client
//!     .get_barcode(&token.access_token, &BarcodeRequest::campus_card("100234"))
//!     .await?;
//! println!("{}", barcode.barcode);
//! # Ok(())
//! # }
//! ```

pub mod business;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use business::{
    methods, placeholder_access_token, AccessToken, Barcode, BarcodeRequest, CardType,
    OpenAccount, OpenedAccount, PayType, Sex, CAMPUS_CARD_PAY_ACC, PLACEHOLDER_TOKEN_LEN,
};
pub use client::{ClientOptions, GatewayReply, TsmClient};
pub use config::{default_config_path, Config, ConfigError};
pub use error::{ClientError, ClientResult};
pub use transport::HttpTransport;
