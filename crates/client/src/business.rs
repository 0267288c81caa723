//! Typed business calls.
//!
//! Every gateway method wraps its JSON in a method-specific outer key, and
//! every reply carries `retcode` / `errmsg` inside that key. The helpers here
//! do the wrapping, call [`TsmClient::send`] and turn a non-zero `retcode`
//! into [`ClientError::Rejected`].

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::client::TsmClient;
use crate::error::{ClientError, ClientResult};

/// Gateway method names.
pub mod methods {
    /// Obtain an access token.
    pub const ACCESS_TOKEN: &str = "synjones.authorize.access_token";
    /// Open a cardholder account.
    pub const OPEN_ACCOUNT: &str = "synjones.onecard.open.acc";
    /// Generate a payment barcode.
    pub const BARCODE: &str = "synjones.onecard.barcode.get";
    /// Unfreeze a card.
    pub const UNFREEZE_CARD: &str = "synjones.onecard.unfrozen.card";
}

/// Length of the placeholder token sent with the access-token call.
pub const PLACEHOLDER_TOKEN_LEN: usize = 128;

/// Retcode reported by a successful business call.
const RETCODE_OK: &str = "0";

/// The access token used before one has been issued: 128 `'0'` characters.
pub fn placeholder_access_token() -> String {
    "0".repeat(PLACEHOLDER_TOKEN_LEN)
}

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $( $(#[$vmeta:meta])* $variant:ident = $code:literal, $($alias:literal)|* ; )+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// The wire code.
            pub fn code(self) -> &'static str {
                match self {
                    $( $name::$variant => $code, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_ascii_lowercase();
                match lower.as_str() {
                    $( $code $(| $alias)* => Ok($name::$variant), )+
                    _ => Err(format!(
                        "invalid {} {:?}, expected one of: {}",
                        stringify!($name),
                        s,
                        [$($code),+].join(", ")
                    )),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.code())
            }
        }
    };
}

coded_enum! {
    /// Cardholder sex.
    Sex {
        Male = "1", "male" | "m";
        Female = "2", "female" | "f";
        Unknown = "9", "unknown";
    }
}

coded_enum! {
    /// Kind of card to issue.
    CardType {
        /// Regular campus card.
        Permanent = "800", "permanent";
        /// Temporary card.
        Temporary = "801", "temporary";
    }
}

coded_enum! {
    /// Funding source for a barcode payment.
    PayType {
        /// The campus-card account itself.
        CampusCard = "1", "campus-card" | "card";
        /// A bank card bound to the account.
        BoundBankCard = "2", "bound-bank-card" | "bound";
        /// A bank card given per payment.
        CustomBankCard = "3", "custom-bank-card" | "custom";
    }
}

impl Default for Sex {
    fn default() -> Self {
        Sex::Unknown
    }
}

impl Default for CardType {
    fn default() -> Self {
        CardType::Permanent
    }
}

/// Placeholder `payacc` for campus-card payments.
pub const CAMPUS_CARD_PAY_ACC: &str = "###";

/// An issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    /// Token to pass to business calls.
    #[serde(default)]
    pub access_token: String,
    /// Lifetime as reported by the gateway, in seconds.
    #[serde(default)]
    pub expires_in: String,
}

/// Cardholder details for [`TsmClient::open_account`].
///
/// Date fields are passed through as the gateway expects them (`YYYYMMDD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenAccount {
    /// Student or staff number.
    pub sno: String,
    pub name: String,
    pub sex: Sex,
    /// National ID number.
    #[serde(rename = "idno")]
    pub id_no: String,
    pub phone: String,
    #[serde(rename = "schoolcode")]
    pub school_code: String,
    #[serde(rename = "depcode")]
    pub dept_code: String,
    /// Birth date. A single space when unknown.
    pub born: String,
    /// Identity category code.
    #[serde(rename = "pidcode")]
    pub pid_code: String,
    pub email: String,
    #[serde(rename = "indate")]
    pub in_date: String,
    #[serde(rename = "expdate")]
    pub exp_date: String,
    #[serde(rename = "cardtype")]
    pub card_type: CardType,
    /// Base64 photo, may be empty.
    pub photo_image: String,
}

impl Default for OpenAccount {
    fn default() -> Self {
        Self {
            sno: String::new(),
            name: String::new(),
            sex: Sex::default(),
            id_no: String::new(),
            phone: String::new(),
            school_code: String::new(),
            dept_code: String::new(),
            born: " ".to_string(),
            pid_code: String::new(),
            email: String::new(),
            in_date: String::new(),
            exp_date: String::new(),
            card_type: CardType::default(),
            photo_image: String::new(),
        }
    }
}

/// Result of opening an account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenedAccount {
    #[serde(default)]
    pub sno: String,
    /// Campus-card account number assigned by the gateway.
    #[serde(default)]
    pub account: String,
}

/// Parameters for [`TsmClient::get_barcode`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BarcodeRequest {
    pub account: String,
    #[serde(rename = "paytype")]
    pub pay_type: PayType,
    /// Bank card number, or `"###"` for campus-card payments.
    #[serde(rename = "payacc")]
    pub pay_acc: String,
}

impl BarcodeRequest {
    /// A barcode paid from the campus-card account itself.
    pub fn campus_card(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            pay_type: PayType::CampusCard,
            pay_acc: CAMPUS_CARD_PAY_ACC.to_string(),
        }
    }

    /// A barcode paid from the bank card already bound to the account.
    ///
    /// The gateway looks the card up itself, so `payacc` is sent empty.
    pub fn bound_bank_card(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            pay_type: PayType::BoundBankCard,
            pay_acc: String::new(),
        }
    }

    /// A barcode paid from a bank card.
    pub fn bank_card(account: impl Into<String>, pay_type: PayType, card_no: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            pay_type,
            pay_acc: card_no.into(),
        }
    }
}

/// A payment barcode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Barcode {
    #[serde(default)]
    pub account: String,
    #[serde(default, rename = "paytype")]
    pub pay_type: String,
    #[serde(default, rename = "payacc")]
    pub pay_acc: String,
    /// The code to render.
    #[serde(default)]
    pub barcode: String,
    /// Validity in seconds.
    #[serde(default)]
    pub expires: String,
}

#[derive(Debug, Serialize)]
struct EmptyRequest {}

#[derive(Debug, Serialize)]
struct UnfreezeRequest {
    account: String,
}

#[derive(Debug, Deserialize)]
struct UnfreezeReply {
    #[serde(default)]
    account: String,
}

/// `retcode` / `errmsg` carried next to every reply body.
#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    retcode: String,
    #[serde(default)]
    errmsg: String,
}

/// Wraps `body` as `{"<key>": body}`.
fn wrap_request<T: Serialize>(method: &'static str, key: &str, body: &T) -> ClientResult<String> {
    let inner = serde_json::to_value(body).map_err(|e| ClientError::InvalidPayload {
        method,
        reason: format!("cannot encode request: {}", e),
    })?;
    let mut outer = Map::new();
    outer.insert(key.to_string(), inner);
    Ok(Value::Object(outer).to_string())
}

/// Extracts the body under the first of `keys` present, checks `retcode`
/// and deserializes it.
fn unwrap_reply<T: DeserializeOwned>(
    method: &'static str,
    keys: &[&str],
    payload: &str,
) -> ClientResult<T> {
    let invalid = |reason: String| ClientError::InvalidPayload { method, reason };

    let mut outer: Map<String, Value> =
        serde_json::from_str(payload).map_err(|e| invalid(e.to_string()))?;
    let body = keys
        .iter()
        .find_map(|key| outer.remove(*key))
        .ok_or_else(|| invalid(format!("missing {}", keys.join(" or "))))?;

    let status = Status::deserialize(&body).map_err(|e| invalid(e.to_string()))?;
    if status.retcode != RETCODE_OK {
        return Err(ClientError::Rejected {
            method,
            retcode: status.retcode,
            message: status.errmsg,
        });
    }

    serde_json::from_value(body).map_err(|e| invalid(e.to_string()))
}

impl TsmClient {
    async fn call<Req, Resp>(
        &self,
        method: &'static str,
        access_token: &str,
        request_key: &str,
        reply_keys: &[&str],
        request: &Req,
    ) -> ClientResult<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let request_json = wrap_request(method, request_key, request)?;
        debug!(method, request_len = request_json.len(), "calling business method");
        let reply = self.send(access_token, &request_json, method).await?;
        unwrap_reply(method, reply_keys, &reply.payload)
    }

    /// Requests an access token for this application.
    pub async fn get_access_token(&self) -> ClientResult<AccessToken> {
        let token: AccessToken = self
            .call(
                methods::ACCESS_TOKEN,
                &placeholder_access_token(),
                "authorize_access_token",
                &["authorize_access_token"],
                &EmptyRequest {},
            )
            .await?;

        if token.access_token.is_empty() {
            return Err(ClientError::InvalidPayload {
                method: methods::ACCESS_TOKEN,
                reason: "empty access_token".to_string(),
            });
        }

        info!(expires_in = %token.expires_in, "obtained access token");
        Ok(token)
    }

    /// Opens a cardholder account and returns the assigned account number.
    pub async fn open_account(
        &self,
        access_token: &str,
        holder: &OpenAccount,
    ) -> ClientResult<OpenedAccount> {
        let opened: OpenedAccount = self
            .call(methods::OPEN_ACCOUNT, access_token, "open_acc", &["open_acc"], holder)
            .await?;
        info!(sno = %opened.sno, account = %opened.account, "opened account");
        Ok(opened)
    }

    /// Generates a payment barcode.
    pub async fn get_barcode(
        &self,
        access_token: &str,
        request: &BarcodeRequest,
    ) -> ClientResult<Barcode> {
        self.call(
            methods::BARCODE,
            access_token,
            "barcode_get",
            &["barcode_get"],
            request,
        )
        .await
    }

    /// Unfreezes the card of `account`.
    pub async fn unfreeze_card(&self, access_token: &str, account: i64) -> ClientResult<()> {
        let request = UnfreezeRequest {
            account: account.to_string(),
        };
        // The gateway spells the reply key "unforzen_card".
        let reply: UnfreezeReply = self
            .call(
                methods::UNFREEZE_CARD,
                access_token,
                "unfrozen_card",
                &["unforzen_card", "unfrozen_card"],
                &request,
            )
            .await?;
        info!(account = %reply.account, "unfroze card");
        Ok(())
    }
}
