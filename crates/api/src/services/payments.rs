//! Razorpay API client for payment links.
//!
//! Checkout is paid up front: the client requests a payment link, the
//! buyer completes it on Razorpay's hosted page, and the order placement
//! endpoint verifies the payment was captured before any stock moves.

use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RazorpayConfig;
use crate::models::user::User;

/// Razorpay API base URL.
const BASE_URL: &str = "https://api.razorpay.com/v1";

/// Errors that can occur when interacting with the Razorpay API.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("payment gateway error: {status} - {message}")]
    Gateway { status: u16, message: String },

    /// The referenced payment does not exist.
    #[error("payment not found")]
    PaymentNotFound,
}

/// A created payment link.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentLink {
    /// Link id, used as the order batch's payment reference.
    pub id: String,
    /// Hosted payment page URL for the buyer.
    pub short_url: String,
}

#[derive(Debug, Deserialize)]
struct Payment {
    status: String,
}

/// Razorpay API client.
#[derive(Clone)]
pub struct RazorpayClient {
    client: reqwest::Client,
    key_id: String,
    key_secret: String,
    callback_url: String,
    base_url: String,
}

impl RazorpayClient {
    /// Create a new Razorpay API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &RazorpayConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.expose_secret().to_owned(),
            callback_url: config.callback_url.clone(),
            base_url: BASE_URL.to_owned(),
        })
    }

    /// Create a payment link for `amount` (minor currency units, INR).
    ///
    /// The buyer is notified by SMS and email, and redirected to the
    /// configured callback URL after paying.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Gateway`] if Razorpay rejects the request.
    pub async fn create_payment_link(
        &self,
        amount: i64,
        buyer: &User,
    ) -> Result<PaymentLink, PaymentError> {
        let url = format!("{}/payment_links", self.base_url);

        let body = serde_json::json!({
            "amount": amount,
            "currency": "INR",
            "customer": {
                "name": buyer.name,
                "contact": buyer.phone,
                "email": buyer.email,
            },
            "notify": { "sms": true, "email": true },
            "reminder_enable": true,
            "callback_url": self.callback_url,
            "callback_method": "get",
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    /// Whether the payment with `payment_id` has been captured.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::PaymentNotFound`] if the id is unknown to
    /// Razorpay, [`PaymentError::Gateway`] on other API errors.
    pub async fn is_captured(&self, payment_id: &str) -> Result<bool, PaymentError> {
        let url = format!("{}/payments/{payment_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            return Err(PaymentError::PaymentNotFound);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        let payment: Payment = response.json().await?;
        Ok(payment.status == "captured")
    }
}
