//! Backend resources used by the application.
//!
//! Records (users, pets, adoption requests, donation campaigns, payments) are
//! owned by the backend, so bodies stay `serde_json::Value`. Calls that need a
//! signed-in user go through the authenticated client; registering a user
//! record right after sign-up goes through the public one.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{ApiClient, PublicClient};
use crate::error::ClientResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdoptionDecision {
    Accepted,
    Rejected,
}

#[derive(Clone)]
pub struct PetifyApi {
    secure: ApiClient,
    public: PublicClient,
}

fn seg(s: &str) -> String { urlencoding::encode(s).into_owned() }

fn by_email(resource: &str, email: &str) -> String { format!("/{}?email={}", resource, seg(email)) }

impl PetifyApi {
    pub fn new(secure: ApiClient, public: PublicClient) -> Self { Self { secure, public } }

    pub fn client(&self) -> &ApiClient { &self.secure }

    // --- users & roles ---

    /// Store the user record after a successful sign-up. Needs no credential.
    pub async fn save_user(&self, name: &str, email: &str) -> ClientResult<Value> {
        self.public.post("/users", &json!({"name": name, "email": email})).await
    }

    pub async fn users(&self) -> ClientResult<Value> { self.secure.get("/users").await }

    pub async fn make_admin(&self, user_id: &str) -> ClientResult<Value> {
        self.secure.patch(&format!("/users/admin/{}", seg(user_id)), None).await
    }

    /// Whether the backend grants `email` the admin role. A missing flag means no.
    pub async fn is_admin(&self, email: &str) -> ClientResult<bool> {
        let v = self.secure.get(&format!("/users/admin/{}", seg(email))).await?;
        Ok(v.get("admin").and_then(Value::as_bool).unwrap_or(false))
    }

    // --- pets ---

    pub async fn pets_of(&self, email: &str) -> ClientResult<Value> { self.secure.get(&by_email("pets", email)).await }

    pub async fn pet(&self, id: &str) -> ClientResult<Value> { self.secure.get(&format!("/pets/{}", seg(id))).await }

    pub async fn add_pet(&self, pet: &Value) -> ClientResult<Value> { self.secure.post("/pets", pet).await }

    pub async fn update_pet(&self, id: &str, pet: &Value) -> ClientResult<Value> {
        self.secure.put(&format!("/pets/{}", seg(id)), pet).await
    }

    pub async fn set_adopted(&self, id: &str, adopted: bool) -> ClientResult<Value> {
        self.secure.patch(&format!("/pets/{}", seg(id)), Some(&json!({"adopted": adopted}))).await
    }

    pub async fn delete_pet(&self, id: &str) -> ClientResult<Value> { self.secure.delete(&format!("/pets/{}", seg(id))).await }

    // --- adoption requests ---

    pub async fn request_adoption(&self, request: &Value) -> ClientResult<Value> { self.secure.post("/adoptions", request).await }

    /// Adoption requests received for pets owned by `email`.
    pub async fn adoption_requests(&self, email: &str) -> ClientResult<Value> { self.secure.get(&by_email("adoptions", email)).await }

    pub async fn decide_adoption(&self, id: &str, decision: AdoptionDecision) -> ClientResult<Value> {
        self.secure.patch(&format!("/adoptions/{}", seg(id)), Some(&json!({"status": decision}))).await
    }

    // --- donation campaigns ---

    pub async fn campaigns_of(&self, email: &str) -> ClientResult<Value> { self.secure.get(&by_email("campaigns", email)).await }

    pub async fn campaign(&self, id: &str) -> ClientResult<Value> { self.secure.get(&format!("/campaigns/{}", seg(id))).await }

    pub async fn create_campaign(&self, campaign: &Value) -> ClientResult<Value> { self.secure.post("/campaigns", campaign).await }

    pub async fn update_campaign(&self, id: &str, campaign: &Value) -> ClientResult<Value> {
        self.secure.put(&format!("/campaigns/{}", seg(id)), campaign).await
    }

    pub async fn set_campaign_paused(&self, id: &str, paused: bool) -> ClientResult<Value> {
        self.secure.patch(&format!("/campaigns/{}", seg(id)), Some(&json!({"paused": paused}))).await
    }

    // --- payments ---

    /// Ask the backend for a payment-gateway client secret for `amount` (major currency units).
    pub async fn create_payment_intent(&self, amount: f64) -> ClientResult<Option<String>> {
        let v = self.secure.post("/create-payment-intent", &json!({"price": amount})).await?;
        Ok(v.get("clientSecret").and_then(Value::as_str).map(str::to_string))
    }

    pub async fn record_payment(&self, payment: &Value) -> ClientResult<Value> { self.secure.post("/payments", payment).await }

    pub async fn payments_of(&self, email: &str) -> ClientResult<Value> { self.secure.get(&by_email("payments", email)).await }

    /// Remove a donation (refund request) by payment id.
    pub async fn refund(&self, payment_id: &str) -> ClientResult<Value> {
        self.secure.delete(&format!("/payments/{}", seg(payment_id))).await
    }
}
