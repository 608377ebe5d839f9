//! User account model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadcart_core::{Actor, UserId};

/// A registered account.
///
/// The password hash is deliberately not part of this struct; it is only
/// ever read by the login path.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_seller: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The principal this user acts as.
    #[must_use]
    pub const fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            is_seller: self.is_seller,
            is_admin: self.is_admin,
        }
    }
}

/// The seven required address fields, as accepted on create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressFields {
    pub name: String,
    pub phone: String,
    pub pincode: String,
    pub state: String,
    pub city: String,
    pub house: String,
    pub area: String,
}

impl AddressFields {
    /// Names of fields that are empty, for "please provide" error messages.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let checks = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("pincode", &self.pincode),
            ("state", &self.state),
            ("city", &self.city),
            ("house", &self.house),
            ("area", &self.area),
        ];
        for (label, value) in checks {
            if value.trim().is_empty() {
                missing.push(label);
            }
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_reports_empty_and_blank_values() {
        let fields = AddressFields {
            name: "A. Buyer".to_owned(),
            phone: String::new(),
            pincode: "  ".to_owned(),
            state: "Karnataka".to_owned(),
            city: "Bengaluru".to_owned(),
            house: "12".to_owned(),
            area: "MG Road".to_owned(),
        };
        assert_eq!(fields.missing_fields(), vec!["phone", "pincode"]);
    }
}
