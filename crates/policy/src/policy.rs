//! Authorization rules and policy configuration.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Identity, Pricing, Result, Role};

/// Something an actor may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewCatalog,
    PlaceOrder,
    CancelOrder,
    ManagePaymentMethods,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::ViewCatalog => "view_catalog",
            Action::PlaceOrder => "place_order",
            Action::CancelOrder => "cancel_order",
            Action::ManagePaymentMethods => "manage_payment_methods",
        })
    }
}

/// Result of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    fn deny(reason: &str) -> Self {
        Decision::Deny {
            reason: reason.to_string(),
        }
    }
}

/// Decide whether `identity` may perform `action`.
///
/// Every arm matches on the full set of roles, so a new role has to be
/// placed explicitly for each action.
pub fn authorize(identity: &Identity, action: Action) -> Decision {
    match action {
        Action::ViewCatalog => match identity.role() {
            Role::Admin | Role::Manager | Role::Member => Decision::Allow,
        },
        Action::PlaceOrder => match identity.role() {
            Role::Admin | Role::Manager => Decision::Allow,
            Role::Member => Decision::deny("payment not authorized for role"),
        },
        Action::CancelOrder => match identity.role() {
            Role::Admin | Role::Manager => Decision::Allow,
            Role::Member => Decision::deny("cancellation not authorized for role"),
        },
        Action::ManagePaymentMethods => match identity.role() {
            Role::Admin => Decision::Allow,
            Role::Manager | Role::Member => {
                Decision::deny("payment settings restricted to admins")
            }
        },
    }
}

/// Whether `identity` may pay for an order.
pub fn can_place_order(identity: &Identity) -> bool {
    authorize(identity, Action::PlaceOrder).is_allowed()
}

/// Whether `identity` may cancel an order.
pub fn can_cancel_order(identity: &Identity) -> bool {
    authorize(identity, Action::CancelOrder).is_allowed()
}

/// A payment gateway shown on the admin settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub active: bool,
}

/// Policy configuration loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Delivery fee and tax.
    #[serde(default)]
    pub pricing: Pricing,

    /// Payment gateways configured for the storefront.
    #[serde(default = "default_payment_methods")]
    pub payment_methods: Vec<PaymentMethod>,
}

fn default_payment_methods() -> Vec<PaymentMethod> {
    vec![
        PaymentMethod {
            name: "Stripe Connect".to_string(),
            kind: "Credit/Debit Cards".to_string(),
            active: true,
        },
        PaymentMethod {
            name: "PayPal".to_string(),
            kind: "Wallet".to_string(),
            active: false,
        },
    ]
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            pricing: Pricing::default(),
            payment_methods: default_payment_methods(),
        }
    }
}

impl Policy {
    /// Load policy from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse policy from TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let policy: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        self.pricing.validate()
    }
}
