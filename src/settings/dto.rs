use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub store_name: String,
    pub store_email: String,
    pub store_phone: String,
    pub store_address: String,
    pub currency_symbol: String,
    pub tax_rate: f64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            store_name: "My Store".into(),
            store_email: "store@example.com".into(),
            store_phone: "+1234567890".into(),
            store_address: "Store Address".into(),
            currency_symbol: "$".into(),
            tax_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSettings {
    pub enable_cash_on_delivery: bool,
    pub enable_bank_transfer: bool,
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            enable_cash_on_delivery: true,
            enable_bank_transfer: true,
            bank_name: String::new(),
            account_number: String::new(),
            account_name: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub order_confirmation: bool,
    pub order_status_update: bool,
    pub low_stock_alert: bool,
    pub new_customer_registration: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            order_confirmation: true,
            order_status_update: true,
            low_stock_alert: true,
            new_customer_registration: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreSettings {
    pub general: GeneralSettings,
    pub payment: PaymentSettings,
    pub notification: NotificationSettings,
}

/// Sections omitted from the payload keep their stored value.
#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    pub general: Option<GeneralSettings>,
    pub payment: Option<PaymentSettings>,
    pub notification: Option<NotificationSettings>,
}

#[cfg(test)]
mod default_tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_store() {
        let settings = StoreSettings::default();
        assert_eq!(settings.general.store_name, "My Store");
        assert_eq!(settings.general.currency_symbol, "$");
        assert_eq!(settings.general.tax_rate, 0.0);
        assert!(settings.payment.enable_cash_on_delivery);
        assert!(settings.payment.bank_name.is_empty());
        assert!(settings.notification.low_stock_alert);
    }
}
