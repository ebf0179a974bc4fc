// src/common/i18n.rs

use std::collections::HashMap;

/// Locales that have a full message catalog.
pub const SUPPORTED_LOCALES: &[&str] = &["en", "id"];
pub const DEFAULT_LOCALE: &str = "en";

// (code, template). Placeholders use the `{name}` form.
const EN_MESSAGES: &[(&str, &str)] = &[
    ("validation_error", "One or more fields are invalid."),
    ("invalid_credentials", "Invalid username or password."),
    ("invalid_token", "Authentication token is invalid or missing."),
    ("user_not_found", "User not found."),
    ("username_already_exists", "Username '{username}' is already in use."),
    ("access_denied", "You do not have access to this resource."),
    ("quota_exceeded", "You can create at most {max} tenant(s)."),
    ("not_found", "The requested {entity} was not found."),
    ("product_not_found", "Product {product_id} does not exist in this tenant."),
    ("insufficient_stock", "Not enough stock for {product}. Available: {available}, requested: {requested}."),
    ("invalid_quantity", "Quantities must be greater than zero."),
    ("empty_order", "An order must contain at least one item."),
    ("empty_cost_record", "A cost record must contain at least one ingredient."),
    ("duplicate_period", "A cost record for period {period} already exists for this tenant."),
    ("invalid_period", "Period '{period}' is invalid. Expected format: YYYY-MM."),
    ("not_eligible_crew", "The selected user is not a crew member registered under your account."),
    ("already_granted", "This crew member already has access to the tenant."),
    ("sku_already_exists", "SKU '{sku}' is already used in this tenant."),
    ("category_name_already_exists", "Category '{name}' already exists in this tenant."),
    ("product_has_orders", "This product appears in recorded orders and cannot be deleted. Deactivate it instead."),
    ("internal_error", "An unexpected error occurred."),
];

const ID_MESSAGES: &[(&str, &str)] = &[
    ("validation_error", "Satu atau lebih isian tidak valid."),
    ("invalid_credentials", "Username atau password salah."),
    ("invalid_token", "Token autentikasi tidak valid atau tidak ada."),
    ("user_not_found", "User tidak ditemukan."),
    ("username_already_exists", "Username '{username}' sudah digunakan."),
    ("access_denied", "Anda tidak memiliki akses ke data ini."),
    ("quota_exceeded", "Maksimal {max} tenant yang dapat dibuat."),
    ("not_found", "Data {entity} tidak ditemukan."),
    ("product_not_found", "Produk {product_id} tidak ada di tenant ini."),
    ("insufficient_stock", "Stok {product} tidak mencukupi. Stok tersedia: {available}, diminta: {requested}."),
    ("invalid_quantity", "Jumlah harus lebih dari nol."),
    ("empty_order", "Order harus memiliki minimal satu item."),
    ("empty_cost_record", "HPP harus memiliki minimal satu bahan."),
    ("duplicate_period", "HPP untuk periode {period} sudah ada di tenant ini."),
    ("invalid_period", "Periode '{period}' tidak valid. Format: YYYY-MM."),
    ("not_eligible_crew", "User yang dipilih bukan crew yang terdaftar di bawah akun Anda."),
    ("already_granted", "Crew ini sudah memiliki akses ke tenant tersebut."),
    ("sku_already_exists", "SKU '{sku}' sudah digunakan di tenant ini."),
    ("category_name_already_exists", "Kategori '{name}' sudah ada di tenant ini."),
    ("product_has_orders", "Produk ini sudah tercatat di order dan tidak dapat dihapus. Nonaktifkan produk sebagai gantinya."),
    ("internal_error", "Terjadi kesalahan yang tidak terduga."),
];

/// Message catalog used to render `AppError`s for the caller's locale.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("en", EN_MESSAGES.iter().copied().collect());
        catalogs.insert("id", ID_MESSAGES.iter().copied().collect());
        Self { catalogs }
    }

    pub fn supports(&self, locale: &str) -> bool {
        self.catalogs.contains_key(locale)
    }

    /// Renders `code` for `locale`, falling back to English and then to the raw code.
    pub fn translate(&self, locale: &str, code: &str, args: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(locale)
            .and_then(|catalog| catalog.get(code))
            .or_else(|| {
                self.catalogs
                    .get(DEFAULT_LOCALE)
                    .and_then(|catalog| catalog.get(code))
            });

        let Some(template) = template else {
            return code.to_string();
        };

        args.iter().fold(template.to_string(), |message, (name, value)| {
            message.replace(&format!("{{{name}}}"), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_locale_covers_the_english_catalog() {
        let store = I18nStore::new();
        for (code, _) in EN_MESSAGES {
            for locale in SUPPORTED_LOCALES {
                assert!(
                    store.catalogs[locale].contains_key(code),
                    "{locale} is missing {code}"
                );
            }
        }
    }

    #[test]
    fn placeholders_are_filled() {
        let store = I18nStore::new();
        let msg = store.translate("id", "quota_exceeded", &[("max", "1".to_string())]);
        assert_eq!(msg, "Maksimal 1 tenant yang dapat dibuat.");
    }

    #[test]
    fn unknown_locale_falls_back_to_english() {
        let store = I18nStore::new();
        let msg = store.translate("fr", "empty_order", &[]);
        assert_eq!(msg, "An order must contain at least one item.");
        assert_eq!(store.translate("en", "no_such_code", &[]), "no_such_code");
    }
}
