// src/common/db_utils.rs

// Helpers to classify Postgres errors at the repository boundary, so that
// constraint violations become business errors instead of 500s.

/// True when `err` is a unique violation on the given constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// True when `err` is a check violation on the given constraint.
pub(crate) fn is_check_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_check_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

/// True when `err` is a foreign key violation on the given constraint.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_foreign_key_violation() && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_never_violations() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err, "products_tenant_sku_key"));
        assert!(!is_check_violation(&err, "products_qty_non_negative"));
        assert!(!is_foreign_key_violation(&err, "order_items_product_id_fkey"));
    }
}
