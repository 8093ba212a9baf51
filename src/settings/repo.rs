use sqlx::{types::Json, PgPool};

use crate::settings::dto::{
    GeneralSettings, NotificationSettings, PaymentSettings, StoreSettings,
};

#[derive(sqlx::FromRow)]
struct SettingsRow {
    general: Json<GeneralSettings>,
    payment: Json<PaymentSettings>,
    notification: Json<NotificationSettings>,
}

impl From<SettingsRow> for StoreSettings {
    fn from(row: SettingsRow) -> Self {
        StoreSettings {
            general: row.general.0,
            payment: row.payment.0,
            notification: row.notification.0,
        }
    }
}

/// The settings table holds a single row; the first read seeds it with the
/// defaults.
pub async fn get_or_init(db: &PgPool) -> Result<StoreSettings, sqlx::Error> {
    if let Some(row) = sqlx::query_as::<_, SettingsRow>(
        "SELECT general, payment, notification FROM settings WHERE id",
    )
    .fetch_optional(db)
    .await?
    {
        return Ok(row.into());
    }

    let defaults = StoreSettings::default();
    let row = sqlx::query_as::<_, SettingsRow>(
        "INSERT INTO settings (id, general, payment, notification) \
         VALUES (TRUE, $1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET general = settings.general \
         RETURNING general, payment, notification",
    )
    .bind(Json(&defaults.general))
    .bind(Json(&defaults.payment))
    .bind(Json(&defaults.notification))
    .fetch_one(db)
    .await?;
    Ok(row.into())
}

pub async fn update(db: &PgPool, settings: &StoreSettings) -> Result<StoreSettings, sqlx::Error> {
    let row = sqlx::query_as::<_, SettingsRow>(
        "UPDATE settings SET general = $1, payment = $2, notification = $3, updated_at = now() \
         WHERE id \
         RETURNING general, payment, notification",
    )
    .bind(Json(&settings.general))
    .bind(Json(&settings.payment))
    .bind(Json(&settings.notification))
    .fetch_one(db)
    .await?;
    Ok(row.into())
}
