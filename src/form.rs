use crate::datetime_from_db;
use async_trait::async_trait;
use cms_types::form::{
    FormConfig, FormConfigRepository, FormSubmission, FormSubmissionRepository, NewFormSubmission,
};
use cms_types::locale::LocalizedText;
use rusqlite::params;
use tokio_rusqlite::Connection;

pub struct SqliteFormConfigRepository {
    conn: Connection,
}

impl SqliteFormConfigRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS form_config (
                    id BLOB PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    title TEXT NOT NULL,
                    submit_label TEXT,
                    success_message TEXT,
                    fields TEXT
                )",
                [],
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl FormConfigRepository for SqliteFormConfigRepository {
    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<FormConfig>> {
        let name = name.to_string();
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, title, submit_label, success_message, fields
                     FROM form_config WHERE name = ?1",
                )?;
                let config = stmt
                    .query_map([name], |row| {
                        Ok(FormConfig {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            title: LocalizedText::from_db(row.get(2)?),
                            submit_label: LocalizedText::from_db(row.get(3)?),
                            success_message: LocalizedText::from_db(row.get(4)?),
                            fields: FormConfig::fields_from_db(
                                row.get::<_, Option<String>>(5)?.as_deref(),
                            ),
                        })
                    })?
                    .next()
                    .transpose()?;
                Ok(config)
            })
            .await?)
    }

    async fn save(&self, config: FormConfig) -> anyhow::Result<()> {
        let fields = serde_json::to_string(&config.fields)?;
        Ok(self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO form_config (id, name, title, submit_label, success_message, fields)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(id) DO UPDATE SET name=?2, title=?3, submit_label=?4,
                        success_message=?5, fields=?6",
                    params![
                        config.id,
                        config.name,
                        config.title.to_db(),
                        config.submit_label.to_db(),
                        config.success_message.to_db(),
                        fields,
                    ],
                )?;
                Ok(())
            })
            .await?)
    }
}

pub struct SqliteFormSubmissionRepository {
    conn: Connection,
}

impl SqliteFormSubmissionRepository {
    pub async fn init(conn: Connection) -> Result<Self, tokio_rusqlite::Error> {
        conn.call(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS form_submission (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    form_id BLOB,
                    form_name TEXT NOT NULL,
                    data TEXT NOT NULL,
                    locale TEXT NOT NULL,
                    auto_submitted INTEGER NOT NULL DEFAULT 0,
                    created_at INTEGER NOT NULL
                )",
                [],
            )?;
            Ok(())
        })
        .await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl FormSubmissionRepository for SqliteFormSubmissionRepository {
    async fn add(&self, item: NewFormSubmission) -> anyhow::Result<FormSubmission> {
        let data = item.data.to_string();
        let created_at = item.created_at.unix_timestamp().max(0);
        let params_item = item.clone();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO form_submission (form_id, form_name, data, locale, auto_submitted, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        params_item.form_id,
                        params_item.form_name,
                        data,
                        params_item.locale,
                        params_item.auto_submitted,
                        created_at,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(FormSubmission {
            id,
            form_id: item.form_id,
            form_name: item.form_name,
            data: item.data,
            locale: item.locale,
            auto_submitted: item.auto_submitted,
            created_at: datetime_from_db(created_at),
        })
    }

    async fn list_by_form(&self, form_name: &str) -> anyhow::Result<Vec<FormSubmission>> {
        let form_name = form_name.to_string();
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, form_id, form_name, data, locale, auto_submitted, created_at
                     FROM form_submission WHERE form_name = ?1 ORDER BY id",
                )?;
                let items = stmt
                    .query_map([form_name], |row| {
                        Ok(FormSubmission {
                            id: row.get(0)?,
                            form_id: row.get(1)?,
                            form_name: row.get(2)?,
                            data: cms_types::content::content_from_db(&row.get::<_, String>(3)?),
                            locale: row.get(4)?,
                            auto_submitted: row.get(5)?,
                            created_at: datetime_from_db(row.get(6)?),
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?)
    }
}
