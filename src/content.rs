//! Per-locale content documents shared by pages and product series.

use cms_types::content::{content_from_db, ContentTranslation, Translations};
use rusqlite::params;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnerKind {
    Page,
    ProductSeries,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Page => "page",
            OwnerKind::ProductSeries => "product_series",
        }
    }
}

pub(crate) fn init_translation_table(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS content_translation (
            owner_kind TEXT NOT NULL,
            owner_id BLOB NOT NULL,
            locale TEXT NOT NULL,
            content TEXT NOT NULL,
            PRIMARY KEY (owner_kind, owner_id, locale)
        )",
        [],
    )?;
    Ok(())
}

pub(crate) fn load_translations(
    conn: &rusqlite::Connection,
    kind: OwnerKind,
    owner_id: Uuid,
) -> Result<Translations, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT locale, content FROM content_translation
         WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY rowid",
    )?;
    let translations = stmt
        .query_map(params![kind.as_str(), owner_id], |row| {
            Ok(ContentTranslation {
                locale: row.get(0)?,
                content: content_from_db(&row.get::<_, String>(1)?),
            })
        })?
        .collect::<Result<Translations, _>>()?;
    Ok(translations)
}

/// Replaces every stored translation of the owner with `translations`.
pub(crate) fn replace_translations(
    conn: &rusqlite::Connection,
    kind: OwnerKind,
    owner_id: Uuid,
    translations: &Translations,
) -> Result<(), rusqlite::Error> {
    delete_translations(conn, kind, owner_id)?;
    let mut stmt = conn.prepare(
        "INSERT INTO content_translation (owner_kind, owner_id, locale, content)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for t in translations.iter() {
        stmt.execute(params![
            kind.as_str(),
            owner_id,
            t.locale,
            t.content.to_string()
        ])?;
    }
    Ok(())
}

pub(crate) fn delete_translations(
    conn: &rusqlite::Connection,
    kind: OwnerKind,
    owner_id: Uuid,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "DELETE FROM content_translation WHERE owner_kind = ?1 AND owner_id = ?2",
        params![kind.as_str(), owner_id],
    )?;
    Ok(())
}
