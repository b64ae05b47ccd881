use super::{Contact, ContactStatus};
use crate::db::DbError;
use rusqlite::{Connection, OptionalExtension, params};

pub fn insert_contact(
    conn: &Connection,
    contact: &Contact,
    ip_address: &str,
    user_agent: &str,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO contacts
         (firstName, lastName, email, phone, subject, company, image, message, newsLetter, ipAddress, userAgent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            contact.first_name,
            contact.last_name,
            contact.email,
            contact.phone,
            contact.subject,
            contact.company,
            contact.image,
            contact.message,
            contact.news_letter,
            ip_address,
            user_agent,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn contact_status(conn: &Connection, id: i64) -> Result<Option<ContactStatus>, DbError> {
    let status = conn
        .query_row(
            "SELECT created_at, subject FROM contacts WHERE id = ?1",
            params![id],
            |row| {
                Ok(ContactStatus {
                    submitted_at: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    subject: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(status)
}
