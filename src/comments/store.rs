use super::{Comment, NewComment};
use crate::db::DbError;
use rusqlite::{Connection, params};

/// Newest first, ties broken by id.
pub fn list_comments(conn: &Connection, image_name: &str) -> Result<Vec<Comment>, DbError> {
    let mut stmt = conn.prepare(
        "SELECT imageName, author, comment, created FROM comments
         WHERE imageName = ?1 ORDER BY created DESC, id DESC",
    )?;
    let comments = stmt
        .query_map(params![image_name], |row| {
            Ok(Comment {
                image_name: row.get(0)?,
                author: row.get(1)?,
                comment: row.get(2)?,
                created: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn insert_comment(conn: &Connection, comment: &NewComment) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO comments (imageName, author, comment) VALUES (?1, ?2, ?3)",
        params![comment.image_name, comment.author, comment.comment],
    )?;
    Ok(conn.last_insert_rowid())
}
