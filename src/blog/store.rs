use super::{BlogPost, FacetCount, Facets, FilterValues, NewPost, PostFilter};
use crate::db::DbError;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

const POST_COLUMNS: &str = "id, title, slug, date, modified_date, author, category, province, city, image, excerpt, content, next_post_slug, prev_post_slug";
const FACET_COLUMNS: [&str; 4] = ["category", "province", "city", "author"];

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<BlogPost> {
    Ok(BlogPost {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        date: row.get(3)?,
        modified_date: row.get(4)?,
        author: row.get(5)?,
        category: row.get(6)?,
        province: row.get(7)?,
        city: row.get(8)?,
        image: row.get(9)?,
        excerpt: row.get(10)?,
        content: row.get(11)?,
        next_post_slug: row.get(12)?,
        prev_post_slug: row.get(13)?,
    })
}

/// `WHERE` clause and positional parameters for a filter.
fn filter_clause(filter: &PostFilter) -> (String, Vec<Value>) {
    let mut clause = String::from(" WHERE 1=1");
    let mut values = Vec::new();

    if !filter.search.is_empty() {
        clause.push_str(" AND (title LIKE ? OR content LIKE ? OR excerpt LIKE ? OR author LIKE ?)");
        let term = format!("%{}%", filter.search);
        values.extend(std::iter::repeat_n(Value::Text(term), 4));
    }

    for (column, value) in [
        ("category", &filter.category),
        ("province", &filter.province),
        ("city", &filter.city),
        ("author", &filter.author),
    ] {
        if !value.is_empty() {
            clause.push_str(&format!(" AND {} = ?", column));
            values.push(Value::Text(value.clone()));
        }
    }

    (clause, values)
}

pub fn count_posts(conn: &Connection, filter: &PostFilter) -> Result<usize, DbError> {
    let (clause, values) = filter_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM blogs{}", clause);
    let count: i64 = conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

/// One page (1-based) of posts matching `filter`.
pub fn list_posts(
    conn: &Connection,
    filter: &PostFilter,
    page: usize,
    per_page: usize,
) -> Result<Vec<BlogPost>, DbError> {
    let (clause, mut values) = filter_clause(filter);
    let sql = format!(
        "SELECT {} FROM blogs{} ORDER BY {}, id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS,
        clause,
        filter.sort.order_by()
    );
    values.push(Value::Integer(per_page as i64));
    values.push(Value::Integer((page.saturating_sub(1) * per_page) as i64));

    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map(params_from_iter(values.iter()), post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn all_posts(conn: &Connection) -> Result<Vec<BlogPost>, DbError> {
    let sql = format!("SELECT {} FROM blogs ORDER BY date DESC, id DESC", POST_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let posts = stmt
        .query_map([], post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn get_post(conn: &Connection, id: i64) -> Result<Option<BlogPost>, DbError> {
    let sql = format!("SELECT {} FROM blogs WHERE id = ?1", POST_COLUMNS);
    Ok(conn.query_row(&sql, params![id], post_from_row).optional()?)
}

pub fn get_post_by_slug(conn: &Connection, slug: &str) -> Result<Option<BlogPost>, DbError> {
    let sql = format!("SELECT {} FROM blogs WHERE slug = ?1 ORDER BY id LIMIT 1", POST_COLUMNS);
    Ok(conn.query_row(&sql, params![slug], post_from_row).optional()?)
}

pub fn facets(conn: &Connection) -> Result<Facets, DbError> {
    let mut counts = FACET_COLUMNS.iter().map(|column| {
        let sql = format!(
            "SELECT {column}, COUNT(*) FROM blogs WHERE {column} IS NOT NULL GROUP BY {column} ORDER BY {column}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FacetCount {
                    name: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok::<_, DbError>(rows)
    });

    Ok(Facets {
        categories: counts.next().transpose()?.unwrap_or_default(),
        provinces: counts.next().transpose()?.unwrap_or_default(),
        cities: counts.next().transpose()?.unwrap_or_default(),
        authors: counts.next().transpose()?.unwrap_or_default(),
    })
}

pub fn filter_values(conn: &Connection) -> Result<FilterValues, DbError> {
    let distinct = |column: &str| -> Result<Vec<String>, DbError> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM blogs WHERE {column} IS NOT NULL ORDER BY {column}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(values)
    };

    Ok(FilterValues {
        categories: distinct("category")?,
        provinces: distinct("province")?,
        cities: distinct("city")?,
        authors: distinct("author")?,
    })
}

pub fn insert_post(conn: &Connection, post: &NewPost) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO blogs (title, slug, date, author, category, province, city, image, excerpt, content)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            post.title,
            post.slug,
            post.date,
            post.author,
            post.category,
            post.province,
            post.city,
            post.image,
            post.excerpt,
            post.content,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns false when no post has `id`. Stamps `modified_date`.
pub fn update_post(conn: &Connection, id: i64, post: &NewPost) -> Result<bool, DbError> {
    let modified = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let changed = conn.execute(
        "UPDATE blogs SET title = ?1, slug = ?2, date = ?3, author = ?4, category = ?5, province = ?6,
                city = ?7, image = ?8, excerpt = ?9, content = ?10, modified_date = ?11
         WHERE id = ?12",
        params![
            post.title,
            post.slug,
            post.date,
            post.author,
            post.category,
            post.province,
            post.city,
            post.image,
            post.excerpt,
            post.content,
            modified,
            id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_post(conn: &Connection, id: i64) -> Result<bool, DbError> {
    Ok(conn.execute("DELETE FROM blogs WHERE id = ?1", params![id])? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::SortOrder;
    use crate::db::test_connection;

    fn new_post(title: &str, date: &str, category: &str, city: Option<&str>) -> NewPost {
        NewPost {
            title: title.to_string(),
            slug: Some(title.to_lowercase().replace(' ', "-")),
            date: date.to_string(),
            author: "Gio".to_string(),
            category: category.to_string(),
            province: None,
            city: city.map(str::to_string),
            image: None,
            excerpt: format!("About {}", title),
            content: format!("<p>{} content</p>", title),
        }
    }

    fn seeded() -> Connection {
        let conn = test_connection();
        insert_post(&conn, &new_post("Roma Antica", "2024-01-05", "History", Some("Roma")))
            .unwrap();
        insert_post(&conn, &new_post("Pizza Napoletana", "2024-02-10", "Food", Some("Napoli")))
            .unwrap();
        insert_post(&conn, &new_post("Gelato Tour", "2024-03-15", "Food", None)).unwrap();
        conn
    }

    #[test]
    fn test_filters_are_anded() {
        let conn = seeded();
        let filter = PostFilter {
            category: "Food".into(),
            city: "Napoli".into(),
            ..Default::default()
        };
        assert_eq!(count_posts(&conn, &filter).unwrap(), 1);
        let posts = list_posts(&conn, &filter, 1, 10).unwrap();
        assert_eq!(posts[0].title, "Pizza Napoletana");
    }

    #[test]
    fn test_search_matches_content_and_excerpt() {
        let conn = seeded();
        let filter = PostFilter {
            search: "gelato".into(),
            ..Default::default()
        };
        assert_eq!(count_posts(&conn, &filter).unwrap(), 1);

        let filter = PostFilter {
            search: "content".into(),
            ..Default::default()
        };
        assert_eq!(count_posts(&conn, &filter).unwrap(), 3);
    }

    #[test]
    fn test_sorting_and_paging() {
        let conn = seeded();
        let mut filter = PostFilter::default();
        let newest = list_posts(&conn, &filter, 1, 2).unwrap();
        assert_eq!(newest.len(), 2);
        assert_eq!(newest[0].title, "Gelato Tour");

        let second_page = list_posts(&conn, &filter, 2, 2).unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].title, "Roma Antica");

        filter.sort = SortOrder::TitleAsc;
        let by_title = list_posts(&conn, &filter, 1, 10).unwrap();
        assert_eq!(by_title[0].title, "Gelato Tour");
        assert_eq!(by_title[2].title, "Roma Antica");
    }

    #[test]
    fn test_facets_skip_nulls() {
        let conn = seeded();
        let facets = facets(&conn).unwrap();
        assert_eq!(
            facets.categories,
            vec![
                FacetCount { name: "Food".into(), count: 2 },
                FacetCount { name: "History".into(), count: 1 },
            ]
        );
        assert_eq!(facets.cities.len(), 2);
        assert!(facets.provinces.is_empty());

        let values = filter_values(&conn).unwrap();
        assert_eq!(values.cities, vec!["Napoli", "Roma"]);
        assert_eq!(values.authors, vec!["Gio"]);
    }

    #[test]
    fn test_crud_round_trip() {
        let conn = seeded();
        let id = insert_post(&conn, &new_post("Venezia", "2024-04-01", "Travel", None)).unwrap();
        assert_eq!(get_post_by_slug(&conn, "venezia").unwrap().unwrap().id, id);

        let mut edited = new_post("Venezia", "2024-04-01", "Travel", Some("Venezia"));
        edited.excerpt = "Canals".into();
        assert!(update_post(&conn, id, &edited).unwrap());
        let post = get_post(&conn, id).unwrap().unwrap();
        assert_eq!(post.excerpt.as_deref(), Some("Canals"));
        assert!(post.modified_date.is_some());

        assert!(delete_post(&conn, id).unwrap());
        assert!(get_post(&conn, id).unwrap().is_none());
        assert!(!delete_post(&conn, id).unwrap());
        assert!(!update_post(&conn, id, &edited).unwrap());
    }
}
