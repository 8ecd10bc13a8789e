//! Product category queries and slug generation.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::Result;
use crate::rows::{CategoryRow, row_to_category};

/// Builds a URL slug from a category name: lowercase alphanumerics with
/// single hyphens between words.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Inserts a new category, deriving its slug from the name.
pub async fn insert(
    conn: &mut PgConnection,
    name: &str,
    description: Option<&str>,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name, slug, description) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(name)
        .bind(slugify(name))
        .bind(description)
        .execute(&mut *conn)
        .await?;

    Ok(id)
}

/// Fetches a category by id.
pub async fn get(conn: &mut PgConnection, id: Uuid) -> Result<Option<CategoryRow>> {
    let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(row_to_category).transpose()
}

/// Lists all categories, newest names last.
pub async fn list(conn: &mut PgConnection) -> Result<Vec<CategoryRow>> {
    let rows = sqlx::query("SELECT * FROM categories ORDER BY name ASC")
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(row_to_category).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Science Fiction"), "science-fiction");
        assert_eq!(slugify("History"), "history");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Kids & Young Adults!"), "kids-young-adults");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
    }
}
