//! Category tree repository.
//!
//! Categories form a forest stored as an adjacency list, capped at three
//! levels (root, sub, sub-sub). Names are lower-cased on insert and unique
//! among siblings.

use serde::Serialize;
use sqlx::{PgPool, Row};

use threadcart_core::CategoryId;

use super::RepositoryError;

/// Maximum nesting depth (root = 1).
pub const MAX_DEPTH: i16 = 3;

/// A category with its nested subcategories, as returned to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub name: String,
    pub subcategories: Vec<CategoryNode>,
}

/// A raw category row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub depth: i16,
}

/// Assemble the nested forest from flat adjacency rows.
///
/// Roots and siblings keep their insertion (id) order. Rows pointing at a
/// missing parent are dropped; with cascade deletes in place they cannot
/// occur.
#[must_use]
pub fn build_forest(mut rows: Vec<CategoryRow>) -> Vec<CategoryNode> {
    rows.sort_by_key(|row| row.id);

    // Deepest-first so children are complete before their parent collects them.
    let mut pending: Vec<CategoryRow> = rows;
    let mut built: std::collections::HashMap<CategoryId, CategoryNode> =
        std::collections::HashMap::new();
    let mut children: std::collections::HashMap<CategoryId, Vec<CategoryId>> =
        std::collections::HashMap::new();

    for row in &pending {
        if let Some(parent) = row.parent_id {
            children.entry(parent).or_default().push(row.id);
        }
        built.insert(
            row.id,
            CategoryNode {
                id: row.id,
                name: row.name.clone(),
                subcategories: Vec::new(),
            },
        );
    }

    pending.sort_by(|a, b| b.depth.cmp(&a.depth));
    for row in &pending {
        if let Some(ids) = children.get(&row.id) {
            let subcategories: Vec<CategoryNode> = ids
                .iter()
                .filter_map(|id| built.remove(id))
                .collect();
            if let Some(node) = built.get_mut(&row.id) {
                node.subcategories = subcategories;
            }
        }
    }

    let mut roots: Vec<CategoryNode> = pending
        .iter()
        .filter(|row| row.parent_id.is_none())
        .filter_map(|row| built.remove(&row.id))
        .collect();
    roots.sort_by_key(|node| node.id);
    roots
}

/// Repository for category operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a chain of categories from a path of 1-3 names.
    ///
    /// Each name is lower-cased. Existing links in the chain are reused;
    /// missing ones are created. Returns the id of the deepest category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the path is empty or deeper
    /// than [`MAX_DEPTH`], `RepositoryError::Database` for query failures.
    pub async fn create_path(&self, names: &[String]) -> Result<CategoryId, RepositoryError> {
        if names.is_empty() {
            return Err(RepositoryError::Conflict(
                "please provide the category name".to_owned(),
            ));
        }
        if names.len() > MAX_DEPTH as usize {
            return Err(RepositoryError::Conflict(format!(
                "categories nest at most {MAX_DEPTH} levels"
            )));
        }

        let mut parent: Option<CategoryId> = None;
        for (index, raw) in names.iter().enumerate() {
            let name = raw.to_lowercase();
            let depth = i16::try_from(index + 1).unwrap_or(MAX_DEPTH);

            let existing = match parent {
                Some(parent_id) => {
                    sqlx::query("SELECT id FROM categories WHERE parent_id = $1 AND name = $2")
                        .bind(parent_id)
                        .bind(&name)
                        .fetch_optional(self.pool)
                        .await?
                }
                None => {
                    sqlx::query("SELECT id FROM categories WHERE parent_id IS NULL AND name = $1")
                        .bind(&name)
                        .fetch_optional(self.pool)
                        .await?
                }
            };

            let id = match existing {
                Some(row) => row.try_get("id")?,
                None => {
                    let row = sqlx::query(
                        r"
                        INSERT INTO categories (name, parent_id, depth)
                        VALUES ($1, $2, $3)
                        RETURNING id
                        ",
                    )
                    .bind(&name)
                    .bind(parent)
                    .bind(depth)
                    .fetch_one(self.pool)
                    .await?;
                    row.try_get("id")?
                }
            };
            parent = Some(id);
        }

        // The loop ran at least once, so parent is set.
        parent.ok_or(RepositoryError::NotFound)
    }

    /// Fetch a single category row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<CategoryRow>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, parent_id, depth FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row)
    }

    /// The full category forest, nested.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn forest(&self) -> Result<Vec<CategoryNode>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, parent_id, depth FROM categories ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(build_forest(rows))
    }

    /// Append a subcategory under `parent_id`.
    ///
    /// The caller has already verified the parent exists and has depth
    /// below [`MAX_DEPTH`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a sibling with the same name
    /// exists, `RepositoryError::Database` for other failures.
    pub async fn add_child(
        &self,
        parent_id: CategoryId,
        parent_depth: i16,
        name: &str,
    ) -> Result<CategoryId, RepositoryError> {
        let name = name.to_lowercase();
        let row = sqlx::query(
            r"
            INSERT INTO categories (name, parent_id, depth)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(&name)
        .bind(parent_id)
        .bind(parent_depth + 1)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!("subcategory {name:?} already exists"));
            }
            RepositoryError::Database(e)
        })?;
        Ok(row.try_get("id")?)
    }

    /// Rename a category (lower-cased).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn rename(&self, id: CategoryId, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name.to_lowercase())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a category and (via cascade) its whole subtree.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, name: &str, parent: Option<i32>, depth: i16) -> CategoryRow {
        CategoryRow {
            id: CategoryId::new(id),
            name: name.to_owned(),
            parent_id: parent.map(CategoryId::new),
            depth,
        }
    }

    #[test]
    fn build_forest_nests_three_levels() {
        let rows = vec![
            row(1, "men", None, 1),
            row(2, "shirts", Some(1), 2),
            row(3, "formal", Some(2), 3),
            row(4, "women", None, 1),
        ];
        let forest = build_forest(rows);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].name, "men");
        assert_eq!(forest[0].subcategories.len(), 1);
        assert_eq!(forest[0].subcategories[0].name, "shirts");
        assert_eq!(forest[0].subcategories[0].subcategories[0].name, "formal");
        assert!(forest[1].subcategories.is_empty());
    }

    #[test]
    fn build_forest_keeps_sibling_insertion_order() {
        let rows = vec![
            row(1, "men", None, 1),
            row(3, "trousers", Some(1), 2),
            row(2, "shirts", Some(1), 2),
        ];
        let forest = build_forest(rows);
        let names: Vec<&str> = forest[0]
            .subcategories
            .iter()
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(names, vec!["shirts", "trousers"]);
    }

    #[test]
    fn build_forest_of_empty_input_is_empty() {
        assert!(build_forest(Vec::new()).is_empty());
    }
}
