//! Schema registry
//!
//! Maps entity types to their table definitions. Built once with
//! [`RegistryBuilder`], then frozen into a [`Registry`] that is shared as
//! `Arc<Registry>` with the initializer and anything else that reads it.

use sqlx::postgres::PgRow;
use sqlx::FromRow;

use crate::error::{DbError, Result};

/// Storage schema for one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    /// Table name (unquoted)
    pub name: &'static str,
    /// `CREATE TABLE IF NOT EXISTS ...` statement
    pub create: &'static str,
    /// `CREATE INDEX IF NOT EXISTS ...` statements
    pub indexes: &'static [&'static str],
    /// Tables this one holds foreign keys into
    pub references: &'static [&'static str],
}

impl TableDef {
    /// DDL statements in execution order.
    pub fn statements(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.create).chain(self.indexes.iter().copied())
    }
}

/// A persisted row type with a registered table.
///
/// Every entity has a `BIGINT` primary key named `id`.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;

    fn table_def() -> TableDef;
}

/// Collects table definitions before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tables: Vec<TableDef>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity.
    ///
    /// Rejects duplicate table names and references to tables that are not
    /// registered yet, so registration order is also creation order.
    pub fn register<E: Entity>(mut self) -> Result<Self> {
        let table = E::table_def();

        if table.name != E::TABLE {
            return Err(DbError::Registry(format!(
                "entity table '{}' does not match its definition '{}'",
                E::TABLE,
                table.name
            )));
        }

        if self.tables.iter().any(|t| t.name == table.name) {
            return Err(DbError::Registry(format!(
                "table '{}' registered twice",
                table.name
            )));
        }

        for parent in table.references {
            let known = *parent == table.name || self.tables.iter().any(|t| t.name == *parent);
            if !known {
                return Err(DbError::Registry(format!(
                    "table '{}' references unregistered table '{}'",
                    table.name, parent
                )));
            }
        }

        self.tables.push(table);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            tables: self.tables,
        }
    }
}

/// Frozen entity-to-table mapping
#[derive(Debug)]
pub struct Registry {
    tables: Vec<TableDef>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Tables in creation order (parents before children).
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn contains<E: Entity>(&self) -> bool {
        self.table(E::TABLE).is_some()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(sqlx::FromRow)]
    struct Parent {
        #[allow(dead_code)]
        id: i64,
    }

    impl Entity for Parent {
        const TABLE: &'static str = "parent";

        fn table_def() -> TableDef {
            TableDef {
                name: "parent",
                create: "CREATE TABLE IF NOT EXISTS parent (id BIGSERIAL PRIMARY KEY)",
                indexes: &[],
                references: &[],
            }
        }
    }

    #[derive(sqlx::FromRow)]
    struct Child {
        #[allow(dead_code)]
        id: i64,
    }

    impl Entity for Child {
        const TABLE: &'static str = "child";

        fn table_def() -> TableDef {
            TableDef {
                name: "child",
                create: "CREATE TABLE IF NOT EXISTS child (id BIGSERIAL PRIMARY KEY, parent_id BIGINT REFERENCES parent(id))",
                indexes: &["CREATE INDEX IF NOT EXISTS idx_child_parent ON child(parent_id)"],
                references: &["parent"],
            }
        }
    }

    #[test]
    fn registers_in_order() {
        let registry = Registry::builder()
            .register::<Parent>()
            .and_then(|b| b.register::<Child>())
            .unwrap()
            .build();

        let names: Vec<_> = registry.tables().iter().map(|t| t.name).collect();
        assert_eq!(names, ["parent", "child"]);
        assert!(registry.contains::<Child>());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn rejects_duplicates() {
        let err = Registry::builder()
            .register::<Parent>()
            .and_then(|b| b.register::<Parent>())
            .unwrap_err();
        assert!(matches!(err, DbError::Registry(_)));
    }

    #[test]
    fn rejects_unregistered_parent() {
        let err = Registry::builder().register::<Child>().unwrap_err();
        assert!(err.to_string().contains("unregistered table 'parent'"));
    }

    #[test]
    fn statements_put_create_first() {
        let statements: Vec<_> = Child::table_def().statements().collect();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE"));
        assert!(statements[1].starts_with("CREATE INDEX"));
    }
}
