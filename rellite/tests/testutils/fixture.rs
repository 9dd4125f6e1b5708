//! Test fixture for catalog integration tests
//!
//! Builds an in-memory catalog and offers shorthand constructors for the
//! object shapes the dependency tests need. All helpers go through the
//! public Catalog API.

use rellite::catalog::bootstrap::PUBLIC_SCHEMA_ID;
use rellite::{
    Catalog, CatalogConfig, CatalogRecord, CatalogTxn, ClusterRole, ColumnMeta, DependencyType,
    ObjectAddress, RelationKind,
};

/// Catalog fixture with an isolated in-memory instance
pub struct CatalogFixture {
    pub catalog: Catalog,
}

impl CatalogFixture {
    pub fn new() -> Self {
        Self {
            catalog: Catalog::in_memory().expect("open in-memory catalog"),
        }
    }

    /// Fixture configured as a distributed executor node
    pub fn executor() -> Self {
        let config = CatalogConfig {
            role: ClusterRole::Executor,
            ..CatalogConfig::default()
        };
        Self {
            catalog: Catalog::in_memory_with_config(config).expect("open in-memory catalog"),
        }
    }

    pub fn begin(&self) -> CatalogTxn {
        self.catalog.begin()
    }

    fn relation(
        &self,
        txn: &mut CatalogTxn,
        name: &str,
        kind: RelationKind,
        columns: &[&str],
    ) -> ObjectAddress {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnMeta::new(i as i32 + 1, *name))
            .collect();
        self.catalog
            .define_object(
                txn,
                CatalogRecord::Relation {
                    name: name.to_string(),
                    namespace: PUBLIC_SCHEMA_ID,
                    kind,
                    columns,
                },
            )
            .expect("define relation")
    }

    pub fn table(&self, txn: &mut CatalogTxn, name: &str, columns: &[&str]) -> ObjectAddress {
        self.relation(txn, name, RelationKind::Table, columns)
    }

    pub fn view(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.relation(txn, name, RelationKind::View, &[])
    }

    pub fn index(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.relation(txn, name, RelationKind::Index, &[])
    }

    pub fn sequence(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.relation(txn, name, RelationKind::Sequence, &[])
    }

    /// A composite type's backing relation
    pub fn composite_relation(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.relation(txn, name, RelationKind::CompositeType, &[])
    }

    pub fn function(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.catalog
            .define_object(
                txn,
                CatalogRecord::Proc {
                    name: name.to_string(),
                },
            )
            .expect("define function")
    }

    pub fn operator(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.catalog
            .define_object(
                txn,
                CatalogRecord::Operator {
                    name: name.to_string(),
                },
            )
            .expect("define operator")
    }

    pub fn composite_type(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.catalog
            .define_object(
                txn,
                CatalogRecord::Type {
                    name: name.to_string(),
                },
            )
            .expect("define type")
    }

    pub fn schema(&self, txn: &mut CatalogTxn, name: &str) -> ObjectAddress {
        self.catalog
            .define_object(
                txn,
                CatalogRecord::Schema {
                    name: name.to_string(),
                },
            )
            .expect("define schema")
    }

    /// A column default; the AUTO edge to its column is recorded by the
    /// caller
    pub fn attr_default(
        &self,
        txn: &mut CatalogTxn,
        table: &ObjectAddress,
        attno: i32,
    ) -> ObjectAddress {
        self.catalog
            .define_object(
                txn,
                CatalogRecord::AttrDefault {
                    relation: table.object_id,
                    column: attno,
                },
            )
            .expect("define default")
    }

    /// Record a single dependency edge
    pub fn depend(
        &self,
        txn: &mut CatalogTxn,
        dependent: &ObjectAddress,
        referenced: &ObjectAddress,
        kind: DependencyType,
    ) {
        self.catalog
            .record_dependency_on(txn, dependent, &[*referenced], kind)
            .expect("record dependency");
    }

    pub fn exists(&self, addr: &ObjectAddress) -> bool {
        self.catalog.object_exists(addr).expect("existence check")
    }
}
