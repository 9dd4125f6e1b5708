//! Cascaded deletion tests: RESTRICT vs CASCADE, AUTO cascades, and the
//! order-independence guarantee of the implicit-closure pre-scan

mod testutils;

use rellite::{DependencyType, DropBehavior, ObjectAddress};
use testutils::CatalogFixture;

#[test]
fn test_restrict_refuses_drop_with_dependent_view() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id"]);
    let view = fx.view(&mut txn, "recent_orders");
    fx.depend(&mut txn, &view, &table, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    let err = fx
        .catalog
        .perform_deletion(&mut txn, &table, DropBehavior::Restrict)
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "cannot drop table orders because other objects depend on it"
    );
    assert_eq!(
        err.hint(),
        Some("Use DROP ... CASCADE to drop the dependent objects too.")
    );
    // The individual violation was reported before the failure
    assert!(txn
        .notices()
        .iter()
        .any(|n| n == "view recent_orders depends on table orders"));

    // Deletions are performed even under RESTRICT; aborting the
    // transaction is what nullifies them
    txn.abort().unwrap();
    assert!(fx.exists(&table));
    assert!(fx.exists(&view));
}

#[test]
fn test_restrict_reports_every_violation() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id"]);
    let v1 = fx.view(&mut txn, "v_open");
    let v2 = fx.view(&mut txn, "v_closed");
    fx.depend(&mut txn, &v1, &table, DependencyType::Normal);
    fx.depend(&mut txn, &v2, &table, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &table, DropBehavior::Restrict)
        .unwrap_err();

    let notices = txn.notices();
    assert!(notices.iter().any(|n| n == "view v_open depends on table orders"));
    assert!(notices
        .iter()
        .any(|n| n == "view v_closed depends on table orders"));
    txn.abort().unwrap();
}

#[test]
fn test_cascade_drops_dependent_view_with_notice() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id"]);
    let view = fx.view(&mut txn, "recent_orders");
    fx.depend(&mut txn, &view, &table, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &table, DropBehavior::Cascade)
        .unwrap();
    assert!(txn
        .notices()
        .iter()
        .any(|n| n == "drop cascades to view recent_orders"));
    txn.commit().unwrap();

    assert!(!fx.exists(&table));
    assert!(!fx.exists(&view));
}

#[test]
fn test_no_edges_remain_after_cascade() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id"]);
    let view = fx.view(&mut txn, "recent_orders");
    let func = fx.function(&mut txn, "order_total");
    fx.depend(&mut txn, &view, &table, DependencyType::Normal);
    fx.depend(&mut txn, &view, &func, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &table, DropBehavior::Cascade)
        .unwrap();
    txn.commit().unwrap();

    let mut txn = fx.begin();
    assert!(fx.catalog.list_dependents(&mut txn, &table).unwrap().is_empty());
    assert!(fx.catalog.list_dependents(&mut txn, &func).unwrap().is_empty());
    assert!(fx
        .catalog
        .list_dependencies(&mut txn, &view)
        .unwrap()
        .is_empty());
    // The function was not part of the closure and survives
    assert!(fx.exists(&func));
    txn.commit().unwrap();
}

#[test]
fn test_auto_dependency_cascades_silently_under_restrict() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id", "total"]);
    let column = ObjectAddress::new(table.class_id, table.object_id, 2);
    let default = fx.attr_default(&mut txn, &table, 2);
    fx.depend(&mut txn, &default, &column, DependencyType::Auto);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &table, DropBehavior::Restrict)
        .unwrap();
    // The default went with the table without a single notice
    assert!(txn.notices().is_empty());
    txn.commit().unwrap();

    assert!(!fx.exists(&table));
    assert!(!fx.exists(&default));
}

#[test]
fn test_column_drop_cascades_to_default_and_keeps_table() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id", "total"]);
    let column = ObjectAddress::new(table.class_id, table.object_id, 2);
    let default = fx.attr_default(&mut txn, &table, 2);
    fx.depend(&mut txn, &default, &column, DependencyType::Auto);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &column, DropBehavior::Restrict)
        .unwrap();
    txn.commit().unwrap();

    assert!(fx.exists(&table));
    assert!(!fx.exists(&default));
    // The column itself is gone
    assert!(fx.catalog.get_object_description(&column).is_err());
    assert_eq!(
        fx.catalog.get_object_description(&table).unwrap(),
        "table orders"
    );
}

#[test]
fn test_outcome_is_independent_of_edge_visit_order() {
    // B and C are both auto-deletable from A, but B also has a NORMAL
    // dependency on C. Whichever of B or C the incoming scan visits
    // first, the B->C link must not count as a RESTRICT violation.
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let a = fx.table(&mut txn, "a", &[]);
    let b = fx.view(&mut txn, "b");
    let c = fx.view(&mut txn, "c");
    fx.depend(&mut txn, &b, &a, DependencyType::Auto);
    fx.depend(&mut txn, &c, &a, DependencyType::Auto);
    fx.depend(&mut txn, &b, &c, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &a, DropBehavior::Restrict)
        .unwrap();
    assert!(txn.notices().is_empty());
    txn.commit().unwrap();

    assert!(!fx.exists(&a));
    assert!(!fx.exists(&b));
    assert!(!fx.exists(&c));
}

#[test]
fn test_cycle_terminates_under_single_drop() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let f1 = fx.function(&mut txn, "f1");
    let f2 = fx.function(&mut txn, "f2");
    fx.depend(&mut txn, &f1, &f2, DependencyType::Normal);
    fx.depend(&mut txn, &f2, &f1, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &f1, DropBehavior::Cascade)
        .unwrap();
    txn.commit().unwrap();

    assert!(!fx.exists(&f1));
    assert!(!fx.exists(&f2));
}

#[test]
fn test_comments_and_shared_records_cleared_on_drop() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id"]);
    let column = ObjectAddress::new(table.class_id, table.object_id, 1);
    fx.catalog
        .set_comment(&mut txn, &table, "all orders")
        .unwrap();
    fx.catalog
        .set_comment(&mut txn, &column, "primary key")
        .unwrap();
    fx.catalog.record_owner(&mut txn, &table, 501).unwrap();
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &table, DropBehavior::Restrict)
        .unwrap();
    txn.commit().unwrap();

    assert_eq!(fx.catalog.get_comment(&table).unwrap(), None);
    assert_eq!(fx.catalog.get_comment(&column).unwrap(), None);
    assert_eq!(fx.catalog.shared_dependency_count(&table).unwrap(), 0);
}

#[test]
fn test_executor_role_downgrades_cascade_notices() {
    let fx = CatalogFixture::executor();
    let mut txn = fx.begin();
    let table = fx.table(&mut txn, "orders", &["id"]);
    let view = fx.view(&mut txn, "recent_orders");
    fx.depend(&mut txn, &view, &table, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .perform_deletion(&mut txn, &table, DropBehavior::Cascade)
        .unwrap();
    // Cascade messages are debug-only on executor nodes
    assert!(txn.notices().is_empty());
    txn.commit().unwrap();
    assert!(!fx.exists(&view));
}

#[test]
fn test_delete_what_depends_on_keeps_the_target() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let schema = fx.schema(&mut txn, "reporting");
    let view = fx.view(&mut txn, "weekly");
    let default = fx.view(&mut txn, "daily");
    fx.depend(&mut txn, &view, &schema, DependencyType::Normal);
    fx.depend(&mut txn, &default, &view, DependencyType::Auto);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .delete_what_depends_on(&mut txn, &schema, true)
        .unwrap();
    assert!(txn.notices().iter().any(|n| n == "drop cascades to view weekly"));
    txn.commit().unwrap();

    assert!(fx.exists(&schema));
    assert!(!fx.exists(&view));
    assert!(!fx.exists(&default));
}

#[test]
fn test_delete_what_depends_on_can_run_silently() {
    let fx = CatalogFixture::new();
    let mut txn = fx.begin();
    let schema = fx.schema(&mut txn, "staging");
    let view = fx.view(&mut txn, "loads");
    fx.depend(&mut txn, &view, &schema, DependencyType::Normal);
    txn.commit().unwrap();

    let mut txn = fx.begin();
    fx.catalog
        .delete_what_depends_on(&mut txn, &schema, false)
        .unwrap();
    assert!(txn.notices().is_empty());
    txn.commit().unwrap();
    assert!(!fx.exists(&view));
}
