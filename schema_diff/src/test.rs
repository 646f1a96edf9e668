//! Tests for SchemaDiff
//!
//! End-to-end tests running whole snapshots through the comparer, plus the
//! collection differ, the structural comparator, snapshot files and config.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use tempfile::tempdir;

    use crate::bag;
    use crate::config::{self, CompareConfig, Config};
    use crate::error::{Error, Result};
    use crate::render::PostgresRenderer;
    use crate::schema::adapter::{Operation, RenderContext, StatementRenderer};
    use crate::schema::types::{
        ComparisonStatus, DiffResult, KeySet, ObjectKind, Property, PropertyBag,
    };
    use crate::schema::{
        AdapterRegistry, EmitContext, NamedCollectionDiffer, ObjectKindAdapter, PolicySet,
        SchemaComparer, ScriptOptions, StructuralComparator, TableDiffOrchestrator,
    };
    use crate::snapshot::{
        Capabilities, FileSnapshotProvider, SchemaSnapshot, ServerInfo, ServerType,
    };
    use crate::SchemaDiffClient;

    fn orders() -> PropertyBag {
        bag! {
            "oid" => 16384,
            "name" => "orders",
            "schema" => "public",
            "columns" => vec![
                bag! { "oid" => 1, "attnum" => 1, "name" => "id", "type" => "integer", "not_null" => true },
                bag! { "oid" => 2, "attnum" => 2, "name" => "status", "type" => "text" },
            ],
            "primary_key" => vec![bag! { "oid" => 3, "name" => "orders_pkey", "columns" => vec!["id"] }],
        }
    }

    fn trigger(function: &str) -> PropertyBag {
        bag! {
            "name" => "audit",
            "fires" => "AFTER",
            "events" => vec!["INSERT"],
            "for_each" => "ROW",
            "function" => function,
        }
    }

    fn snapshot(schema: &str, tables: Vec<PropertyBag>) -> SchemaSnapshot {
        SchemaSnapshot::new(schema, tables).unwrap()
    }

    fn comparer() -> SchemaComparer {
        SchemaComparer::with_postgres(CompareConfig::default())
    }

    fn delta(comparer: &SchemaComparer, source: PropertyBag, target: PropertyBag) -> Vec<String> {
        let name = source.name().unwrap().to_string();
        let comparison = comparer
            .compare(snapshot("public", vec![source]), snapshot("public", vec![target]))
            .unwrap();
        let status = comparison.status_of(&name).unwrap();
        comparer
            .ddl_for(&comparison, &name, status)
            .unwrap()
            .statements()
            .to_vec()
    }

    /// Delegates to PostgreSQL except for one kind, which always fails
    struct FailingRenderer {
        kind: ObjectKind,
    }

    impl StatementRenderer for FailingRenderer {
        fn render(
            &self,
            kind: ObjectKind,
            operation: Operation<'_>,
            ctx: &RenderContext<'_>,
        ) -> Result<String> {
            if kind == self.kind {
                return Err(Error::Precondition(format!("cannot render {}", operation.name())));
            }
            PostgresRenderer.render(kind, operation, ctx)
        }
    }

    #[test]
    fn test_added_and_deleted_columns_are_matched_by_name() {
        let ignore = KeySet::from_keys(&["oid"]);
        let source = vec![
            bag! { "name" => "id", "type" => "int" },
            bag! { "name" => "name", "type" => "text" },
        ];
        let target = vec![
            bag! { "name" => "id", "type" => "int" },
            bag! { "name" => "age", "type" => "int" },
        ];

        let result = NamedCollectionDiffer::new(&ignore).diff(&source, &target);

        assert_eq!(result.added, vec![source[1].clone()]);
        assert_eq!(result.deleted, vec![target[1].clone()]);
        assert!(result.changed.is_empty());
        assert_eq!(result.unchanged, vec!["id".to_string()]);
    }

    #[rstest]
    #[case(vec!["a", "b", "c"], vec!["b", "c", "d"])]
    #[case(vec!["a"], vec![])]
    #[case(vec![], vec!["x", "y"])]
    #[case(vec!["p", "q"], vec!["q", "p"])]
    fn test_every_item_is_classified_exactly_once(
        #[case] source_names: Vec<&str>,
        #[case] target_names: Vec<&str>,
    ) {
        let ignore = KeySet::new();
        let source: Vec<PropertyBag> = source_names
            .iter()
            .map(|name| bag! { "name" => *name, "side" => "source" })
            .collect();
        let target: Vec<PropertyBag> = target_names
            .iter()
            .map(|name| bag! { "name" => *name, "side" => "target" })
            .collect();

        let result = NamedCollectionDiffer::new(&ignore).diff(&source, &target);

        let matched = source_names
            .iter()
            .filter(|name| target_names.contains(*name))
            .count();
        assert_eq!(result.added.len() + result.changed.len() + result.unchanged.len(), source.len());
        assert_eq!(result.deleted.len() + matched, target.len());
        assert_eq!(result.changed.len(), matched);
    }

    #[test]
    fn test_collection_diffed_against_itself_is_unchanged() {
        let ignore = KeySet::from_keys(&["oid"]);
        let columns = orders().bags("columns");

        let result = NamedCollectionDiffer::new(&ignore).diff(&columns, &columns);

        assert!(result.is_empty());
        assert_eq!(result.unchanged.len(), columns.len());
    }

    #[test]
    fn test_non_editable_change_is_added_and_deleted() {
        let ignore = KeySet::from_keys(&["oid"]);
        let source = vec![bag! { "name" => "orders_pkey", "columns" => vec!["id", "tenant_id"] }];
        let target = vec![bag! { "name" => "orders_pkey", "columns" => vec!["id"] }];

        let result = NamedCollectionDiffer::new(&ignore)
            .non_editable(&["columns"])
            .diff(&source, &target);

        assert_eq!(result.added, source);
        assert_eq!(result.deleted, target);
        assert!(result.changed.is_empty());
    }

    #[test]
    fn test_changed_item_carries_target_identifiers() {
        let ignore = KeySet::from_keys(&["oid", "attnum"]);
        let source = vec![bag! { "oid" => 10, "attnum" => 7, "name" => "qty", "type" => "bigint" }];
        let target = vec![bag! { "oid" => 99, "attnum" => 3, "name" => "qty", "type" => "integer" }];

        let result = NamedCollectionDiffer::new(&ignore)
            .carry(&["oid", "attnum"])
            .diff(&source, &target);

        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.changed[0].get("oid"), Some(&Property::Int(99)));
        assert_eq!(result.changed[0].get("attnum"), Some(&Property::Int(3)));
        assert_eq!(result.changed[0].text("type"), Some("bigint"));
    }

    #[test]
    fn test_blank_values_compare_equal() {
        let ignore = KeySet::new();
        let comparator = StructuralComparator::new(&ignore, false);
        let source = bag! { "name" => "t", "description" => Property::Null, "include" => Vec::<String>::new() };
        let target = bag! { "name" => "t" };

        assert!(comparator.are_identical(&source, &target));
        assert!(comparator.diff(&source, &target).is_empty());
    }

    #[test]
    fn test_target_only_key_is_reported_as_null() {
        let ignore = KeySet::new();
        let comparator = StructuralComparator::new(&ignore, false);
        let source = bag! { "name" => "t" };
        let target = bag! { "name" => "t", "description" => "old comment" };

        let diff = comparator.diff(&source, &target);

        assert_eq!(diff, bag! { "description" => Property::Null });
    }

    #[rstest]
    #[case(false, false)]
    #[case(true, true)]
    fn test_whitespace_toggle(#[case] ignore_whitespace: bool, #[case] identical: bool) {
        let ignore = KeySet::new();
        let comparator = StructuralComparator::new(&ignore, ignore_whitespace);
        let source = bag! { "name" => "qty_positive", "expression" => "(qty > 0)" };
        let target = bag! { "name" => "qty_positive", "expression" => "(qty  >\n  0)" };

        assert_eq!(comparator.are_identical(&source, &target), identical);
    }

    #[rstest]
    #[case("bigint", bag! {
        "columns" => bag! {
            "added" => Vec::<PropertyBag>::new(),
            "changed" => vec![bag! { "name" => "qty", "type" => "bigint" }],
            "deleted" => Vec::<PropertyBag>::new(),
        },
    })]
    #[case("integer", PropertyBag::new())]
    fn test_ignored_keys_never_reach_the_diff(#[case] source_type: &str, #[case] expected: PropertyBag) {
        let ignore = KeySet::from_keys(&["oid"]);
        let comparator = StructuralComparator::new(&ignore, false);
        let source = bag! {
            "oid" => 1,
            "name" => "orders",
            "columns" => vec![bag! { "oid" => 10, "name" => "qty", "type" => source_type }],
        };
        let target = bag! {
            "oid" => 2,
            "name" => "orders",
            "columns" => vec![bag! { "oid" => 20, "name" => "qty", "type" => "integer" }],
        };

        assert_eq!(comparator.diff(&source, &target), expected);
    }

    #[test]
    fn test_reordered_grantees_compare_equal() {
        let ignore = KeySet::new();
        let comparator = StructuralComparator::new(&ignore, false);
        let reporting = bag! { "grantee" => "reporting", "privileges" => vec!["SELECT"] };
        let etl = bag! { "grantee" => "etl", "privileges" => vec!["INSERT"] };
        let source = bag! { "name" => "orders", "relacl" => vec![reporting.clone(), etl.clone()] };
        let target = bag! { "name" => "orders", "relacl" => vec![etl, reporting] };

        assert!(comparator.are_identical(&source, &target));
        assert!(comparator.diff(&source, &target).is_empty());
    }

    #[test]
    fn test_identical_snapshots_produce_no_delta() {
        let comparer = comparer();
        let source = snapshot("public", vec![orders()]);
        let comparison = comparer.compare(source.clone(), source).unwrap();

        assert!(comparison.is_identical());
        let report = comparer.generate_script(&comparison, &ScriptOptions::default());
        assert!(report.tables.is_empty());
        assert!(report.script.ends_with("BEGIN;\n\nEND;\n"));
    }

    #[test]
    fn test_server_assigned_identifiers_are_ignored() {
        let mut target = orders();
        target.insert("oid", 99999);
        target.insert(
            "columns",
            vec![
                bag! { "oid" => 71, "attnum" => 4, "name" => "id", "type" => "integer", "not_null" => true },
                bag! { "oid" => 72, "attnum" => 5, "name" => "status", "type" => "text" },
            ],
        );

        let comparison = comparer()
            .compare(snapshot("public", vec![orders()]), snapshot("public", vec![target]))
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(ComparisonStatus::Identical));
    }

    #[test]
    fn test_column_changes_drop_then_add() {
        let source = bag! {
            "name" => "people",
            "columns" => vec![
                bag! { "name" => "id", "type" => "int" },
                bag! { "name" => "name", "type" => "text" },
            ],
        };
        let target = bag! {
            "name" => "people",
            "columns" => vec![
                bag! { "name" => "id", "type" => "int" },
                bag! { "name" => "age", "type" => "int" },
            ],
        };

        assert_eq!(
            delta(&comparer(), source, target),
            vec![
                "ALTER TABLE public.people DROP COLUMN IF EXISTS age;".to_string(),
                "ALTER TABLE public.people ADD COLUMN name text;".to_string(),
            ]
        );
    }

    #[rstest]
    #[case(Some(vec!["integer", "bigint", "numeric"]), vec![
        "ALTER TABLE public.orders ALTER COLUMN status TYPE bigint USING status::bigint;",
    ])]
    #[case(Some(vec!["text", "varchar"]), vec![
        "ALTER TABLE public.orders DROP COLUMN IF EXISTS status;",
        "ALTER TABLE public.orders ADD COLUMN status bigint;",
    ])]
    #[case(None, vec![
        "ALTER TABLE public.orders ALTER COLUMN status TYPE bigint USING status::bigint;",
    ])]
    fn test_column_type_change(#[case] edit_types: Option<Vec<&str>>, #[case] expected: Vec<&str>) {
        let mut source = orders();
        source.insert(
            "columns",
            vec![
                bag! { "name" => "id", "type" => "integer", "not_null" => true },
                bag! { "name" => "status", "type" => "bigint" },
            ],
        );
        let mut status = bag! { "name" => "status", "type" => "text" };
        if let Some(edit_types) = edit_types {
            status.insert("edit_types", edit_types);
        }
        let mut target = orders();
        target.insert(
            "columns",
            vec![bag! { "name" => "id", "type" => "integer", "not_null" => true }, status],
        );

        let expected: Vec<String> = expected.into_iter().map(String::from).collect();
        assert_eq!(delta(&comparer(), source, target), expected);
    }

    #[test]
    fn test_primary_key_column_change_recreates_the_constraint() {
        let mut source = orders();
        source.insert(
            "primary_key",
            vec![bag! { "name" => "orders_pkey", "columns" => vec!["id", "status"] }],
        );

        assert_eq!(
            delta(&comparer(), source, orders()),
            vec![
                "ALTER TABLE public.orders DROP CONSTRAINT IF EXISTS orders_pkey;".to_string(),
                "ALTER TABLE public.orders ADD CONSTRAINT orders_pkey PRIMARY KEY (id, status);"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_foreign_keys_are_dropped_before_other_constraints() {
        let mut target = orders();
        target.insert(
            "foreign_key",
            vec![bag! {
                "name" => "orders_customer_fk",
                "columns" => vec!["id"],
                "ref_schema" => "public",
                "ref_table" => "customers",
                "ref_columns" => vec!["id"],
            }],
        );
        target.insert(
            "unique_constraint",
            vec![bag! { "name" => "orders_status_key", "columns" => vec!["status"] }],
        );

        assert_eq!(
            delta(&comparer(), orders(), target),
            vec![
                "ALTER TABLE public.orders DROP CONSTRAINT IF EXISTS orders_customer_fk;".to_string(),
                "ALTER TABLE public.orders DROP CONSTRAINT IF EXISTS orders_status_key;".to_string(),
            ]
        );
    }

    #[test]
    fn test_source_only_table_is_created_in_the_target_schema() {
        let comparer = comparer();
        let table = bag! {
            "name" => "t1",
            "schema" => "dev",
            "columns" => vec![bag! { "name" => "id", "type" => "integer" }],
        };
        let comparison = comparer
            .compare(snapshot("dev", vec![table]), snapshot("prod", vec![]))
            .unwrap();

        assert_eq!(comparison.status_of("t1"), Some(ComparisonStatus::SourceOnly));
        let fragment = comparer
            .ddl_for(&comparison, "t1", ComparisonStatus::SourceOnly)
            .unwrap();
        assert_eq!(
            fragment.statements(),
            &["CREATE TABLE IF NOT EXISTS prod.t1\n(\n    id integer\n);".to_string()]
        );
    }

    #[rstest]
    #[case(false, "DROP TABLE IF EXISTS public.orders;")]
    #[case(true, "DROP TABLE IF EXISTS public.orders CASCADE;")]
    fn test_target_only_table_is_dropped(#[case] drop_cascade: bool, #[case] expected: &str) {
        let comparer = SchemaComparer::with_postgres(CompareConfig {
            drop_cascade,
            ..CompareConfig::default()
        });
        let comparison = comparer
            .compare(snapshot("public", vec![]), snapshot("public", vec![orders()]))
            .unwrap();

        let fragment = comparer
            .ddl_for(&comparison, "orders", ComparisonStatus::TargetOnly)
            .unwrap();
        assert_eq!(fragment.to_sql(), expected);
    }

    #[test]
    fn test_trigger_change_emits_only_the_trigger() {
        let source = orders().with("triggers", vec![trigger("audit_v2")]);
        let target = orders().with("triggers", vec![trigger("audit_v1")]);

        assert_eq!(
            delta(&comparer(), source, target),
            vec![
                "DROP TRIGGER IF EXISTS audit ON public.orders;".to_string(),
                "CREATE TRIGGER audit\n    AFTER INSERT\n    ON public.orders\n    FOR EACH ROW\n    EXECUTE FUNCTION audit_v2();"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_trigger_enable_toggle_is_altered_in_place() {
        let source = orders().with("triggers", vec![trigger("audit_fn").with("is_enabled", false)]);
        let target = orders().with("triggers", vec![trigger("audit_fn").with("is_enabled", true)]);

        assert_eq!(
            delta(&comparer(), source, target),
            vec!["ALTER TABLE public.orders DISABLE TRIGGER audit;".to_string()]
        );
    }

    #[test]
    fn test_index_column_change_recreates_the_index() {
        let index = |column: &str| bag! { "name" => "orders_idx", "columns" => vec![column] };
        let source = orders().with("indexes", vec![index("status")]);
        let target = orders().with("indexes", vec![index("id")]);

        assert_eq!(
            delta(&comparer(), source, target),
            vec![
                "DROP INDEX IF EXISTS public.orders_idx;".to_string(),
                "CREATE INDEX IF NOT EXISTS orders_idx ON public.orders USING btree (status);"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_changed_rule_is_replaced() {
        let rule = |action: &str| {
            bag! {
                "name" => "orders_log",
                "event" => "INSERT",
                "do_instead" => false,
                "statements" => action,
            }
        };
        let source = orders().with("rules", vec![rule("INSERT INTO log VALUES (NEW.id)")]);
        let target = orders().with("rules", vec![rule("NOTHING")]);

        let statements = delta(&comparer(), source, target);

        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("DROP RULE IF EXISTS orders_log"));
        assert!(statements[1].starts_with("CREATE OR REPLACE RULE orders_log"));
    }

    #[test]
    fn test_sub_objects_are_walked_in_order() {
        let source = orders()
            .with("triggers", vec![trigger("audit_fn")])
            .with("indexes", vec![bag! { "name" => "orders_status_idx", "columns" => vec!["status"] }]);

        let statements = delta(&comparer(), source, orders());

        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE INDEX"));
        assert!(statements[1].starts_with("CREATE TRIGGER"));
    }

    #[rstest]
    #[case(false, ComparisonStatus::Different)]
    #[case(true, ComparisonStatus::Identical)]
    fn test_owner_differences(#[case] ignore_owner: bool, #[case] expected: ComparisonStatus) {
        let comparer = SchemaComparer::with_postgres(CompareConfig {
            ignore_owner,
            ..CompareConfig::default()
        });
        let source = orders().with("owner", "alice");
        let target = orders().with("owner", "bob");
        let comparison = comparer
            .compare(snapshot("public", vec![source]), snapshot("public", vec![target]))
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(expected));
        if expected == ComparisonStatus::Different {
            let fragment = comparer.ddl_for(&comparison, "orders", expected).unwrap();
            assert_eq!(fragment.to_sql(), "ALTER TABLE public.orders OWNER TO alice;");
        }
    }

    #[test]
    fn test_ignored_owner_is_left_out_of_creation() {
        let comparer = SchemaComparer::with_postgres(CompareConfig {
            ignore_owner: true,
            ..CompareConfig::default()
        });
        let comparison = comparer
            .compare(
                snapshot("public", vec![orders().with("owner", "alice")]),
                snapshot("public", vec![]),
            )
            .unwrap();

        let sql = comparer
            .ddl_for(&comparison, "orders", ComparisonStatus::SourceOnly)
            .unwrap()
            .to_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS public.orders"));
        assert!(!sql.contains("OWNER TO"));
    }

    #[rstest]
    #[case(false, ComparisonStatus::Different)]
    #[case(true, ComparisonStatus::Identical)]
    fn test_whitespace_in_check_expressions(
        #[case] ignore_whitespace: bool,
        #[case] expected: ComparisonStatus,
    ) {
        let comparer = SchemaComparer::with_postgres(CompareConfig {
            ignore_whitespace,
            ..CompareConfig::default()
        });
        let check = |expression: &str| bag! { "name" => "orders_id_check", "expression" => expression };
        let source = orders().with("check_constraint", vec![check("(id > 0)")]);
        let target = orders().with("check_constraint", vec![check("(id >\n    0)")]);

        let comparison = comparer
            .compare(snapshot("public", vec![source]), snapshot("public", vec![target]))
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(expected));
    }

    #[test]
    fn test_cross_schema_references_are_retargeted() {
        let table = |schema: &str| {
            orders().with("schema", schema).with(
                "foreign_key",
                vec![bag! {
                    "name" => "orders_customer_fk",
                    "columns" => vec!["id"],
                    "ref_schema" => schema,
                    "ref_table" => "customers",
                    "ref_columns" => vec!["id"],
                }],
            )
        };

        let comparison = comparer()
            .compare(snapshot("dev", vec![table("dev")]), snapshot("prod", vec![table("prod")]))
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(ComparisonStatus::Identical));
    }

    #[test]
    fn test_entries_are_ordered_by_status_with_sequential_ids() {
        let named = |name: &str| bag! { "name" => name, "columns" => vec![bag! { "name" => "id", "type" => "integer" }] };
        let changed = named("d").with("description", "changed");

        let comparison = comparer()
            .compare(
                snapshot("public", vec![named("a"), named("c"), changed]),
                snapshot("public", vec![named("b"), named("c"), named("d")]),
            )
            .unwrap();

        let listed: Vec<(usize, &str, ComparisonStatus)> = comparison
            .entries()
            .iter()
            .map(|entry| (entry.id, entry.title.as_str(), entry.status))
            .collect();
        assert_eq!(
            listed,
            vec![
                (1, "a", ComparisonStatus::SourceOnly),
                (2, "b", ComparisonStatus::TargetOnly),
                (3, "d", ComparisonStatus::Different),
                (4, "c", ComparisonStatus::Identical),
            ]
        );
    }

    #[test]
    fn test_render_failure_is_reported_for_the_table() {
        let comparer = SchemaComparer::new(
            CompareConfig::default(),
            Arc::new(FailingRenderer {
                kind: ObjectKind::Trigger,
            }),
        );
        let comparison = comparer
            .compare(
                snapshot("public", vec![orders().with("triggers", vec![trigger("audit_fn")])]),
                snapshot("public", vec![]),
            )
            .unwrap();

        let error = comparer
            .ddl_for(&comparison, "orders", ComparisonStatus::SourceOnly)
            .unwrap_err();
        match error {
            Error::Render { kind, name, .. } => {
                assert_eq!(kind, "trigger");
                assert_eq!(name, "public.orders.audit");
            }
            other => panic!("expected a render error, got {:?}", other),
        }
    }

    #[test]
    fn test_failing_table_does_not_affect_its_siblings() {
        let comparer = SchemaComparer::new(
            CompareConfig::default(),
            Arc::new(FailingRenderer {
                kind: ObjectKind::Trigger,
            }),
        );
        let broken = orders().with("name", "broken").with("triggers", vec![trigger("audit_fn")]);
        let comparison = comparer
            .compare(snapshot("public", vec![broken, orders()]), snapshot("public", vec![]))
            .unwrap();

        let report = comparer.generate_script(&comparison, &ScriptOptions::default());

        assert!(!report.is_complete());
        assert_eq!(report.tables, vec!["orders".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].table, "broken");
        assert_eq!(report.failures[0].kind, "render");
        assert!(report.script.contains("CREATE TABLE IF NOT EXISTS public.orders"));
        assert!(!report.script.contains("public.broken"));
    }

    fn partitioned(partitions: Vec<PropertyBag>) -> PropertyBag {
        bag! {
            "name" => "events",
            "is_partitioned" => true,
            "partition_scheme" => "RANGE (id)",
            "columns" => vec![bag! { "name" => "id", "type" => "integer" }],
            "partitions" => partitions,
        }
    }

    fn partition(name: &str, bound: &str) -> PropertyBag {
        bag! { "name" => name, "partition_value" => bound }
    }

    #[test]
    fn test_changed_partition_is_diffed_recursively() {
        let source = partitioned(vec![partition("events_2023", "FROM (1) TO (10)").with("description", "old rows")]);
        let target = partitioned(vec![partition("events_2023", "FROM (1) TO (10)")]);

        assert_eq!(
            delta(&comparer(), source, target),
            vec!["COMMENT ON TABLE public.events_2023 IS 'old rows';".to_string()]
        );
    }

    #[test]
    fn test_partition_bound_change_recreates_the_partition() {
        let source = partitioned(vec![partition("events_2023", "FROM (1) TO (20)")]);
        let target = partitioned(vec![partition("events_2023", "FROM (1) TO (10)")]);

        assert_eq!(
            delta(&comparer(), source, target),
            vec![
                "DROP TABLE IF EXISTS public.events_2023;".to_string(),
                "CREATE TABLE IF NOT EXISTS public.events_2023\n    PARTITION OF public.events\n    FOR VALUES FROM (1) TO (20);"
                    .to_string(),
            ]
        );
    }

    #[rstest]
    #[case(8, true)]
    #[case(1, false)]
    fn test_partition_depth_cap(#[case] max_partition_depth: usize, #[case] succeeds: bool) {
        let comparer = SchemaComparer::with_postgres(CompareConfig {
            max_partition_depth,
            ..CompareConfig::default()
        });
        let nested = partition("events_eu", "IN ('eu')")
            .with("is_partitioned", true)
            .with("partition_scheme", "RANGE (id)")
            .with("partitions", vec![partition("events_eu_2023", "FROM (1) TO (10)")]);
        let comparison = comparer
            .compare(snapshot("public", vec![partitioned(vec![nested])]), snapshot("public", vec![]))
            .unwrap();

        let result = comparer.ddl_for(&comparison, "events", ComparisonStatus::SourceOnly);

        if succeeds {
            let sql = result.unwrap().to_sql();
            assert!(sql.contains("PARTITION OF public.events_eu"));
        } else {
            assert!(matches!(result, Err(Error::Precondition(_))));
        }
    }

    #[rstest]
    #[case(false, "DROP TABLE IF EXISTS public.events;")]
    #[case(true, "DROP TABLE IF EXISTS public.events CASCADE;")]
    fn test_partitioning_change_recreates_the_table(#[case] drop_cascade: bool, #[case] expected_drop: &str) {
        let comparer = SchemaComparer::with_postgres(CompareConfig {
            drop_cascade,
            ..CompareConfig::default()
        });
        let source = partitioned(vec![]).with("partition_scheme", "LIST (id)");
        let target = partitioned(vec![]);

        let statements = delta(&comparer, source, target);

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], expected_drop);
        assert!(statements[1].starts_with("CREATE TABLE IF NOT EXISTS public.events"));
        assert!(statements[1].contains("PARTITION BY LIST (id)"));
        if !drop_cascade {
            assert!(statements.iter().all(|statement| !statement.contains("CASCADE")));
        }
    }

    fn grant(grantee: &str, privileges: Vec<&str>) -> PropertyBag {
        bag! { "grantee" => grantee, "privileges" => privileges }
    }

    #[test]
    fn test_table_privileges_are_granted() {
        let comparer = comparer();
        let source = orders().with("relacl", vec![grant("reporting", vec!["SELECT"])]);
        let comparison = comparer
            .compare(snapshot("public", vec![source]), snapshot("public", vec![orders()]))
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(ComparisonStatus::Different));
        let statements = comparer
            .ddl_for(&comparison, "orders", ComparisonStatus::Different)
            .unwrap()
            .statements()
            .to_vec();
        assert_eq!(statements, vec!["GRANT SELECT ON TABLE public.orders TO reporting;".to_string()]);
    }

    #[test]
    fn test_table_privileges_are_revoked() {
        let source = orders().with("relacl", vec![grant("reporting", vec!["SELECT", "INSERT"])]);
        let target = orders().with(
            "relacl",
            vec![grant("reporting", vec!["SELECT"]), grant("analyst", vec!["SELECT"])],
        );

        assert_eq!(
            delta(&comparer(), source, target),
            vec![
                "REVOKE ALL ON TABLE public.orders FROM reporting;\n\
                 REVOKE ALL ON TABLE public.orders FROM analyst;\n\
                 GRANT INSERT, SELECT ON TABLE public.orders TO reporting;"
                    .to_string()
            ]
        );
        assert_eq!(
            delta(&comparer(), orders(), orders().with("relacl", vec![grant("analyst", vec!["SELECT"])])),
            vec!["REVOKE ALL ON TABLE public.orders FROM analyst;".to_string()]
        );
    }

    #[test]
    fn test_column_privileges_are_granted() {
        let source = orders().with(
            "columns",
            vec![
                bag! { "oid" => 1, "attnum" => 1, "name" => "id", "type" => "integer", "not_null" => true },
                bag! {
                    "oid" => 2,
                    "attnum" => 2,
                    "name" => "status",
                    "type" => "text",
                    "attacl" => vec![grant("reporting", vec!["select"])],
                },
            ],
        );

        assert_eq!(
            delta(&comparer(), source, orders()),
            vec!["GRANT SELECT (status) ON TABLE public.orders TO reporting;".to_string()]
        );
    }

    #[test]
    fn test_table_change_without_alter_form_fails_the_table() {
        let comparer = comparer();
        let comparison = comparer
            .compare(
                snapshot("public", vec![orders().with("fillfactor", 70)]),
                snapshot("public", vec![orders().with("fillfactor", 100)]),
            )
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(ComparisonStatus::Different));
        let report = comparer.generate_script(&comparison, &ScriptOptions::default());

        assert!(!report.is_complete());
        assert!(report.tables.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].table, "orders");
        assert_eq!(report.failures[0].kind, "render");
        assert!(report.failures[0].message.contains("fillfactor"));
    }

    #[rstest]
    #[case("staging")]
    #[case("public")]
    fn test_tables_are_classified_by_name(#[case] source_schema: &str) {
        let reordered = orders().with(
            "columns",
            orders().bags("columns").into_iter().rev().collect::<Vec<_>>(),
        );
        let renamed_oids = orders().with("oid", 1).with("name", "archive");
        let comparison = comparer()
            .compare(
                snapshot(source_schema, vec![reordered, orders().with("name", "audit")]),
                snapshot("public", vec![renamed_oids, orders()]),
            )
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(ComparisonStatus::Identical));
        assert_eq!(comparison.status_of("audit"), Some(ComparisonStatus::SourceOnly));
        assert_eq!(comparison.status_of("archive"), Some(ComparisonStatus::TargetOnly));
    }

    #[test]
    fn test_changed_constraint_without_target_counterpart_is_rejected() {
        let config = CompareConfig::default();
        let policies = PolicySet::from_config(&config);
        let registry = AdapterRegistry::new(Arc::new(PostgresRenderer::new()));
        let orchestrator = TableDiffOrchestrator::new(&registry, &policies, Capabilities::all(), 8);
        let ctx = EmitContext {
            orchestrator: &orchestrator,
            source_schema: "public",
            target_schema: "public",
            table: None,
            cascade: false,
            depth: 0,
        };
        let check = bag! { "name" => "orders_id_check", "expression" => "(id > 0)" };
        let source = orders().with("check_constraint", vec![check.clone()]);
        let merged = bag! {
            "check_constraint" => DiffResult {
                changed: vec![check],
                ..DiffResult::default()
            }
            .to_bag(),
        };

        let result = registry.adapter(ObjectKind::Table).emit(
            ComparisonStatus::Different,
            Some(&source),
            Some(&orders()),
            Some(&merged),
            &ctx,
        );

        match result {
            Err(Error::Precondition(message)) => assert!(message.contains("orders_id_check")),
            other => panic!("expected a precondition error, got {:?}", other),
        }
    }

    #[rstest]
    #[case(ServerInfo::new(ServerType::Postgres, 130004), ServerInfo::new(ServerType::Postgres, 130011), true)]
    #[case(ServerInfo::new(ServerType::Postgres, 120004), ServerInfo::new(ServerType::Postgres, 130004), false)]
    #[case(ServerInfo::new(ServerType::Edb, 130004), ServerInfo::new(ServerType::Postgres, 130004), false)]
    fn test_server_compatibility(
        #[case] source: ServerInfo,
        #[case] target: ServerInfo,
        #[case] compatible: bool,
    ) {
        let result = comparer().compare(
            snapshot("public", vec![orders()]).with_server(source),
            snapshot("public", vec![orders()]).with_server(target),
        );

        if compatible {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(Error::Incompatible(_))));
        }
    }

    #[test]
    fn test_compatibility_check_can_be_disabled() {
        let comparer = SchemaComparer::with_postgres(CompareConfig {
            check_compatibility: false,
            ..CompareConfig::default()
        });
        let result = comparer.compare(
            snapshot("public", vec![orders()]).with_server(ServerInfo::new(ServerType::Edb, 120000)),
            snapshot("public", vec![orders()]).with_server(ServerInfo::new(ServerType::Postgres, 150000)),
        );

        assert!(result.is_ok());
    }

    #[rstest]
    #[case(ServerType::Postgres, 150000, ComparisonStatus::Identical)]
    #[case(ServerType::Edb, 150000, ComparisonStatus::Different)]
    fn test_compound_triggers_need_edb(
        #[case] server_type: ServerType,
        #[case] version: u32,
        #[case] expected: ComparisonStatus,
    ) {
        let compound = bag! {
            "name" => "orders_audit",
            "events" => vec!["INSERT"],
            "body" => "AFTER EACH ROW IS BEGIN NULL; END AFTER EACH ROW;",
        };
        let server = ServerInfo::new(server_type, version);
        let comparison = comparer()
            .compare(
                snapshot("public", vec![orders().with("compound_triggers", vec![compound])]).with_server(server),
                snapshot("public", vec![orders()]).with_server(server),
            )
            .unwrap();

        assert_eq!(comparison.status_of("orders"), Some(expected));
    }

    #[test]
    fn test_ddl_compare_returns_all_three_scripts() {
        let comparer = comparer();
        let source = orders().with("description", "Customer orders");
        let comparison = comparer
            .compare(snapshot("public", vec![source]), snapshot("public", vec![orders()]))
            .unwrap();

        let ddl = comparer
            .ddl_compare(&comparison, "orders", ComparisonStatus::Different)
            .unwrap();

        assert!(ddl.source_ddl.contains("COMMENT ON TABLE public.orders IS 'Customer orders';"));
        assert!(ddl.target_ddl.starts_with("CREATE TABLE IF NOT EXISTS public.orders"));
        assert!(!ddl.target_ddl.contains("COMMENT ON"));
        assert_eq!(ddl.diff_ddl, "COMMENT ON TABLE public.orders IS 'Customer orders';");
    }

    #[test]
    fn test_script_without_header_or_transaction() {
        let comparer = comparer();
        let comparison = comparer
            .compare(snapshot("public", vec![]), snapshot("public", vec![orders()]))
            .unwrap();
        let options = ScriptOptions {
            include_header: false,
            wrap_in_transaction: false,
            generated_at: None,
        };

        let report = comparer.generate_script(&comparison, &options);

        assert_eq!(report.script, "DROP TABLE IF EXISTS public.orders;\n");
    }

    #[test]
    fn test_script_header_names_both_schemas() {
        let comparer = comparer();
        let comparison = comparer
            .compare(snapshot("dev", vec![orders()]), snapshot("prod", vec![]))
            .unwrap();

        let report = comparer.generate_script(&comparison, &ScriptOptions::default());

        assert!(report.script.starts_with("-- Schema delta generated by schema_diff\n"));
        assert!(report.script.contains("-- Source schema: dev\n-- Target schema: prod\n"));
        assert!(report.script.contains("BEGIN;\n\nCREATE TABLE IF NOT EXISTS prod.orders"));
        assert!(report.script.ends_with("\n\nEND;\n"));
    }

    #[test]
    fn test_duplicate_table_names_are_rejected() {
        let result = SchemaSnapshot::new("public", vec![orders(), orders()]);
        assert!(matches!(result, Err(Error::Precondition(_))));
    }

    const ORDERS_JSON: &str = r#"{
        "server": { "server_type": "pg", "version": 150002 },
        "schema": "public",
        "tables": [
            {
                "oid": 16384,
                "name": "orders",
                "columns": [
                    { "name": "id", "type": "integer", "not_null": true },
                    { "name": "status", "type": "text" }
                ],
                "indexes": [
                    { "name": "orders_status_idx", "columns": ["status"] }
                ]
            }
        ]
    }"#;

    const ORDERS_YAML: &str = r#"
server:
  server_type: postgres
  version: 150002
schema: public
tables:
  - oid: 20001
    name: orders
    columns:
      - name: id
        type: integer
        not_null: true
      - name: status
        type: varchar(20)
"#;

    #[test]
    fn test_load_json_snapshot_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("source.json");
        fs::write(&path, ORDERS_JSON).unwrap();

        let snapshot = FileSnapshotProvider::open(&path).unwrap().load().unwrap();

        assert_eq!(snapshot.schema(), "public");
        assert_eq!(snapshot.server(), Some(&ServerInfo::new(ServerType::Postgres, 150002)));
        let table = snapshot.table("orders").unwrap();
        assert_eq!(table.bags("columns").len(), 2);
        assert_eq!(table.bags("indexes")[0].name(), Some("orders_status_idx"));
    }

    #[test]
    fn test_unsupported_snapshot_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("source.txt");
        fs::write(&path, ORDERS_JSON).unwrap();

        let result = FileSnapshotProvider::open(&path);
        assert!(matches!(result, Err(Error::Fetch { .. })));
    }

    #[test]
    fn test_client_compares_snapshot_files() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("source.json");
        let target = dir.path().join("target.yaml");
        fs::write(&source, ORDERS_JSON).unwrap();
        fs::write(&target, ORDERS_YAML).unwrap();

        let client = SchemaDiffClient::new(Config::default()).unwrap();
        let comparison = client.compare_files(&source, &target).unwrap();

        assert_eq!(comparison.status_of("orders"), Some(ComparisonStatus::Different));
        let report = client.generate_script(&comparison);
        assert!(report.is_complete());
        assert!(report.script.contains("-- Generated at: "));
        assert!(report
            .script
            .contains("ALTER TABLE public.orders ALTER COLUMN status TYPE text USING status::text;"));
        assert!(report
            .script
            .contains("CREATE INDEX IF NOT EXISTS orders_status_idx ON public.orders USING btree (status);"));

        let ddl = client.ddl_compare(&comparison, "orders").unwrap();
        assert!(ddl.target_ddl.contains("status varchar(20)"));
        assert!(matches!(
            client.ddl_compare(&comparison, "missing"),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(!config.compare.ignore_owner);
        assert!(!config.compare.ignore_whitespace);
        assert_eq!(config.compare.max_partition_depth, 8);
        assert!(config.compare.check_compatibility);
        assert_eq!(config.output.format, "text");
        assert_eq!(config.output.dialect, "postgres");
        assert!(config.logging.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema_diff.toml");
        fs::write(
            &path,
            r#"
            [compare]
            ignore_owner = true
            max_partition_depth = 4

            [output]
            format = "sql"
            wrap_in_transaction = false

            [logging]
            level = "debug"
            format = "json"
            stdout = false
            "#,
        )
        .unwrap();

        let config = config::load_from_file(path.to_str().unwrap()).unwrap();

        assert!(config.compare.ignore_owner);
        assert_eq!(config.compare.max_partition_depth, 4);
        assert_eq!(config.output.format, "sql");
        assert!(config.output.include_header);
        assert!(!config.output.wrap_in_transaction);
        assert_eq!(config.logging.map(|logging| logging.level), Some("debug".to_string()));
    }

    #[rstest]
    #[case("[output]\nformat = \"html\"")]
    #[case("[output]\ndialect = \"mysql\"")]
    #[case("[compare]\nmax_partition_depth = 0")]
    fn test_invalid_config_is_rejected(#[case] content: &str) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schema_diff.toml");
        fs::write(&path, content).unwrap();

        let result = config::load_from_file(path.to_str().unwrap());
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
