//! PostgreSQL statement renderer
//!
//! Turns create, alter and drop operations on property bags into PostgreSQL
//! DDL. The property names understood for each kind are listed on the
//! per-kind functions below; unknown properties are ignored.

use crate::error::{Error, Result};
use crate::schema::adapter::{Operation, RenderContext, StatementRenderer};
use crate::schema::types::{ConstraintKind, ObjectKind, Property, PropertyBag};
use crate::utils::naming::{ident_list, qualified, quote_ident, quote_literal};

/// Renders PostgreSQL (and EDB Advanced Server) DDL
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresRenderer;

impl PostgresRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl StatementRenderer for PostgresRenderer {
    fn render(
        &self,
        kind: ObjectKind,
        operation: Operation<'_>,
        ctx: &RenderContext<'_>,
    ) -> Result<String> {
        match kind {
            ObjectKind::Table => table_sql(operation, ctx),
            ObjectKind::Column => column_sql(operation, ctx),
            ObjectKind::Constraint(constraint) => constraint_sql(constraint, operation, ctx),
            ObjectKind::Index => index_sql(operation, ctx),
            ObjectKind::Trigger => trigger_sql(operation, ctx),
            ObjectKind::CompoundTrigger => compound_trigger_sql(operation, ctx),
            ObjectKind::Rule => rule_sql(operation, ctx),
            ObjectKind::RowSecurityPolicy => policy_sql(operation, ctx),
            ObjectKind::Partition => partition_sql(operation, ctx),
        }
    }
}

fn name_of<'b>(bag: &'b PropertyBag, kind: ObjectKind) -> Result<&'b str> {
    bag.require_name(kind.as_str())
}

fn owning_table(kind: ObjectKind, ctx: &RenderContext<'_>) -> Result<String> {
    ctx.table
        .map(|table| qualified(ctx.schema, table))
        .ok_or_else(|| Error::Precondition(format!("a {} needs an owning table", kind)))
}

fn cascade(ctx: &RenderContext<'_>) -> &'static str {
    if ctx.cascade {
        " CASCADE"
    } else {
        ""
    }
}

/// `COMMENT ON ... IS ...;`, with `NULL` for a cleared description
fn comment_sql(object: &str, description: Option<&Property>) -> String {
    match description.and_then(Property::as_str) {
        Some(text) if !text.is_empty() => format!("COMMENT ON {} IS {};", object, quote_literal(text)),
        _ => format!("COMMENT ON {} IS NULL;", object),
    }
}

/// A column reference or an expression, quoting only plain names
fn column_expr(column: &str) -> String {
    if column.contains(|c: char| c == '(' || c == ' ' || c == ':') {
        column.to_string()
    } else {
        quote_ident(column)
    }
}

fn column_exprs(bag: &PropertyBag, key: &str) -> String {
    bag.strings(key)
        .iter()
        .map(|column| column_expr(column))
        .collect::<Vec<_>>()
        .join(", ")
}

fn deferrable_sql(bag: &PropertyBag) -> String {
    let mut sql = String::new();
    if bag.flag("deferrable") {
        sql.push_str(" DEFERRABLE");
        if bag.flag("deferred") {
            sql.push_str(" INITIALLY DEFERRED");
        }
    }
    sql
}

fn include_sql(bag: &PropertyBag) -> String {
    let include = bag.strings("include");
    if include.is_empty() {
        String::new()
    } else {
        format!(" INCLUDE ({})", ident_list(&include))
    }
}

fn changed(changes: &PropertyBag, key: &str) -> bool {
    changes.contains_key(key)
}

/// Table properties `ALTER TABLE` can change in place
const TABLE_ALTERABLE: &[&str] = &[
    "owner",
    "relowner",
    "spcname",
    "unlogged",
    "rlspolicy",
    "forcerlspolicy",
    "description",
    "relacl",
];

/// One grantee's entry in a `relacl` or `attacl` list
#[derive(Debug, PartialEq, Eq)]
struct Grant<'b> {
    grantee: &'b str,
    privileges: Vec<String>,
    with_grant_option: bool,
}

/// Entries are `{grantee, privileges: [..], with_grant_option}`; privileges
/// are kept uppercased and sorted so their order never matters.
fn grants(acl: Option<&Property>) -> Vec<Grant<'_>> {
    acl.and_then(Property::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Property::as_bag)
        .filter_map(|entry| {
            let grantee = entry.text("grantee")?;
            let mut privileges: Vec<String> = entry
                .strings("privileges")
                .iter()
                .map(|privilege| privilege.to_uppercase())
                .collect();
            privileges.sort();
            privileges.dedup();
            Some(Grant {
                grantee,
                privileges,
                with_grant_option: entry.flag("with_grant_option"),
            })
        })
        .collect()
}

fn role_sql(grantee: &str) -> String {
    if grantee.eq_ignore_ascii_case("public") {
        "PUBLIC".to_string()
    } else {
        quote_ident(grantee)
    }
}

/// `REVOKE`/`GRANT` statements taking the `target` privileges to the
/// `source` ones, on the whole table or on one of its columns
fn acl_sql(table: &str, column: Option<&str>, source: Option<&Property>, target: Option<&Property>) -> String {
    let source = grants(source);
    let target = grants(target);
    let column = column
        .map(|column| format!(" ({})", quote_ident(column)))
        .unwrap_or_default();
    let mut sql = String::new();

    for old in target.iter().filter(|old| !source.contains(old)) {
        sql.push_str(&format!(
            "REVOKE ALL{} ON TABLE {} FROM {};\n",
            column,
            table,
            role_sql(old.grantee)
        ));
    }
    for new in source.iter().filter(|new| !new.privileges.is_empty() && !target.contains(new)) {
        let privileges: Vec<String> = new
            .privileges
            .iter()
            .map(|privilege| format!("{}{}", privilege, column))
            .collect();
        let option = if new.with_grant_option { " WITH GRANT OPTION" } else { "" };
        sql.push_str(&format!(
            "GRANT {} ON TABLE {} TO {}{};\n",
            privileges.join(", "),
            table,
            role_sql(new.grantee),
            option
        ));
    }
    sql
}

/// Tables: `columns`, `owner`, `description`, `spcname`, `unlogged`,
/// `is_partitioned`, `partition_scheme`, `rlspolicy`, `forcerlspolicy`,
/// `relacl`; columns may carry `attacl`
fn table_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    match operation {
        Operation::Create(table) => {
            let name = name_of(table, ObjectKind::Table)?;
            let full_name = qualified(ctx.schema, name);
            let unlogged = if table.flag("unlogged") { "UNLOGGED " } else { "" };
            let mut sql = format!("CREATE {}TABLE IF NOT EXISTS {}\n(\n", unlogged, full_name);

            let columns = table.bags(ObjectKind::Column.collection_key());
            let column_defs: Vec<String> = columns
                .iter()
                .map(|column| column_definition(column).map(|def| format!("    {}", def)))
                .collect::<Result<_>>()?;
            sql.push_str(&column_defs.join(",\n"));
            sql.push_str("\n)");

            if table.flag("is_partitioned") {
                if let Some(scheme) = table.text("partition_scheme") {
                    sql.push_str(&format!(" PARTITION BY {}", scheme));
                }
            }
            if let Some(tablespace) = table.text("spcname") {
                sql.push_str(&format!(" TABLESPACE {}", quote_ident(tablespace)));
            }
            sql.push_str(";\n");

            sql.push_str(&table_trailer(table, &full_name));
            for column in &columns {
                let column_name = name_of(column, ObjectKind::Column)?;
                if column.get("description").is_some_and(|value| !value.is_null()) {
                    sql.push_str(&comment_sql(
                        &format!("COLUMN {}.{}", full_name, quote_ident(column_name)),
                        column.get("description"),
                    ));
                    sql.push('\n');
                }
                sql.push_str(&acl_sql(&full_name, Some(column_name), column.get("attacl"), None));
            }
            Ok(sql)
        }
        Operation::Alter {
            source,
            target,
            changes,
        } => {
            let name = name_of(source, ObjectKind::Table)?;
            let unsupported: Vec<&str> = changes
                .keys()
                .filter(|key| !TABLE_ALTERABLE.contains(key))
                .collect();
            if !unsupported.is_empty() {
                return Err(Error::render(
                    ObjectKind::Table,
                    name,
                    format!("cannot alter {} in place", unsupported.join(", ")),
                ));
            }
            let full_name = qualified(ctx.schema, name);
            let mut sql = String::new();

            if changed(changes, "owner") || changed(changes, "relowner") {
                if let Some(owner) = source.text("owner").or_else(|| source.text("relowner")) {
                    sql.push_str(&format!("ALTER TABLE {} OWNER TO {};\n", full_name, quote_ident(owner)));
                }
            }
            if changed(changes, "spcname") {
                let tablespace = source.text("spcname").unwrap_or("pg_default");
                sql.push_str(&format!(
                    "ALTER TABLE {} SET TABLESPACE {};\n",
                    full_name,
                    quote_ident(tablespace)
                ));
            }
            if changed(changes, "unlogged") {
                let mode = if source.flag("unlogged") { "UNLOGGED" } else { "LOGGED" };
                sql.push_str(&format!("ALTER TABLE {} SET {};\n", full_name, mode));
            }
            if changed(changes, "rlspolicy") {
                let toggle = if source.flag("rlspolicy") { "ENABLE" } else { "DISABLE" };
                sql.push_str(&format!("ALTER TABLE {} {} ROW LEVEL SECURITY;\n", full_name, toggle));
            }
            if changed(changes, "forcerlspolicy") {
                let toggle = if source.flag("forcerlspolicy") { "FORCE" } else { "NO FORCE" };
                sql.push_str(&format!("ALTER TABLE {} {} ROW LEVEL SECURITY;\n", full_name, toggle));
            }
            if changed(changes, "description") {
                sql.push_str(&comment_sql(&format!("TABLE {}", full_name), source.get("description")));
                sql.push('\n');
            }
            if changed(changes, "relacl") {
                sql.push_str(&acl_sql(&full_name, None, source.get("relacl"), target.get("relacl")));
            }
            Ok(sql)
        }
        Operation::Drop(table) => {
            let name = name_of(table, ObjectKind::Table)?;
            Ok(format!(
                "DROP TABLE IF EXISTS {}{};",
                qualified(ctx.schema, name),
                cascade(ctx)
            ))
        }
    }
}

/// Ownership, row security and comment statements that follow a creation
fn table_trailer(table: &PropertyBag, full_name: &str) -> String {
    let mut sql = String::new();
    if let Some(owner) = table.text("owner").or_else(|| table.text("relowner")) {
        sql.push_str(&format!("ALTER TABLE {} OWNER TO {};\n", full_name, quote_ident(owner)));
    }
    if table.flag("rlspolicy") {
        sql.push_str(&format!("ALTER TABLE {} ENABLE ROW LEVEL SECURITY;\n", full_name));
    }
    if table.flag("forcerlspolicy") {
        sql.push_str(&format!("ALTER TABLE {} FORCE ROW LEVEL SECURITY;\n", full_name));
    }
    if table.get("description").is_some_and(|value| !value.is_null()) {
        sql.push_str(&comment_sql(&format!("TABLE {}", full_name), table.get("description")));
        sql.push('\n');
    }
    sql.push_str(&acl_sql(full_name, None, table.get("relacl"), None));
    sql
}

/// `name type [COLLATE c] [NOT NULL] [DEFAULT d]`
fn column_definition(column: &PropertyBag) -> Result<String> {
    let name = name_of(column, ObjectKind::Column)?;
    let data_type = column.text("type").ok_or_else(|| {
        Error::Precondition(format!("column '{}' has no 'type' property", name))
    })?;

    let mut sql = format!("{} {}", quote_ident(name), data_type);
    if let Some(collation) = column.text("collation") {
        sql.push_str(&format!(" COLLATE {}", collation));
    }
    if column.flag("not_null") {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = column.get("default").filter(|value| !value.is_null()) {
        sql.push_str(&format!(" DEFAULT {}", default));
    }
    Ok(sql)
}

/// Columns: `type`, `collation`, `not_null`, `default`, `description`,
/// `attacl`
fn column_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    let table = owning_table(ObjectKind::Column, ctx)?;
    match operation {
        Operation::Create(column) => {
            let name = name_of(column, ObjectKind::Column)?;
            let mut sql = format!("ALTER TABLE {} ADD COLUMN {};", table, column_definition(column)?);
            if column.get("description").is_some_and(|value| !value.is_null()) {
                sql.push('\n');
                sql.push_str(&comment_sql(
                    &format!("COLUMN {}.{}", table, quote_ident(name)),
                    column.get("description"),
                ));
            }
            let grants = acl_sql(&table, Some(name), column.get("attacl"), None);
            if !grants.is_empty() {
                sql.push('\n');
                sql.push_str(&grants);
            }
            Ok(sql)
        }
        Operation::Alter {
            source,
            target,
            changes,
        } => {
            let column_name = name_of(source, ObjectKind::Column)?;
            let name = quote_ident(column_name);
            let mut sql = String::new();

            if changed(changes, "type") || changed(changes, "collation") {
                if let Some(data_type) = source.text("type") {
                    let collation = source
                        .text("collation")
                        .map(|collation| format!(" COLLATE {}", collation))
                        .unwrap_or_default();
                    sql.push_str(&format!(
                        "ALTER TABLE {} ALTER COLUMN {} TYPE {}{} USING {}::{};\n",
                        table, name, data_type, collation, name, data_type
                    ));
                }
            }
            if changed(changes, "not_null") {
                let action = if source.flag("not_null") { "SET" } else { "DROP" };
                sql.push_str(&format!(
                    "ALTER TABLE {} ALTER COLUMN {} {} NOT NULL;\n",
                    table, name, action
                ));
            }
            if changed(changes, "default") {
                match source.get("default").filter(|value| !value.is_null()) {
                    Some(default) => sql.push_str(&format!(
                        "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};\n",
                        table, name, default
                    )),
                    None => sql.push_str(&format!(
                        "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;\n",
                        table, name
                    )),
                }
            }
            if changed(changes, "description") {
                sql.push_str(&comment_sql(
                    &format!("COLUMN {}.{}", table, name),
                    source.get("description"),
                ));
                sql.push('\n');
            }
            if changed(changes, "attacl") {
                sql.push_str(&acl_sql(&table, Some(column_name), source.get("attacl"), target.get("attacl")));
            }
            Ok(sql)
        }
        Operation::Drop(column) => {
            let name = name_of(column, ObjectKind::Column)?;
            Ok(format!(
                "ALTER TABLE {} DROP COLUMN IF EXISTS {}{};",
                table,
                quote_ident(name),
                cascade(ctx)
            ))
        }
    }
}

/// Body of `ADD CONSTRAINT name ...` for each constraint flavour
fn constraint_definition(kind: ConstraintKind, constraint: &PropertyBag) -> Result<String> {
    let definition = match kind {
        ConstraintKind::PrimaryKey => format!(
            "PRIMARY KEY ({}){}{}",
            ident_list(&constraint.strings("columns")),
            include_sql(constraint),
            deferrable_sql(constraint)
        ),
        ConstraintKind::Unique => format!(
            "UNIQUE ({}){}{}",
            ident_list(&constraint.strings("columns")),
            include_sql(constraint),
            deferrable_sql(constraint)
        ),
        ConstraintKind::ForeignKey => {
            let ref_table = constraint.text("ref_table").ok_or_else(|| {
                Error::Precondition("foreign key has no 'ref_table' property".to_string())
            })?;
            let reference = match constraint.text("ref_schema") {
                Some(schema) => qualified(schema, ref_table),
                None => quote_ident(ref_table),
            };
            let mut sql = format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                ident_list(&constraint.strings("columns")),
                reference,
                ident_list(&constraint.strings("ref_columns"))
            );
            if let Some(match_type) = constraint.text("match_type") {
                sql.push_str(&format!(" MATCH {}", match_type));
            }
            sql.push_str(&format!(
                " ON UPDATE {} ON DELETE {}",
                constraint.text("on_update").unwrap_or("NO ACTION"),
                constraint.text("on_delete").unwrap_or("NO ACTION")
            ));
            sql.push_str(&deferrable_sql(constraint));
            if constraint.bool("convalidated") == Some(false) {
                sql.push_str(" NOT VALID");
            }
            sql
        }
        ConstraintKind::Check => {
            let expression = constraint.text("expression").ok_or_else(|| {
                Error::Precondition("check constraint has no 'expression' property".to_string())
            })?;
            let mut sql = format!("CHECK ({})", expression);
            if constraint.flag("no_inherit") {
                sql.push_str(" NO INHERIT");
            }
            if constraint.bool("convalidated") == Some(false) {
                sql.push_str(" NOT VALID");
            }
            sql
        }
        ConstraintKind::Exclusion => {
            let elements: Vec<String> = constraint
                .list("columns")
                .unwrap_or_default()
                .iter()
                .map(|element| match element {
                    Property::Bag(bag) => format!(
                        "{} WITH {}",
                        column_expr(bag.text("column").unwrap_or_default()),
                        bag.text("operator").unwrap_or("=")
                    ),
                    other => other.to_string(),
                })
                .collect();
            let mut sql = format!(
                "EXCLUDE USING {} ({}){}",
                constraint.text("amname").unwrap_or("gist"),
                elements.join(", "),
                include_sql(constraint)
            );
            if let Some(predicate) = constraint.text("predicate") {
                sql.push_str(&format!(" WHERE ({})", predicate));
            }
            sql.push_str(&deferrable_sql(constraint));
            sql
        }
    };
    Ok(definition)
}

/// Constraints: `columns`, `include`, `deferrable`, `deferred`,
/// `description`, `convalidated`, plus the flavour's own properties
fn constraint_sql(
    kind: ConstraintKind,
    operation: Operation<'_>,
    ctx: &RenderContext<'_>,
) -> Result<String> {
    let object_kind = ObjectKind::Constraint(kind);
    let table = owning_table(object_kind, ctx)?;
    match operation {
        Operation::Create(constraint) => {
            let name = quote_ident(name_of(constraint, object_kind)?);
            let mut sql = format!(
                "ALTER TABLE {} ADD CONSTRAINT {} {};",
                table,
                name,
                constraint_definition(kind, constraint)?
            );
            if constraint.get("description").is_some_and(|value| !value.is_null()) {
                sql.push('\n');
                sql.push_str(&comment_sql(
                    &format!("CONSTRAINT {} ON {}", name, table),
                    constraint.get("description"),
                ));
            }
            Ok(sql)
        }
        Operation::Alter {
            source, changes, ..
        } => {
            let name = quote_ident(name_of(source, object_kind)?);
            let mut sql = String::new();
            if changed(changes, "convalidated") && source.bool("convalidated") != Some(false) {
                sql.push_str(&format!("ALTER TABLE {} VALIDATE CONSTRAINT {};\n", table, name));
            }
            if changed(changes, "description") {
                sql.push_str(&comment_sql(
                    &format!("CONSTRAINT {} ON {}", name, table),
                    source.get("description"),
                ));
                sql.push('\n');
            }
            Ok(sql)
        }
        Operation::Drop(constraint) => {
            let name = name_of(constraint, object_kind)?;
            Ok(format!(
                "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}{};",
                table,
                quote_ident(name),
                cascade(ctx)
            ))
        }
    }
}

/// Indexes: `columns`, `amname`, `is_unique`, `include`, `predicate`,
/// `spcname`, `description`
fn index_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    match operation {
        Operation::Create(index) => {
            let table = owning_table(ObjectKind::Index, ctx)?;
            let name = name_of(index, ObjectKind::Index)?;
            let unique = if index.flag("is_unique") { "UNIQUE " } else { "" };
            let mut sql = format!(
                "CREATE {}INDEX IF NOT EXISTS {} ON {} USING {} ({}){}",
                unique,
                quote_ident(name),
                table,
                index.text("amname").unwrap_or("btree"),
                column_exprs(index, "columns"),
                include_sql(index)
            );
            if let Some(tablespace) = index.text("spcname") {
                sql.push_str(&format!(" TABLESPACE {}", quote_ident(tablespace)));
            }
            if let Some(predicate) = index.text("predicate") {
                sql.push_str(&format!(" WHERE {}", predicate));
            }
            sql.push(';');
            if index.get("description").is_some_and(|value| !value.is_null()) {
                sql.push('\n');
                sql.push_str(&comment_sql(
                    &format!("INDEX {}", qualified(ctx.schema, name)),
                    index.get("description"),
                ));
            }
            Ok(sql)
        }
        Operation::Alter {
            source, changes, ..
        } => {
            let name = qualified(ctx.schema, name_of(source, ObjectKind::Index)?);
            let mut sql = String::new();
            if changed(changes, "spcname") {
                sql.push_str(&format!(
                    "ALTER INDEX {} SET TABLESPACE {};\n",
                    name,
                    quote_ident(source.text("spcname").unwrap_or("pg_default"))
                ));
            }
            if changed(changes, "description") {
                sql.push_str(&comment_sql(&format!("INDEX {}", name), source.get("description")));
                sql.push('\n');
            }
            Ok(sql)
        }
        Operation::Drop(index) => {
            let name = name_of(index, ObjectKind::Index)?;
            Ok(format!(
                "DROP INDEX IF EXISTS {}{};",
                qualified(ctx.schema, name),
                cascade(ctx)
            ))
        }
    }
}

/// `INSERT OR UPDATE OF a, b`
fn events_sql(bag: &PropertyBag) -> String {
    let columns = bag.strings("columns");
    bag.strings("events")
        .iter()
        .map(|event| {
            if event.eq_ignore_ascii_case("UPDATE") && !columns.is_empty() {
                format!("UPDATE OF {}", ident_list(&columns))
            } else {
                event.to_uppercase()
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

fn enable_trigger_sql(table: &str, name: &str, enabled: bool) -> String {
    let toggle = if enabled { "ENABLE" } else { "DISABLE" };
    format!("ALTER TABLE {} {} TRIGGER {};", table, toggle, name)
}

/// Triggers: `fires`, `events`, `columns`, `for_each`, `when`, `function`,
/// `arguments`, `is_enabled`, `description`
fn trigger_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    let table = owning_table(ObjectKind::Trigger, ctx)?;
    match operation {
        Operation::Create(trigger) => {
            let name = quote_ident(name_of(trigger, ObjectKind::Trigger)?);
            let function = trigger.text("function").ok_or_else(|| {
                Error::Precondition("trigger has no 'function' property".to_string())
            })?;
            let arguments: Vec<String> = trigger
                .strings("arguments")
                .iter()
                .map(|argument| quote_literal(argument))
                .collect();

            let mut sql = format!(
                "CREATE TRIGGER {}\n    {} {}\n    ON {}\n    FOR EACH {}",
                name,
                trigger.text("fires").unwrap_or("AFTER"),
                events_sql(trigger),
                table,
                trigger.text("for_each").unwrap_or("ROW")
            );
            if let Some(condition) = trigger.text("when") {
                sql.push_str(&format!("\n    WHEN ({})", condition));
            }
            sql.push_str(&format!(
                "\n    EXECUTE FUNCTION {}({});",
                function,
                arguments.join(", ")
            ));
            if trigger.bool("is_enabled") == Some(false) {
                sql.push('\n');
                sql.push_str(&enable_trigger_sql(&table, &name, false));
            }
            if trigger.get("description").is_some_and(|value| !value.is_null()) {
                sql.push('\n');
                sql.push_str(&comment_sql(
                    &format!("TRIGGER {} ON {}", name, table),
                    trigger.get("description"),
                ));
            }
            Ok(sql)
        }
        Operation::Alter {
            source, changes, ..
        } => {
            let name = quote_ident(name_of(source, ObjectKind::Trigger)?);
            let mut sql = String::new();
            if changed(changes, "is_enabled") {
                sql.push_str(&enable_trigger_sql(&table, &name, source.bool("is_enabled") != Some(false)));
                sql.push('\n');
            }
            if changed(changes, "description") {
                sql.push_str(&comment_sql(
                    &format!("TRIGGER {} ON {}", name, table),
                    source.get("description"),
                ));
                sql.push('\n');
            }
            Ok(sql)
        }
        Operation::Drop(trigger) => {
            let name = name_of(trigger, ObjectKind::Trigger)?;
            Ok(format!(
                "DROP TRIGGER IF EXISTS {} ON {}{};",
                quote_ident(name),
                table,
                cascade(ctx)
            ))
        }
    }
}

/// Compound triggers: `events`, `columns`, `when`, `body`, `is_enabled`
fn compound_trigger_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    let table = owning_table(ObjectKind::CompoundTrigger, ctx)?;
    let create = |trigger: &PropertyBag| -> Result<String> {
        let name = quote_ident(name_of(trigger, ObjectKind::CompoundTrigger)?);
        let mut sql = format!(
            "CREATE OR REPLACE TRIGGER {}\n    FOR {}\n    ON {}",
            name,
            events_sql(trigger),
            table
        );
        if let Some(condition) = trigger.text("when") {
            sql.push_str(&format!("\n    WHEN ({})", condition));
        }
        sql.push_str("\n    COMPOUND TRIGGER\n");
        sql.push_str(trigger.text("body").unwrap_or_default().trim());
        sql.push_str(&format!("\nEND {};", name));
        if trigger.bool("is_enabled") == Some(false) {
            sql.push('\n');
            sql.push_str(&enable_trigger_sql(&table, &name, false));
        }
        Ok(sql)
    };

    match operation {
        Operation::Create(trigger) => create(trigger),
        Operation::Alter {
            source, changes, ..
        } => {
            if changed(changes, "body") {
                return create(source);
            }
            let name = quote_ident(name_of(source, ObjectKind::CompoundTrigger)?);
            if changed(changes, "is_enabled") {
                return Ok(enable_trigger_sql(&table, &name, source.bool("is_enabled") != Some(false)));
            }
            Ok(String::new())
        }
        Operation::Drop(trigger) => {
            let name = name_of(trigger, ObjectKind::CompoundTrigger)?;
            Ok(format!(
                "DROP TRIGGER IF EXISTS {} ON {}{};",
                quote_ident(name),
                table,
                cascade(ctx)
            ))
        }
    }
}

/// Rules: `event`, `condition`, `do_instead`, `statements`
fn rule_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    let table = owning_table(ObjectKind::Rule, ctx)?;
    match operation {
        Operation::Create(rule) | Operation::Alter { source: rule, .. } => {
            let name = quote_ident(name_of(rule, ObjectKind::Rule)?);
            let mut sql = format!(
                "CREATE OR REPLACE RULE {} AS\n    ON {} TO {}",
                name,
                rule.text("event").unwrap_or("SELECT").to_uppercase(),
                table
            );
            if let Some(condition) = rule.text("condition") {
                sql.push_str(&format!("\n    WHERE {}", condition));
            }
            let instead = if rule.flag("do_instead") { "INSTEAD " } else { "" };
            let statements = rule
                .text("statements")
                .map(str::trim)
                .filter(|statements| !statements.is_empty())
                .unwrap_or("NOTHING");
            sql.push_str(&format!("\n    DO {}{};", instead, statements.trim_end_matches(';')));
            Ok(sql)
        }
        Operation::Drop(rule) => {
            let name = name_of(rule, ObjectKind::Rule)?;
            Ok(format!(
                "DROP RULE IF EXISTS {} ON {}{};",
                quote_ident(name),
                table,
                cascade(ctx)
            ))
        }
    }
}

fn roles_sql(policy: &PropertyBag) -> String {
    let roles = policy.strings("roles");
    if roles.is_empty() {
        "PUBLIC".to_string()
    } else {
        roles
            .iter()
            .map(|role| {
                if role.eq_ignore_ascii_case("public") {
                    "PUBLIC".to_string()
                } else {
                    quote_ident(role)
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Row-level security policies: `event`, `permissive`, `roles`, `using`,
/// `with_check`
fn policy_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    let table = owning_table(ObjectKind::RowSecurityPolicy, ctx)?;
    match operation {
        Operation::Create(policy) => {
            let name = quote_ident(name_of(policy, ObjectKind::RowSecurityPolicy)?);
            let permissive = if policy.bool("permissive") == Some(false) {
                "RESTRICTIVE"
            } else {
                "PERMISSIVE"
            };
            let mut sql = format!(
                "CREATE POLICY {}\n    ON {}\n    AS {}\n    FOR {}\n    TO {}",
                name,
                table,
                permissive,
                policy.text("event").unwrap_or("ALL").to_uppercase(),
                roles_sql(policy)
            );
            if let Some(using) = policy.text("using") {
                sql.push_str(&format!("\n    USING ({})", using));
            }
            if let Some(with_check) = policy.text("with_check") {
                sql.push_str(&format!("\n    WITH CHECK ({})", with_check));
            }
            sql.push(';');
            Ok(sql)
        }
        Operation::Alter {
            source, changes, ..
        } => {
            let name = quote_ident(name_of(source, ObjectKind::RowSecurityPolicy)?);
            let mut clauses = Vec::new();
            if changed(changes, "roles") {
                clauses.push(format!("TO {}", roles_sql(source)));
            }
            if changed(changes, "using") {
                clauses.push(format!("USING ({})", source.text("using").unwrap_or("true")));
            }
            if changed(changes, "with_check") {
                clauses.push(format!(
                    "WITH CHECK ({})",
                    source.text("with_check").unwrap_or("true")
                ));
            }
            if clauses.is_empty() {
                return Ok(String::new());
            }
            Ok(format!(
                "ALTER POLICY {} ON {}\n    {};",
                name,
                table,
                clauses.join("\n    ")
            ))
        }
        Operation::Drop(policy) => {
            let name = name_of(policy, ObjectKind::RowSecurityPolicy)?;
            Ok(format!("DROP POLICY IF EXISTS {} ON {};", quote_ident(name), table))
        }
    }
}

/// `FOR VALUES ...` or `DEFAULT`, accepting a bare bound expression
fn partition_bound(value: &str) -> String {
    let trimmed = value.trim();
    let upper = trimmed.to_uppercase();
    if upper.starts_with("FOR VALUES") || upper == "DEFAULT" {
        trimmed.to_string()
    } else {
        format!("FOR VALUES {}", trimmed)
    }
}

/// Partitions: `partition_value`, `is_partitioned`, `partition_scheme`,
/// plus the table properties for alterations
fn partition_sql(operation: Operation<'_>, ctx: &RenderContext<'_>) -> Result<String> {
    match operation {
        Operation::Create(partition) => {
            let parent = owning_table(ObjectKind::Partition, ctx)?;
            let name = name_of(partition, ObjectKind::Partition)?;
            let full_name = qualified(ctx.schema, name);
            let bound = partition.text("partition_value").ok_or_else(|| {
                Error::Precondition(format!("partition '{}' has no 'partition_value'", name))
            })?;
            let mut sql = format!(
                "CREATE TABLE IF NOT EXISTS {}\n    PARTITION OF {}\n    {}",
                full_name,
                parent,
                partition_bound(bound)
            );
            if partition.flag("is_partitioned") {
                if let Some(scheme) = partition.text("partition_scheme") {
                    sql.push_str(&format!("\n    PARTITION BY {}", scheme));
                }
            }
            sql.push_str(";\n");
            sql.push_str(&table_trailer(partition, &full_name));
            Ok(sql)
        }
        Operation::Alter { .. } => table_sql(operation, &RenderContext { table: None, ..*ctx }),
        Operation::Drop(partition) => {
            let name = name_of(partition, ObjectKind::Partition)?;
            Ok(format!(
                "DROP TABLE IF EXISTS {}{};",
                qualified(ctx.schema, name),
                cascade(ctx)
            ))
        }
    }
}
