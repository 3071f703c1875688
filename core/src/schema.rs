//! Schema finalization.
//!
//! [`SchemaBuilder`] collects table and relation declarations in any order.
//! [`SchemaBuilder::finalize`] then builds every column, resolves foreign
//! keys against the complete table set and normalizes relations, producing an
//! immutable [`Schema`] shared behind an `Arc`.

use std::sync::Arc;

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::casing::Casing;
use crate::column::Column;
use crate::error::{RelqError, Result};
use crate::foreign_key::{ColumnRef, ColumnResolver};
use crate::relation::{Relation, RelationDecl, RelationKind};
use crate::table::{Table, TableBuilder};

/// Declared relation: `(source table key, relation name, declaration)`.
type DeclaredRelation = (CompactString, CompactString, RelationDecl);

/// Collects schema declarations.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    casing: Casing,
    tables: Vec<TableBuilder>,
    relations: Vec<DeclaredRelation>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how column keys map to database names.
    pub fn casing(mut self, casing: Casing) -> Self {
        self.casing = casing;
        self
    }

    pub fn table(mut self, table: TableBuilder) -> Self {
        self.tables.push(table);
        self
    }

    /// Declares named relations on `table`.
    ///
    /// ```
    /// use relq_core::relation::{many, one};
    /// use relq_core::schema::SchemaBuilder;
    ///
    /// let schema = SchemaBuilder::new()
    ///     .relations("users", [("posts", many("posts"))])
    ///     .relations(
    ///         "posts",
    ///         [("author", one("users").fields(["authorId"]).references(["id"]))],
    ///     );
    /// # let _ = schema;
    /// ```
    pub fn relations<I, S>(mut self, table: impl Into<CompactString>, relations: I) -> Self
    where
        I: IntoIterator<Item = (S, RelationDecl)>,
        S: Into<CompactString>,
    {
        let table = table.into();
        self.relations.extend(
            relations
                .into_iter()
                .map(|(name, decl)| (table.clone(), name.into(), decl)),
        );
        self
    }

    /// Freezes the schema.
    ///
    /// Columns are built first, then every foreign key is resolved against
    /// the complete table set, so references may point forward or at each
    /// other. Relations are normalized last.
    pub fn finalize(self) -> Result<Arc<Schema>> {
        let mut tables = Vec::with_capacity(self.tables.len());
        let mut index = HashMap::with_capacity(self.tables.len());
        for builder in &self.tables {
            let table = builder.build(self.casing)?;
            if index.insert(CompactString::from(table.key()), tables.len()).is_some() {
                return Err(RelqError::DuplicateTable(table.key().to_string()));
            }
            tables.push(table);
        }

        let foreign_keys = {
            let resolver = Resolver {
                tables: &tables,
                index: &index,
            };
            self.tables
                .iter()
                .zip(&tables)
                .map(|(builder, table)| builder.build_foreign_keys(table, &resolver))
                .collect::<Result<Vec<_>>>()?
        };
        for (table, fks) in tables.iter_mut().zip(foreign_keys) {
            table.foreign_keys = fks;
        }

        let mut relations: HashMap<CompactString, Vec<Relation>> = HashMap::new();
        for (source, name, decl) in &self.relations {
            let normalized = normalize(&tables, &index, &self.relations, source, name, decl)?;
            let entry = relations.entry(source.clone()).or_default();
            if entry.iter().any(|r| r.name == *name) {
                return Err(resolution_error(source, name, "relation declared twice"));
            }
            entry.push(normalized);
        }

        let tables_by_name = tables
            .iter()
            .map(|t| (CompactString::from(t.name()), CompactString::from(t.key())))
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            tables = tables.len(),
            relations = self.relations.len(),
            "relq.schema.finalize"
        );

        Ok(Arc::new(Schema {
            tables,
            index,
            relations,
            tables_by_name,
        }))
    }
}

struct Resolver<'a> {
    tables: &'a [Table],
    index: &'a HashMap<CompactString, usize>,
}

impl ColumnResolver for Resolver<'_> {
    fn table_name(&self, table: &str) -> Option<&str> {
        self.index.get(table).map(|&idx| self.tables[idx].name())
    }

    fn column(&self, target: &ColumnRef) -> Option<&Column> {
        self.index
            .get(target.table.as_str())
            .and_then(|&idx| self.tables[idx].column(&target.column))
    }
}

fn resolution_error(table: &str, relation: &str, message: impl Into<String>) -> RelqError {
    RelqError::RelationResolution {
        table: table.into(),
        relation: relation.into(),
        message: message.into(),
    }
}

/// Maps column keys (or database names) to the canonical column keys of
/// `table`.
fn column_keys(
    table: &Table,
    columns: &[CompactString],
    source: &str,
    relation: &str,
) -> Result<Vec<CompactString>> {
    columns
        .iter()
        .map(|c| {
            table
                .column(c)
                .map(|col| CompactString::from(col.key()))
                .ok_or_else(|| {
                    resolution_error(
                        source,
                        relation,
                        format!("unknown column {}.{}", table.key(), c),
                    )
                })
        })
        .collect()
}

fn normalize(
    tables: &[Table],
    index: &HashMap<CompactString, usize>,
    declared: &[DeclaredRelation],
    source: &str,
    name: &str,
    decl: &RelationDecl,
) -> Result<Relation> {
    let lookup = |key: &str| {
        index
            .get(key)
            .map(|&idx| &tables[idx])
            .ok_or_else(|| RelqError::UnknownTable(key.to_string()))
    };
    let source_table = lookup(source)?;
    let target_table = lookup(&decl.target)?;

    let relation = |fields, references, nullable| Relation {
        name: name.into(),
        source: source.into(),
        target: decl.target.clone(),
        kind: decl.kind,
        fields,
        references,
        relation_name: decl.relation_name.clone(),
        nullable,
    };

    if decl.has_fields() || !decl.references.is_empty() {
        if decl.kind == RelationKind::Many {
            return Err(resolution_error(
                source,
                name,
                "many relations take their join columns from the reverse side",
            ));
        }
        if decl.fields.len() != decl.references.len() {
            return Err(resolution_error(
                source,
                name,
                format!(
                    "{} field(s) but {} reference(s)",
                    decl.fields.len(),
                    decl.references.len()
                ),
            ));
        }
        let fields = column_keys(source_table, &decl.fields, source, name)?;
        let references = column_keys(target_table, &decl.references, source, name)?;
        let nullable = fields.iter().any(|f| {
            source_table
                .column(f)
                .is_some_and(|column| !column.is_not_null())
        });
        return Ok(relation(fields, references, nullable));
    }

    // Reverse side: a one-relation with explicit fields declared on the
    // target, pointing back at the source.
    let reverse: Vec<&RelationDecl> = declared
        .iter()
        .filter(|(table, _, other)| {
            *table == decl.target
                && other.kind == RelationKind::One
                && other.has_fields()
                && other.target == source
                && match &decl.relation_name {
                    Some(rn) => other.relation_name.as_ref() == Some(rn),
                    None => true,
                }
        })
        .map(|(_, _, other)| other)
        .collect();

    match reverse.as_slice() {
        [other] => {
            let fields = column_keys(source_table, &other.references, source, name)?;
            let references = column_keys(target_table, &other.fields, source, name)?;
            Ok(relation(fields, references, decl.kind == RelationKind::One))
        }
        [] => {
            let fks: Vec<_> = target_table
                .foreign_keys()
                .iter()
                .filter(|fk| fk.foreign_table() == source)
                .collect();
            match fks.as_slice() {
                [fk] => Ok(relation(
                    fk.foreign_columns().map(CompactString::from).collect(),
                    fk.columns().map(CompactString::from).collect(),
                    decl.kind == RelationKind::One,
                )),
                [] => Err(resolution_error(
                    source,
                    name,
                    format!(
                        "no relation or foreign key on {} points back at {}",
                        decl.target, source
                    ),
                )),
                _ => Err(resolution_error(
                    source,
                    name,
                    format!(
                        "{} foreign keys on {} reference {}; declare the reverse relation",
                        fks.len(),
                        decl.target,
                        source
                    ),
                )),
            }
        }
        candidates => Err(resolution_error(
            source,
            name,
            format!(
                "{} relations on {} point back at {}; use relation_name to disambiguate",
                candidates.len(),
                decl.target,
                source
            ),
        )),
    }
}

/// A finalized, immutable schema.
#[derive(Debug, Clone)]
pub struct Schema {
    tables: Vec<Table>,
    index: HashMap<CompactString, usize>,
    relations: HashMap<CompactString, Vec<Relation>>,
    tables_by_name: HashMap<CompactString, CompactString>,
}

impl Schema {
    /// Table by key.
    pub fn table(&self, key: &str) -> Option<&Table> {
        self.index.get(key).map(|&idx| &self.tables[idx])
    }

    /// Table by key, as an error when missing.
    pub fn require_table(&self, key: &str) -> Result<&Table> {
        self.table(key)
            .ok_or_else(|| RelqError::UnknownTable(key.to_string()))
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Relations declared on `table`, in declaration order.
    pub fn relations(&self, table: &str) -> &[Relation] {
        self.relations
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn relation(&self, table: &str, name: &str) -> Option<&Relation> {
        self.relations(table).iter().find(|r| r.name == name)
    }

    /// Database table name to table key.
    pub fn tables_by_name(&self) -> &HashMap<CompactString, CompactString> {
        &self.tables_by_name
    }

    /// Table by database name.
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables_by_name
            .get(name)
            .and_then(|key| self.table(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{integer, text};
    use crate::foreign_key::{ForeignKeyBuilder, ReferenceActions};
    use crate::relation::{many, one};
    use relq_types::ReferentialAction;

    fn users() -> TableBuilder {
        TableBuilder::new("users")
            .column("id", integer().primary_key())
            .column("name", text().not_null())
            .column("invitedBy", integer())
    }

    fn posts() -> TableBuilder {
        TableBuilder::new("posts")
            .column("id", integer().primary_key())
            .column(
                "authorId",
                integer()
                    .not_null()
                    .references(("users", "id"), ReferenceActions::new()),
            )
            .column("title", text().not_null())
    }

    #[test]
    fn test_forward_and_mutual_references() {
        // posts is declared before users; users references posts back
        let schema = SchemaBuilder::new()
            .table(posts())
            .table(
                TableBuilder::new("users")
                    .column("id", integer().primary_key())
                    .column(
                        "pinnedPostId",
                        integer().references(
                            ("posts", "id"),
                            ReferenceActions::new().on_delete(ReferentialAction::SetNull),
                        ),
                    ),
            )
            .finalize()
            .unwrap();

        let post_fks = schema.table("posts").unwrap().foreign_keys();
        assert_eq!(post_fks.len(), 1);
        assert_eq!(post_fks[0].foreign_table(), "users");

        let user_fks = schema.table("users").unwrap().foreign_keys();
        assert_eq!(user_fks.len(), 1);
        assert_eq!(user_fks[0].on_delete(), Some(ReferentialAction::SetNull));
    }

    #[test]
    fn test_references_keep_declaration_order() {
        let schema = SchemaBuilder::new()
            .table(users())
            .table(TableBuilder::new("groups").column("id", integer().primary_key()))
            .table(
                TableBuilder::new("memberships")
                    .column(
                        "userId",
                        integer()
                            .references(("users", "id"), ReferenceActions::new())
                            .references(("groups", "id"), ReferenceActions::new()),
                    )
                    .foreign_key(
                        ForeignKeyBuilder::new(["userId"]).references("users", ["id"]),
                    ),
            )
            .finalize()
            .unwrap();

        let fks = schema.table("memberships").unwrap().foreign_keys();
        let targets: Vec<_> = fks.iter().map(|fk| fk.foreign_table()).collect();
        assert_eq!(targets, ["users", "groups", "users"]);
    }

    #[test]
    fn test_unresolved_reference_fails_finalize() {
        let err = SchemaBuilder::new()
            .table(posts())
            .finalize()
            .unwrap_err();
        assert!(matches!(err, RelqError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_duplicate_table() {
        let err = SchemaBuilder::new()
            .table(users())
            .table(users())
            .finalize()
            .unwrap_err();
        assert!(matches!(err, RelqError::DuplicateTable(ref t) if t == "users"));
    }

    #[test]
    fn test_relation_normalization() {
        let schema = SchemaBuilder::new()
            .table(users())
            .table(posts())
            .relations(
                "users",
                [
                    ("posts", many("posts")),
                    ("profilePost", one("posts")),
                ],
            )
            .relations(
                "posts",
                [("author", one("users").fields(["authorId"]).references(["id"]))],
            )
            .finalize()
            .unwrap();

        let author = schema.relation("posts", "author").unwrap();
        assert_eq!(author.kind(), RelationKind::One);
        assert_eq!(author.fields().collect::<Vec<_>>(), ["authorId"]);
        assert_eq!(author.references().collect::<Vec<_>>(), ["id"]);
        assert!(!author.is_nullable());

        let posts = schema.relation("users", "posts").unwrap();
        assert_eq!(posts.kind(), RelationKind::Many);
        assert_eq!(posts.fields().collect::<Vec<_>>(), ["id"]);
        assert_eq!(posts.references().collect::<Vec<_>>(), ["authorId"]);

        let reverse_one = schema.relation("users", "profilePost").unwrap();
        assert!(reverse_one.is_nullable());
        assert_eq!(reverse_one.references().collect::<Vec<_>>(), ["authorId"]);
    }

    #[test]
    fn test_many_falls_back_to_foreign_key() {
        let schema = SchemaBuilder::new()
            .table(users())
            .table(posts())
            .relations("users", [("posts", many("posts"))])
            .finalize()
            .unwrap();

        let rel = schema.relation("users", "posts").unwrap();
        assert_eq!(rel.fields().collect::<Vec<_>>(), ["id"]);
        assert_eq!(rel.references().collect::<Vec<_>>(), ["authorId"]);
    }

    #[test]
    fn test_ambiguous_many_needs_relation_name() {
        let reviews = TableBuilder::new("reviews")
            .column("id", integer().primary_key())
            .column("authorId", integer())
            .column("reviewerId", integer());
        let base = SchemaBuilder::new().table(users()).table(reviews).relations(
            "reviews",
            [
                (
                    "author",
                    one("users")
                        .fields(["authorId"])
                        .references(["id"])
                        .relation_name("written"),
                ),
                (
                    "reviewer",
                    one("users")
                        .fields(["reviewerId"])
                        .references(["id"])
                        .relation_name("reviewed"),
                ),
            ],
        );

        let err = base
            .clone()
            .relations("users", [("reviews", many("reviews"))])
            .finalize()
            .unwrap_err();
        assert!(matches!(err, RelqError::RelationResolution { .. }));

        let schema = base
            .relations(
                "users",
                [("reviewed", many("reviews").relation_name("reviewed"))],
            )
            .finalize()
            .unwrap();
        let rel = schema.relation("users", "reviewed").unwrap();
        assert_eq!(rel.references().collect::<Vec<_>>(), ["reviewerId"]);
    }

    #[test]
    fn test_tables_by_name() {
        let schema = SchemaBuilder::new()
            .table(users().name("app_users"))
            .finalize()
            .unwrap();
        assert_eq!(
            schema.tables_by_name().get("app_users").map(CompactString::as_str),
            Some("users")
        );
        assert_eq!(schema.table_by_name("app_users").unwrap().key(), "users");
        assert!(schema.relations("users").is_empty());
    }
}
