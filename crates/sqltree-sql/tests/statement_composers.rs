//! End-to-end statement construction through [`build_statement`].

mod common;

use common::{assignment, column_ref, expr_of, int_column, relation, simple_select, sort_columns, tbl};
use sqltree_sql::ast::{
    AlterTableActionKind, Expression, PartitionStrategy, RefreshMode, Statement, TableElement,
};
use sqltree_sql::{build_statement, CstNode, Error, Rule, TokenKind};

fn literal_text(expr: &Expression) -> &str {
    match expr {
        Expression::Const(c) => &c.value,
        other => panic!("expected a literal, got {other:?}"),
    }
}

#[test]
fn insert_values_with_on_duplicate_update() {
    let values = CstNode::new(Rule::ValuesClause).with_node(
        CstNode::new(Rule::ValuesRowList).with_node(
            CstNode::new(Rule::RowValue)
                .with_node(expr_of("1"))
                .with_node(expr_of("2")),
        ),
    );
    let node = CstNode::new(Rule::InsertStmt)
        .with_node(
            CstNode::new(Rule::SingleTableInsert)
                .with_node(
                    CstNode::new(Rule::InsertTableClause)
                        .with_node(relation("t"))
                        .with_node(
                            CstNode::new(Rule::ColumnList)
                                .with_node(column_ref(&["a"]))
                                .with_node(column_ref(&["b"])),
                        ),
                )
                .with_node(values),
        )
        .with_token(TokenKind::Duplicate, "DUPLICATE")
        .with_node(CstNode::new(Rule::UpdateAsgnList).with_node(assignment("a", "9")));
    let statement = build_statement(&node).unwrap();
    let Statement::Insert(insert) = statement else {
        panic!("expected an insert");
    };
    assert_eq!(insert.table.relation, "t");
    assert_eq!(insert.columns.len(), 2);
    assert_eq!(insert.rows.len(), 1);
    assert_eq!(literal_text(&insert.rows[0][1]), "2");
    assert_eq!(insert.on_duplicate.len(), 1);
    assert_eq!(insert.on_duplicate[0].column.column, "a");
    assert!(insert.assignments.is_empty());
}

#[test]
fn update_keeps_assignment_source_order() {
    let node = CstNode::new(Rule::UpdateStmt)
        .with_node(CstNode::new(Rule::TableReferences).with_node(tbl("t")))
        .with_node(
            CstNode::new(Rule::UpdateAsgnList)
                .with_node(assignment("a", "1"))
                .with_node(assignment("b", "2"))
                .with_node(assignment("a", "3")),
        );
    let Statement::Update(update) = build_statement(&node).unwrap() else {
        panic!("expected an update");
    };
    let order: Vec<(&str, &str)> = update
        .assignments
        .iter()
        .map(|a| (a.column.column.as_str(), literal_text(&a.value)))
        .collect();
    assert_eq!(order, [("a", "1"), ("b", "2"), ("a", "3")]);
}

#[test]
fn multi_table_delete_keeps_targets_and_froms_apart() {
    let targets = CstNode::new(Rule::MultiDeleteTable).with_node(
        CstNode::new(Rule::RelationWithStarList)
            .with_node(
                CstNode::new(Rule::RelationWithStar)
                    .with_node(relation("a"))
                    .with_token(TokenKind::Star, "*"),
            )
            .with_node(CstNode::new(Rule::RelationWithStar).with_node(relation("b"))),
    );
    let node = CstNode::new(Rule::DeleteStmt)
        .with_node(targets)
        .with_node(
            CstNode::new(Rule::TableReferences)
                .with_node(tbl("a"))
                .with_node(tbl("b"))
                .with_node(tbl("c")),
        );
    let Statement::Delete(delete) = build_statement(&node).unwrap() else {
        panic!("expected a delete");
    };
    assert_eq!(delete.targets.len(), 2);
    assert!(delete.targets[0].star);
    assert_eq!(delete.froms.len(), 3);
}

#[test]
fn create_table_with_constraint_and_partition() {
    let primary = CstNode::new(Rule::OutOfLinePrimaryIndex)
        .with_token(TokenKind::Primary, "PRIMARY")
        .with_token(TokenKind::Key, "KEY")
        .with_node(sort_columns(&["id"]));
    let partition = CstNode::new(Rule::PartitionOption).with_node(
        CstNode::new(Rule::HashPartitionOption)
            .with_token(TokenKind::Hash, "HASH")
            .with_node(expr_of("4"))
            .with_node(CstNode::new(Rule::PartitionCount).with_token(TokenKind::IntNum, "8")),
    );
    let node = CstNode::new(Rule::CreateTableStmt)
        .with_node(relation("t"))
        .with_node(
            CstNode::new(Rule::TableElementList)
                .with_node(int_column("id"))
                .with_node(primary),
        )
        .with_node(partition);
    let Statement::CreateTable(create) = build_statement(&node).unwrap() else {
        panic!("expected a create table");
    };
    assert_eq!(create.elements.len(), 2);
    assert!(matches!(create.elements[0], TableElement::Column(_)));
    assert!(matches!(create.elements[1], TableElement::Constraint(_)));
    let partition = create.partition.unwrap();
    assert_eq!(partition.strategy, PartitionStrategy::Hash);
    assert_eq!(partition.partition_count, Some(8));
}

#[test]
fn alter_table_preserves_action_order() {
    let node = CstNode::new(Rule::AlterTableStmt)
        .with_node(relation("t"))
        .with_node(
            CstNode::new(Rule::AlterTableAction).with_node(
                CstNode::new(Rule::AlterColumnOption)
                    .with_token(TokenKind::Add, "ADD")
                    .with_node(int_column("c")),
            ),
        )
        .with_node(
            CstNode::new(Rule::AlterTableAction).with_node(
                CstNode::new(Rule::AlterIndexOption)
                    .with_token(TokenKind::Drop, "DROP")
                    .with_token(TokenKind::Index, "INDEX")
                    .with_node(
                        CstNode::new(Rule::IndexName).with_token(TokenKind::Identifier, "idx"),
                    ),
            ),
        )
        .with_node(
            CstNode::new(Rule::AlterTableAction).with_node(
                CstNode::new(Rule::RenameTableAction)
                    .with_token(TokenKind::Rename, "RENAME")
                    .with_node(relation("t2")),
            ),
        );
    let Statement::AlterTable(alter) = build_statement(&node).unwrap() else {
        panic!("expected an alter table");
    };
    assert_eq!(alter.table.relation, "t");
    assert!(matches!(
        alter.actions[0].kind,
        AlterTableActionKind::AddColumns(_)
    ));
    assert!(matches!(
        alter.actions[1].kind,
        AlterTableActionKind::DropIndex { ref name } if name == "idx"
    ));
    assert!(matches!(
        alter.actions[2].kind,
        AlterTableActionKind::RenameTo(ref to) if to.relation == "t2"
    ));
}

#[test]
fn drop_rename_truncate_and_index_statements() {
    let drop = CstNode::new(Rule::DropTableStmt)
        .with_token(TokenKind::If, "IF")
        .with_node(
            CstNode::new(Rule::TableList)
                .with_node(relation("a"))
                .with_node(relation("b")),
        );
    let Statement::DropTable(drop) = build_statement(&drop).unwrap() else {
        panic!("expected a drop table");
    };
    assert!(drop.if_exists);
    assert_eq!(drop.tables.len(), 2);

    let rename = CstNode::new(Rule::RenameTableStmt).with_node(
        CstNode::new(Rule::RenameTableAction)
            .with_node(relation("a"))
            .with_node(relation("b")),
    );
    let Statement::RenameTable(rename) = build_statement(&rename).unwrap() else {
        panic!("expected a rename table");
    };
    assert_eq!(rename.actions[0].from.relation, "a");
    assert_eq!(rename.actions[0].to.relation, "b");

    let truncate = CstNode::new(Rule::TruncateTableStmt).with_node(relation("t"));
    let Statement::TruncateTable(truncate) = build_statement(&truncate).unwrap() else {
        panic!("expected a truncate");
    };
    assert_eq!(truncate.table.relation, "t");

    let create_index = CstNode::new(Rule::CreateIndexStmt)
        .with_token(TokenKind::Unique, "UNIQUE")
        .with_node(CstNode::new(Rule::IndexName).with_token(TokenKind::Identifier, "idx"))
        .with_node(relation("t"))
        .with_node(sort_columns(&["a", "b"]));
    let Statement::CreateIndex(create_index) = build_statement(&create_index).unwrap() else {
        panic!("expected a create index");
    };
    assert!(create_index.unique);
    assert_eq!(create_index.columns.len(), 2);

    let drop_index = CstNode::new(Rule::DropIndexStmt)
        .with_node(CstNode::new(Rule::IndexName).with_token(TokenKind::Identifier, "idx"))
        .with_node(relation("t"));
    let Statement::DropIndex(drop_index) = build_statement(&drop_index).unwrap() else {
        panic!("expected a drop index");
    };
    assert_eq!(drop_index.index.relation, "idx");
    assert_eq!(drop_index.table.relation, "t");
}

#[test]
fn materialized_view_with_never_refresh() {
    let node = CstNode::new(Rule::CreateMviewStmt)
        .with_node(relation("mv"))
        .with_node(
            CstNode::new(Rule::MviewRefreshClause)
                .with_token(TokenKind::Never, "NEVER")
                .with_token(TokenKind::Refresh, "REFRESH"),
        )
        .with_node(simple_select("1"));
    let Statement::CreateMaterializedView(view) = build_statement(&node).unwrap() else {
        panic!("expected a materialized view");
    };
    assert_eq!(view.view.relation, "mv");
    let refresh = view.refresh.unwrap();
    assert_eq!(refresh.mode, RefreshMode::Never);
    assert!(refresh.start_with.is_none());
    assert!(refresh.next.is_none());
}

#[test]
fn insert_without_any_value_source_is_rejected() {
    let node = CstNode::new(Rule::InsertStmt).with_node(
        CstNode::new(Rule::SingleTableInsert)
            .with_node(CstNode::new(Rule::InsertTableClause).with_node(relation("t"))),
    );
    match build_statement(&node) {
        Err(Error::StructuralInconsistency { .. }) => {}
        other => panic!("expected a structural error, got {other:?}"),
    }
}
