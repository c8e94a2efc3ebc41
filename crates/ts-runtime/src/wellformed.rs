use ts_core::{ScriptError, Stmt, StmtId, StmtTree};

/// One-shot structural pass run at script construction, before any
/// execution: every `break` needs an enclosing loop ancestor, and every
/// referenced child id must exist in the arena. Independent of runtime
/// values.
pub(crate) fn check_well_formed(tree: &StmtTree, root: StmtId) -> Result<(), ScriptError> {
    walk(tree, root, false)
}

fn walk(tree: &StmtTree, id: StmtId, in_loop: bool) -> Result<(), ScriptError> {
    let Some(stmt) = tree.get(id) else {
        return Err(ScriptError::new(
            "WELLFORMED_BAD_NODE",
            format!("Statement id {} is not part of this tree.", id.index()),
        ));
    };
    match stmt {
        Stmt::Sequence { children } => {
            for child in children {
                walk(tree, *child, in_loop)?;
            }
            Ok(())
        }
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            walk(tree, *then_branch, in_loop)?;
            if let Some(else_branch) = else_branch {
                walk(tree, *else_branch, in_loop)?;
            }
            Ok(())
        }
        Stmt::While { body, .. } | Stmt::ForEach { body, .. } => walk(tree, *body, true),
        Stmt::Break => {
            if in_loop {
                Ok(())
            } else {
                Err(ScriptError::new(
                    "WELLFORMED_BREAK_OUTSIDE_LOOP",
                    "A break statement needs an enclosing loop.",
                ))
            }
        }
        Stmt::Wait { .. }
        | Stmt::Skip
        | Stmt::Assign { .. }
        | Stmt::Action(_)
        | Stmt::Print(_) => Ok(()),
    }
}

#[cfg(test)]
mod wellformed_tests {
    use super::*;
    use ts_core::Expr;

    #[test]
    fn break_inside_either_loop_kind_is_accepted() {
        let mut tree = StmtTree::new();
        let brk = tree.break_stmt();
        let body = tree.sequence(vec![brk]);
        let while_loop = tree
            .while_loop(Expr::boolean(true), body)
            .expect("while should build");
        check_well_formed(&tree, while_loop).expect("break in while should pass");

        let mut tree = StmtTree::new();
        let brk = tree.break_stmt();
        let for_each = tree
            .for_each(
                "obj",
                ts_core::EntityKind::Any,
                None,
                None,
                ts_core::SortDirection::Ascending,
                brk,
            )
            .expect("for-each should build");
        check_well_formed(&tree, for_each).expect("break in for-each should pass");
    }

    #[test]
    fn unanchored_break_is_rejected() {
        let mut tree = StmtTree::new();
        let brk = tree.break_stmt();
        let error = check_well_formed(&tree, brk).expect_err("lone break should fail");
        assert_eq!(error.code, "WELLFORMED_BREAK_OUTSIDE_LOOP");

        // A conditional does not anchor a break either.
        let mut tree = StmtTree::new();
        let brk = tree.break_stmt();
        let guarded = tree
            .if_else(Expr::boolean(true), brk, None)
            .expect("if should build");
        let root = tree.sequence(vec![guarded]);
        let error = check_well_formed(&tree, root).expect_err("guarded break should fail");
        assert_eq!(error.code, "WELLFORMED_BREAK_OUTSIDE_LOOP");
    }

    #[test]
    fn foreign_statement_ids_are_rejected() {
        let mut other = StmtTree::new();
        other.skip();
        let foreign = other.skip();

        let tree = StmtTree::new();
        let error = check_well_formed(&tree, foreign).expect_err("foreign id should fail");
        assert_eq!(error.code, "WELLFORMED_BAD_NODE");
    }
}
