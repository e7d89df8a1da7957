//! `EXEC` statement text and its positional bindings.

use crate::types::{ProcedureName, SqlValue};

/// Build the `EXEC` text for `procedure` with one `@name = ?` assignment per parameter, in the
/// order given.
///
/// ```rust
/// use sproc_middleware::statement::build_statement;
///
/// assert_eq!(build_statement("proc", &["A", "B"]), "EXEC proc @A = ?, @B = ?");
/// assert_eq!(build_statement("dbo.purge", &[] as &[&str]), "EXEC dbo.purge");
/// ```
#[must_use]
pub fn build_statement<S: AsRef<str>>(procedure: &str, ordered_names: &[S]) -> String {
    let mut sql = String::with_capacity(5 + procedure.len() + ordered_names.len() * 12);
    sql.push_str("EXEC ");
    sql.push_str(procedure);

    for (idx, name) in ordered_names.iter().enumerate() {
        sql.push_str(if idx == 0 { " @" } else { ", @" });
        sql.push_str(name.as_ref());
        sql.push_str(" = ?");
    }
    sql
}

/// Statement text plus the values to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl BoundStatement {
    /// Pair the statement for `procedure` with already-coerced values.
    ///
    /// The order of `coerced` is the placeholder order.
    #[must_use]
    pub fn from_coerced(procedure: &ProcedureName, coerced: Vec<(String, SqlValue)>) -> Self {
        let (names, params): (Vec<String>, Vec<SqlValue>) = coerced.into_iter().unzip();
        Self {
            sql: build_statement(procedure.as_str(), &names),
            params,
        }
    }
}
