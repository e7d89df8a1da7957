use std::borrow::Cow;

mod parsers;
mod scanner;

use scanner::placeholder_offsets;

/// Rewrite positional `?` placeholders into SQL Server RPC parameter names `@P1`, `@P2`, ...
///
/// Placeholders inside string literals, quoted or bracketed identifiers, and comments are left
/// alone. Returns a borrowed `Cow` when there is nothing to rewrite.
/// ```rust
/// use sproc_middleware::translation::translate_placeholders;
///
/// let sql = translate_placeholders("EXEC [who?] @A = ?, @B = ? -- why?");
/// assert_eq!(sql, "EXEC [who?] @A = @P1, @B = @P2 -- why?");
/// ```
#[must_use]
pub fn translate_placeholders(sql: &str) -> Cow<'_, str> {
    let offsets = placeholder_offsets(sql);
    if offsets.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + offsets.len() * 3);
    let mut copied = 0;
    for (n, offset) in offsets.into_iter().enumerate() {
        out.push_str(&sql[copied..offset]);
        out.push_str("@P");
        out.push_str(&(n + 1).to_string());
        copied = offset + 1;
    }
    out.push_str(&sql[copied..]);
    Cow::Owned(out)
}

/// Number of `?` placeholders [`translate_placeholders`] would rewrite.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    placeholder_offsets(sql).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_placeholders_in_order() {
        let sql = "EXEC dbo.p @A = ?, @B = ?, @C = ?";
        assert_eq!(
            translate_placeholders(sql),
            "EXEC dbo.p @A = @P1, @B = @P2, @C = @P3"
        );
        assert_eq!(count_placeholders(sql), 3);
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "EXEC p @A = ?, @B = N'it''s ?' /* ? /* ? */ ? */ -- ?\n, @C = ?";
        assert_eq!(
            translate_placeholders(sql),
            "EXEC p @A = @P1, @B = N'it''s ?' /* ? /* ? */ ? */ -- ?\n, @C = @P2"
        );
    }

    #[test]
    fn skips_quoted_identifiers() {
        let sql = r#"EXEC [odd]]?name] @x = ?, @y = "q?" "#;
        assert_eq!(
            translate_placeholders(sql),
            r#"EXEC [odd]]?name] @x = @P1, @y = "q?" "#
        );
    }

    #[test]
    fn leaves_non_ascii_intact() {
        let sql = "EXEC sp_Ændring @Navn = ?";
        assert_eq!(translate_placeholders(sql), "EXEC sp_Ændring @Navn = @P1");
    }

    #[test]
    fn borrows_when_nothing_to_rewrite() {
        let sql = "EXEC dbo.sp_UpdatePurgeMarker";
        assert!(matches!(translate_placeholders(sql), Cow::Borrowed(_)));
    }
}
