pub const SQLITE_SCHEMA_SQL: &str = include_str!("../../sql/sqlite_schema.sql");

/// Bumped whenever `sqlite_schema.sql` changes shape.
pub const SCHEMA_VERSION: &str = "1";

/// Split a schema script into executable statements.
///
/// Whole-line `--` comments are dropped; `;` inside quotes does not split.
pub fn schema_statements(sql: &str) -> Vec<String> {
    let without_comments: String = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in without_comments.chars() {
        match (ch, quote) {
            ('\'' | '"', None) => quote = Some(ch),
            (c, Some(open)) if c == open => quote = None,
            (';', None) => {
                push_statement(&mut statements, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let stmt = raw.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_and_strips_comments() {
        let sql = "-- header\nCREATE TABLE a (x TEXT);\n\n-- second\nINSERT INTO a VALUES ('x;y');\n";
        let statements = schema_statements(sql);
        assert_eq!(
            statements,
            vec!["CREATE TABLE a (x TEXT)", "INSERT INTO a VALUES ('x;y')"]
        );
    }

    #[test]
    fn test_bundled_schema_has_all_tables() {
        let statements = schema_statements(SQLITE_SCHEMA_SQL);
        for table in ["_db_metadata", "item_progress", "user_learning_stats", "study_sessions"] {
            let needle = format!("CREATE TABLE IF NOT EXISTS \"{table}\"");
            assert!(
                statements.iter().any(|s| s.starts_with(&needle)),
                "missing table {table}"
            );
        }
        assert!(statements.iter().all(|s| !s.contains("--")));
    }
}
