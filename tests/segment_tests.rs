// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_lens::segment::{code_line_starts, mask_literals, segment};

#[test]
fn test_splits_on_semicolons() {
    let statements = segment("SELECT 1; SELECT 2; SELECT 3;");
    assert_eq!(statements.len(), 3);
    assert!(statements.iter().all(|s| s.terminated));
    assert_eq!(statements[2].text, "SELECT 3");
    assert_eq!(
        statements.iter().map(|s| s.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn test_semicolon_inside_single_quotes() {
    let statements = segment("INSERT INTO t VALUES ('a;b'); SELECT 1;");
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].text, "INSERT INTO t VALUES ('a;b')");
}

#[test]
fn test_semicolon_inside_double_quotes() {
    let statements = segment("SELECT \"odd;name\" FROM t; SELECT 2");
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].text, "SELECT \"odd;name\" FROM t");
    assert!(!statements[1].terminated);
}

#[test]
fn test_doubled_quote_escape() {
    let statements = segment("SELECT 'it''s; fine' FROM t; SELECT 2;");
    assert_eq!(statements.len(), 2);
}

#[test]
fn test_semicolon_inside_comments() {
    let sql = "-- first; comment\nSELECT 1; /* block ; comment */ SELECT 2;";
    let statements = segment(sql);
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0].text, "SELECT 1");
    assert_eq!(statements[0].line, 2);
    assert_eq!(statements[1].text, "SELECT 2");
}

#[test]
fn test_comments_are_blanked_not_removed() {
    let statements = segment("SELECT a, /* note */ b FROM t;");
    let text = &statements[0].text;
    assert!(!text.contains("note"));
    assert_eq!(text.len(), "SELECT a, /* note */ b FROM t".len());
}

#[test]
fn test_multiline_block_comment_keeps_lines() {
    let statements = segment("/* header\n   spans lines */\nSELECT 1;");
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].line, 3);
    assert_eq!(statements[0].column, 1);
}

#[test]
fn test_empty_input() {
    assert!(segment("").is_empty());
    assert!(segment("   \n\t ").is_empty());
    assert!(segment(";;  ;").is_empty());
}

#[test]
fn test_comment_only_input() {
    assert!(segment("-- nothing here\n/* or here */").is_empty());
}

#[test]
fn test_trailing_fragment_without_terminator() {
    let statements = segment("SELECT 1;\n\nSELECT 2");
    assert_eq!(statements.len(), 2);
    assert!(statements[0].terminated);
    assert!(!statements[1].terminated);
    assert_eq!(statements[1].line, 3);
}

#[test]
fn test_unterminated_quote_swallows_rest() {
    let statements = segment("SELECT 'abc; SELECT 2;");
    assert_eq!(statements.len(), 1);
    assert!(!statements[0].terminated);
    assert_eq!(statements[0].text, "SELECT 'abc; SELECT 2;");
}

#[test]
fn test_statement_count_matches_terminators() {
    let corpus = [
        "SELECT 1",
        "SELECT 1;",
        "SELECT ';'; SELECT \";\";",
        "UPDATE t SET a = 1; DELETE FROM t WHERE id = 2; SELECT 3",
        "CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1);\n"
    ];
    for sql in corpus {
        let terminators = mask_literals(sql).matches(';').count();
        let count = segment(sql).len();
        assert!(
            count == terminators || count == terminators + 1,
            "{:?}: {} statements for {} terminators",
            sql,
            count,
            terminators
        );
    }
}

#[test]
fn test_masked_text_blanks_literals() {
    let statements = segment("SELECT * FROM t WHERE name = 'SELECT *';");
    let stmt = &statements[0];
    assert_eq!(stmt.masked.len(), stmt.text.len());
    assert_eq!(stmt.masked.matches("SELECT").count(), 1);
    assert!(stmt.masked.ends_with(&format!("'{}'", " ".repeat(8))));
}

#[test]
fn test_statement_span_and_offset() {
    let sql = "SELECT 1;\n  SELECT a,\n    b\n  FROM t;";
    let statements = segment(sql);
    let second = &statements[1];
    assert_eq!(second.line, 2);
    assert_eq!(second.column, 3);
    assert_eq!(second.end_line, 4);
    assert!(sql[second.offset..].starts_with("SELECT a,"));
}

#[test]
fn test_lines_are_numbered_from_statement_start() {
    let statements = segment("\nSELECT a\nFROM t\nWHERE x = 1;");
    let lines: Vec<(usize, &str)> = statements[0].lines().collect();
    assert_eq!(lines, vec![(2, "SELECT a"), (3, "FROM t"), (4, "WHERE x = 1")]);
    assert_eq!(statements[0].last_line(), "WHERE x = 1");
}

#[test]
fn test_crlf_input() {
    let statements = segment("SELECT a\r\nFROM t;\r\nSELECT 2;");
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[1].line, 2);
    let lines: Vec<&str> = statements[0].lines().map(|(_, l)| l).collect();
    assert_eq!(lines, vec!["SELECT a", "FROM t"]);
}

#[test]
fn test_code_line_starts() {
    let text = "SELECT 'a\nb' FROM t; /* x\ny */\n-- c\nSELECT \"q\n\";";
    assert_eq!(
        code_line_starts(text),
        vec![true, false, false, true, true, false]
    );
    assert_eq!(code_line_starts(""), vec![true]);
}
