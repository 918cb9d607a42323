//! Best-effort metadata recovery from `CREATE TABLE` text
//!
//! Some backends (SQLite in particular) keep no structured record of column
//! collations, column comments or declared constraint names; the original
//! `CREATE TABLE` statement is the only source. This module lexes that text
//! with a small state machine and reads the column definitions back out.
//!
//! Column names are matched as whole identifiers, ASCII case-insensitively,
//! so asking for column `b` never picks up the definition of `bb`.
//!
//! None of these functions fail: unparseable, truncated or unterminated
//! input yields `None` or an empty list.

use serde::{Deserialize, Serialize};

/// Keywords that open a table-level constraint instead of a column definition
const TABLE_CONSTRAINT_KEYWORDS: [&str; 9] = [
    "CONSTRAINT", "PRIMARY", "UNIQUE", "CHECK", "FOREIGN", "KEY", "INDEX", "FULLTEXT", "SPATIAL",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    /// Inside a quoted identifier or string literal, until the given character
    InQuote(char),
    InLineComment,
    InBlockComment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Word(String),
    /// `"…"`, `` `…` `` or `[…]`, unescaped
    Quoted(String),
    /// `'…'`, unescaped
    Literal(String),
    Open,
    Close,
    Comma,
    Comment(String),
    Symbol(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    kind: TokenKind,
    /// Parenthesis depth; an opening parenthesis carries the depth outside it
    depth: usize,
}

impl Token {
    fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(word) => Some(word),
            _ => None,
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        self.word().is_some_and(|word| word.eq_ignore_ascii_case(keyword))
    }

    fn identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(text) | TokenKind::Quoted(text) | TokenKind::Literal(text) => Some(text),
            _ => None,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn tokenize(ddl: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut state = State::Outside;
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut chars = ddl.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Outside => {
                if is_word_char(c) {
                    buf.push(c);
                    continue;
                }
                if !buf.is_empty() {
                    tokens.push(Token {
                        kind: TokenKind::Word(std::mem::take(&mut buf)),
                        depth,
                    });
                }

                let kind = match c {
                    '-' if chars.peek() == Some(&'-') => {
                        chars.next();
                        state = State::InLineComment;
                        continue;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        state = State::InBlockComment;
                        continue;
                    }
                    '"' | '`' | '\'' => {
                        state = State::InQuote(c);
                        continue;
                    }
                    '[' => {
                        state = State::InQuote(']');
                        continue;
                    }
                    c if c.is_whitespace() => continue,
                    '(' => {
                        depth += 1;
                        tokens.push(Token {
                            kind: TokenKind::Open,
                            depth: depth - 1,
                        });
                        continue;
                    }
                    ')' => {
                        depth = depth.saturating_sub(1);
                        TokenKind::Close
                    }
                    ',' => TokenKind::Comma,
                    other => TokenKind::Symbol(other),
                };
                tokens.push(Token { kind, depth });
            }
            State::InQuote(close) => {
                if c != close {
                    buf.push(c);
                } else if chars.peek() == Some(&close) {
                    chars.next();
                    buf.push(close);
                } else {
                    let text = std::mem::take(&mut buf);
                    let kind = if close == '\'' {
                        TokenKind::Literal(text)
                    } else {
                        TokenKind::Quoted(text)
                    };
                    tokens.push(Token { kind, depth });
                    state = State::Outside;
                }
            }
            State::InLineComment => {
                if c == '\n' {
                    tokens.push(Token {
                        kind: TokenKind::Comment(std::mem::take(&mut buf)),
                        depth,
                    });
                    state = State::Outside;
                } else {
                    buf.push(c);
                }
            }
            State::InBlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Outside;
                }
            }
        }
    }

    match state {
        State::Outside if !buf.is_empty() => tokens.push(Token {
            kind: TokenKind::Word(buf),
            depth,
        }),
        State::InLineComment => tokens.push(Token {
            kind: TokenKind::Comment(buf),
            depth,
        }),
        // unterminated quote or block comment
        _ => {}
    }
    tokens
}

/// One comma-separated entry of the table body
#[derive(Debug, Default)]
struct Segment {
    tokens: Vec<Token>,
    comments: Vec<String>,
}

impl Segment {
    fn is_table_constraint(&self) -> bool {
        self.tokens.first().is_some_and(|token| {
            TABLE_CONSTRAINT_KEYWORDS
                .iter()
                .any(|keyword| token.is_keyword(keyword))
        })
    }

    fn column_name(&self) -> Option<&str> {
        if self.is_table_constraint() {
            return None;
        }
        self.tokens.first().and_then(Token::identifier)
    }

    fn collation(&self) -> Option<String> {
        self.tokens
            .windows(2)
            .find(|pair| pair[0].depth == 1 && pair[0].is_keyword("COLLATE"))
            .and_then(|pair| pair[1].identifier())
            .map(str::to_string)
    }

    fn comment(&self) -> Option<String> {
        join_comments(&self.comments)
    }
}

struct TableDefinition {
    header_comments: Vec<String>,
    segments: Vec<Segment>,
}

impl TableDefinition {
    fn column(&self, column: &str) -> Option<&Segment> {
        let wanted = unquote(column);
        self.segments.iter().find(|segment| {
            segment
                .column_name()
                .is_some_and(|name| name.eq_ignore_ascii_case(&wanted))
        })
    }
}

fn parse_table(ddl: &str) -> Option<TableDefinition> {
    let tokens = tokenize(ddl);
    let open = tokens
        .iter()
        .position(|token| token.kind == TokenKind::Open && token.depth == 0)?;

    let header_comments = tokens[..open]
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Comment(text) => Some(text.clone()),
            _ => None,
        })
        .collect();

    let mut segments: Vec<Segment> = Vec::new();
    let mut current = Segment::default();
    for token in &tokens[open + 1..] {
        match &token.kind {
            TokenKind::Close if token.depth == 0 => break,
            TokenKind::Comma if token.depth == 1 => {
                segments.push(std::mem::take(&mut current));
            }
            TokenKind::Comment(text) => {
                // Comment lines between a separating comma and the next entry trail the previous one
                match segments.last_mut() {
                    Some(previous) if current.tokens.is_empty() => {
                        previous.comments.push(text.clone())
                    }
                    _ => current.comments.push(text.clone()),
                }
            }
            _ => current.tokens.push(token.clone()),
        }
    }
    segments.push(current);

    Some(TableDefinition {
        header_comments,
        segments,
    })
}

fn join_comments(lines: &[String]) -> Option<String> {
    let joined = lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_string())
    }
}

/// Strip one level of identifier quoting from a requested name
fn unquote(name: &str) -> String {
    let name = name.trim();
    for (open, close) in [('"', '"'), ('`', '`'), ('[', ']')] {
        if name.len() >= 2 && name.starts_with(open) && name.ends_with(close) {
            let doubled: String = [close, close].iter().collect();
            return name[1..name.len() - 1].replace(&doubled, &close.to_string());
        }
    }
    name.to_string()
}

/// Metadata recovered for one column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub collation: Option<String>,
    pub comment: Option<String>,
}

impl ColumnMetadata {
    /// Type hint embedded in the comment, e.g. `json` for `(DC2Type:json)`
    pub fn type_hint(&self) -> Option<&str> {
        self.comment.as_deref().and_then(extract_type_hint)
    }
}

/// Collation declared for `column`, with quotes stripped
pub fn parse_column_collation(column: &str, ddl: &str) -> Option<String> {
    let table = parse_table(ddl)?;
    table.column(column)?.collation()
}

/// Line comment attached to `column`'s definition
///
/// Multiple comment lines are trimmed and joined with `\n`.
pub fn parse_column_comment(column: &str, ddl: &str) -> Option<String> {
    let table = parse_table(ddl)?;
    table.column(column)?.comment()
}

/// Collation and comment of `column`, or `None` if the column isn't defined
pub fn parse_column_metadata(column: &str, ddl: &str) -> Option<ColumnMetadata> {
    let table = parse_table(ddl)?;
    let segment = table.column(column)?;
    Some(ColumnMetadata {
        collation: segment.collation(),
        comment: segment.comment(),
    })
}

/// Comment placed between the table name and its column list
pub fn parse_table_comment(ddl: &str) -> Option<String> {
    join_comments(&parse_table(ddl)?.header_comments)
}

/// Extract the name from a `(<prefix>Type:<name>)` marker
pub fn extract_type_hint(comment: &str) -> Option<&str> {
    for (index, marker) in comment.match_indices("Type:") {
        let prefix = comment[..index].trim_end_matches(|c: char| c.is_ascii_alphanumeric());
        if !prefix.ends_with('(') {
            continue;
        }
        let rest = &comment[index + marker.len()..];
        if let Some(end) = rest.find(')') {
            let name = rest[..end].trim();
            if !name.is_empty() {
                return Some(name);
            }
        }
    }
    None
}

/// Kind of a declared constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Unique,
    ForeignKey {
        foreign_table: String,
        /// Empty when the reference targets the primary key implicitly
        foreign_columns: Vec<String>,
    },
}

/// A constraint as written in `CREATE TABLE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintDefinition {
    /// Name given with `CONSTRAINT <name>`, if any
    pub name: Option<String>,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    pub deferrable: bool,
    pub initially_deferred: bool,
}

/// Identifiers of a parenthesized list starting at `open`, and the index after it
///
/// Only the leading identifier of each entry is kept, so `(a COLLATE NOCASE, b DESC)`
/// yields `a` and `b`.
fn identifier_list(tokens: &[Token], open: usize) -> (Vec<String>, usize) {
    let mut identifiers = Vec::new();
    let Some(depth) = tokens.get(open).map(|token| token.depth) else {
        return (identifiers, open);
    };

    let mut expecting = true;
    let mut i = open + 1;
    while let Some(token) = tokens.get(i) {
        match token.kind {
            TokenKind::Close if token.depth == depth => return (identifiers, i + 1),
            TokenKind::Comma if token.depth == depth + 1 => expecting = true,
            _ if expecting && token.depth == depth + 1 => {
                if let Some(identifier) = token.identifier() {
                    identifiers.push(identifier.to_string());
                }
                expecting = false;
            }
            _ => {}
        }
        i += 1;
    }
    (identifiers, i)
}

/// `REFERENCES <table> [(<columns>)]` starting at `start`
fn references_clause(tokens: &[Token], start: usize) -> Option<(String, Vec<String>, usize)> {
    if !tokens.get(start)?.is_keyword("REFERENCES") {
        return None;
    }
    let mut i = start + 1;
    let mut table = tokens.get(i)?.identifier()?.to_string();
    i += 1;
    // schema-qualified name
    while tokens.get(i).is_some_and(|t| t.kind == TokenKind::Symbol('.')) {
        table = tokens.get(i + 1)?.identifier()?.to_string();
        i += 2;
    }

    let mut columns = Vec::new();
    if tokens.get(i).is_some_and(|t| t.kind == TokenKind::Open) {
        let (list, end) = identifier_list(tokens, i);
        columns = list;
        i = end;
    }
    Some((table, columns, i))
}

fn keyword_at(tokens: &[Token], index: usize, keyword: &str) -> bool {
    tokens.get(index).is_some_and(|token| token.is_keyword(keyword))
}

/// `[NOT] DEFERRABLE [INITIALLY DEFERRED | INITIALLY IMMEDIATE]` after a constraint clause
///
/// Foreign key actions (`ON DELETE …`, `MATCH …`) may precede it.
fn deferral_clause(tokens: &[Token], start: usize) -> (bool, bool) {
    let mut deferrable = false;
    let mut initially_deferred = false;
    let mut i = start;

    while let Some(token) = tokens.get(i) {
        let Some(word) = token.word() else { break };
        match word.to_ascii_uppercase().as_str() {
            "DEFERRABLE" => deferrable = true,
            "NOT" if keyword_at(tokens, i + 1, "DEFERRABLE") => {
                deferrable = false;
                i += 1;
            }
            "INITIALLY" => {
                initially_deferred = keyword_at(tokens, i + 1, "DEFERRED");
                i += 1;
            }
            "ON" => {
                let two_word_action =
                    keyword_at(tokens, i + 2, "SET") || keyword_at(tokens, i + 2, "NO");
                i += if two_word_action { 3 } else { 2 };
            }
            "MATCH" => i += 1,
            _ => break,
        }
        i += 1;
    }
    (deferrable, deferrable && initially_deferred)
}

fn table_constraint(segment: &Segment) -> Option<ConstraintDefinition> {
    let tokens = &segment.tokens;
    let mut name = None;
    let mut i = 0;
    if tokens.first()?.is_keyword("CONSTRAINT") {
        name = tokens.get(1)?.identifier().map(str::to_string);
        i = 2;
    }

    let head = tokens.get(i)?;
    let is_unique = head.is_keyword("UNIQUE");
    if !is_unique && !head.is_keyword("FOREIGN") {
        return None;
    }
    let open = i + tokens[i..]
        .iter()
        .position(|token| token.kind == TokenKind::Open)?;
    let (columns, end) = identifier_list(tokens, open);

    let (kind, end) = if is_unique {
        (ConstraintKind::Unique, end)
    } else {
        let (foreign_table, foreign_columns, end) = references_clause(tokens, end)?;
        (
            ConstraintKind::ForeignKey {
                foreign_table,
                foreign_columns,
            },
            end,
        )
    };
    let (deferrable, initially_deferred) = deferral_clause(tokens, end);

    Some(ConstraintDefinition {
        name,
        kind,
        columns,
        deferrable,
        initially_deferred,
    })
}

fn column_constraints(segment: &Segment, column: &str, found: &mut Vec<ConstraintDefinition>) {
    let tokens = &segment.tokens;
    let mut pending_name: Option<String> = None;
    let mut i = 1;

    while let Some(token) = tokens.get(i) {
        if token.depth != 1 {
            i += 1;
            continue;
        }
        let name = pending_name.take();

        if token.is_keyword("CONSTRAINT") {
            pending_name = tokens
                .get(i + 1)
                .and_then(Token::identifier)
                .map(str::to_string);
            i += 2;
        } else if token.is_keyword("UNIQUE") {
            let (deferrable, initially_deferred) = deferral_clause(tokens, i + 1);
            found.push(ConstraintDefinition {
                name,
                kind: ConstraintKind::Unique,
                columns: vec![column.to_string()],
                deferrable,
                initially_deferred,
            });
            i += 1;
        } else if let Some((foreign_table, foreign_columns, end)) = references_clause(tokens, i) {
            let (deferrable, initially_deferred) = deferral_clause(tokens, end);
            found.push(ConstraintDefinition {
                name,
                kind: ConstraintKind::ForeignKey {
                    foreign_table,
                    foreign_columns,
                },
                columns: vec![column.to_string()],
                deferrable,
                initially_deferred,
            });
            i = end;
        } else {
            i += 1;
        }
    }
}

/// Unique and foreign key constraints declared in `CREATE TABLE` text
///
/// Both table-level (`UNIQUE (a, b)`, `FOREIGN KEY (a) REFERENCES t (b)`) and
/// column-level (`a TEXT UNIQUE`, `a INTEGER REFERENCES t (b)`) forms are
/// recognized, in declaration order.
pub fn parse_table_constraints(ddl: &str) -> Vec<ConstraintDefinition> {
    let mut found = Vec::new();
    let Some(table) = parse_table(ddl) else {
        return found;
    };

    for segment in &table.segments {
        if segment.is_table_constraint() {
            found.extend(table_constraint(segment));
        } else if let Some(column) = segment.column_name() {
            column_constraints(segment, column, &mut found);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collation_of_quoted_column() {
        let ddl = r#"CREATE TABLE "a" ("a" text COLLATE "RTRIM" NOT NULL)"#;
        assert_eq!(parse_column_collation("a", ddl).as_deref(), Some("RTRIM"));
    }

    #[test]
    fn test_collation_ignores_prefix_column() {
        let ddl = "CREATE TABLE \"a\" (bb TEXT COLLATE RTRIM, b VARCHAR(42) NOT NULL COLLATE BINARY)";
        assert_eq!(parse_column_collation("b", ddl).as_deref(), Some("BINARY"));
        assert_eq!(parse_column_collation("bb", ddl).as_deref(), Some("RTRIM"));
        assert_eq!(parse_column_collation("B", ddl).as_deref(), Some("BINARY"));
        assert_eq!(parse_column_collation("c", ddl), None);
    }

    #[test]
    fn test_collation_absent() {
        let ddl = "CREATE TABLE t (a INTEGER, b TEXT)";
        assert_eq!(parse_column_collation("a", ddl), None);
    }

    #[test]
    fn test_quoted_names_with_commas_and_doubled_quotes() {
        let ddl = r#"CREATE TABLE t ("a,b" TEXT COLLATE NOCASE, "x""y" TEXT COLLATE "BIN""ARY", [c d] TEXT COLLATE RTRIM)"#;
        assert_eq!(parse_column_collation("a,b", ddl).as_deref(), Some("NOCASE"));
        assert_eq!(parse_column_collation("x\"y", ddl).as_deref(), Some("BIN\"ARY"));
        assert_eq!(parse_column_collation("\"x\"\"y\"", ddl).as_deref(), Some("BIN\"ARY"));
        assert_eq!(parse_column_collation("c d", ddl).as_deref(), Some("RTRIM"));
    }

    #[test]
    fn test_comment_not_taken_from_prefix_column() {
        let ddl = "CREATE TABLE \"a\" (\"bb\" CLOB DEFAULT NULL --(DC2Type:array)\n, \"b\" CLOB DEFAULT NULL)";
        assert_eq!(parse_column_comment("b", ddl), None);
        assert_eq!(
            parse_column_comment("bb", ddl).as_deref(),
            Some("(DC2Type:array)")
        );
    }

    #[test]
    fn test_comment_after_separating_comma() {
        let ddl = "CREATE TABLE user (\n  id INTEGER NOT NULL, -- primary id\n  data CLOB -- (DC2Type:json)\n)";
        assert_eq!(parse_column_comment("id", ddl).as_deref(), Some("primary id"));
        let metadata = parse_column_metadata("data", ddl).expect("column exists");
        assert_eq!(metadata.comment.as_deref(), Some("(DC2Type:json)"));
        assert_eq!(metadata.type_hint(), Some("json"));
        assert_eq!(metadata.collation, None);
    }

    #[test]
    fn test_multiline_comment() {
        let ddl = "CREATE TABLE t (\n  a TEXT -- first line\n  -- second line\n, b TEXT)";
        assert_eq!(
            parse_column_comment("a", ddl).as_deref(),
            Some("first line\nsecond line")
        );
    }

    #[test]
    fn test_comment_continuation_stays_with_previous_column() {
        let ddl = "CREATE TABLE t (\n  a INTEGER, -- first line of a\n  -- second line of a\n  b INTEGER\n)";
        assert_eq!(
            parse_column_comment("a", ddl).as_deref(),
            Some("first line of a\nsecond line of a")
        );
        assert_eq!(parse_column_comment("b", ddl), None);
    }

    #[test]
    fn test_comment_line_after_comma_belongs_to_previous_column() {
        let ddl = "CREATE TABLE t (\n  a INTEGER,\n  -- (DC2Type:json)\n  b INTEGER\n)";
        assert_eq!(
            parse_column_metadata("a", ddl).and_then(|m| m.type_hint().map(str::to_string)),
            Some("json".to_string())
        );
        let b = parse_column_metadata("b", ddl).expect("column exists");
        assert_eq!(b.comment, None);
        assert_eq!(b.type_hint(), None);
    }

    #[test]
    fn test_table_comment() {
        let ddl = "CREATE TABLE t -- audit log\n(a TEXT)";
        assert_eq!(parse_table_comment(ddl).as_deref(), Some("audit log"));
        assert_eq!(parse_table_comment("CREATE TABLE t (a TEXT)"), None);
    }

    #[test]
    fn test_keywords_inside_strings_are_ignored() {
        let ddl = "CREATE TABLE t (a TEXT DEFAULT 'x COLLATE y, b', b TEXT COLLATE NOCASE)";
        assert_eq!(parse_column_collation("a", ddl), None);
        assert_eq!(parse_column_collation("b", ddl).as_deref(), Some("NOCASE"));
    }

    #[test]
    fn test_table_constraints_are_not_columns() {
        let ddl = "CREATE TABLE t (a TEXT, UNIQUE (a), CONSTRAINT pk PRIMARY KEY (a))";
        assert!(parse_column_metadata("unique", ddl).is_none());
        assert!(parse_column_metadata("constraint", ddl).is_none());
        assert!(parse_column_metadata("a", ddl).is_some());
    }

    #[test]
    fn test_mysql_index_entries_are_not_columns() {
        let ddl = "CREATE TABLE `t` (\n  `code` varchar(10) COLLATE utf8mb4_bin,\n  `body` text,\n  \
                   PRIMARY KEY (`code`),\n  KEY `idx_body` (`body`(32)),\n  INDEX `idx_code` (`code`),\n  \
                   FULLTEXT KEY `ft_body` (`body`),\n  SPATIAL INDEX `sp` (`body`)\n) ENGINE=InnoDB";
        for entry in ["KEY", "INDEX", "FULLTEXT", "SPATIAL"] {
            assert!(parse_column_metadata(entry, ddl).is_none(), "{}", entry);
        }
        assert_eq!(parse_column_collation("code", ddl).as_deref(), Some("utf8mb4_bin"));
        assert!(parse_column_metadata("body", ddl).is_some());
        assert!(parse_table_constraints(ddl).is_empty());
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(parse_column_collation("a", ""), None);
        assert_eq!(parse_column_collation("a", "CREATE TABLE"), None);
        assert_eq!(parse_column_collation("a", "CREATE TABLE t (a TEXT COLLATE"), None);
        assert_eq!(parse_column_comment("a", "CREATE TABLE t (\"a"), None);
        assert_eq!(parse_column_collation("a", "))))(((("), None);
        assert!(parse_table_constraints("CREATE TABLE t (CONSTRAINT").is_empty());
    }

    #[test]
    fn test_truncated_input_keeps_complete_columns() {
        let ddl = "CREATE TABLE t (a TEXT COLLATE NOCASE, b TEXT COLLATE";
        assert_eq!(parse_column_collation("a", ddl).as_deref(), Some("NOCASE"));
        assert_eq!(parse_column_collation("b", ddl), None);
    }

    #[test]
    fn test_extract_type_hint() {
        assert_eq!(extract_type_hint("(DC2Type:json)"), Some("json"));
        assert_eq!(extract_type_hint("user data (DC2Type:datetime_immutable)"), Some("datetime_immutable"));
        assert_eq!(extract_type_hint("(Type:uuid)"), Some("uuid"));
        assert_eq!(extract_type_hint("Type:json"), None);
        assert_eq!(extract_type_hint("(DC2Type:)"), None);
        assert_eq!(extract_type_hint("plain comment"), None);
    }

    #[test]
    fn test_table_level_constraints() {
        let ddl = "CREATE TABLE child (\n  id INTEGER PRIMARY KEY,\n  parent_id INTEGER,\n  code TEXT,\n  CONSTRAINT uniq_code UNIQUE (code, parent_id),\n  CONSTRAINT fk_parent FOREIGN KEY (parent_id) REFERENCES parent (id) ON DELETE SET NULL DEFERRABLE INITIALLY DEFERRED\n)";
        let constraints = parse_table_constraints(ddl);
        assert_eq!(constraints.len(), 2);

        assert_eq!(constraints[0].name.as_deref(), Some("uniq_code"));
        assert_eq!(constraints[0].kind, ConstraintKind::Unique);
        assert_eq!(constraints[0].columns, vec!["code", "parent_id"]);
        assert!(!constraints[0].deferrable);

        assert_eq!(constraints[1].name.as_deref(), Some("fk_parent"));
        assert_eq!(
            constraints[1].kind,
            ConstraintKind::ForeignKey {
                foreign_table: "parent".to_string(),
                foreign_columns: vec!["id".to_string()],
            }
        );
        assert!(constraints[1].deferrable);
        assert!(constraints[1].initially_deferred);
    }

    #[test]
    fn test_column_level_constraints() {
        let ddl = "CREATE TABLE t (email TEXT CONSTRAINT uniq_email UNIQUE NOT NULL, owner INTEGER REFERENCES users DEFERRABLE, other INTEGER NOT NULL UNIQUE)";
        let constraints = parse_table_constraints(ddl);
        assert_eq!(constraints.len(), 3);

        assert_eq!(constraints[0].name.as_deref(), Some("uniq_email"));
        assert_eq!(constraints[0].columns, vec!["email"]);

        assert_eq!(constraints[1].name, None);
        assert_eq!(
            constraints[1].kind,
            ConstraintKind::ForeignKey {
                foreign_table: "users".to_string(),
                foreign_columns: Vec::new(),
            }
        );
        assert!(constraints[1].deferrable);
        assert!(!constraints[1].initially_deferred);

        assert_eq!(constraints[2].name, None);
        assert_eq!(constraints[2].columns, vec!["other"]);
    }

    #[test]
    fn test_unique_list_with_collation() {
        let ddl = "CREATE TABLE t (a TEXT, b TEXT, UNIQUE (a COLLATE NOCASE, b DESC))";
        let constraints = parse_table_constraints(ddl);
        assert_eq!(constraints[0].columns, vec!["a", "b"]);
    }
}
