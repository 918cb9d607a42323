//! Driver error classification
//!
//! Maps a raw `(code, message)` pair reported by a backend onto the portable
//! [`ErrorKind`] taxonomy. Classification is a pure, total function: any
//! input yields a kind, falling back to [`ErrorKind::UnknownDriverError`].
//!
//! Each backend has a rule table. A rule matches on an exact code, a code
//! prefix (SQLSTATE class), or a case-insensitive message substring. When
//! several rules match, code rules outrank message rules, a longer pattern
//! outranks a shorter one, an exact code outranks a prefix of the same
//! length, and the earlier rule wins any remaining tie.

use super::database_types::DatabaseType;
use super::error::{ClassifiedError, DriverError, ErrorKind};

use ErrorKind::{
    ConnectionError as Connection, DeadlockOrLockTimeout as Lock, ForeignKeyViolation as ForeignKey,
    NotNullViolation as NotNull, SyntaxError as Syntax, UniqueConstraintViolation as Unique,
};

#[derive(Debug, Clone, Copy)]
enum Pattern {
    Code(&'static str),
    CodePrefix(&'static str),
    /// Lower-case substring of the message
    Message(&'static str),
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    pattern: Pattern,
    kind: ErrorKind,
}

const fn code(code: &'static str, kind: ErrorKind) -> Rule {
    Rule {
        pattern: Pattern::Code(code),
        kind,
    }
}

const fn class(prefix: &'static str, kind: ErrorKind) -> Rule {
    Rule {
        pattern: Pattern::CodePrefix(prefix),
        kind,
    }
}

const fn message(fragment: &'static str, kind: ErrorKind) -> Rule {
    Rule {
        pattern: Pattern::Message(fragment),
        kind,
    }
}

/// (code match, pattern length, exactness)
type Score = (bool, usize, bool);

impl Rule {
    fn score(&self, code: &str, message_lower: &str) -> Option<Score> {
        match self.pattern {
            Pattern::Code(expected) => (code == expected).then_some((true, expected.len(), true)),
            Pattern::CodePrefix(prefix) => {
                (code.len() > prefix.len() && code.starts_with(prefix))
                    .then_some((true, prefix.len(), false))
            }
            Pattern::Message(fragment) => {
                message_lower.contains(fragment).then_some((false, fragment.len(), false))
            }
        }
    }
}

const POSTGRES_RULES: &[Rule] = &[
    code("23505", Unique),
    code("23502", NotNull),
    code("23503", ForeignKey),
    code("23001", ForeignKey),
    code("40P01", Lock),
    code("40001", Lock),
    code("55P03", Lock),
    code("42601", Syntax),
    code("57P01", Connection),
    code("57P02", Connection),
    code("57P03", Connection),
    class("08", Connection),
    class("28", Connection),
    message("duplicate key value violates unique constraint", Unique),
    message("violates not-null constraint", NotNull),
    message("violates foreign key constraint", ForeignKey),
    message("deadlock detected", Lock),
    message("could not obtain lock", Lock),
    message("canceling statement due to lock timeout", Lock),
    message("syntax error at or near", Syntax),
    message("server closed the connection", Connection),
    message("terminating connection", Connection),
];

const MYSQL_RULES: &[Rule] = &[
    code("1062", Unique),
    code("1557", Unique),
    code("1569", Unique),
    code("1586", Unique),
    code("1048", NotNull),
    code("1121", NotNull),
    code("1138", NotNull),
    code("1171", NotNull),
    code("1252", NotNull),
    code("1263", NotNull),
    code("1364", NotNull),
    code("1566", NotNull),
    code("1216", ForeignKey),
    code("1217", ForeignKey),
    code("1451", ForeignKey),
    code("1452", ForeignKey),
    code("1701", ForeignKey),
    code("1213", Lock),
    code("1205", Lock),
    code("1064", Syntax),
    code("1149", Syntax),
    code("1287", Syntax),
    code("1341", Syntax),
    code("1342", Syntax),
    code("1343", Syntax),
    code("1344", Syntax),
    code("1382", Syntax),
    code("1479", Syntax),
    code("1541", Syntax),
    code("1554", Syntax),
    code("1626", Syntax),
    code("1044", Connection),
    code("1045", Connection),
    code("1046", Connection),
    code("1049", Connection),
    code("1095", Connection),
    code("1142", Connection),
    code("1143", Connection),
    code("1227", Connection),
    code("1370", Connection),
    code("1429", Connection),
    code("2002", Connection),
    code("2005", Connection),
    code("2006", Connection),
    code("2013", Connection),
    code("2054", Connection),
    message("duplicate entry", Unique),
    message("cannot be null", NotNull),
    message("a foreign key constraint fails", ForeignKey),
    message("deadlock found when trying to get lock", Lock),
    message("lock wait timeout exceeded", Lock),
    message("you have an error in your sql syntax", Syntax),
    message("server has gone away", Connection),
    message("lost connection to mysql server", Connection),
];

const SQLITE_RULES: &[Rule] = &[
    code("2067", Unique),
    code("1555", Unique),
    code("1299", NotNull),
    code("787", ForeignKey),
    code("5", Lock),
    code("261", Lock),
    code("517", Lock),
    code("6", Lock),
    code("262", Lock),
    code("14", Connection),
    code("26", Connection),
    message("unique constraint failed", Unique),
    message("must be unique", Unique),
    message("is not unique", Unique),
    message("are not unique", Unique),
    message("not null constraint failed", NotNull),
    message("may not be null", NotNull),
    message("foreign key constraint failed", ForeignKey),
    message("database is locked", Lock),
    message("database table is locked", Lock),
    message("syntax error", Syntax),
    message("incomplete input", Syntax),
    message("unable to open database file", Connection),
    message("file is not a database", Connection),
];

const ORACLE_RULES: &[Rule] = &[
    code("1", Unique),
    code("2299", Unique),
    code("38911", Unique),
    code("1400", NotNull),
    code("1407", NotNull),
    code("2266", ForeignKey),
    code("2291", ForeignKey),
    code("2292", ForeignKey),
    code("60", Lock),
    code("54", Lock),
    code("4021", Lock),
    code("30006", Lock),
    code("900", Syntax),
    code("923", Syntax),
    code("933", Syntax),
    code("936", Syntax),
    code("1017", Connection),
    code("3113", Connection),
    code("3114", Connection),
    code("12170", Connection),
    code("12514", Connection),
    code("12541", Connection),
    code("12545", Connection),
    message("unique constraint", Unique),
    message("cannot insert null", NotNull),
    message("integrity constraint", ForeignKey),
    message("deadlock detected while waiting for resource", Lock),
    message("resource busy and acquire with nowait", Lock),
    message("not connected to oracle", Connection),
];

const SQLSERVER_RULES: &[Rule] = &[
    code("2627", Unique),
    code("2601", Unique),
    code("515", NotNull),
    code("547", ForeignKey),
    code("4712", ForeignKey),
    code("1205", Lock),
    code("1222", Lock),
    code("102", Syntax),
    code("156", Syntax),
    code("170", Syntax),
    code("233", Connection),
    code("4060", Connection),
    code("10054", Connection),
    code("10060", Connection),
    code("11001", Connection),
    code("18456", Connection),
    message("violation of unique key constraint", Unique),
    message("cannot insert duplicate key", Unique),
    message("cannot insert the value null", NotNull),
    message("conflicted with the foreign key constraint", ForeignKey),
    message("was deadlocked on lock resources", Lock),
    message("lock request time out period exceeded", Lock),
    message("incorrect syntax near", Syntax),
    message("login failed for user", Connection),
];

/// Fallbacks every backend shares, consulted after the backend table
const COMMON_RULES: &[Rule] = &[
    message("connection refused", Connection),
    message("connection reset", Connection),
    message("connection closed", Connection),
    message("broken pipe", Connection),
];

fn rules_for(backend: DatabaseType) -> &'static [Rule] {
    match backend {
        DatabaseType::Postgres => POSTGRES_RULES,
        DatabaseType::Mysql => MYSQL_RULES,
        DatabaseType::Sqlite => SQLITE_RULES,
        DatabaseType::Oracle => ORACLE_RULES,
        DatabaseType::SqlServer => SQLSERVER_RULES,
    }
}

/// Extract the code embedded in a message like `SQLSTATE[23505]: ...` or `ORA-00001: ...`
fn code_from_message(message: &str, backend: DatabaseType) -> Option<String> {
    if let Some(start) = message.find("SQLSTATE[") {
        let rest = &message[start + "SQLSTATE[".len()..];
        let end = rest.find(']')?;
        return Some(rest[..end].to_string());
    }
    if backend == DatabaseType::Oracle {
        let start = message.find("ORA-")?;
        let digits: String = message[start + 4..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if !digits.is_empty() {
            return Some(digits);
        }
    }
    None
}

fn normalize_code(raw_code: &str, raw_message: &str, backend: DatabaseType) -> String {
    let mut code = raw_code.trim().to_uppercase();
    if code.is_empty() {
        code = code_from_message(raw_message, backend).unwrap_or_default();
    }
    if backend == DatabaseType::Oracle {
        if let Some(rest) = code.strip_prefix("ORA-") {
            code = rest.to_string();
        }
        if code.chars().all(|c| c.is_ascii_digit()) && !code.is_empty() {
            let trimmed = code.trim_start_matches('0');
            code = if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() };
        }
    }
    code
}

/// Determine the kind of a raw driver error
pub fn classify_kind(raw_code: &str, raw_message: &str, backend: DatabaseType) -> ErrorKind {
    let code = normalize_code(raw_code, raw_message, backend);
    let message_lower = raw_message.to_lowercase();

    let mut best: Option<(Score, ErrorKind)> = None;
    for rule in rules_for(backend).iter().chain(COMMON_RULES) {
        if let Some(score) = rule.score(&code, &message_lower) {
            if best.map_or(true, |(current, _)| score > current) {
                best = Some((score, rule.kind));
            }
        }
    }

    let kind = best.map_or(ErrorKind::UnknownDriverError, |(_, kind)| kind);
    tracing::trace!(%backend, code = %code, %kind, "classified driver error");
    kind
}

/// Classify a raw `(code, message)` pair, keeping it as the cause
pub fn classify(raw_code: &str, raw_message: &str, backend: DatabaseType) -> ClassifiedError {
    let kind = classify_kind(raw_code, raw_message, backend);
    let cause = DriverError::new(raw_code, raw_message);
    ClassifiedError::new(kind, backend, raw_code, raw_message, Some(cause))
}

/// Classify a raw driver error, keeping it as the cause
pub fn classify_driver_error(error: DriverError, backend: DatabaseType) -> ClassifiedError {
    let kind = classify_kind(error.code(), error.message(), backend);
    let raw_code = error.code().to_string();
    let raw_message = error.message().to_string();
    ClassifiedError::new(kind, backend, raw_code, raw_message, Some(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_sqlstate() {
        let pg = DatabaseType::Postgres;
        assert_eq!(classify_kind("23505", "", pg), ErrorKind::UniqueConstraintViolation);
        assert_eq!(classify_kind("23502", "", pg), ErrorKind::NotNullViolation);
        assert_eq!(classify_kind("23503", "", pg), ErrorKind::ForeignKeyViolation);
        assert_eq!(classify_kind("40P01", "", pg), ErrorKind::DeadlockOrLockTimeout);
        assert_eq!(classify_kind("42601", "", pg), ErrorKind::SyntaxError);
        assert_eq!(classify_kind("08006", "", pg), ErrorKind::ConnectionError);
        assert_eq!(classify_kind("42P01", "relation does not exist", pg), ErrorKind::UnknownDriverError);
    }

    #[test]
    fn test_unlisted_code_in_known_class_is_unknown() {
        // "57P01" is listed exactly; "57014" only shares its class and has no rule
        let pg = DatabaseType::Postgres;
        assert_eq!(classify_kind("57P01", "", pg), ErrorKind::ConnectionError);
        assert_eq!(classify_kind("57014", "canceling statement", pg), ErrorKind::UnknownDriverError);
    }

    #[test]
    fn test_code_beats_message() {
        // A unique-violation code whose message mentions a deadlock stays a unique violation
        let kind = classify_kind("1062", "Deadlock found when trying to get lock", DatabaseType::Mysql);
        assert_eq!(kind, ErrorKind::UniqueConstraintViolation);
    }

    #[test]
    fn test_longest_message_wins() {
        // "syntax error" and "unique constraint failed" both match; the longer fragment wins
        let kind = classify_kind(
            "",
            "UNIQUE constraint failed near syntax error",
            DatabaseType::Sqlite,
        );
        assert_eq!(kind, ErrorKind::UniqueConstraintViolation);
    }

    #[test]
    fn test_mysql_codes() {
        let my = DatabaseType::Mysql;
        assert_eq!(classify_kind("1062", "", my), ErrorKind::UniqueConstraintViolation);
        assert_eq!(classify_kind("1048", "", my), ErrorKind::NotNullViolation);
        assert_eq!(classify_kind("1452", "", my), ErrorKind::ForeignKeyViolation);
        assert_eq!(classify_kind("1213", "", my), ErrorKind::DeadlockOrLockTimeout);
        assert_eq!(classify_kind("1205", "", my), ErrorKind::DeadlockOrLockTimeout);
        assert_eq!(classify_kind("1064", "", my), ErrorKind::SyntaxError);
        assert_eq!(classify_kind("2002", "", my), ErrorKind::ConnectionError);
    }

    #[test]
    fn test_sqlite_codes_and_messages() {
        let lite = DatabaseType::Sqlite;
        assert_eq!(classify_kind("2067", "", lite), ErrorKind::UniqueConstraintViolation);
        assert_eq!(classify_kind("787", "", lite), ErrorKind::ForeignKeyViolation);
        assert_eq!(
            classify_kind("19", "NOT NULL constraint failed: users.name", lite),
            ErrorKind::NotNullViolation
        );
        assert_eq!(
            classify_kind("", "column email is not unique", lite),
            ErrorKind::UniqueConstraintViolation
        );
        assert_eq!(classify_kind("", "database is locked", lite), ErrorKind::DeadlockOrLockTimeout);
        assert_eq!(classify_kind("1", "near \"SELEC\": syntax error", lite), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_oracle_code_normalization() {
        let ora = DatabaseType::Oracle;
        assert_eq!(classify_kind("ORA-00001", "", ora), ErrorKind::UniqueConstraintViolation);
        assert_eq!(classify_kind("00060", "", ora), ErrorKind::DeadlockOrLockTimeout);
        assert_eq!(
            classify_kind("", "ORA-02291: integrity constraint violated - parent key not found", ora),
            ErrorKind::ForeignKeyViolation
        );
        assert_eq!(classify_kind("1400", "", ora), ErrorKind::NotNullViolation);
    }

    #[test]
    fn test_sqlserver_codes() {
        let ms = DatabaseType::SqlServer;
        assert_eq!(classify_kind("2627", "", ms), ErrorKind::UniqueConstraintViolation);
        assert_eq!(classify_kind("547", "", ms), ErrorKind::ForeignKeyViolation);
        assert_eq!(classify_kind("1205", "", ms), ErrorKind::DeadlockOrLockTimeout);
        assert_eq!(classify_kind("18456", "", ms), ErrorKind::ConnectionError);
    }

    #[test]
    fn test_sqlstate_extracted_from_message() {
        let kind = classify_kind(
            "",
            "SQLSTATE[23503]: Foreign key violation: 7 ERROR",
            DatabaseType::Postgres,
        );
        assert_eq!(kind, ErrorKind::ForeignKeyViolation);
    }

    #[test]
    fn test_common_fallback() {
        for backend in DatabaseType::ALL {
            assert_eq!(
                classify_kind("", "Connection refused (os error 111)", backend),
                ErrorKind::ConnectionError
            );
        }
    }

    #[test]
    fn test_unknown_preserves_payload() {
        let err = classify("XX999", "something odd happened", DatabaseType::Postgres);
        assert_eq!(err.kind(), ErrorKind::UnknownDriverError);
        assert_eq!(err.raw_code(), "XX999");
        assert_eq!(err.raw_message(), "something odd happened");
        assert_eq!(err.cause().map(DriverError::code), Some("XX999"));
        assert_eq!(
            err.cause().map(DriverError::message),
            Some("something odd happened")
        );
    }

    #[test]
    fn test_classify_driver_error_keeps_cause() {
        let raw = DriverError::new("23505", "duplicate key value violates unique constraint \"u\"");
        let err = classify_driver_error(raw, DatabaseType::Postgres);
        assert_eq!(err.kind(), ErrorKind::UniqueConstraintViolation);
        assert_eq!(err.cause().map(DriverError::code), Some("23505"));
        assert_eq!(err.backend(), DatabaseType::Postgres);
    }
}
