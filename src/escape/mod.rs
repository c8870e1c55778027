//! Argument escaping for `cmd.exe`
//!
//! `cmd.exe` runs its own interpolation pass over a command line before the
//! target program splits it into arguments. An argument therefore needs two
//! layers of protection:
//!
//! 1. quoting, so the receiving program's `CommandLineToArgvW` parsing yields
//!    the original string, and
//! 2. caret escaping of every meta-character, so `cmd.exe` does not treat
//!    `&`, `|`, `<`, `>`, `%` or `!` as operators or variable references.
//!
//! Escaping is not idempotent. Each argument is escaped exactly once per
//! `cmd.exe` invocation.

/// Characters `cmd.exe` interprets during interpolation
pub const CMD_META_CHARS: [char; 10] = ['(', ')', '%', '!', '^', '"', '<', '>', '&', '|'];

/// Escape a single argument for a `cmd.exe` command line
///
/// Arguments that are empty or contain whitespace or a double quote are
/// wrapped in double quotes (inner quotes become `\"`), then every
/// meta-character is prefixed with `^`.
///
/// The empty argument is returned as a bare `""`: there is no content for
/// `cmd.exe` to reinterpret, and an unescaped empty quote pair reaches the
/// target program as the same empty argument `^"^"` would.
#[must_use]
pub fn escape_argument(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }

    if needs_quoting(arg) {
        escape_for_cmd_exe(&quote(arg))
    } else {
        escape_for_cmd_exe(arg)
    }
}

/// Prefix every `cmd.exe` meta-character in `arg` with a caret
///
/// `arg` is expected to already be quoted the way the receiving program
/// wants it; this only protects it from `cmd.exe` itself.
#[must_use]
pub fn escape_for_cmd_exe(arg: &str) -> String {
    let mut escaped = String::with_capacity(arg.len() + arg.len() / 4);
    for c in arg.chars() {
        if is_cmd_meta(c) {
            escaped.push('^');
        }
        escaped.push(c);
    }
    escaped
}

/// Check if a character is a `cmd.exe` meta-character
#[inline]
#[must_use]
pub fn is_cmd_meta(c: char) -> bool {
    CMD_META_CHARS.contains(&c)
}

fn needs_quoting(arg: &str) -> bool {
    arg.chars().any(|c| c == '"' || c.is_whitespace())
}

fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    quoted.push_str(&arg.replace('"', r#"\""#));
    quoted.push('"');
    quoted
}
