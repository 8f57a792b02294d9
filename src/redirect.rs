//! Detection and extraction of output-redirection operators.
//!
//! The scanner runs before tokenization: it walks the raw line with the same
//! quote/escape rules as the tokenizer, lifts `>`/`>>` operators (with an
//! optional `1`/`2` stream digit) and their target paths out of the text, and
//! hands the residual command text to [`crate::tokenizer`].

/// Output stream a directive applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamId {
    /// File descriptor 1.
    Stdout,
    /// File descriptor 2.
    Stderr,
}

/// One parsed redirection: which stream, to which file, truncate or append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectionDirective {
    pub stream: StreamId,
    /// Target file path, quote characters already stripped. May be empty;
    /// the consumer that opens the file surfaces that as an I/O error.
    pub target: String,
    /// `>>` opens for append, `>` truncates.
    pub append: bool,
}

/// A raw input line split into command text and at most one directive per
/// stream. Produced once per line and consumed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    /// The line with all operator-through-path spans removed, trimmed.
    pub command_text: String,
    pub stdout: Option<RedirectionDirective>,
    pub stderr: Option<RedirectionDirective>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteContext {
    Bare,
    Single,
    Double,
}

/// A directive plus the char range it occupied in the input.
struct Span {
    start: usize,
    end: usize,
    stream: StreamId,
    target: String,
    append: bool,
}

/// Extract redirection directives from a raw line.
///
/// A `>` inside quotes or behind a backslash is ordinary text and is left for
/// the tokenizer. When the same stream is redirected more than once, the
/// rightmost directive wins; every operator span is still removed from the
/// command text.
pub fn scan_redirections(raw_line: &str) -> ParsedCommand {
    let chars: Vec<char> = raw_line.chars().collect();
    let mut spans: Vec<Span> = Vec::new();

    let mut context = QuoteContext::Bare;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        match c {
            '\\' if context != QuoteContext::Single => {
                escaped = true;
                i += 1;
            }
            '\'' if context != QuoteContext::Double => {
                context = toggle(context, QuoteContext::Single);
                i += 1;
            }
            '"' if context != QuoteContext::Single => {
                context = toggle(context, QuoteContext::Double);
                i += 1;
            }
            '>' if context == QuoteContext::Bare => {
                let span = read_operator(&chars, i);
                i = span.end;
                spans.push(span);
            }
            _ => i += 1,
        }
    }

    if spans.is_empty() {
        return ParsedCommand {
            command_text: raw_line.trim().to_string(),
            ..ParsedCommand::default()
        };
    }

    let mut parsed = ParsedCommand::default();
    let mut command = String::new();
    let mut last_end = 0;

    for span in spans {
        // A stream digit at the very end of a preceding target makes spans
        // overlap; clamp so the splice stays monotonic.
        if span.start > last_end {
            command.extend(&chars[last_end..span.start]);
        }
        last_end = last_end.max(span.end);

        let directive = RedirectionDirective {
            stream: span.stream,
            target: span.target,
            append: span.append,
        };
        match span.stream {
            StreamId::Stdout => parsed.stdout = Some(directive),
            StreamId::Stderr => parsed.stderr = Some(directive),
        }
    }
    command.extend(&chars[last_end..]);

    parsed.command_text = command.trim().to_string();
    parsed
}

fn toggle(context: QuoteContext, quote: QuoteContext) -> QuoteContext {
    if context == quote {
        QuoteContext::Bare
    } else {
        quote
    }
}

/// Read one operator starting at the `>` at `op`: the optional stream digit
/// before it, the optional second `>`, and the target path after it.
fn read_operator(chars: &[char], op: usize) -> Span {
    let append = chars.get(op + 1) == Some(&'>');

    // The stream digit may be separated from the operator by whitespace;
    // scanning back over it moves the span start to include the digit.
    let mut k = op;
    while k > 0 && chars[k - 1].is_whitespace() {
        k -= 1;
    }
    let (stream, start) = match k.checked_sub(1).map(|p| chars[p]) {
        Some('1') => (StreamId::Stdout, k - 1),
        Some('2') => (StreamId::Stderr, k - 1),
        _ => (StreamId::Stdout, op),
    };

    let mut j = op + if append { 2 } else { 1 };
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }

    let mut target = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    while j < chars.len() {
        let c = chars[j];
        if escaped {
            target.push(c);
            escaped = false;
            j += 1;
            continue;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else {
                target.push(c);
            }
            j += 1;
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '\\' => escaped = true,
            '>' => break,
            c if c.is_whitespace() => break,
            // A digit directly followed by `>` opens the next operator.
            c if c.is_ascii_digit() && chars.get(j + 1) == Some(&'>') => break,
            c => target.push(c),
        }
        j += 1;
    }

    Span {
        start,
        end: j,
        stream,
        target,
        append,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stdout_of(parsed: &ParsedCommand) -> &RedirectionDirective {
        parsed.stdout.as_ref().expect("stdout directive")
    }

    fn stderr_of(parsed: &ParsedCommand) -> &RedirectionDirective {
        parsed.stderr.as_ref().expect("stderr directive")
    }

    #[test]
    fn line_without_operators_passes_through_trimmed() {
        let parsed = scan_redirections("  echo hello  ");
        assert_eq!(parsed.command_text, "echo hello");
        assert!(parsed.stdout.is_none());
        assert!(parsed.stderr.is_none());
    }

    #[test]
    fn truncating_stdout_redirect() {
        let parsed = scan_redirections("echo hi > out.txt");
        assert_eq!(parsed.command_text, "echo hi");
        let d = stdout_of(&parsed);
        assert_eq!(d.target, "out.txt");
        assert!(!d.append);
        assert!(parsed.stderr.is_none());
    }

    #[test]
    fn explicit_fd_one_is_stdout() {
        let parsed = scan_redirections("echo hi 1> out.txt");
        assert_eq!(parsed.command_text, "echo hi");
        assert_eq!(stdout_of(&parsed).target, "out.txt");
    }

    #[test]
    fn both_streams_with_append_and_truncate() {
        let parsed = scan_redirections("cmd 2>> err.log 1> out.log");
        assert_eq!(parsed.command_text, "cmd");
        let err = stderr_of(&parsed);
        assert_eq!(err.target, "err.log");
        assert!(err.append);
        let out = stdout_of(&parsed);
        assert_eq!(out.target, "out.log");
        assert!(!out.append);
    }

    #[test]
    fn append_operator_detected() {
        let parsed = scan_redirections("cmd >> log");
        let d = stdout_of(&parsed);
        assert!(d.append);
        assert_eq!(d.target, "log");
    }

    #[test]
    fn quoted_operator_is_plain_text() {
        let parsed = scan_redirections("echo '>'");
        assert_eq!(parsed.command_text, "echo '>'");
        assert!(parsed.stdout.is_none());

        let parsed = scan_redirections(r#"echo ">> not an op""#);
        assert!(parsed.stdout.is_none());
    }

    #[test]
    fn escaped_operator_is_plain_text() {
        let parsed = scan_redirections(r"echo \> file");
        assert_eq!(parsed.command_text, r"echo \> file");
        assert!(parsed.stdout.is_none());
    }

    #[test]
    fn last_directive_per_stream_wins() {
        let parsed = scan_redirections("cmd > a.txt > b.txt");
        assert_eq!(parsed.command_text, "cmd");
        assert_eq!(stdout_of(&parsed).target, "b.txt");
        assert!(parsed.stderr.is_none());
    }

    #[test]
    fn quoted_target_keeps_spaces_loses_quotes() {
        let parsed = scan_redirections("echo hi > 'my file.txt'");
        assert_eq!(stdout_of(&parsed).target, "my file.txt");

        let parsed = scan_redirections(r#"cmd 2> "err file""#);
        assert_eq!(stderr_of(&parsed).target, "err file");
    }

    #[test]
    fn fd_digit_separated_by_whitespace_still_counts() {
        // The backward scan skips whitespace before the operator, so the
        // bare digit is consumed as the stream id, not left as an argument.
        let parsed = scan_redirections("echo 2 > f");
        assert_eq!(parsed.command_text, "echo");
        assert_eq!(stderr_of(&parsed).target, "f");
    }

    #[test]
    fn non_stream_digits_stay_in_command_text() {
        let parsed = scan_redirections("echo 3> f");
        assert_eq!(parsed.command_text, "echo 3");
        assert_eq!(stdout_of(&parsed).target, "f");
    }

    #[test]
    fn target_stops_before_next_operator() {
        let parsed = scan_redirections("cmd >a2> b");
        assert_eq!(parsed.command_text, "cmd");
        assert_eq!(stdout_of(&parsed).target, "a");
        assert_eq!(stderr_of(&parsed).target, "b");
    }

    #[test]
    fn missing_target_yields_empty_path() {
        let parsed = scan_redirections("echo hi >");
        assert_eq!(parsed.command_text, "echo hi");
        assert_eq!(stdout_of(&parsed).target, "");
    }

    #[test]
    fn directives_in_the_middle_of_the_line() {
        let parsed = scan_redirections("cmd > out.txt --flag");
        assert_eq!(parsed.command_text, "cmd  --flag");
        assert_eq!(stdout_of(&parsed).target, "out.txt");
    }
}
