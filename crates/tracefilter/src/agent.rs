//! Derived-filter expression building for agent domains.
//!
//! Agent-based tracing domains (JUL, Log4j, Python style) restrict
//! event recording to one logger and, optionally, a log-level
//! threshold. The compiler performs no implicit clause injection;
//! instead the control-plane client builds a single combined expression
//! string here and submits it as one compilation unit.

/// Log-level restriction attached to an agent event rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoglevelRule {
    /// No log-level clause.
    All,
    /// Record only events at exactly this level.
    Exact(i64),
    /// Record events at this level or above.
    AtLeast(i64),
}

/// Build the combined filter expression for an agent event rule.
///
/// The user filter, if any, is wrapped in parentheses and joined with
/// `&&` to a `logger_name` clause derived from the event name and an
/// `int_loglevel` clause derived from the rule. An event name of `*`
/// (all loggers) contributes no logger clause.
///
/// Returns `None` when there is nothing to filter on, in which case the
/// caller skips filter compilation for the rule entirely.
pub fn combine(
    user_filter: Option<&str>,
    event_name: &str,
    loglevel: LoglevelRule,
) -> Option<String> {
    let mut combined: Option<String> = None;

    if event_name != "*" {
        let clause = format!("logger_name == \"{}\"", event_name);
        combined = Some(match user_filter {
            Some(user) => format!("({}) && ({})", user, clause),
            None => clause,
        });
    } else if let Some(user) = user_filter {
        combined = Some(user.to_string());
    }

    let (op, level) = match loglevel {
        LoglevelRule::All => return combined,
        LoglevelRule::Exact(level) => ("==", level),
        LoglevelRule::AtLeast(level) => (">=", level),
    };

    Some(match combined {
        Some(existing) => format!("({}) && (int_loglevel {} {})", existing, op, level),
        None => format!("int_loglevel {} {}", op, level),
    })
}
