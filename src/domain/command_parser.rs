//! Command line parser.
//!
//! Grammar: `<Operation>-<Element> [Name=Value]*`. Values may be bracket
//! delimited (`SRef=[NASDAQ$MSFT]`) to carry embedded spaces or empty
//! strings. A legacy positional mode accepts bare values in declared order;
//! the two modes cannot be mixed on one line.

use super::action::Action;
use super::catalog::{Element, Operation};
use super::error::{LedgerError, ParseError};

#[derive(Debug, Clone, PartialEq)]
struct Token {
    text: String,
    start: usize,
}

/// Split a line on whitespace, keeping `[...]` spans intact. Brackets are
/// preserved in the token text and stripped later.
fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    let mut in_bracket = false;
    let mut bracket_pos = 0usize;

    for (pos, ch) in line.char_indices() {
        if in_bracket {
            current.push(ch);
            if ch == ']' {
                in_bracket = false;
            }
            continue;
        }
        match ch {
            '[' => {
                if current.is_empty() {
                    start = pos;
                }
                in_bracket = true;
                bracket_pos = pos;
                current.push(ch);
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        start,
                    });
                }
            }
            _ => {
                if current.is_empty() {
                    start = pos;
                }
                current.push(ch);
            }
        }
    }
    if in_bracket {
        return Err(ParseError {
            message: "unterminated '['".to_string(),
            position: bracket_pos,
        });
    }
    if !current.is_empty() {
        tokens.push(Token {
            text: current,
            start,
        });
    }
    Ok(tokens)
}

/// Strip one outer bracket pair, if present.
fn unbracket(raw: &str) -> &str {
    raw.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(raw)
}

fn parse_head(token: &Token) -> Result<(Operation, Element), LedgerError> {
    let (op_str, el_str) = token.text.split_once('-').ok_or_else(|| ParseError {
        message: format!("expected Operation-Element, found '{}'", token.text),
        position: token.start,
    })?;
    match (Operation::parse(op_str), Element::parse(el_str)) {
        (Some(op), Some(el)) => Ok((op, el)),
        _ => Err(LedgerError::Unsupported {
            operation: op_str.to_string(),
            element: el_str.to_string(),
        }),
    }
}

/// Parse one line into a ready [`Action`].
pub fn parse(line: &str) -> Result<Action, LedgerError> {
    let tokens = tokenize(line)?;
    let (head, rest) = tokens.split_first().ok_or_else(|| ParseError {
        message: "empty command".to_string(),
        position: 0,
    })?;

    let (operation, element) = parse_head(head)?;
    let mut action = Action::from_catalog(operation, element)?;

    // A token is named when the text before '=' matches a declared
    // parameter. Everything else is a positional value.
    let declared: Vec<&'static str> = action.slots().iter().map(|s| s.spec.name).collect();
    let is_named = |token: &Token| -> bool {
        token
            .text
            .split_once('=')
            .is_some_and(|(name, _)| declared.contains(&name))
    };

    let named_mode = rest.first().map(is_named);

    for (index, token) in rest.iter().enumerate() {
        match (named_mode, is_named(token)) {
            (Some(true), true) => {
                let (name, raw) = token.text.split_once('=').ok_or_else(|| ParseError {
                    message: format!("malformed token '{}'", token.text),
                    position: token.start,
                })?;
                let name = name.to_string();
                action.set(&name, unbracket(raw))?;
            }
            (Some(false), false) => {
                let spec = action.slots().get(index).map(|s| s.spec).ok_or_else(|| {
                    ParseError {
                        message: format!("unexpected extra value '{}'", token.text),
                        position: token.start,
                    }
                })?;
                let name = spec.name.to_string();
                action.set(&name, unbracket(&token.text))?;
            }
            _ => {
                return Err(ParseError {
                    message: "cannot mix named and positional parameters".to_string(),
                    position: token.start,
                }
                .into())
            }
        }
    }

    action.is_ready()?;
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sref::SRef;
    use chrono::NaiveDate;

    #[test]
    fn parses_named_command() {
        let action = parse("Add-Portfolio Name=Main").unwrap();
        assert_eq!(action.operation, Operation::Add);
        assert_eq!(action.element, Element::Portfolio);
        assert_eq!(action.str_of("Name").unwrap(), "Main");
    }

    #[test]
    fn parses_bracketed_values_with_spaces() {
        let action = parse("Add-Stock SRef=[NASDAQ$MSFT] Name=[Microsoft Corp]").unwrap();
        assert_eq!(action.sref_of("SRef").unwrap(), &SRef::new("NASDAQ", "MSFT"));
        assert_eq!(action.str_of("Name").unwrap(), "Microsoft Corp");
    }

    #[test]
    fn empty_bracket_on_optional_means_absent() {
        let action = parse(
            "Add-Trade PfName=P1 SRef=[NASDAQ$X] Date=2023-02-01 Units=4 Price=7 Fee=0 TradeId=T1 PurchaseId=[]",
        )
        .unwrap();
        assert_eq!(action.opt_str("PurchaseId").unwrap(), None);
    }

    #[test]
    fn parses_positional_legacy_mode() {
        let action = parse("Add-Portfolio [My Savings]").unwrap();
        assert_eq!(action.str_of("Name").unwrap(), "My Savings");

        let action = parse("Follow-Stock Main NASDAQ$MSFT").unwrap();
        assert_eq!(action.str_of("PfName").unwrap(), "Main");
        assert_eq!(action.sref_of("SRef").unwrap(), &SRef::new("NASDAQ", "MSFT"));
    }

    #[test]
    fn rejects_mixed_modes() {
        let err = parse("Follow-Stock Name=Main NASDAQ$MSFT").unwrap_err();
        assert!(matches!(err, LedgerError::Parse(_)));
    }

    #[test]
    fn rejects_unknown_combo_and_bad_head() {
        assert!(matches!(
            parse("Frobnicate-Stock SRef=[A$B]").unwrap_err(),
            LedgerError::Unsupported { .. }
        ));
        assert!(matches!(
            parse("Split-Portfolio Name=Main").unwrap_err(),
            LedgerError::Unsupported { .. }
        ));
        assert!(matches!(
            parse("AddPortfolio").unwrap_err(),
            LedgerError::Parse(_)
        ));
        assert!(matches!(parse("   ").unwrap_err(), LedgerError::Parse(_)));
    }

    #[test]
    fn rejects_missing_parameter() {
        let err = parse("Edit-Portfolio Name=Main").unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation { ref param, .. } if param == "NewName"
        ));
    }

    #[test]
    fn rejects_bad_value_with_parameter_name() {
        let err = parse("Add-Holding PfName=P1 SRef=[NASDAQ$X] PurchaseId=P1 Date=2023-01-01 Units=zero Price=5 Fee=0 Rate=1")
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation { ref param, .. } if param == "Units"
        ));
    }

    #[test]
    fn unterminated_bracket_is_a_parse_error() {
        let err = parse("Add-Portfolio Name=[Main").unwrap_err();
        match err {
            LedgerError::Parse(p) => assert!(p.message.contains("unterminated")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn typed_values_come_back_typed() {
        let action = parse(
            "Add-Holding PfName=Main SRef=[NASDAQ$MSFT] PurchaseId=P1 Date=2023-01-01 Units=10 Price=5.12345 Fee=0 Rate=1 Note=[first lot]",
        )
        .unwrap();
        assert_eq!(
            action.date_of("Date").unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
        assert_eq!(action.decimal_of("Units").unwrap(), 10.0);
        assert_eq!(action.decimal_of("Price").unwrap(), 5.12345);
        assert_eq!(action.opt_str("Note").unwrap(), Some("first lot"));
    }
}
