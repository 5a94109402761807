//! Template catalog: the full command grammar.
//!
//! Maps (Operation, Element) to an ordered list of parameter specs. Unknown
//! combinations are unsupported. [`help`] renders the whole grammar.

use std::fmt;

use super::sector::{SECTOR_FIELDS, SECTOR_SLOTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Edit,
    Delete,
    DeleteAll,
    Set,
    Split,
    Close,
    Top,
    Follow,
    Unfollow,
    Note,
    Round,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "Add",
            Operation::Edit => "Edit",
            Operation::Delete => "Delete",
            Operation::DeleteAll => "DeleteAll",
            Operation::Set => "Set",
            Operation::Split => "Split",
            Operation::Close => "Close",
            Operation::Top => "Top",
            Operation::Follow => "Follow",
            Operation::Unfollow => "Unfollow",
            Operation::Note => "Note",
            Operation::Round => "Round",
        }
    }

    pub fn parse(s: &str) -> Option<Operation> {
        ALL_OPERATIONS.iter().copied().find(|op| op.as_str() == s)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ALL_OPERATIONS: [Operation; 12] = [
    Operation::Add,
    Operation::Edit,
    Operation::Delete,
    Operation::DeleteAll,
    Operation::Set,
    Operation::Split,
    Operation::Close,
    Operation::Top,
    Operation::Follow,
    Operation::Unfollow,
    Operation::Note,
    Operation::Round,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Stock,
    Portfolio,
    Holding,
    Trade,
    Order,
    /// Wire keyword is the legacy spelling `Divident`.
    Dividend,
    Alarm,
    Sector,
}

impl Element {
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Stock => "Stock",
            Element::Portfolio => "Portfolio",
            Element::Holding => "Holding",
            Element::Trade => "Trade",
            Element::Order => "Order",
            Element::Dividend => "Divident",
            Element::Alarm => "Alarm",
            Element::Sector => "Sector",
        }
    }

    pub fn parse(s: &str) -> Option<Element> {
        ALL_ELEMENTS.iter().copied().find(|el| el.as_str() == s)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ALL_ELEMENTS: [Element; 8] = [
    Element::Stock,
    Element::Portfolio,
    Element::Holding,
    Element::Trade,
    Element::Order,
    Element::Dividend,
    Element::Alarm,
    Element::Sector,
];

/// Type descriptor for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// String of at most `max` characters (empty allowed).
    Str { max: usize },
    /// Decimal rounded to `decimals` fractional digits; `positive` demands
    /// a value strictly greater than zero, otherwise zero is allowed.
    Decimal { decimals: u32, positive: bool },
    /// Calendar date, `yyyy-MM-dd`.
    Date,
    /// Stock reference, `market$symbol`.
    SRef,
    /// Unsigned index strictly below `max`.
    Uint { max: u64 },
    /// One of a closed set of keywords.
    Choice { variants: &'static [&'static str] },
}

impl ParamKind {
    pub fn describe(&self) -> String {
        match self {
            ParamKind::Str { max } => format!("str:{max}"),
            ParamKind::Decimal { decimals, positive } => {
                if *positive {
                    format!("dec:{decimals}>0")
                } else {
                    format!("dec:{decimals}")
                }
            }
            ParamKind::Date => "yyyy-MM-dd".to_string(),
            ParamKind::SRef => "market$symbol".to_string(),
            ParamKind::Uint { max } => format!("0..{max}"),
            ParamKind::Choice { variants } => variants.join("|"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub optional: bool,
}

const fn req(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        optional: false,
    }
}

const fn opt(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        optional: true,
    }
}

const NAME: ParamKind = ParamKind::Str { max: 40 };
const NOTE: ParamKind = ParamKind::Str { max: 100 };
const ID: ParamKind = ParamKind::Str { max: 20 };
const UNITS: ParamKind = ParamKind::Decimal {
    decimals: 3,
    positive: true,
};
const PRICE: ParamKind = ParamKind::Decimal {
    decimals: 5,
    positive: false,
};
const FEE: ParamKind = ParamKind::Decimal {
    decimals: 5,
    positive: false,
};
const RATE: ParamKind = ParamKind::Decimal {
    decimals: 4,
    positive: true,
};
const FACTOR: ParamKind = ParamKind::Decimal {
    decimals: 4,
    positive: true,
};
const AMOUNT: ParamKind = ParamKind::Decimal {
    decimals: 5,
    positive: true,
};
const LEVEL: ParamKind = ParamKind::Decimal {
    decimals: 2,
    positive: true,
};
const SECTOR_ID: ParamKind = ParamKind::Uint {
    max: SECTOR_SLOTS as u64,
};
const FIELD_ID: ParamKind = ParamKind::Uint {
    max: SECTOR_FIELDS as u64,
};
const ORDER_KIND: ParamKind = ParamKind::Choice {
    variants: &["Buy", "Sell"],
};
const ALARM_KIND: ParamKind = ParamKind::Choice {
    variants: &["Over", "Under"],
};

/// The full template table. Optional parameters always trail required ones
/// so the positional legacy mode stays unambiguous.
pub const TEMPLATES: &[(Operation, Element, &[ParamSpec])] = &[
    // Portfolio
    (Operation::Add, Element::Portfolio, &[req("Name", NAME)]),
    (
        Operation::Edit,
        Element::Portfolio,
        &[req("Name", NAME), req("NewName", NAME)],
    ),
    (Operation::Delete, Element::Portfolio, &[req("Name", NAME)]),
    (
        Operation::DeleteAll,
        Element::Portfolio,
        &[req("Name", NAME)],
    ),
    (Operation::Top, Element::Portfolio, &[req("Name", NAME)]),
    // Stock
    (
        Operation::Add,
        Element::Stock,
        &[req("SRef", ParamKind::SRef), req("Name", NAME)],
    ),
    (
        Operation::Edit,
        Element::Stock,
        &[
            req("SRef", ParamKind::SRef),
            req("NewSRef", ParamKind::SRef),
            opt("NewName", NAME),
        ],
    ),
    (
        Operation::Delete,
        Element::Stock,
        &[req("SRef", ParamKind::SRef)],
    ),
    (
        Operation::DeleteAll,
        Element::Stock,
        &[req("SRef", ParamKind::SRef)],
    ),
    (
        Operation::Split,
        Element::Stock,
        &[req("SRef", ParamKind::SRef), req("Factor", FACTOR)],
    ),
    (
        Operation::Close,
        Element::Stock,
        &[req("SRef", ParamKind::SRef), req("Date", ParamKind::Date)],
    ),
    (
        Operation::Follow,
        Element::Stock,
        &[req("PfName", NAME), req("SRef", ParamKind::SRef)],
    ),
    (
        Operation::Unfollow,
        Element::Stock,
        &[req("PfName", NAME), req("SRef", ParamKind::SRef)],
    ),
    (
        Operation::Set,
        Element::Stock,
        &[
            req("SRef", ParamKind::SRef),
            req("SectorId", SECTOR_ID),
            opt("FieldId", FIELD_ID),
        ],
    ),
    // Holding
    (
        Operation::Add,
        Element::Holding,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("PurchaseId", ID),
            req("Date", ParamKind::Date),
            req("Units", UNITS),
            req("Price", PRICE),
            req("Fee", FEE),
            req("Rate", RATE),
            opt("Note", NOTE),
        ],
    ),
    (
        Operation::Edit,
        Element::Holding,
        &[
            req("PurchaseId", ID),
            req("Date", ParamKind::Date),
            req("Units", UNITS),
            req("Price", PRICE),
            req("Fee", FEE),
            req("Rate", RATE),
        ],
    ),
    (
        Operation::Delete,
        Element::Holding,
        &[req("PurchaseId", ID)],
    ),
    (
        Operation::Note,
        Element::Holding,
        &[req("PurchaseId", ID), req("Note", NOTE)],
    ),
    (
        Operation::Round,
        Element::Holding,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("TradeId", ID),
            req("Date", ParamKind::Date),
            req("Price", PRICE),
        ],
    ),
    // Trade
    (
        Operation::Add,
        Element::Trade,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("Date", ParamKind::Date),
            req("Units", UNITS),
            req("Price", PRICE),
            req("Fee", FEE),
            req("TradeId", ID),
            opt("PurchaseId", ID),
        ],
    ),
    (Operation::Delete, Element::Trade, &[req("TradeId", ID)]),
    (
        Operation::Note,
        Element::Trade,
        &[req("TradeId", ID), req("Note", NOTE)],
    ),
    // Divident (legacy wire spelling)
    (
        Operation::Add,
        Element::Dividend,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("ExDate", ParamKind::Date),
            req("PayDate", ParamKind::Date),
            req("Units", UNITS),
            req("Amount", AMOUNT),
            opt("Rate", RATE),
            opt("PurchaseId", ID),
            opt("TradeId", ID),
        ],
    ),
    (
        Operation::Delete,
        Element::Dividend,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("ExDate", ParamKind::Date),
        ],
    ),
    // Order
    (
        Operation::Add,
        Element::Order,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("Kind", ORDER_KIND),
            req("Units", UNITS),
            req("Price", AMOUNT),
        ],
    ),
    (
        Operation::Edit,
        Element::Order,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("Price", AMOUNT),
            req("NewUnits", UNITS),
            req("NewPrice", AMOUNT),
        ],
    ),
    (
        Operation::Delete,
        Element::Order,
        &[
            req("PfName", NAME),
            req("SRef", ParamKind::SRef),
            req("Price", AMOUNT),
        ],
    ),
    (
        Operation::DeleteAll,
        Element::Order,
        &[req("PfName", NAME), opt("SRef", ParamKind::SRef)],
    ),
    // Alarm
    (
        Operation::Add,
        Element::Alarm,
        &[
            req("SRef", ParamKind::SRef),
            req("Kind", ALARM_KIND),
            req("Level", LEVEL),
            opt("Note", NOTE),
        ],
    ),
    (
        Operation::Delete,
        Element::Alarm,
        &[req("SRef", ParamKind::SRef), req("Level", LEVEL)],
    ),
    (
        Operation::DeleteAll,
        Element::Alarm,
        &[req("SRef", ParamKind::SRef)],
    ),
    // Sector
    (
        Operation::Add,
        Element::Sector,
        &[req("SectorId", SECTOR_ID), req("Name", NAME)],
    ),
    (
        Operation::Edit,
        Element::Sector,
        &[req("SectorId", SECTOR_ID), req("Name", NAME)],
    ),
    (
        Operation::Delete,
        Element::Sector,
        &[req("SectorId", SECTOR_ID), opt("FieldId", FIELD_ID)],
    ),
    (
        Operation::Set,
        Element::Sector,
        &[
            req("SectorId", SECTOR_ID),
            req("FieldId", FIELD_ID),
            req("Name", NAME),
        ],
    ),
];

/// Parameter specs for a command, or `None` when the combination is
/// unsupported.
pub fn template(operation: Operation, element: Element) -> Option<&'static [ParamSpec]> {
    TEMPLATES
        .iter()
        .find(|(op, el, _)| *op == operation && *el == element)
        .map(|(_, _, specs)| *specs)
}

/// Render the whole grammar, one command per line.
pub fn help() -> String {
    let mut out = String::new();
    for (op, el, specs) in TEMPLATES {
        out.push_str(&format!("{op}-{el}"));
        for spec in *specs {
            if spec.optional {
                out.push_str(&format!(" [{}=<{}>]", spec.name, spec.kind.describe()));
            } else {
                out.push_str(&format!(" {}=<{}>", spec.name, spec.kind.describe()));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_combo_returns_ordered_specs() {
        let specs = template(Operation::Add, Element::Holding).unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["PfName", "SRef", "PurchaseId", "Date", "Units", "Price", "Fee", "Rate", "Note"]
        );
        assert!(specs.last().unwrap().optional);
    }

    #[test]
    fn unknown_combo_is_unsupported() {
        assert!(template(Operation::Split, Element::Portfolio).is_none());
        assert!(template(Operation::Top, Element::Stock).is_none());
    }

    #[test]
    fn optional_params_always_trail_required_ones() {
        for (op, el, specs) in TEMPLATES {
            let first_optional = specs.iter().position(|s| s.optional);
            if let Some(idx) = first_optional {
                assert!(
                    specs[idx..].iter().all(|s| s.optional),
                    "{op}-{el} has a required parameter after an optional one"
                );
            }
        }
    }

    #[test]
    fn dividend_keeps_legacy_wire_spelling() {
        assert_eq!(Element::Dividend.as_str(), "Divident");
        assert_eq!(Element::parse("Divident"), Some(Element::Dividend));
        assert_eq!(Element::parse("Dividend"), None);
    }

    #[test]
    fn help_lists_every_template() {
        let rendered = help();
        assert_eq!(rendered.lines().count(), TEMPLATES.len());
        assert!(rendered.contains("Add-Divident"));
        assert!(rendered.contains("Split-Stock SRef=<market$symbol> Factor=<dec:4>0>"));
    }

    #[test]
    fn operation_and_element_round_trip_their_names() {
        for op in ALL_OPERATIONS {
            assert_eq!(Operation::parse(op.as_str()), Some(op));
        }
        for el in ALL_ELEMENTS {
            assert_eq!(Element::parse(el.as_str()), Some(el));
        }
        assert_eq!(Operation::parse("add"), None);
    }
}
