//! The ordered rule table mapping a context snapshot to an indent.
//!
//! Rules are grouped into precedence tiers: what the new line starts with,
//! then what the previous line ends with, then directives, then statement
//! boundaries. The first matching rule wins. Inside a tier, rules key on
//! disjoint token roles or disjoint group kinds, which
//! [`classify_strict`] checks.

use crate::error::IndentError;
use crate::syntax::{GroupKind, StatementKind};

use super::calculator::IndentAction;
use super::context::{ContextSnapshot, LeadingRole, TrailingRole};

/// The classified indentation context, carrying the anchors its action
/// needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    ClosingBracket { anchor: u32 },
    /// A leading `.`/`?.` on the new line.
    ChainContinuation { align: Option<u32>, anchor: u32 },
    /// A leading `catch`, `finally` or `else`.
    ClauseKeyword { anchor: u32 },
    LeadingOperator { anchor: u32 },
    LambdaArrow { anchor: u32, single_line: bool },
    WhenEntryArrow { anchor: u32 },
    AfterDot { align: Option<u32>, anchor: u32 },
    Assignment { anchor: u32, multideclaration: bool },
    UnfinishedBinary { anchor: u32, in_if_condition: bool },
    IsExpression { anchor: u32 },
    BinaryWithType { anchor: u32 },
    ModifierList { anchor: u32 },
    TryClause { anchor: u32 },
    ControlBody { anchor: u32 },
    /// Call arguments, aligned to `align_column` when alignment is enabled.
    ArgumentList { align_column: u32, anchor: u32 },
    OpenParenthesis { group: GroupKind, anchor: u32 },
    BlockBody { anchor: u32 },
    ListElement { anchor: u32 },
    DelegationList { anchor: u32 },
    EnumEntries { anchor: u32 },
    EnumMembers { anchor: u32 },
    ImportDirective,
    ScriptTopLevel,
    StatementBoundary { anchor: u32, depth: i32 },
    Unhandled { anchor: u32 },
}

impl ContextKind {
    /// The settings-independent indent this context calls for.
    pub fn action(self) -> IndentAction {
        match self {
            ContextKind::ClosingBracket { anchor }
            | ContextKind::ClauseKeyword { anchor }
            | ContextKind::ModifierList { anchor }
            | ContextKind::TryClause { anchor } => IndentAction::block(anchor, 0),

            ContextKind::ChainContinuation { align, anchor }
            | ContextKind::AfterDot { align, anchor } => match align {
                Some(column) => IndentAction::Align { column },
                None => IndentAction::continuation(anchor, 1),
            },

            ContextKind::LeadingOperator { anchor }
            | ContextKind::Assignment { anchor, .. }
            | ContextKind::IsExpression { anchor }
            | ContextKind::BinaryWithType { anchor }
            | ContextKind::OpenParenthesis { anchor, .. }
            | ContextKind::ListElement { anchor }
            | ContextKind::DelegationList { anchor }
            | ContextKind::Unhandled { anchor } => IndentAction::continuation(anchor, 1),

            ContextKind::LambdaArrow {
                anchor,
                single_line: true,
            } => IndentAction::continuation(anchor, 1),
            ContextKind::LambdaArrow {
                anchor,
                single_line: false,
            }
            | ContextKind::WhenEntryArrow { anchor }
            | ContextKind::ControlBody { anchor }
            | ContextKind::BlockBody { anchor }
            | ContextKind::EnumEntries { anchor }
            | ContextKind::EnumMembers { anchor } => IndentAction::block(anchor, 1),

            ContextKind::UnfinishedBinary {
                anchor,
                in_if_condition,
            } => IndentAction::continuation(anchor, if in_if_condition { 2 } else { 1 }),

            ContextKind::ArgumentList {
                align_column,
                anchor,
            } => IndentAction::AlignArguments {
                column: align_column,
                anchor,
                continuation: 1,
            },

            ContextKind::ImportDirective | ContextKind::ScriptTopLevel => IndentAction::absolute(0),

            ContextKind::StatementBoundary { anchor, depth } => IndentAction::block(anchor, depth),
        }
    }
}

/// Precedence tiers, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Leading,
    Trailing,
    Directive,
    Statement,
}

pub struct Rule {
    pub name: &'static str,
    pub tier: Tier,
    pub matches: fn(&ContextSnapshot) -> Option<ContextKind>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish()
    }
}

macro_rules! rule {
    ($tier:ident, $name:ident) => {
        Rule {
            name: stringify!($name),
            tier: Tier::$tier,
            matches: $name,
        }
    };
}

/// The rule table, ordered by tier.
pub static RULES: &[Rule] = &[
    rule!(Leading, closing_bracket),
    rule!(Leading, leading_dot),
    rule!(Leading, leading_clause),
    rule!(Leading, leading_operator),
    rule!(Trailing, lambda_arrow),
    rule!(Trailing, when_entry_arrow),
    rule!(Trailing, trailing_dot),
    rule!(Trailing, assignment),
    rule!(Trailing, binary_operator),
    rule!(Trailing, type_operator),
    rule!(Trailing, modifier_list),
    rule!(Trailing, try_clause),
    rule!(Trailing, control_header),
    rule!(Trailing, argument_list_open),
    rule!(Trailing, list_open),
    rule!(Trailing, block_open),
    rule!(Trailing, argument_comma),
    rule!(Trailing, list_comma),
    rule!(Trailing, enum_entry_comma),
    rule!(Trailing, delegation_list),
    rule!(Trailing, enum_semicolon),
    rule!(Trailing, semicolon),
    rule!(Directive, import_directive),
    rule!(Directive, script_top_level),
    rule!(Statement, enum_entry),
    rule!(Statement, argument_element),
    rule!(Statement, list_element),
    rule!(Statement, statement_boundary),
];

/// Classifies a snapshot. The first matching rule wins; a snapshot no rule
/// matches is indented one continuation step from its statement.
pub fn classify(snapshot: &ContextSnapshot) -> ContextKind {
    for rule in RULES {
        if let Some(kind) = (rule.matches)(snapshot) {
            log::trace!("classify: rule `{}` matched {:?}", rule.name, kind);
            return kind;
        }
    }
    unhandled(snapshot)
}

/// Like [`classify`], but evaluates every rule of the winning tier and
/// reports two rules that both match.
pub fn classify_strict(snapshot: &ContextSnapshot) -> Result<ContextKind, IndentError> {
    let mut winner: Option<(&Rule, ContextKind)> = None;
    for rule in RULES {
        if let Some((first, _)) = winner {
            if rule.tier != first.tier {
                break;
            }
        }
        if let Some(kind) = (rule.matches)(snapshot) {
            if let Some((first, _)) = winner {
                return Err(IndentError::AmbiguousRule {
                    first: first.name,
                    second: rule.name,
                });
            }
            winner = Some((rule, kind));
        }
    }
    Ok(winner.map_or_else(|| unhandled(snapshot), |(_, kind)| kind))
}

/// Name of the rule [`classify`] would pick, if any.
pub fn matching_rule(snapshot: &ContextSnapshot) -> Option<&'static str> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(snapshot).is_some())
        .map(|rule| rule.name)
}

fn unhandled(snapshot: &ContextSnapshot) -> ContextKind {
    log::debug!(
        "Unhandled indentation context at byte {}: {:?} before, {:?} after, in {:?}",
        snapshot.split_offset,
        snapshot.before,
        snapshot.after,
        snapshot.group.kind
    );
    ContextKind::Unhandled {
        anchor: snapshot.statement_indent(),
    }
}

// ============================================================================
// Leading-token tier
// ============================================================================

fn closing_bracket(s: &ContextSnapshot) -> Option<ContextKind> {
    match s.leading {
        LeadingRole::ClosingBracket { anchor } if !s.trailing.expects_operand() => {
            Some(ContextKind::ClosingBracket { anchor })
        }
        _ => None,
    }
}

fn leading_dot(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.leading == LeadingRole::Dot).then(|| ContextKind::ChainContinuation {
        align: s.chain_column,
        anchor: s.statement_indent(),
    })
}

fn leading_clause(s: &ContextSnapshot) -> Option<ContextKind> {
    let statement = s.statement?;
    (s.leading == LeadingRole::Clause).then_some(ContextKind::ClauseKeyword {
        anchor: statement.start_indent,
    })
}

fn leading_operator(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.leading == LeadingRole::Operator).then(|| ContextKind::LeadingOperator {
        anchor: s.statement_indent(),
    })
}

// ============================================================================
// Trailing-token tier
// ============================================================================

fn lambda_arrow(s: &ContextSnapshot) -> Option<ContextKind> {
    let facts = s.lambda_arrow?;
    Some(ContextKind::LambdaArrow {
        anchor: facts.anchor,
        single_line: facts.single_line,
    })
}

fn when_entry_arrow(s: &ContextSnapshot) -> Option<ContextKind> {
    let statement = s.statement?;
    (s.trailing == TrailingRole::Arrow && s.group.kind == GroupKind::WhenBody).then_some(
        ContextKind::WhenEntryArrow {
            anchor: statement.start_indent,
        },
    )
}

fn trailing_dot(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Dot).then(|| ContextKind::AfterDot {
        align: s.chain_column,
        anchor: s.statement_indent(),
    })
}

fn assignment(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Assignment).then(|| ContextKind::Assignment {
        anchor: s.statement_indent(),
        multideclaration: s
            .statement
            .is_some_and(|st| st.kind == StatementKind::Multideclaration),
    })
}

fn binary_operator(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::BinaryOperator).then(|| ContextKind::UnfinishedBinary {
        anchor: s.statement_indent(),
        in_if_condition: s.in_if_condition,
    })
}

fn type_operator(s: &ContextSnapshot) -> Option<ContextKind> {
    let anchor = s.statement_indent();
    match s.trailing {
        TrailingRole::TypeOperator { is_check: true } => Some(ContextKind::IsExpression { anchor }),
        TrailingRole::TypeOperator { is_check: false } => {
            Some(ContextKind::BinaryWithType { anchor })
        }
        _ => None,
    }
}

fn modifier_list(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Modifier).then(|| ContextKind::ModifierList {
        anchor: s.statement_indent(),
    })
}

fn try_clause(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::TryClause).then(|| ContextKind::TryClause {
        anchor: s.statement_indent(),
    })
}

fn control_header(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::ControlHeader).then(|| ContextKind::ControlBody {
        anchor: s.statement_indent(),
    })
}

fn argument_list_open(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::OpenBracket && s.group.kind == GroupKind::ArgumentList).then(
        || ContextKind::ArgumentList {
            align_column: s.group.opener_column + 1,
            anchor: s.group.opener_line_indent,
        },
    )
}

fn list_open(s: &ContextSnapshot) -> Option<ContextKind> {
    let kind = s.group.kind;
    (s.trailing == TrailingRole::OpenBracket && kind.is_list() && kind != GroupKind::ArgumentList)
        .then(|| ContextKind::OpenParenthesis {
            group: kind,
            anchor: s.group.opener_line_indent,
        })
}

fn block_open(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::OpenBracket && !s.group.kind.is_list()).then(|| {
        ContextKind::BlockBody {
            anchor: s.group.anchor,
        }
    })
}

fn argument_comma(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Comma && s.group.kind == GroupKind::ArgumentList)
        .then(|| argument_context(s))
}

fn list_comma(s: &ContextSnapshot) -> Option<ContextKind> {
    let kind = s.group.kind;
    (s.trailing == TrailingRole::Comma && kind.is_list() && kind != GroupKind::ArgumentList).then(
        || ContextKind::ListElement {
            anchor: s.group.opener_line_indent,
        },
    )
}

fn enum_entry_comma(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Comma && s.group.kind == GroupKind::EnumBody && s.group.enum_entries)
        .then(|| ContextKind::EnumEntries {
            anchor: s.group.anchor,
        })
}

fn delegation_list(s: &ContextSnapshot) -> Option<ContextKind> {
    let statement = s.statement?;
    let separator = matches!(s.trailing, TrailingRole::Colon | TrailingRole::Comma);
    (separator && statement.in_delegation_list && !s.group.kind.is_list()).then_some(
        ContextKind::DelegationList {
            anchor: statement.start_indent,
        },
    )
}

fn enum_semicolon(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Semicolon && s.group.kind == GroupKind::EnumBody).then(|| {
        ContextKind::EnumMembers {
            anchor: s.group.anchor,
        }
    })
}

fn semicolon(s: &ContextSnapshot) -> Option<ContextKind> {
    let kind = s.group.kind;
    (s.trailing == TrailingRole::Semicolon && kind != GroupKind::EnumBody && !kind.is_list())
        .then(|| content_indent(s))
}

// ============================================================================
// Directive tier
// ============================================================================

fn is_directive(s: &ContextSnapshot) -> bool {
    s.statement
        .is_some_and(|st| matches!(st.kind, StatementKind::Import | StatementKind::Package))
}

fn import_directive(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Terminator && is_directive(s)).then_some(ContextKind::ImportDirective)
}

fn script_top_level(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Terminator && s.is_script_top_level() && !is_directive(s))
        .then_some(ContextKind::ScriptTopLevel)
}

// ============================================================================
// Statement tier
// ============================================================================

fn enum_entry(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Terminator
        && s.group.kind == GroupKind::EnumBody
        && s.group.enum_entries)
        .then(|| ContextKind::EnumEntries {
            anchor: s.group.anchor,
        })
}

fn argument_element(s: &ContextSnapshot) -> Option<ContextKind> {
    (s.trailing == TrailingRole::Terminator && s.group.kind == GroupKind::ArgumentList)
        .then(|| argument_context(s))
}

fn list_element(s: &ContextSnapshot) -> Option<ContextKind> {
    let kind = s.group.kind;
    (s.trailing == TrailingRole::Terminator && kind.is_list() && kind != GroupKind::ArgumentList)
        .then(|| ContextKind::ListElement {
            anchor: s.group.opener_line_indent,
        })
}

fn statement_boundary(s: &ContextSnapshot) -> Option<ContextKind> {
    let kind = s.group.kind;
    let ends = matches!(s.trailing, TrailingRole::Terminator | TrailingRole::None);
    let entries = kind == GroupKind::EnumBody && s.group.enum_entries;
    (ends && !kind.is_list() && !entries).then(|| content_indent(s))
}

fn argument_context(s: &ContextSnapshot) -> ContextKind {
    ContextKind::ArgumentList {
        align_column: s
            .group
            .first_element_column
            .unwrap_or(s.group.opener_column + 1),
        anchor: s.group.opener_line_indent,
    }
}

fn content_indent(s: &ContextSnapshot) -> ContextKind {
    ContextKind::StatementBoundary {
        anchor: s.group.anchor,
        depth: s.group.content_steps(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indentation::context::{extract, SourceKind, SplitContext};

    fn snapshot_in(kind: SourceKind, fixture: &str) -> ContextSnapshot {
        let offset = fixture.find("<caret>").expect("fixture needs a caret");
        let text = fixture.replacen("<caret>", "\n", 1);
        match extract(&text, offset, kind, 4).expect("extraction should succeed") {
            SplitContext::Code(snapshot) => snapshot,
            SplitContext::InsideLiteral => panic!("unexpected literal context"),
        }
    }

    fn rule_for(fixture: &str) -> Option<&'static str> {
        matching_rule(&snapshot_in(SourceKind::File, fixture))
    }

    #[test]
    fn test_rules_are_ordered_by_tier() {
        for pair in RULES.windows(2) {
            assert!(
                pair[0].tier <= pair[1].tier,
                "{} must not follow {}",
                pair[1].name,
                pair[0].name
            );
        }
    }

    #[test]
    fn test_rule_names_are_unique() {
        let mut names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn test_assignment_records_multideclaration() {
        let fixture = "fun a() {\n    val (a, b) =<caret>\n}";
        let kind = classify(&snapshot_in(SourceKind::File, fixture));
        assert_eq!(
            kind,
            ContextKind::Assignment {
                anchor: 4,
                multideclaration: true
            }
        );
        let kind = classify(&snapshot_in(SourceKind::File, "val x =<caret>"));
        assert_eq!(
            kind,
            ContextKind::Assignment {
                anchor: 0,
                multideclaration: false
            }
        );
    }

    #[test]
    fn test_open_parenthesis_records_group() {
        for (fixture, group) in [
            ("fun a(<caret>", GroupKind::ParameterList),
            ("val x = (<caret>", GroupKind::Parenthesized),
            ("val (<caret>", GroupKind::Destructuring),
        ] {
            assert_eq!(
                classify(&snapshot_in(SourceKind::File, fixture)),
                ContextKind::OpenParenthesis { group, anchor: 0 },
                "fixture {:?}",
                fixture
            );
        }
    }

    #[test]
    fn test_closing_bracket_beats_trailing_brace() {
        assert_eq!(
            rule_for("try {\n} catch (e: Exception) {<caret>}"),
            Some("closing_bracket")
        );
    }

    #[test]
    fn test_operand_expected_overrides_closing_bracket() {
        assert_eq!(rule_for("val x = (1 +<caret>)"), Some("binary_operator"));
    }

    #[test]
    fn test_leading_dot_beats_trailing_terminator() {
        assert_eq!(rule_for("a?.b()<caret>?.c()"), Some("leading_dot"));
    }

    #[test]
    fn test_trailing_dot_inside_binary_expression() {
        assert_eq!(rule_for("val x = a + b.<caret>"), Some("trailing_dot"));
    }

    #[test]
    fn test_directive_tier() {
        assert_eq!(rule_for("import a.b.C<caret>"), Some("import_directive"));
        assert_eq!(
            matching_rule(&snapshot_in(SourceKind::Script, "println(1)<caret>")),
            Some("script_top_level")
        );
        assert_eq!(rule_for("println(1)<caret>"), Some("statement_boundary"));
    }

    #[test]
    fn test_lambda_arrow_and_when_arrow_are_distinct() {
        assert_eq!(rule_for("foo { x -><caret>\n}"), Some("lambda_arrow"));
        assert_eq!(
            rule_for("when (x) {\n    1 -><caret>\n}"),
            Some("when_entry_arrow")
        );
    }

    #[test]
    fn test_unhandled_context_falls_back_to_continuation() {
        let snapshot = snapshot_in(SourceKind::File, "fun a() {\n    val<caret>\n}");
        assert_eq!(matching_rule(&snapshot), None);
        assert_eq!(classify(&snapshot), ContextKind::Unhandled { anchor: 4 });
        assert_eq!(
            classify(&snapshot).action(),
            IndentAction::continuation(4, 1)
        );
    }

    #[test]
    fn test_strict_classification_agrees_with_classify() {
        let fixtures = [
            "val x =<caret>",
            "foo(a,<caret>",
            "class A : B,<caret>",
            "enum class E {\n    A,<caret>\n}",
            "enum class E {\n    A;<caret>\n}",
            "if (a)<caret>",
            "import a.b<caret>",
            "fun a() {<caret>}",
            "@Ann<caret>",
            "val (a, b)<caret> = p",
        ];
        for fixture in fixtures {
            let snapshot = snapshot_in(SourceKind::Script, fixture);
            assert_eq!(
                classify_strict(&snapshot),
                Ok(classify(&snapshot)),
                "fixture {:?}",
                fixture
            );
        }
    }

    #[test]
    fn test_ambiguous_rule_error_names_both_rules() {
        let err = IndentError::AmbiguousRule {
            first: "closing_bracket",
            second: "leading_dot",
        };
        assert!(err.to_string().contains("closing_bracket"));
        assert!(err.to_string().contains("leading_dot"));
    }
}
