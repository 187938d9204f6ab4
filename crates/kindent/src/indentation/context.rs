//! Context extraction for Kotlin newline indentation.
//!
//! Given the text after a line break was inserted, this module lexes and
//! groups the document and records the facts the rule table needs: the
//! tokens on either side of the break, their roles, the innermost
//! enclosing bracket group and the statement being continued.
//!
//! # Error Handling
//!
//! - An offset that does not point at a `\n` is rejected with
//!   [`IndentError::InvalidOffset`].
//! - Text that cannot be tokenized is rejected with
//!   [`IndentError::MalformedContext`].
//! - Incomplete syntax is never an error: unclosed groups are recorded as
//!   incomplete and the innermost one wins.

use crate::error::IndentError;
use crate::syntax::{
    tokenize, Control, GroupKind, Keyword, NodeId, NodeKind, StatementKind, SyntaxTree,
    Termination, Token, TokenKind,
};

use super::calculator::{get_line_indent, line_start, visual_column};

/// Whether the document is a regular source file or a script (`.kts`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    File,
    Script,
}

/// Result of extracting the context around a line break.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitContext {
    /// The break falls inside a comment or literal; nothing is indented.
    InsideLiteral,
    Code(ContextSnapshot),
}

/// One node of the enclosing chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnclosingNode {
    pub kind: NodeKind,
    pub incomplete: bool,
}

/// Role of the last significant token before the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingRole {
    /// Nothing precedes the break.
    None,
    /// The opening bracket of the innermost group.
    OpenBracket,
    Comma,
    Semicolon,
    Arrow,
    /// `.` or `?.`
    Dot,
    /// `=` or a compound assignment.
    Assignment,
    BinaryOperator,
    /// `is` / `!is` (`is_check`) or `as` / `as?`.
    TypeOperator { is_check: bool },
    Colon,
    /// The statement so far consists only of modifiers and annotations.
    Modifier,
    /// `try`, `catch`, `finally` or a catch parameter list.
    TryClause,
    /// A control condition's `)`, `else` or `do`, awaiting a body.
    ControlHeader,
    /// A token that can complete a statement.
    Terminator,
    Other,
}

impl TrailingRole {
    /// The previous line ends in an operator still waiting for its operand.
    pub fn expects_operand(self) -> bool {
        matches!(
            self,
            TrailingRole::Dot
                | TrailingRole::Assignment
                | TrailingRole::BinaryOperator
                | TrailingRole::TypeOperator { .. }
        )
    }
}

/// Role of the first significant token on the new line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadingRole {
    /// The new line has no significant token.
    None,
    /// A closing bracket; `anchor` is the indent its group is measured from.
    ClosingBracket { anchor: u32 },
    /// `.` or `?.`
    Dot,
    /// `catch`, `finally` or `else` continuing the statement above.
    Clause,
    /// `=`, `?:`, `&&`, `||`, `:`, `->`, `as` or `by`.
    Operator,
    Other,
}

/// Facts about the innermost group containing the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupFacts {
    pub kind: GroupKind,
    /// Indent the group's contents are measured from.
    pub anchor: u32,
    pub opener_line_indent: u32,
    /// Visual column of the opening bracket.
    pub opener_column: u32,
    /// Visual column of the first element, when it precedes the break.
    pub first_element_column: Option<u32>,
    /// Zero-based index of the element the new line belongs to.
    pub element_index: usize,
    pub incomplete: bool,
    /// Inside an enum body, before the `;` that ends the entries.
    pub enum_entries: bool,
}

impl GroupFacts {
    /// Block steps from the anchor to the group's content indent.
    pub fn content_steps(&self) -> i32 {
        match self.kind {
            GroupKind::File => 0,
            _ => 1,
        }
    }
}

/// Facts about the statement holding the token before the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementFacts {
    pub kind: StatementKind,
    /// Indent of the line the statement starts on.
    pub start_indent: u32,
    /// The break follows the `:` of a class header or a comma after it.
    pub in_delegation_list: bool,
}

/// Facts about a lambda whose parameter arrow precedes the break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LambdaArrowFacts {
    /// Indent of the line holding the lambda's `{`.
    pub anchor: u32,
    /// The lambda's closing `}` sits on the new line.
    pub single_line: bool,
}

/// Everything the rule table may inspect about one line break.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    pub source_kind: SourceKind,
    pub split_offset: usize,
    /// Enclosing nodes, innermost first, ending at the file root.
    pub enclosing: Vec<EnclosingNode>,
    pub before: Option<TokenKind>,
    pub after: Option<TokenKind>,
    pub trailing: TrailingRole,
    pub leading: LeadingRole,
    pub group: GroupFacts,
    pub statement: Option<StatementFacts>,
    pub lambda_arrow: Option<LambdaArrowFacts>,
    /// Column of the first line-leading `.`/`?.` in the statement's call
    /// chain, or of the first line that follows a trailing dot.
    pub chain_column: Option<u32>,
    /// The innermost group is an `if` condition.
    pub in_if_condition: bool,
    /// Indent of the line holding the token before the break.
    pub previous_line_indent: u32,
}

impl ContextSnapshot {
    /// Indent of the line the current statement starts on, or of the
    /// previous line when no statement is open.
    pub fn statement_indent(&self) -> u32 {
        self.statement
            .map_or(self.previous_line_indent, |s| s.start_indent)
    }

    pub fn is_script_top_level(&self) -> bool {
        self.source_kind == SourceKind::Script && self.group.kind == GroupKind::File
    }
}

/// Checks that `offset` points at a `\n` in `text`.
pub(crate) fn validate_split_offset(text: &str, offset: usize) -> Result<(), IndentError> {
    if text.as_bytes().get(offset) == Some(&b'\n') {
        Ok(())
    } else {
        Err(IndentError::InvalidOffset {
            offset,
            len: text.len(),
        })
    }
}

/// Extracts the indentation context for the line break at `split_offset`.
///
/// # Arguments
///
/// * `source` - The document text, already containing the new line break
/// * `split_offset` - Byte offset of the inserted `\n`
/// * `source_kind` - Whether the document is a script
/// * `tab_size` - Tab width used when measuring columns
///
/// # Returns
///
/// [`SplitContext::InsideLiteral`] when the break sits inside a comment or
/// literal, otherwise the snapshot of the surrounding code.
pub fn extract(
    source: &str,
    split_offset: usize,
    source_kind: SourceKind,
    tab_size: u32,
) -> Result<SplitContext, IndentError> {
    validate_split_offset(source, split_offset)?;
    let tokens = tokenize(source)?;

    if splits_literal(source, &tokens, split_offset) {
        log::trace!("extract: line break at {} is inside a literal", split_offset);
        return Ok(SplitContext::InsideLiteral);
    }

    let tree = SyntaxTree::build(source, &tokens);
    let extractor = Extractor {
        source,
        tokens: &tokens,
        tree: &tree,
        split: split_offset,
        tab_size,
    };
    Ok(SplitContext::Code(extractor.snapshot(source_kind)))
}

/// Whether the line break at `split` falls inside a literal or comment.
///
/// Multi-line tokens (block comments, raw strings) contain the break. Line
/// strings, char literals and line comments stop before it, so for those
/// the token ending at the break decides: an unterminated string or char
/// literal was cut in two, and a line comment was cut when its remainder
/// is now on the new line.
fn splits_literal(source: &str, tokens: &[Token], split: usize) -> bool {
    if tokens
        .iter()
        .any(|t| t.kind.is_literal_or_comment() && t.span.start < split && split < t.span.end)
    {
        return true;
    }
    let Some(last) = tokens.iter().rev().find(|t| t.span.end == split && !t.span.is_empty()) else {
        return false;
    };
    match last.kind {
        TokenKind::StringLit(Termination::Unclosed) => true,
        TokenKind::CharLit => {
            let text = last.text(source);
            text.len() < 2 || !text.ends_with('\'')
        }
        TokenKind::LineComment => {
            let rest = &source[split + 1..];
            let line = rest.split('\n').next().unwrap_or_default();
            !line.trim().is_empty()
        }
        _ => false,
    }
}

struct Extractor<'a> {
    source: &'a str,
    tokens: &'a [Token],
    tree: &'a SyntaxTree<'a>,
    split: usize,
    tab_size: u32,
}

impl Extractor<'_> {
    fn snapshot(&self, source_kind: SourceKind) -> ContextSnapshot {
        let prev = self
            .tokens
            .iter()
            .rposition(|t| !t.is_trivia() && t.span.end <= self.split);
        let next = self
            .tokens
            .iter()
            .position(|t| !t.is_trivia() && t.span.start > self.split)
            .filter(|&n| !self.source[self.split + 1..self.tokens[n].span.start].contains('\n'));

        let group = self.tree.innermost_group_at(self.split);
        let group_node = self.tree.node(group);
        let group_kind = group_node.group_kind().unwrap_or(GroupKind::File);
        let statement = prev
            .filter(|&p| group_node.open != Some(p))
            .and_then(|p| self.tree.statement_containing(group, p));

        let enclosing: Vec<EnclosingNode> = statement
            .into_iter()
            .chain(self.tree.ancestors(group))
            .map(|id| {
                let node = self.tree.node(id);
                EnclosingNode {
                    kind: node.kind,
                    incomplete: node.is_incomplete(),
                }
            })
            .collect();

        let group_facts = self.group_facts(group, statement, prev);
        let statement_facts = statement.map(|s| self.statement_facts(s, prev));
        let trailing = prev.map_or(TrailingRole::None, |p| {
            self.trailing_role(group, statement, p)
        });
        let leading = next.map_or(LeadingRole::None, |n| self.leading_role(group_kind, n));
        let lambda_arrow = match (trailing, prev) {
            (TrailingRole::Arrow, Some(p)) => self.lambda_arrow(group, p),
            _ => None,
        };

        let snapshot = ContextSnapshot {
            source_kind,
            split_offset: self.split,
            enclosing,
            before: prev.map(|p| self.tokens[p].kind),
            after: next.map(|n| self.tokens[n].kind),
            trailing,
            leading,
            group: group_facts,
            statement: statement_facts,
            lambda_arrow,
            chain_column: statement.and_then(|s| self.chain_column(s)),
            in_if_condition: group_kind == GroupKind::Condition(Control::If),
            previous_line_indent: prev.map_or(0, |p| self.line_indent(p)),
        };
        log::trace!(
            "extract: offset {} trailing {:?} leading {:?} group {:?}",
            self.split,
            snapshot.trailing,
            snapshot.leading,
            snapshot.group.kind
        );
        snapshot
    }

    fn line_indent(&self, token: usize) -> u32 {
        get_line_indent(self.source, self.tokens[token].span.start, self.tab_size)
    }

    fn column(&self, token: usize) -> u32 {
        visual_column(self.source, self.tokens[token].span.start, self.tab_size)
    }

    fn is_first_on_line(&self, token: usize) -> bool {
        let start = self.tokens[token].span.start;
        self.source[line_start(self.source, start)..start]
            .chars()
            .all(|c| matches!(c, ' ' | '\t' | '\u{FEFF}'))
    }

    /// Indent a group's contents and closing bracket are measured from.
    fn group_anchor(&self, group: NodeId) -> u32 {
        let node = self.tree.node(group);
        let Some(open) = node.open else { return 0 };
        let kind = node.group_kind().unwrap_or(GroupKind::File);
        if kind.anchors_to_statement() {
            // The parent of a group is the statement holding its opener.
            let owner = node.parent.and_then(|p| self.tree.node(p).items.first().copied());
            if let Some(first) = owner {
                return self.line_indent(first);
            }
        }
        self.line_indent(open)
    }

    fn group_facts(&self, group: NodeId, statement: Option<NodeId>, prev: Option<usize>) -> GroupFacts {
        let node = self.tree.node(group);
        let kind = node.group_kind().unwrap_or(GroupKind::File);
        let (opener_line_indent, opener_column) = match node.open {
            Some(open) => (self.line_indent(open), self.column(open)),
            None => (0, 0),
        };

        let first_element_column = node
            .children
            .first()
            .and_then(|&child| self.tree.node(child).items.first().copied())
            .filter(|&first| self.tokens[first].span.start < self.split)
            .map(|first| self.column(first));

        let element_index = match statement {
            Some(s) => {
                let position = node.children.iter().position(|&c| c == s).unwrap_or(0);
                let after_comma = prev.is_some_and(|p| self.tokens[p].kind == TokenKind::Comma);
                position + usize::from(after_comma)
            }
            None => 0,
        };

        let enum_entries = kind == GroupKind::EnumBody
            && !node.children.iter().any(|&child| {
                self.tree.node(child).items.last().is_some_and(|&last| {
                    self.tokens[last].kind == TokenKind::Semicolon
                        && self.tokens[last].span.end <= self.split
                })
            });

        GroupFacts {
            kind,
            anchor: self.group_anchor(group),
            opener_line_indent,
            opener_column,
            first_element_column,
            element_index,
            incomplete: node.is_incomplete(),
            enum_entries,
        }
    }

    fn statement_facts(&self, statement: NodeId, prev: Option<usize>) -> StatementFacts {
        let node = self.tree.node(statement);
        let kind = self.tree.statement_kind(statement);
        let start_indent = node.items.first().map_or(0, |&first| self.line_indent(first));

        let in_delegation_list = matches!(kind, StatementKind::ClassDeclaration { .. })
            && prev.is_some_and(|p| {
                let end = node.items.iter().take_while(|&&i| i <= p).count();
                matches!(self.tokens[p].kind, TokenKind::Colon | TokenKind::Comma)
                    && self.tree.has_supertype_colon(&node.items[..end])
            });

        StatementFacts {
            kind,
            start_indent,
            in_delegation_list,
        }
    }

    fn trailing_role(&self, group: NodeId, statement: Option<NodeId>, prev: usize) -> TrailingRole {
        let node = self.tree.node(group);
        if node.open == Some(prev) {
            return TrailingRole::OpenBracket;
        }
        let group_kind = node.group_kind().unwrap_or(GroupKind::File);
        let items: &[usize] = match statement {
            Some(s) => &self.tree.node(s).items,
            None => &[],
        };
        let position = items.iter().position(|&i| i == prev);

        let declares = !group_kind.is_list();
        if let Some(pos) = position {
            if declares && self.tree.modifier_prefix_len(&items[..=pos]) == pos + 1 {
                return TrailingRole::Modifier;
            }
        }

        let kind = self.tokens[prev].kind;
        match kind {
            TokenKind::Comma => TrailingRole::Comma,
            TokenKind::Semicolon => TrailingRole::Semicolon,
            TokenKind::Arrow => TrailingRole::Arrow,
            TokenKind::Dot | TokenKind::SafeDot => TrailingRole::Dot,
            TokenKind::Colon => TrailingRole::Colon,
            k if k.is_assignment() => TrailingRole::Assignment,
            TokenKind::Gt | TokenKind::Star
                if position.is_some_and(|pos| self.tree.ends_statement(items, pos)) =>
            {
                TrailingRole::Terminator
            }
            k if k.is_binary_operator() => TrailingRole::BinaryOperator,
            TokenKind::Question
                if position.is_some_and(|pos| {
                    pos > 0 && self.tree.keyword(items[pos - 1]) == Some(Keyword::As)
                }) =>
            {
                TrailingRole::TypeOperator { is_check: false }
            }
            TokenKind::RParen => match self
                .tree
                .group_of_token(prev)
                .and_then(|g| self.tree.node(g).group_kind())
            {
                Some(GroupKind::Condition(Control::If | Control::While | Control::For)) => {
                    TrailingRole::ControlHeader
                }
                Some(GroupKind::CatchParameter) => TrailingRole::TryClause,
                Some(GroupKind::Condition(Control::When)) => TrailingRole::Other,
                _ => TrailingRole::Terminator,
            },
            TokenKind::Ident => match self.tree.keyword(prev) {
                Some(Keyword::Is) => TrailingRole::TypeOperator { is_check: true },
                Some(Keyword::As) => TrailingRole::TypeOperator { is_check: false },
                Some(Keyword::In) => TrailingRole::BinaryOperator,
                Some(Keyword::Try | Keyword::Catch | Keyword::Finally) => TrailingRole::TryClause,
                Some(Keyword::Else | Keyword::Do) => TrailingRole::ControlHeader,
                _ => self.terminator_or_other(items, position),
            },
            _ => self.terminator_or_other(items, position),
        }
    }

    fn terminator_or_other(&self, items: &[usize], position: Option<usize>) -> TrailingRole {
        match position {
            Some(pos) if self.tree.ends_statement(items, pos) => TrailingRole::Terminator,
            _ => TrailingRole::Other,
        }
    }

    fn leading_role(&self, group_kind: GroupKind, next: usize) -> LeadingRole {
        let kind = self.tokens[next].kind;
        if kind.is_closer() {
            let closes = self
                .tree
                .group_of_token(next)
                .filter(|&g| self.tree.node(g).close == Some(next));
            return match closes {
                Some(g) => LeadingRole::ClosingBracket {
                    anchor: self.group_anchor(g),
                },
                None => LeadingRole::Other,
            };
        }
        match kind {
            TokenKind::Dot | TokenKind::SafeDot => LeadingRole::Dot,
            TokenKind::Eq
            | TokenKind::Elvis
            | TokenKind::AndAnd
            | TokenKind::OrOr
            | TokenKind::Colon
            | TokenKind::Arrow => LeadingRole::Operator,
            TokenKind::Ident => match self.tree.keyword(next) {
                Some(Keyword::Catch | Keyword::Finally) => LeadingRole::Clause,
                Some(Keyword::Else) if group_kind != GroupKind::WhenBody => LeadingRole::Clause,
                Some(Keyword::As | Keyword::By) => LeadingRole::Operator,
                _ => LeadingRole::Other,
            },
            _ => LeadingRole::Other,
        }
    }

    /// Facts for a lambda whose parameter list ends with the arrow `prev`.
    fn lambda_arrow(&self, group: NodeId, prev: usize) -> Option<LambdaArrowFacts> {
        let node = self.tree.node(group);
        if node.group_kind() != Some(GroupKind::Lambda) {
            return None;
        }
        let params = node.children.first().map(|&c| self.tree.node(c))?;
        if params.items.last() != Some(&prev) {
            return None;
        }
        let open = node.open?;
        let single_line = node.close.is_some_and(|close| {
            let start = self.tokens[close].span.start;
            start > self.split && !self.source[self.split + 1..start].contains('\n')
        });
        Some(LambdaArrowFacts {
            anchor: self.line_indent(open),
            single_line,
        })
    }

    fn chain_column(&self, statement: NodeId) -> Option<u32> {
        let items = &self.tree.node(statement).items;
        let is_dot = |i: usize| matches!(self.tokens[i].kind, TokenKind::Dot | TokenKind::SafeDot);
        for k in 1..items.len() {
            let index = items[k];
            if self.tokens[index].span.start >= self.split {
                break;
            }
            if !self.is_first_on_line(index) {
                continue;
            }
            if is_dot(index) || is_dot(items[k - 1]) {
                return Some(self.column(index));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Splits a fixture at its `<caret>` marker into text and newline
    /// offset, inserting the line break the user just typed.
    fn at_caret(fixture: &str) -> (String, usize) {
        let offset = fixture.find("<caret>").expect("fixture needs a caret");
        let text = fixture.replacen("<caret>", "\n", 1);
        (text, offset)
    }

    fn snapshot(fixture: &str) -> ContextSnapshot {
        let (text, offset) = at_caret(fixture);
        match extract(&text, offset, SourceKind::File, 4).expect("extraction should succeed") {
            SplitContext::Code(snapshot) => snapshot,
            SplitContext::InsideLiteral => panic!("unexpected literal context"),
        }
    }

    #[test]
    fn test_rejects_offset_not_on_newline() {
        let err = extract("val x = 1", 3, SourceKind::File, 4).unwrap_err();
        assert_eq!(err, IndentError::InvalidOffset { offset: 3, len: 9 });
        let err = extract("val x = 1", 42, SourceKind::File, 4).unwrap_err();
        assert_eq!(err, IndentError::InvalidOffset { offset: 42, len: 9 });
    }

    #[test]
    fn test_malformed_text() {
        let err = extract("val x = #\n", 9, SourceKind::File, 4).unwrap_err();
        assert_eq!(err, IndentError::MalformedContext { offset: 8 });
    }

    #[test]
    fn test_inside_block_comment_and_raw_string() {
        let (text, offset) = at_caret("/* comment<caret> */");
        assert_eq!(
            extract(&text, offset, SourceKind::File, 4).unwrap(),
            SplitContext::InsideLiteral
        );
        let (text, offset) = at_caret("val s = \"\"\"<caret>\"\"\"");
        assert_eq!(
            extract(&text, offset, SourceKind::File, 4).unwrap(),
            SplitContext::InsideLiteral
        );
    }

    #[test]
    fn test_inside_line_string_char_and_line_comment() {
        for fixture in [
            "val s = \"ab<caret>cd\"",
            "val s = \"ab<caret>",
            "val s = \"a\\<caret>b\"",
            "val c = '<caret>'",
            "foo() // ab<caret>cd",
            "foo() // ab\r<caret>cd\r\n",
        ] {
            let (text, offset) = at_caret(fixture);
            assert_eq!(
                extract(&text, offset, SourceKind::File, 4).unwrap(),
                SplitContext::InsideLiteral,
                "fixture {:?}",
                fixture
            );
        }
    }

    #[test]
    fn test_after_line_comment_is_code() {
        let s = snapshot("val x = 1 // note<caret>");
        assert_eq!(s.trailing, TrailingRole::Terminator);
        let s = snapshot("val x = 1 // note<caret>  \n");
        assert_eq!(s.trailing, TrailingRole::Terminator);
    }

    #[test]
    fn test_trailing_roles() {
        assert_eq!(snapshot("val x =<caret>").trailing, TrailingRole::Assignment);
        assert_eq!(snapshot("val x = a +<caret>").trailing, TrailingRole::BinaryOperator);
        assert_eq!(snapshot("a.<caret>").trailing, TrailingRole::Dot);
        assert_eq!(snapshot("a?.<caret>").trailing, TrailingRole::Dot);
        assert_eq!(
            snapshot("val x = a is<caret>").trailing,
            TrailingRole::TypeOperator { is_check: true }
        );
        assert_eq!(
            snapshot("val x = a as?<caret>").trailing,
            TrailingRole::TypeOperator { is_check: false }
        );
        assert_eq!(snapshot("if (a)<caret>").trailing, TrailingRole::ControlHeader);
        assert_eq!(snapshot("try {\n} catch (e: E)<caret>").trailing, TrailingRole::TryClause);
        assert_eq!(snapshot("foo(<caret>").trailing, TrailingRole::OpenBracket);
        assert_eq!(snapshot("val x: List<Int><caret>").trailing, TrailingRole::Terminator);
        assert_eq!(snapshot("import a.*<caret>").trailing, TrailingRole::Terminator);
    }

    #[test]
    fn test_modifier_roles() {
        assert_eq!(snapshot("class A {\n    private<caret>\n}").trailing, TrailingRole::Modifier);
        assert_eq!(snapshot("@Deprecated(\"\")<caret>").trailing, TrailingRole::Modifier);
        assert_eq!(snapshot("val x = data<caret>").trailing, TrailingRole::Terminator);
    }

    #[test]
    fn test_leading_roles() {
        assert_eq!(
            snapshot("fun a() {\n    if (b) {<caret>}\n}").leading,
            LeadingRole::ClosingBracket { anchor: 4 }
        );
        assert_eq!(snapshot("a.b()<caret>.c()").leading, LeadingRole::Dot);
        assert_eq!(snapshot("val (a, b)<caret> = p").leading, LeadingRole::Operator);
        assert_eq!(snapshot("try {\n}<caret>catch (e: E) {}").leading, LeadingRole::Clause);
        assert_eq!(snapshot("foo()<caret>").leading, LeadingRole::None);
    }

    #[test]
    fn test_when_else_is_not_a_clause() {
        let s = snapshot("when (x) {\n    1 -> a<caret>else -> b\n}");
        assert_eq!(s.leading, LeadingRole::Other);
        assert_eq!(s.group.kind, GroupKind::WhenBody);
    }

    #[test]
    fn test_enclosing_chain_innermost_first() {
        let s = snapshot("class A {\n    fun b() {\n        foo(<caret>\n    }\n}");
        let kinds: Vec<_> = s.enclosing.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Group(GroupKind::ArgumentList),
                NodeKind::Statement,
                NodeKind::Group(GroupKind::Block),
                NodeKind::Statement,
                NodeKind::Group(GroupKind::ClassBody),
                NodeKind::Statement,
                NodeKind::Group(GroupKind::File),
            ]
        );
        assert!(s.enclosing[0].incomplete);
        assert!(!s.enclosing[2].incomplete);
    }

    #[test]
    fn test_group_anchor_uses_owning_statement() {
        let s = snapshot("fun a() {\n    try {\n    } catch (e: E) {<caret>\n    }\n}");
        assert_eq!(s.group.kind, GroupKind::Block);
        assert_eq!(s.group.anchor, 4);
    }

    #[test]
    fn test_argument_facts() {
        let s = snapshot("fun a() {\n    foobar(1,<caret>\n}");
        assert_eq!(s.group.kind, GroupKind::ArgumentList);
        assert_eq!(s.group.opener_column, 10);
        assert_eq!(s.group.first_element_column, Some(11));
        assert_eq!(s.group.element_index, 1);
        assert_eq!(s.group.opener_line_indent, 4);
    }

    #[test]
    fn test_first_element_index() {
        let s = snapshot("foo(<caret>");
        assert_eq!(s.group.element_index, 0);
        assert_eq!(s.group.first_element_column, None);
    }

    #[test]
    fn test_lambda_arrow_facts() {
        let s = snapshot("fun a() {\n    foo { x -><caret>\n    }\n}");
        assert_eq!(
            s.lambda_arrow,
            Some(LambdaArrowFacts {
                anchor: 4,
                single_line: false
            })
        );
        let s = snapshot("foo { x -><caret> x * 2 }");
        assert_eq!(
            s.lambda_arrow,
            Some(LambdaArrowFacts {
                anchor: 0,
                single_line: true
            })
        );
    }

    #[test]
    fn test_chain_column() {
        let s = snapshot("fun a() {\n    val x = foo.\n            bar.<caret>\n}");
        assert_eq!(s.chain_column, Some(12));
        let s = snapshot("a.b()\n    .c().<caret>");
        assert_eq!(s.chain_column, Some(4));
        let s = snapshot("a.b()<caret>");
        assert_eq!(s.chain_column, None);
    }

    #[test]
    fn test_delegation_list() {
        let s = snapshot("class A :<caret>");
        assert!(s.statement.unwrap().in_delegation_list);
        let s = snapshot("class A : B,<caret>");
        assert!(s.statement.unwrap().in_delegation_list);
        let s = snapshot("class A<T : Any>(val t: T) : B(),<caret>");
        assert!(s.statement.unwrap().in_delegation_list);
        let s = snapshot("val x: Int =<caret>");
        assert!(!s.statement.unwrap().in_delegation_list);
    }

    #[test]
    fn test_if_condition_flag() {
        assert!(snapshot("fun a() {\n    if (a &&<caret>\n}").in_if_condition);
        assert!(!snapshot("fun a() {\n    while (a &&<caret>\n}").in_if_condition);
    }

    #[test]
    fn test_enum_entries_flag() {
        assert!(snapshot("enum class E {\n    A,<caret>\n}").group.enum_entries);
        assert!(!snapshot("enum class E {\n    A, B;<caret>\n}").group.enum_entries);
    }

    #[test]
    fn test_newline_at_start_of_file() {
        let s = snapshot("<caret>fun a() {}");
        assert_eq!(s.trailing, TrailingRole::None);
        assert_eq!(s.group.kind, GroupKind::File);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "fun a() {\r\n\r\n}";
        let s = match extract(text, 10, SourceKind::File, 4).unwrap() {
            SplitContext::Code(s) => s,
            SplitContext::InsideLiteral => panic!("unexpected literal context"),
        };
        assert_eq!(s.trailing, TrailingRole::OpenBracket);
        assert_eq!(s.group.kind, GroupKind::Block);
    }
}
