//! Bracket-and-statement tree over a token stream.
//!
//! The tree is deliberately shallow: it knows which bracket group every
//! token sits in and how each group's contents split into statements (or
//! list elements), which is all the indentation rules need. It is built in
//! a single pass and never fails. Missing closers leave their group
//! incomplete, closers that match an outer group abandon the inner ones,
//! and closers that match nothing are kept as ordinary tokens.

use super::lexer::{Keyword, Modifier, Token, TokenKind};

pub type NodeId = usize;

/// Control-flow keyword owning a parenthesized condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    If,
    While,
    For,
    When,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    File,
    /// Function, control-flow and initializer bodies.
    Block,
    ClassBody,
    EnumBody,
    WhenBody,
    Lambda,
    ArgumentList,
    ParameterList,
    Condition(Control),
    CatchParameter,
    Parenthesized,
    Destructuring,
    /// `[...]` collection literals and index expressions.
    Collection,
}

impl GroupKind {
    /// Groups whose contents are comma-separated elements.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            GroupKind::ArgumentList
                | GroupKind::ParameterList
                | GroupKind::Condition(_)
                | GroupKind::CatchParameter
                | GroupKind::Parenthesized
                | GroupKind::Destructuring
                | GroupKind::Collection
        )
    }

    /// Brace bodies indented relative to the statement that owns them,
    /// rather than to the line holding the opening bracket.
    pub fn anchors_to_statement(self) -> bool {
        matches!(
            self,
            GroupKind::Block | GroupKind::ClassBody | GroupKind::EnumBody | GroupKind::WhenBody
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group(GroupKind),
    Statement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Package,
    Import,
    ClassDeclaration { is_enum: bool },
    Function,
    Property,
    Multideclaration,
    Control,
    Try,
    Jump,
    Expression,
    ListElement,
    EnumEntry,
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Statements: indices of the significant tokens at this nesting depth,
    /// including the brackets of child groups.
    pub items: Vec<usize>,
    /// Groups: index of the opening bracket (`None` for the file root).
    pub open: Option<usize>,
    /// Groups: index of the matching closing bracket, if one was found.
    pub close: Option<usize>,
    /// Groups: byte offset where the group's contents end.
    pub end_offset: usize,
}

impl SyntaxNode {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            items: Vec::new(),
            open: None,
            close: None,
            end_offset: usize::MAX,
        }
    }

    pub fn group_kind(&self) -> Option<GroupKind> {
        match self.kind {
            NodeKind::Group(kind) => Some(kind),
            NodeKind::Statement => None,
        }
    }

    /// A non-root group whose closing bracket is missing.
    pub fn is_incomplete(&self) -> bool {
        self.open.is_some() && self.close.is_none()
    }
}

pub struct SyntaxTree<'a> {
    source: &'a str,
    tokens: &'a [Token],
    nodes: Vec<SyntaxNode>,
    group_of_token: Vec<Option<NodeId>>,
}

impl<'a> SyntaxTree<'a> {
    pub const ROOT: NodeId = 0;

    pub fn build(source: &'a str, tokens: &'a [Token]) -> Self {
        let mut builder = Builder {
            tree: SyntaxTree {
                source,
                tokens,
                nodes: vec![SyntaxNode::new(NodeKind::Group(GroupKind::File), None)],
                group_of_token: vec![None; tokens.len()],
            },
            stack: vec![Frame::new(Self::ROOT, GroupKind::File)],
        };

        for (index, token) in tokens.iter().enumerate() {
            if !token.is_trivia() {
                builder.push_token(index);
            }
        }

        builder.tree
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The group opened or closed by the bracket token at `index`.
    pub fn group_of_token(&self, index: usize) -> Option<NodeId> {
        self.group_of_token.get(index).copied().flatten()
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&node| self.nodes[node].parent)
    }

    /// The deepest group whose contents contain byte `offset`.
    pub fn innermost_group_at(&self, offset: usize) -> NodeId {
        let mut best = Self::ROOT;
        let mut best_open = None;
        for (id, node) in self.nodes.iter().enumerate() {
            let Some(open) = node.open else { continue };
            let content_start = self.tokens[open].span.end;
            let content_end = match node.close {
                Some(close) => self.tokens[close].span.start,
                None => node.end_offset,
            };
            if content_start <= offset && offset < content_end && best_open < Some(open) {
                best = id;
                best_open = Some(open);
            }
        }
        best
    }

    /// The statement (or list element) of `group` that holds the token at
    /// `index` at the group's own depth.
    pub fn statement_containing(&self, group: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[group].children.iter().copied().find(|&child| {
            let items = &self.nodes[child].items;
            matches!((items.first(), items.last()), (Some(&first), Some(&last)) if first <= index && index <= last)
        })
    }

    /// The group a statement belongs to.
    pub fn owning_group(&self, statement: NodeId) -> NodeId {
        self.nodes[statement].parent.unwrap_or(Self::ROOT)
    }

    pub fn keyword(&self, index: usize) -> Option<Keyword> {
        self.tokens[index].keyword(self.source)
    }

    pub fn kind_of(&self, index: usize) -> TokenKind {
        self.tokens[index].kind
    }

    pub fn statement_kind(&self, statement: NodeId) -> StatementKind {
        let group = self.owning_group(statement);
        let group_kind = self.nodes[group].group_kind().unwrap_or(GroupKind::File);
        if group_kind.is_list() {
            return StatementKind::ListElement;
        }
        if group_kind == GroupKind::EnumBody && self.in_enum_entries(group, statement) {
            return StatementKind::EnumEntry;
        }

        let items = &self.nodes[statement].items;
        let prefix = self.modifier_prefix_len(items);
        let Some(&head) = items.get(prefix) else {
            return StatementKind::Expression;
        };

        match self.keyword(head) {
            Some(Keyword::Package) => StatementKind::Package,
            Some(Keyword::Import) => StatementKind::Import,
            Some(kw) if kw.is_class_like() => StatementKind::ClassDeclaration {
                is_enum: self.has_enum_modifier(&items[..prefix]),
            },
            Some(Keyword::Fun) => StatementKind::Function,
            Some(Keyword::Val | Keyword::Var) => {
                let destructures = items
                    .get(prefix + 1)
                    .is_some_and(|&next| self.kind_of(next) == TokenKind::LParen);
                if destructures {
                    StatementKind::Multideclaration
                } else {
                    StatementKind::Property
                }
            }
            Some(Keyword::If | Keyword::When | Keyword::For | Keyword::While | Keyword::Do) => {
                StatementKind::Control
            }
            Some(Keyword::Try) => StatementKind::Try,
            Some(Keyword::Return | Keyword::Break | Keyword::Continue | Keyword::Throw) => {
                StatementKind::Jump
            }
            _ => StatementKind::Expression,
        }
    }

    /// Whether `statement` comes before the `;` that ends an enum's entries.
    fn in_enum_entries(&self, group: NodeId, statement: NodeId) -> bool {
        for &sibling in &self.nodes[group].children {
            if sibling == statement {
                return true;
            }
            let ends_entries = self.nodes[sibling]
                .items
                .last()
                .is_some_and(|&last| self.kind_of(last) == TokenKind::Semicolon);
            if ends_entries {
                return false;
            }
        }
        true
    }

    fn has_enum_modifier(&self, items: &[usize]) -> bool {
        items
            .iter()
            .any(|&i| self.keyword(i) == Some(Keyword::Modifier(Modifier::Enum)))
    }

    /// Number of leading `items` forming a complete run of modifiers and
    /// annotations (`@Target:Name.Qualified(args)`).
    pub fn modifier_prefix_len(&self, items: &[usize]) -> usize {
        let is_ident = |pos: usize| {
            items
                .get(pos)
                .is_some_and(|&i| self.kind_of(i) == TokenKind::Ident)
        };
        let is_kind = |pos: usize, kind: TokenKind| {
            items.get(pos).is_some_and(|&i| self.kind_of(i) == kind)
        };

        let mut pos = 0;
        let mut complete = 0;
        while let Some(&index) = items.get(pos) {
            match self.kind_of(index) {
                TokenKind::Ident if matches!(self.keyword(index), Some(Keyword::Modifier(_))) => {
                    pos += 1;
                    complete = pos;
                }
                TokenKind::At => {
                    pos += 1;
                    if is_ident(pos) && is_kind(pos + 1, TokenKind::Colon) {
                        pos += 2;
                    }
                    if !is_ident(pos) {
                        break;
                    }
                    pos += 1;
                    while is_kind(pos, TokenKind::Dot) && is_ident(pos + 1) {
                        pos += 2;
                    }
                    if is_kind(pos, TokenKind::LParen) {
                        if !is_kind(pos + 1, TokenKind::RParen) {
                            break;
                        }
                        pos += 2;
                    }
                    complete = pos;
                }
                _ => break,
            }
        }
        complete
    }

    /// Whether the `>` at `items[pos]` closes a type argument or type
    /// parameter list rather than comparing two values.
    pub fn closes_type_arguments(&self, items: &[usize], pos: usize) -> bool {
        let mut depth = 0i32;
        for k in (0..=pos).rev() {
            let index = items[k];
            match self.kind_of(index) {
                TokenKind::Gt => depth += 1,
                TokenKind::Lt => {
                    depth -= 1;
                    if depth == 0 {
                        return k > 0 && self.opens_type_arguments(items[k - 1], index);
                    }
                }
                TokenKind::Ident
                | TokenKind::Comma
                | TokenKind::Dot
                | TokenKind::Question
                | TokenKind::Star
                | TokenKind::Colon
                | TokenKind::Arrow
                | TokenKind::At
                | TokenKind::LParen
                | TokenKind::RParen => {}
                _ => return false,
            }
        }
        false
    }

    fn opens_type_arguments(&self, before: usize, lt: usize) -> bool {
        if matches!(
            self.keyword(before),
            Some(Keyword::Fun | Keyword::Class | Keyword::Interface)
        ) {
            return true;
        }
        self.kind_of(before) == TokenKind::Ident
            && self.tokens[before].span.end == self.tokens[lt].span.start
    }

    fn line_break_between(&self, before: usize, after: usize) -> bool {
        let start = self.tokens[before].span.end;
        let end = self.tokens[after].span.start;
        self.source[start..end].contains('\n')
    }

    /// Whether the statement can be complete with `items[pos]` as its last
    /// significant token.
    pub fn ends_statement(&self, items: &[usize], pos: usize) -> bool {
        if self.modifier_prefix_len(&items[..=pos]) == pos + 1 {
            return false;
        }
        let index = items[pos];
        match self.kind_of(index) {
            TokenKind::Ident => !matches!(
                self.keyword(index),
                Some(
                    Keyword::Package
                        | Keyword::Import
                        | Keyword::Class
                        | Keyword::Interface
                        | Keyword::Object
                        | Keyword::Fun
                        | Keyword::Val
                        | Keyword::Var
                        | Keyword::Constructor
                        | Keyword::Init
                        | Keyword::If
                        | Keyword::Else
                        | Keyword::When
                        | Keyword::While
                        | Keyword::Do
                        | Keyword::For
                        | Keyword::Try
                        | Keyword::Catch
                        | Keyword::Finally
                        | Keyword::Throw
                        | Keyword::Is
                        | Keyword::As
                        | Keyword::In
                        | Keyword::By
                        | Keyword::Where
                        | Keyword::Typealias
                )
            ),
            TokenKind::Number
            | TokenKind::StringLit(_)
            | TokenKind::CharLit
            | TokenKind::RBracket
            | TokenKind::RBrace
            | TokenKind::BangBang
            | TokenKind::PlusPlus
            | TokenKind::MinusMinus => true,
            TokenKind::RParen => !matches!(
                self.group_of_token(index).and_then(|g| self.nodes[g].group_kind()),
                Some(GroupKind::Condition(_) | GroupKind::CatchParameter)
            ),
            TokenKind::Question => {
                pos == 0 || self.keyword(items[pos - 1]) != Some(Keyword::As)
            }
            TokenKind::Gt => self.closes_type_arguments(items, pos),
            TokenKind::Star => {
                items.first().and_then(|&i| self.keyword(i)) == Some(Keyword::Import)
            }
            _ => false,
        }
    }

    /// Whether a line starting with `index` continues the statement above.
    fn continues_statement(&self, group: GroupKind, items: &[usize], index: usize) -> bool {
        match self.kind_of(index) {
            TokenKind::Dot
            | TokenKind::SafeDot
            | TokenKind::Elvis
            | TokenKind::AndAnd
            | TokenKind::OrOr
            | TokenKind::Eq
            | TokenKind::Colon
            | TokenKind::Arrow => true,
            TokenKind::Ident => match self.keyword(index) {
                Some(Keyword::Else) => group != GroupKind::WhenBody,
                Some(Keyword::Catch | Keyword::Finally | Keyword::As | Keyword::By | Keyword::Where) => {
                    true
                }
                _ => false,
            },
            TokenKind::LBrace => self.header_awaits_body(items),
            _ => false,
        }
    }

    /// A declaration header (`class A : B`, `fun f(): T`) that has not yet
    /// received its body.
    fn header_awaits_body(&self, items: &[usize]) -> bool {
        let has_body = items.iter().any(|&i| self.kind_of(i) == TokenKind::LBrace);
        !has_body && self.declaration_header(items) != Header::None
    }

    fn declaration_header(&self, items: &[usize]) -> Header {
        let prefix = self.modifier_prefix_len(items);
        let mut header = match items.get(prefix).and_then(|&i| self.keyword(i)) {
            Some(Keyword::Init | Keyword::Constructor) => Header::Function,
            Some(Keyword::Get | Keyword::Set) => Header::Accessor,
            _ => Header::None,
        };
        for &index in items {
            match self.keyword(index) {
                Some(kw) if kw.is_class_like() => {
                    header = Header::Class {
                        is_enum: self.has_enum_modifier(items),
                    }
                }
                Some(Keyword::Fun) => header = Header::Function,
                _ if self.kind_of(index) == TokenKind::Eq => header = Header::None,
                _ => {}
            }
        }
        header
    }

    /// Whether `items` end inside a class header's supertype list: a `:`
    /// outside angle brackets was seen and no `where` clause followed it.
    pub fn has_supertype_colon(&self, items: &[usize]) -> bool {
        let mut angle_depth = 0u32;
        let mut seen = false;
        for &index in items {
            match self.kind_of(index) {
                TokenKind::Lt => angle_depth += 1,
                TokenKind::Gt => angle_depth = angle_depth.saturating_sub(1),
                TokenKind::Colon if angle_depth == 0 => seen = true,
                TokenKind::Ident if self.keyword(index) == Some(Keyword::Where) => seen = false,
                _ => {}
            }
        }
        seen
    }

    fn has_group(&self, items: &[usize], kind: GroupKind) -> bool {
        items.iter().any(|&i| {
            self.group_of_token(i)
                .and_then(|g| self.nodes[g].group_kind())
                == Some(kind)
        })
    }

    fn classify_group(&self, frame: &Frame, statement: NodeId, open: usize) -> GroupKind {
        let items = &self.nodes[statement].items;
        let before = &items[..items.len().saturating_sub(1)];
        let prev = before.last().copied();
        let prev_kind = prev.map(|p| self.kind_of(p));
        let prev_keyword = prev.and_then(|p| self.keyword(p));
        let prev_group = prev
            .filter(|&p| self.kind_of(p) == TokenKind::RParen)
            .and_then(|p| self.group_of_token(p))
            .and_then(|g| self.nodes[g].group_kind());
        let header = self.declaration_header(before);

        match self.kind_of(open) {
            TokenKind::LBracket => GroupKind::Collection,
            TokenKind::LParen => {
                match prev_keyword {
                    Some(Keyword::If) => return GroupKind::Condition(Control::If),
                    Some(Keyword::While) => return GroupKind::Condition(Control::While),
                    Some(Keyword::For) => return GroupKind::Condition(Control::For),
                    Some(Keyword::When) => return GroupKind::Condition(Control::When),
                    Some(Keyword::Catch) => return GroupKind::CatchParameter,
                    Some(Keyword::Val | Keyword::Var) => return GroupKind::Destructuring,
                    Some(Keyword::Constructor | Keyword::Fun) => return GroupKind::ParameterList,
                    _ => {}
                }
                let callable = matches!(
                    prev_kind,
                    Some(
                        TokenKind::Ident
                            | TokenKind::RParen
                            | TokenKind::RBracket
                            | TokenKind::RBrace
                            | TokenKind::Gt
                            | TokenKind::BangBang
                    )
                );
                if !callable {
                    return GroupKind::Parenthesized;
                }
                let first_parens = !self.has_group(before, GroupKind::ParameterList);
                let names_declaration = matches!(prev_kind, Some(TokenKind::Ident | TokenKind::Gt));
                let declares = match header {
                    Header::Function => first_parens && names_declaration,
                    Header::Class { .. } => {
                        first_parens && names_declaration && !self.has_supertype_colon(before)
                    }
                    Header::Accessor => matches!(prev_keyword, Some(Keyword::Get | Keyword::Set)),
                    Header::None => false,
                };
                if declares {
                    GroupKind::ParameterList
                } else {
                    GroupKind::ArgumentList
                }
            }
            _ => {
                if frame.kind == GroupKind::EnumBody && frame.enum_entries {
                    return GroupKind::ClassBody;
                }
                if prev_kind == Some(TokenKind::Arrow) && frame.kind == GroupKind::WhenBody {
                    return GroupKind::Block;
                }
                match prev_keyword {
                    Some(Keyword::Else | Keyword::Try | Keyword::Finally | Keyword::Do | Keyword::Init) => {
                        return GroupKind::Block
                    }
                    Some(Keyword::When) => return GroupKind::WhenBody,
                    _ => {}
                }
                match prev_group {
                    Some(GroupKind::Condition(Control::When)) => return GroupKind::WhenBody,
                    Some(GroupKind::Condition(_) | GroupKind::CatchParameter) => {
                        return GroupKind::Block
                    }
                    _ => {}
                }
                match header {
                    Header::Class { is_enum: true } => GroupKind::EnumBody,
                    Header::Class { is_enum: false } => GroupKind::ClassBody,
                    Header::Function | Header::Accessor => GroupKind::Block,
                    Header::None => GroupKind::Lambda,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    None,
    Class { is_enum: bool },
    Function,
    Accessor,
}

struct Frame {
    node: NodeId,
    kind: GroupKind,
    statement: Option<NodeId>,
    enum_entries: bool,
    awaiting_lambda_arrow: bool,
}

impl Frame {
    fn new(node: NodeId, kind: GroupKind) -> Self {
        Self {
            node,
            kind,
            statement: None,
            enum_entries: kind == GroupKind::EnumBody,
            awaiting_lambda_arrow: kind == GroupKind::Lambda,
        }
    }
}

struct Builder<'a> {
    tree: SyntaxTree<'a>,
    stack: Vec<Frame>,
}

impl Builder<'_> {
    fn closer_of(&self, frame: &Frame) -> Option<TokenKind> {
        self.tree.nodes[frame.node]
            .open
            .and_then(|open| self.tree.kind_of(open).closer())
    }

    fn top(&mut self) -> &mut Frame {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push_token(&mut self, index: usize) {
        let kind = self.tree.kind_of(index);
        if kind.is_closer() {
            loop {
                let Some(top) = self.stack.last() else { break };
                if self.closer_of(top) == Some(kind) {
                    self.close_group(index);
                    return;
                }
                let outer_match = self.stack[..self.stack.len() - 1]
                    .iter()
                    .any(|frame| self.closer_of(frame) == Some(kind));
                if !outer_match {
                    break;
                }
                let offset = self.tree.tokens[index].span.start;
                self.abandon_group(offset);
            }
        }

        self.add_to_statement(index);

        if kind.is_opener() {
            self.open_group(index);
        }
    }

    fn add_to_statement(&mut self, index: usize) {
        let kind = self.tree.kind_of(index);
        let (frame_kind, statement, enum_entries) = {
            let top = self.top();
            (top.kind, top.statement, top.enum_entries)
        };

        if let Some(statement) = statement {
            let brace_separated = !frame_kind.is_list() && !enum_entries;
            if brace_separated && self.starts_new_statement(frame_kind, statement, index) {
                let top = self.top();
                top.statement = None;
                top.awaiting_lambda_arrow = false;
            }
        }

        let statement = match self.top().statement {
            Some(statement) => statement,
            None => {
                let parent = self.top().node;
                let id = self.tree.nodes.len();
                self.tree
                    .nodes
                    .push(SyntaxNode::new(NodeKind::Statement, Some(parent)));
                self.tree.nodes[parent].children.push(id);
                self.top().statement = Some(id);
                id
            }
        };
        self.tree.nodes[statement].items.push(index);

        let top = self.top();
        match kind {
            TokenKind::Comma if top.kind.is_list() || top.enum_entries => top.statement = None,
            TokenKind::Semicolon => {
                top.statement = None;
                top.enum_entries = false;
                top.awaiting_lambda_arrow = false;
            }
            TokenKind::Arrow if top.awaiting_lambda_arrow => {
                top.statement = None;
                top.awaiting_lambda_arrow = false;
            }
            _ => {}
        }
    }

    fn starts_new_statement(&self, group: GroupKind, statement: NodeId, index: usize) -> bool {
        let items = &self.tree.nodes[statement].items;
        let Some(&last) = items.last() else {
            return false;
        };
        self.tree.line_break_between(last, index)
            && self.tree.ends_statement(items, items.len() - 1)
            && !self.tree.continues_statement(group, items, index)
    }

    fn open_group(&mut self, index: usize) {
        let Some(frame) = self.stack.last() else { return };
        let Some(statement) = frame.statement else { return };
        let kind = self.tree.classify_group(frame, statement, index);

        let id = self.tree.nodes.len();
        let mut node = SyntaxNode::new(NodeKind::Group(kind), Some(statement));
        node.open = Some(index);
        self.tree.nodes.push(node);
        self.tree.nodes[statement].children.push(id);
        self.tree.group_of_token[index] = Some(id);
        self.stack.push(Frame::new(id, kind));
    }

    fn close_group(&mut self, index: usize) {
        let Some(frame) = self.stack.pop() else { return };
        let offset = self.tree.tokens[index].span.start;
        let node = &mut self.tree.nodes[frame.node];
        node.close = Some(index);
        node.end_offset = offset;
        self.tree.group_of_token[index] = Some(frame.node);

        if let Some(statement) = self.stack.last().and_then(|parent| parent.statement) {
            self.tree.nodes[statement].items.push(index);
        }
    }

    fn abandon_group(&mut self, offset: usize) {
        if let Some(frame) = self.stack.pop() {
            log::trace!(
                "abandoning unclosed {:?} group before byte {}",
                frame.kind,
                offset
            );
            self.tree.nodes[frame.node].end_offset = offset;
        }
    }
}
