//! Kotlin syntax layer: a lossless logos tokenizer and a bracket-and-statement
//! tree built on top of it. Both tolerate the incomplete code that exists
//! while a user is typing.

pub mod lexer;
pub mod tree;

pub use lexer::{tokenize, Keyword, Termination, Token, TokenKind};
pub use tree::{Control, GroupKind, NodeId, NodeKind, StatementKind, SyntaxNode, SyntaxTree};
