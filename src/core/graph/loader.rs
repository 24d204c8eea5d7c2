// src/core/graph/loader.rs
use std::path::Path;
use tracing::debug;

use crate::error::{DotrelError, Result};
use super::lexer::{Lexer, Spanned, SyntaxError, Token};
use super::model::Graph;

/// Left or right side of an edge operator
enum Operand {
    Node(String),
    Subgraph(Vec<String>),
}

impl Operand {
    fn ids(&self) -> &[String] {
        match self {
            Operand::Node(id) => std::slice::from_ref(id),
            Operand::Subgraph(ids) => ids,
        }
    }
}

/// Deepest subgraph nesting accepted before the document is rejected
const MAX_NESTING: usize = 128;

/// Recursive-descent reader for the DOT grammar.
///
/// Attribute statements and `ID = ID` assignments are consumed and discarded;
/// only node labels are kept. Subgraph nesting deeper than `MAX_NESTING` is a
/// syntax error.
struct DotParser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    graph: Graph,
}

impl DotParser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            graph: Graph::default(),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, context: &str) -> std::result::Result<(), SyntaxError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.unexpected(context))
        }
    }

    fn unexpected(&self, context: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError::new(self.line(), format!("unexpected {} {}", token, context)),
            None => SyntaxError::new(self.line(), format!("unexpected end of document {}", context)),
        }
    }

    fn at_id(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Ident(_)) | Some(Token::Quoted(_)) | Some(Token::Html(_))
        )
    }

    /// ID, with `"a" + "b"` concatenation for quoted strings
    fn parse_id(&mut self, context: &str) -> std::result::Result<String, SyntaxError> {
        let mut text = match self.peek() {
            Some(Token::Ident(s)) | Some(Token::Html(s)) => {
                let s = s.clone();
                self.pos += 1;
                return Ok(s);
            }
            Some(Token::Quoted(s)) => s.clone(),
            _ => return Err(self.unexpected(context)),
        };
        self.pos += 1;

        while self.peek() == Some(&Token::Plus) {
            match self.peek_at(1) {
                Some(Token::Quoted(next)) => {
                    text.push_str(next);
                    self.pos += 2;
                }
                _ => {
                    self.pos += 1;
                    return Err(self.unexpected("after `+`"));
                }
            }
        }
        Ok(text)
    }

    fn parse_graph(mut self) -> std::result::Result<Graph, SyntaxError> {
        if self.peek().is_none() {
            return Err(SyntaxError::new(1, "no graph found in document"));
        }

        if self.peek().is_some_and(|t| t.is_keyword("strict")) {
            self.pos += 1;
        }

        let directed = match self.peek() {
            Some(t) if t.is_keyword("digraph") => true,
            Some(t) if t.is_keyword("graph") => false,
            _ => return Err(self.unexpected("where `graph` or `digraph` was expected")),
        };
        self.pos += 1;

        let name = if self.at_id() {
            Some(self.parse_id("as graph name")?)
        } else {
            None
        };

        self.graph.name = name;
        self.graph.directed = directed;

        self.expect(Token::LBrace, "where `{` was expected")?;
        self.parse_stmt_list()?;
        self.expect(Token::RBrace, "where `}` was expected")?;

        // Anything after the first graph is ignored
        Ok(self.graph)
    }

    /// Parse statements up to (not including) the closing brace and return every
    /// node identifier mentioned, for use as an edge operand.
    fn parse_stmt_list(&mut self) -> std::result::Result<Vec<String>, SyntaxError> {
        let mut mentioned = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::RBrace) => return Ok(mentioned),
                Some(Token::Semi) => {
                    self.pos += 1;
                }
                _ => {
                    let ids = self.parse_stmt()?;
                    mentioned.extend(ids);
                }
            }
        }
    }

    fn parse_stmt(&mut self) -> std::result::Result<Vec<String>, SyntaxError> {
        let token = self.peek().cloned();
        match token {
            Some(ref t) if t.is_keyword("graph") || t.is_keyword("node") || t.is_keyword("edge") => {
                self.pos += 1;
                if self.peek() != Some(&Token::LBracket) {
                    return Err(self.unexpected("where an attribute list was expected"));
                }
                self.parse_attr_lists()?;
                Ok(Vec::new())
            }
            Some(ref t) if t.is_keyword("subgraph") || *t == Token::LBrace => {
                let ids = self.parse_subgraph()?;
                if self.peek() == Some(&Token::EdgeOp) {
                    self.parse_edge_rhs(Operand::Subgraph(ids))
                } else {
                    Ok(ids)
                }
            }
            Some(Token::Ident(_)) | Some(Token::Quoted(_)) | Some(Token::Html(_)) => {
                if self.peek_at(1) == Some(&Token::Equals) {
                    self.parse_id("in assignment")?;
                    self.pos += 1;
                    self.parse_id("as assignment value")?;
                    return Ok(Vec::new());
                }

                let id = self.parse_node_id()?;
                if self.peek() == Some(&Token::EdgeOp) {
                    return self.parse_edge_rhs(Operand::Node(id));
                }

                let attrs = if self.peek() == Some(&Token::LBracket) {
                    self.parse_attr_lists()?
                } else {
                    Vec::new()
                };
                let label = attrs
                    .into_iter()
                    .filter(|(key, _)| key == "label")
                    .map(|(_, value)| value)
                    .last();
                self.graph.declare_node(&id, label);
                Ok(vec![id])
            }
            _ => Err(self.unexpected("at start of statement")),
        }
    }

    /// node_id : ID [ ':' ID [ ':' ID ] ]; the port part is dropped
    fn parse_node_id(&mut self) -> std::result::Result<String, SyntaxError> {
        let id = self.parse_id("as node identifier")?;
        for _ in 0..2 {
            if self.eat(&Token::Colon) {
                self.parse_id("as node port")?;
            } else {
                break;
            }
        }
        Ok(id)
    }

    fn parse_subgraph(&mut self) -> std::result::Result<Vec<String>, SyntaxError> {
        if self.peek().is_some_and(|t| t.is_keyword("subgraph")) {
            self.pos += 1;
            if self.at_id() {
                self.parse_id("as subgraph name")?;
            }
        }
        self.expect(Token::LBrace, "where `{` was expected")?;
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::new(
                self.line(),
                format!("subgraphs nested more than {} levels deep", MAX_NESTING),
            ));
        }

        self.depth += 1;
        let ids = self.parse_stmt_list();
        self.depth -= 1;
        let ids = ids?;

        self.expect(Token::RBrace, "where `}` was expected")?;
        Ok(ids)
    }

    fn parse_operand(&mut self) -> std::result::Result<Operand, SyntaxError> {
        let starts_subgraph = self
            .peek()
            .is_some_and(|t| t.is_keyword("subgraph") || *t == Token::LBrace);
        if starts_subgraph {
            Ok(Operand::Subgraph(self.parse_subgraph()?))
        } else if self.at_id() {
            Ok(Operand::Node(self.parse_node_id()?))
        } else {
            Err(self.unexpected("after edge operator"))
        }
    }

    fn parse_edge_rhs(&mut self, first: Operand) -> std::result::Result<Vec<String>, SyntaxError> {
        let mut operands = vec![first];
        while self.eat(&Token::EdgeOp) {
            operands.push(self.parse_operand()?);
        }
        if self.peek() == Some(&Token::LBracket) {
            self.parse_attr_lists()?;
        }

        for pair in operands.windows(2) {
            for source in pair[0].ids() {
                for destination in pair[1].ids() {
                    self.graph.add_edge(source, destination);
                }
            }
        }

        Ok(operands
            .iter()
            .flat_map(|op| op.ids().iter().cloned())
            .collect())
    }

    /// One or more `[ a = b, c = d; ... ]` blocks
    fn parse_attr_lists(&mut self) -> std::result::Result<Vec<(String, String)>, SyntaxError> {
        let mut attrs = Vec::new();
        while self.eat(&Token::LBracket) {
            loop {
                if self.eat(&Token::RBracket) {
                    break;
                }
                let key = self.parse_id("as attribute name")?;
                let value = if self.eat(&Token::Equals) {
                    self.parse_id("as attribute value")?
                } else {
                    "true".to_string()
                };
                attrs.push((key, value));
                if !self.eat(&Token::Comma) {
                    self.eat(&Token::Semi);
                }
            }
        }
        Ok(attrs)
    }
}

/// Parse DOT source text into a graph
pub fn parse_dot(source: &str) -> std::result::Result<Graph, SyntaxError> {
    let tokens = Lexer::new(source).tokenize()?;
    DotParser::new(tokens).parse_graph()
}

/// Reads graph description files from disk
#[derive(Debug, Default, Clone, Copy)]
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse an in-memory document; `origin` is only used for error reporting
    pub fn load_str(&self, source: &str, origin: &Path) -> Result<Graph> {
        parse_dot(source).map_err(|e| DotrelError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Graph> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| DotrelError::io(path, e))?;
        let graph = self.load_str(&source, path)?;
        debug!(
            "Loaded {}: {} nodes, {} edges",
            path.display(),
            graph.nodes().len(),
            graph.edges.len()
        );
        Ok(graph)
    }
}
