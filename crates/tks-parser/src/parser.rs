//! Expression parser.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr       := comp_expr (("and" | "or") comp_expr)*
//! comp_expr  := "not" comp_expr | arith_expr (cmp_op arith_expr)*
//! arith_expr := term (("+" | "-") term)*
//! term       := factor (("*" | "/") factor)*
//! factor     := ("+" | "-") factor | power
//! power      := call ("^" factor)*  [member chain]
//! call       := atom ("(" args? ")")?
//! atom       := INT | FLOAT | STRING | IDENTIFIER | "(" expr ")"
//!             | lambda | "[" items? "]" | "{" pairs? "}"
//! ```
//!
//! A member chain (`name.a.b['key']`) may only follow a bare identifier.

use std::rc::Rc;

use tks_lexer::{Position, Span, Token, TokenKind};

use crate::ast::{BinaryOp, FuncDef, Name, Node, NodeKind, NumberLit, UnaryOp};
use crate::ParseError;

const EXPECTED_OPERATOR: &str = "Expected '+', '-', '/' or '*'";
const EXPECTED_ATOM: &str = "Expected int, float, identifier, '+', '-', '(', '[' or '{'";
const EXPECTED_COMPARISON: &str = "Expected int, float, identifier, '+', '-', '(', '[' or 'not'";
const EXPECTED_EXPR: &str =
    "Expected 'lambda', int, float, identifier, '+', '-', '(', '[' or 'not'";

/// Expression parser.
///
/// Converts a flat token stream into one [`Node`] tree.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Create a parser. A missing trailing `Eof` is supplied.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let at = tokens
                .last()
                .map_or_else(|| Position::start("", ""), |t| t.span.end.clone());
            tokens.push(Token::new(TokenKind::Eof, Span::empty(at)));
        }
        Self { tokens, pos: 0 }
    }

    /// Parse a complete expression. Tokens left over after it are an error.
    pub fn parse(tokens: Vec<Token>) -> Result<Node, ParseError> {
        let mut parser = Parser::new(tokens);
        let node = parser.expr()?;
        if parser.peek().kind != TokenKind::Eof {
            return Err(parser.error(EXPECTED_OPERATOR));
        }
        tracing::trace!(range = ?(node.span.start.index, node.span.end.index), "parsed expression");
        Ok(node)
    }

    // =========================================================================
    // Precedence levels
    // =========================================================================

    fn expr(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        self.binary(Self::comp_expr, Self::comp_expr, |kind| match kind {
            TokenKind::And => Some(BinaryOp::And),
            TokenKind::Or => Some(BinaryOp::Or),
            _ => None,
        })
        .map_err(|e| self.reword(start, e, EXPECTED_EXPR))
    }

    fn comp_expr(&mut self) -> Result<Node, ParseError> {
        if self.peek().kind == TokenKind::Not {
            let op = self.advance();
            let operand = self.comp_expr()?;
            let span = op.span.to(&operand.span);
            return Ok(Node::new(
                NodeKind::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }

        let start = self.pos;
        self.binary(Self::arith_expr, Self::arith_expr, |kind| match kind {
            TokenKind::Eq => Some(BinaryOp::Eq),
            TokenKind::Ne => Some(BinaryOp::Ne),
            TokenKind::Lt => Some(BinaryOp::Lt),
            TokenKind::Gt => Some(BinaryOp::Gt),
            TokenKind::Lte => Some(BinaryOp::Lte),
            TokenKind::Gte => Some(BinaryOp::Gte),
            _ => None,
        })
        .map_err(|e| self.reword(start, e, EXPECTED_COMPARISON))
    }

    fn arith_expr(&mut self) -> Result<Node, ParseError> {
        self.binary(Self::term, Self::term, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn term(&mut self) -> Result<Node, ParseError> {
        self.binary(Self::factor, Self::factor, |kind| match kind {
            TokenKind::Mul => Some(BinaryOp::Mul),
            TokenKind::Div => Some(BinaryOp::Div),
            _ => None,
        })
    }

    fn factor(&mut self) -> Result<Node, ParseError> {
        let op = match self.peek().kind {
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.power(),
        };
        let op_token = self.advance();
        let operand = self.factor()?;
        let span = op_token.span.to(&operand.span);
        Ok(Node::new(
            NodeKind::UnaryOp {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `call ("^" factor)*`, right-associative because the right operand is a
    /// `factor`. A `.` or `[` afterwards turns a bare identifier into a member chain.
    fn power(&mut self) -> Result<Node, ParseError> {
        let node = self.binary(Self::call, Self::factor, |kind| match kind {
            TokenKind::Power => Some(BinaryOp::Pow),
            _ => None,
        })?;

        if matches!(node.kind, NodeKind::Call { .. })
            || !matches!(self.peek().kind, TokenKind::Dot | TokenKind::LSquare)
        {
            return Ok(node);
        }

        let NodeKind::VarAccess(base) = node.kind else {
            let symbol = if self.peek().kind == TokenKind::Dot { "." } else { "[" };
            return Err(self.error(&format!("Expected identifier before '{symbol}'")));
        };

        let mut methods = Vec::new();
        let mut end = base.span.end.clone();

        while self.peek().kind == TokenKind::Dot {
            self.advance();
            let TokenKind::Identifier(text) = self.peek().kind.clone() else {
                return Err(self.error("Expected method name"));
            };
            let token = self.advance();
            end = token.span.end.clone();
            methods.push(Name {
                text,
                span: token.span,
            });
        }

        let mut attribute = None;
        if self.peek().kind == TokenKind::LSquare {
            self.advance();
            let TokenKind::String(text) = self.peek().kind.clone() else {
                return Err(self.error("Expected attribute"));
            };
            let token = self.advance();
            attribute = Some(Name {
                text,
                span: token.span,
            });
            end = self.expect(TokenKind::RSquare, "Expected ']'")?.span.end;
        }

        let span = Span::new(base.span.start.clone(), end);
        Ok(Node::new(
            NodeKind::MethodAccess {
                base,
                methods,
                attribute,
            },
            span,
        ))
    }

    fn call(&mut self) -> Result<Node, ParseError> {
        let callee = self.atom()?;

        if self.peek().kind != TokenKind::LParen {
            return Ok(callee);
        }
        self.advance();

        let mut args = Vec::new();
        if self.peek().kind != TokenKind::RParen {
            args.push(self.expr()?);
            while self.peek().kind == TokenKind::Comma {
                self.advance();
                args.push(self.expr()?);
            }
        }
        let close = self.expect(TokenKind::RParen, "Expected ',' or ')'")?;

        let span = Span::new(callee.span.start.clone(), close.span.end);
        Ok(Node::new(
            NodeKind::Call {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    fn atom(&mut self) -> Result<Node, ParseError> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Number(NumberLit::Int(n)), token.span))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Node::new(NodeKind::Number(NumberLit::Float(n)), token.span))
            }
            TokenKind::String(text) => {
                self.advance();
                Ok(Node::new(NodeKind::String(text), token.span))
            }
            TokenKind::Identifier(text) => {
                self.advance();
                let span = token.span.clone();
                Ok(Node::new(
                    NodeKind::VarAccess(Name {
                        text,
                        span: token.span,
                    }),
                    span,
                ))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "Expected ')'")?;
                Ok(inner)
            }
            TokenKind::Lambda => self.func_def(),
            TokenKind::LSquare => self.list_expr(),
            TokenKind::LCurly => self.dict_expr(),
            _ => Err(self.error(EXPECTED_ATOM)),
        }
    }

    // =========================================================================
    // Compound literals
    // =========================================================================

    /// `lambda name? "(" params? ")" "->" expr`
    fn func_def(&mut self) -> Result<Node, ParseError> {
        let keyword = self.advance();

        let name = if let TokenKind::Identifier(text) = self.peek().kind.clone() {
            let token = self.advance();
            self.expect(TokenKind::LParen, "Expected '('")?;
            Some(Name {
                text,
                span: token.span,
            })
        } else {
            self.expect(TokenKind::LParen, "Expected identifier or '('")?;
            None
        };

        let mut params = Vec::new();
        if let TokenKind::Identifier(text) = self.peek().kind.clone() {
            let token = self.advance();
            params.push(Name {
                text,
                span: token.span,
            });
            while self.peek().kind == TokenKind::Comma {
                self.advance();
                let TokenKind::Identifier(text) = self.peek().kind.clone() else {
                    return Err(self.error("Expected identifier"));
                };
                let token = self.advance();
                params.push(Name {
                    text,
                    span: token.span,
                });
            }
        }
        self.expect(TokenKind::RParen, "Expected ',' or ')'")?;
        self.expect(TokenKind::Arrow, "Expected '->'")?;

        let body = self.expr()?;
        let span = keyword.span.to(&body.span);
        Ok(Node::new(
            NodeKind::FuncDef(Rc::new(FuncDef { name, params, body })),
            span,
        ))
    }

    fn list_expr(&mut self) -> Result<Node, ParseError> {
        let open = self.advance();

        let mut elements = Vec::new();
        if self.peek().kind != TokenKind::RSquare {
            elements.push(self.expr()?);
            while self.peek().kind == TokenKind::Comma {
                self.advance();
                elements.push(self.expr()?);
            }
        }
        let close = self.expect(TokenKind::RSquare, "Expected ',' or ']'")?;

        Ok(Node::new(NodeKind::List(elements), open.span.to(&close.span)))
    }

    fn dict_expr(&mut self) -> Result<Node, ParseError> {
        let open = self.advance();

        let mut keys = Vec::new();
        let mut values = Vec::new();
        if self.peek().kind != TokenKind::RCurly {
            let (key, value) = self.dict_pair("Expected '}' or string")?;
            keys.push(key);
            values.push(value);
            while self.peek().kind == TokenKind::Comma {
                self.advance();
                let (key, value) = self.dict_pair("Expected string")?;
                keys.push(key);
                values.push(value);
            }
        }
        let close = self.expect(TokenKind::RCurly, "Expected ',' or '}'")?;

        Ok(Node::new(
            NodeKind::Dict { keys, values },
            open.span.to(&close.span),
        ))
    }

    /// `STRING ":" expr`
    fn dict_pair(&mut self, expected_key: &str) -> Result<(Node, Node), ParseError> {
        let TokenKind::String(text) = self.peek().kind.clone() else {
            return Err(self.error(expected_key));
        };
        let token = self.advance();
        let key = Node::new(NodeKind::String(text), token.span);
        self.expect(TokenKind::Colon, "Expected ':'")?;
        let value = self.expr()?;
        Ok((key, value))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Left-associative fold of `first (op rest)*`.
    fn binary(
        &mut self,
        first: fn(&mut Self) -> Result<Node, ParseError>,
        rest: fn(&mut Self) -> Result<Node, ParseError>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Node, ParseError> {
        let mut left = first(self)?;
        while let Some(op) = op_for(&self.peek().kind) {
            self.advance();
            let right = rest(self)?;
            let span = left.span.to(&right.span);
            left = Node::new(
                NodeKind::BinOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    /// A rule that failed without consuming anything reports the broader
    /// expectation of the caller; otherwise the inner error stands.
    fn reword(&self, start: usize, error: ParseError, details: &str) -> ParseError {
        if self.pos == start {
            self.error(details)
        } else {
            error
        }
    }

    fn expect(&mut self, kind: TokenKind, details: &str) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(details))
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Consume the current token and return it. `Eof` is never consumed.
    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn error(&self, details: &str) -> ParseError {
        ParseError {
            details: details.to_string(),
            span: self.peek().span.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tks_lexer::Scanner;

    fn parse(source: &str) -> Node {
        Parser::parse(Scanner::tokenize("<test>", source).unwrap()).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        Parser::parse(Scanner::tokenize("<test>", source).unwrap()).unwrap_err()
    }

    /// Compact s-expression rendering of a tree, for structural assertions.
    fn sexpr(node: &Node) -> String {
        match &node.kind {
            NodeKind::Number(NumberLit::Int(n)) => n.to_string(),
            NodeKind::Number(NumberLit::Float(n)) => format!("{n:?}"),
            NodeKind::String(s) => format!("{s:?}"),
            NodeKind::BinOp { left, op, right } => {
                format!("({op} {} {})", sexpr(left), sexpr(right))
            }
            NodeKind::UnaryOp { op, operand } => format!("({op:?} {})", sexpr(operand)),
            NodeKind::VarAccess(name) => name.text.clone(),
            NodeKind::MethodAccess {
                base,
                methods,
                attribute,
            } => {
                let mut out = base.text.clone();
                for m in methods {
                    out.push('.');
                    out.push_str(&m.text);
                }
                if let Some(attr) = attribute {
                    out.push_str(&format!("[{:?}]", attr.text));
                }
                out
            }
            NodeKind::FuncDef(def) => {
                let params: Vec<&str> = def.params.iter().map(|p| p.text.as_str()).collect();
                format!(
                    "(lambda {}({}) {})",
                    def.name.as_ref().map_or("", |n| n.text.as_str()),
                    params.join(" "),
                    sexpr(&def.body)
                )
            }
            NodeKind::Call { callee, args } => {
                let args: Vec<String> = args.iter().map(sexpr).collect();
                format!("(call {} [{}])", sexpr(callee), args.join(" "))
            }
            NodeKind::List(items) => {
                let items: Vec<String> = items.iter().map(sexpr).collect();
                format!("[{}]", items.join(" "))
            }
            NodeKind::Dict { keys, values } => {
                let pairs: Vec<String> = keys
                    .iter()
                    .zip(values)
                    .map(|(k, v)| format!("{}:{}", sexpr(k), sexpr(v)))
                    .collect();
                format!("{{{}}}", pairs.join(" "))
            }
        }
    }

    fn shape(source: &str) -> String {
        sexpr(&parse(source))
    }

    // =========================================================================
    // Precedence and associativity
    // =========================================================================

    #[test]
    fn test_mul_binds_tighter_than_add() {
        assert_eq!(shape("1 + 2 * 3"), "(+ 1 (* 2 3))");
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(shape("8 - 4 - 2"), "(- (- 8 4) 2)");
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(shape("2 ^ 3 ^ 2"), "(^ 2 (^ 3 2))");
    }

    #[test]
    fn test_power_binds_tighter_than_unary_minus() {
        assert_eq!(shape("-2 ^ 2"), "(Neg (^ 2 2))");
    }

    #[test]
    fn test_negative_exponent() {
        assert_eq!(shape("2 ^ -1"), "(^ 2 (Neg 1))");
    }

    #[test]
    fn test_comparison_below_arithmetic() {
        assert_eq!(shape("1 + 1 == 2"), "(== (+ 1 1) 2)");
    }

    #[test]
    fn test_logic_below_comparison() {
        assert_eq!(shape("a < b and c >= d or e"), "(or (and (< a b) (>= c d)) e)");
    }

    #[test]
    fn test_not_covers_comparison() {
        assert_eq!(shape("not a == b"), "(Not (== a b))");
    }

    #[test]
    fn test_parens_override() {
        assert_eq!(shape("(1 + 2) * 3"), "(* (+ 1 2) 3)");
    }

    #[test]
    fn test_unary_plus() {
        assert_eq!(shape("+-5"), "(Pos (Neg 5))");
    }

    // =========================================================================
    // Literals
    // =========================================================================

    #[test]
    fn test_literals() {
        assert_eq!(shape("42"), "42");
        assert_eq!(shape("2.5"), "2.5");
        assert_eq!(shape("'hi'"), "\"hi\"");
    }

    #[test]
    fn test_list() {
        assert_eq!(shape("[1, 'a', [2]]"), "[1 \"a\" [2]]");
        assert_eq!(shape("[]"), "[]");
    }

    #[test]
    fn test_dict_keeps_duplicate_keys_in_order() {
        assert_eq!(shape("{'a': 1, 'a': 2}"), "{\"a\":1 \"a\":2}");
        assert_eq!(shape("{}"), "{}");
    }

    // =========================================================================
    // Lambdas and calls
    // =========================================================================

    #[test]
    fn test_anonymous_lambda() {
        assert_eq!(shape("lambda (x, y) -> x + y"), "(lambda (x y) (+ x y))");
    }

    #[test]
    fn test_named_lambda_without_params() {
        assert_eq!(shape("lambda tick() -> 1"), "(lambda tick() 1)");
    }

    #[test]
    fn test_lambda_body_extends_right() {
        assert_eq!(shape("lambda (x) -> x and 1"), "(lambda (x) (and x 1))");
    }

    #[test]
    fn test_call() {
        assert_eq!(shape("rgb(255, 0, 1 + 1)"), "(call rgb [255 0 (+ 1 1)])");
        assert_eq!(shape("f()"), "(call f [])");
    }

    #[test]
    fn test_call_on_parenthesized_lambda() {
        assert_eq!(shape("(lambda (x) -> x)(3)"), "(call (lambda (x) x) [3])");
    }

    // =========================================================================
    // Member chains
    // =========================================================================

    #[test]
    fn test_method_chain() {
        assert_eq!(shape("self.master.master"), "self.master.master");
    }

    #[test]
    fn test_chain_with_attribute() {
        assert_eq!(shape("top.label['text']"), "top.label[\"text\"]");
    }

    #[test]
    fn test_attribute_without_chain() {
        assert_eq!(shape("label['bg']"), "label[\"bg\"]");
    }

    #[test]
    fn test_chain_inside_arithmetic() {
        assert_eq!(shape("a.width * 2"), "(* a.width 2)");
    }

    #[test]
    fn test_indexing_a_list_literal_is_rejected() {
        let err = parse_err("[1,2,3][1]");
        assert_eq!(err.details, "Expected identifier before '['");
        assert_eq!(err.span.slice(), "[");
    }

    #[test]
    fn test_chain_after_call_is_rejected() {
        let err = parse_err("f().x");
        assert_eq!(err.details, EXPECTED_OPERATOR);
    }

    #[test]
    fn test_numeric_index_is_rejected() {
        assert_eq!(parse_err("a[0]").details, "Expected attribute");
    }

    #[test]
    fn test_nested_index_is_rejected() {
        assert_eq!(parse_err("a['x']['y']").details, EXPECTED_OPERATOR);
    }

    // =========================================================================
    // Spans
    // =========================================================================

    #[test]
    fn test_spans_cover_source_text() {
        let cases = [
            "1 + 2",
            "-x",
            "not 0",
            "rgb(1, 2, 3)",
            "[1, 2]",
            "{'a': 1}",
            "lambda f(x) -> x",
            "self.master['bg']",
        ];
        for source in cases {
            assert_eq!(parse(source).span.slice(), source, "span of {source}");
        }
    }

    #[test]
    fn test_inner_spans() {
        let node = parse("(1 + 22) * 3");
        let NodeKind::BinOp { left, .. } = node.kind else {
            panic!("expected a binary op");
        };
        assert_eq!(left.span.slice(), "1 + 22");
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_trailing_tokens() {
        let err = parse_err("1 2");
        assert_eq!(err.details, EXPECTED_OPERATOR);
        assert_eq!(err.span.slice(), "2");
    }

    #[test]
    fn test_unclosed_paren() {
        let err = parse_err("(1 + 2");
        assert_eq!(err.details, "Expected ')'");
        assert_eq!(err.span.start.index, 6);
    }

    #[test]
    fn test_missing_operand_after_operator() {
        assert_eq!(parse_err("1 +").details, EXPECTED_ATOM);
    }

    #[test]
    fn test_empty_parens_reports_expression() {
        assert_eq!(parse_err("()").details, EXPECTED_EXPR);
    }

    #[test]
    fn test_leading_operator_token_reports_expression() {
        let err = parse_err("* 2");
        assert_eq!(err.details, EXPECTED_EXPR);
        assert_eq!(err.span.slice(), "*");
    }

    #[test]
    fn test_trailing_comma_in_list() {
        assert_eq!(parse_err("[1, 2,]").details, EXPECTED_EXPR);
    }

    #[test]
    fn test_unclosed_list() {
        assert_eq!(parse_err("[1, 2").details, "Expected ',' or ']'");
    }

    #[test]
    fn test_dict_key_must_be_string() {
        assert_eq!(parse_err("{1: 2}").details, "Expected '}' or string");
        assert_eq!(parse_err("{'a': 1, b: 2}").details, "Expected string");
    }

    #[test]
    fn test_dict_missing_colon() {
        assert_eq!(parse_err("{'a' 1}").details, "Expected ':'");
    }

    #[test]
    fn test_lambda_errors() {
        assert_eq!(parse_err("lambda x").details, "Expected '('");
        assert_eq!(parse_err("lambda 1").details, "Expected identifier or '('");
        assert_eq!(parse_err("lambda (x,) -> 1").details, "Expected identifier");
        assert_eq!(parse_err("lambda (x y) -> 1").details, "Expected ',' or ')'");
        assert_eq!(parse_err("lambda (x) x").details, "Expected '->'");
    }

    #[test]
    fn test_unclosed_call() {
        assert_eq!(parse_err("f(1 2)").details, "Expected ',' or ')'");
    }

    #[test]
    fn test_dot_without_name() {
        assert_eq!(parse_err("self.").details, "Expected method name");
    }

    #[test]
    fn test_missing_bracket() {
        assert_eq!(parse_err("a['x'").details, "Expected ']'");
    }

    #[test]
    fn test_error_render() {
        let err = parse_err("(1 + 2");
        assert_eq!(
            err.render(None),
            "Invalid Syntax: Expected ')'. File <test>, line 1\n\n(1 + 2\n      ^"
        );
    }

    #[test]
    fn test_missing_eof_is_supplied() {
        let mut tokens = Scanner::tokenize("<test>", "7").unwrap();
        tokens.pop();
        let node = Parser::parse(tokens).unwrap();
        assert_eq!(node.kind, NodeKind::Number(NumberLit::Int(7)));
    }
}
