use std::f64::consts::{E, PI};

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::error::ParseError;
use super::lexer::{Lexer, Token, TokenKind};

/// Deepest a formula may nest. Bounds both the parser's recursion
/// (parentheses, function calls, exponents, unary minus) and the height of
/// the resulting tree, which every tree walk recurses over.
pub const MAX_DEPTH: usize = 128;

/// A subtree with its height.
type Node = (Expr, usize);

/// Recursive-descent parser for formulas in a single bound variable.
///
/// Grammar, lowest precedence first:
///
/// ```text
/// expr     := term ( ('+'|'-') term )*
/// term     := negative ( ('*'|'/') negative )*
/// negative := '-' power | power
/// power    := factor ( '^' power )?
/// factor   := NUMBER | 'e' | 'pi' | VARIABLE
///           | FUNCNAME '(' expr ')'
///           | '(' expr ')'
/// ```
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Option<Token<'src>>,
    variable: char,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(input: &'src str, variable: char) -> Self {
        Parser {
            lexer: Lexer::new(input),
            current: None,
            variable: variable.to_ascii_lowercase(),
            depth: 0,
        }
    }

    /// Parses the whole input as one expression.
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        self.consume()?;
        let (ast, _) = self.expr()?;
        if let Some(token) = self.current {
            return Err(ParseError::TrailingInput {
                found: token.kind,
                offset: token.offset,
            });
        }
        Ok(ast)
    }

    fn consume(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next().transpose()?;
        Ok(())
    }

    fn peek(&self) -> Option<TokenKind> {
        self.current.map(|token| token.kind)
    }

    fn offset(&self) -> usize {
        self.current
            .map_or(self.lexer.position(), |token| token.offset)
    }

    fn expect(&mut self, expected: TokenKind, what: impl Into<String>) -> Result<(), ParseError> {
        match self.current {
            Some(token) if token.kind == expected => self.consume(),
            other => Err(ParseError::Expected {
                expected: what.into(),
                found: other.map(|token| token.kind),
                offset: self.offset(),
            }),
        }
    }

    /// Runs `rule` one level deeper, failing once the nesting limit is passed.
    fn nested<R>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<R, ParseError>,
    ) -> Result<R, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                offset: self.offset(),
            });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn height(&self, height: usize) -> Result<usize, ParseError> {
        if height > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                offset: self.offset(),
            });
        }
        Ok(height)
    }

    fn unary(&self, op: UnaryOp, (child, height): Node) -> Result<Node, ParseError> {
        let height = self.height(height + 1)?;
        Ok((Expr::unary(op, child), height))
    }

    fn binary(&self, op: BinaryOp, (lhs, l): Node, (rhs, r): Node) -> Result<Node, ParseError> {
        let height = self.height(l.max(r) + 1)?;
        Ok((Expr::binary(op, lhs, rhs), height))
    }

    fn expr(&mut self) -> Result<Node, ParseError> {
        let mut node = self.term()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.consume()?;
            let rhs = self.term()?;
            node = self.binary(op, node, rhs)?;
        }

        Ok(node)
    }

    fn term(&mut self) -> Result<Node, ParseError> {
        let mut node = self.negative()?;

        loop {
            let op = match self.peek() {
                Some(TokenKind::Multiply) => BinaryOp::Multiply,
                Some(TokenKind::Divide) => BinaryOp::Divide,
                _ => break,
            };
            self.consume()?;
            let rhs = self.negative()?;
            node = self.binary(op, node, rhs)?;
        }

        Ok(node)
    }

    fn negative(&mut self) -> Result<Node, ParseError> {
        if self.peek() == Some(TokenKind::Minus) {
            self.consume()?;
            let operand = self.nested(Self::power)?;
            return self.unary(UnaryOp::Negate, operand);
        }
        self.power()
    }

    fn power(&mut self) -> Result<Node, ParseError> {
        let base = self.factor()?;

        if self.peek() == Some(TokenKind::Power) {
            self.consume()?;
            // Right-associative: the exponent is itself a power.
            let exponent = self.nested(Self::power)?;
            return self.binary(BinaryOp::Power, base, exponent);
        }

        Ok(base)
    }

    fn factor(&mut self) -> Result<Node, ParseError> {
        let Some(token) = self.current else {
            return Err(ParseError::UnexpectedEnd);
        };

        match token.kind {
            TokenKind::Number(value) => {
                self.consume()?;
                Ok((Expr::Const(value), 1))
            }
            TokenKind::E => {
                self.consume()?;
                Ok((Expr::Const(E), 1))
            }
            TokenKind::Pi => {
                self.consume()?;
                Ok((Expr::Const(PI), 1))
            }
            TokenKind::Variable(name) => {
                if name != self.variable {
                    return Err(ParseError::VariableMismatch {
                        found: name,
                        expected: self.variable,
                        offset: token.offset,
                    });
                }
                self.consume()?;
                Ok((Expr::Variable(name), 1))
            }
            TokenKind::Function(op) => {
                self.consume()?;
                self.expect(
                    TokenKind::LParen,
                    format!("opening parenthesis after {}", op.name()),
                )?;
                let argument = self.nested(Self::expr)?;
                self.expect(
                    TokenKind::RParen,
                    format!("closing parenthesis after {} argument", op.name()),
                )?;
                self.unary(op, argument)
            }
            TokenKind::LParen => {
                self.consume()?;
                let inner = self.nested(Self::expr)?;
                self.expect(TokenKind::RParen, "closing parenthesis after expression")?;
                Ok(inner)
            }
            kind => Err(ParseError::UnexpectedToken {
                found: kind,
                offset: token.offset,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equation_engine::error::ErrorKind;

    fn parse_x(input: &str) -> Result<Expr, ParseError> {
        Parser::new(input, 'x').parse()
    }

    fn assert_err_contains(result: Result<Expr, ParseError>, needle: &str) -> ParseError {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
        err
    }

    fn x() -> Expr {
        Expr::Variable('x')
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let ast = parse_x("-x^2").expect("should parse");
        assert_eq!(
            ast,
            Expr::unary(
                UnaryOp::Negate,
                Expr::binary(BinaryOp::Power, x(), Expr::Const(2.0))
            )
        );
    }

    #[test]
    fn unary_minus_binds_tighter_than_multiplication() {
        let ast = parse_x("-x*2").expect("should parse");
        assert_eq!(
            ast,
            Expr::binary(
                BinaryOp::Multiply,
                Expr::unary(UnaryOp::Negate, x()),
                Expr::Const(2.0)
            )
        );
    }

    #[test]
    fn power_is_right_associative() {
        let ast = parse_x("2^3^2").expect("should parse");
        assert_eq!(
            ast,
            Expr::binary(
                BinaryOp::Power,
                Expr::Const(2.0),
                Expr::binary(BinaryOp::Power, Expr::Const(3.0), Expr::Const(2.0))
            )
        );
    }

    #[test]
    fn subtraction_and_division_are_left_associative() {
        let ast = parse_x("2-3-4").expect("should parse");
        assert_eq!(
            ast,
            Expr::binary(
                BinaryOp::Subtract,
                Expr::binary(BinaryOp::Subtract, Expr::Const(2.0), Expr::Const(3.0)),
                Expr::Const(4.0)
            )
        );

        let ast = parse_x("8/4/2").expect("should parse");
        assert_eq!(
            ast,
            Expr::binary(
                BinaryOp::Divide,
                Expr::binary(BinaryOp::Divide, Expr::Const(8.0), Expr::Const(4.0)),
                Expr::Const(2.0)
            )
        );
    }

    #[test]
    fn constants_fold_to_values() {
        assert_eq!(parse_x("pi").expect("pi"), Expr::Const(PI));
        assert_eq!(parse_x("E").expect("e"), Expr::Const(E));
    }

    #[test]
    fn functions_wrap_their_argument() {
        let ast = parse_x("arcsin(x)").expect("should parse");
        assert_eq!(ast, Expr::unary(UnaryOp::Asin, x()));

        let ast = parse_x("sin(x)^2 - 1").expect("should parse");
        assert_eq!(
            ast,
            Expr::binary(
                BinaryOp::Subtract,
                Expr::binary(
                    BinaryOp::Power,
                    Expr::unary(UnaryOp::Sin, x()),
                    Expr::Const(2.0)
                ),
                Expr::Const(1.0)
            )
        );
    }

    #[test]
    fn function_without_parenthesis_names_what_was_expected() {
        let err = assert_err_contains(
            parse_x("sin x)"),
            "Expected opening parenthesis after sin, got VARIABLE",
        );
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_err_contains(
            parse_x("sin+x"),
            "Expected opening parenthesis after sin, got PLUS",
        );
        assert_err_contains(
            parse_x("cos(x"),
            "Expected closing parenthesis after cos argument, got end of input",
        );
        assert_err_contains(
            parse_x("(x+1"),
            "Expected closing parenthesis after expression, got end of input",
        );
    }

    #[test]
    fn dangling_operator_is_an_unexpected_end() {
        let err = assert_err_contains(parse_x("x+"), "Unexpected end of input");
        assert_eq!(err, ParseError::UnexpectedEnd);
        assert_err_contains(parse_x(""), "Unexpected end of input");
    }

    #[test]
    fn trailing_input_is_rejected() {
        let err = assert_err_contains(parse_x("x)"), "Expected terminator, got RPAREN");
        assert_eq!(err.offset(), Some(1));
        assert_err_contains(parse_x("2 3"), "Expected terminator, got NUMBER");
    }

    #[test]
    fn token_that_cannot_start_a_factor_is_reported() {
        assert_err_contains(parse_x("*x"), "Unexpected token MULTIPLY");
        assert_err_contains(parse_x("x^^2"), "Unexpected token POWER");
        // Unary minus applies once, to a power.
        assert_err_contains(parse_x("--x"), "Unexpected token MINUS");
    }

    #[test]
    fn other_variables_are_rejected() {
        let err = assert_err_contains(parse_x("y"), "Unexpected variable y, expected x");
        assert_eq!(err.kind(), ErrorKind::Semantic);

        let ast = Parser::new("T^2", 't').parse().expect("bound variable t");
        assert_eq!(
            ast,
            Expr::binary(BinaryOp::Power, Expr::Variable('t'), Expr::Const(2.0))
        );
        assert!(Parser::new("x", 'T').parse().is_err());
    }

    #[test]
    fn leftover_prefix_letters_fail_as_variables() {
        let err = assert_err_contains(parse_x("arc(x)"), "Unexpected variable a");
        assert_eq!(err.offset(), Some(0));
    }

    #[test]
    fn lexical_errors_surface_through_the_parser() {
        let err = assert_err_contains(parse_x("x + #"), "Lexical error: unexpected token #");
        assert_eq!(err.kind(), ErrorKind::Lexical);
    }

    #[test]
    fn deep_parentheses_fail_instead_of_overflowing() {
        let input = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        let err = assert_err_contains(parse_x(&input), "Expression nested too deeply");
        assert_eq!(err.kind(), ErrorKind::Syntax);
        // Reported at the token after the parenthesis that passed the limit.
        assert_eq!(err.offset(), Some(MAX_DEPTH + 1));

        let input = format!("{}x{}", "sin(".repeat(5_000), ")".repeat(5_000));
        assert_err_contains(parse_x(&input), "Expression nested too deeply");
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let tower = vec!["x"; 10_000].join("^");
        assert_err_contains(parse_x(&tower), "Expression nested too deeply");

        let sum = vec!["x"; 10_000].join("+");
        assert_err_contains(parse_x(&sum), "Expression nested too deeply");

        let negated = "-(".repeat(5_000) + "x" + &")".repeat(5_000);
        assert_err_contains(parse_x(&negated), "Expression nested too deeply");
    }

    #[test]
    fn nesting_up_to_the_limit_parses() {
        let depth = MAX_DEPTH - 1;
        let input = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_x(&input).expect("within the limit"), x());

        let sum = vec!["x"; MAX_DEPTH].join("+");
        let ast = parse_x(&sum).expect("chain within the limit");
        assert_eq!(ast.size(), 2 * MAX_DEPTH - 1);
    }
}
