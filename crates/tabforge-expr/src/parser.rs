//! Expression parser
//!
//! A recursive descent parser for the restricted expression language with
//! proper operator precedence. There are no assignments, loops or function
//! calls: an expression is a pure per-row computation over columns.

use std::fmt;

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{ExprError, ExprResult};

/// Deepest nesting accepted, both for parentheses and prefix operators
/// and for the height of the resulting tree
pub const MAX_DEPTH: usize = 100;

/// Parse an expression string into an AST
///
/// # Example
/// ```rust
/// use tabforge_expr::parse_expression;
///
/// let ast = parse_expression("Price * Quantity").unwrap();
/// let ast = parse_expression("Revenue > 50 and not `Is Refund`").unwrap();
/// let ast = parse_expression("Region == 'North'").unwrap();
/// ```
pub fn parse_expression(source: &str) -> ExprResult<Expr> {
    let mut parser = ExprParser::new(source)?;

    if matches!(parser.current_token(), Token::Eof) {
        return Err(ExprError::Syntax("Empty expression".into()));
    }

    let expr = parser.parse_or()?;

    // Make sure we consumed all input
    match parser.current_token() {
        Token::Eof => Ok(expr),
        Token::RightParen => Err(ExprError::Syntax(
            "Unbalanced parentheses: unexpected ')'".into(),
        )),
        token => Err(ExprError::Syntax(format!(
            "Unexpected {} after expression",
            token
        ))),
    }
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    Text(String),
    Boolean(bool),

    // Column names, bare or backtick-quoted
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
    Not,

    // Delimiters
    LeftParen,
    RightParen,

    // End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::Text(s) => write!(f, "string {:?}", s),
            Token::Boolean(b) => write!(f, "boolean {}", b),
            Token::Identifier(name) => write!(f, "column `{}`", name),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Equal => f.write_str("'=='"),
            Token::NotEqual => f.write_str("'!='"),
            Token::LessThan => f.write_str("'<'"),
            Token::LessEqual => f.write_str("'<='"),
            Token::GreaterThan => f.write_str("'>'"),
            Token::GreaterEqual => f.write_str("'>='"),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::Not => f.write_str("'not'"),
            Token::LeftParen => f.write_str("'('"),
            Token::RightParen => f.write_str("')'"),
            Token::Eof => f.write_str("end of expression"),
        }
    }
}

/// Expression parser
struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    /// Open parentheses and prefix operators around the current position
    nesting: usize,
    /// Height of the expression most recently parsed
    height: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str) -> ExprResult<Self> {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            nesting: 0,
            height: 0,
        };
        parser.advance_token()?;
        Ok(parser)
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> ExprResult<()> {
        self.skip_whitespace();
        self.current_token = Some(self.scan_token()?);
        Ok(())
    }

    fn scan_token(&mut self) -> ExprResult<Token> {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '&' => Some(Token::And),
            '|' => Some(Token::Or),
            '~' => Some(Token::Not),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return Ok(token);
        }

        // Two-character operators
        match c {
            '<' | '>' => {
                self.advance();
                let or_equal = self.peek_char() == Some('=');
                if or_equal {
                    self.advance();
                }
                return Ok(match (c, or_equal) {
                    ('<', false) => Token::LessThan,
                    ('<', true) => Token::LessEqual,
                    (_, false) => Token::GreaterThan,
                    (_, true) => Token::GreaterEqual,
                });
            }
            '=' | '!' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    return Ok(if c == '=' {
                        Token::Equal
                    } else {
                        Token::NotEqual
                    });
                }
                let hint = if c == '=' { " (did you mean '=='?)" } else { "" };
                return Err(ExprError::Syntax(format!(
                    "Unknown operator '{}'{}",
                    c, hint
                )));
            }
            _ => {}
        }

        // String literal
        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        // Quoted column name
        if c == '`' {
            return self.scan_quoted_identifier();
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        // Identifier, keyword or boolean
        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(ExprError::Syntax(format!("Unknown operator '{}'", c)))
    }

    fn scan_string(&mut self, quote: char) -> ExprResult<Token> {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    // A doubled quote is an escaped quote
                    if self.peek_char_at(1) == Some(quote) {
                        s.push(quote);
                        self.advance();
                        self.advance();
                    } else {
                        self.advance();
                        return Ok(Token::Text(s));
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => {
                    return Err(ExprError::Syntax(format!(
                        "Unterminated string literal {}{}",
                        quote, s
                    )))
                }
            }
        }
    }

    fn scan_quoted_identifier(&mut self) -> ExprResult<Token> {
        self.advance(); // Skip opening backtick

        let start = self.pos;
        while self.peek_char().map_or(false, |c| c != '`') {
            self.advance();
        }
        if self.is_at_end() {
            return Err(ExprError::Syntax("Unterminated `quoted` column name".into()));
        }

        let name = self.input[start..self.pos].to_string();
        self.advance(); // Skip closing backtick

        if name.is_empty() {
            return Err(ExprError::Syntax("Empty `quoted` column name".into()));
        }
        Ok(Token::Identifier(name))
    }

    fn scan_number(&mut self) -> ExprResult<Token> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        let num: f64 = num_str
            .parse()
            .map_err(|_| ExprError::Syntax(format!("Malformed number '{}'", num_str)))?;
        if !num.is_finite() {
            return Err(ExprError::Syntax(format!("Number out of range '{}'", num_str)));
        }
        Ok(Token::Number(num))
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Keywords are case-insensitive, column names are not
        match text.to_ascii_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            _ => Token::Identifier(text.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> ExprResult<Token> {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn enter(&mut self) -> ExprResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    /// Join two operands, `left_height` being the height of `left`
    fn binary(
        &mut self,
        op: BinaryOperator,
        left: Expr,
        left_height: usize,
        right: Expr,
    ) -> ExprResult<Expr> {
        self.height = left_height.max(self.height) + 1;
        if self.height > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Wrap an operand in a prefix operator
    fn unary(&mut self, op: UnaryOperator, operand: Expr) -> ExprResult<Expr> {
        self.height += 1;
        if self.height > MAX_DEPTH {
            return Err(too_deep());
        }
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. or, |
    // 2. and, &
    // 3. not, ~
    // 4. Comparison: ==, !=, <, <=, >, >=
    // 5. Addition/Subtraction: +, -
    // 6. Multiplication/Division: *, /
    // 7. Unary: -, +
    // 8. Primary: literals, column names, parentheses

    fn parse_or(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_and()?;

        while matches!(self.current_token(), Token::Or) {
            let left_height = self.height;
            self.consume()?;
            let right = self.parse_and()?;
            left = self.binary(BinaryOperator::Or, left, left_height, right)?;
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_not()?;

        while matches!(self.current_token(), Token::And) {
            let left_height = self.height;
            self.consume()?;
            let right = self.parse_not()?;
            left = self.binary(BinaryOperator::And, left, left_height, right)?;
        }

        Ok(left)
    }

    fn parse_not(&mut self) -> ExprResult<Expr> {
        if matches!(self.current_token(), Token::Not) {
            self.consume()?;
            self.enter()?;
            let operand = self.parse_not()?;
            self.leave();
            return self.unary(UnaryOperator::Not, operand);
        }

        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            let left_height = self.height;
            self.consume()?;
            let right = self.parse_additive()?;
            left = self.binary(op, left, left_height, right)?;
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            let left_height = self.height;
            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, left_height, right)?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            let left_height = self.height;
            self.consume()?;
            let right = self.parse_unary()?;
            left = self.binary(op, left, left_height, right)?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        // Prefix unary minus
        if matches!(self.current_token(), Token::Minus) {
            self.consume()?;
            self.enter()?;
            let operand = self.parse_unary()?;
            self.leave();
            return self.unary(UnaryOperator::Negate, operand);
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume()?;
            self.enter()?;
            let operand = self.parse_unary()?;
            self.leave();
            return Ok(operand);
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ExprResult<Expr> {
        self.height = 1;
        match self.consume()? {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Text(s) => Ok(Expr::Text(s)),
            Token::Boolean(b) => Ok(Expr::Boolean(b)),
            Token::Identifier(name) => Ok(Expr::Column(name)),

            Token::LeftParen => {
                self.enter()?;
                let expr = self.parse_or()?;
                self.leave();
                if !matches!(self.current_token(), Token::RightParen) {
                    return Err(ExprError::Syntax(format!(
                        "Unbalanced parentheses: expected ')', got {}",
                        self.current_token()
                    )));
                }
                self.consume()?;
                Ok(expr)
            }

            Token::Eof => Err(ExprError::Syntax(
                "Unexpected end of expression".into(),
            )),

            token => Err(ExprError::Syntax(format!("Unexpected {}", token))),
        }
    }
}

fn too_deep() -> ExprError {
    ExprError::Syntax("Expression nested too deeply".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabforge_core::ErrorKind;

    fn col(name: &str) -> Box<Expr> {
        Box::new(Expr::Column(name.into()))
    }

    fn syntax_error(source: &str) -> String {
        let err = parse_expression(source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError, "{}", source);
        err.to_string()
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse_expression("42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse_expression(".5").unwrap(), Expr::Number(0.5));
        assert_eq!(parse_expression("1e3").unwrap(), Expr::Number(1000.0));
        assert_eq!(
            parse_expression("'it''s'").unwrap(),
            Expr::Text("it's".into())
        );
        assert_eq!(
            parse_expression("\"North\"").unwrap(),
            Expr::Text("North".into())
        );
        assert_eq!(parse_expression("TRUE").unwrap(), Expr::Boolean(true));
        assert_eq!(parse_expression("false").unwrap(), Expr::Boolean(false));
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_expression("Price").unwrap(), *col("Price"));
        assert_eq!(parse_expression("unit_price2").unwrap(), *col("unit_price2"));
        assert_eq!(parse_expression("`Unit Price`").unwrap(), *col("Unit Price"));
        // A backtick-quoted keyword is a column name
        assert_eq!(parse_expression("`and`").unwrap(), *col("and"));
    }

    #[test]
    fn test_parse_precedence() {
        // Price + Quantity * 2 parses as Price + (Quantity * 2)
        let ast = parse_expression("Price + Quantity * 2").unwrap();
        assert_eq!(
            ast,
            Expr::BinaryOp {
                op: BinaryOperator::Add,
                left: col("Price"),
                right: Box::new(Expr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    left: col("Quantity"),
                    right: Box::new(Expr::Number(2.0)),
                }),
            }
        );

        let ast = parse_expression("(Price + Quantity) * 2").unwrap();
        assert!(matches!(
            ast,
            Expr::BinaryOp {
                op: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_boolean_combinators() {
        // a > 1 or b < 2 and not c parses as (a > 1) or ((b < 2) and (not c))
        let ast = parse_expression("a > 1 or b < 2 and not c").unwrap();
        if let Expr::BinaryOp { op, right, .. } = ast {
            assert_eq!(op, BinaryOperator::Or);
            if let Expr::BinaryOp { op, right, .. } = *right {
                assert_eq!(op, BinaryOperator::And);
                assert!(matches!(
                    *right,
                    Expr::UnaryOp {
                        op: UnaryOperator::Not,
                        ..
                    }
                ));
            } else {
                panic!("Expected BinaryOp");
            }
        } else {
            panic!("Expected BinaryOp");
        }

        let symbolic = parse_expression("(a > 1) | (b < 2) & ~c").unwrap();
        assert_eq!(symbolic, parse_expression("a > 1 OR b < 2 AND NOT c").unwrap());
    }

    #[test]
    fn test_parse_comparisons() {
        for (source, expected) in [
            ("a == b", BinaryOperator::Equal),
            ("a != b", BinaryOperator::NotEqual),
            ("a < b", BinaryOperator::LessThan),
            ("a <= b", BinaryOperator::LessEqual),
            ("a > b", BinaryOperator::GreaterThan),
            ("a >= b", BinaryOperator::GreaterEqual),
        ] {
            match parse_expression(source).unwrap() {
                Expr::BinaryOp { op, .. } => assert_eq!(op, expected, "{}", source),
                other => panic!("Expected BinaryOp for {}, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_parse_unary() {
        assert_eq!(
            parse_expression("-Price").unwrap(),
            Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: col("Price"),
            }
        );
        assert_eq!(parse_expression("+5").unwrap(), Expr::Number(5.0));
    }

    #[test]
    fn test_empty_expression() {
        assert!(syntax_error("").contains("Empty"));
        assert!(syntax_error("   ").contains("Empty"));
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(syntax_error("(Price + 1").contains("Unbalanced"));
        assert!(syntax_error("Price + 1)").contains("Unbalanced"));
        syntax_error("()");
    }

    #[test]
    fn test_unknown_operators() {
        assert!(syntax_error("Price = 5").contains("=="));
        syntax_error("Price ^ 2");
        syntax_error("Price % 2");
        syntax_error("!Price");
        syntax_error("Price @ 2");
    }

    #[test]
    fn test_malformed_input() {
        syntax_error("Price +");
        syntax_error("Price Quantity");
        syntax_error("'open");
        syntax_error("`open");
        syntax_error("``");
        syntax_error("1e");
        syntax_error("sum(Price)");
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}Price{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse_expression(&nested(MAX_DEPTH)).unwrap(), *col("Price"));
        assert!(syntax_error(&nested(MAX_DEPTH + 1)).contains("too deeply"));
        assert!(syntax_error(&nested(20_000)).contains("too deeply"));

        assert!(syntax_error(&format!("{}Price", "-".repeat(5_000))).contains("too deeply"));
        assert!(syntax_error(&format!("{}Paid", "not ".repeat(5_000))).contains("too deeply"));
    }

    #[test]
    fn test_long_chain_limit() {
        let chain = |terms: usize| vec!["Price"; terms].join(" + ");
        // n terms build a left-leaning tree of height n
        assert!(parse_expression(&chain(MAX_DEPTH)).is_ok());
        assert!(syntax_error(&chain(MAX_DEPTH + 1)).contains("too deeply"));
        assert!(syntax_error(&chain(10_000)).contains("too deeply"));
        assert!(syntax_error(&vec!["Paid"; 2_000].join(" and ")).contains("too deeply"));
    }
}
