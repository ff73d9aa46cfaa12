//! Condition DSL parser.
//!
//! Recursive descent parser that turns text into a `ConditionGroup`, with
//! error messages carrying the character offset and the expected/found token.
//!
//! ```text
//! tree       := group | comparison
//! group      := ("AND" | "OR") "(" [node ("," node)*] ")"
//! node       := group | comparison
//! comparison := OPERATOR "(" indicator "," (indicator | number) ")"
//! OPERATOR   := GT | GTE | LT | LTE | EQ | NEQ | CROSS_ABOVE | CROSS_BELOW
//! indicator  := open | high | low | close | volume
//!             | SMA(n) | EMA(n) | RSI(n) | ATR(n)
//!             | MACD(f,s,g) | MACD_SIGNAL(f,s,g) | MACD_HISTOGRAM(f,s,g)
//!             | BOLLINGER_UPPER(n,k) | BOLLINGER_MIDDLE(n,k) | BOLLINGER_LOWER(n,k)
//! ```
//!
//! A bare comparison at the top level is wrapped in a single-child AND group.
//! Groups nest at most [`MAX_DEPTH`] levels deep.

use crate::domain::condition::{
    ComparisonOperator, Condition, ConditionGroup, ConditionNode, Logic, Operand,
};
use crate::domain::error::ParseError;
use crate::domain::indicator::{BollingerBand, IndicatorConfig, MacdLine, PriceSource};

const OPERATORS: [(&str, ComparisonOperator); 8] = [
    ("CROSS_ABOVE", ComparisonOperator::CrossAbove),
    ("CROSS_BELOW", ComparisonOperator::CrossBelow),
    ("GTE", ComparisonOperator::Gte),
    ("GT", ComparisonOperator::Gt),
    ("LTE", ComparisonOperator::Lte),
    ("LT", ComparisonOperator::Lt),
    ("NEQ", ComparisonOperator::Neq),
    ("EQ", ComparisonOperator::Eq),
];

pub const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, message: String) -> ParseError {
        ParseError {
            message,
            position: self.pos,
        }
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_whitespace();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}', found '{}'", expected, ch))),
            None => Err(self.error(format!("expected '{}', found end of input", expected))),
        }
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        let remaining = self.remaining();
        remaining.starts_with(keyword)
            && !remaining[keyword.len()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
    }

    fn consume_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos += keyword.len();
            true
        } else {
            false
        }
    }

    fn peek_word(&self) -> String {
        let word: String = self
            .remaining()
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if word.is_empty() {
            self.peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string())
        } else {
            word
        }
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let mut has_dot = false;
        let mut digits = 0;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        let num_str = &self.input[start..self.pos];
        num_str.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {}", num_str),
            position: start,
        })
    }

    fn parse_integer(&mut self) -> Result<usize, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
        }

        let num_str = &self.input[start..self.pos];
        if num_str.is_empty() {
            return Err(ParseError {
                message: "expected integer".to_string(),
                position: start,
            });
        }
        num_str.parse::<usize>().map_err(|_| ParseError {
            message: format!("invalid integer: {}", num_str),
            position: start,
        })
    }

    /// `(n)` after a single-period indicator name.
    fn parse_period_args(&mut self) -> Result<usize, ParseError> {
        self.expect_char('(')?;
        let period = self.parse_integer()?;
        self.expect_char(')')?;
        Ok(period)
    }

    fn parse_macd_args(&mut self, line: MacdLine) -> Result<IndicatorConfig, ParseError> {
        self.expect_char('(')?;
        let fast = self.parse_integer()?;
        self.expect_char(',')?;
        let slow = self.parse_integer()?;
        self.expect_char(',')?;
        let signal = self.parse_integer()?;
        self.expect_char(')')?;
        Ok(IndicatorConfig::macd(fast, slow, signal, line))
    }

    fn parse_bollinger_args(&mut self, band: BollingerBand) -> Result<IndicatorConfig, ParseError> {
        self.expect_char('(')?;
        let period = self.parse_integer()?;
        self.expect_char(',')?;
        let start = self.pos;
        let mult = self.parse_number()?;
        if mult < 0.0 {
            return Err(ParseError {
                message: format!("bollinger multiplier must be non-negative, found {}", mult),
                position: start,
            });
        }
        self.expect_char(')')?;
        Ok(IndicatorConfig::bollinger(period, mult, band))
    }

    fn parse_indicator(&mut self) -> Result<IndicatorConfig, ParseError> {
        self.skip_whitespace();
        let word = self.peek_word();

        let config = match word.as_str() {
            "open" => IndicatorConfig::Price(PriceSource::Open),
            "high" => IndicatorConfig::Price(PriceSource::High),
            "low" => IndicatorConfig::Price(PriceSource::Low),
            "close" => IndicatorConfig::Price(PriceSource::Close),
            "volume" => IndicatorConfig::Volume,
            "SMA" | "EMA" | "RSI" | "ATR" | "MACD" | "MACD_SIGNAL" | "MACD_HISTOGRAM"
            | "BOLLINGER_UPPER" | "BOLLINGER_MIDDLE" | "BOLLINGER_LOWER" => {
                self.pos += word.len();
                return match word.as_str() {
                    "SMA" => self.parse_period_args().map(IndicatorConfig::Sma),
                    "EMA" => self.parse_period_args().map(IndicatorConfig::Ema),
                    "RSI" => self.parse_period_args().map(IndicatorConfig::Rsi),
                    "ATR" => self.parse_period_args().map(IndicatorConfig::Atr),
                    "MACD" => self.parse_macd_args(MacdLine::Macd),
                    "MACD_SIGNAL" => self.parse_macd_args(MacdLine::Signal),
                    "MACD_HISTOGRAM" => self.parse_macd_args(MacdLine::Histogram),
                    "BOLLINGER_UPPER" => self.parse_bollinger_args(BollingerBand::Upper),
                    "BOLLINGER_MIDDLE" => self.parse_bollinger_args(BollingerBand::Middle),
                    _ => self.parse_bollinger_args(BollingerBand::Lower),
                };
            }
            _ => return Err(self.error(format!("expected indicator, found '{}'", word))),
        };

        self.pos += word.len();
        Ok(config)
    }

    fn parse_operand(&mut self) -> Result<Operand, ParseError> {
        self.skip_whitespace();
        if self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || ch == '-' || ch == '.')
        {
            return Ok(Operand::Constant(self.parse_number()?));
        }
        Ok(Operand::Indicator(self.parse_indicator()?))
    }

    fn parse_comparison(&mut self, operator: ComparisonOperator) -> Result<Condition, ParseError> {
        self.expect_char('(')?;
        let left = self.parse_indicator()?;
        self.expect_char(',')?;
        let right = self.parse_operand()?;
        self.expect_char(')')?;
        Ok(Condition::new(left, operator, right))
    }

    fn parse_group(&mut self, logic: Logic) -> Result<ConditionGroup, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("groups nested deeper than {}", MAX_DEPTH)));
        }
        self.depth += 1;
        let group = self.parse_group_body(logic);
        self.depth -= 1;
        group
    }

    fn parse_group_body(&mut self, logic: Logic) -> Result<ConditionGroup, ParseError> {
        self.expect_char('(')?;
        let mut children = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(')') {
            self.advance();
            return Ok(ConditionGroup::new(logic, children));
        }

        children.push(self.parse_node()?);
        loop {
            self.skip_whitespace();
            if self.peek() == Some(')') {
                self.advance();
                break;
            }
            self.expect_char(',')?;
            children.push(self.parse_node()?);
        }

        Ok(ConditionGroup::new(logic, children))
    }

    fn parse_node(&mut self) -> Result<ConditionNode, ParseError> {
        self.skip_whitespace();

        if self.consume_keyword("AND") {
            return self.parse_group(Logic::And).map(ConditionNode::Group);
        }
        if self.consume_keyword("OR") {
            return self.parse_group(Logic::Or).map(ConditionNode::Group);
        }
        for (keyword, operator) in OPERATORS {
            if self.consume_keyword(keyword) {
                return self
                    .parse_comparison(operator)
                    .map(ConditionNode::Condition);
            }
        }

        let word = self.peek_word();
        Err(self.error(format!("expected condition or group, found '{}'", word)))
    }

    fn expect_end(&mut self, what: &str) -> Result<(), ParseError> {
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error(format!(
                "unexpected input after {}: '{}'",
                what,
                self.remaining()
            )));
        }
        Ok(())
    }

    fn parse(&mut self) -> Result<ConditionGroup, ParseError> {
        let tree = match self.parse_node()? {
            ConditionNode::Group(group) => group,
            leaf @ ConditionNode::Condition(_) => ConditionGroup::all(vec![leaf]),
        };
        self.expect_end("condition")?;
        Ok(tree)
    }
}

/// Parse a condition tree.
pub fn parse(input: &str) -> Result<ConditionGroup, ParseError> {
    Parser::new(input).parse()
}

/// Parse a single indicator expression such as `SMA(20)` or `BOLLINGER_LOWER(20,2)`.
pub fn parse_indicator(input: &str) -> Result<IndicatorConfig, ParseError> {
    let mut parser = Parser::new(input);
    let config = parser.parse_indicator()?;
    parser.expect_end("indicator")?;
    Ok(config)
}
