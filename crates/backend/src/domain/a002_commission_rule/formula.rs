//! Язык формул комиссии.
//!
//! Числа, переменные из `FORMULA_VARIABLES`, `+ - * / %`, унарный минус,
//! скобки, сравнения (`< <= > >= == !=`, результат 1 или 0) и функции
//! `min`, `max`, `abs`, `round(x[, digits])`, `if(cond, a, b)`.

use contracts::domain::a002_commission_rule::dto::{
    is_formula_variable, FormulaError, FormulaTestResponse, FormulaValidationResponse,
};
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    /// Позиция первого символа, в символах
    start: usize,
}

/// Предел длины формулы в символах
pub const MAX_FORMULA_LENGTH: usize = 2000;
/// Предел вложенности скобок, вызовов и унарных знаков
pub const MAX_NESTING: usize = 64;

const OPERATORS: &[&str] = &["<=", ">=", "==", "!=", "<", ">", "+", "-", "*", "/", "%"];

/// Разбивает формулу на токены; неизвестные символы попадают в ошибки
fn tokenize(chars: &[char]) -> (Vec<Token>, Vec<FormulaError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut i = 0usize;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        if ch.is_ascii_digit() || (ch == '.' && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())) {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            match text.parse::<f64>() {
                Ok(value) => tokens.push(Token {
                    kind: TokenKind::Number(value),
                    start,
                }),
                Err(_) => errors.push(FormulaError {
                    position: start,
                    message: format!("Invalid number '{}'", text),
                }),
            }
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(chars[start..i].iter().collect()),
                start,
            });
            continue;
        }

        let simple = match ch {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = simple {
            tokens.push(Token { kind, start });
            i += 1;
            continue;
        }

        let op = OPERATORS.iter().find(|op| {
            op.chars()
                .enumerate()
                .all(|(offset, c)| chars.get(i + offset) == Some(&c))
        });
        match op {
            Some(op) => {
                tokens.push(Token {
                    kind: TokenKind::Op(op),
                    start,
                });
                i += op.len();
            }
            None => {
                errors.push(FormulaError {
                    position: start,
                    message: format!("Unexpected character '{}'", ch),
                });
                i += 1;
            }
        }
    }

    (tokens, errors)
}

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            _ => return None,
        })
    }

    fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable {
        name: String,
        position: usize,
    },
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        position: usize,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    Abs,
    Round,
    If,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "min" => Some(Function::Min),
            "max" => Some(Function::Max),
            "abs" => Some(Function::Abs),
            "round" => Some(Function::Round),
            "if" => Some(Function::If),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Abs => "abs",
            Function::Round => "round",
            Function::If => "if",
        }
    }

    /// Допустимое число аргументов: (минимум, максимум)
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Function::Min | Function::Max => (1, None),
            Function::Abs => (1, Some(1)),
            Function::Round => (1, Some(2)),
            Function::If => (3, Some(3)),
        }
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: usize,
    depth: usize,
    errors: Vec<FormulaError>,
}

type ParseResult = Result<Expr, FormulaError>;

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |t| t.start)
    }

    fn error(&self, message: impl Into<String>) -> FormulaError {
        FormulaError {
            position: self.position(),
            message: message.into(),
        }
    }

    /// Вход на следующий уровень вложенности; парный `leave` обязателен
    fn enter(&mut self) -> Result<(), FormulaError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("Formula is nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn peek_op(&self, ops: &[&str]) -> Option<(&'static str, usize)> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                start,
            }) if ops.contains(op) => Some((*op, *start)),
            _ => None,
        }
    }

    // comparison := additive (cmp additive)?
    fn comparison(&mut self) -> ParseResult {
        let left = self.additive()?;
        if let Some((symbol, position)) = self.peek_op(&["<", "<=", ">", ">=", "==", "!="]) {
            self.pos += 1;
            let right = self.additive()?;
            let op = BinaryOp::from_symbol(symbol).ok_or_else(|| self.error("Unknown operator"))?;
            if self.peek_op(&["<", "<=", ">", ">=", "==", "!="]).is_some() {
                return Err(self.error("Comparisons cannot be chained"));
            }
            return Ok(Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                position,
            });
        }
        Ok(left)
    }

    // additive := term (('+' | '-') term)*
    fn additive(&mut self) -> ParseResult {
        let mut left = self.term()?;
        while let Some((symbol, position)) = self.peek_op(&["+", "-"]) {
            self.pos += 1;
            let right = self.term()?;
            let op = BinaryOp::from_symbol(symbol).ok_or_else(|| self.error("Unknown operator"))?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                position,
            };
        }
        Ok(left)
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> ParseResult {
        let mut left = self.unary()?;
        while let Some((symbol, position)) = self.peek_op(&["*", "/", "%"]) {
            self.pos += 1;
            let right = self.unary()?;
            let op = BinaryOp::from_symbol(symbol).ok_or_else(|| self.error("Unknown operator"))?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                position,
            };
        }
        Ok(left)
    }

    // unary := '-' unary | '+' unary | primary
    fn unary(&mut self) -> ParseResult {
        if let Some((symbol, _)) = self.peek_op(&["-", "+"]) {
            self.pos += 1;
            self.enter()?;
            let operand = self.unary();
            self.leave();
            let operand = operand?;
            return Ok(if symbol == "-" {
                Expr::Negate(Box::new(operand))
            } else {
                operand
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult {
        let Some(token) = self.peek() else {
            return Err(self.error("Unexpected end of formula"));
        };
        match &token.kind {
            TokenKind::Number(value) => {
                self.pos += 1;
                Ok(Expr::Number(*value))
            }
            TokenKind::LParen => {
                self.enter()?;
                self.pos += 1;
                let inner = self.comparison();
                self.leave();
                let inner = inner?;
                self.expect_rparen(token.start)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                self.pos += 1;
                let is_call = matches!(self.peek(), Some(Token { kind: TokenKind::LParen, .. }));
                if is_call {
                    self.enter()?;
                    let call = self.call(name, token.start);
                    self.leave();
                    call
                } else {
                    if !is_formula_variable(name) {
                        // Ошибка копится, разбор продолжается
                        self.errors.push(FormulaError {
                            position: token.start,
                            message: format!("Unknown variable '{}'", name),
                        });
                    }
                    Ok(Expr::Variable {
                        name: name.clone(),
                        position: token.start,
                    })
                }
            }
            TokenKind::RParen => Err(self.error("Unexpected ')'")),
            TokenKind::Comma => Err(self.error("Unexpected ','")),
            TokenKind::Op(op) => Err(self.error(format!("Unexpected operator '{}'", op))),
        }
    }

    fn call(&mut self, name: &str, start: usize) -> ParseResult {
        let open = self.pos;
        self.pos += 1;

        let mut args = Vec::new();
        if !matches!(self.peek(), Some(Token { kind: TokenKind::RParen, .. })) {
            loop {
                args.push(self.comparison()?);
                match self.peek() {
                    Some(Token {
                        kind: TokenKind::Comma,
                        ..
                    }) => self.pos += 1,
                    _ => break,
                }
            }
        }
        self.expect_rparen(self.tokens[open].start)?;

        let Some(function) = Function::lookup(name) else {
            return Err(FormulaError {
                position: start,
                message: format!("Unknown function '{}'", name),
            });
        };
        let (min, max) = function.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            let expected = match max {
                Some(max) if max == min => format!("{}", min),
                Some(max) => format!("{} to {}", min, max),
                None => format!("at least {}", min),
            };
            return Err(FormulaError {
                position: start,
                message: format!(
                    "{}() takes {} arguments, got {}",
                    function.name(),
                    expected,
                    args.len()
                ),
            });
        }
        Ok(Expr::Call { function, args })
    }

    fn expect_rparen(&mut self, open_position: usize) -> Result<(), FormulaError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(FormulaError {
                position: open_position,
                message: "Unclosed '('".into(),
            }),
        }
    }
}

/// Разобранная формула
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostics {
    pub errors: Vec<FormulaError>,
    /// Упомянутые переменные, по алфавиту
    pub variables: Vec<String>,
}

impl Diagnostics {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Разбор с накоплением ошибок. `None`, если есть хотя бы одна ошибка.
pub fn parse(source: &str) -> (Option<Formula>, Diagnostics) {
    let chars: Vec<char> = source.chars().collect();
    if chars.len() > MAX_FORMULA_LENGTH {
        let diagnostics = Diagnostics {
            errors: vec![FormulaError {
                position: MAX_FORMULA_LENGTH,
                message: format!("Formula is longer than {} characters", MAX_FORMULA_LENGTH),
            }],
            variables: Vec::new(),
        };
        return (None, diagnostics);
    }
    let (tokens, mut errors) = tokenize(&chars);

    let mut variables = BTreeSet::new();
    for token in &tokens {
        if let TokenKind::Ident(name) = &token.kind {
            if Function::lookup(name).is_none() {
                variables.insert(name.clone());
            }
        }
    }

    if tokens.is_empty() && errors.is_empty() {
        errors.push(FormulaError {
            position: 0,
            message: "Formula is empty".into(),
        });
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: chars.len(),
        depth: 0,
        errors: Vec::new(),
    };
    let mut expr = None;
    if !tokens.is_empty() {
        match parser.comparison() {
            Ok(_) if parser.pos < tokens.len() => {
                errors.push(parser.error("Unexpected input after the end of the expression"));
            }
            Ok(parsed) => expr = Some(parsed),
            Err(err) => errors.push(err),
        }
    }
    errors.extend(parser.errors);
    errors.sort_by_key(|e| e.position);
    errors.dedup();

    let diagnostics = Diagnostics {
        errors,
        variables: variables.into_iter().collect(),
    };
    let formula = expr
        .filter(|_| diagnostics.is_valid())
        .map(|expr| Formula { expr });
    (formula, diagnostics)
}

// ============================================================================
// Evaluation
// ============================================================================

impl Formula {
    pub fn evaluate(&self, variables: &HashMap<String, f64>) -> Result<f64, String> {
        let value = eval(&self.expr, variables)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err("Result is not a finite number".into())
        }
    }
}

fn eval(expr: &Expr, variables: &HashMap<String, f64>) -> Result<f64, String> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Variable { name, position } => variables
            .get(name)
            .copied()
            .ok_or_else(|| format!("No value for variable '{}' at position {}", name, position)),
        Expr::Negate(inner) => Ok(-eval(inner, variables)?),
        Expr::Binary {
            op,
            left,
            right,
            position,
        } => {
            let a = eval(left, variables)?;
            let b = eval(right, variables)?;
            if op.is_comparison() {
                let result = match op {
                    BinaryOp::Lt => a < b,
                    BinaryOp::Le => a <= b,
                    BinaryOp::Gt => a > b,
                    BinaryOp::Ge => a >= b,
                    BinaryOp::Eq => a == b,
                    _ => a != b,
                };
                return Ok(if result { 1.0 } else { 0.0 });
            }
            match op {
                BinaryOp::Add => Ok(a + b),
                BinaryOp::Sub => Ok(a - b),
                BinaryOp::Mul => Ok(a * b),
                BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
                    Err(format!("Division by zero at position {}", position))
                }
                BinaryOp::Div => Ok(a / b),
                _ => Ok(a % b),
            }
        }
        Expr::Call { function, args } => match function {
            Function::If => {
                // Вычисляется только выбранная ветка
                if eval(&args[0], variables)? != 0.0 {
                    eval(&args[1], variables)
                } else {
                    eval(&args[2], variables)
                }
            }
            _ => {
                let values = args
                    .iter()
                    .map(|arg| eval(arg, variables))
                    .collect::<Result<Vec<f64>, String>>()?;
                Ok(match function {
                    Function::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
                    Function::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    Function::Abs => values[0].abs(),
                    Function::Round => {
                        let digits = values.get(1).copied().unwrap_or(0.0).round().clamp(0.0, 10.0);
                        let factor = 10f64.powi(digits as i32);
                        (values[0] * factor).round() / factor
                    }
                    Function::If => unreachable!("handled above"),
                })
            }
        },
    }
}

/// Проверка формулы для API
pub fn validate(source: &str) -> FormulaValidationResponse {
    let (_, diagnostics) = parse(source);
    FormulaValidationResponse {
        is_valid: diagnostics.is_valid(),
        errors: diagnostics.errors,
        variables: diagnostics.variables,
    }
}

/// Пробное вычисление формулы на заданных значениях
pub fn try_evaluate(source: &str, variables: &HashMap<String, f64>) -> FormulaTestResponse {
    let (formula, diagnostics) = parse(source);
    let outcome = match formula {
        Some(formula) => formula.evaluate(variables),
        None => Err(diagnostics
            .errors
            .iter()
            .map(|e| format!("{} (at {})", e.message, e.position))
            .collect::<Vec<_>>()
            .join("; ")),
    };
    match outcome {
        Ok(value) => FormulaTestResponse {
            result: Some(value),
            error: None,
        },
        Err(error) => FormulaTestResponse {
            result: None,
            error: Some(error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn eval_str(source: &str, pairs: &[(&str, f64)]) -> Result<f64, String> {
        let (formula, diagnostics) = parse(source);
        let formula = formula.ok_or_else(|| format!("{:?}", diagnostics.errors))?;
        formula.evaluate(&vars(pairs))
    }

    #[test]
    fn precedence_and_unary_minus() {
        assert_eq!(eval_str("1 + 2 * 3", &[]), Ok(7.0));
        assert_eq!(eval_str("(1 + 2) * 3", &[]), Ok(9.0));
        assert_eq!(eval_str("-2 * -3", &[]), Ok(6.0));
        assert_eq!(eval_str("10 - 4 - 3", &[]), Ok(3.0));
        assert_eq!(eval_str("7 % 4", &[]), Ok(3.0));
        assert_eq!(eval_str(".5 * 4", &[]), Ok(2.0));
    }

    #[test]
    fn variables_and_functions() {
        let price = [("price", 200.0), ("quantity", 3.0)];
        assert_eq!(eval_str("price * quantity * 0.05", &price), Ok(30.0));
        assert_eq!(eval_str("max(5, price * 0.01)", &price), Ok(5.0));
        assert_eq!(eval_str("min(price, 50, 70)", &price), Ok(50.0));
        assert_eq!(eval_str("abs(-price)", &price), Ok(200.0));
        assert_eq!(eval_str("round(2.346, 2)", &[]), Ok(2.35));
        assert_eq!(eval_str("round(2.5)", &[]), Ok(3.0));
        assert_eq!(eval_str("if(price > 100, 10, 1)", &price), Ok(10.0));
        assert_eq!(eval_str("if(price >= 1000, 10 / 0, 1)", &price), Ok(1.0));
        assert_eq!(eval_str("(price == 200) + (price != 200)", &price), Ok(1.0));
    }

    #[test]
    fn runtime_errors() {
        assert!(eval_str("price / 0", &[("price", 1.0)])
            .unwrap_err()
            .contains("Division by zero"));
        assert!(eval_str("price * 2", &[])
            .unwrap_err()
            .contains("No value for variable 'price'"));
    }

    #[test]
    fn validation_collects_errors_with_positions() {
        let (formula, diagnostics) = parse("price * tax $ + 1");
        assert!(formula.is_none());
        let positions: Vec<usize> = diagnostics.errors.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![8, 12]);
        assert!(diagnostics.errors[0].message.contains("Unknown variable 'tax'"));
        assert_eq!(diagnostics.variables, vec!["price", "tax"]);
    }

    #[test]
    fn syntax_errors() {
        let cases = [
            ("", "Formula is empty"),
            ("(price", "Unclosed '('"),
            ("price +", "Unexpected end of formula"),
            ("price price", "Unexpected input"),
            ("foo(1)", "Unknown function 'foo'"),
            ("if(1, 2)", "if() takes 3 arguments, got 2"),
            ("round()", "round() takes 1 to 2 arguments, got 0"),
            ("1 < 2 < 3", "cannot be chained"),
        ];
        for (source, expected) in cases {
            let (formula, diagnostics) = parse(source);
            assert!(formula.is_none(), "{} should not parse", source);
            assert!(
                diagnostics.errors.iter().any(|e| e.message.contains(expected)),
                "{}: {:?}",
                source,
                diagnostics.errors
            );
        }
    }

    #[test]
    fn api_helpers() {
        let response = validate("amount * 0.1");
        assert!(response.is_valid);
        assert_eq!(response.variables, vec!["amount"]);

        let ok = try_evaluate("amount * 0.1", &vars(&[("amount", 50.0)]));
        assert_eq!(ok.result, Some(5.0));
        assert!(ok.error.is_none());

        let failed = try_evaluate("amount *", &HashMap::new());
        assert!(failed.result.is_none());
        assert!(failed.error.unwrap().contains("Unexpected end of formula"));
    }

    fn nested(open: &str, close: &str, depth: usize) -> String {
        format!("{}1{}", open.repeat(depth), close.repeat(depth))
    }

    #[test]
    fn nesting_is_limited() {
        assert_eq!(eval_str(&nested("(", ")", MAX_NESTING), &[]), Ok(1.0));

        let cases = [
            nested("(", ")", MAX_NESTING + 1),
            nested("abs(", ")", MAX_NESTING + 1),
            nested("-", "", MAX_NESTING + 1),
        ];
        for source in cases {
            let response = validate(&source);
            assert!(!response.is_valid);
            assert!(
                response.errors.iter().any(|e| e.message.contains("nested too deeply")),
                "{:?}",
                response.errors
            );
        }
    }

    #[test]
    fn oversized_formulas_are_rejected_on_a_small_stack() {
        // Стек рабочего потока tokio по умолчанию 2 MiB
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let deep = validate(&nested("(", ")", 20_000));
                let chain = vec!["1"; MAX_FORMULA_LENGTH / 2].join("+");
                let sum = try_evaluate(&chain, &HashMap::new());
                let too_long = try_evaluate(&format!("{}+1", chain), &HashMap::new());
                (deep, sum, too_long)
            })
            .unwrap();
        let (deep, sum, too_long) = handle.join().unwrap();

        assert!(!deep.is_valid);
        assert!(deep.errors[0].message.contains("longer than"));
        assert_eq!(sum.result, Some((MAX_FORMULA_LENGTH / 2) as f64));
        assert!(too_long.error.unwrap().contains("longer than"));
    }
}
