//! SQL Parser
//!
//! Recursive descent over the token stream, producing one statement per
//! input. A trailing semicolon is permitted; anything after it is an error.

use super::ast::*;
use super::lexer::Lexer;
use super::token::Token;
use crate::catalog::ColumnType;
use crate::error::{Error, Result};

/// SQL Parser
pub struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

impl Parser {
    /// Create a new parser from a SQL string
    pub fn new(sql: &str) -> Result<Self> {
        let tokens = Lexer::new(sql).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse a single SQL statement
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        if self.check(&Token::Semicolon) {
            self.advance();
        }
        if !self.is_at_end() {
            return Err(self.unexpected("end of input"));
        }

        Ok(stmt)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        match self.current() {
            Token::Select => self.parse_select().map(Statement::Select),
            Token::Insert => self.parse_insert().map(Statement::Insert),
            Token::Update => self.parse_update().map(Statement::Update),
            Token::Delete => self.parse_delete().map(Statement::Delete),
            Token::Create => self.parse_create_table().map(Statement::CreateTable),
            Token::Drop => self.parse_drop_table().map(Statement::DropTable),
            _ => Err(self.unexpected("SELECT, INSERT, UPDATE, DELETE, CREATE, or DROP")),
        }
    }

    // ========== SELECT Statement ==========

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect(&Token::Select)?;

        let projection = if self.check(&Token::Asterisk) {
            self.advance();
            Projection::Wildcard
        } else {
            Projection::Columns(self.comma_separated(Self::parse_column_ref)?)
        };

        self.expect(&Token::From)?;
        let from = self.parse_table_ref()?;

        let mut joins = Vec::new();
        loop {
            if self.check(&Token::Inner) {
                self.advance();
                self.expect(&Token::Join)?;
            } else if self.check(&Token::Join) {
                self.advance();
            } else {
                break;
            }

            let table = self.parse_table_ref()?;
            self.expect(&Token::On)?;
            let on = self.parse_predicate()?;
            joins.push(Join { table, on });
        }

        let where_clause = self.parse_optional_where()?;

        let order_by = if self.check(&Token::Order) {
            self.advance();
            self.expect(&Token::By)?;
            let column = self.parse_column_ref()?;
            let descending = if self.check(&Token::Desc) {
                self.advance();
                true
            } else {
                if self.check(&Token::Asc) {
                    self.advance();
                }
                false
            };
            Some(OrderBy { column, descending })
        } else {
            None
        };

        let limit = if self.check(&Token::Limit) {
            self.advance();
            match self.current().clone() {
                Token::IntegerLiteral(n) if n >= 0 => {
                    self.advance();
                    Some(n as u64)
                }
                _ => return Err(self.unexpected("non-negative integer")),
            }
        } else {
            None
        };

        Ok(SelectStatement {
            projection,
            from,
            joins,
            where_clause,
            order_by,
            limit,
        })
    }

    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let name = self.expect_identifier()?;

        let alias = if self.check(&Token::As) {
            self.advance();
            Some(self.expect_identifier()?)
        } else if matches!(self.current(), Token::Identifier(_)) {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(TableRef { name, alias })
    }

    // ========== INSERT Statement ==========

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect(&Token::Insert)?;
        self.expect(&Token::Into)?;

        let table_name = self.expect_identifier()?;

        let columns = if self.check(&Token::LParen) {
            self.advance();
            let cols = self.comma_separated(Self::expect_identifier)?;
            self.expect(&Token::RParen)?;
            Some(cols)
        } else {
            None
        };

        self.expect(&Token::Values)?;
        self.expect(&Token::LParen)?;
        let values = self.comma_separated(Self::parse_literal)?;
        self.expect(&Token::RParen)?;

        Ok(InsertStatement {
            table_name,
            columns,
            values,
        })
    }

    // ========== UPDATE Statement ==========

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect(&Token::Update)?;

        let table_name = self.expect_identifier()?;
        self.expect(&Token::Set)?;

        let assignments = self.comma_separated(|p: &mut Self| {
            let column = p.expect_identifier()?;
            p.expect(&Token::Eq)?;
            let value = p.parse_literal()?;
            Ok(Assignment { column, value })
        })?;

        let where_clause = self.parse_optional_where()?;

        Ok(UpdateStatement {
            table_name,
            assignments,
            where_clause,
        })
    }

    // ========== DELETE Statement ==========

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect(&Token::Delete)?;
        self.expect(&Token::From)?;

        let table_name = self.expect_identifier()?;

        let where_clause = self.parse_optional_where()?;

        Ok(DeleteStatement {
            table_name,
            where_clause,
        })
    }

    // ========== CREATE / DROP TABLE ==========

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect(&Token::Create)?;
        self.expect(&Token::Table)?;

        let table_name = self.expect_identifier()?;
        self.expect(&Token::LParen)?;
        let columns = self.comma_separated(Self::parse_column_def)?;
        self.expect(&Token::RParen)?;

        Ok(CreateTableStatement {
            table_name,
            columns,
        })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let column_type = self.parse_column_type()?;

        let mut primary_key = false;
        let mut unique = false;
        let mut not_null = false;

        loop {
            if self.check(&Token::Primary) {
                self.advance();
                self.expect(&Token::Key)?;
                primary_key = true;
            } else if self.check(&Token::Unique) {
                self.advance();
                unique = true;
            } else if self.check(&Token::Not) {
                self.advance();
                self.expect(&Token::Null)?;
                not_null = true;
            } else {
                break;
            }
        }

        Ok(ColumnDef {
            name,
            column_type,
            primary_key,
            unique,
            not_null,
        })
    }

    fn parse_column_type(&mut self) -> Result<ColumnType> {
        let ty = match self.current() {
            Token::Integer => ColumnType::Integer,
            Token::Text => ColumnType::Text,
            Token::Float => ColumnType::Float,
            Token::Boolean => ColumnType::Boolean,
            _ => return Err(self.unexpected("INTEGER, TEXT, FLOAT, or BOOLEAN")),
        };
        self.advance();
        Ok(ty)
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement> {
        self.expect(&Token::Drop)?;
        self.expect(&Token::Table)?;
        let table_name = self.expect_identifier()?;
        Ok(DropTableStatement { table_name })
    }

    // ========== Predicates ==========

    fn parse_predicate(&mut self) -> Result<Predicate> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Predicate> {
        let mut left = self.parse_and()?;
        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Predicate::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Predicate> {
        let mut left = self.parse_not()?;
        while self.check(&Token::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Predicate::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Predicate> {
        if self.check(&Token::Not) {
            self.advance();
            let inner = self.parse_not()?;
            Ok(Predicate::Not(Box::new(inner)))
        } else {
            self.parse_atom()
        }
    }

    fn parse_atom(&mut self) -> Result<Predicate> {
        if self.check(&Token::LParen) {
            self.advance();
            let inner = self.parse_or()?;
            self.expect(&Token::RParen)?;
            return Ok(inner);
        }

        let column = self.parse_column_ref()?;
        let op = match self.current() {
            Token::Eq => CompareOp::Eq,
            Token::Neq => CompareOp::Neq,
            Token::Lt => CompareOp::Lt,
            Token::Lte => CompareOp::Lte,
            Token::Gt => CompareOp::Gt,
            Token::Gte => CompareOp::Gte,
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();

        let rhs = if matches!(self.current(), Token::Identifier(_)) {
            Operand::Column(self.parse_column_ref()?)
        } else {
            Operand::Literal(self.parse_literal()?)
        };

        Ok(Predicate::Compare { column, op, rhs })
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let name = self.expect_identifier()?;
        if self.check(&Token::Dot) {
            self.advance();
            let column = self.expect_identifier()?;
            Ok(ColumnRef {
                table: Some(name),
                column,
            })
        } else {
            Ok(ColumnRef {
                table: None,
                column: name,
            })
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let literal = match self.current().clone() {
            Token::IntegerLiteral(n) => Literal::Integer(n),
            Token::FloatLiteral(n) => Literal::Float(n),
            Token::StringLiteral(s) => Literal::String(s),
            Token::True => Literal::Boolean(true),
            Token::False => Literal::Boolean(false),
            Token::Null => Literal::Null,
            _ => return Err(self.unexpected("literal value")),
        };
        self.advance();
        Ok(literal)
    }

    // ========== Helper functions ==========

    /// Parse one or more comma-separated items
    fn comma_separated<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = vec![item(self)?];
        while self.check(&Token::Comma) {
            self.advance();
            items.push(item(self)?);
        }
        Ok(items)
    }

    fn parse_optional_where(&mut self) -> Result<Option<Predicate>> {
        if self.check(&Token::Where) {
            self.advance();
            Ok(Some(self.parse_predicate()?))
        } else {
            Ok(None)
        }
    }

    fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map_or(&Token::Eof, |(t, _)| t)
    }

    fn current_offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(0, |&(_, offset)| offset)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&token.to_string()))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        if self.is_at_end() {
            Error::UnexpectedEof(expected.to_string())
        } else {
            Error::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current().to_string(),
                offset: self.current_offset(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Statement {
        Parser::new(sql).unwrap().parse().unwrap()
    }

    #[test]
    fn test_parse_simple_select() {
        let stmt = parse("SELECT * FROM users");
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.projection, Projection::Wildcard);
                assert_eq!(s.from.name, "users");
                assert!(s.joins.is_empty());
                assert!(s.where_clause.is_none());
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_parse_select_columns_and_clauses() {
        let stmt = parse("SELECT id, u.name FROM users u WHERE id >= 2 ORDER BY name DESC LIMIT 10;");
        match stmt {
            Statement::Select(s) => {
                match s.projection {
                    Projection::Columns(cols) => {
                        assert_eq!(cols[0].column, "id");
                        assert_eq!(cols[1].table.as_deref(), Some("u"));
                        assert_eq!(cols[1].column, "name");
                    }
                    _ => panic!("expected explicit columns"),
                }
                assert_eq!(s.from.alias.as_deref(), Some("u"));
                assert!(s.where_clause.is_some());
                let order = s.order_by.unwrap();
                assert_eq!(order.column.column, "name");
                assert!(order.descending);
                assert_eq!(s.limit, Some(10));
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_parse_join() {
        let stmt = parse("SELECT a.n, b.v FROM a JOIN b ON a.id = b.aid");
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.joins.len(), 1);
                assert_eq!(s.joins[0].table.name, "b");
                match &s.joins[0].on {
                    Predicate::Compare { column, op, rhs } => {
                        assert_eq!(column.table.as_deref(), Some("a"));
                        assert_eq!(*op, CompareOp::Eq);
                        assert!(matches!(rhs, Operand::Column(c) if c.column == "aid"));
                    }
                    _ => panic!("expected comparison"),
                }
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_parse_inner_join_keyword() {
        let stmt = parse("SELECT * FROM a INNER JOIN b AS x ON a.id = x.aid");
        match stmt {
            Statement::Select(s) => {
                assert_eq!(s.joins[0].table.alias.as_deref(), Some("x"));
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_parse_insert_positional() {
        let stmt = parse("INSERT INTO u VALUES (1, 'Alice', NULL, TRUE)");
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.table_name, "u");
                assert!(i.columns.is_none());
                assert_eq!(
                    i.values,
                    vec![
                        Literal::Integer(1),
                        Literal::String("Alice".to_string()),
                        Literal::Null,
                        Literal::Boolean(true),
                    ]
                );
            }
            _ => panic!("expected INSERT"),
        }
    }

    #[test]
    fn test_parse_insert_with_columns() {
        let stmt = parse("INSERT INTO u (id, name) VALUES (1, 'Alice')");
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.columns, Some(vec!["id".to_string(), "name".to_string()]));
            }
            _ => panic!("expected INSERT"),
        }
    }

    #[test]
    fn test_parse_update() {
        let stmt = parse("UPDATE u SET name = 'Bob', age = 3 WHERE id = 1");
        match stmt {
            Statement::Update(u) => {
                assert_eq!(u.assignments.len(), 2);
                assert_eq!(u.assignments[0].column, "name");
                assert!(u.where_clause.is_some());
            }
            _ => panic!("expected UPDATE"),
        }
    }

    #[test]
    fn test_parse_delete_without_where() {
        let stmt = parse("DELETE FROM u");
        match stmt {
            Statement::Delete(d) => {
                assert_eq!(d.table_name, "u");
                assert!(d.where_clause.is_none());
            }
            _ => panic!("expected DELETE"),
        }
    }

    #[test]
    fn test_parse_create_table() {
        let stmt = parse(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT UNIQUE, name TEXT NOT NULL, score FLOAT)",
        );
        match stmt {
            Statement::CreateTable(c) => {
                assert_eq!(c.table_name, "users");
                assert_eq!(c.columns.len(), 4);
                assert!(c.columns[0].primary_key);
                assert!(c.columns[1].unique);
                assert!(c.columns[2].not_null);
                assert_eq!(c.columns[3].column_type, ColumnType::Float);
            }
            _ => panic!("expected CREATE TABLE"),
        }
    }

    #[test]
    fn test_parse_drop_table() {
        let stmt = parse("DROP TABLE users;");
        assert_eq!(
            stmt,
            Statement::DropTable(DropTableStatement {
                table_name: "users".to_string()
            })
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let stmt = parse("SELECT * FROM t WHERE a = 1 OR b = 2 AND c = 3");
        match stmt {
            Statement::Select(s) => match s.where_clause.unwrap() {
                Predicate::Or(left, right) => {
                    assert!(matches!(*left, Predicate::Compare { .. }));
                    assert!(matches!(*right, Predicate::And(_, _)));
                }
                _ => panic!("expected OR at the root"),
            },
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let stmt = parse("SELECT * FROM t WHERE (a = 1 OR b = 2) AND c = 3");
        match stmt {
            Statement::Select(s) => match s.where_clause.unwrap() {
                Predicate::And(left, _) => {
                    assert!(matches!(*left, Predicate::Or(_, _)));
                }
                _ => panic!("expected AND at the root"),
            },
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_not_predicate() {
        let stmt = parse("SELECT * FROM t WHERE NOT a = 1");
        match stmt {
            Statement::Select(s) => {
                assert!(matches!(s.where_clause.unwrap(), Predicate::Not(_)));
            }
            _ => panic!("expected SELECT"),
        }
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = Parser::new("SELECT * FROM t; SELECT * FROM u")
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }

    #[test]
    fn test_premature_end() {
        let err = Parser::new("SELECT * FROM").unwrap().parse().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEof(_)));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let err = Parser::new("SELECT * FROM t LIMIT -1")
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedToken { .. }));
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let stmt = parse("select * from t where a = 1 order by a asc limit 5");
        assert!(matches!(stmt, Statement::Select(_)));
    }
}
