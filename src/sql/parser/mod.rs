use std::collections::BTreeMap;
use std::iter::Peekable;

use crate::error::{Error, Result};
use crate::sql::parser::ast::{ColumnRef, ColumnSpec, JoinClause, Literal, Projection};
use crate::sql::parser::lexer::{Keyword, Lexer, Token};
use crate::sql::types::DataType;

pub mod ast;
pub mod lexer;

/// Statement parser - converts a token stream into a [ast::Statement]
///
/// The parser is strict: the whole input must form exactly one of the five
/// recognized shapes, optionally terminated by a semicolon, and anything
/// left over is a syntax error naming the offending token.
pub struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given statement text
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input).peekable(),
        }
    }

    /// Parses the input into a statement AST
    pub fn parse(&mut self) -> Result<ast::Statement> {
        let stmt = self.parse_statement()?;
        // Trailing semicolon is allowed but nothing may follow it
        self.next_if_token(Token::Semicolon);
        if let Some(token) = self.peek()? {
            return Err(Error::Syntax(format!("[Parser] unexpected token {}", token)));
        }
        Ok(stmt)
    }

    /// Dispatches on the leading keyword
    fn parse_statement(&mut self) -> Result<ast::Statement> {
        match self.peek()? {
            Some(Token::Keyword(Keyword::Create)) => self.parse_create_table(),
            Some(Token::Keyword(Keyword::Insert)) => self.parse_insert(),
            Some(Token::Keyword(Keyword::Select)) => self.parse_select(),
            Some(Token::Keyword(Keyword::Update)) => self.parse_update(),
            Some(Token::Keyword(Keyword::Delete)) => self.parse_delete(),
            Some(t) => Err(Error::Syntax(format!("[Parser] unexpected token {}", t))),
            None => Err(Error::Syntax("[Parser] unexpected end of input".to_string())),
        }
    }

    /// CREATE TABLE name (col type [PRIMARY KEY] [UNIQUE], ...)
    fn parse_create_table(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Create))?;
        self.next_expect(Token::Keyword(Keyword::Table))?;
        let name = self.next_ident()?;
        self.next_expect(Token::OpenParen)?;

        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_column_spec()?);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }
        self.next_expect(Token::CloseParen)?;
        Ok(ast::Statement::CreateTable { name, columns })
    }

    /// One column clause in CREATE TABLE
    fn parse_column_spec(&mut self) -> Result<ColumnSpec> {
        let mut column = ColumnSpec {
            name: self.next_ident()?,
            datatype: match self.next()? {
                Token::Keyword(Keyword::Int) => DataType::Integer,
                Token::Keyword(Keyword::Text) => DataType::Text,
                token => {
                    return Err(Error::Syntax(format!("[Parser] unexpected token {}", token)))
                }
            },
            primary_key: false,
            unique: false,
        };

        // Constraint flags in any order
        while let Some(Token::Keyword(keyword)) = self.next_if_keyword() {
            match keyword {
                Keyword::Primary => {
                    self.next_expect(Token::Keyword(Keyword::Key))?;
                    column.primary_key = true;
                }
                Keyword::Unique => column.unique = true,
                k => return Err(Error::Syntax(format!("[Parser] unexpected keyword {}", k))),
            }
        }

        Ok(column)
    }

    /// INSERT INTO name (col, ...) VALUES (lit, ...)
    fn parse_insert(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Insert))?;
        self.next_expect(Token::Keyword(Keyword::Into))?;
        let table = self.next_ident()?;

        self.next_expect(Token::OpenParen)?;
        let mut columns = Vec::new();
        loop {
            columns.push(self.next_ident()?);
            match self.next()? {
                Token::CloseParen => break,
                Token::Comma => {}
                token => {
                    return Err(Error::Syntax(format!("[Parser] unexpected token {}", token)))
                }
            }
        }

        self.next_expect(Token::Keyword(Keyword::Values))?;
        self.next_expect(Token::OpenParen)?;
        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            match self.next()? {
                Token::CloseParen => break,
                Token::Comma => {}
                token => {
                    return Err(Error::Syntax(format!("[Parser] unexpected token {}", token)))
                }
            }
        }

        Ok(ast::Statement::Insert {
            table,
            columns,
            values,
        })
    }

    /// SELECT (* | col, ...) FROM name [JOIN name2 ON a.x = b.y] [WHERE col = lit]
    fn parse_select(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Select))?;

        let projection = if self.next_if_token(Token::Asterisk).is_some() {
            Projection::All
        } else {
            let mut columns = Vec::new();
            loop {
                columns.push(self.next_ident()?);
                if self.next_if_token(Token::Comma).is_none() {
                    break;
                }
            }
            Projection::Columns(columns)
        };

        self.next_expect(Token::Keyword(Keyword::From))?;
        let table = self.next_ident()?;

        let join = if self.next_if_token(Token::Keyword(Keyword::Join)).is_some() {
            let join_table = self.next_ident()?;
            self.next_expect(Token::Keyword(Keyword::On))?;
            let left = self.parse_column_ref()?;
            self.next_expect(Token::Equal)?;
            let right = self.parse_column_ref()?;
            Some(JoinClause {
                table: join_table,
                left,
                right,
            })
        } else {
            None
        };

        Ok(ast::Statement::Select {
            projection,
            table,
            join,
            predicate: self.parse_where_clause()?,
        })
    }

    /// A qualified column reference, `table.column`
    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let table = self.next_ident()?;
        self.next_expect(Token::Period)?;
        let column = self.next_ident()?;
        Ok(ColumnRef { table, column })
    }

    /// UPDATE name SET col = lit, ... [WHERE col = lit]
    fn parse_update(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Update))?;
        let table = self.next_ident()?;
        self.next_expect(Token::Keyword(Keyword::Set))?;

        let mut assignments = BTreeMap::new();
        loop {
            let column = self.next_ident()?;
            self.next_expect(Token::Equal)?;
            let value = self.parse_literal()?;
            // A repeated column keeps the last assignment
            assignments.insert(column, value);
            if self.next_if_token(Token::Comma).is_none() {
                break;
            }
        }

        Ok(ast::Statement::Update {
            table,
            assignments,
            predicate: self.parse_where_clause()?,
        })
    }

    /// DELETE FROM name [WHERE col = lit]
    fn parse_delete(&mut self) -> Result<ast::Statement> {
        self.next_expect(Token::Keyword(Keyword::Delete))?;
        self.next_expect(Token::Keyword(Keyword::From))?;
        let table = self.next_ident()?;
        Ok(ast::Statement::Delete {
            table,
            predicate: self.parse_where_clause()?,
        })
    }

    /// Optional `WHERE column = literal`; no conjunctions
    fn parse_where_clause(&mut self) -> Result<Option<(String, Literal)>> {
        if self.next_if_token(Token::Keyword(Keyword::Where)).is_none() {
            return Ok(None);
        }
        let column = self.next_ident()?;
        self.next_expect(Token::Equal)?;
        let value = self.parse_literal()?;
        Ok(Some((column, value)))
    }

    /// A literal: quoted string, bare word, or (optionally negated) number
    fn parse_literal(&mut self) -> Result<Literal> {
        Ok(match self.next()? {
            Token::Number(n) => Literal::Bare(n),
            Token::String(s) => Literal::Quoted(s),
            Token::Ident(s) => Literal::Bare(s),
            Token::Minus => match self.next()? {
                Token::Number(n) => Literal::Bare(format!("-{}", n)),
                token => {
                    return Err(Error::Syntax(format!("[Parser] unexpected token {}", token)))
                }
            },
            token => return Err(Error::Syntax(format!("[Parser] unexpected token {}", token))),
        })
    }

    /// Peeks at the next token without consuming it
    ///
    /// A lexing error is surfaced but stays in the stream, so it resurfaces
    /// on whatever consuming call comes next.
    fn peek(&mut self) -> Result<Option<Token>> {
        match self.lexer.peek() {
            Some(Ok(token)) => Ok(Some(token.clone())),
            Some(Err(Error::Syntax(msg))) => Err(Error::Syntax(msg.clone())),
            Some(Err(_)) => Err(Error::Syntax("[Lexer] invalid token".to_string())),
            None => Ok(None),
        }
    }

    /// Consumes and returns the next token
    fn next(&mut self) -> Result<Token> {
        self.lexer
            .next()
            .unwrap_or_else(|| Err(Error::Syntax("[Parser] unexpected end of input".to_string())))
    }

    /// Expects and consumes an identifier
    fn next_ident(&mut self) -> Result<String> {
        match self.next()? {
            Token::Ident(ident) => Ok(ident),
            token => Err(Error::Syntax(format!(
                "[Parser] expected identifier, got token {}",
                token
            ))),
        }
    }

    /// Expects a specific token, returns error if different
    fn next_expect(&mut self, expect: Token) -> Result<()> {
        let token = self.next()?;
        if token != expect {
            return Err(Error::Syntax(format!(
                "[Parser] expected token {}, got {}",
                expect, token
            )));
        }
        Ok(())
    }

    /// Consumes the next token if it satisfies the predicate
    fn next_if<F: Fn(&Token) -> bool>(&mut self, predicate: F) -> Option<Token> {
        self.peek().unwrap_or(None).filter(|t| predicate(t))?;
        self.next().ok()
    }

    /// Consumes the next token if it's a keyword
    fn next_if_keyword(&mut self) -> Option<Token> {
        self.next_if(|t| matches!(t, Token::Keyword(_)))
    }

    /// Consumes the next token if it matches the given token
    fn next_if_token(&mut self, token: Token) -> Option<Token> {
        self.next_if(|t| t == &token)
    }
}
