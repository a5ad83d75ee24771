use std::error::Error;
use std::fmt;

use pest::Span;

use super::Rule;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Clone, Debug, PartialEq)]
pub enum ParseErrorKind {
    /// An error was encountered while converting a string to a numeric
    /// representation.
    DecimalError { message: String },
    /// Input is invalid in some way.
    InvalidInput { message: String },
    /// Parser has reached an invalid state (most likely a bug in the parser).
    InvalidParserState { message: String },
}

#[derive(Debug)]
pub struct ParseError {
    /// The type of error.
    pub kind: ParseErrorKind,
    /// The (line, column) location of the error in the input.
    pub location: (usize, usize),
    source: Option<Box<dyn Error + 'static + Send + Sync>>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ParseErrorKind::DecimalError { message } => {
                write!(f, "{}", message)?;
            }
            ParseErrorKind::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)?;
            }
            ParseErrorKind::InvalidParserState { message } => {
                write!(f, "Parser has reached an invalid state (please report this as a bug): expected {}", message)?;
            }
        }
        write!(f, " at line {} column {}", self.location.0, self.location.1)
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl ParseError {
    pub(crate) fn invalid_state<T: ToString>(msg: T) -> ParseError {
        ParseError {
            kind: ParseErrorKind::InvalidParserState {
                message: msg.to_string(),
            },
            location: (0, 0),
            source: None,
        }
    }

    pub(crate) fn invalid_input_with_span<T: ToString>(msg: T, span: Span) -> ParseError {
        ParseError {
            kind: ParseErrorKind::InvalidInput {
                message: msg.to_string(),
            },
            location: span.start_pos().line_col(),
            source: None,
        }
    }

    pub(crate) fn decimal_parse_error(err: rust_decimal::Error, span: Span) -> ParseError {
        let message = format!("error while parsing number: {}", err);
        let pest_error = pest::error::Error::new_from_span(
            pest::error::ErrorVariant::<Rule>::CustomError { message },
            span.clone(),
        );
        ParseError {
            kind: ParseErrorKind::DecimalError {
                message: format!("{}", pest_error),
            },
            location: span.start_pos().line_col(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        let err = err.renamed_rules(|rule| {
            match *rule {
                Rule::EOI => "end of input",
                Rule::ws => "whitespace",
                Rule::indent => "indentation",
                Rule::comment => "comment",
                Rule::eol => "end of line",
                Rule::file => "journal file",
                Rule::entry => "journal entry",
                Rule::blank_line => "blank line",
                Rule::org_header => "an Org-mode title",
                Rule::option => "option directive",
                Rule::include => "include directive",
                Rule::directive => "directive",
                Rule::balance => "balance directive",
                Rule::amount_tolerance => "amount with optional tolerance",
                Rule::open => "open directive",
                Rule::commodity_list => "list of commodities",
                Rule::close => "close directive",
                Rule::commodity_directive => "commodity directive",
                Rule::note => "note directive",
                Rule::pad => "pad directive",
                Rule::transaction => "transaction directive",
                Rule::txn_flag => "transaction flag",
                Rule::txn_strings => "payee and narration strings",
                Rule::txn_line => "posting or metadata line",
                Rule::kv_line => "key-value line",
                Rule::posting_line => "indented posting",
                Rule::posting => "posting",
                Rule::posting_flag => "posting flag",
                Rule::posting_comment => "posting comment",
                Rule::comment_text => "comment text",
                Rule::cost_spec => "cost spec",
                Rule::cost_spec_unit => "unit cost spec",
                Rule::cost_spec_total => "total cost spec",
                Rule::cost_comp_list => "comma-separated list of cost spec components",
                Rule::cost_comp => "cost spec component",
                Rule::price_annotation => "price annotation",
                Rule::price_unit => "unit price annotation",
                Rule::price_total => "total price annotation",
                Rule::key => "key",
                Rule::key_value => "key-value pair",
                Rule::meta_value => "metadata value",
                Rule::bool => "boolean value",
                Rule::date => "date",
                Rule::date_sep => "date separator ('-' or '/')",
                Rule::amount => "amount",
                Rule::num => "number",
                Rule::int => "integer",
                Rule::quoted_str => "quoted string",
                Rule::inner_str => "inner part of a quoted string",
                Rule::quoted_char => "a (possibly escaped) character",
                Rule::escape_sequence => "escape sequence",
                Rule::account_type => "an account category (first part of account name)",
                Rule::account_piece => "part of an account name",
                Rule::account => "an account name",
                Rule::commodity => "commodity",
                Rule::tag_name => "tag name",
                Rule::link => "link",
                Rule::tag => "tag",
            }
            .to_string()
        });
        let location = match &err.line_col {
            pest::error::LineColLocation::Pos(ref p) => *p,
            pest::error::LineColLocation::Span(ref p, _) => *p,
        };
        ParseError {
            kind: ParseErrorKind::InvalidInput {
                message: format!("{}", err),
            },
            location,
            source: Some(Box::new(err)),
        }
    }
}
