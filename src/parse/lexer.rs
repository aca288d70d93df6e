use crate::common::{BinaryOperator, UnaryOperator};

pub(crate) type Lexer<'a> = logos_iter::PeekableLexer<'a, logos::Lexer<'a, TokenKind>, TokenKind>;

pub(crate) fn lexer(s: &str) -> Lexer {
    logos_iter::LogosIter::peekable_lexer(<TokenKind as logos::Logos>::lexer(s))
}

#[derive(logos::Logos, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TokenKind {
    #[regex(r"[0-9]+")]
    Integer,

    // A dice term is a single token so that `d6` and `2d20kh1` never lex as identifiers.
    #[regex(r"[0-9]*[dD]([0-9]+|%)([kp][hl]?[0-9]*)?", priority = 3)]
    Dice,

    #[regex(r"[_a-zA-Z\p{Han}][_a-zA-Z0-9\p{Han}]*")]
    Ident,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,
    #[regex(r"`[^`]*`")]
    Template,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token(";")]
    Semicolon,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("<=")]
    LessEqual,
    #[token("!=")]
    BangEqual,
    #[token("<")]
    LessThan,
    #[token(">")]
    GreaterThan,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    #[regex(r#""([^"\\]|\\.)*"#)]
    ErrUnterminatedString,
    #[regex(r"`[^`]*")]
    ErrUnterminatedTemplate,

    #[regex(r"[ \t\r\n]+", logos::skip)]
    #[error]
    Error,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;

        match self {
            Integer => "<integer>",
            Dice => "<dice>",
            Ident => "<identifier>",
            String => "<string>",
            Template => "<template>",
            LeftParen => "'('",
            RightParen => "')'",
            Semicolon => "';'",
            Question => "'?'",
            Colon => "':'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Percent => "'%'",
            Bang => "'!'",
            Equal => "'='",
            EqualEqual => "'=='",
            GreaterEqual => "'>='",
            LessEqual => "'<='",
            BangEqual => "'!='",
            LessThan => "'<'",
            GreaterThan => "'>'",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            ErrUnterminatedString | ErrUnterminatedTemplate | Error => "<error>",
        }
    }

    pub fn as_unary_op(&self) -> Option<UnaryOperator> {
        use UnaryOperator::*;
        Some(match self {
            Self::Plus => Pos,
            Self::Minus => Neg,
            Self::Bang => Not,
            _ => return None,
        })
    }

    pub fn as_binary_op(&self) -> Option<BinaryOperator> {
        use BinaryOperator::*;
        Some(match self {
            Self::Plus => Add,
            Self::Minus => Sub,
            Self::Star => Mul,
            Self::Slash => Div,
            Self::Percent => Rem,
            Self::LessThan => Lt,
            Self::GreaterThan => Gt,
            Self::LessEqual => Le,
            Self::GreaterEqual => Ge,
            Self::EqualEqual => Eq,
            Self::BangEqual => Ne,
            _ => return None,
        })
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
